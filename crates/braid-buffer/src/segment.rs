//! 分段登记：叶子内存区域及其单向分离标记。
//!
//! # 模块定位（Why）
//! - 分段是组合缓冲的唯一叶子形态：一块定长、独立持有的连续内存，
//!   外加一枚单调翻转（false → true，且不可逆）的分离标记；
//! - 组合与视图从不存储自身的分离状态，它们在查询时点对引用的
//!   分段做惰性扫描，因此分段标记的原子可见性是全引擎状态语义的根基。
//!
//! # 设计概要（How）
//! - 存储采用 `Box<[UnsafeCell<u8>]>`：引擎不在字节访问外加锁，
//!   共享类别下的并发读写由宿主内存模型约束，标记本身用
//!   `AtomicBool`（Release 写 / Acquire 读）保证单调可见；
//! - `Segment` 是 `Arc` 句柄：同一分段可同时被多个组合、视图引用，
//!   只要任一句柄存活，底层存储就不会回收——分离只否定逻辑有效性，
//!   不提前释放内存，这使得“陈旧 false 窗口内的访问”依旧内存安全。

use alloc::{boxed::Box, format, sync::Arc, vec, vec::Vec};
use core::cell::UnsafeCell;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use braid_core::{BraidError, ByteRegion, Result, SegmentKind, codes};

use crate::composite::{CompositeBuf, Layout};
use crate::materialize;
use crate::view::BufView;

/// 分段的内部状态，经由 `Arc` 在所有引用方之间共享。
pub(crate) struct SegmentInner {
    storage: Box<[UnsafeCell<u8>]>,
    kind: SegmentKind,
    growable: bool,
    detached: AtomicBool,
}

/// 并发契约说明：
///
/// - 结构字段（`kind`、`growable`、存储长度）在构造后不可变，跨线索只读；
/// - `detached` 为原子标记，读写自带同步；
/// - 字节内容经 `UnsafeCell` 暴露：独占类别下 Rust 侧调用方遵循
///   “先查状态再访问”的契约，共享类别下允许多线索并发读写，
///   可见性交由宿主内存模型，引擎不再附加锁。
unsafe impl Send for SegmentInner {}
/// 参见 [`Send`] 的说明：所有可变性要么经原子类型，要么是契约允许的
/// 共享内存字节竞争，因此可安全实现 `Sync`。
unsafe impl Sync for SegmentInner {}

/// `Segment` 是叶子内存区域的共享句柄。
///
/// # 设计动机（Why）
/// - 同一块叶子内存可被任意多个组合缓冲同时成员化（共享所有权），
///   `Arc` 让成员列表的拼接只是引用复制，绝不触碰字节；
/// - 分离标记挂在叶子上而非组合上：外部持有者转移原始缓冲时只翻转
///   此处一枚标记，所有上层组合 / 视图在下一次查询时自然观察到，
///   无需任何失效通知图。
///
/// # 契约说明（What）
/// - **长度不可变**：可增长区域不允许作为组合成员，因此分段长度
///   构造即冻结；`growable` 仅是宿主侧可增长缓冲的占位标记，
///   用于构造期校验，引擎不提供真实扩容路径；
/// - **分离单调**：[`detach`](Self::detach) 之后 [`is_detached`](Self::is_detached)
///   永远为真；重复调用是无害的幂等操作；
/// - **生命周期**：字节存储随最后一个 `Arc` 引用释放，分离不提前回收。
#[derive(Clone)]
pub struct Segment {
    inner: Arc<SegmentInner>,
}

impl Segment {
    fn from_parts(data: Vec<u8>, kind: SegmentKind, growable: bool) -> Self {
        let storage = data.into_iter().map(UnsafeCell::new).collect();
        Self {
            inner: Arc::new(SegmentInner {
                storage,
                kind,
                growable,
                detached: AtomicBool::new(false),
            }),
        }
    }

    /// 以给定初始内容创建独占分段。
    pub fn exclusive(data: Vec<u8>) -> Self {
        Self::from_parts(data, SegmentKind::Exclusive, false)
    }

    /// 以给定初始内容创建共享分段。
    pub fn shared(data: Vec<u8>) -> Self {
        Self::from_parts(data, SegmentKind::Shared, false)
    }

    /// 创建长度为 `len` 的全零独占分段。
    pub fn zeroed(len: usize) -> Self {
        Self::exclusive(vec![0u8; len])
    }

    /// 创建可增长占位分段，仅用于表达宿主侧的可增长缓冲。
    ///
    /// # 契约说明（What）
    /// - 返回的分段可独立读写，但任何组合构造都会以
    ///   `buffer.invalid_argument` 拒绝它；
    /// - 引擎不实现真实扩容：此标记存在的意义就是被校验路径观察到。
    pub fn growable(data: Vec<u8>, kind: SegmentKind) -> Self {
        Self::from_parts(data, kind, true)
    }

    /// 返回分段的归属类别。
    pub fn kind(&self) -> SegmentKind {
        self.inner.kind
    }

    /// 返回是否为可增长占位分段。
    pub fn is_growable(&self) -> bool {
        self.inner.growable
    }

    /// 返回分段当前是否已分离。
    pub fn is_detached(&self) -> bool {
        self.inner.detached.load(Ordering::Acquire)
    }

    /// 将分段标记为已分离。
    ///
    /// # 契约说明（What）
    /// - **触发方**：分离由外部事件驱动（原始缓冲被转移 / 失效），
    ///   引擎内部绝不主动调用；
    /// - **单调性**：标记只能从 `false` 翻到 `true`，重复调用幂等；
    /// - **可见性**：采用 Release 写入，所有 Acquire 读取方
    ///   在正常内存可见性延迟内观察到翻转，无需即时同步。
    pub fn detach(&self) {
        self.inner.detached.store(true, Ordering::Release);
    }

    /// 物理长度：构造时冻结，不受分离影响，供成员拼接与索引构建使用。
    pub(crate) fn raw_len(&self) -> usize {
        self.inner.storage.len()
    }

    /// 返回存储基址，供零拷贝块迭代使用；调用方需自行保证访问纪律。
    pub(crate) fn chunk_ptr(&self) -> *const u8 {
        self.inner.storage.as_ptr().cast::<u8>()
    }

    /// 将 `[offset, offset + dst.len())` 处的字节拷贝到 `dst`。
    ///
    /// 调用方必须已完成边界校验；本方法只负责搬运。
    pub(crate) fn copy_out(&self, offset: usize, dst: &mut [u8]) {
        debug_assert!(offset + dst.len() <= self.raw_len());
        if dst.is_empty() {
            return;
        }
        let src = self.inner.storage.as_ptr().cast::<u8>();
        // SAFETY：偏移与长度已由调用方约束在存储范围内；`UnsafeCell`
        // 授权经共享引用读取内容。共享类别下与并发写的字节竞争属于
        // 契约允许的宿主内存模型行为，存储本身在 `Arc` 存活期内有效。
        unsafe {
            core::ptr::copy_nonoverlapping(src.add(offset), dst.as_mut_ptr(), dst.len());
        }
    }

    /// 将 `src` 全部字节写入 `[offset, offset + src.len())`。
    ///
    /// 调用方必须已完成边界校验；本方法只负责搬运。
    pub(crate) fn copy_in(&self, offset: usize, src: &[u8]) {
        debug_assert!(offset + src.len() <= self.raw_len());
        if src.is_empty() {
            return;
        }
        // SAFETY：同 `copy_out`；写路径经 `UnsafeCell::raw_get` 取得
        // 可写指针，不构造任何中间引用，避免与并发读取方产生别名冲突。
        unsafe {
            core::ptr::copy_nonoverlapping(
                src.as_ptr(),
                UnsafeCell::raw_get(self.inner.storage.as_ptr().add(offset)),
                src.len(),
            );
        }
    }

    /// 将 `[start, end)` 范围物化为全新的单分段组合。
    ///
    /// 钳制语义与组合缓冲的 [`CompositeBuf::slice`] 一致：
    /// 越界端点收拢到有效长度，`start >= end` 视为空范围而非错误。
    pub fn slice(&self, start: usize, end: usize) -> CompositeBuf {
        let layout = Layout::single(self.clone());
        let effective = if self.is_detached() { 0 } else { self.raw_len() };
        materialize::slice_range(&layout, 0, effective, start, end)
    }

    /// 在分段上打开非占有视图，窗口为 `[start, end)`。
    ///
    /// # 失败语义
    /// - `start` 严格大于当前有效长度时返回 `buffer.out_of_range`；
    ///   `end` 按惯例钳制。
    pub fn subarray(&self, start: usize, end: usize) -> Result<BufView> {
        let effective = if self.is_detached() { 0 } else { self.raw_len() };
        BufView::open(Arc::new(Layout::single(self.clone())), effective, start, end)
    }

    fn check_byte_access(&self, offset: usize, wanted: usize, op: &'static str) -> Result<()> {
        if self.is_detached() {
            return Err(BraidError::new(
                codes::DETACHED_ACCESS,
                format!("Segment::{op} 拒绝访问已分离分段"),
            ));
        }
        let len = self.raw_len();
        if offset.checked_add(wanted).is_none_or(|end| end > len) {
            return Err(BraidError::new(
                codes::OUT_OF_RANGE,
                format!("Segment::{op} 越界：偏移 {offset} + 长度 {wanted} 超出有效长度 {len}"),
            ));
        }
        Ok(())
    }
}

impl ByteRegion for Segment {
    fn len(&self) -> usize {
        if self.is_detached() { 0 } else { self.raw_len() }
    }

    fn is_detached(&self) -> bool {
        Segment::is_detached(self)
    }

    fn read_at(&self, offset: usize, dst: &mut [u8]) -> Result<()> {
        self.check_byte_access(offset, dst.len(), "read_at")?;
        self.copy_out(offset, dst);
        Ok(())
    }

    fn write_at(&self, offset: usize, src: &[u8]) -> Result<()> {
        self.check_byte_access(offset, src.len(), "write_at")?;
        self.copy_in(offset, src);
        Ok(())
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("len", &self.raw_len())
            .field("kind", &self.kind())
            .field("growable", &self.is_growable())
            .field("detached", &self.is_detached())
            .finish()
    }
}
