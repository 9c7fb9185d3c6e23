//! 组合缓冲：零拷贝拼接的对外句柄与扁平成员布局。
//!
//! # 模块定位（Why）
//! - 组合缓冲把若干独立持有的叶子分段按序拼成一个逻辑连续的字节区域，
//!   构造过程只搬运引用，绝不搬运字节；
//! - 成员序列在构造期彻底扁平化：组合之套组合、视图之套视图都在此处
//!   拆解为叶子分段的子区间，寻址与状态检查因此永远只有一层间接。
//!
//! # 设计概要（How）
//! - [`Layout`] 承载“成员序列 + 偏移索引 + 类别”三元组，构造后不可变，
//!   由 `Arc` 在组合、视图与转移结果之间共享；
//! - [`CompositeBuf`] 在布局之上附加一枚句柄级的 `moved` 原子标记：
//!   `transfer` 只翻转当前句柄（及其全部别名），底层分段与其它组合
//!   不受影响；克隆即别名，与宿主语言“同一缓冲对象的多个引用”对齐；
//! - 长度与分离状态永不缓存，每次查询对成员分段做惰性扫描——
//!   以 O(成员数) 的查询成本换掉整套失效通知设施。

use alloc::{format, sync::Arc, vec::Vec};
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use braid_core::{BraidError, ByteRegion, Result, SegmentKind, codes};

use crate::materialize;
use crate::offset_index::OffsetIndex;
use crate::reader::CompositeReader;
use crate::segment::Segment;
use crate::view::BufView;

/// 成员：某个叶子分段的一段连续子区间。
///
/// 视图作为构造参数传入时，其覆盖的分段区间以“隐式子分段”的形式
/// 拼入成员序列——因此成员是（分段，段内起点，长度）而非整段引用。
#[derive(Clone)]
pub(crate) struct SegmentSlice {
    pub(crate) segment: Segment,
    pub(crate) offset: usize,
    pub(crate) len: usize,
}

/// `Layout` 是组合构造的不可变产物：扁平成员序列与其偏移索引。
///
/// # 契约说明（What）
/// - 成员序列不含任何组合结构，深度恒为 1；
/// - 索引与序列同时生成、同时冻结，`Arc` 共享后再无任何写路径；
/// - 类别一致性由构造校验保证：序列中所有分段与 `kind` 同类。
pub(crate) struct Layout {
    members: Vec<SegmentSlice>,
    index: OffsetIndex,
    kind: SegmentKind,
}

impl Layout {
    pub(crate) fn new(members: Vec<SegmentSlice>, kind: SegmentKind) -> Self {
        let index = OffsetIndex::build(members.iter().map(|m| m.len));
        Self {
            members,
            index,
            kind,
        }
    }

    /// 将单个分段包装为一员布局，供分段自身的 slice/subarray 复用。
    pub(crate) fn single(segment: Segment) -> Self {
        let len = segment.raw_len();
        let kind = segment.kind();
        Self::new(
            alloc::vec![SegmentSlice {
                segment,
                offset: 0,
                len,
            }],
            kind,
        )
    }

    pub(crate) fn kind(&self) -> SegmentKind {
        self.kind
    }

    pub(crate) fn members(&self) -> &[SegmentSlice] {
        &self.members
    }

    /// 物理总长：与分离状态无关的成员长度之和。
    pub(crate) fn raw_total(&self) -> usize {
        self.index.total()
    }

    /// 是否存在已分离成员（全序列扫描）。
    pub(crate) fn any_detached(&self) -> bool {
        self.members.iter().any(|m| m.segment.is_detached())
    }

    /// `[start, start + len)` 范围是否与已分离分段重叠。
    ///
    /// 视图的分离状态按其窗口覆盖的成员子集推导；空窗口不与任何
    /// 成员重叠，因此永远报告未分离。
    pub(crate) fn any_detached_in(&self, start: usize, len: usize) -> bool {
        if len == 0 {
            return false;
        }
        let Some((mut idx, mut local)) = self.index.locate(start) else {
            return false;
        };
        let mut remaining = len;
        while remaining > 0 && idx < self.members.len() {
            let member = &self.members[idx];
            let avail = member.len - local;
            if avail > 0 {
                if member.segment.is_detached() {
                    return true;
                }
                remaining = remaining.saturating_sub(avail);
            }
            idx += 1;
            local = 0;
        }
        false
    }

    /// 截取 `[start, start + len)` 覆盖的成员子区间序列，供扁平化复用。
    pub(crate) fn slices_in(&self, start: usize, len: usize) -> Vec<SegmentSlice> {
        let mut out = Vec::new();
        if len == 0 {
            return out;
        }
        let Some((mut idx, mut local)) = self.index.locate(start) else {
            return out;
        };
        let mut remaining = len;
        while remaining > 0 && idx < self.members.len() {
            let member = &self.members[idx];
            let avail = member.len - local;
            if avail > 0 {
                let take = avail.min(remaining);
                out.push(SegmentSlice {
                    segment: member.segment.clone(),
                    offset: member.offset + local,
                    len: take,
                });
                remaining -= take;
            }
            idx += 1;
            local = 0;
        }
        out
    }

    /// 从全局偏移 `offset` 起连续读出 `dst.len()` 字节。
    ///
    /// 跨成员边界时向后迭代，只搬运请求的字节；
    /// 调用方必须已完成分离与边界校验。
    pub(crate) fn read_range(&self, offset: usize, dst: &mut [u8]) {
        if dst.is_empty() {
            return;
        }
        let (mut idx, mut local) = match self.index.locate(offset) {
            Some(pos) => pos,
            None => unreachable!("调用方已完成越界校验"),
        };
        let mut copied = 0;
        while copied < dst.len() {
            let member = &self.members[idx];
            let avail = member.len - local;
            if avail == 0 {
                idx += 1;
                local = 0;
                continue;
            }
            let take = avail.min(dst.len() - copied);
            member
                .segment
                .copy_out(member.offset + local, &mut dst[copied..copied + take]);
            copied += take;
            idx += 1;
            local = 0;
        }
    }

    /// 从全局偏移 `offset` 起连续写入 `src` 全部字节，对偶于 [`read_range`](Self::read_range)。
    pub(crate) fn write_range(&self, offset: usize, src: &[u8]) {
        if src.is_empty() {
            return;
        }
        let (mut idx, mut local) = match self.index.locate(offset) {
            Some(pos) => pos,
            None => unreachable!("调用方已完成越界校验"),
        };
        let mut written = 0;
        while written < src.len() {
            let member = &self.members[idx];
            let avail = member.len - local;
            if avail == 0 {
                idx += 1;
                local = 0;
                continue;
            }
            let take = avail.min(src.len() - written);
            member
                .segment
                .copy_in(member.offset + local, &src[written..written + take]);
            written += take;
            idx += 1;
            local = 0;
        }
    }

    /// 定位全局偏移，供零拷贝游标复用。
    pub(crate) fn locate(&self, offset: usize) -> Option<(usize, usize)> {
        self.index.locate(offset)
    }
}

/// 组合构造的参数形态：分段、组合或视图。
///
/// # 设计背景（Why）
/// - 构造入口接受三种缓冲句柄的混合序列；Rust 侧以枚举聚合，
///   配合 `From` 转换（含引用版本）让调用端保留自己的句柄；
/// - 组合与视图在构造期即被拆解为叶子子区间，枚举不会进入成员序列。
#[derive(Debug)]
pub enum BufPart {
    /// 叶子分段，整段拼入。
    Segment(Segment),
    /// 既有组合，其扁平成员序列按序拼入。
    Composite(CompositeBuf),
    /// 视图，其覆盖的分段子区间按序拼入。
    View(BufView),
}

impl From<Segment> for BufPart {
    fn from(segment: Segment) -> Self {
        BufPart::Segment(segment)
    }
}

impl From<&Segment> for BufPart {
    fn from(segment: &Segment) -> Self {
        BufPart::Segment(segment.clone())
    }
}

impl From<CompositeBuf> for BufPart {
    fn from(composite: CompositeBuf) -> Self {
        BufPart::Composite(composite)
    }
}

impl From<&CompositeBuf> for BufPart {
    fn from(composite: &CompositeBuf) -> Self {
        BufPart::Composite(composite.clone())
    }
}

impl From<BufView> for BufPart {
    fn from(view: BufView) -> Self {
        BufPart::View(view)
    }
}

impl From<&BufView> for BufPart {
    fn from(view: &BufView) -> Self {
        BufPart::View(view.clone())
    }
}

/// 句柄内部状态：布局引用与句柄级转移标记。
struct CompositeInner {
    layout: Arc<Layout>,
    moved: AtomicBool,
}

/// `CompositeBuf` 是零拷贝拼接的对外句柄。
///
/// # 设计动机（Why）
/// - 把多块独立内存呈现为一个逻辑连续的字节区域，读写经偏移索引
///   路由到真实分段，调用方感知不到存储的非连续性；
/// - 成员分段的分离、以及句柄自身的转移，都在查询时点惰性合成为
///   统一的 `is_detached` / `len` 语义，无需任何通知设施。
///
/// # 架构关系（How）
/// - `layout`：`Arc` 共享的不可变布局（成员序列 + 偏移索引 + 类别）；
/// - `moved`：句柄级转移标记。[`transfer`](Self::transfer) 产生共享同一
///   布局的新句柄并翻转当前句柄的标记——这是与“分段分离”严格区分的
///   另一种失效来源，二者按逻辑或合成对外状态；
/// - [`Clone`] 产生同一句柄的别名（共享 `moved`），对齐宿主语言中
///   “同一缓冲对象的多个引用”：经任一别名转移，所有别名同时失效。
///
/// # 契约说明（What）
/// - **构造后不可变**：成员序列与索引冻结；句柄上唯一可变的是 `moved`；
/// - **状态合成**：`is_detached = moved || 任一成员分段已分离`，
///   `len = is_detached ? 0 : 成员长度之和`，每次查询重新求值；
/// - **字节访问**：分离句柄上的读写以 `buffer.detached_access` 失败，
///   绝不返回陈旧字节。
#[derive(Clone)]
pub struct CompositeBuf {
    inner: Arc<CompositeInner>,
}

impl CompositeBuf {
    /// 以独占类别拼接给定参数序列。
    ///
    /// # 校验顺序（What）
    /// 逐参数快速失败，单参数内依次校验：
    /// 1. 类别匹配（独占组合只接受独占成员）；
    /// 2. 成员不可增长；
    /// 3. 成员当前未分离（含已转移的组合句柄）。
    ///
    /// # 后置条件
    /// - 成功时返回全新组合，构造过程零字节拷贝，参数缓冲不受任何影响；
    /// - 失败时无可观察副作用——不存在部分构造。
    pub fn of(parts: impl IntoIterator<Item = BufPart>) -> Result<Self> {
        Self::assemble(parts, SegmentKind::Exclusive, true)
    }

    /// 以共享类别拼接给定参数序列。
    ///
    /// 共享内存没有宿主侧的分离路径，因此仅校验类别与可增长标记，
    /// 与独占版本的差异只在校验集合，扁平化逻辑完全一致。
    pub fn shared_of(parts: impl IntoIterator<Item = BufPart>) -> Result<Self> {
        Self::assemble(parts, SegmentKind::Shared, false)
    }

    fn assemble(
        parts: impl IntoIterator<Item = BufPart>,
        kind: SegmentKind,
        reject_detached: bool,
    ) -> Result<Self> {
        let mut members = Vec::new();
        for (position, part) in parts.into_iter().enumerate() {
            match part {
                BufPart::Segment(segment) => {
                    if segment.kind() != kind {
                        return Err(invalid_kind(position, kind, segment.kind()));
                    }
                    if segment.is_growable() {
                        return Err(BraidError::new(
                            codes::INVALID_ARGUMENT,
                            format!("组合构造失败：第 {position} 个参数为可增长分段"),
                        ));
                    }
                    if reject_detached && segment.is_detached() {
                        return Err(BraidError::new(
                            codes::INVALID_ARGUMENT,
                            format!("组合构造失败：第 {position} 个参数已分离"),
                        ));
                    }
                    let len = segment.raw_len();
                    members.push(SegmentSlice {
                        segment,
                        offset: 0,
                        len,
                    });
                }
                BufPart::Composite(composite) => {
                    if composite.kind() != kind {
                        return Err(invalid_kind(position, kind, composite.kind()));
                    }
                    if reject_detached && composite.is_detached() {
                        return Err(BraidError::new(
                            codes::INVALID_ARGUMENT,
                            format!("组合构造失败：第 {position} 个参数（组合）已分离或已转移"),
                        ));
                    }
                    members.extend(composite.inner.layout.members().iter().cloned());
                }
                BufPart::View(view) => {
                    if view.kind() != kind {
                        return Err(invalid_kind(position, kind, view.kind()));
                    }
                    if reject_detached && view.is_detached() {
                        return Err(BraidError::new(
                            codes::INVALID_ARGUMENT,
                            format!("组合构造失败：第 {position} 个参数（视图）已分离"),
                        ));
                    }
                    members.extend(view.slices());
                }
            }
        }
        Ok(Self::from_layout(Arc::new(Layout::new(members, kind))))
    }

    pub(crate) fn from_layout(layout: Arc<Layout>) -> Self {
        Self {
            inner: Arc::new(CompositeInner {
                layout,
                moved: AtomicBool::new(false),
            }),
        }
    }

    /// 将单个分段包装为组合，供物化结果与分段入口复用。
    pub(crate) fn from_single(segment: Segment) -> Self {
        Self::from_layout(Arc::new(Layout::single(segment)))
    }

    /// 返回组合的归属类别。
    pub fn kind(&self) -> SegmentKind {
        self.inner.layout.kind()
    }

    /// 返回扁平成员数量，用于观测扁平化行为。
    pub fn segment_count(&self) -> usize {
        self.inner.layout.members().len()
    }

    /// 返回句柄当前是否已分离（成员分离或句柄已转移）。
    pub fn is_detached(&self) -> bool {
        self.inner.moved.load(Ordering::Acquire) || self.inner.layout.any_detached()
    }

    /// 返回当前有效长度；分离句柄报告 0。
    pub fn len(&self) -> usize {
        if self.is_detached() {
            0
        } else {
            self.inner.layout.raw_total()
        }
    }

    /// 判断组合是否为空。
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 从逻辑偏移 `offset` 起读取 `dst.len()` 字节。
    pub fn read_at(&self, offset: usize, dst: &mut [u8]) -> Result<()> {
        self.check_byte_access(offset, dst.len(), "read_at")?;
        self.inner.layout.read_range(offset, dst);
        Ok(())
    }

    /// 从逻辑偏移 `offset` 起写入 `src` 全部字节。
    ///
    /// 写入直达底层分段：凡引用同一分段的其它组合、视图以及
    /// 外部原始持有者，都会观察到本次修改。
    pub fn write_at(&self, offset: usize, src: &[u8]) -> Result<()> {
        self.check_byte_access(offset, src.len(), "write_at")?;
        self.inner.layout.write_range(offset, src);
        Ok(())
    }

    /// 将 `[start, end)` 范围物化为全新的单分段组合。
    ///
    /// # 钳制语义（What）
    /// - 两端各自钳入 `[0, len()]`，`start >= end` 视为空范围而非错误；
    /// - 分离句柄的有效长度为 0，因此物化结果是空组合，同样不报错。
    ///
    /// # 隔离保证
    /// - 这是引擎中唯一的字节拷贝路径：结果持有独立的全新独占分段，
    ///   与全部来源分段彻底解耦，事后互不影响。
    pub fn slice(&self, start: usize, end: usize) -> CompositeBuf {
        materialize::slice_range(&self.inner.layout, 0, self.len(), start, end)
    }

    /// 在组合上打开非占有视图，窗口为 `[start, end)`。
    ///
    /// # 失败语义
    /// - `start` 严格大于当前有效长度时返回 `buffer.out_of_range`；
    ///   `end` 按惯例钳制，窗口可以为空。
    pub fn subarray(&self, start: usize, end: usize) -> Result<BufView> {
        BufView::open(Arc::clone(&self.inner.layout), self.len(), start, end)
    }

    /// 转移组合成员清单的所有权。
    ///
    /// # 语义要点（What）
    /// - 返回共享同一成员序列与偏移索引的新句柄；
    /// - 本句柄（及其全部克隆别名）随即进入“已转移”状态：后续查询
    ///   报告 `len() == 0`、`is_detached() == true`；
    /// - 底层分段不受影响——它们仍可经由其它组合、视图或外部
    ///   原始持有者照常读写；
    /// - 对已转移句柄再次调用返回 `buffer.already_moved`。
    pub fn transfer(&self) -> Result<CompositeBuf> {
        if self.inner.moved.swap(true, Ordering::AcqRel) {
            return Err(BraidError::new(
                codes::ALREADY_MOVED,
                "CompositeBuf::transfer 目标句柄已被转移",
            ));
        }
        Ok(Self::from_layout(Arc::clone(&self.inner.layout)))
    }

    /// 打开零拷贝读取游标，按 `bytes::Buf` 契约逐块消费内容。
    pub fn reader(&self) -> CompositeReader {
        CompositeReader::new(Arc::clone(&self.inner.layout))
    }

    /// 将当前有效内容复制为 `Vec<u8>`。
    ///
    /// 分离句柄返回 `buffer.detached_access`，与字节访问语义一致。
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        if self.is_detached() {
            return Err(BraidError::new(
                codes::DETACHED_ACCESS,
                "CompositeBuf::to_vec 拒绝访问已分离或已转移的句柄",
            ));
        }
        let mut out = alloc::vec![0u8; self.len()];
        self.read_at(0, &mut out)?;
        Ok(out)
    }

    fn check_byte_access(&self, offset: usize, wanted: usize, op: &'static str) -> Result<()> {
        if self.is_detached() {
            return Err(BraidError::new(
                codes::DETACHED_ACCESS,
                format!("CompositeBuf::{op} 拒绝访问已分离或已转移的句柄"),
            ));
        }
        let len = self.inner.layout.raw_total();
        if offset.checked_add(wanted).is_none_or(|end| end > len) {
            return Err(BraidError::new(
                codes::OUT_OF_RANGE,
                format!(
                    "CompositeBuf::{op} 越界：偏移 {offset} + 长度 {wanted} 超出有效长度 {len}"
                ),
            ));
        }
        Ok(())
    }
}

fn invalid_kind(position: usize, expected: SegmentKind, actual: SegmentKind) -> BraidError {
    BraidError::new(
        codes::INVALID_ARGUMENT,
        format!("组合构造失败：第 {position} 个参数类别 {actual:?} 与目标类别 {expected:?} 不符"),
    )
}

impl ByteRegion for CompositeBuf {
    fn len(&self) -> usize {
        CompositeBuf::len(self)
    }

    fn is_detached(&self) -> bool {
        CompositeBuf::is_detached(self)
    }

    fn read_at(&self, offset: usize, dst: &mut [u8]) -> Result<()> {
        CompositeBuf::read_at(self, offset, dst)
    }

    fn write_at(&self, offset: usize, src: &[u8]) -> Result<()> {
        CompositeBuf::write_at(self, offset, src)
    }
}

impl fmt::Debug for CompositeBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeBuf")
            .field("len", &self.len())
            .field("segments", &self.segment_count())
            .field("kind", &self.kind())
            .field("detached", &self.is_detached())
            .finish()
    }
}
