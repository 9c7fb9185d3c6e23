//! 视图：组合或分段之上的非占有窗口。
//!
//! # 模块定位（Why）
//! - 视图以（布局引用，窗口起点，窗口长度）描述一段逻辑子区间，
//!   不复制字节、不引入新的所有权声明——它只是对同一批分段的
//!   又一个结构性引用；
//! - 视图之上再开视图时按偏移相加扁平化，与组合构造的扁平化原则
//!   一致：任何访问路径的间接层数恒为 1。
//!
//! # 设计概要（How）
//! - 窗口在创建时按当时的有效长度钳制；此后父级若因分段分离而
//!   “缩水”，视图在查询时点对自身覆盖的成员子集重新推导状态；
//! - 分离判定采用保守规则：窗口与任一已分离分段重叠即整体视为
//!   分离；空窗口不与任何成员重叠，因此永远未分离。

use alloc::sync::Arc;
use alloc::{format, vec::Vec};
use core::fmt;

use braid_core::{BraidError, ByteRegion, Result, SegmentKind, codes};

use crate::composite::{CompositeBuf, Layout, SegmentSlice};
use crate::materialize;

/// `BufView` 是组合或分段之上的非占有窗口。
///
/// # 契约说明（What）
/// - **创建时边界**：`start` 严格大于创建时点有效长度即拒绝；
///   `end` 钳入有效长度，窗口可以为空；
/// - **状态推导**：`is_detached` 只考察窗口覆盖的成员子集；
///   `len` 在分离时报告 0，否则报告创建时解析的窗口长度；
/// - **生命周期**：视图经 `Arc` 共享布局，从而维持分段存活；
///   这与普通共享所有权一致，不构成额外的生命周期延长；
/// - **转移不波及**：父组合句柄被 `transfer` 后，视图照常访问
///   未受触动的底层分段——与“其它组合仍可访问”的语义对齐。
#[derive(Clone)]
pub struct BufView {
    layout: Arc<Layout>,
    start: usize,
    len: usize,
}

impl BufView {
    /// 依据创建时点的有效长度 `effective` 打开窗口 `[start, end)`。
    ///
    /// # 失败语义
    /// - `start > effective` 返回 `buffer.out_of_range`；
    /// - `end` 钳入 `[start, effective]`，窗口允许为空。
    pub(crate) fn open(
        layout: Arc<Layout>,
        effective: usize,
        start: usize,
        end: usize,
    ) -> Result<Self> {
        if start > effective {
            return Err(BraidError::new(
                codes::OUT_OF_RANGE,
                format!("视图创建失败：起点 {start} 超出当前有效长度 {effective}"),
            ));
        }
        let end = end.min(effective).max(start);
        Ok(Self {
            layout,
            start,
            len: end - start,
        })
    }

    /// 返回视图的归属类别（继承自底层布局）。
    pub fn kind(&self) -> SegmentKind {
        self.layout.kind()
    }

    /// 返回视图当前是否已分离（窗口与任一已分离分段重叠）。
    pub fn is_detached(&self) -> bool {
        self.layout.any_detached_in(self.start, self.len)
    }

    /// 返回当前有效长度；分离视图报告 0。
    pub fn len(&self) -> usize {
        if self.is_detached() { 0 } else { self.len }
    }

    /// 判断视图是否为空。
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 从窗口内偏移 `offset` 起读取 `dst.len()` 字节。
    pub fn read_at(&self, offset: usize, dst: &mut [u8]) -> Result<()> {
        self.check_byte_access(offset, dst.len(), "read_at")?;
        self.layout.read_range(self.start + offset, dst);
        Ok(())
    }

    /// 从窗口内偏移 `offset` 起写入 `src` 全部字节。
    pub fn write_at(&self, offset: usize, src: &[u8]) -> Result<()> {
        self.check_byte_access(offset, src.len(), "write_at")?;
        self.layout.write_range(self.start + offset, src);
        Ok(())
    }

    /// 将窗口内 `[start, end)` 物化为全新的单分段组合。
    ///
    /// 钳制语义与 [`CompositeBuf::slice`] 一致；分离视图的有效长度
    /// 为 0，物化结果即空组合。
    pub fn slice(&self, start: usize, end: usize) -> CompositeBuf {
        materialize::slice_range(&self.layout, self.start, self.len(), start, end)
    }

    /// 在视图上再开窗口，按偏移相加扁平化为同层视图。
    ///
    /// 结果仍直接引用底层布局，不新增间接层；边界语义与
    /// [`CompositeBuf::subarray`] 一致。
    pub fn subarray(&self, start: usize, end: usize) -> Result<BufView> {
        let effective = self.len();
        if start > effective {
            return Err(BraidError::new(
                codes::OUT_OF_RANGE,
                format!("视图创建失败：起点 {start} 超出当前有效长度 {effective}"),
            ));
        }
        let end = end.min(effective).max(start);
        Ok(Self {
            layout: Arc::clone(&self.layout),
            start: self.start + start,
            len: end - start,
        })
    }

    /// 窗口覆盖的分段子区间序列，供组合构造的扁平化拼接。
    pub(crate) fn slices(&self) -> Vec<SegmentSlice> {
        self.layout.slices_in(self.start, self.len)
    }

    fn check_byte_access(&self, offset: usize, wanted: usize, op: &'static str) -> Result<()> {
        if self.is_detached() {
            return Err(BraidError::new(
                codes::DETACHED_ACCESS,
                format!("BufView::{op} 拒绝访问已分离的视图"),
            ));
        }
        if offset.checked_add(wanted).is_none_or(|end| end > self.len) {
            return Err(BraidError::new(
                codes::OUT_OF_RANGE,
                format!(
                    "BufView::{op} 越界：偏移 {offset} + 长度 {wanted} 超出窗口长度 {}",
                    self.len
                ),
            ));
        }
        Ok(())
    }
}

impl ByteRegion for BufView {
    fn len(&self) -> usize {
        BufView::len(self)
    }

    fn is_detached(&self) -> bool {
        BufView::is_detached(self)
    }

    fn read_at(&self, offset: usize, dst: &mut [u8]) -> Result<()> {
        BufView::read_at(self, offset, dst)
    }

    fn write_at(&self, offset: usize, src: &[u8]) -> Result<()> {
        BufView::write_at(self, offset, src)
    }
}

impl fmt::Debug for BufView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufView")
            .field("start", &self.start)
            .field("len", &self.len)
            .field("kind", &self.kind())
            .field("detached", &self.is_detached())
            .finish()
    }
}
