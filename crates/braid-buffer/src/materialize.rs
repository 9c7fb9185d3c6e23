//! 物化器：引擎唯一的字节拷贝路径。
//!
//! # 模块定位（Why）
//! - 组合、视图、分段三个入口的 `slice` 共享同一套物化逻辑：
//!   钳制范围 → 沿偏移索引逐成员拷贝 → 包装为全新单分段组合；
//! - 物化是调用方显式选择的“压平”动作，结果与全部来源彻底解耦——
//!   事后无论来源被改写还是分离，切片内容纹丝不动，反之亦然。

use alloc::{vec, vec::Vec};

use crate::composite::{CompositeBuf, Layout};
use crate::segment::Segment;

/// 将 `base` 起、有效长度 `effective` 的逻辑窗口中 `[start, end)`
/// 物化为全新的单分段组合。
///
/// # 契约说明（What）
/// - `start`、`end` 各自钳入 `[0, effective]`，`start >= end` 视为空范围；
/// - 分离来源的有效长度为 0，自然落入空范围分支，不触碰任何字节；
/// - 结果分段恒为独占类别——“独立、排他持有”是物化的语义核心，
///   与来源类别无关。
pub(crate) fn slice_range(
    layout: &Layout,
    base: usize,
    effective: usize,
    start: usize,
    end: usize,
) -> CompositeBuf {
    let start = start.min(effective);
    let end = end.min(effective);
    if start >= end {
        return CompositeBuf::from_single(Segment::exclusive(Vec::new()));
    }
    let mut out = vec![0u8; end - start];
    layout.read_range(base + start, &mut out);
    CompositeBuf::from_single(Segment::exclusive(out))
}
