//! 偏移索引：成员序列上的前缀和查找表。
//!
//! # 模块定位（Why）
//! - 组合缓冲的随机寻址需要把“全局逻辑偏移”翻译为“（成员下标，段内偏移）”；
//! - 成员序列构造后不可变，因此一张只读前缀和表即可支撑 O(log n) 查找，
//!   无需树形结构或增量维护。
//!
//! # 设计概要（How）
//! - `ends[i]` 记录前 `i + 1` 个成员的累计长度（即成员 `i` 的逻辑末端）；
//! - [`locate`](OffsetIndex::locate) 用 `partition_point` 找到第一个
//!   `end > offset` 的成员：该判定天然跳过零长成员，保证返回的段内
//!   偏移严格落在成员内部。

use alloc::boxed::Box;

/// 只读的前缀和查找表，随组合构造一次生成。
#[derive(Debug)]
pub(crate) struct OffsetIndex {
    ends: Box<[usize]>,
}

impl OffsetIndex {
    /// 依据成员长度序列构建索引。
    pub(crate) fn build(lens: impl Iterator<Item = usize>) -> Self {
        let mut acc = 0usize;
        let ends = lens
            .map(|len| {
                acc += len;
                acc
            })
            .collect();
        Self { ends }
    }

    /// 全部成员的累计总长。
    pub(crate) fn total(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    /// 成员 `idx` 的逻辑起点。
    pub(crate) fn start_of(&self, idx: usize) -> usize {
        if idx == 0 { 0 } else { self.ends[idx - 1] }
    }

    /// 将全局偏移翻译为（成员下标，段内偏移）。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：`offset < total()`，越界由调用方先行校验；
    /// - **返回值**：命中的成员下标与段内偏移，保证段内偏移小于成员长度；
    /// - 零长成员永远不会被命中：其逻辑区间为空。
    pub(crate) fn locate(&self, offset: usize) -> Option<(usize, usize)> {
        if offset >= self.total() {
            return None;
        }
        let idx = self.ends.partition_point(|&end| end <= offset);
        Some((idx, offset - self.start_of(idx)))
    }
}

#[cfg(test)]
mod tests {
    use super::OffsetIndex;

    /// 空索引的总长为零，任何偏移都无法命中。
    #[test]
    fn empty_index_reports_zero_total() {
        let index = OffsetIndex::build([].into_iter());
        assert_eq!(index.total(), 0);
        assert!(index.locate(0).is_none());
    }

    /// 常规序列下边界偏移应落入正确成员。
    #[test]
    fn locate_resolves_member_boundaries() {
        let index = OffsetIndex::build([4usize, 6, 2].into_iter());
        assert_eq!(index.total(), 12);
        assert_eq!(index.locate(0), Some((0, 0)));
        assert_eq!(index.locate(3), Some((0, 3)));
        assert_eq!(index.locate(4), Some((1, 0)));
        assert_eq!(index.locate(9), Some((1, 5)));
        assert_eq!(index.locate(10), Some((2, 0)));
        assert_eq!(index.locate(11), Some((2, 1)));
        assert!(index.locate(12).is_none());
    }

    /// 零长成员不占逻辑区间，查找应直接跳过。
    #[test]
    fn locate_skips_zero_length_members() {
        let index = OffsetIndex::build([0usize, 5, 0, 3].into_iter());
        assert_eq!(index.locate(0), Some((1, 0)));
        assert_eq!(index.locate(4), Some((1, 4)));
        assert_eq!(index.locate(5), Some((3, 0)));
    }

    /// 全零长序列等价于空缓冲。
    #[test]
    fn all_zero_members_behave_like_empty() {
        let index = OffsetIndex::build([0usize, 0, 0].into_iter());
        assert_eq!(index.total(), 0);
        assert!(index.locate(0).is_none());
    }
}
