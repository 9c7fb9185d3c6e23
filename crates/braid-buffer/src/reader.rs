//! 零拷贝读取游标：组合缓冲到 `bytes::Buf` 生态的桥接。
//!
//! # 模块定位（Why）
//! - 流式管线一类的消费方习惯以 `bytes::Buf` 的“块迭代”姿势消费数据；
//!   拷贝式的 `read_at` 对它们是不必要的搬运；
//! - 游标按成员顺序逐块暴露分段内部的连续区间，跨成员推进由游标
//!   自己完成，消费方看到的是一个普通的 `Buf`。
//!
//! # 设计概要（How）
//! - 游标持有布局的 `Arc` 引用：分段存储在游标存活期内必然有效；
//! - `bytes::Buf` 没有失败通道，分离语义在此降级为“读尽”：
//!   一旦任一成员分段分离，`remaining()` 立即报告 0，`chunk()` 返回
//!   空切片——宁可提前终止，绝不交出陈旧字节。

use alloc::sync::Arc;
use core::fmt;

use bytes::Buf;

use crate::composite::Layout;

/// `CompositeReader` 是组合内容的一次性前向读取游标。
///
/// # 契约说明（What）
/// - **前置条件**：消费期间调用方不得并发改写所覆盖的分段内容；
///   这与只读缓冲契约“切片生命周期内不得触发可变访问”的约束同源；
/// - **后置条件**：`advance` 之后 `remaining` 单调不增；游标推进
///   不影响来源组合或其它读取方；
/// - **分离降级**：分离发生后游标表现为已读尽，消费方按正常的
///   流结束路径退出。
pub struct CompositeReader {
    layout: Arc<Layout>,
    pos: usize,
}

impl CompositeReader {
    pub(crate) fn new(layout: Arc<Layout>) -> Self {
        Self { layout, pos: 0 }
    }

    /// 已消费的字节数。
    pub fn consumed(&self) -> usize {
        self.pos
    }
}

impl Buf for CompositeReader {
    fn remaining(&self) -> usize {
        if self.layout.any_detached() {
            return 0;
        }
        self.layout.raw_total() - self.pos
    }

    fn chunk(&self) -> &[u8] {
        if self.layout.any_detached() {
            return &[];
        }
        let Some((idx, local)) = self.layout.locate(self.pos) else {
            return &[];
        };
        let member = &self.layout.members()[idx];
        let len = member.len - local;
        let base = member.segment.chunk_ptr();
        // SAFETY：`locate` 保证 `local < member.len`，指针区间落在分段
        // 存储内部；布局的 `Arc` 引用维持存储存活；调用方遵守“消费期间
        // 不并发改写”的契约，借用期间内容稳定。
        unsafe {
            core::slice::from_raw_parts(base.add(member.offset + local), len)
        }
    }

    fn advance(&mut self, cnt: usize) {
        let remaining = self.remaining();
        assert!(
            cnt <= remaining,
            "CompositeReader::advance 超出剩余字节：请求 {cnt}，剩余 {remaining}"
        );
        self.pos += cnt;
    }
}

impl fmt::Debug for CompositeReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeReader")
            .field("pos", &self.pos)
            .field("total", &self.layout.raw_total())
            .finish()
    }
}
