//! 字节区域契约模块。
//!
//! # 模块架构（Why）
//! - 组合缓冲引擎对外呈现三种句柄：叶子分段、组合缓冲与非占有视图。
//!   三者的“长度 / 分离状态 / 随机读写”语义完全一致，
//!   因此抽象为统一的 [`ByteRegion`] 契约，让宿主的字节数组包装层
//!   只持有 `&dyn ByteRegion` 即可完成元素级读写。
//! - 独占与共享两类内存采用标签变体 [`SegmentKind`] 表达，
//!   避免两套并行的类型层次：寻址与分离逻辑完全相同，
//!   仅构造校验与并发契约存在差异。
//!
//! # 设计总览（How）
//! - [`ByteRegion`] 为对象安全 Trait，读写以“调用方提供切片”的拷贝式
//!   接口呈现，实现侧负责跨分段边界的迭代拷贝；
//! - 契约不暴露任何内部结构（成员序列、前缀和索引），
//!   实现细节留给引擎 crate 自由演进。

use crate::error::BraidError;
use crate::sealed::Sealed;

/// 分段内存的归属类别。
///
/// # 设计背景（Why）
/// - 独占区域由单一外部持有者拥有，转移原始缓冲会触发分离；
/// - 共享区域可被多个执行线索并发读写，引擎不在字节访问外加锁，
///   由宿主内存模型约束可见性。
///
/// # 契约说明（What）
/// - 类别在分段创建时确定，终生不变；
/// - 组合构造时要求成员类别一致：独占组合只接受独占成员，
///   共享组合只接受共享成员，混用视为参数错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// 独占内存：单一外部持有者，可被分离。
    Exclusive,
    /// 共享内存：允许多线索并发访问字节。
    Shared,
}

/// `ByteRegion` 定义对象安全的统一字节区域契约。
///
/// # 设计背景（Why）
/// - **对标实践**：沿用只读缓冲契约“观察-拷贝”的接口形态，
///   将分段、组合、视图三种句柄统一到同一抽象之下；
/// - **框架定位**：宿主绑定层（字节数组视图、流式管线）通过本契约
///   访问逻辑连续地址空间，无需感知底层分段是否连续；
/// - **扩展目标**：在 `no_std + alloc` 环境保持可用，实现侧可自由选择
///   前缀和索引、arena 等内部结构。
///
/// # 契约说明（What）
/// - **输入参数**：
///   - `read_at(offset, dst)` / `write_at(offset, src)` 的 `offset` 以字节计，
///     要求 `offset + 切片长度 <= len()`；
/// - **返回值**：
///   - 越界访问返回 `buffer.out_of_range`；
///   - 经由已分离句柄访问返回 `buffer.detached_access`，绝不返回陈旧字节；
/// - **前置条件**：实现必须满足 `Send + Sync`，以支撑跨线索共享句柄；
/// - **后置条件**：`len()` 与 `is_detached()` 永不失败——分离在状态查询层
///   不是错误，仅在字节解引用时才升级为错误。
///
/// # 设计考量（Trade-offs & Gotchas）
/// - **惰性状态**：`len`/`is_detached` 按查询时点对成员分段做线性扫描，
///   换取零失效通知设施；调用方在热路径应先查询状态再访问字节；
/// - **拷贝式读写**：接口只搬运请求的字节，绝不整段复制；
///   需要零拷贝块迭代时应使用引擎侧的 `bytes::Buf` 桥接游标；
/// - **并发语义**：共享类别下的并发字节访问不附加同步，
///   可见性由宿主内存模型负责，这是刻意保留的契约空白。
pub trait ByteRegion: Send + Sync + Sealed {
    /// 返回当前有效长度；已分离句柄报告 0。
    fn len(&self) -> usize;

    /// 返回句柄当前是否处于分离状态。
    fn is_detached(&self) -> bool;

    /// 从逻辑偏移 `offset` 起读取 `dst.len()` 字节。
    fn read_at(&self, offset: usize, dst: &mut [u8]) -> Result<(), BraidError>;

    /// 从逻辑偏移 `offset` 起写入 `src` 全部字节。
    fn write_at(&self, offset: usize, src: &[u8]) -> Result<(), BraidError>;

    /// 判断区域是否为空（长度为零或已分离）。
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
