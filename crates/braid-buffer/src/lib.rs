#![cfg_attr(not(feature = "std"), no_std)]

//! `braid-buffer` 实现零拷贝组合缓冲引擎。
//!
//! # 模块定位（Why）
//! - 为 `braid-core` 的 [`ByteRegion`](braid_core::ByteRegion) 契约提供
//!   完整的引擎实现：把若干独立持有的内存分段逻辑拼接为一个连续
//!   字节区域，读写如同单块内存，构造却不搬运任何字节。
//! - 承载三类“通常默认单块连续分配”的操作在多分段结构上的正确语义：
//!   随机偏移寻址、不可逆的分离传播、以及不得悄然破坏别名结构的
//!   所有权转移。
//!
//! # 设计概要（How）
//! - `segment` 登记叶子内存区域与单向分离标记；
//! - `offset_index` 以前缀和表支撑 O(log n) 的偏移翻译；
//! - `composite` 在构造期彻底扁平化成员并暴露组合句柄；
//! - `view` 提供非占有窗口，状态按覆盖子集惰性推导；
//! - `materialize` 是引擎唯一的字节拷贝路径（显式压平）；
//! - `reader` 把组合桥接到 `bytes::Buf` 生态，供流式消费方逐块读取。
//!
//! # 命名约定（Consistency）
//! - 对外类型沿用缓冲生态的通用术语（`Segment`、`BufView`、`Buf` 桥接），
//!   不引入业务前缀，保证与 `bytes` 等生态互操作时的阅读体验一致。

extern crate alloc;

mod composite;
mod materialize;
mod offset_index;
mod reader;
mod segment;
mod view;

pub use composite::{BufPart, CompositeBuf};
pub use reader::CompositeReader;
pub use segment::Segment;
pub use view::BufView;
