//! # braid-core Prelude
//!
//! ## 教案级说明（Why）
//! - **统一导入面**：为引擎实现与宿主绑定层提供稳定、浅路径的导入入口，
//!   避免业务代码中出现大量 `braid_core::region::...` 深层路径；
//! - **范围控制**：仅收录跨模块高频依赖的契约类型，
//!   防止 Prelude 无限膨胀稀释可读性。
//!
//! ## 收录内容（What）
//! - 错误体系：[`BraidError`]、[`ErrorKind`]、[`Result`]；
//! - 区域契约：[`ByteRegion`]、[`SegmentKind`]。

pub use crate::error::{BraidError, ErrorKind, Result};
pub use crate::region::{ByteRegion, SegmentKind};
