//! 内部 sealed 模块用于控制外部扩展边界。
//!
//! # 设计背景（Why）
//! - `braid-core` 向外暴露可实现的区域契约（如 [`crate::region::ByteRegion`]），
//!   需要在 SemVer 框架下保持未来演进空间。
//! - 通过统一的 `Sealed` 标记，我们能够在不破坏公开 API 的情况下，
//!   为契约 Trait 增加默认方法或强化约束。
//!
//! # 逻辑解析（How）
//! - 定义私有模块级 Trait `Sealed`，并对所有类型提供 blanket 实现。
//! - 对外可实现的 Trait 通过 `: crate::sealed::Sealed` 间接依赖该标记，
//!   从而保留未来收紧实现集合的能力。
//!
//! # 契约说明（What）
//! - `Sealed` 无需调用方显式实现；任意类型默认满足该约束。
//! - 公共 Trait 的前置条件与返回契约仍在各自定义处描述，此模块仅负责“实现许可”。
//!
//! # 风险与考量（Trade-offs）
//! - Blanket 实现意味着当前并不限制实现者；若未来收紧条件，
//!   需同步发布兼容性公告并提供迁移指南。
pub(crate) trait Sealed {}

impl<T: ?Sized> Sealed for T {}
