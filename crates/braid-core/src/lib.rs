#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![allow(private_bounds)]
#![doc = "braid-core: 零拷贝组合缓冲引擎的核心契约。"]
#![doc = ""]
#![doc = "== 兼容性与版本治理 =="]
#![doc = "本 Crate 遵守语义化版本 2.0 (SemVer)。错误码一经发布即冻结，"]
#![doc = "重命名或删除码值均视为破坏性变更，仅允许在 MAJOR 版本引入。"]
#![doc = ""]
#![doc = "== 内存分配依赖 =="]
#![doc = "`braid-core` 定位于 `no_std + alloc` 场景：错误链与消息文本依赖 `Box`、`Cow` 等堆类型。"]
#![doc = "纯 `no_std`（无分配器）环境暂不支持；若在无堆平台使用，需由调用方提供等价设施。"]

extern crate alloc;

mod sealed;

pub mod error;
pub mod prelude;
pub mod region;

pub use error::{BraidError, ErrorKind, Result, codes};
pub use region::{ByteRegion, SegmentKind};
