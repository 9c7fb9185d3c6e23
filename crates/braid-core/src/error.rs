//! 组合缓冲引擎的稳定错误域。
//!
//! # 模块定位（Why）
//! - 分段注册、偏移寻址、物化与所有权转移在不同层次产生的故障，
//!   需要合流为一组稳定错误码，方便调用方执行精确的自动化兜底；
//! - 引擎需兼容 `no_std + alloc` 场景，因此不依赖 `std::error::Error`，
//!   而是基于 `core::error::Error` 构建轻量错误链。
//!
//! # 设计概要（How）
//! - [`BraidError`] 以“稳定码 + 人读消息 + 可选根因”三元组承载错误；
//! - [`codes`] 模块集中登记 `<域>.<语义>` 形态的码值，杜绝散落的魔法字符串；
//! - [`ErrorKind`] 提供机读分类，由码值查表推导，驱动调用方的分支处理。

use alloc::borrow::Cow;
use alloc::boxed::Box;
use core::error::Error;
use core::fmt;

/// 统一的结果别名，默认错误类型为 [`BraidError`]。
pub type Result<T, E = BraidError> = core::result::Result<T, E>;

/// 根因链路中存放的对象安全错误类型。
pub type ErrorCause = Box<dyn Error + Send + Sync + 'static>;

/// `BraidError` 是引擎全部可观察错误的最终形态。
///
/// # 设计背景（Why）
/// - 组合缓冲的调用方（字节视图包装层、流式管线）需要据错误码决定兜底策略：
///   参数校验失败应直接上抛，分离访问失败则提示“先查询 `is_detached` 再访问”；
/// - 错误码为 `'static` 字符串，承载稳定语义；`message` 面向排障人员，
///   允许携带动态上下文（如越界时的请求长度与实际长度）。
///
/// # 契约说明（What）
/// - **前置条件**：构造时必须使用 [`codes`] 模块的码值，或遵循 `<域>.<语义>` 约定；
/// - **返回值**：构造函数返回拥有所有权的 `BraidError`，满足 `Send + Sync + 'static`；
/// - **后置条件**：除非显式调用 [`with_cause`](Self::with_cause)，错误不含根因链。
///
/// # 设计取舍（Trade-offs）
/// - 使用 `Cow<'static, str>` 保存消息：静态文案零分配，动态上下文仅一次堆分配；
/// - 不内置回溯采集，保持在 `no_std + alloc` 下可用。
#[derive(Debug)]
pub struct BraidError {
    code: &'static str,
    message: Cow<'static, str>,
    cause: Option<ErrorCause>,
}

impl BraidError {
    /// 构造引擎错误。
    ///
    /// # 契约定义（What）
    /// - `code`：稳定错误码，调用方应取自 [`codes`]；
    /// - `message`：面向排障人员的描述，可为静态或堆分配字符串；
    /// - **后置条件**：返回的错误不含根因，可继续通过 [`with_cause`](Self::with_cause) 叠加。
    pub fn new(code: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    /// 附带底层原因并返回新的错误。
    pub fn with_cause(mut self, cause: impl Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// 获取稳定错误码。
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// 获取人读描述。
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 获取底层原因。
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }

    /// 返回机读错误分类。
    ///
    /// # 返回契约
    /// - 码值在 [`codes`] 中登记时返回对应分类；
    /// - 自定义码值回退为 [`ErrorKind::Other`]，提醒调用方补充登记。
    pub fn kind(&self) -> ErrorKind {
        match self.code {
            codes::INVALID_ARGUMENT => ErrorKind::InvalidArgument,
            codes::OUT_OF_RANGE => ErrorKind::OutOfRange,
            codes::DETACHED_ACCESS => ErrorKind::DetachedAccess,
            codes::ALREADY_MOVED => ErrorKind::AlreadyMoved,
            _ => ErrorKind::Other,
        }
    }
}

impl fmt::Display for BraidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for BraidError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_ref()
            .map(|boxed| boxed.as_ref() as &(dyn Error + 'static))
    }
}

/// 机读错误分类，驱动调用方的自动化分支。
///
/// # 设计背景（Why）
/// - 上层不应通过解析字符串推断语义；分类枚举让“校验失败 / 越界 / 分离访问 / 重复转移”
///   四类处置策略可以直接 `match`；
/// - 与 [`codes`] 一一对应，新增码值时必须同步扩展本枚举与 [`BraidError::kind`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// 构造参数不合法：类型不符、可增长成员、或向 `of` 传入已分离成员。
    InvalidArgument,
    /// 偏移超出可表达范围，且语义上不适用钳制。
    OutOfRange,
    /// 经由已分离句柄发起字节级访问。
    DetachedAccess,
    /// 对已转移句柄再次执行 `transfer`。
    AlreadyMoved,
    /// 未登记的自定义码值。
    Other,
}

/// 稳定错误码集合。
///
/// # 设计背景（Why）
/// - 错误码遵循 `<域>.<语义>` 命名约定，方便在跨组件日志中检索与聚合；
/// - 码值一经发布即冻结，重命名视为破坏性变更。
///
/// # 契约说明（What）
/// - **使用前提**：码值应由实现封装进 [`BraidError`]，并确保消息中携带完整上下文；
/// - **返回承诺**：调用方收到码值后，可据此触发兜底（先查询状态、改走拷贝路径、
///   或将重复转移视为编程错误上报）。
pub mod codes {
    /// 构造参数不合法：类型不符、可增长成员、或已分离成员。
    pub const INVALID_ARGUMENT: &str = "buffer.invalid_argument";
    /// 偏移越界且不适用钳制语义。
    pub const OUT_OF_RANGE: &str = "buffer.out_of_range";
    /// 经由已分离句柄访问字节。
    pub const DETACHED_ACCESS: &str = "buffer.detached_access";
    /// 对已转移句柄重复执行转移。
    pub const ALREADY_MOVED: &str = "buffer.already_moved";
}
