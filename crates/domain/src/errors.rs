//! 领域模型错误定义
//!
//! 撮合与行程会话的统一错误分类。授权失败和状态守卫失败只回报给调用方，
//! 不会中断会话。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 调用方不是该资源的参与者
    #[error("not a party to this resource")]
    Unauthorized,

    /// 活跃行程守卫：还有未到达的行程时不能再次加入撮合
    #[error("already in a ride")]
    AlreadyInRide,

    /// 乘客已经有一条待撮合请求
    #[error("a ride request is already pending")]
    AlreadyQueued,

    /// 资源不存在（含并发竞争下请求已被撮合或取消的情形）
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// 行程已到达，不接受再次到达
    #[error("ride already arrived")]
    AlreadyArrived,

    /// 当前角色或状态不允许该操作
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },

    /// 参数验证错误
    #[error("invalid argument: {field}: {reason}")]
    InvalidArgument { field: String, reason: String },
}

impl DomainError {
    /// 创建资源不存在错误
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// 创建状态错误
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    /// 创建参数验证错误
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;
