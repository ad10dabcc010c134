//! 服务错误类型
//!
//! 各层错误（存储、覆盖范围目录）都经 `From` 收敛为 MenuError，由 API 层映射为 HTTP 状态码。

use thiserror::Error;

/// 排期与营养分析操作可能返回的错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MenuError {
    /// 请求本身不合法（日期倒置、无地点、状态不允许等）
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// 与已有 active / future 排期冲突，携带全部冲突地点名称
    #[error("Schedule conflict detected for locations: {}. There are already active or future schedules for these locations in the requested date range.", .0.join(", "))]
    Conflict(Vec<String>),

    /// 协作服务超时或不可达
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MenuError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
