//! 服务错误定义

use std::time::Duration;

use thiserror::Error;
use warden_errors::AppError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("max batch ({max_batch}) must be less than buffer size ({buffer_size})")]
    MaxBiggerThanBuffer { max_batch: usize, buffer_size: usize },

    #[error("flush interval must be greater or equal to 1 second, got {0:?}")]
    ClockTooSmall(Duration),

    #[error("Invalid session store configuration: {0}")]
    InvalidConfig(String),

    #[error("Ledger writer already started")]
    AlreadyStarted,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Password does not match")]
    PasswordMismatch,

    #[error("Session not found")]
    SessionNotFound,

    /// 存储的密码哈希无法校验（数据损坏，不是密码错误）
    #[error("Stored credential could not be verified: {0}")]
    CredentialCheck(#[source] AppError),

    #[error("Session storage unavailable: {0}")]
    StorageUnavailable(#[source] AppError),

    #[error("Ledger writer is stopped")]
    LedgerClosed,

    #[error("Failed to insert {count} sessions into {table}: {source}")]
    LedgerFlush {
        table: &'static str,
        count: usize,
        #[source]
        source: AppError,
    },

    #[error("Failed to encode session: {0}")]
    Codec(String),
}

impl SessionError {
    /// 调用方可预期的错误（不应按故障记录）
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::UserNotFound | Self::PasswordMismatch | Self::SessionNotFound
        )
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Validation(msg) => AppError::validation(msg),
            SessionError::UserNotFound => AppError::not_found("User not found"),
            SessionError::SessionNotFound => AppError::not_found("Session not found"),
            SessionError::PasswordMismatch => AppError::unauthorized("Password does not match"),
            SessionError::StorageUnavailable(source) => {
                AppError::external_service(source.to_string())
            }
            SessionError::LedgerFlush { source, .. } => source,
            SessionError::CredentialCheck(source) => AppError::internal(source.to_string()),
            other @ (SessionError::MaxBiggerThanBuffer { .. }
            | SessionError::ClockTooSmall(_)
            | SessionError::InvalidConfig(_)
            | SessionError::AlreadyStarted
            | SessionError::LedgerClosed
            | SessionError::Codec(_)) => AppError::internal(other.to_string()),
        }
    }
}
