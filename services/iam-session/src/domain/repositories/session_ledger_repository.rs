//! 会话账本 Repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use warden_common::{Pagination, UserId};
use warden_errors::AppResult;

use crate::domain::session::Session;

/// 账本表类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerKind {
    Created,
    Terminated,
}

impl LedgerKind {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Created => "users_sessions_created",
            Self::Terminated => "users_sessions_deleted",
        }
    }
}

/// 会话账本：只追加的创建 / 终止记录
#[async_trait]
pub trait SessionLedgerRepository: Send + Sync {
    /// 批量追加；同一 id 已存在时忽略
    async fn append(&self, kind: LedgerKind, sessions: &[Session]) -> AppResult<()>;

    /// 已创建、未终止且 `expires <= now` 的会话
    async fn find_expired_unterminated(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<Session>>;

    /// 已创建、未终止且未过期的会话
    async fn find_active(
        &self,
        user_id: Option<&UserId>,
        now: DateTime<Utc>,
        pagination: &Pagination,
    ) -> AppResult<Vec<Session>>;

    /// 已终止的会话
    async fn find_inactive(
        &self,
        user_id: Option<&UserId>,
        pagination: &Pagination,
    ) -> AppResult<Vec<Session>>;
}
