//! 会话实体

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_common::UserId;

/// 会话 ID
///
/// 不透明的随机标识，作为缓存键使用，不可复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(warden_common::random_id())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 会话
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    /// 显式终止或过期扫描时写入
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Session {
    /// 创建新会话，`expires = now + ttl`
    pub fn new(user_id: UserId, ttl: Duration) -> Self {
        let now = Utc::now();
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        Self {
            id: SessionId::new(),
            user_id,
            created_at: now,
            expires: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            deleted_at: None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }

    pub fn is_terminated(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// 标记终止
    pub fn terminate(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================
    // 创建
    // ============================================================

    #[test]
    fn test_new_session_expires_after_ttl() {
        let user_id = UserId::new();
        let session = Session::new(user_id, Duration::from_secs(60));

        assert_eq!(session.user_id, user_id);
        assert_eq!(session.expires - session.created_at, TimeDelta::seconds(60));
        assert!(!session.is_terminated());
        assert!(!session.is_expired_at(session.created_at));
        assert!(session.is_expired_at(session.expires));
    }

    #[test]
    fn test_session_ids_are_unique() {
        let user_id = UserId::new();
        let a = Session::new(user_id, Duration::from_secs(1));
        let b = Session::new(user_id, Duration::from_secs(1));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_session_id_parse() {
        let id = SessionId::new();
        assert_eq!(SessionId::parse(&id.to_string()).unwrap(), id);
        assert!(SessionId::parse("not-a-uuid").is_err());
    }

    // ============================================================
    // 生命周期
    // ============================================================

    #[test]
    fn test_terminate_sets_deleted_at() {
        let mut session = Session::new(UserId::new(), Duration::from_secs(60));
        let at = Utc::now();
        session.terminate(at);
        assert_eq!(session.deleted_at, Some(at));
    }
}
