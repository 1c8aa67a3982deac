//! 用户实体（会话存储只读取其凭证）

use chrono::{DateTime, Utc};
use warden_common::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub email: String,
    /// argon2 PHC 格式哈希
    pub password_hash: String,
    pub roles: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: UserId,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        roles: Vec<String>,
        created_by: UserId,
    ) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            roles,
            is_active: true,
            created_at: Utc::now(),
            created_by,
        }
    }
}
