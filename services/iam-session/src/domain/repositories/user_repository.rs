//! 用户 Repository trait

use async_trait::async_trait;
use warden_errors::AppResult;

use crate::domain::user::User;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 根据用户名查找用户（已软删除的不返回）
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// 根据邮箱查找用户（已软删除的不返回）
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// 保存用户
    async fn save(&self, user: &User) -> AppResult<()>;
}
