//! 角色 Repository trait

use async_trait::async_trait;
use warden_common::UserId;
use warden_errors::AppResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// 所有角色都存在（且未删除）时返回 true
    async fn exists_all(&self, names: &[String]) -> AppResult<bool>;

    /// 创建角色
    async fn create(&self, name: &str, created_by: &UserId) -> AppResult<()>;
}
