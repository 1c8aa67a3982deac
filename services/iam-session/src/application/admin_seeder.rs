//! 首次启动时创建管理员角色和账号

use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::info;
use warden_common::UserId;
use warden_config::AdminConfig;
use warden_errors::AppResult;

use crate::domain::repositories::{RoleRepository, UserRepository};
use crate::domain::services::hash_password;
use crate::domain::user::User;

pub struct AdminSeeder {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
}

impl AdminSeeder {
    pub fn new(users: Arc<dyn UserRepository>, roles: Arc<dyn RoleRepository>) -> Self {
        Self { users, roles }
    }

    /// 幂等：已存在的角色和用户直接跳过
    pub async fn seed(&self, admin: &AdminConfig) -> AppResult<()> {
        let system = UserId::nil();

        if self.roles.exists_all(std::slice::from_ref(&admin.role)).await? {
            info!(role = %admin.role, "Admin role already exists");
        } else {
            self.roles.create(&admin.role, &system).await?;
            info!(role = %admin.role, "Admin role created");
        }

        if self.users.find_by_username(&admin.username).await?.is_some() {
            info!(username = %admin.username, "Admin user already exists");
            return Ok(());
        }

        let password_hash = hash_password(admin.password.expose_secret())?;
        let user = User::new(
            admin.name.clone(),
            admin.username.clone(),
            admin.email.clone(),
            password_hash,
            vec![admin.role.clone()],
            system,
        );
        self.users.save(&user).await?;

        info!(user_id = %user.id, username = %user.username, "Admin user created");
        Ok(())
    }
}
