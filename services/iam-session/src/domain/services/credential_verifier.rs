//! 凭证校验

use std::sync::Arc;

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use async_trait::async_trait;
use rand::rngs::OsRng;
use warden_errors::{AppError, AppResult};

use crate::domain::credentials::LoginIdentifier;
use crate::domain::repositories::UserRepository;
use crate::domain::user::User;

/// 凭证校验能力
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// 按用户名或邮箱查找用户
    async fn resolve(&self, identifier: &LoginIdentifier) -> AppResult<Option<User>>;

    /// 比较明文密码与存储的哈希
    async fn verify_password(&self, plain: &str, hash: &str) -> AppResult<bool>;
}

/// 基于 argon2 的实现
pub struct Argon2CredentialVerifier {
    users: Arc<dyn UserRepository>,
}

impl Argon2CredentialVerifier {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl CredentialVerifier for Argon2CredentialVerifier {
    async fn resolve(&self, identifier: &LoginIdentifier) -> AppResult<Option<User>> {
        match identifier {
            LoginIdentifier::Username(username) => self.users.find_by_username(username).await,
            LoginIdentifier::Email(email) => self.users.find_by_email(email).await,
        }
    }

    async fn verify_password(&self, plain: &str, hash: &str) -> AppResult<bool> {
        let plain = plain.to_owned();
        let hash = hash.to_owned();
        // argon2 计算量大，放到阻塞线程池
        tokio::task::spawn_blocking(move || verify_hash(&plain, &hash))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {}", e)))?
    }
}

/// 生成 argon2id PHC 格式哈希
pub fn hash_password(plain: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))
}

fn verify_hash(plain: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("Invalid password hash: {}", e)))?;

    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}
