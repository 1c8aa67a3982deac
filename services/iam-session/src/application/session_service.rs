//! 会话服务
//!
//! 只同步读写活跃缓存；账本由写后队列异步维护，查询接口只读账本。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use secrecy::ExposeSecret;
use tracing::{debug, error, info, warn};
use warden_common::{Pagination, UserId};

use crate::domain::credentials::CredentialInput;
use crate::domain::repositories::SessionLedgerRepository;
use crate::domain::services::CredentialVerifier;
use crate::domain::session::{Session, SessionId};
use crate::error::SessionError;
use crate::infrastructure::cache::ActiveSessionCache;

/// 单页最多返回的会话数
pub const MAX_PAGE_SIZE: u32 = 1000;

pub struct SessionService {
    cache: ActiveSessionCache,
    ledger: Arc<dyn SessionLedgerRepository>,
    verifier: Arc<dyn CredentialVerifier>,
    ttl: Duration,
}

impl SessionService {
    pub fn new(
        cache: ActiveSessionCache,
        ledger: Arc<dyn SessionLedgerRepository>,
        verifier: Arc<dyn CredentialVerifier>,
        ttl: Duration,
    ) -> Self {
        Self {
            cache,
            ledger,
            verifier,
            ttl,
        }
    }

    /// 校验凭证并创建会话
    pub async fn create(&self, input: &CredentialInput) -> Result<Session, SessionError> {
        let identifier = input.validate()?;

        let user = self
            .verifier
            .resolve(&identifier)
            .await
            .map_err(SessionError::StorageUnavailable)?
            .ok_or_else(|| {
                debug!(%identifier, "User not found");
                SessionError::UserNotFound
            })?;

        let matched = self
            .verifier
            .verify_password(input.password.expose_secret(), &user.password_hash)
            .await
            .map_err(|e| {
                error!(user_id = %user.id, error = %e, "Stored password hash cannot be verified");
                SessionError::CredentialCheck(e)
            })?;
        if !matched {
            warn!(user_id = %user.id, "Password mismatch");
            return Err(SessionError::PasswordMismatch);
        }

        let session = Session::new(user.id, self.ttl);
        self.cache.put(&session, self.ttl).await?;

        info!(session_id = %session.id, user_id = %user.id, "Session created");
        Ok(session)
    }

    /// 终止旧会话并为同一用户创建新会话
    pub async fn refresh(&self, id: &SessionId) -> Result<Session, SessionError> {
        let old = self.cache.take_and_remove(id).await?;

        let session = Session::new(old.user_id, self.ttl);
        self.cache.put(&session, self.ttl).await?;

        info!(
            old_session_id = %old.id,
            session_id = %session.id,
            user_id = %session.user_id,
            "Session refreshed"
        );
        Ok(session)
    }

    /// 显式终止
    pub async fn delete(&self, id: &SessionId) -> Result<Session, SessionError> {
        let session = self.cache.take_and_remove(id).await?;
        info!(session_id = %session.id, user_id = %session.user_id, "Session deleted");
        Ok(session)
    }

    /// 授权检查：会话是否仍在缓存中
    pub async fn get(&self, id: &SessionId) -> Result<Session, SessionError> {
        self.cache.get(id).await
    }

    pub async fn get_active(
        &self,
        user_id: Option<&UserId>,
        pagination: &Pagination,
    ) -> Result<Vec<Session>, SessionError> {
        check_pagination(pagination)?;
        self.ledger
            .find_active(user_id, Utc::now(), pagination)
            .await
            .map_err(SessionError::StorageUnavailable)
    }

    pub async fn get_inactive(
        &self,
        user_id: Option<&UserId>,
        pagination: &Pagination,
    ) -> Result<Vec<Session>, SessionError> {
        check_pagination(pagination)?;
        self.ledger
            .find_inactive(user_id, pagination)
            .await
            .map_err(SessionError::StorageUnavailable)
    }
}

fn check_pagination(pagination: &Pagination) -> Result<(), SessionError> {
    if pagination.page_size == 0 || pagination.page_size > MAX_PAGE_SIZE {
        return Err(SessionError::Validation(format!(
            "page size must be between 1 and {MAX_PAGE_SIZE}, got {}",
            pagination.page_size
        )));
    }
    Ok(())
}
