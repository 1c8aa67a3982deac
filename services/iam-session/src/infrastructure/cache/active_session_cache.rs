//! 活跃会话缓存
//!
//! 缓存是会话是否有效的唯一依据。每次成功的 `put` / `take_and_remove`
//! 都会把对应记录交给账本写后队列，之后才返回。
//! 入队槽位在修改缓存之前预留：写后队列已停止时缓存保持不变。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::debug;
use warden_ports::CachePort;

use crate::domain::session::{Session, SessionId};
use crate::error::SessionError;
use crate::infrastructure::ledger::LedgerWriter;

pub struct ActiveSessionCache {
    cache: Arc<dyn CachePort>,
    writer: Arc<LedgerWriter>,
}

impl ActiveSessionCache {
    pub fn new(cache: Arc<dyn CachePort>, writer: Arc<LedgerWriter>) -> Self {
        Self { cache, writer }
    }

    /// 写入缓存并登记创建事件
    pub async fn put(&self, session: &Session, ttl: Duration) -> Result<(), SessionError> {
        if ttl.is_zero() {
            return Err(SessionError::Validation(
                "session ttl must be greater than 0".into(),
            ));
        }

        let value = encode(session)?;
        let permit = self.writer.reserve_created().await?;
        self.cache
            .set(&session.id.to_string(), &value, ttl)
            .await
            .map_err(SessionError::StorageUnavailable)?;

        permit.send(session.clone());
        debug!(session_id = %session.id, user_id = %session.user_id, "Session cached");
        Ok(())
    }

    /// 原子地取出并删除，`deleted_at` 记为当前时间后登记终止事件
    ///
    /// 同一个 id 的并发调用只有一个成功，其余返回 `SessionNotFound`。
    pub async fn take_and_remove(&self, id: &SessionId) -> Result<Session, SessionError> {
        let permit = self.writer.reserve_terminated().await?;
        let value = self
            .cache
            .take(&id.to_string())
            .await
            .map_err(SessionError::StorageUnavailable)?
            .ok_or(SessionError::SessionNotFound)?;

        let mut session = decode(&value)?;
        session.terminate(Utc::now());

        permit.send(session.clone());
        debug!(session_id = %session.id, "Session removed from cache");
        Ok(session)
    }

    /// 只读
    pub async fn get(&self, id: &SessionId) -> Result<Session, SessionError> {
        let value = self
            .cache
            .get(&id.to_string())
            .await
            .map_err(SessionError::StorageUnavailable)?
            .ok_or(SessionError::SessionNotFound)?;

        decode(&value)
    }
}

fn encode(session: &Session) -> Result<Vec<u8>, SessionError> {
    serde_cbor::to_vec(session).map_err(|e| SessionError::Codec(e.to_string()))
}

fn decode(value: &[u8]) -> Result<Session, SessionError> {
    serde_cbor::from_slice(value).map_err(|e| SessionError::Codec(e.to_string()))
}
