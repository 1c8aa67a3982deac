//! Redis Cache 实现

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;
use warden_errors::{AppError, AppResult};
use warden_ports::CachePort;

/// Redis Cache
///
/// `ConnectionManager` 内部自动重连，clone 开销很小，每次调用各自 clone 一份。
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

/// Redis 的 PX 参数不接受 0，不足 1 毫秒的 TTL 向上取整
fn ttl_millis(ttl: Duration) -> u64 {
    (ttl.as_millis() as u64).max(1)
}

#[async_trait]
impl CachePort for RedisCache {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        conn.get(key)
            .await
            .map_err(|e| AppError::external_service(format!("Redis get failed: {}", e)))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.pset_ex(key, value, ttl_millis(ttl))
            .await
            .map_err(|e| AppError::external_service(format!("Redis set failed: {}", e)))
    }

    async fn take(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        conn.get_del(key)
            .await
            .map_err(|e| AppError::external_service(format!("Redis getdel failed: {}", e)))
    }
}
