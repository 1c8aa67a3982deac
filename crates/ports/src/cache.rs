//! Cache trait 定义

use async_trait::async_trait;
use std::time::Duration;
use warden_errors::AppResult;

/// 缓存 trait
///
/// 值为原始字节，由调用方决定序列化格式。
#[async_trait]
pub trait CachePort: Send + Sync {
    /// 获取缓存值，不存在或已过期返回 `None`
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>>;

    /// 设置缓存值及过期时间
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> AppResult<()>;

    /// 原子性地读取并删除
    ///
    /// 同一个键的并发调用中只有一个能拿到值。
    async fn take(&self, key: &str) -> AppResult<Option<Vec<u8>>>;
}
