//! Redis 连接

use redis::Client;
use redis::aio::ConnectionManager;
use tracing::info;
use warden_errors::{AppError, AppResult};

/// 创建连接管理器并确认 Redis 可达
///
/// 活跃会话只存在于 Redis，启动时连不上就直接失败。
pub async fn create_connection_manager(url: &str) -> AppResult<ConnectionManager> {
    let client = Client::open(url)
        .map_err(|e| AppError::internal(format!("Invalid Redis url: {}", e)))?;

    let mut manager = ConnectionManager::new(client).await.map_err(|e| {
        AppError::external_service(format!("Failed to connect to Redis: {}", e))
    })?;

    check_connection(&mut manager).await?;
    info!("Redis connection ready");
    Ok(manager)
}

/// `PING` 探活
pub async fn check_connection(conn: &mut ConnectionManager) -> AppResult<()> {
    redis::cmd("PING")
        .query_async::<String>(conn)
        .await
        .map_err(|e| AppError::external_service(format!("Redis health check failed: {}", e)))?;
    Ok(())
}
