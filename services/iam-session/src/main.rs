//! IAM Session Service - 服务入口

use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;
use tracing::info;
use warden_adapter_postgres::{PostgresConfig, create_pool, run_migrations};
use warden_adapter_redis::{RedisCache, create_connection_manager};
use warden_config::AppConfig;
use warden_ports::CachePort;

use iam_session::application::{AdminSeeder, SessionService};
use iam_session::domain::repositories::{RoleRepository, SessionLedgerRepository, UserRepository};
use iam_session::domain::services::{Argon2CredentialVerifier, CredentialVerifier};
use iam_session::infrastructure::cache::ActiveSessionCache;
use iam_session::infrastructure::ledger::LedgerWriter;
use iam_session::infrastructure::persistence::{
    PostgresRoleRepository, PostgresSessionLedgerRepository, PostgresUserRepository,
};
use iam_session::runtime::{init_runtime, shutdown_signal};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let config = AppConfig::load(&config_dir).context("failed to load configuration")?;

    init_runtime(&config);
    info!("Starting {} service", config.app_name);

    // PostgreSQL
    let pg_config = PostgresConfig::new(config.database.url.expose_secret().as_str())
        .with_max_connections(config.database.max_connections);
    let pool = create_pool(&pg_config).await?;
    run_migrations(&pool, &MIGRATOR).await?;

    // Redis
    let redis_conn = create_connection_manager(config.redis.url.expose_secret()).await?;
    let cache: Arc<dyn CachePort> = Arc::new(RedisCache::new(redis_conn));

    // Repositories
    let users: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(pool.clone()));
    let roles: Arc<dyn RoleRepository> = Arc::new(PostgresRoleRepository::new(pool.clone()));
    let ledger: Arc<dyn SessionLedgerRepository> =
        Arc::new(PostgresSessionLedgerRepository::new(pool.clone()));

    AdminSeeder::new(users.clone(), roles)
        .seed(&config.admin)
        .await?;

    // 会话存储
    let session_config = &config.session;
    let writer = Arc::new(LedgerWriter::new(ledger.clone(), session_config.buffer_size)?);
    let error_logger = writer.error_stream().map(|errors| tokio::spawn(errors.log_errors()));
    writer.start(session_config.flush_interval(), session_config.max_batch)?;

    let verifier: Arc<dyn CredentialVerifier> = Arc::new(Argon2CredentialVerifier::new(users));
    let sessions = SessionService::new(
        ActiveSessionCache::new(cache, writer.clone()),
        ledger,
        verifier,
        session_config.ttl(),
    );

    info!(
        buffer_size = session_config.buffer_size,
        max_batch = session_config.max_batch,
        ttl_secs = session_config.ttl_secs,
        "Session store ready"
    );

    shutdown_signal().await;

    writer.stop().await;
    // 释放所有写入端后错误日志任务自行结束
    drop(sessions);
    drop(writer);
    if let Some(handle) = error_logger {
        let _ = handle.await;
    }
    pool.close().await;

    info!("Service stopped");
    Ok(())
}
