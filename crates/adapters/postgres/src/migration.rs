//! PostgreSQL 迁移执行
//!
//! 迁移文件由各服务通过 `sqlx::migrate!` 嵌入，这里只负责执行与日志

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;
use warden_errors::{AppError, AppResult};

/// 执行所有未应用的迁移
pub async fn run_migrations(pool: &PgPool, migrator: &Migrator) -> AppResult<()> {
    let total = migrator.iter().count();
    info!(total, "Running database migrations");

    migrator
        .run(pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to run migrations: {}", e)))?;

    info!("Database migrations applied");
    Ok(())
}
