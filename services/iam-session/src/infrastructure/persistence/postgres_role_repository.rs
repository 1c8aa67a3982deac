//! PostgreSQL 角色 Repository 实现

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::PgPool;
use warden_common::UserId;
use warden_errors::{AppError, AppResult};

use crate::domain::repositories::RoleRepository;

pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn exists_all(&self, names: &[String]) -> AppResult<bool> {
        let wanted: BTreeSet<&str> = names.iter().map(String::as_str).collect();
        if wanted.is_empty() {
            return Ok(true);
        }

        let found: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM roles
            WHERE name = ANY($1) AND deleted_at IS NULL
            "#,
        )
        .bind(wanted.iter().map(|n| n.to_string()).collect::<Vec<_>>())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to check roles: {}", e)))?;

        Ok(found as usize == wanted.len())
    }

    async fn create(&self, name: &str, created_by: &UserId) -> AppResult<()> {
        sqlx::query("INSERT INTO roles (name, created_by) VALUES ($1, $2)")
            .bind(name)
            .bind(created_by.0)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::conflict(format!("Role already exists: {}", name))
                }
                e => AppError::database(format!("Failed to create role: {}", e)),
            })?;

        Ok(())
    }
}
