//! PostgreSQL 会话账本 Repository 实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use warden_common::{Pagination, UserId};
use warden_errors::{AppError, AppResult};

use crate::domain::repositories::{LedgerKind, SessionLedgerRepository};
use crate::domain::session::{Session, SessionId};

pub struct PostgresSessionLedgerRepository {
    pool: PgPool,
}

impl PostgresSessionLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// LIMIT / OFFSET 参数，超出 BIGINT 范围时报错
fn page_bounds(pagination: &Pagination) -> AppResult<(i64, i64)> {
    let offset = i64::try_from(pagination.offset())
        .map_err(|_| AppError::validation("page offset out of range"))?;
    Ok((i64::from(pagination.limit()), offset))
}

#[async_trait]
impl SessionLedgerRepository for PostgresSessionLedgerRepository {
    async fn append(&self, kind: LedgerKind, sessions: &[Session]) -> AppResult<()> {
        if sessions.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "INSERT INTO {} (id, userid, created_at, expires, deleted_at) ",
            kind.table()
        ));
        builder.push_values(sessions, |mut row, session| {
            row.push_bind(session.id.0)
                .push_bind(session.user_id.0)
                .push_bind(session.created_at)
                .push_bind(session.expires)
                .push_bind(session.deleted_at);
        });
        builder.push(" ON CONFLICT (id) DO NOTHING");

        builder.build().execute(&self.pool).await.map_err(|e| {
            AppError::database(format!(
                "Failed to insert {} sessions into {}: {}",
                sessions.len(),
                kind.table(),
                e
            ))
        })?;

        Ok(())
    }

    async fn find_expired_unterminated(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<Session>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT c.id, c.userid, c.created_at, c.expires, c.deleted_at
            FROM users_sessions_created c
            LEFT JOIN users_sessions_deleted d ON d.id = c.id
            WHERE d.id IS NULL AND c.expires <= $1
            ORDER BY c.expires
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find expired sessions: {}", e)))?;

        Ok(rows.into_iter().map(Session::from).collect())
    }

    async fn find_active(
        &self,
        user_id: Option<&UserId>,
        now: DateTime<Utc>,
        pagination: &Pagination,
    ) -> AppResult<Vec<Session>> {
        let (limit, offset) = page_bounds(pagination)?;
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT c.id, c.userid, c.created_at, c.expires, c.deleted_at
            FROM users_sessions_created c
            LEFT JOIN users_sessions_deleted d ON d.id = c.id
            WHERE d.id IS NULL
              AND c.expires > $1
              AND ($2::uuid IS NULL OR c.userid = $2)
            ORDER BY c.created_at, c.id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(now)
        .bind(user_id.map(|u| u.0))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find active sessions: {}", e)))?;

        Ok(rows.into_iter().map(Session::from).collect())
    }

    async fn find_inactive(
        &self,
        user_id: Option<&UserId>,
        pagination: &Pagination,
    ) -> AppResult<Vec<Session>> {
        let (limit, offset) = page_bounds(pagination)?;
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, userid, created_at, expires, deleted_at
            FROM users_sessions_deleted
            WHERE ($1::uuid IS NULL OR userid = $1)
            ORDER BY deleted_at, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id.map(|u| u.0))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find inactive sessions: {}", e)))?;

        Ok(rows.into_iter().map(Session::from).collect())
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    userid: Uuid,
    created_at: DateTime<Utc>,
    expires: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            id: SessionId(row.id),
            user_id: UserId::from_uuid(row.userid),
            created_at: row.created_at,
            expires: row.expires,
            deleted_at: row.deleted_at,
        }
    }
}
