//! PostgreSQL Repository 集成测试
//!
//! 需要 `DATABASE_URL` 指向可用的 PostgreSQL：
//! `cargo test -p iam-session --test postgres_repository_test -- --ignored`

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use iam_session::domain::repositories::{
    LedgerKind, RoleRepository, SessionLedgerRepository, UserRepository,
};
use iam_session::domain::services::hash_password;
use iam_session::domain::session::Session;
use iam_session::domain::user::User;
use iam_session::infrastructure::persistence::{
    PostgresRoleRepository, PostgresSessionLedgerRepository, PostgresUserRepository,
};
use sqlx::PgPool;
use warden_common::{Pagination, UserId};

fn expired_session(user_id: UserId) -> Session {
    let mut session = Session::new(user_id, Duration::from_secs(1));
    session.created_at -= TimeDelta::seconds(30);
    session.expires -= TimeDelta::seconds(30);
    session
}

// ============================================================
// 会话账本
// ============================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running PostgreSQL"]
async fn test_append_ignores_duplicate_ids(pool: PgPool) {
    let repo = PostgresSessionLedgerRepository::new(pool.clone());
    let user_id = UserId::new();
    let session = Session::new(user_id, Duration::from_secs(60));

    let mut first = session.clone();
    first.terminate(Utc::now());
    let mut second = session.clone();
    second.terminate(session.expires);

    repo.append(LedgerKind::Terminated, &[first.clone()]).await.unwrap();
    repo.append(LedgerKind::Terminated, &[second]).await.unwrap();
    repo.append(LedgerKind::Terminated, &[]).await.unwrap();

    let inactive = repo
        .find_inactive(Some(&user_id), &Pagination::default())
        .await
        .unwrap();
    assert_eq!(inactive.len(), 1);
    assert_eq!(inactive[0].id, session.id);
    // 先写入者生效（数据库精度为微秒）
    assert_eq!(
        inactive[0].deleted_at.map(|t| t.timestamp_micros()),
        first.deleted_at.map(|t| t.timestamp_micros())
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running PostgreSQL"]
async fn test_active_and_expired_queries(pool: PgPool) {
    let repo = PostgresSessionLedgerRepository::new(pool.clone());
    let alice = UserId::new();
    let bob = UserId::new();

    let live: Vec<Session> = (0..3)
        .map(|_| Session::new(alice, Duration::from_secs(60)))
        .collect();
    let expired = expired_session(alice);
    let bobs = Session::new(bob, Duration::from_secs(60));

    let mut created = live.clone();
    created.push(expired.clone());
    created.push(bobs.clone());
    repo.append(LedgerKind::Created, &created).await.unwrap();

    let mut ended = live[0].clone();
    ended.terminate(Utc::now());
    repo.append(LedgerKind::Terminated, &[ended]).await.unwrap();

    let now = Utc::now();
    let all = Pagination::new(1, 100);

    let active = repo.find_active(Some(&alice), now, &all).await.unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|s| s.user_id == alice && s.deleted_at.is_none()));
    assert_eq!(repo.find_active(None, now, &all).await.unwrap().len(), 3);
    assert_eq!(
        repo.find_active(None, now, &Pagination::new(2, 2))
            .await
            .unwrap()
            .len(),
        1
    );

    let stale = repo.find_expired_unterminated(now, 10).await.unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].id, expired.id);

    let inactive = repo.find_inactive(None, &all).await.unwrap();
    assert_eq!(inactive.len(), 1);
    assert_eq!(inactive[0].id, live[0].id);
    assert!(repo
        .find_inactive(Some(&bob), &all)
        .await
        .unwrap()
        .is_empty());
}

// ============================================================
// 用户与角色
// ============================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running PostgreSQL"]
async fn test_user_lookup_skips_soft_deleted(pool: PgPool) {
    let repo = PostgresUserRepository::new(pool.clone());
    let user = User::new(
        "Alice",
        "alice",
        "alice@example.com",
        hash_password("secret").unwrap(),
        vec!["admin".into()],
        UserId::nil(),
    );
    repo.save(&user).await.unwrap();

    let found = repo.find_by_username("alice").await.unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(found.roles, vec!["admin".to_string()]);
    assert!(repo.find_by_email("alice@example.com").await.unwrap().is_some());

    // 重复用户名
    let duplicate = User::new("A", "alice", "other@example.com", "x", vec![], UserId::nil());
    assert_eq!(repo.save(&duplicate).await.unwrap_err().status_code(), 409);

    sqlx::query("UPDATE users SET deleted_at = NOW() WHERE id = $1")
        .bind(user.id.0)
        .execute(&pool)
        .await
        .unwrap();
    assert!(repo.find_by_username("alice").await.unwrap().is_none());
    assert!(repo.find_by_email("alice@example.com").await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running PostgreSQL"]
async fn test_roles_exist(pool: PgPool) {
    let repo = PostgresRoleRepository::new(pool);
    let system = UserId::nil();

    repo.create("admin", &system).await.unwrap();
    repo.create("auditor", &system).await.unwrap();
    assert_eq!(
        repo.create("admin", &system).await.unwrap_err().status_code(),
        409
    );

    assert!(repo.exists_all(&[]).await.unwrap());
    assert!(repo.exists_all(&["admin".into()]).await.unwrap());
    assert!(
        repo.exists_all(&["admin".into(), "auditor".into(), "admin".into()])
            .await
            .unwrap()
    );
    assert!(
        !repo
            .exists_all(&["admin".into(), "missing".into()])
            .await
            .unwrap()
    );
}
