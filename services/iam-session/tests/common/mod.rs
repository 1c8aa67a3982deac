//! 测试共用的内存实现
#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use iam_session::application::SessionService;
use iam_session::domain::credentials::LoginIdentifier;
use iam_session::domain::repositories::{LedgerKind, SessionLedgerRepository};
use iam_session::domain::services::CredentialVerifier;
use iam_session::domain::session::Session;
use iam_session::domain::user::User;
use iam_session::infrastructure::cache::ActiveSessionCache;
use iam_session::infrastructure::ledger::LedgerWriter;
use uuid::Uuid;
use warden_common::{Pagination, UserId};
use warden_errors::AppResult;
use warden_ports::CachePort;

pub const PASSWORD: &str = "correct horse";

// ============================================================
// 缓存
// ============================================================

/// 带 TTL 的内存缓存
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
}

impl InMemoryCache {
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .unwrap()
            .values()
            .filter(|(_, deadline)| *deadline > now)
            .count()
    }
}

#[async_trait]
impl CachePort for InMemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .get(key)
            .filter(|(_, deadline)| *deadline > Instant::now())
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> AppResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_vec(), Instant::now() + ttl));
        Ok(())
    }

    async fn take(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let removed = self.entries.lock().unwrap().remove(key);
        Ok(removed
            .filter(|(_, deadline)| *deadline > Instant::now())
            .map(|(value, _)| value))
    }
}

// ============================================================
// 账本
// ============================================================

/// 内存账本，按 id 去重（先写入者生效）
#[derive(Default)]
pub struct InMemoryLedger {
    created: Mutex<Vec<Session>>,
    terminated: Mutex<Vec<Session>>,
    /// 每次追加的批次大小
    batches: Mutex<Vec<(LedgerKind, usize)>>,
}

impl InMemoryLedger {
    pub fn created(&self) -> Vec<Session> {
        self.created.lock().unwrap().clone()
    }

    pub fn terminated(&self) -> Vec<Session> {
        self.terminated.lock().unwrap().clone()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn terminated_count(&self) -> usize {
        self.terminated.lock().unwrap().len()
    }

    pub fn batches(&self, kind: LedgerKind) -> Vec<usize> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, n)| *n)
            .collect()
    }

    fn table(&self, kind: LedgerKind) -> &Mutex<Vec<Session>> {
        match kind {
            LedgerKind::Created => &self.created,
            LedgerKind::Terminated => &self.terminated,
        }
    }

    fn terminated_ids(&self) -> Vec<Uuid> {
        self.terminated.lock().unwrap().iter().map(|s| s.id.0).collect()
    }
}

fn page(sessions: Vec<Session>, pagination: &Pagination) -> Vec<Session> {
    sessions
        .into_iter()
        .skip(pagination.offset() as usize)
        .take(pagination.limit() as usize)
        .collect()
}

#[async_trait]
impl SessionLedgerRepository for InMemoryLedger {
    async fn append(&self, kind: LedgerKind, sessions: &[Session]) -> AppResult<()> {
        let mut table = self.table(kind).lock().unwrap();
        for session in sessions {
            if !table.iter().any(|s| s.id == session.id) {
                table.push(session.clone());
            }
        }
        self.batches.lock().unwrap().push((kind, sessions.len()));
        Ok(())
    }

    async fn find_expired_unterminated(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<Session>> {
        let terminated = self.terminated_ids();
        Ok(self
            .created()
            .into_iter()
            .filter(|s| s.expires <= now && !terminated.contains(&s.id.0))
            .take(limit)
            .collect())
    }

    async fn find_active(
        &self,
        user_id: Option<&UserId>,
        now: DateTime<Utc>,
        pagination: &Pagination,
    ) -> AppResult<Vec<Session>> {
        let terminated = self.terminated_ids();
        let active = self
            .created()
            .into_iter()
            .filter(|s| s.expires > now && !terminated.contains(&s.id.0))
            .filter(|s| user_id.is_none_or(|u| s.user_id == *u))
            .collect();
        Ok(page(active, pagination))
    }

    async fn find_inactive(
        &self,
        user_id: Option<&UserId>,
        pagination: &Pagination,
    ) -> AppResult<Vec<Session>> {
        let inactive = self
            .terminated()
            .into_iter()
            .filter(|s| user_id.is_none_or(|u| s.user_id == *u))
            .collect();
        Ok(page(inactive, pagination))
    }
}

// ============================================================
// 凭证
// ============================================================

/// 明文比较的凭证校验
#[derive(Default)]
pub struct FakeVerifier {
    users: Mutex<Vec<User>>,
}

impl FakeVerifier {
    pub fn add_user(&self, username: &str, email: &str, password: &str) -> User {
        let user = User::new(
            username,
            username,
            email,
            format!("plain:{}", password),
            vec![],
            UserId::nil(),
        );
        self.users.lock().unwrap().push(user.clone());
        user
    }
}

#[async_trait]
impl CredentialVerifier for FakeVerifier {
    async fn resolve(&self, identifier: &LoginIdentifier) -> AppResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| match identifier {
                LoginIdentifier::Username(name) => u.username == *name,
                LoginIdentifier::Email(email) => u.email == *email,
            })
            .cloned())
    }

    async fn verify_password(&self, plain: &str, hash: &str) -> AppResult<bool> {
        Ok(hash == format!("plain:{}", plain))
    }
}

// ============================================================
// 组装
// ============================================================

pub struct Harness {
    pub service: SessionService,
    pub writer: Arc<LedgerWriter>,
    pub ledger: Arc<InMemoryLedger>,
    pub cache: Arc<InMemoryCache>,
    pub verifier: Arc<FakeVerifier>,
}

impl Harness {
    /// 构建会话存储（写后队列未启动）
    pub fn new(buffer_size: usize, ttl: Duration) -> Self {
        let ledger = Arc::new(InMemoryLedger::default());
        let cache = Arc::new(InMemoryCache::default());
        let verifier = Arc::new(FakeVerifier::default());
        let writer = Arc::new(LedgerWriter::new(ledger.clone(), buffer_size).unwrap());

        let service = SessionService::new(
            ActiveSessionCache::new(cache.clone(), writer.clone()),
            ledger.clone(),
            verifier.clone(),
            ttl,
        );

        Self {
            service,
            writer,
            ledger,
            cache,
            verifier,
        }
    }
}

/// 轮询直到条件成立或超时
pub async fn wait_until<F, Fut>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if condition().await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
