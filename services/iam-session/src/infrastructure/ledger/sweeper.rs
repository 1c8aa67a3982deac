//! 过期扫描
//!
//! 定期查找账本中已创建、未终止且已过期的会话，直接写入终止表。
//! 不访问缓存（缓存已按 TTL 淘汰），也不经过终止通道。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use warden_errors::AppResult;

use super::error_sink::ErrorSink;
use crate::domain::repositories::{LedgerKind, SessionLedgerRepository};
use crate::error::SessionError;

pub struct ExpirySweeper {
    ledger: Arc<dyn SessionLedgerRepository>,
    errors: ErrorSink,
    max_batch: usize,
}

impl ExpirySweeper {
    pub fn new(ledger: Arc<dyn SessionLedgerRepository>, errors: ErrorSink, max_batch: usize) -> Self {
        Self {
            ledger,
            errors,
            max_batch: max_batch.max(1),
        }
    }

    /// 扫描一轮，返回本轮终止的会话数
    ///
    /// 按 `max_batch` 分页，直到某一页不满为止。终止时间记为会话的过期时间。
    pub async fn sweep_once(&self) -> AppResult<usize> {
        let mut total = 0;

        loop {
            let mut expired = self
                .ledger
                .find_expired_unterminated(Utc::now(), self.max_batch)
                .await?;
            let count = expired.len();
            if count == 0 {
                break;
            }

            for session in &mut expired {
                let at = session.expires;
                session.terminate(at);
            }
            self.ledger.append(LedgerKind::Terminated, &expired).await?;

            total += count;
            debug!(count, "Swept expired sessions");
            if count < self.max_batch {
                break;
            }
        }

        if total > 0 {
            counter!("session_sweeper_expired_total").increment(total as u64);
            info!(total, "Expired sessions moved to termination ledger");
        }
        Ok(total)
    }

    pub async fn run(self, interval: Duration, shutdown: CancellationToken) {
        info!(interval = ?interval, "Expiry sweeper started");

        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Expiry sweeper received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        self.errors.report(SessionError::StorageUnavailable(e));
                    }
                }
            }
        }

        info!("Expiry sweeper stopped");
    }
}
