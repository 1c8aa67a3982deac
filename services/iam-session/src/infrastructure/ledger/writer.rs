//! 会话账本写后队列
//!
//! 创建 / 终止两条流水线，各自一个有界通道和一个后台 worker。
//! worker 在批次达到 `max_batch` 或定时器触发（批次非空）时批量写入账本。
//! 通道满时入队方阻塞，事件从不丢弃。

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error_sink::{DEFAULT_ERROR_CAPACITY, ErrorSink, ErrorStream, error_channel};
use super::sweeper::ExpirySweeper;
use crate::domain::repositories::{LedgerKind, SessionLedgerRepository};
use crate::domain::session::Session;
use crate::error::SessionError;

/// 最小刷新间隔
pub const MIN_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

type Receivers = (mpsc::Receiver<Session>, mpsc::Receiver<Session>);

pub struct LedgerWriter {
    ledger: Arc<dyn SessionLedgerRepository>,
    buffer_size: usize,
    created_tx: mpsc::Sender<Session>,
    terminated_tx: mpsc::Sender<Session>,
    /// `start` 时交给 worker
    receivers: Mutex<Option<Receivers>>,
    errors: ErrorSink,
    error_stream: Mutex<Option<ErrorStream>>,
    shutdown: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl LedgerWriter {
    pub fn new(
        ledger: Arc<dyn SessionLedgerRepository>,
        buffer_size: usize,
    ) -> Result<Self, SessionError> {
        if buffer_size == 0 {
            return Err(SessionError::InvalidConfig(
                "buffer size must be greater than 0".into(),
            ));
        }

        let (created_tx, created_rx) = mpsc::channel(buffer_size);
        let (terminated_tx, terminated_rx) = mpsc::channel(buffer_size);
        let (errors, error_stream) = error_channel(DEFAULT_ERROR_CAPACITY);

        Ok(Self {
            ledger,
            buffer_size,
            created_tx,
            terminated_tx,
            receivers: Mutex::new(Some((created_rx, terminated_rx))),
            errors,
            error_stream: Mutex::new(Some(error_stream)),
            shutdown: CancellationToken::new(),
            handles: Mutex::new(Vec::new()),
        })
    }

    /// 取出错误通道的读取端（只能取一次）
    pub fn error_stream(&self) -> Option<ErrorStream> {
        self.error_stream.lock().take()
    }

    /// 校验配置并启动两个 worker 与过期扫描器
    pub fn start(&self, flush_interval: Duration, max_batch: usize) -> Result<(), SessionError> {
        if max_batch >= self.buffer_size {
            return Err(SessionError::MaxBiggerThanBuffer {
                max_batch,
                buffer_size: self.buffer_size,
            });
        }
        if flush_interval < MIN_FLUSH_INTERVAL {
            return Err(SessionError::ClockTooSmall(flush_interval));
        }
        if max_batch == 0 {
            return Err(SessionError::InvalidConfig(
                "max batch must be greater than 0".into(),
            ));
        }
        if self.shutdown.is_cancelled() {
            return Err(SessionError::LedgerClosed);
        }

        let (created_rx, terminated_rx) = self
            .receivers
            .lock()
            .take()
            .ok_or(SessionError::AlreadyStarted)?;

        let created = Pipeline {
            kind: LedgerKind::Created,
            ledger: self.ledger.clone(),
            errors: self.errors.clone(),
            max_batch,
        };
        let terminated = Pipeline {
            kind: LedgerKind::Terminated,
            ..created.clone()
        };
        let sweeper = ExpirySweeper::new(self.ledger.clone(), self.errors.clone(), max_batch);

        let handles = vec![
            tokio::spawn(created.run(created_rx, flush_interval, self.shutdown.clone())),
            tokio::spawn(terminated.run(terminated_rx, flush_interval, self.shutdown.clone())),
            tokio::spawn(sweeper.run(flush_interval, self.shutdown.clone())),
        ];
        self.handles.lock().extend(handles);

        info!(
            flush_interval = ?flush_interval,
            max_batch,
            buffer_size = self.buffer_size,
            "Session ledger writer started"
        );
        Ok(())
    }

    /// 停止后台任务；已入队的事件会先写入账本
    pub async fn stop(&self) {
        self.shutdown.cancel();
        // 未启动时直接关闭通道
        drop(self.receivers.lock().take());

        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Session ledger task failed");
            }
        }
        info!(
            dropped_errors = self.errors.dropped(),
            "Session ledger writer stopped"
        );
    }

    /// 预留创建流水线的一个槽位；通道满时等待
    pub async fn reserve_created(&self) -> Result<LedgerPermit<'_>, SessionError> {
        self.reserve(&self.created_tx).await
    }

    /// 预留终止流水线的一个槽位；通道满时等待
    pub async fn reserve_terminated(&self) -> Result<LedgerPermit<'_>, SessionError> {
        self.reserve(&self.terminated_tx).await
    }

    async fn reserve<'a>(
        &self,
        tx: &'a mpsc::Sender<Session>,
    ) -> Result<LedgerPermit<'a>, SessionError> {
        if self.shutdown.is_cancelled() {
            return Err(SessionError::LedgerClosed);
        }
        let permit = tx.reserve().await.map_err(|_| SessionError::LedgerClosed)?;
        Ok(LedgerPermit { permit })
    }
}

/// 已预留的入队槽位
///
/// 先预留、再修改缓存、最后 `send`，缓存修改成功后入队不会失败。
/// 未使用即丢弃时槽位归还。
pub struct LedgerPermit<'a> {
    permit: mpsc::Permit<'a, Session>,
}

impl LedgerPermit<'_> {
    pub fn send(self, session: Session) {
        self.permit.send(session);
    }
}

/// 单条流水线的 worker
#[derive(Clone)]
struct Pipeline {
    kind: LedgerKind,
    ledger: Arc<dyn SessionLedgerRepository>,
    errors: ErrorSink,
    max_batch: usize,
}

impl Pipeline {
    async fn run(
        self,
        mut rx: mpsc::Receiver<Session>,
        flush_interval: Duration,
        shutdown: CancellationToken,
    ) {
        let table = self.kind.table();
        info!(table, "Ledger worker started");

        let mut batch: Vec<Session> = Vec::with_capacity(self.max_batch);
        let mut ticker = interval_at(Instant::now() + flush_interval, flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!(table, "Ledger worker received shutdown signal");
                    break;
                }
                received = rx.recv() => match received {
                    Some(session) => {
                        batch.push(session);
                        if batch.len() >= self.max_batch {
                            self.flush(&mut batch).await;
                            ticker.reset();
                        }
                    }
                    None => break,
                },
                _ = ticker.tick() => {
                    if !batch.is_empty() {
                        self.flush(&mut batch).await;
                    }
                }
            }
        }

        // 排空已入队的事件
        rx.close();
        while let Some(session) = rx.recv().await {
            batch.push(session);
            if batch.len() >= self.max_batch {
                self.flush(&mut batch).await;
            }
        }
        if !batch.is_empty() {
            self.flush(&mut batch).await;
        }

        info!(table, "Ledger worker stopped");
    }

    /// 写入一个批次；失败时上报错误并丢弃该批次
    async fn flush(&self, batch: &mut Vec<Session>) {
        let table = self.kind.table();
        let count = batch.len();

        match self.ledger.append(self.kind, batch.as_slice()).await {
            Ok(()) => {
                counter!("session_ledger_rows_written_total", "table" => table)
                    .increment(count as u64);
                debug!(table, count, "Flushed session batch");
            }
            Err(e) => {
                counter!("session_ledger_flush_failures_total", "table" => table).increment(1);
                warn!(table, count, error = %e, "Failed to flush session batch, dropping it");
                self.errors.report(SessionError::LedgerFlush {
                    table,
                    count,
                    source: e,
                });
            }
        }

        batch.clear();
    }
}
