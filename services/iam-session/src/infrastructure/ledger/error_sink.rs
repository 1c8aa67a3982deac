//! 后台错误通道
//!
//! 写入端从不阻塞：通道满时记录日志并丢弃。
//! 丢弃的错误计入 `dropped()` 与 `session_error_sink_dropped_total`。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::counter;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{error, warn};

use crate::error::SessionError;

/// 默认容量
pub const DEFAULT_ERROR_CAPACITY: usize = 256;

/// 创建错误通道
pub fn error_channel(capacity: usize) -> (ErrorSink, ErrorStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let sink = ErrorSink {
        tx,
        dropped: Arc::new(AtomicU64::new(0)),
    };
    (sink, ErrorStream { rx })
}

/// 写入端，由后台任务持有
#[derive(Debug, Clone)]
pub struct ErrorSink {
    tx: mpsc::Sender<SessionError>,
    dropped: Arc<AtomicU64>,
}

impl ErrorSink {
    pub fn report(&self, err: SessionError) {
        match self.tx.try_send(err) {
            Ok(()) => {}
            Err(TrySendError::Full(err)) => {
                self.record_drop();
                warn!(error = %err, "Error sink is full, dropping error");
            }
            Err(TrySendError::Closed(err)) => {
                self.record_drop();
                warn!(error = %err, "Error sink has no consumer, dropping error");
            }
        }
    }

    /// 所有 clone 共享的丢弃计数
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        counter!("session_error_sink_dropped_total").increment(1);
    }
}

/// 读取端，由运维方消费
#[derive(Debug)]
pub struct ErrorStream {
    rx: mpsc::Receiver<SessionError>,
}

impl ErrorStream {
    /// 所有写入端关闭后返回 `None`
    pub async fn recv(&mut self) -> Option<SessionError> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<SessionError> {
        self.rx.try_recv().ok()
    }

    /// 持续消费并写入日志
    pub async fn log_errors(mut self) {
        while let Some(err) = self.rx.recv().await {
            error!(error = %err, "Session store background error");
        }
    }
}
