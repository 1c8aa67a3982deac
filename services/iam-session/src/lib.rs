//! IAM Session Service - 混合会话存储
//!
//! 活跃会话保存在 Redis 中，创建 / 终止事件经写后队列批量写入 PostgreSQL 账本。

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod runtime;

pub use error::SessionError;
