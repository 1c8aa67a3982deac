//! PostgreSQL 持久化

mod postgres_role_repository;
mod postgres_session_ledger_repository;
mod postgres_user_repository;

pub use postgres_role_repository::*;
pub use postgres_session_ledger_repository::*;
pub use postgres_user_repository::*;
