//! Repository traits

mod role_repository;
mod session_ledger_repository;
mod user_repository;

pub use role_repository::*;
pub use session_ledger_repository::*;
pub use user_repository::*;
