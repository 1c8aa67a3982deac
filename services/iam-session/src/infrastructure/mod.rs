//! 基础设施层

pub mod cache;
pub mod ledger;
pub mod persistence;
