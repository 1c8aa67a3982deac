//! 应用层

mod admin_seeder;
mod session_service;

pub use admin_seeder::*;
pub use session_service::*;
