//! 领域层

pub mod credentials;
pub mod repositories;
pub mod services;
pub mod session;
pub mod user;
