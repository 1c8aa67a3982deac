mod active_session_cache;

pub use active_session_cache::*;
