//! 会话账本：写后队列、过期扫描、错误通道

mod error_sink;
mod sweeper;
mod writer;

pub use error_sink::*;
pub use sweeper::*;
pub use writer::*;
