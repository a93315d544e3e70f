//! enro-adapter-redis - Redis 适配器
//!
//! 提供尽力而为的缓存客户端：Redis 不可用时所有操作降级为空值，不向调用方报错

mod cache;
mod config;
mod connection;

pub use cache::*;
pub use config::*;
pub use connection::*;
