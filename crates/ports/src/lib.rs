//! enro-ports - 抽象 trait 层
//!
//! 定义缓存与租户存储的抽象接口

mod cache;
mod tenant_store;

pub use cache::*;
pub use tenant_store::*;
