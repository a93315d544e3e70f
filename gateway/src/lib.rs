//! enro-gateway - 多租户 API 网关
//!
//! 认证、子域名租户解析与租户隔离

pub mod config;
pub mod error;
pub mod middleware;
pub mod routing;
pub mod state;
pub mod tenants;

pub use routing::app_router;
pub use state::AppState;
