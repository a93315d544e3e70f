//! enro-tenancy - 子域名到租户的解析与租户隔离
//!
//! - [`TenantResolver`]：cache-aside 子域名解析
//! - [`HostnameParser`]：按配置的域名拓扑从主机名提取子域名
//! - [`TenantGate`]：请求级租户授权判定
//! - [`SubdomainService`]：子域名校验、占用检查与变更

mod gate;
mod hostname;
mod resolver;
mod service;
mod subdomain;

pub use gate::*;
pub use hostname::*;
pub use resolver::*;
pub use service::*;
pub use subdomain::*;
