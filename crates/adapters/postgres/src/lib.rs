//! enro-adapter-postgres - PostgreSQL 适配器

mod connection;
mod tenant_store;

pub use connection::*;
pub use tenant_store::*;
