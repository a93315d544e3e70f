//! enro-common - 通用类型库

pub mod domain;
pub mod types;

pub use domain::*;
pub use types::*;
