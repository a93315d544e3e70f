//! 租户存储 trait 定义

use async_trait::async_trait;
use enro_common::TenantId;
use enro_errors::AppResult;
use serde::{Deserialize, Serialize};

/// 子域名映射（解析查询只需要这两个字段）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubdomainMapping {
    pub tenant_id: TenantId,
    pub subdomain: String,
}

/// 租户记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRecord {
    pub tenant_id: TenantId,
    pub subdomain: Option<String>,
    pub is_active: bool,
}

/// 租户存储
///
/// 子域名参数均为已规范化的值（小写、去空白），
/// 活跃租户间子域名唯一由存储层保证
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// 按子域名查找活跃租户
    async fn find_active_by_subdomain(&self, subdomain: &str)
    -> AppResult<Option<SubdomainMapping>>;

    /// 按子域名查找租户（不区分是否活跃）
    async fn find_by_subdomain(&self, subdomain: &str) -> AppResult<Option<TenantRecord>>;

    /// 按 ID 查找租户
    async fn find_by_id(&self, tenant_id: &TenantId) -> AppResult<Option<TenantRecord>>;

    /// 更新租户子域名
    async fn update_subdomain(&self, tenant_id: &TenantId, subdomain: &str) -> AppResult<()>;
}
