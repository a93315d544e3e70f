//! 子域名管理
//!
//! 校验、占用检查与变更；变更后清理新旧子域名的缓存映射

use std::sync::Arc;

use enro_common::TenantId;
use enro_errors::{AppError, AppResult};
use enro_ports::TenantStore;
use serde::Serialize;
use tracing::info;

use crate::resolver::TenantResolver;
use crate::subdomain::Subdomain;

/// 子域名占用检查结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubdomainAvailability {
    pub subdomain: Subdomain,
    pub available: bool,
}

pub struct SubdomainService {
    store: Arc<dyn TenantStore>,
    resolver: Arc<TenantResolver>,
}

impl SubdomainService {
    pub fn new(store: Arc<dyn TenantStore>, resolver: Arc<TenantResolver>) -> Self {
        Self { store, resolver }
    }

    /// 检查子域名是否可注册（任何租户占用都视为不可用，含停用租户）
    pub async fn check_availability(&self, raw: &str) -> AppResult<SubdomainAvailability> {
        let subdomain = Subdomain::parse(raw)?;
        let owner = self.store.find_by_subdomain(subdomain.as_str()).await?;

        Ok(SubdomainAvailability {
            available: owner.is_none(),
            subdomain,
        })
    }

    /// 修改租户子域名
    pub async fn change_subdomain(&self, tenant_id: &TenantId, raw: &str) -> AppResult<Subdomain> {
        let subdomain = Subdomain::parse(raw)?;

        let tenant = self
            .store
            .find_by_id(tenant_id)
            .await?
            .ok_or_else(|| AppError::not_found("Tenant not found"))?;

        if let Some(owner) = self.store.find_by_subdomain(subdomain.as_str()).await? {
            if owner.tenant_id != *tenant_id {
                return Err(AppError::conflict("This subdomain is already taken"));
            }
        }

        if tenant.subdomain.as_deref() == Some(subdomain.as_str()) {
            return Ok(subdomain);
        }

        self.store
            .update_subdomain(tenant_id, subdomain.as_str())
            .await?;

        if let Some(previous) = tenant.subdomain.as_deref() {
            self.resolver.invalidate(previous).await;
        }
        self.resolver.invalidate(subdomain.as_str()).await;

        info!(
            tenant_id = %tenant_id,
            previous = ?tenant.subdomain,
            subdomain = %subdomain,
            "Tenant subdomain changed"
        );

        Ok(subdomain)
    }
}
