//! 共享应用状态

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;
use axum::http::header::InvalidHeaderName;
use enro_auth_core::TokenService;
use enro_config::TenancyConfig;
use enro_ports::{CachePort, TenantStore};
use enro_tenancy::{HostnameParser, SubdomainService, TenantGate, TenantResolver};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub token_service: TokenService,
    pub resolver: Arc<TenantResolver>,
    pub gate: Arc<TenantGate>,
    pub subdomains: Arc<SubdomainService>,
    pub hostnames: Arc<HostnameParser>,
    /// 携带子域名的请求头
    pub subdomain_header: HeaderName,
    /// 就绪检查使用；未配置时跳过数据库探测
    pub database: Option<PgPool>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        token_service: TokenService,
        cache: Arc<dyn CachePort>,
        store: Arc<dyn TenantStore>,
        tenancy: &TenancyConfig,
    ) -> Result<Self, InvalidHeaderName> {
        let subdomain_header = HeaderName::from_bytes(tenancy.subdomain_header.as_bytes())?;

        let resolver = Arc::new(
            TenantResolver::new(cache, store.clone())
                .with_ttl(Duration::from_secs(tenancy.cache_ttl_secs)),
        );
        let gate = TenantGate::new(resolver.clone())
            .with_superadmin_role(tenancy.superadmin_role.as_str());
        let subdomains = SubdomainService::new(store, resolver.clone());

        Ok(Self {
            token_service,
            gate: Arc::new(gate),
            subdomains: Arc::new(subdomains),
            hostnames: Arc::new(HostnameParser::new(tenancy.domains.clone())),
            resolver,
            subdomain_header,
            database: None,
            metrics: None,
        })
    }

    pub fn with_database(mut self, pool: PgPool) -> Self {
        self.database = Some(pool);
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
