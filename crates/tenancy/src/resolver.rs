//! 子域名 → 租户 ID 解析
//!
//! Cache-aside 策略：
//! - 命中：直接返回，不访问存储
//! - 未命中（或缓存不可用）：查询活跃租户，命中后写回缓存
//! - 未找到：返回 `None`，不缓存否定结果

use std::sync::Arc;
use std::time::Duration;

use enro_common::TenantId;
use enro_ports::{CachePort, TenantStore};
use tracing::{debug, error};

use crate::subdomain::{normalize_subdomain, subdomain_cache_key};

/// 默认缓存时长（1 小时）
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// 租户解析器
///
/// 每次调用至多一次缓存读、一次存储查询、一次缓存写，无重试。
/// 同一子域名并发未命中时可能重复查询存储并写入相同的值。
pub struct TenantResolver {
    cache: Arc<dyn CachePort>,
    store: Arc<dyn TenantStore>,
    ttl: Duration,
}

impl TenantResolver {
    pub fn new(cache: Arc<dyn CachePort>, store: Arc<dyn TenantStore>) -> Self {
        Self {
            cache,
            store,
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// 设置缓存时长
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 缓存是否就绪（仅用于诊断）
    pub fn cache_ready(&self) -> bool {
        self.cache.is_ready()
    }

    /// 解析子域名对应的租户 ID
    ///
    /// 空输入直接返回 `None`，不产生任何 I/O；存储错误记录日志后返回 `None`
    pub async fn resolve(&self, subdomain: &str) -> Option<TenantId> {
        let normalized = normalize_subdomain(subdomain);
        if normalized.is_empty() {
            return None;
        }

        let cache_key = subdomain_cache_key(&normalized);

        if let Some(cached) = self.cache.get(&cache_key).await.filter(|v| !v.is_empty()) {
            metrics::counter!("tenant_resolver_cache_hits_total").increment(1);
            return Some(TenantId::new(cached));
        }
        metrics::counter!("tenant_resolver_cache_misses_total").increment(1);

        let mapping = match self.store.find_active_by_subdomain(&normalized).await {
            Ok(Some(mapping)) => mapping,
            Ok(None) => {
                debug!(subdomain = %normalized, "No active tenant for subdomain");
                return None;
            }
            Err(e) => {
                metrics::counter!("tenant_resolver_store_errors_total").increment(1);
                error!(subdomain = %normalized, error = %e, "Tenant lookup by subdomain failed");
                return None;
            }
        };

        // 写入失败由缓存层记录，这里忽略
        self.cache
            .set_with_expiry(&cache_key, self.ttl, mapping.tenant_id.as_str())
            .await;

        Some(mapping.tenant_id)
    }

    /// 删除子域名的缓存映射（子域名变更时调用）
    pub async fn invalidate(&self, subdomain: &str) {
        let normalized = normalize_subdomain(subdomain);
        if normalized.is_empty() {
            return;
        }

        let removed = self.cache.delete(&subdomain_cache_key(&normalized)).await;
        debug!(subdomain = %normalized, removed, "Subdomain cache invalidated");
    }
}
