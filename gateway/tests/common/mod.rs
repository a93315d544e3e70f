#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::Response;
use enro_auth_core::TokenService;
use enro_common::{TenantId, UserId};
use enro_config::TenancyConfig;
use enro_errors::{AppError, AppResult};
use enro_gateway::{AppState, app_router};
use enro_ports::{CachePort, SubdomainMapping, TenantRecord, TenantStore};
use parking_lot::Mutex;
use serde_json::Value;

pub const SECRET: &str = "test_secret_with_enough_length_0001";

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

#[async_trait]
impl CachePort for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    async fn set_with_expiry(&self, key: &str, _ttl: Duration, value: &str) -> bool {
        self.entries.lock().insert(key.to_string(), value.to_string());
        true
    }

    async fn delete(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<TenantRecord>>,
    pub lookups: AtomicUsize,
}

impl MemoryStore {
    pub fn with_tenant(self, tenant_id: &str, subdomain: &str) -> Self {
        self.records.lock().push(TenantRecord {
            tenant_id: TenantId::from(tenant_id),
            subdomain: Some(subdomain.to_string()),
            is_active: true,
        });
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn find_active_by_subdomain(
        &self,
        subdomain: &str,
    ) -> AppResult<Option<SubdomainMapping>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .lock()
            .iter()
            .find(|r| r.is_active && r.subdomain.as_deref() == Some(subdomain))
            .map(|r| SubdomainMapping {
                tenant_id: r.tenant_id.clone(),
                subdomain: subdomain.to_string(),
            }))
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> AppResult<Option<TenantRecord>> {
        Ok(self
            .records
            .lock()
            .iter()
            .find(|r| r.subdomain.as_deref() == Some(subdomain))
            .cloned())
    }

    async fn find_by_id(&self, tenant_id: &TenantId) -> AppResult<Option<TenantRecord>> {
        Ok(self
            .records
            .lock()
            .iter()
            .find(|r| &r.tenant_id == tenant_id)
            .cloned())
    }

    async fn update_subdomain(&self, tenant_id: &TenantId, subdomain: &str) -> AppResult<()> {
        let mut records = self.records.lock();
        let record = records
            .iter_mut()
            .find(|r| &r.tenant_id == tenant_id)
            .ok_or_else(|| AppError::not_found("Tenant not found"))?;
        record.subdomain = Some(subdomain.to_string());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub cache: Arc<MemoryCache>,
    pub store: Arc<MemoryStore>,
    pub tokens: TokenService,
}

impl TestApp {
    pub fn new() -> Self {
        let cache = Arc::new(MemoryCache::default());
        let store = Arc::new(
            MemoryStore::default()
                .with_tenant("t-1", "acme")
                .with_tenant("t-2", "globex"),
        );
        let tokens = TokenService::new(SECRET, 3600, "enromatics", "enromatics-api");

        let state = AppState::new(
            tokens.clone(),
            cache.clone(),
            store.clone(),
            &TenancyConfig::default(),
        )
        .unwrap();

        Self {
            router: app_router(state),
            cache,
            store,
            tokens,
        }
    }

    pub fn token(&self, tenant: Option<&str>, role: &str) -> String {
        let tenant = tenant.map(TenantId::from);
        self.tokens
            .generate_access_token(&UserId::from("u-1"), tenant.as_ref(), role)
            .unwrap()
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
