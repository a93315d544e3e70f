#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use enro_common::TenantId;
use enro_errors::{AppError, AppResult};
use enro_ports::{CachePort, SubdomainMapping, TenantRecord, TenantStore};
use enro_tenancy::{TenantGate, TenantResolver};
use parking_lot::Mutex;

/// 内存缓存，可模拟断开
#[derive(Default)]
pub struct FakeCache {
    entries: Mutex<HashMap<String, String>>,
    last_ttl: Mutex<Option<Duration>>,
    disconnected: AtomicBool,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl FakeCache {
    pub fn disconnected() -> Self {
        let cache = Self::default();
        cache.disconnected.store(true, Ordering::SeqCst);
        cache
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    pub fn last_ttl(&self) -> Option<Duration> {
        *self.last_ttl.lock()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn is_down(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CachePort for FakeCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.is_down() {
            return None;
        }
        self.entries.lock().get(key).cloned()
    }

    async fn set_with_expiry(&self, key: &str, ttl: Duration, value: &str) -> bool {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.is_down() {
            return false;
        }
        *self.last_ttl.lock() = Some(ttl);
        self.entries.lock().insert(key.to_string(), value.to_string());
        true
    }

    async fn delete(&self, key: &str) -> bool {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.is_down() {
            return false;
        }
        self.entries.lock().remove(key).is_some()
    }

    fn is_ready(&self) -> bool {
        !self.is_down()
    }
}

/// 内存租户存储
#[derive(Default)]
pub struct FakeStore {
    records: Mutex<Vec<TenantRecord>>,
    failing: AtomicBool,
    pub lookups: AtomicUsize,
}

impl FakeStore {
    pub fn with_tenant(self, tenant_id: &str, subdomain: &str, is_active: bool) -> Self {
        self.records.lock().push(TenantRecord {
            tenant_id: TenantId::from(tenant_id),
            subdomain: Some(subdomain.to_string()),
            is_active,
        });
        self
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.failing.store(true, Ordering::SeqCst);
        store
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn subdomain_of(&self, tenant_id: &str) -> Option<String> {
        self.records
            .lock()
            .iter()
            .find(|r| r.tenant_id.as_str() == tenant_id)
            .and_then(|r| r.subdomain.clone())
    }

    fn check(&self) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::database("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl TenantStore for FakeStore {
    async fn find_active_by_subdomain(
        &self,
        subdomain: &str,
    ) -> AppResult<Option<SubdomainMapping>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
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
        self.check()?;
        Ok(self
            .records
            .lock()
            .iter()
            .find(|r| r.subdomain.as_deref() == Some(subdomain))
            .cloned())
    }

    async fn find_by_id(&self, tenant_id: &TenantId) -> AppResult<Option<TenantRecord>> {
        self.check()?;
        Ok(self
            .records
            .lock()
            .iter()
            .find(|r| &r.tenant_id == tenant_id)
            .cloned())
    }

    async fn update_subdomain(&self, tenant_id: &TenantId, subdomain: &str) -> AppResult<()> {
        self.check()?;
        let mut records = self.records.lock();
        let record = records
            .iter_mut()
            .find(|r| &r.tenant_id == tenant_id)
            .ok_or_else(|| AppError::not_found("Tenant not found"))?;
        record.subdomain = Some(subdomain.to_string());
        Ok(())
    }
}

pub fn resolver(cache: &Arc<FakeCache>, store: &Arc<FakeStore>) -> Arc<TenantResolver> {
    Arc::new(TenantResolver::new(cache.clone(), store.clone()))
}

pub fn gate(cache: &Arc<FakeCache>, store: &Arc<FakeStore>) -> TenantGate {
    TenantGate::new(resolver(cache, store))
}
