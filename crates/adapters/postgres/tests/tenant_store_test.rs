//! PostgreSQL 租户存储测试（需要 DATABASE_URL 指向可用的 PostgreSQL 实例）

use enro_adapter_postgres::PostgresTenantStore;
use enro_common::TenantId;
use enro_errors::AppError;
use enro_ports::TenantStore;
use sqlx::PgPool;

async fn seed(pool: &PgPool, tenant_id: &str, subdomain: &str, is_active: bool) {
    sqlx::query("INSERT INTO tenants (tenant_id, subdomain, is_active) VALUES ($1, $2, $3)")
        .bind(tenant_id)
        .bind(subdomain)
        .bind(is_active)
        .execute(pool)
        .await
        .unwrap();
}

#[sqlx::test(migrations = "./migrations")]
#[ignore] // 需要 PostgreSQL 实例
async fn test_find_active_by_subdomain_skips_inactive(pool: PgPool) {
    seed(&pool, "t1", "acme", true).await;
    seed(&pool, "t2", "dormant", false).await;
    let store = PostgresTenantStore::new(pool);

    let found = store.find_active_by_subdomain("acme").await.unwrap().unwrap();
    assert_eq!(found.tenant_id, TenantId::from("t1"));
    assert_eq!(found.subdomain, "acme");

    assert!(store.find_active_by_subdomain("dormant").await.unwrap().is_none());
    assert!(store.find_by_subdomain("dormant").await.unwrap().is_some());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore] // 需要 PostgreSQL 实例
async fn test_update_subdomain(pool: PgPool) {
    seed(&pool, "t1", "acme", true).await;
    seed(&pool, "t2", "globex", true).await;
    let store = PostgresTenantStore::new(pool);

    store.update_subdomain(&TenantId::from("t1"), "acme-academy").await.unwrap();
    let record = store.find_by_id(&TenantId::from("t1")).await.unwrap().unwrap();
    assert_eq!(record.subdomain.as_deref(), Some("acme-academy"));

    let err = store.update_subdomain(&TenantId::from("t1"), "globex").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = store.update_subdomain(&TenantId::from("missing"), "new").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
