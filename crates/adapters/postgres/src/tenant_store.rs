//! PostgreSQL 租户存储实现

use async_trait::async_trait;
use enro_common::TenantId;
use enro_errors::{AppError, AppResult};
use enro_ports::{SubdomainMapping, TenantRecord, TenantStore};
use sqlx::PgPool;

#[derive(Debug, sqlx::FromRow)]
struct SubdomainRow {
    tenant_id: String,
    subdomain: String,
}

#[derive(Debug, sqlx::FromRow)]
struct TenantRow {
    tenant_id: String,
    subdomain: Option<String>,
    is_active: bool,
}

impl From<TenantRow> for TenantRecord {
    fn from(row: TenantRow) -> Self {
        Self {
            tenant_id: TenantId::new(row.tenant_id),
            subdomain: row.subdomain,
            is_active: row.is_active,
        }
    }
}

pub struct PostgresTenantStore {
    pool: PgPool,
}

impl PostgresTenantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantStore for PostgresTenantStore {
    async fn find_active_by_subdomain(
        &self,
        subdomain: &str,
    ) -> AppResult<Option<SubdomainMapping>> {
        let row = sqlx::query_as::<_, SubdomainRow>(
            r#"
            SELECT tenant_id, subdomain
            FROM tenants
            WHERE subdomain = $1 AND is_active = TRUE
            LIMIT 1
            "#,
        )
        .bind(subdomain)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find tenant by subdomain: {}", e)))?;

        Ok(row.map(|r| SubdomainMapping {
            tenant_id: TenantId::new(r.tenant_id),
            subdomain: r.subdomain,
        }))
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> AppResult<Option<TenantRecord>> {
        let row = sqlx::query_as::<_, TenantRow>(
            r#"
            SELECT tenant_id, subdomain, is_active
            FROM tenants
            WHERE subdomain = $1
            LIMIT 1
            "#,
        )
        .bind(subdomain)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find tenant by subdomain: {}", e)))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_id(&self, tenant_id: &TenantId) -> AppResult<Option<TenantRecord>> {
        let row = sqlx::query_as::<_, TenantRow>(
            r#"
            SELECT tenant_id, subdomain, is_active
            FROM tenants
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find tenant: {}", e)))?;

        Ok(row.map(Into::into))
    }

    async fn update_subdomain(&self, tenant_id: &TenantId, subdomain: &str) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE tenants
            SET subdomain = $2, updated_at = NOW()
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(subdomain)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict("This subdomain is already taken")
            }
            _ => AppError::database(format!("Failed to update subdomain: {}", e)),
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Tenant {} not found", tenant_id)));
        }

        Ok(())
    }
}
