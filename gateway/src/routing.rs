//! API 路由

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use enro_telemetry::HealthStatus;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::{auth_middleware, tenant_guard};
use crate::state::AppState;
use crate::tenants;

/// 构建完整路由
///
/// 受保护路由先经过认证，再经过租户授权
pub fn app_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/tenants/context", get(tenants::tenant_context))
        .route(
            "/api/tenants/{tenantId}/subdomain",
            put(tenants::change_subdomain),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), tenant_guard))
        .route_layer(middleware::from_fn_with_state(
            state.token_service.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .merge(tenants::public_routes())
        .merge(protected)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// 就绪检查
///
/// 缓存状态仅作诊断，缓存不可用时解析会回退到数据库
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let mut status = HealthStatus::new();

    if let Some(pool) = &state.database {
        match enro_adapter_postgres::check_connection(pool).await {
            Ok(()) => status.add_check("postgres", true, None),
            Err(e) => status.add_check("postgres", false, Some(e.to_string())),
        }
    }

    let cache_ready = state.resolver.cache_ready();
    status.add_advisory(
        "redis",
        cache_ready,
        (!cache_ready).then(|| "degraded: resolving from database".to_string()),
    );

    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
