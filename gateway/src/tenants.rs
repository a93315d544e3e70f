//! 租户路由

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use enro_common::TenantId;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{ApiResult, message_response};
use crate::middleware::{AuthUser, TenantContext};
use crate::state::AppState;

/// 无需认证的租户路由
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tenants/check-subdomain", get(check_subdomain))
        .route("/api/tenants/current", get(current_tenant))
}

#[derive(Debug, Deserialize)]
pub struct CheckSubdomainQuery {
    pub subdomain: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckSubdomainResponse {
    pub success: bool,
    pub available: bool,
    pub subdomain: String,
    pub message: String,
}

async fn check_subdomain(
    State(state): State<AppState>,
    Query(query): Query<CheckSubdomainQuery>,
) -> ApiResult<Json<CheckSubdomainResponse>> {
    let result = state
        .subdomains
        .check_availability(query.subdomain.as_deref().unwrap_or_default())
        .await?;

    let message = if result.available {
        "Subdomain is available"
    } else {
        "Subdomain is already taken"
    };

    Ok(Json(CheckSubdomainResponse {
        success: true,
        available: result.available,
        subdomain: result.subdomain.to_string(),
        message: message.to_string(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentTenantResponse {
    pub tenant_id: TenantId,
    pub subdomain: String,
}

/// 代理转发时优先使用 `X-Forwarded-Host` 的第一个值
fn request_host(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("x-forwarded-host")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .or_else(|| headers.get(header::HOST).and_then(|h| h.to_str().ok()))
}

async fn current_tenant(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(subdomain) = request_host(&headers).and_then(|host| state.hostnames.extract(host))
    else {
        debug!(host = ?request_host(&headers), "No tenant subdomain in host");
        return message_response(StatusCode::NOT_FOUND, "No tenant subdomain in host");
    };

    match state.resolver.resolve(&subdomain).await {
        Some(tenant_id) => Json(CurrentTenantResponse {
            tenant_id,
            subdomain,
        })
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "message": "Tenant not found for subdomain",
                "subdomain": subdomain,
            })),
        )
            .into_response(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantContextResponse {
    pub tenant_id: TenantId,
    pub user_id: String,
    pub role: String,
}

/// 当前请求的租户上下文
pub async fn tenant_context(
    AuthUser(user): AuthUser,
    TenantContext { tenant_id }: TenantContext,
) -> Json<TenantContextResponse> {
    Json(TenantContextResponse {
        tenant_id,
        user_id: user.user_id.into_inner(),
        role: user.role,
    })
}

#[derive(Debug, Deserialize)]
pub struct ChangeSubdomainRequest {
    #[serde(default)]
    pub subdomain: String,
}

#[derive(Debug, Serialize)]
pub struct ChangeSubdomainResponse {
    pub success: bool,
    pub message: String,
    pub subdomain: String,
}

/// 修改租户子域名
///
/// 路径中的租户必须与授权判定得到的租户一致
pub async fn change_subdomain(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    TenantContext { tenant_id: context }: TenantContext,
    Json(req): Json<ChangeSubdomainRequest>,
) -> ApiResult<Response> {
    let tenant_id = TenantId::new(tenant_id);
    if tenant_id != context {
        return Ok(message_response(
            StatusCode::BAD_REQUEST,
            "Tenant in path does not match request tenant",
        ));
    }

    let subdomain = state
        .subdomains
        .change_subdomain(&tenant_id, &req.subdomain)
        .await?;

    Ok(Json(ChangeSubdomainResponse {
        success: true,
        message: "Subdomain updated successfully".to_string(),
        subdomain: subdomain.to_string(),
    })
    .into_response())
}
