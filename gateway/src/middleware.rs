//! 中间件
//!
//! - [`auth_middleware`]：校验 JWT，注入 [`Claims`] 与 [`Principal`]
//! - [`tenant_guard`]：租户授权判定，放行时注入 [`TenantContext`]

use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, RawPathParams, Request, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use enro_auth_core::{Claims, TokenService};
use enro_common::TenantId;
use enro_tenancy::{GateDecision, LegacyTenantSignals, Principal};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::message_response;
use crate::state::AppState;

/// 旧版 `tenantId` 参数名（路由、请求体、查询参数共用）
pub const LEGACY_TENANT_PARAM: &str = "tenantId";

/// 读取请求体中 `tenantId` 时的最大缓冲大小
const LEGACY_BODY_LIMIT: usize = 1024 * 1024;

/// 已认证用户提取器
///
/// 应该在 auth_middleware 之后使用
pub struct AuthUser(pub Principal);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(AuthUser)
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing user in request extensions (auth_middleware may not have run)",
            ))
    }
}

/// 当前请求的目标租户（由 tenant_guard 注入）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: TenantId,
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<TenantContext>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Missing tenant context (tenant_guard may not have run)",
        ))
    }
}

/// 依次从 Authorization Bearer、`jwt` cookie、`token` cookie 中取令牌
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        debug!("Token from Authorization header");
        return Some(token.to_string());
    }

    ["jwt", "token"]
        .into_iter()
        .find_map(|name| cookie_value(headers, name))
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, value)| key.trim() == name && !value.trim().is_empty())
        .map(|(_, value)| value.trim().to_string())
}

/// JWT 认证中间件
///
/// 验证请求中的 JWT token 并将 claims 注入到请求扩展中
pub async fn auth_middleware(
    State(token_service): State<TokenService>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let Some(token) = extract_token(request.headers()) else {
        warn!("Missing authentication token");
        return Err(message_response(
            StatusCode::UNAUTHORIZED,
            "Not authorized, no token",
        ));
    };

    let claims: Claims = token_service.validate_token(&token).map_err(|e| {
        warn!(error = %e, "Token validation failed");
        message_response(StatusCode::UNAUTHORIZED, "Not authorized, token invalid")
    })?;

    let principal = Principal {
        user_id: claims.user_id(),
        tenant_id: claims.tenant_id(),
        role: claims.role.clone(),
    };

    debug!(
        user_id = %principal.user_id,
        tenant_id = ?principal.tenant_id,
        role = %principal.role,
        "Token validated successfully"
    );

    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

fn query_tenant_id(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == LEGACY_TENANT_PARAM)
        .map(|(_, value)| value.into_owned())
}

fn body_tenant_id(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get(LEGACY_TENANT_PARAM)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

async fn route_tenant_id(parts: &mut Parts, state: &AppState) -> Option<String> {
    let params = RawPathParams::from_request_parts(parts, state).await.ok()?;
    params
        .iter()
        .find(|(key, _)| *key == LEGACY_TENANT_PARAM)
        .map(|(_, value)| value.to_string())
}

/// 租户授权中间件
///
/// 需要通过 `route_layer` 挂载，以便读取路由参数；
/// 必须位于 auth_middleware 之后
pub async fn tenant_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let principal = parts.extensions.get::<Principal>().cloned();
    let subdomain = parts
        .headers
        .get(&state.subdomain_header)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let mut legacy = LegacyTenantSignals::default();
    let body = if subdomain.as_deref().is_some_and(|s| !s.is_empty()) {
        body
    } else {
        legacy.route = route_tenant_id(&mut parts, &state).await;
        legacy.query = parts.uri.query().and_then(query_tenant_id);

        if is_json(&parts.headers) {
            let bytes = match axum::body::to_bytes(body, LEGACY_BODY_LIMIT).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, "Failed to buffer request body");
                    return message_response(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        "Request body too large",
                    );
                }
            };
            legacy.body = body_tenant_id(&bytes);
            Body::from(bytes)
        } else {
            body
        }
    };

    match state
        .gate
        .authorize(principal.as_ref(), subdomain.as_deref(), &legacy)
        .await
    {
        GateDecision::Allow { tenant_id } => {
            parts.extensions.insert(TenantContext { tenant_id });
            next.run(Request::from_parts(parts, body)).await
        }
        GateDecision::MissingTenantInfo => {
            message_response(StatusCode::BAD_REQUEST, "Tenant information missing")
        }
        GateDecision::SubdomainNotFound { subdomain } => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "message": "Tenant not found for subdomain",
                "subdomain": subdomain,
            })),
        )
            .into_response(),
        GateDecision::Forbidden {
            user_tenant,
            requested_tenant,
        } => (
            StatusCode::FORBIDDEN,
            Json(json!({
                "message": "Access denied: you can only access your own tenant",
                "userTenant": user_tenant,
                "requestedTenant": requested_tenant,
            })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        http::{Request, StatusCode},
        middleware,
        routing::get,
    };
    use enro_common::UserId;
    use tower::ServiceExt;

    const SECRET: &str = "test_secret_with_enough_length_0001";

    fn token_service() -> TokenService {
        TokenService::new(SECRET, 3600, "enromatics", "enromatics-api")
    }

    async fn handler(AuthUser(user): AuthUser) -> String {
        user.user_id.to_string()
    }

    fn app(token_service: TokenService) -> Router {
        Router::new()
            .route("/", get(handler))
            .layer(middleware::from_fn_with_state(
                token_service.clone(),
                auth_middleware,
            ))
            .with_state(token_service)
    }

    fn token(service: &TokenService) -> String {
        service
            .generate_access_token(&UserId::from("u-1"), Some(&TenantId::from("t-1")), "admin")
            .unwrap()
    }

    #[tokio::test]
    async fn test_auth_middleware_bearer_token() {
        let service = token_service();
        let req = Request::builder()
            .uri("/")
            .header("Authorization", format!("Bearer {}", token(&service)))
            .body(Body::empty())
            .unwrap();

        let response = app(service).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_auth_middleware_jwt_cookie() {
        let service = token_service();
        let req = Request::builder()
            .uri("/")
            .header("Cookie", format!("theme=dark; jwt={}", token(&service)))
            .body(Body::empty())
            .unwrap();

        let response = app(service).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_auth_middleware_token_cookie() {
        let service = token_service();
        let req = Request::builder()
            .uri("/")
            .header("Cookie", format!("token={}", token(&service)))
            .body(Body::empty())
            .unwrap();

        let response = app(service).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_auth_middleware_invalid_token() {
        let req = Request::builder()
            .uri("/")
            .header("Authorization", "Bearer invalid_token")
            .body(Body::empty())
            .unwrap();

        let response = app(token_service()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_middleware_missing_token() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app(token_service()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_middleware_wrong_secret() {
        let other = TokenService::new("another_secret_with_enough_length", 3600, "enromatics", "enromatics-api");
        let req = Request::builder()
            .uri("/")
            .header("Authorization", format!("Bearer {}", token(&other)))
            .body(Body::empty())
            .unwrap();

        let response = app(token_service()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_bearer_preferred_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer from-header".parse().unwrap());
        headers.insert(header::COOKIE, "jwt=from-cookie".parse().unwrap());
        assert_eq!(extract_token(&headers).as_deref(), Some("from-header"));

        headers.remove(header::AUTHORIZATION);
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_query_tenant_id() {
        assert_eq!(
            query_tenant_id("page=1&tenantId=t%2D1").as_deref(),
            Some("t-1")
        );
        assert_eq!(query_tenant_id("page=1"), None);
    }

    #[test]
    fn test_body_tenant_id() {
        assert_eq!(
            body_tenant_id(br#"{"tenantId":"t-1","name":"x"}"#).as_deref(),
            Some("t-1")
        );
        assert_eq!(body_tenant_id(b"not json"), None);
        assert_eq!(body_tenant_id(br#"{"tenantId":42}"#), None);
    }
}
