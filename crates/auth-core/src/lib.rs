//! enro-auth-core - 认证核心库
//!
//! JWT Claims 与令牌签发/校验

use chrono::{Duration, Utc};
use enro_common::{TenantId, UserId};
use enro_errors::{AppError, AppResult};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT Claims
///
/// 兼容 Web 端（`id`）与移动端（`userId`）两种用户字段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    #[serde(alias = "id", alias = "userId")]
    pub sub: String,
    /// Tenant ID，平台级账号可能没有
    #[serde(default, alias = "tenantId", skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// 角色
    #[serde(default)]
    pub role: String,
    /// Expiration time
    pub exp: i64,
    /// Issued at
    pub iat: i64,
    /// JWT ID
    pub jti: String,
    /// Issuer
    #[serde(default)]
    pub iss: String,
    /// Audience
    #[serde(default)]
    pub aud: String,
}

impl Claims {
    pub fn new(
        user_id: &UserId,
        tenant_id: Option<&TenantId>,
        role: &str,
        expires_in_secs: i64,
        issuer: &str,
        audience: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            tenant_id: tenant_id.map(ToString::to_string),
            role: role.to_string(),
            exp: (now + Duration::seconds(expires_in_secs)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::now_v7().to_string(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
        }
    }

    pub fn user_id(&self) -> UserId {
        UserId::new(self.sub.clone())
    }

    /// 令牌中的租户 ID（空字符串视为缺失）
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(TenantId::from)
    }

    /// 角色比较不区分大小写
    pub fn has_role(&self, role: &str) -> bool {
        self.role.eq_ignore_ascii_case(role)
    }
}

/// Token 服务
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires_in: i64,
    issuer: String,
    audience: String,
}

impl TokenService {
    pub fn new(
        secret: &str,
        access_token_expires_in: i64,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expires_in,
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    /// 生成访问令牌
    pub fn generate_access_token(
        &self,
        user_id: &UserId,
        tenant_id: Option<&TenantId>,
        role: &str,
    ) -> AppResult<String> {
        let claims = Claims::new(
            user_id,
            tenant_id,
            role,
            self.access_token_expires_in,
            &self.issuer,
            &self.audience,
        );

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))
    }

    /// 验证令牌
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 0; // 不允许时间偏差

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::unauthorized(format!("Invalid token: {}", e)))?;

        let claims = token_data.claims;

        if claims.sub.is_empty() {
            return Err(AppError::unauthorized("Token subject missing"));
        }

        if claims.jti.is_empty() {
            return Err(AppError::unauthorized("Token ID (jti) missing"));
        }

        Ok(claims)
    }

    /// 获取访问令牌过期时间（秒）
    pub fn access_token_expires_in(&self) -> i64 {
        self.access_token_expires_in
    }
}
