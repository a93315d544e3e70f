//! 租户授权判定
//!
//! 确定请求目标租户（子域名头优先，其次为旧版 `tenantId` 参数），
//! 并校验已认证用户只能访问自己的租户，超级管理员除外。
//! 每次判定独立、无状态、不重试。

use std::sync::Arc;

use enro_common::{TenantId, UserId};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::resolver::TenantResolver;

/// 默认超级管理员角色
pub const SUPERADMIN_ROLE: &str = "superadmin";

/// 已认证用户（由前置认证步骤填充）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub tenant_id: Option<TenantId>,
    pub role: String,
}

/// 旧版租户参数，按路由参数、请求体、查询参数的顺序取第一个非空值
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyTenantSignals {
    pub route: Option<String>,
    pub body: Option<String>,
    pub query: Option<String>,
}

impl LegacyTenantSignals {
    pub fn first(&self) -> Option<&str> {
        [&self.route, &self.body, &self.query]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .map(str::trim)
            .find(|v| !v.is_empty())
    }
}

/// 判定结果，每次调用恰好产生一个
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// 放行，目标租户写入请求上下文
    Allow { tenant_id: TenantId },
    /// 缺少用户租户或目标租户
    MissingTenantInfo,
    /// 子域名无法解析
    SubdomainNotFound { subdomain: String },
    /// 跨租户访问
    Forbidden {
        user_tenant: TenantId,
        requested_tenant: TenantId,
    },
}

impl GateDecision {
    /// 指标标签
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Allow { .. } => "allow",
            Self::MissingTenantInfo => "missing_info",
            Self::SubdomainNotFound { .. } => "not_found",
            Self::Forbidden { .. } => "forbidden",
        }
    }

    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Allow { .. } => 200,
            Self::MissingTenantInfo => 400,
            Self::SubdomainNotFound { .. } => 404,
            Self::Forbidden { .. } => 403,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }
}

/// 租户授权闸门
pub struct TenantGate {
    resolver: Arc<TenantResolver>,
    superadmin_role: String,
}

impl TenantGate {
    pub fn new(resolver: Arc<TenantResolver>) -> Self {
        Self {
            resolver,
            superadmin_role: SUPERADMIN_ROLE.to_string(),
        }
    }

    /// 设置可跨租户访问的角色
    pub fn with_superadmin_role(mut self, role: impl Into<String>) -> Self {
        self.superadmin_role = role.into().to_lowercase();
        self
    }

    /// 对单个请求做出判定
    ///
    /// `subdomain` 为请求头中的原始子域名；存在时不再读取旧版参数
    pub async fn authorize(
        &self,
        principal: Option<&Principal>,
        subdomain: Option<&str>,
        legacy: &LegacyTenantSignals,
    ) -> GateDecision {
        let decision = self.decide(principal, subdomain, legacy).await;
        metrics::counter!("tenant_gate_decisions_total", "outcome" => decision.outcome())
            .increment(1);
        decision
    }

    async fn decide(
        &self,
        principal: Option<&Principal>,
        subdomain: Option<&str>,
        legacy: &LegacyTenantSignals,
    ) -> GateDecision {
        let requested = match subdomain.filter(|s| !s.is_empty()) {
            Some(subdomain) => match self.resolver.resolve(subdomain).await {
                Some(tenant_id) => Some(tenant_id),
                None => {
                    info!(subdomain, "Subdomain did not resolve to an active tenant");
                    return GateDecision::SubdomainNotFound {
                        subdomain: subdomain.to_string(),
                    };
                }
            },
            None => legacy.first().map(TenantId::from),
        };

        let user_tenant = principal.and_then(|p| p.tenant_id.clone());
        let (Some(user_tenant), Some(requested)) = (user_tenant, requested) else {
            debug!("Tenant information missing from request");
            return GateDecision::MissingTenantInfo;
        };

        let role = principal.map(|p| p.role.to_lowercase()).unwrap_or_default();

        if user_tenant != requested && role != self.superadmin_role {
            warn!(
                user_tenant = %user_tenant,
                requested_tenant = %requested,
                role = %role,
                "Cross-tenant access denied"
            );
            return GateDecision::Forbidden {
                user_tenant,
                requested_tenant: requested,
            };
        }

        GateDecision::Allow {
            tenant_id: requested,
        }
    }
}
