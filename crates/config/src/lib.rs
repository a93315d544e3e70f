//! enro-config - 配置加载库

use enro_common::{DomainPattern, default_domain_patterns};
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use thiserror::Error;

use secrecy::Secret;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    // 根据环境自动调整连接池大小
    // 开发环境: 10, 生产环境: 50
    match std::env::var("APP_ENV").as_deref() {
        Ok("production") => 50,
        _ => 10,
    }
}

/// Redis 配置
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: Secret<String>,
    /// 最大重连次数，超过后放弃重连
    #[serde(default = "default_reconnect_max_attempts")]
    pub reconnect_max_attempts: u32,
    /// 每次重连增加的延迟（毫秒）
    #[serde(default = "default_reconnect_step_ms")]
    pub reconnect_step_ms: u64,
    /// 重连延迟上限（毫秒）
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
}

fn default_redis_url() -> Secret<String> {
    Secret::new("redis://localhost:6379".to_string())
}

fn default_reconnect_max_attempts() -> u32 {
    10
}

fn default_reconnect_step_ms() -> u64 {
    100
}

fn default_reconnect_max_delay_ms() -> u64 {
    3000
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            reconnect_max_attempts: default_reconnect_max_attempts(),
            reconnect_step_ms: default_reconnect_step_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
        }
    }
}

/// JWT 配置
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
}

fn default_expires_in() -> i64 {
    3600
}

fn default_issuer() -> String {
    "enromatics".to_string()
}

fn default_audience() -> String {
    "enromatics-api".to_string()
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 输出 JSON 格式日志
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

/// 多租户解析配置
#[derive(Debug, Clone, Deserialize)]
pub struct TenancyConfig {
    /// 携带原始子域名的请求头
    #[serde(default = "default_subdomain_header")]
    pub subdomain_header: String,
    /// 子域名映射缓存时长（秒）
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// 可跨租户访问的角色（大小写不敏感）
    #[serde(default = "default_superadmin_role")]
    pub superadmin_role: String,
    /// 识别的域名拓扑
    #[serde(default = "default_domain_patterns")]
    pub domains: Vec<DomainPattern>,
}

fn default_subdomain_header() -> String {
    "x-tenant-subdomain".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_superadmin_role() -> String {
    "superadmin".to_string()
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            subdomain_header: default_subdomain_header(),
            cache_ttl_secs: default_cache_ttl_secs(),
            superadmin_role: default_superadmin_role(),
            domains: default_domain_patterns(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub tenancy: TenancyConfig,
}

fn default_app_name() -> String {
    "enro-gateway".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());
        let config = Self::figment(config_dir, &env).extract()?;
        Ok(config)
    }

    /// 配置来源（按优先级从低到高）
    ///
    /// 1. `{config_dir}/default.toml`
    /// 2. `{config_dir}/{env}.toml`
    /// 3. `ENRO_` 前缀的环境变量，`__` 分隔层级（如 `ENRO_SERVER__PORT`）
    /// 4. `APP_NAME` / `APP_ENV` / `REDIS_URL` / `DATABASE_URL` / `JWT_SECRET`
    pub fn figment(config_dir: &str, env: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("ENRO_").split("__"))
            .merge(Env::raw().only(&["APP_NAME", "APP_ENV"]))
            .merge(Env::raw().only(&["REDIS_URL"]).map(|_| "redis.url".into()))
            .merge(
                Env::raw()
                    .only(&["DATABASE_URL"])
                    .map(|_| "database.url".into()),
            )
            .merge(Env::raw().only(&["JWT_SECRET"]).map(|_| "jwt.secret".into()))
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}
