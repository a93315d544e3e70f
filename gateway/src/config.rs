//! 从应用配置构造各适配器配置

use std::time::Duration;

use enro_adapter_postgres::PostgresConfig;
use enro_adapter_redis::{ReconnectPolicy, RedisConfig};
use enro_auth_core::TokenService;
use enro_config::AppConfig;
use secrecy::ExposeSecret;

pub fn redis_config(config: &AppConfig) -> RedisConfig {
    let redis = &config.redis;
    RedisConfig::new(redis.url.expose_secret().as_str()).with_reconnect(ReconnectPolicy::new(
        redis.reconnect_max_attempts,
        Duration::from_millis(redis.reconnect_step_ms),
        Duration::from_millis(redis.reconnect_max_delay_ms),
    ))
}

pub fn postgres_config(config: &AppConfig) -> PostgresConfig {
    PostgresConfig::new(config.database.url.expose_secret().as_str())
        .with_max_connections(config.database.max_connections)
}

pub fn token_service(config: &AppConfig) -> TokenService {
    let jwt = &config.jwt;
    TokenService::new(
        jwt.secret.expose_secret(),
        jwt.expires_in,
        jwt.issuer.as_str(),
        jwt.audience.as_str(),
    )
}
