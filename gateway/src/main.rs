//! Enromatics API Gateway

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use enro_adapter_postgres::{PostgresTenantStore, create_pool, run_migrations};
use enro_adapter_redis::RedisCacheClient;
use enro_config::AppConfig;
use enro_gateway::{AppState, app_router, config};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // 加载配置
    let app_config = AppConfig::load("config").context("Failed to load configuration")?;

    // 初始化 tracing / metrics
    enro_telemetry::init(&app_config.telemetry.log_level, app_config.telemetry.json);
    let metrics = enro_telemetry::init_metrics().context("Failed to install metrics recorder")?;

    info!(app = %app_config.app_name, env = %app_config.app_env, "Starting gateway");

    // 数据库
    let pool = create_pool(&config::postgres_config(&app_config)).await?;
    run_migrations(&pool).await?;

    // 缓存连接在后台建立，未就绪前解析直接查询数据库
    let cache = Arc::new(RedisCacheClient::connect(config::redis_config(&app_config)));
    let store = Arc::new(PostgresTenantStore::new(pool.clone()));

    let state = AppState::new(
        config::token_service(&app_config),
        cache.clone(),
        store,
        &app_config.tenancy,
    )
    .context("Invalid tenancy.subdomain_header")?
    .with_database(pool)
    .with_metrics(metrics);

    let app = app_router(state);

    let addr: SocketAddr = format!("{}:{}", app_config.server.host, app_config.server.port)
        .parse()
        .context("Invalid server address")?;

    info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache.close();
    info!("Gateway stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
