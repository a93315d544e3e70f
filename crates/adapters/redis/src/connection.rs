//! Redis 连接管理

use std::time::Duration;

use enro_errors::{AppError, AppResult};
use parking_lot::RwLock;
use redis::Client;
use redis::aio::ConnectionManager;
use tracing::{debug, info, warn};

/// 连接状态
///
/// `Initializing → Connected → Ready`，出错或关闭时 `Ready → Disconnected`，
/// 自动重连时 `Disconnected → Connected → Ready`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// 尚未建立连接
    Initializing,
    /// 连接已建立，等待握手
    Connected,
    /// 握手完成，可以执行命令
    Ready,
    /// 连接断开
    Disconnected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Connected => "connected",
            Self::Ready => "ready",
            Self::Disconnected => "disconnected",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 连接状态单元，只由客户端自身的连接/重连逻辑修改
#[derive(Debug)]
pub struct ConnectionStateCell {
    state: RwLock<ConnectionState>,
}

impl ConnectionStateCell {
    pub fn new(initial: ConnectionState) -> Self {
        Self {
            state: RwLock::new(initial),
        }
    }

    pub fn get(&self) -> ConnectionState {
        *self.state.read()
    }

    /// 切换状态，返回之前的状态
    pub fn transition(&self, next: ConnectionState) -> ConnectionState {
        let previous = std::mem::replace(&mut *self.state.write(), next);
        if previous != next {
            match next {
                ConnectionState::Disconnected => {
                    warn!(from = %previous, to = %next, "Redis connection state changed")
                }
                ConnectionState::Ready => {
                    info!(from = %previous, to = %next, "Redis connection state changed")
                }
                _ => debug!(from = %previous, to = %next, "Redis connection state changed"),
            }
        }
        previous
    }
}

/// 创建 Redis 连接管理器
pub async fn create_connection_manager(client: &Client, timeout: Duration) -> AppResult<ConnectionManager> {
    match tokio::time::timeout(timeout, ConnectionManager::new(client.clone())).await {
        Ok(result) => result.map_err(|e| {
            AppError::cache(format!("Failed to create Redis connection manager: {}", e))
        }),
        Err(_) => Err(AppError::cache("Timed out creating Redis connection manager")),
    }
}

/// 检查 Redis 连接
pub async fn check_connection(conn: &mut ConnectionManager) -> AppResult<()> {
    redis::cmd("PING")
        .query_async::<String>(conn)
        .await
        .map_err(|e| AppError::cache(format!("Redis health check failed: {}", e)))?;
    Ok(())
}
