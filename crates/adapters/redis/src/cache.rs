//! Redis Cache 实现

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use enro_errors::AppError;
use enro_ports::CachePort;
use parking_lot::RwLock;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::RedisConfig;
use crate::connection::{
    ConnectionState, ConnectionStateCell, check_connection, create_connection_manager,
};

/// 缓存操作失败原因
#[derive(Debug, Error)]
pub enum CacheFailure {
    #[error("Redis connection not ready (state: {0})")]
    NotReady(ConnectionState),

    #[error("Redis command failed: {0}")]
    Command(#[from] RedisError),

    #[error("Redis command timed out")]
    Timeout,
}

impl From<CacheFailure> for AppError {
    fn from(err: CacheFailure) -> Self {
        AppError::cache(err.to_string())
    }
}

struct Inner {
    client: Option<Client>,
    conn: RwLock<Option<ConnectionManager>>,
    state: ConnectionStateCell,
    reconnecting: AtomicBool,
    config: RedisConfig,
}

/// 尽力而为的 Redis 缓存客户端
///
/// 进程内只构造一次，由组合根注入到各使用方。
/// `CachePort` 实现永不报错；需要区分失败原因时使用 `try_*` 方法。
#[derive(Clone)]
pub struct RedisCacheClient {
    inner: Arc<Inner>,
}

impl RedisCacheClient {
    /// 创建客户端，不建立连接
    pub fn new(config: RedisConfig) -> Self {
        let (client, state) = match Client::open(config.url.as_str()) {
            Ok(client) => (Some(client), ConnectionState::Initializing),
            Err(e) => {
                warn!(error = %e, "Invalid Redis URL, cache disabled");
                (None, ConnectionState::Disconnected)
            }
        };

        Self {
            inner: Arc::new(Inner {
                client,
                conn: RwLock::new(None),
                state: ConnectionStateCell::new(state),
                reconnecting: AtomicBool::new(false),
                config,
            }),
        }
    }

    /// 创建客户端并在后台建立连接
    ///
    /// 必须在 tokio 运行时内调用
    pub fn connect(config: RedisConfig) -> Self {
        let client = Self::new(config);
        client.spawn_reconnect();
        client
    }

    /// 当前连接状态
    pub fn state(&self) -> ConnectionState {
        self.inner.state.get()
    }

    /// 是否有后台重连任务在运行
    pub fn is_reconnecting(&self) -> bool {
        self.inner.reconnecting.load(Ordering::SeqCst)
    }

    /// 主动关闭连接，之后所有操作返回降级值
    pub fn close(&self) {
        self.inner.conn.write().take();
        self.inner.state.transition(ConnectionState::Disconnected);
    }

    /// 获取缓存值
    pub async fn try_get(&self, key: &str) -> Result<Option<String>, CacheFailure> {
        let mut conn = self.connection()?;
        let key = self.inner.config.prefixed_key(key);
        self.run(conn.get(key)).await
    }

    /// 写入缓存值并设置过期时间
    pub async fn try_set_with_expiry(
        &self,
        key: &str,
        ttl: Duration,
        value: &str,
    ) -> Result<(), CacheFailure> {
        let mut conn = self.connection()?;
        let key = self.inner.config.prefixed_key(key);
        self.run(conn.set_ex(key, value, ttl.as_secs().max(1))).await
    }

    /// 删除缓存，返回删除的键数量
    pub async fn try_delete(&self, key: &str) -> Result<u64, CacheFailure> {
        let mut conn = self.connection()?;
        let key = self.inner.config.prefixed_key(key);
        self.run(conn.del(key)).await
    }

    fn connection(&self) -> Result<ConnectionManager, CacheFailure> {
        let state = self.inner.state.get();
        if state != ConnectionState::Ready {
            return Err(CacheFailure::NotReady(state));
        }
        self.inner
            .conn
            .read()
            .clone()
            .ok_or(CacheFailure::NotReady(state))
    }

    /// 执行命令；连接级错误会把状态切到 Disconnected 并触发重连
    async fn run<T, F>(&self, command: F) -> Result<T, CacheFailure>
    where
        F: std::future::Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.inner.config.command_timeout, command).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                if is_connection_error(&e) {
                    self.mark_disconnected();
                }
                Err(CacheFailure::Command(e))
            }
            Err(_) => {
                self.mark_disconnected();
                Err(CacheFailure::Timeout)
            }
        }
    }

    fn mark_disconnected(&self) {
        self.inner.conn.write().take();
        if self.inner.state.transition(ConnectionState::Disconnected) == ConnectionState::Ready {
            self.spawn_reconnect();
        }
    }

    fn spawn_reconnect(&self) {
        if self.inner.client.is_none() {
            return;
        }
        if self.inner.reconnecting.swap(true, Ordering::SeqCst) {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(supervise(self.inner.clone()));
            }
            Err(_) => {
                warn!("No tokio runtime available, Redis connection not started");
                self.inner.reconnecting.store(false, Ordering::SeqCst);
            }
        }
    }

    /// 所有被吞掉的缓存错误都在这里记录
    fn degrade<T>(&self, operation: &'static str, key: &str, failure: CacheFailure, fallback: T) -> T {
        match &failure {
            CacheFailure::NotReady(_) => {
                debug!(operation, key, error = %failure, "Cache unavailable, using fallback")
            }
            _ => warn!(operation, key, error = %failure, "Cache operation failed, using fallback"),
        }
        fallback
    }
}

/// 后台连接任务：按重连策略重试，直到成功或放弃
async fn supervise(inner: Arc<Inner>) {
    let Some(client) = inner.client.as_ref() else {
        inner.reconnecting.store(false, Ordering::SeqCst);
        return;
    };
    let policy = &inner.config.reconnect;
    let mut attempt: u32 = 0;

    loop {
        match create_connection_manager(client, inner.config.connection_timeout).await {
            Ok(mut conn) => {
                inner.state.transition(ConnectionState::Connected);
                match check_connection(&mut conn).await {
                    Ok(()) => {
                        *inner.conn.write() = Some(conn);
                        inner.state.transition(ConnectionState::Ready);
                        if attempt > 0 {
                            info!(attempts = attempt + 1, "Redis reconnected");
                        }
                        break;
                    }
                    Err(e) => {
                        inner.state.transition(ConnectionState::Disconnected);
                        debug!(error = %e, "Redis handshake failed");
                    }
                }
            }
            Err(e) => {
                debug!(error = %e, attempt = attempt + 1, "Redis connection attempt failed");
            }
        }

        attempt += 1;
        if policy.exhausted(attempt) {
            inner.state.transition(ConnectionState::Disconnected);
            warn!(
                max_attempts = policy.max_attempts,
                "Redis: max reconnection attempts reached, cache stays disabled"
            );
            break;
        }
        tokio::time::sleep(policy.delay_for_attempt(attempt)).await;
    }

    inner.reconnecting.store(false, Ordering::SeqCst);
}

fn is_connection_error(e: &RedisError) -> bool {
    e.is_connection_dropped() || e.is_io_error() || e.is_connection_refusal() || e.is_timeout()
}

#[async_trait]
impl CachePort for RedisCacheClient {
    async fn get(&self, key: &str) -> Option<String> {
        match self.try_get(key).await {
            Ok(value) => value,
            Err(failure) => self.degrade("get", key, failure, None),
        }
    }

    async fn set_with_expiry(&self, key: &str, ttl: Duration, value: &str) -> bool {
        match self.try_set_with_expiry(key, ttl, value).await {
            Ok(()) => true,
            Err(failure) => self.degrade("set_with_expiry", key, failure, false),
        }
    }

    async fn delete(&self, key: &str) -> bool {
        match self.try_delete(key).await {
            Ok(_) => true,
            Err(failure) => self.degrade("delete", key, failure, false),
        }
    }

    fn is_ready(&self) -> bool {
        self.inner.state.get() == ConnectionState::Ready
    }
}
