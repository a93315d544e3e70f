//! Redis 配置模块

use std::time::Duration;

/// 重连策略
///
/// 第 n 次失败后等待 `min(step * n, max_delay)`，失败达到 `max_attempts` 次后放弃重连
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// 最大重连次数
    pub max_attempts: u32,
    /// 每次递增的延迟
    pub step: Duration,
    /// 最大延迟
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            step: Duration::from_millis(100),
            max_delay: Duration::from_millis(3000),
        }
    }
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, step: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            step,
            max_delay,
        }
    }

    /// 计算第 n 次失败后的等待时间
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt).min(self.max_delay)
    }

    /// 第 n 次失败后是否放弃
    pub fn exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}

/// Redis 配置
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL
    pub url: String,
    /// 建立连接超时
    pub connection_timeout: Duration,
    /// 单条命令超时
    pub command_timeout: Duration,
    /// 重连策略
    pub reconnect: ReconnectPolicy,
    /// 键前缀
    pub key_prefix: Option<String>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connection_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(1),
            reconnect: ReconnectPolicy::default(),
            key_prefix: None,
        }
    }
}

impl RedisConfig {
    /// 创建新的配置
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// 设置重连策略
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// 设置连接超时
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// 设置键前缀
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// 获取带前缀的键
    pub fn prefixed_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}
