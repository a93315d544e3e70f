//! Cache trait 定义

use async_trait::async_trait;
use std::time::Duration;

/// 尽力而为的缓存
///
/// 所有方法都不返回错误：缓存不可用时 `get` 返回 `None`，
/// 写入/删除返回 `false`，调用方无需为缓存层编写失败分支。
/// 未命中与缓存不可用对调用方不可区分。
#[async_trait]
pub trait CachePort: Send + Sync {
    /// 获取缓存值
    async fn get(&self, key: &str) -> Option<String>;

    /// 写入缓存值并设置过期时间，成功返回 `true`
    async fn set_with_expiry(&self, key: &str, ttl: Duration, value: &str) -> bool;

    /// 删除缓存，成功返回 `true`
    async fn delete(&self, key: &str) -> bool;

    /// 底层连接是否就绪，仅用于诊断
    fn is_ready(&self) -> bool;
}
