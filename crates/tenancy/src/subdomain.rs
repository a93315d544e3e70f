//! 子域名规范化与校验

use enro_errors::{AppError, AppResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// 缓存键前缀
pub const CACHE_PREFIX: &str = "subdomain:";

/// DNS 单个标签最大长度
const MAX_LABEL_LEN: usize = 63;

static SUBDOMAIN_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").expect("valid subdomain regex"));

/// 规范化子域名：去除首尾空白并转小写（幂等）
pub fn normalize_subdomain(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// 子域名对应的缓存键
pub fn subdomain_cache_key(normalized: &str) -> String {
    format!("{}{}", CACHE_PREFIX, normalized)
}

/// 已规范化且格式合法的子域名
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Subdomain(String);

impl Subdomain {
    /// 规范化并校验格式：只允许小写字母、数字和连字符
    pub fn parse(raw: &str) -> AppResult<Self> {
        let normalized = normalize_subdomain(raw);

        if normalized.is_empty() {
            return Err(AppError::validation("Subdomain is required"));
        }

        if normalized.len() > MAX_LABEL_LEN {
            return Err(AppError::validation(format!(
                "Subdomain must be at most {} characters",
                MAX_LABEL_LEN
            )));
        }

        if !SUBDOMAIN_FORMAT.is_match(&normalized) {
            return Err(AppError::validation(
                "Subdomain can only contain letters, numbers, and hyphens",
            ));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn cache_key(&self) -> String {
        subdomain_cache_key(&self.0)
    }
}

impl std::fmt::Display for Subdomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Subdomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["ABC ", "abc", " Abc", "\tAbC\n"] {
            let once = normalize_subdomain(raw);
            assert_eq!(once, "abc");
            assert_eq!(normalize_subdomain(&once), once);
        }
    }

    #[test]
    fn test_cache_key_is_namespaced() {
        assert_eq!(subdomain_cache_key("acme"), "subdomain:acme");
        assert_eq!(
            Subdomain::parse(" ACME ").unwrap().cache_key(),
            "subdomain:acme"
        );
    }

    #[test]
    fn test_parse_accepts_letters_digits_hyphens() {
        assert_eq!(Subdomain::parse("Shree-CC2").unwrap().as_str(), "shree-cc2");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!(matches!(Subdomain::parse("   "), Err(AppError::Validation(_))));
        assert!(matches!(Subdomain::parse("my school"), Err(AppError::Validation(_))));
        assert!(matches!(Subdomain::parse("acme.com"), Err(AppError::Validation(_))));
        assert!(matches!(Subdomain::parse("ac_me"), Err(AppError::Validation(_))));
        assert!(matches!(
            Subdomain::parse(&"a".repeat(64)),
            Err(AppError::Validation(_))
        ));
    }
}
