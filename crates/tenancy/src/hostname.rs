//! 主机名解析
//!
//! 从请求的 Host 头中提取租户子域名。支持的部署拓扑由 [`DomainPattern`] 列表描述，
//! 按顺序取第一个匹配的模式。

use enro_common::{DomainPattern, default_domain_patterns};

/// 不携带子域名的本地主机
const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1"];

/// 主机名解析器（纯函数，无 I/O）
#[derive(Debug, Clone)]
pub struct HostnameParser {
    patterns: Vec<DomainPattern>,
}

impl Default for HostnameParser {
    fn default() -> Self {
        Self::new(default_domain_patterns())
    }
}

impl HostnameParser {
    pub fn new(patterns: Vec<DomainPattern>) -> Self {
        Self { patterns }
    }

    /// 提取租户子域名，无法识别时返回 `None`
    pub fn extract(&self, hostname: &str) -> Option<String> {
        let host = strip_port(hostname.trim())
            .trim_end_matches('.')
            .to_ascii_lowercase();

        if host.is_empty() || LOOPBACK_HOSTS.contains(&host.as_str()) {
            return None;
        }

        let pattern = self.patterns.iter().find(|p| p.matches(&host))?;
        let labels: Vec<&str> = host.split('.').collect();

        pattern.rule.pick(&labels).map(str::to_string)
    }
}

/// 使用默认域名拓扑提取子域名
pub fn extract_subdomain_from_hostname(hostname: &str) -> Option<String> {
    HostnameParser::default().extract(hostname)
}

fn strip_port(host: &str) -> &str {
    host.split_once(':').map_or(host, |(name, _)| name)
}
