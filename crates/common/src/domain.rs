//! 域名拓扑定义
//!
//! 每种部署拓扑（本地通配域名、生产根域名等）用一条 `DomainPattern` 描述，
//! 新增拓扑只需要增加配置项

use serde::{Deserialize, Serialize};

/// 本地开发通配域名
pub const LOCAL_WILDCARD_SUFFIX: &str = "lvh.me";

/// 生产根域名
pub const PRODUCTION_ROOT_SUFFIX: &str = "enromatics.com";

/// 标签数量到子域名下标的映射
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelIndex {
    /// 主机名的标签总数
    pub labels: usize,
    /// 租户子域名所在下标（从左往右，0 开始）
    pub index: usize,
}

/// 子域名提取规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubdomainRule {
    /// 取倒数第 `position` 个标签，标签总数少于 `min_labels` 时不提取
    FromEnd {
        position: usize,
        #[serde(default)]
        min_labels: usize,
    },
    /// 按标签总数精确匹配，未列出的数量不提取
    ByLabelCount { indices: Vec<LabelIndex> },
}

impl SubdomainRule {
    /// 从已拆分的标签中选出租户子域名
    pub fn pick<'a>(&self, labels: &[&'a str]) -> Option<&'a str> {
        let picked = match self {
            Self::FromEnd {
                position,
                min_labels,
            } => {
                if *position == 0 || labels.len() < *min_labels {
                    return None;
                }
                let index = labels.len().checked_sub(*position)?;
                labels.get(index).copied()
            }
            Self::ByLabelCount { indices } => indices
                .iter()
                .find(|entry| entry.labels == labels.len())
                .and_then(|entry| labels.get(entry.index).copied()),
        };

        picked.filter(|label| !label.is_empty())
    }
}

/// 域名模式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainPattern {
    /// 域名后缀，按标签边界匹配
    pub suffix: String,
    pub rule: SubdomainRule,
}

impl DomainPattern {
    pub fn new(suffix: impl Into<String>, rule: SubdomainRule) -> Self {
        Self {
            suffix: suffix.into().to_lowercase(),
            rule,
        }
    }

    /// `lvh.me` 本地开发拓扑：`role.tenant.lvh.me` → `tenant`
    ///
    /// 裸的 `tenant.lvh.me` 不提取，本地开发需要带角色前缀；
    /// 旧版解析器对三段主机名也返回倒数第三段，需要兼容时把 `min_labels` 配成 3
    pub fn local_wildcard() -> Self {
        Self::new(
            LOCAL_WILDCARD_SUFFIX,
            SubdomainRule::FromEnd {
                position: 3,
                min_labels: 4,
            },
        )
    }

    /// 生产拓扑：`tenant.enromatics.com`、`role.tenant.enromatics.com` → `tenant`
    pub fn production() -> Self {
        Self::new(
            PRODUCTION_ROOT_SUFFIX,
            SubdomainRule::ByLabelCount {
                indices: vec![
                    LabelIndex {
                        labels: 3,
                        index: 0,
                    },
                    LabelIndex {
                        labels: 4,
                        index: 1,
                    },
                ],
            },
        )
    }

    /// 主机名是否属于该域名（完全相等或以 `.suffix` 结尾）
    pub fn matches(&self, host: &str) -> bool {
        host == self.suffix
            || host
                .strip_suffix(self.suffix.as_str())
                .is_some_and(|head| head.ends_with('.'))
    }
}

/// 默认域名模式列表
pub fn default_domain_patterns() -> Vec<DomainPattern> {
    vec![DomainPattern::local_wildcard(), DomainPattern::production()]
}
