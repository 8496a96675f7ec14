use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for Dragnet
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub targets: BTreeMap<String, Target>,
}

/// Global scraper defaults, overridable per target
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-seconds")]
    pub timeout_seconds: u64,

    /// Retries after the first attempt for transient failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Minimum spacing between requests to the same origin (seconds)
    #[serde(rename = "rate-limit-seconds")]
    pub rate_limit_seconds: f64,

    /// Concurrency cap for the concurrent driver
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: usize,

    /// Run-level wall-clock budget (seconds); unset means unbounded
    #[serde(rename = "run-timeout-seconds", default)]
    pub run_timeout_seconds: Option<u64>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_retries: 2,
            rate_limit_seconds: 1.0,
            max_concurrent: 10,
            run_timeout_seconds: None,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    pub name: String,
    pub version: String,
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: "Dragnet".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/dragnet/dragnet".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version (+ContactUrl)`
    pub fn header_value(&self) -> String {
        format!("{}/{} (+{})", self.name, self.version, self.contact_url)
    }
}

/// Output configuration for the storage collaborator
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: String,
    pub format: OutputFormat,
    #[serde(rename = "include-timestamp")]
    pub include_timestamp: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
            format: OutputFormat::Csv,
            include_timestamp: true,
        }
    }
}

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
}

/// A named, pre-configured scrape job
///
/// Targets are immutable once loaded; the orchestration core only reads them.
#[derive(Debug, Clone, Deserialize)]
pub struct Target {
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Ordered field specs; order determines record column order
    #[serde(default)]
    pub fields: Vec<FieldSpec>,

    #[serde(default)]
    pub pagination: PaginationRule,

    /// Per-target overrides of the scraper defaults
    #[serde(rename = "rate-limit-seconds", default)]
    pub rate_limit_seconds: Option<f64>,
    #[serde(rename = "max-retries", default)]
    pub max_retries: Option<u32>,
    #[serde(rename = "timeout-seconds", default)]
    pub timeout_seconds: Option<u64>,
}

impl Target {
    /// Builds a one-page ad-hoc target for a single URL, used by the CLI
    /// bypass modes. Pagination stays disabled.
    pub fn ad_hoc(url: &str, fields: Vec<FieldSpec>) -> Self {
        Self {
            base_url: url.to_string(),
            fields,
            pagination: PaginationRule::default(),
            rate_limit_seconds: None,
            max_retries: None,
            timeout_seconds: None,
        }
    }

    pub fn effective_rate_limit(&self, defaults: &ScraperConfig) -> Duration {
        Duration::from_secs_f64(self.rate_limit_seconds.unwrap_or(defaults.rate_limit_seconds))
    }

    pub fn effective_max_retries(&self, defaults: &ScraperConfig) -> u32 {
        self.max_retries.unwrap_or(defaults.max_retries)
    }

    pub fn effective_timeout(&self, defaults: &ScraperConfig) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(defaults.timeout_seconds))
    }
}

/// One extraction field: name, selector expression, and selector kind
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub selector: String,
    #[serde(default)]
    pub kind: SelectorKind,
    /// A repeating field yields one record per matched node
    #[serde(default)]
    pub repeating: bool,
}

/// Selector kinds, one evaluation path per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    #[default]
    Css,
    Xpath,
}

/// Pagination rule for a target
///
/// With `enabled = false` the orchestrator always stops after one page.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationRule {
    #[serde(default)]
    pub enabled: bool,

    /// Selector for the next-page link
    #[serde(rename = "next-selector", default)]
    pub next_selector: String,

    #[serde(rename = "next-kind", default)]
    pub next_kind: SelectorKind,

    /// Hard bound on pages visited per chain
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_max_pages() -> u32 {
    1
}

impl Default for PaginationRule {
    fn default() -> Self {
        Self {
            enabled: false,
            next_selector: String::new(),
            next_kind: SelectorKind::Css,
            max_pages: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_header_value() {
        let ua = UserAgentConfig {
            name: "TestBot".to_string(),
            version: "2.1".to_string(),
            contact_url: "https://example.com/bot".to_string(),
        };
        assert_eq!(ua.header_value(), "TestBot/2.1 (+https://example.com/bot)");
    }

    #[test]
    fn test_target_overrides_fall_back_to_defaults() {
        let defaults = ScraperConfig::default();
        let mut target = Target::ad_hoc("https://example.com", vec![]);

        assert_eq!(
            target.effective_rate_limit(&defaults),
            Duration::from_secs_f64(defaults.rate_limit_seconds)
        );
        assert_eq!(target.effective_max_retries(&defaults), defaults.max_retries);

        target.rate_limit_seconds = Some(0.25);
        target.max_retries = Some(5);
        target.timeout_seconds = Some(3);

        assert_eq!(target.effective_rate_limit(&defaults), Duration::from_millis(250));
        assert_eq!(target.effective_max_retries(&defaults), 5);
        assert_eq!(target.effective_timeout(&defaults), Duration::from_secs(3));
    }

    #[test]
    fn test_pagination_rule_default_is_single_page() {
        let rule = PaginationRule::default();
        assert!(!rule.enabled);
        assert_eq!(rule.max_pages, 1);
    }
}
