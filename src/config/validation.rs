//! Configuration validation
//!
//! All config problems are rejected here, before any network activity.

use crate::config::types::{
    Config, FieldSpec, PaginationRule, ScraperConfig, Target, UserAgentConfig,
};
use crate::scrape::Selector;
use crate::ConfigError;
use std::collections::HashSet;
use ::url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_user_agent_config(&config.user_agent)?;

    if config.output.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    for (name, target) in &config.targets {
        validate_target(name, target)?;
    }

    Ok(())
}

fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.timeout_seconds == 0 {
        return Err(ConfigError::Validation(
            "timeout-seconds must be > 0".to_string(),
        ));
    }

    if config.rate_limit_seconds < 0.0 || !config.rate_limit_seconds.is_finite() {
        return Err(ConfigError::Validation(format!(
            "rate-limit-seconds must be a finite value >= 0, got {}",
            config.rate_limit_seconds
        )));
    }

    if config.max_concurrent < 1 || config.max_concurrent > 100 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent must be between 1 and 100, got {}",
            config.max_concurrent
        )));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent name cannot be empty".to_string(),
        ));
    }

    if !config.name.chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(ConfigError::Validation(format!(
            "user-agent name must contain only alphanumeric characters and hyphens, got '{}'",
            config.name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    Ok(())
}

fn validate_target(name: &str, target: &Target) -> Result<(), ConfigError> {
    crate::url::validate_absolute(&target.base_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("target '{}' base-url: {}", name, e))
    })?;

    validate_fields(name, &target.fields)?;
    validate_pagination(name, &target.pagination)?;

    if let Some(timeout) = target.timeout_seconds {
        if timeout == 0 {
            return Err(ConfigError::Validation(format!(
                "target '{}': timeout-seconds must be > 0",
                name
            )));
        }
    }

    if let Some(rate) = target.rate_limit_seconds {
        if rate < 0.0 || !rate.is_finite() {
            return Err(ConfigError::Validation(format!(
                "target '{}': rate-limit-seconds must be a finite value >= 0",
                name
            )));
        }
    }

    Ok(())
}

/// Checks field names for uniqueness and compiles every selector once.
///
/// An empty field list is legal; it yields records that carry only the
/// page metadata columns.
pub fn validate_fields(target: &str, fields: &[FieldSpec]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for field in fields {
        if field.name.is_empty() {
            return Err(ConfigError::Validation(format!(
                "target '{}': field names cannot be empty",
                target
            )));
        }

        if !seen.insert(field.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "target '{}': duplicate field name '{}'",
                target, field.name
            )));
        }

        let selector = Selector::new(field.kind, &field.selector);
        selector
            .check()
            .map_err(|message| ConfigError::InvalidSelector {
                field: format!("{}.{}", target, field.name),
                message,
            })?;
    }

    Ok(())
}

fn validate_pagination(target: &str, rule: &PaginationRule) -> Result<(), ConfigError> {
    if rule.max_pages == 0 {
        return Err(ConfigError::Validation(format!(
            "target '{}': pagination max-pages must be >= 1",
            target
        )));
    }

    if rule.enabled {
        if rule.next_selector.is_empty() {
            return Err(ConfigError::Validation(format!(
                "target '{}': pagination is enabled but next-selector is empty",
                target
            )));
        }

        let selector = Selector::new(rule.next_kind, &rule.next_selector);
        selector
            .check()
            .map_err(|message| ConfigError::InvalidSelector {
                field: format!("{}.pagination", target),
                message,
            })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{SelectorKind, Target};

    fn field(name: &str, selector: &str, kind: SelectorKind) -> FieldSpec {
        FieldSpec {
            name: name.to_string(),
            selector: selector.to_string(),
            kind,
            repeating: false,
        }
    }

    fn minimal_config() -> Config {
        Config {
            scraper: Default::default(),
            user_agent: Default::default(),
            output: Default::default(),
            targets: Default::default(),
        }
    }

    #[test]
    fn test_minimal_config_is_valid() {
        assert!(validate(&minimal_config()).is_ok());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut config = minimal_config();
        config.scraper.timeout_seconds = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_concurrency_out_of_range() {
        let mut config = minimal_config();
        config.scraper.max_concurrent = 0;
        assert!(validate(&config).is_err());

        config.scraper.max_concurrent = 500;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_negative_rate_limit() {
        let mut config = minimal_config();
        config.scraper.rate_limit_seconds = -1.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let mut config = minimal_config();
        config
            .targets
            .insert("t".to_string(), Target::ad_hoc("not a url", vec![]));
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_duplicate_field_names() {
        let fields = vec![
            field("title", "h1", SelectorKind::Css),
            field("title", "h2", SelectorKind::Css),
        ];
        assert!(validate_fields("t", &fields).is_err());
    }

    #[test]
    fn test_rejects_uncompilable_css() {
        let fields = vec![field("title", "h1[", SelectorKind::Css)];
        assert!(matches!(
            validate_fields("t", &fields),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_rejects_uncompilable_xpath() {
        let fields = vec![field("title", "//div[", SelectorKind::Xpath)];
        assert!(matches!(
            validate_fields("t", &fields),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_empty_field_list_is_legal() {
        assert!(validate_fields("t", &[]).is_ok());
    }

    #[test]
    fn test_enabled_pagination_requires_selector() {
        let mut config = minimal_config();
        let mut target = Target::ad_hoc("https://example.com/", vec![]);
        target.pagination.enabled = true;
        config.targets.insert("t".to_string(), target);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_max_pages() {
        let mut config = minimal_config();
        let mut target = Target::ad_hoc("https://example.com/", vec![]);
        target.pagination.max_pages = 0;
        config.targets.insert("t".to_string(), target);
        assert!(validate(&config).is_err());
    }
}
