//! Parsed robots.txt rules
//!
//! Thin wrapper over the robotstxt crate's matcher with an explicit
//! fail-open constructor for unreachable or unparseable files.

use robotstxt::DefaultMatcher;

/// Allow/deny rules for one origin
#[derive(Debug, Clone)]
pub struct RobotsRules {
    /// Raw robots.txt content; empty means allow everything
    content: String,
}

impl RobotsRules {
    /// Wraps raw robots.txt content
    pub fn from_content(content: String) -> Self {
        Self { content }
    }

    /// Permissive rules used when robots.txt cannot be fetched or read
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
        }
    }

    /// Checks whether a URL is allowed for the given user agent
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let rules = RobotsRules::allow_all();
        assert!(rules.is_allowed("https://example.com/any/path", "TestBot"));
        assert!(rules.is_allowed("https://example.com/admin", "TestBot"));
    }

    #[test]
    fn test_disallow_all() {
        let rules = RobotsRules::from_content("User-agent: *\nDisallow: /".to_string());
        assert!(!rules.is_allowed("https://example.com/", "TestBot"));
        assert!(!rules.is_allowed("https://example.com/page", "TestBot"));
    }

    #[test]
    fn test_disallow_specific_path() {
        let rules = RobotsRules::from_content("User-agent: *\nDisallow: /admin".to_string());
        assert!(rules.is_allowed("https://example.com/", "TestBot"));
        assert!(rules.is_allowed("https://example.com/page", "TestBot"));
        assert!(!rules.is_allowed("https://example.com/admin", "TestBot"));
        assert!(!rules.is_allowed("https://example.com/admin/users", "TestBot"));
    }

    #[test]
    fn test_specific_user_agent() {
        let rules = RobotsRules::from_content(
            "User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /".to_string(),
        );
        assert!(rules.is_allowed("https://example.com/page", "GoodBot"));
        assert!(!rules.is_allowed("https://example.com/page", "BadBot"));
    }

    #[test]
    fn test_garbage_content_fails_open() {
        let rules = RobotsRules::from_content("This is not valid robots.txt {{{".to_string());
        assert!(rules.is_allowed("https://example.com/any", "TestBot"));
    }

    #[test]
    fn test_empty_content_allows_everything() {
        let rules = RobotsRules::from_content(String::new());
        assert!(rules.is_allowed("https://example.com/any", "TestBot"));
    }
}
