//! Pagination decisions
//!
//! Given a fetched page and the target's pagination rule, decide whether
//! the chain continues and where. Cycle and duplicate guards make
//! termination independent of site behavior: even a next-link that never
//! stops matching cannot visit more than `max_pages` distinct pages.

use crate::config::PaginationRule;
use crate::scrape::extractor::{first_href, Selector};
use crate::url::resolve;
use std::collections::HashSet;
use ::url::Url;

/// Outcome of a pagination decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    /// Fetch this URL next
    Continue(Url),
    /// The chain ends here
    Stop,
}

/// Decides the next step of a pagination chain.
///
/// Stops when pagination is disabled, the page budget is spent, the
/// next-link selector matches nothing, or the resolved URL would revisit
/// the current page or any page already seen in this run.
pub fn next_page(
    html: &str,
    rule: &PaginationRule,
    pages_visited: u32,
    current_url: &Url,
    visited: &HashSet<String>,
) -> NextAction {
    if !rule.enabled {
        return NextAction::Stop;
    }

    if pages_visited >= rule.max_pages {
        tracing::debug!(
            url = %current_url,
            max_pages = rule.max_pages,
            "pagination stopped: page budget spent"
        );
        return NextAction::Stop;
    }

    let selector = Selector::new(rule.next_kind, &rule.next_selector);
    let href = match first_href(html, &selector) {
        Ok(Some(href)) => href,
        Ok(None) => {
            tracing::debug!(url = %current_url, "pagination stopped: no next link");
            return NextAction::Stop;
        }
        Err(detail) => {
            tracing::warn!(
                url = %current_url,
                detail = detail.as_str(),
                "pagination stopped: selector error"
            );
            return NextAction::Stop;
        }
    };

    let next_url = match resolve(current_url, &href) {
        Some(u) => u,
        None => {
            tracing::debug!(
                url = %current_url,
                href = href.as_str(),
                "pagination stopped: unresolvable next link"
            );
            return NextAction::Stop;
        }
    };

    if next_url == *current_url {
        tracing::debug!(url = %current_url, "pagination stopped: next link points to current page");
        return NextAction::Stop;
    }

    if visited.contains(next_url.as_str()) {
        tracing::debug!(next = %next_url, "pagination stopped: URL already visited");
        return NextAction::Stop;
    }

    tracing::debug!(next = %next_url, "pagination continues");
    NextAction::Continue(next_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorKind;

    fn rule(next_selector: &str, max_pages: u32) -> PaginationRule {
        PaginationRule {
            enabled: true,
            next_selector: next_selector.to_string(),
            next_kind: SelectorKind::Css,
            max_pages,
        }
    }

    fn current() -> Url {
        Url::parse("https://example.com/list/page1").unwrap()
    }

    const PAGE_WITH_NEXT: &str =
        r#"<html><body><a class="next" href="page2">Next</a></body></html>"#;

    #[test]
    fn test_disabled_rule_always_stops() {
        let rule = PaginationRule::default();
        let action = next_page(PAGE_WITH_NEXT, &rule, 0, &current(), &HashSet::new());
        assert_eq!(action, NextAction::Stop);
    }

    #[test]
    fn test_continue_resolves_relative_href() {
        let action = next_page(PAGE_WITH_NEXT, &rule("a.next", 10), 1, &current(), &HashSet::new());
        let expected = Url::parse("https://example.com/list/page2").unwrap();
        assert_eq!(action, NextAction::Continue(expected));
    }

    #[test]
    fn test_stop_at_page_budget() {
        let action = next_page(PAGE_WITH_NEXT, &rule("a.next", 3), 3, &current(), &HashSet::new());
        assert_eq!(action, NextAction::Stop);
    }

    #[test]
    fn test_stop_when_selector_matches_nothing() {
        let html = "<html><body><p>last page</p></body></html>";
        let action = next_page(html, &rule("a.next", 10), 1, &current(), &HashSet::new());
        assert_eq!(action, NextAction::Stop);
    }

    #[test]
    fn test_cycle_guard_stops_self_link() {
        let html = r#"<html><body><a class="next" href="page1">Next</a></body></html>"#;
        let action = next_page(html, &rule("a.next", 10), 1, &current(), &HashSet::new());
        assert_eq!(action, NextAction::Stop);
    }

    #[test]
    fn test_duplicate_guard_stops_visited_url() {
        let mut visited = HashSet::new();
        visited.insert("https://example.com/list/page2".to_string());

        let action = next_page(PAGE_WITH_NEXT, &rule("a.next", 10), 1, &current(), &visited);
        assert_eq!(action, NextAction::Stop);
    }

    #[test]
    fn test_stop_on_unresolvable_href() {
        let html = r#"<html><body><a class="next" href="javascript:next()">Next</a></body></html>"#;
        let action = next_page(html, &rule("a.next", 10), 1, &current(), &HashSet::new());
        assert_eq!(action, NextAction::Stop);
    }

    #[test]
    fn test_xpath_next_selector() {
        let rule = PaginationRule {
            enabled: true,
            next_selector: "//a[@class='next']/@href".to_string(),
            next_kind: SelectorKind::Xpath,
            max_pages: 10,
        };
        let action = next_page(PAGE_WITH_NEXT, &rule, 1, &current(), &HashSet::new());
        let expected = Url::parse("https://example.com/list/page2").unwrap();
        assert_eq!(action, NextAction::Continue(expected));
    }
}
