//! Robots.txt handling
//!
//! `RobotsGuard` answers allow/deny per URL, caching parsed rules per
//! origin for the lifetime of the process. Concurrent first-time queries
//! for one origin perform a single robots.txt fetch; later callers wait
//! for that result instead of duplicating the request.

mod rules;

pub use rules::RobotsRules;

use crate::scrape::{fetch_url, FetchResult, RetryPolicy};
use crate::url::origin_of;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use ::url::Url;

/// Timeout for robots.txt fetches; shorter than page fetches and never retried
const ROBOTS_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Process-wide robots.txt decision cache
#[derive(Debug, Default)]
pub struct RobotsGuard {
    origins: Mutex<HashMap<String, Arc<OnceCell<RobotsRules>>>>,
}

impl RobotsGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether `url` may be fetched for `user_agent`.
    ///
    /// The first query per origin fetches and caches that origin's
    /// robots.txt; an unreachable or unreadable file degrades to allow.
    pub async fn is_allowed(&self, client: &Client, url: &Url, user_agent: &str) -> bool {
        let origin = origin_of(url);

        let cell = {
            let mut origins = self.origins.lock().await;
            origins.entry(origin.clone()).or_default().clone()
        };

        let rules = cell
            .get_or_init(|| fetch_rules(client, origin.clone()))
            .await;

        let allowed = rules.is_allowed(url.as_str(), user_agent);
        tracing::debug!(url = %url, allowed, "robots decision");
        allowed
    }
}

/// Fetches and parses robots.txt for one origin, failing open.
async fn fetch_rules(client: &Client, origin: String) -> RobotsRules {
    let robots_url = match Url::parse(&format!("{}/robots.txt", origin)) {
        Ok(u) => u,
        Err(e) => {
            tracing::warn!(origin = %origin, error = %e, "could not build robots.txt URL, allowing");
            return RobotsRules::allow_all();
        }
    };

    let policy = RetryPolicy::no_retry(ROBOTS_FETCH_TIMEOUT);
    match fetch_url(client, &robots_url, &policy).await {
        FetchResult::Success { body, status } => {
            tracing::debug!(origin = %origin, status, "fetched robots.txt");
            RobotsRules::from_content(body)
        }
        FetchResult::Failure { kind, detail } => {
            tracing::warn!(
                origin = %origin,
                %kind,
                detail = detail.as_str(),
                "robots.txt unavailable, defaulting to allow"
            );
            RobotsRules::allow_all()
        }
    }
}
