//! HTTP fetcher with retry and exponential backoff
//!
//! Every outcome surfaces as a `FetchResult`; nothing here panics or
//! returns a raw transport error to the orchestrator.

use crate::config::UserAgentConfig;
use crate::scrape::FailureKind;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use ::url::Url;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page body
    Success { body: String, status: u16 },

    /// Fetch failed; `kind` distinguishes exhausted retries from
    /// immediately fatal responses
    Failure { kind: FailureKind, detail: String },
}

/// Retry and timeout policy for one fetch
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first; total attempts = max_retries + 1
    pub max_retries: u32,
    /// First backoff delay; doubles each retry
    pub base_delay: Duration,
    /// Backoff cap
    pub max_delay: Duration,
    /// Per-request timeout override; falls back to the client timeout
    pub request_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            request_timeout: None,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, request_timeout: Duration) -> Self {
        Self {
            max_retries,
            request_timeout: Some(request_timeout),
            ..Self::default()
        }
    }

    /// Single-attempt policy, used for robots.txt fetches
    pub fn no_retry(request_timeout: Duration) -> Self {
        Self::new(0, request_timeout)
    }

    /// Backoff delay before retry number `attempt` (0-based), capped
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Builds the shared HTTP client
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Classification of a single failed attempt
enum AttemptError {
    /// Worth retrying: connection errors, timeouts, 429, 5xx
    Transient { kind: FailureKind, detail: String },
    /// Not worth retrying: other 4xx, malformed requests
    Fatal { kind: FailureKind, detail: String },
}

/// Fetches a URL, retrying transient failures with exponential backoff.
///
/// Transient failures (connection errors, timeouts, HTTP 429 and 5xx) are
/// retried up to `policy.max_retries` times with a `base * 2^attempt`
/// delay, capped at `policy.max_delay`. Other 4xx statuses fail
/// immediately without consuming the retry budget.
pub async fn fetch_url(client: &Client, url: &Url, policy: &RetryPolicy) -> FetchResult {
    let mut attempt: u32 = 0;

    loop {
        let started = Instant::now();
        let outcome = attempt_fetch(client, url, policy).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok((body, status)) => {
                tracing::debug!(url = %url, attempt, status, latency_ms, "fetch ok");
                return FetchResult::Success { body, status };
            }
            Err(AttemptError::Fatal { kind, detail }) => {
                tracing::warn!(
                    url = %url,
                    attempt,
                    latency_ms,
                    %kind,
                    detail = detail.as_str(),
                    "fetch failed"
                );
                return FetchResult::Failure { kind, detail };
            }
            Err(AttemptError::Transient { kind, detail }) => {
                tracing::warn!(
                    url = %url,
                    attempt,
                    latency_ms,
                    %kind,
                    detail = detail.as_str(),
                    "fetch attempt failed"
                );

                if attempt >= policy.max_retries {
                    return FetchResult::Failure { kind, detail };
                }

                let delay = policy.backoff_delay(attempt);
                tracing::debug!(url = %url, attempt, delay_ms = delay.as_millis() as u64, "retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// One request/response cycle with error classification
async fn attempt_fetch(
    client: &Client,
    url: &Url,
    policy: &RetryPolicy,
) -> Result<(String, u16), AttemptError> {
    let mut request = client.get(url.clone());
    if let Some(timeout) = policy.request_timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            AttemptError::Transient {
                kind: FailureKind::NetworkError,
                detail: format!("request timeout: {}", e),
            }
        } else if e.is_connect() {
            AttemptError::Transient {
                kind: FailureKind::NetworkError,
                detail: format!("connection error: {}", e),
            }
        } else {
            AttemptError::Fatal {
                kind: FailureKind::NetworkError,
                detail: e.to_string(),
            }
        }
    })?;

    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return Err(AttemptError::Transient {
            kind: FailureKind::HttpStatus,
            detail: format!("HTTP {}", status.as_u16()),
        });
    }

    if status.is_client_error() {
        return Err(AttemptError::Fatal {
            kind: FailureKind::HttpStatus,
            detail: format!("HTTP {}", status.as_u16()),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    // Non-HTML bodies are still returned; selectors just won't match much.
    if !content_type.is_empty() && !content_type.contains("text/html") {
        tracing::warn!(url = %url, content_type = content_type.as_str(), "non-HTML content type");
    }

    let status_code = status.as_u16();
    let body = response.text().await.map_err(|e| AttemptError::Transient {
        kind: FailureKind::NetworkError,
        detail: format!("body read error: {}", e),
    })?;

    Ok((body, status_code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let user_agent = UserAgentConfig::default();
        let client = build_http_client(&user_agent, Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(450),
            request_timeout: None,
        };

        assert_eq!(policy.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(400));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(450));
        assert_eq!(policy.backoff_delay(30), Duration::from_millis(450));
    }

    #[test]
    fn test_no_retry_policy() {
        let policy = RetryPolicy::no_retry(Duration::from_secs(5));
        assert_eq!(policy.max_retries, 0);
        assert_eq!(policy.request_timeout, Some(Duration::from_secs(5)));
    }
}
