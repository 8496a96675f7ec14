//! Scrape orchestration drivers
//!
//! One per-URL state machine (robots check, rate limit, fetch, extract)
//! backs both execution modes: `run_target` drives it sequentially along a
//! pagination chain, `run_urls` fans it out over independent URLs under a
//! concurrency cap. Neither duplicates the other's per-page logic.

use crate::config::{Config, FieldSpec, ScraperConfig, Target};
use crate::limiter::RateLimiter;
use crate::robots::RobotsGuard;
use crate::scrape::extractor::{extract, PageMeta, Record};
use crate::scrape::fetcher::{build_http_client, fetch_url, FetchResult, RetryPolicy};
use crate::scrape::paginator::{next_page, NextAction};
use crate::scrape::FailureKind;
use crate::url::{origin_of, validate_absolute};
use crate::DragnetError;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use ::url::Url;

/// Shared state for one invocation: the HTTP client plus the two
/// process-wide caches (robots decisions, rate-limit slots)
#[derive(Clone)]
pub struct ScrapeContext {
    pub client: Client,
    pub robots: Arc<RobotsGuard>,
    pub limiter: Arc<RateLimiter>,
    pub user_agent: String,
    /// Run-level wall-clock deadline; None means unbounded
    pub deadline: Option<Instant>,
}

impl ScrapeContext {
    pub fn new(config: &Config) -> Result<Self, DragnetError> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.scraper.timeout_seconds),
        )?;

        let deadline = config
            .scraper
            .run_timeout_seconds
            .map(|secs| Instant::now() + Duration::from_secs(secs));

        Ok(Self {
            client,
            robots: Arc::new(RobotsGuard::new()),
            limiter: Arc::new(RateLimiter::new()),
            user_agent: config.user_agent.header_value(),
            deadline,
        })
    }

    fn deadline_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Result of scraping one target or one submitted URL
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    /// Target name or URL this report belongs to
    pub source: String,
    pub records: Vec<Record>,
    pub pages_fetched: u32,
    /// The failure that ended the run early, if any
    pub failure: Option<(FailureKind, String)>,
}

impl ScrapeReport {
    fn failed(source: String, kind: FailureKind, detail: String) -> Self {
        Self {
            source,
            records: Vec::new(),
            pages_fetched: 0,
            failure: Some((kind, detail)),
        }
    }

    /// Collapses the report into the three disjoint CLI outcomes
    pub fn outcome(&self) -> ScrapeOutcome {
        match &self.failure {
            None => ScrapeOutcome::Success,
            Some((kind, _)) if self.records.is_empty() => ScrapeOutcome::Failed(*kind),
            Some((kind, _)) => ScrapeOutcome::Partial(*kind),
        }
    }
}

/// The three disjoint outcomes surfaced to the CLI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeOutcome {
    /// All pages scraped without a terminal failure
    Success,
    /// Some records were collected before a failure ended the run
    Partial(FailureKind),
    /// The run failed before producing any records
    Failed(FailureKind),
}

/// Records and body of one successfully scraped page
struct PageScrape {
    records: Vec<Record>,
    html: String,
}

/// The per-URL state machine: robots check, rate-limit wait, fetch, extract.
///
/// Both drivers route every page through here, so failure classification
/// and politeness behave identically in sequential and concurrent mode.
async fn scrape_page(
    ctx: &ScrapeContext,
    url: &Url,
    fields: &[FieldSpec],
    policy: &RetryPolicy,
    min_gap: Duration,
    page_number: u32,
) -> Result<PageScrape, (FailureKind, String)> {
    if !ctx.robots.is_allowed(&ctx.client, url, &ctx.user_agent).await {
        return Err((
            FailureKind::RobotsDisallowed,
            format!("robots.txt disallows {}", url),
        ));
    }

    ctx.limiter.await_slot(&origin_of(url), min_gap).await;

    let body = match fetch_url(&ctx.client, url, policy).await {
        FetchResult::Success { body, .. } => body,
        FetchResult::Failure { kind, detail } => return Err((kind, detail)),
    };

    let meta = PageMeta {
        url: url.to_string(),
        page_number,
        scraped_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    };

    let records = extract(&body, fields, &meta);
    Ok(PageScrape {
        records,
        html: body,
    })
}

/// Scrapes one configured target, following its pagination chain.
///
/// Partial results are preserved: a failure on page N returns the records
/// of pages 1..N alongside the failure kind. The chain is bounded by the
/// pagination rule's `max_pages` and by the run deadline.
pub async fn run_target(
    ctx: &ScrapeContext,
    name: &str,
    target: &Target,
    defaults: &ScraperConfig,
) -> ScrapeReport {
    let base = match validate_absolute(&target.base_url) {
        Ok(url) => url,
        Err(e) => {
            return ScrapeReport::failed(name.to_string(), FailureKind::ConfigError, e.to_string())
        }
    };

    let policy = RetryPolicy::new(
        target.effective_max_retries(defaults),
        target.effective_timeout(defaults),
    );
    let min_gap = target.effective_rate_limit(defaults);

    let mut visited: HashSet<String> = HashSet::new();
    let mut records = Vec::new();
    let mut pages_fetched: u32 = 0;
    let mut failure = None;
    let mut current = base;

    loop {
        if ctx.deadline_expired() {
            failure = Some((
                FailureKind::Timeout,
                "run timeout expired before next page".to_string(),
            ));
            break;
        }

        visited.insert(current.as_str().to_string());

        match scrape_page(ctx, &current, &target.fields, &policy, min_gap, pages_fetched + 1).await
        {
            Ok(page) => {
                pages_fetched += 1;
                tracing::info!(
                    name,
                    page = pages_fetched,
                    url = %current,
                    records = page.records.len(),
                    "page scraped"
                );
                records.extend(page.records);

                match next_page(&page.html, &target.pagination, pages_fetched, &current, &visited)
                {
                    NextAction::Continue(next) => current = next,
                    NextAction::Stop => break,
                }
            }
            Err((kind, detail)) => {
                failure = Some((kind, detail));
                break;
            }
        }
    }

    match &failure {
        None => tracing::info!(
            name,
            pages = pages_fetched,
            records = records.len(),
            "target done"
        ),
        Some((kind, detail)) => tracing::warn!(
            name,
            pages = pages_fetched,
            records = records.len(),
            %kind,
            detail = detail.as_str(),
            "target ended with failure"
        ),
    }

    ScrapeReport {
        source: name.to_string(),
        records,
        pages_fetched,
        failure,
    }
}

/// Scrapes many independent URLs concurrently.
///
/// Each URL runs the one-page state machine in its own task under a
/// global concurrency cap; one URL's failure never cancels its siblings.
/// Reports come back ordered by submission index. After the run deadline
/// expires, tasks that have not started yet report a timeout instead of
/// fetching, while in-flight work completes naturally.
pub async fn run_urls(
    ctx: &ScrapeContext,
    urls: &[Url],
    fields: &[FieldSpec],
    defaults: &ScraperConfig,
    concurrency: usize,
) -> Vec<ScrapeReport> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let fields: Arc<Vec<FieldSpec>> = Arc::new(fields.to_vec());
    let policy = RetryPolicy::new(
        defaults.max_retries,
        Duration::from_secs(defaults.timeout_seconds),
    );
    let min_gap = Duration::from_secs_f64(defaults.rate_limit_seconds);

    let mut tasks: JoinSet<(usize, ScrapeReport)> = JoinSet::new();

    for (index, url) in urls.iter().cloned().enumerate() {
        let ctx = ctx.clone();
        let fields = Arc::clone(&fields);
        let semaphore = Arc::clone(&semaphore);
        let policy = policy.clone();

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();

            let report = if ctx.deadline_expired() {
                ScrapeReport::failed(
                    url.to_string(),
                    FailureKind::Timeout,
                    "run timeout expired before fetch".to_string(),
                )
            } else {
                match scrape_page(&ctx, &url, &fields, &policy, min_gap, 1).await {
                    Ok(page) => ScrapeReport {
                        source: url.to_string(),
                        records: page.records,
                        pages_fetched: 1,
                        failure: None,
                    },
                    Err((kind, detail)) => {
                        ScrapeReport::failed(url.to_string(), kind, detail)
                    }
                }
            };

            (index, report)
        });
    }

    let mut results: Vec<Option<ScrapeReport>> = urls.iter().map(|_| None).collect();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, report)) => results[index] = Some(report),
            Err(e) => tracing::error!(error = %e, "scrape task aborted"),
        }
    }

    results
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| {
                ScrapeReport::failed(
                    urls[index].to_string(),
                    FailureKind::NetworkError,
                    "scrape task aborted".to_string(),
                )
            })
        })
        .collect()
}
