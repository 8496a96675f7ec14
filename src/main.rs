//! Dragnet main entry point
//!
//! Command-line interface for the Dragnet web scraper.

use clap::Parser;
use dragnet::config::{load_config, validate_fields, Config, FieldSpec, SelectorKind, Target};
use dragnet::output::{make_sink, RunSummary};
use dragnet::scrape::{run_target, run_urls, ScrapeContext, ScrapeReport};
use dragnet::ConfigError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Dragnet: a declarative web scraper
///
/// Scrapes configured targets (with pagination) or ad-hoc URLs, extracting
/// fields via CSS or XPath selectors while respecting robots.txt and
/// per-origin rate limits.
#[derive(Parser, Debug)]
#[command(name = "dragnet")]
#[command(version)]
#[command(about = "A declarative web scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Named target from the configuration to scrape
    #[arg(long, conflicts_with_all = ["url", "urls_file"])]
    target: Option<String>,

    /// Ad-hoc URL for a one-page scrape (requires --selectors)
    #[arg(long, requires = "selectors", conflicts_with = "urls_file")]
    url: Option<String>,

    /// File containing URLs to scrape, one per line (requires --selectors)
    #[arg(long, value_name = "PATH", requires = "selectors")]
    urls_file: Option<PathBuf>,

    /// JSON object of field selectors; prefix a value with "xpath:" to use
    /// XPath instead of CSS, e.g. '{"title": "h1", "link": "xpath://a/@href"}'
    #[arg(long)]
    selectors: Option<String>,

    /// Scrape the URL list concurrently instead of sequentially
    #[arg(long, requires = "urls_file")]
    concurrent: bool,

    /// Output file stem (defaults to the target name, or "scrape")
    #[arg(short, long)]
    output: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("dragnet=info,warn"),
            1 => EnvFilter::new("dragnet=debug,info"),
            2 => EnvFilter::new("dragnet=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Dispatches the selected mode and writes output
async fn run(cli: &Cli, config: &Config) -> Result<ExitCode, ConfigError> {
    let started_at = chrono::Local::now();
    let ctx = ScrapeContext::new(config)
        .map_err(|e| ConfigError::Validation(format!("failed to build HTTP client: {}", e)))?;

    let (reports, stem) = if let Some(name) = &cli.target {
        let target = config.targets.get(name).ok_or_else(|| {
            ConfigError::Validation(format!("target '{}' not found in configuration", name))
        })?;

        let report = run_target(&ctx, name, target, &config.scraper).await;
        (vec![report], name.clone())
    } else if let Some(url) = &cli.url {
        let fields = parse_selectors(cli.selectors.as_deref().unwrap_or("{}"))?;
        dragnet::validate_absolute(url)
            .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;

        let target = Target::ad_hoc(url, fields);
        let report = run_target(&ctx, url, &target, &config.scraper).await;
        (vec![report], "scrape".to_string())
    } else if let Some(path) = &cli.urls_file {
        let fields = parse_selectors(cli.selectors.as_deref().unwrap_or("{}"))?;
        let urls = load_url_list(path)?;

        let concurrency = if cli.concurrent {
            config.scraper.max_concurrent
        } else {
            1
        };

        let reports = run_urls(&ctx, &urls, &fields, &config.scraper, concurrency).await;
        (reports, "scrape".to_string())
    } else {
        return Err(ConfigError::Validation(
            "nothing to scrape: pass --target, --url, or --urls-file".to_string(),
        ));
    };

    let stem = cli.output.clone().unwrap_or(stem);
    let summary = RunSummary::from_reports(&stem, started_at, &reports);

    let all_records: Vec<_> = reports
        .iter()
        .flat_map(|r| r.records.iter().cloned())
        .collect();

    if all_records.is_empty() {
        println!("No records scraped");
    } else {
        let sink = make_sink(&config.output, &stem);
        match sink.write(&all_records, &summary) {
            Ok(path) => println!("Saved {} records to {}", all_records.len(), path.display()),
            Err(e) => {
                tracing::error!("Failed to write output: {}", e);
                eprintln!("error: failed to write output: {}", e);
            }
        }
    }

    print_summary(&summary);
    Ok(exit_code(&reports))
}

/// Parses the --selectors JSON object into field specs.
///
/// Keys become field names in their given order; values are CSS selectors
/// unless prefixed with "xpath:".
fn parse_selectors(json: &str) -> Result<Vec<FieldSpec>, ConfigError> {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| ConfigError::Validation(format!("invalid selectors JSON: {}", e)))?;

    let mut fields = Vec::with_capacity(object.len());
    for (name, value) in object {
        let selector = value.as_str().ok_or_else(|| {
            ConfigError::Validation(format!("selector for field '{}' must be a string", name))
        })?;

        let (kind, expr) = match selector.strip_prefix("xpath:") {
            Some(expr) => (SelectorKind::Xpath, expr),
            None => (SelectorKind::Css, selector),
        };

        fields.push(FieldSpec {
            name,
            selector: expr.to_string(),
            kind,
            repeating: false,
        });
    }

    validate_fields("cli", &fields)?;
    Ok(fields)
}

/// Reads a URL list file, one absolute URL per line; blank lines are skipped
fn load_url_list(path: &std::path::Path) -> Result<Vec<Url>, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let mut urls = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let url = dragnet::validate_absolute(line)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", line, e)))?;
        urls.push(url);
    }

    if urls.is_empty() {
        return Err(ConfigError::Validation(format!(
            "no URLs found in {}",
            path.display()
        )));
    }

    Ok(urls)
}

/// Prints the run summary: counts of records, pages, and failures by kind
fn print_summary(summary: &RunSummary) {
    println!(
        "{}: {} records, {} pages",
        summary.source, summary.record_count, summary.page_count
    );

    for (kind, count) in &summary.failures {
        println!("warning: {} failure(s) of kind {}", count, kind);
    }
}

/// Non-zero exit only for a total failure: no records plus a fatal kind.
/// Partial success still exits zero, with warnings in the summary.
fn exit_code(reports: &[ScrapeReport]) -> ExitCode {
    let total_records: usize = reports.iter().map(|r| r.records.len()).sum();
    let any_failure = reports.iter().any(|r| r.failure.is_some());

    if total_records == 0 && any_failure {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
