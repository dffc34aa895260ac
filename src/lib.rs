pub mod config;
pub mod embedded;
pub mod error;
pub mod failure_scraper;
pub mod fetch;
pub mod job_history;
pub mod job_tracker;
pub mod logs;
pub mod table;
pub mod types;

use anyhow::Context;
use config::Settings;
use failure_scraper::FailureScraper;
use fetch::HttpFetcher;
use tracing::{info, warn};

pub use error::ScrapeError;
pub use types::*;

/// Blocking HTTP client honouring the timeout and certificate settings
pub fn build_http_client(settings: &Settings) -> anyhow::Result<reqwest::blocking::Client> {
    let mut builder = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(settings.main.timeout_secs));

    if settings.main.accept_invalid_certs {
        warn!("TLS certificate validation is disabled for {}", settings.main.webui_url);
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder.build().context("Failed to build HTTP client")
}

/// Scraper for the cluster described by `settings`
pub fn build_scraper(settings: &Settings) -> anyhow::Result<FailureScraper<HttpFetcher>> {
    let endpoint = settings.endpoint()?;
    let generation = settings.generation();
    info!("Using {:?} web UI at {}", generation, endpoint.base_url());

    let client = build_http_client(settings)?;
    let fetcher = HttpFetcher::new(client, settings.credentials());
    Ok(FailureScraper::new(generation, endpoint, fetcher))
}
