use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info};

const USER_AGENT: &str = concat!("irun_calendar/", env!("CARGO_PKG_VERSION"));

/// Anything that can hand back the markup of a page.
pub trait PageSource {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Plain HTTP GET, one attempt per page.
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl PageSource for PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        info!("Fetching {}", url);
        let start = Instant::now();

        let markup = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to fetch {}", url))?
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?;

        debug!(
            url,
            bytes = markup.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "fetched page"
        );
        Ok(markup)
    }
}
