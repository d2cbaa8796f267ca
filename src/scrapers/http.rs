//! HTTP fetching and the listing-host guard.

use crate::error::{ScoutError, ScoutResult};
use crate::scrapers::traits::PageFetcher;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, warn};

const LISTING_HOST: &str = "suumo.jp";

/// `reqwest`-backed fetcher with a fixed identification header
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Client for the parking site and lookup services
    pub fn new(user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Client for listing pages, which serve reduced markup to non-browser agents
    pub fn for_listings(user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ja,en;q=0.9"));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .context("Failed to create listing HTTP client")?;

        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> ScoutResult<String> {
        debug!("Fetching URL: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            warn!("{} returned status: {}", url, response.status());
            return Err(ScoutError::Transport(format!(
                "failed to fetch {url}: {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        debug!("Downloaded {} bytes of HTML", body.len());
        Ok(body)
    }
}

/// Only listing pages from the supported site are accepted
pub fn is_listing_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    parsed
        .host_str()
        .is_some_and(|host| host == LISTING_HOST || host.ends_with(&format!(".{LISTING_HOST}")))
}
