use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use browserless_client::{BrowserlessClient, ContentRequest};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

// --- PageFetcher trait ---

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Return the page body as text.
    async fn fetch(&self, url: &str) -> Result<String>;
    fn name(&self) -> &str;
}

/// Run `op` up to `attempts` times, sleeping `delay` between failures.
pub async fn with_retry<T, F, Fut>(label: &str, attempts: u32, delay: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!(label, attempt, error = %e, "Attempt failed, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return Err(e.context(format!("{label} failed after {attempts} attempts")));
            }
        }
    }
}

// --- Browserless (JS-rendered pages) ---

pub struct BrowserlessFetcher {
    client: BrowserlessClient,
    wait_for_selector: Option<(String, u64)>,
}

impl BrowserlessFetcher {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        info!(base_url, "Using BrowserlessFetcher");
        Ok(Self {
            client: BrowserlessClient::new(base_url, token)?,
            wait_for_selector: None,
        })
    }

    /// Hold each render until `selector` appears.
    pub fn wait_for(mut self, selector: impl Into<String>, timeout_ms: u64) -> Self {
        self.wait_for_selector = Some((selector.into(), timeout_ms));
        self
    }

    fn request(&self, url: &str) -> ContentRequest {
        let req = ContentRequest::new(url)
            .reject_resource_types(["image", "font", "media"])
            .header("Accept-Language", "en-US,en;q=0.9");
        match &self.wait_for_selector {
            Some((selector, timeout)) => req.wait_for_selector(selector.clone(), *timeout),
            None => req,
        }
    }
}

#[async_trait]
impl PageFetcher for BrowserlessFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let html = self.client.content_with(&self.request(url)).await?;
        Ok(html)
    }

    fn name(&self) -> &str {
        "browserless"
    }
}

// --- Plain HTTP with browser-like headers ---

pub struct HttpFetcher {
    client: reqwest::Client,
}

pub fn browser_headers(referer: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let pairs = [
        ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
        ("accept-language", "en-US,en;q=0.9"),
        ("upgrade-insecure-requests", "1"),
    ];
    for (name, value) in pairs {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    if let Ok(value) = HeaderValue::from_str(referer) {
        headers.insert(reqwest::header::REFERER, value);
    }
    headers
}

impl HttpFetcher {
    pub fn new(referer: &str) -> Result<Self> {
        Self::with_headers(browser_headers(referer))
    }

    pub fn with_headers(headers: HeaderMap) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {status} for {url}");
        }
        Ok(resp.text().await?)
    }

    fn name(&self) -> &str {
        "http"
    }
}
