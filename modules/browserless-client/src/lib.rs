pub mod error;

pub use error::{BrowserlessError, Result};

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Options for a `/content` render. Field names follow the Browserless JSON API.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for_selector: Option<WaitForSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reject_resource_types: Vec<String>,
    #[serde(
        rename = "setExtraHTTPHeaders",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub extra_headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaitForSelector {
    pub selector: String,
    pub timeout: u64,
}

impl ContentRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Block until `selector` appears (or `timeout_ms` elapses).
    pub fn wait_for_selector(mut self, selector: impl Into<String>, timeout_ms: u64) -> Self {
        self.wait_for_selector = Some(WaitForSelector {
            selector: selector.into(),
            timeout: timeout_ms,
        });
        self
    }

    pub fn wait_for_timeout_ms(mut self, ms: u64) -> Self {
        self.wait_for_timeout = Some(ms);
        self
    }

    /// Skip loading resources such as `image`, `font`, `media`.
    pub fn reject_resource_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reject_resource_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }
}

pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        })
    }

    fn endpoint(&self) -> String {
        match self.token {
            Some(ref token) => format!("{}/content?token={token}", self.base_url),
            None => format!("{}/content", self.base_url),
        }
    }

    /// Fetch fully-rendered HTML content for a URL via Browserless /content endpoint.
    pub async fn content(&self, url: &str) -> Result<String> {
        self.content_with(&ContentRequest::new(url)).await
    }

    pub async fn content_with(&self, request: &ContentRequest) -> Result<String> {
        if request.url.is_empty() {
            return Err(BrowserlessError::InvalidRequest("empty url".into()));
        }

        debug!(url = %request.url, "Browserless render");

        let resp = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}
