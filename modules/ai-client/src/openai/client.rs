use anyhow::{bail, Context, Result};
use tracing::debug;

use super::types::{ChatRequest, ChatResponse};

pub(crate) const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Raw `/chat/completions` transport.
pub(crate) struct OpenAiClient<'a> {
    api_key: &'a str,
    http: &'a reqwest::Client,
    base_url: &'a str,
}

impl<'a> OpenAiClient<'a> {
    pub fn new(api_key: &'a str, http: &'a reqwest::Client, base_url: Option<&'a str>) -> Self {
        Self {
            api_key,
            http,
            base_url: base_url.unwrap_or(OPENAI_API_URL).trim_end_matches('/'),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        debug!(model = %request.model, messages = request.messages.len(), "Chat completion request");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(self.api_key)
            .json(request)
            .send()
            .await
            .context("chat completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("OpenAI API error ({status}): {body}");
        }

        response
            .json()
            .await
            .context("malformed chat completion response")
    }
}
