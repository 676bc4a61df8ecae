mod client;
pub(crate) mod types;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::traits::{ChatModel, CompletionRequest};

use client::OpenAiClient;

// =============================================================================
// OpenAi
// =============================================================================

#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
    http: reqwest::Client,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            http: reqwest::Client::new(),
        }
    }

    /// Point at any OpenAI-compatible endpoint (Azure proxy, local server, ...).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    fn client(&self) -> OpenAiClient<'_> {
        OpenAiClient::new(&self.api_key, &self.http, self.base_url.as_deref())
    }

    fn build_request(&self, request: &CompletionRequest) -> types::ChatRequest {
        let reasoning = types::is_reasoning_model(&self.model);
        let max_tokens = request.max_tokens.unwrap_or(2048);

        types::ChatRequest {
            model: self.model.clone(),
            messages: request.messages.iter().map(types::WireMessage::from).collect(),
            temperature: if reasoning { None } else { request.temperature },
            max_tokens: (!reasoning).then_some(max_tokens),
            max_completion_tokens: reasoning.then_some(max_tokens),
            response_format: request.json_mode.then_some(types::ResponseFormat {
                format_type: "json_object",
            }),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAi {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let wire = self.build_request(&request);
        let response = self.client().chat(&wire).await?;

        if let Some(usage) = &response.usage {
            debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "OpenAI usage"
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("No response from OpenAI"))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Message;

    #[test]
    fn test_openai_new() {
        let ai = OpenAi::new("sk-test", "gpt-4o");
        assert_eq!(ai.model, "gpt-4o");
        assert_eq!(ai.api_key, "sk-test");
    }

    #[test]
    fn model_name_comes_from_the_trait() {
        let ai: Box<dyn ChatModel> = Box::new(OpenAi::new("sk-test", "gpt-4o-mini"));
        assert_eq!(ai.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn test_openai_with_base_url() {
        let ai = OpenAi::new("sk-test", "gpt-4o").with_base_url("https://custom.api.com");
        assert_eq!(ai.base_url, Some("https://custom.api.com".to_string()));
    }

    #[test]
    fn json_mode_sets_response_format() {
        let ai = OpenAi::new("sk-test", "gpt-3.5-turbo");
        let req = CompletionRequest::new(vec![Message::user("hi")])
            .temperature(0.7)
            .json_mode();
        let wire = serde_json::to_value(ai.build_request(&req)).unwrap();
        assert_eq!(wire["response_format"]["type"], "json_object");
        assert_eq!(wire["max_tokens"], 2048);
        assert!(wire.get("max_completion_tokens").is_none());
        assert_eq!(wire["messages"][0]["role"], "user");
    }

    #[test]
    fn reasoning_models_drop_temperature() {
        let ai = OpenAi::new("sk-test", "o3-mini");
        let req = CompletionRequest::new(vec![Message::user("hi")]).temperature(0.7);
        let wire = serde_json::to_value(ai.build_request(&req)).unwrap();
        assert!(wire.get("temperature").is_none());
        assert!(wire.get("response_format").is_none());
        assert_eq!(wire["max_completion_tokens"], 2048);
    }
}
