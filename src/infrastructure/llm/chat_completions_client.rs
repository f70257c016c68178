use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::application::ports::{ChatMessage, LlmClient, LlmClientError};
use crate::presentation::config::LlmSettings;

use super::mock_llm_client::MockLlmClient;

/// OpenAI-style `/chat/completions` transport. Also serves Azure OpenAI and
/// local OpenAI-compatible servers.
pub struct ChatCompletionsClient {
    client: Client,
    provider: String,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: usize,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl ChatCompletionsClient {
    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.provider == "azure" {
            request.header("api-key", &self.api_key)
        } else if self.api_key.is_empty() {
            request
        } else {
            request.header("Authorization", format!("Bearer {}", self.api_key))
        }
    }
}

fn classify_status(status: StatusCode, body: String) -> LlmClientError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        if body.contains("insufficient_quota") {
            LlmClientError::QuotaExceeded(body)
        } else {
            LlmClientError::RateLimited(body)
        }
    } else if status.is_server_error() {
        LlmClientError::Unavailable(format!("HTTP {status}: {body}"))
    } else {
        LlmClientError::ApiRequestFailed(format!("HTTP {status}: {body}"))
    }
}

fn classify_transport(e: reqwest::Error) -> LlmClientError {
    if e.is_timeout() || e.is_connect() {
        LlmClientError::Unavailable(e.to_string())
    } else {
        LlmClientError::ApiRequestFailed(e.to_string())
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    #[tracing::instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmClientError> {
        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let request = self
            .client
            .post(&self.endpoint)
            .json(&request_body);
        let response = self
            .apply_auth(request)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let completion_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmClientError::InvalidResponse(e.to_string()))?;

        completion_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmClientError::InvalidResponse("empty choices".to_string()))
    }
}

/// Full `/chat/completions` URL for the configured provider. `None` for the
/// mock provider.
pub fn chat_completions_url(settings: &LlmSettings) -> Result<Option<String>, LlmClientError> {
    let url = match settings.provider.as_str() {
        "mock" => return Ok(None),
        "openai" => format!(
            "{}/chat/completions",
            settings
                .base_url
                .as_deref()
                .unwrap_or("https://api.openai.com/v1")
                .trim_end_matches('/')
        ),
        "lmstudio" | "openai-compatible" => {
            let base_url = settings.base_url.as_deref().ok_or_else(|| {
                LlmClientError::Configuration(format!(
                    "base_url required for {} provider",
                    settings.provider
                ))
            })?;
            format!("{}/chat/completions", base_url.trim_end_matches('/'))
        }
        "azure" => {
            let endpoint = settings.azure_endpoint.as_deref().ok_or_else(|| {
                LlmClientError::Configuration(
                    "azure_endpoint required for azure provider".to_string(),
                )
            })?;
            format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                endpoint.trim_end_matches('/'),
                settings.model,
                settings.api_version
            )
        }
        other => {
            return Err(LlmClientError::Configuration(format!(
                "unknown provider: {other}"
            )));
        }
    };
    Ok(Some(url))
}

pub fn create_llm_client(settings: &LlmSettings) -> Result<Arc<dyn LlmClient>, LlmClientError> {
    let Some(endpoint) = chat_completions_url(settings)? else {
        return Ok(Arc::new(MockLlmClient));
    };

    if settings.provider != "lmstudio" && settings.api_key.trim().is_empty() {
        return Err(LlmClientError::Configuration(format!(
            "api_key required for {} provider",
            settings.provider
        )));
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(settings.request_timeout_secs))
        .build()
        .map_err(|e| LlmClientError::Configuration(e.to_string()))?;

    Ok(Arc::new(ChatCompletionsClient {
        client,
        provider: settings.provider.clone(),
        endpoint,
        api_key: settings.api_key.clone(),
        model: settings.model.clone(),
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
    }))
}
