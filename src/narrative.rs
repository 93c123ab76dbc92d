//! Free-text weather narrative from a chat-completion API
//!
//! The fetched series is serialized into a fixed prompt and the reply is
//! passed through unchanged. Any failure on the way becomes an apology for
//! the user; nothing here returns an error.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::TerraGraphError;
use crate::config::LlmConfig;
use crate::models::WeatherSeries;

/// Instructions sent as the system message with every request
pub const SYSTEM_PROMPT: &str = "\
Analyze the weather data provided with the following parameters:
- Temperature (°C) at 2 meters above ground
- Precipitation (mm) during the last hour
- Wind speed (m/s) at 10 meters

Focus on identifying trends and patterns that could affect weather conditions over the specified period. \
Based on the historical data and current values, predict the likelihood of rainfall and potential weather changes. \
Provide a detailed explanation of the prediction, highlighting the most influential factors and their impact on the result.

The output should include:
1. A concise summary of weather trends.
2. A probability assessment for rainfall.
3. Recommendations for the user based on predicted weather conditions.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Body of a chat-completion request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Backend answering chat-completion requests
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

/// OpenAI-compatible chat-completion client (Groq by default) with
/// timeout and transient-failure retries
pub struct ChatCompletionClient {
    client: ClientWithMiddleware,
    endpoint: String,
    api_key: String,
}

impl ChatCompletionClient {
    pub fn new(config: &LlmConfig) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("TerraGraph/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TerraGraphError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ChatCompletion for ChatCompletionClient {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let body = serde_json::to_vec(request).context("Failed to serialize chat request")?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .context("Chat-completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("chat-completion API returned {status}: {text}"));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat-completion response")?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| anyhow!("No completion in response"))
    }
}

/// Narrative shown in the AI insight section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Narrative {
    pub text: String,
    /// `false` when `text` is an apology instead of a model reply
    pub generated: bool,
}

/// Message shown instead of the narrative when the API call fails
#[must_use]
pub fn apology(reason: &str) -> String {
    format!(
        "An error occurred during the AI analysis: {reason}. Please check your internet connection or API key."
    )
}

pub struct Summarizer<C> {
    backend: C,
    model: String,
    temperature: f32,
}

impl<C: ChatCompletion> Summarizer<C> {
    pub fn new(backend: C, config: &LlmConfig) -> Self {
        Self {
            backend,
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    pub fn backend(&self) -> &C {
        &self.backend
    }

    pub fn build_request(&self, series: &WeatherSeries) -> Result<ChatRequest> {
        let payload = serde_json::to_string(series).context("Failed to serialize weather data")?;

        Ok(ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!("Data input: {payload}"),
                },
            ],
            temperature: self.temperature,
        })
    }

    /// Ask the model for a narrative; never fails.
    #[instrument(skip(self, series))]
    pub async fn summarize(&self, series: &WeatherSeries) -> Narrative {
        let result = match self.build_request(series) {
            Ok(request) => self.backend.complete(&request).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(text) => {
                info!("Received narrative of {} characters", text.len());
                Narrative {
                    text,
                    generated: true,
                }
            }
            Err(e) => {
                warn!("AI analysis failed: {:#}", e);
                Narrative {
                    text: apology(&e.to_string()),
                    generated: false,
                }
            }
        }
    }
}
