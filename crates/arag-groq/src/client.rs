//! Groq chat-completion client implementation

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use arag_core::{ChatModel, Error, GenerationConfig, GenerationResult, Result, with_timeout};

use crate::config::GroqConfig;

/// Groq client speaking the OpenAI-compatible chat API
pub struct GroqClient {
    config: GroqConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

impl GroqClient {
    pub const LLAMA_3_3_70B_VERSATILE: &'static str = "llama-3.3-70b-versatile";

    /// Create a new Groq client from configuration
    pub fn new(config: GroqConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub(crate) fn build_request(prompt: &str, config: &GenerationConfig) -> ChatRequest {
        ChatRequest {
            model: config.model_id.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Pull the first choice's text out of a response body
    pub(crate) fn parse_response(body: &str) -> Result<(String, Option<u32>)> {
        let response: ChatResponse = serde_json::from_str(body)
            .map_err(|e| Error::Serialization(format!("Invalid Groq response: {}", e)))?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::LLMProvider(format!(
                "Empty response from Groq API. Raw response: {}",
                body
            )))?;

        Ok((text, response.usage.map(|u| u.total_tokens)))
    }

    /// Perform the actual completion request
    async fn perform_completion(&self, prompt: &str, config: &GenerationConfig) -> Result<GenerationResult> {
        let request_body = Self::build_request(prompt, config);

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(e.to_string())
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Authentication(format!(
                    "Groq rejected the API key ({}): {}",
                    status, error_text
                )),
                _ => Error::LLMProvider(format!(
                    "Groq API request failed with status {}: {}",
                    status, error_text
                )),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let (text, tokens_used) = Self::parse_response(&body)?;
        tracing::debug!(model = %config.model_id, tokens = ?tokens_used, "groq completion finished");

        Ok(GenerationResult {
            text,
            model_id: config.model_id.clone(),
            tokens_used,
        })
    }
}

#[async_trait]
impl ChatModel for GroqClient {
    async fn complete(&self, prompt: &str, config: &GenerationConfig) -> Result<GenerationResult> {
        with_timeout(config.timeout, "Groq completion", self.perform_completion(prompt, config)).await
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}
