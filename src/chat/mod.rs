//! Chat completion client.
//!
//! Sends a single user prompt to the OpenRouter chat-completions endpoint and
//! turns the first choice into an [`AnswerRecord`]. One request per call, a
//! fixed timeout, no retries and no streaming.

#[cfg(test)]
mod tests;
mod types;

pub use types::AnswerRecord;

use crate::config::ApiConfig;
use crate::error::FreeChatError;
use crate::http::create_client_with_timeout;
use chrono::Local;
use reqwest::Client;
use types::{ApiErrorBody, ChatMessage, ChatRequest, ChatResponse};

/// Client for `POST {base_url}/chat/completions`.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    referer: String,
    title: String,
}

impl ChatClient {
    pub fn new(config: &ApiConfig) -> Result<Self, FreeChatError> {
        Ok(Self {
            client: create_client_with_timeout(config.timeout())?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key().map(str::to_string),
            referer: config.referer.clone(),
            title: config.title.clone(),
        })
    }

    /// Replace the API key, e.g. from a command-line flag.
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Send `prompt` to `model_id` and return the answer.
    ///
    /// Fails with `ApiKeyMissing` or `EmptyPrompt` before touching the network.
    pub async fn complete(
        &self,
        model_id: &str,
        model_name: &str,
        prompt: &str,
    ) -> Result<AnswerRecord, FreeChatError> {
        let api_key = self.api_key.as_deref().ok_or(FreeChatError::ApiKeyMissing)?;
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(FreeChatError::EmptyPrompt);
        }

        let request = ChatRequest {
            model: model_id,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!(model = model_id, prompt_chars = prompt.len(), "sending chat completion");

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", self.referer.as_str())
            .header("X-Title", self.title.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FreeChatError::UpstreamError("request timed out".to_string())
                } else {
                    FreeChatError::UpstreamError(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FreeChatError::UpstreamError(e.to_string()))?;

        if !status.is_success() {
            return Err(FreeChatError::UpstreamStatus {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let answer = extract_answer(&body)?;
        tracing::debug!(model = model_id, answer_chars = answer.len(), "chat completion received");

        Ok(AnswerRecord {
            model_id: model_id.to_string(),
            model_name: model_name.to_string(),
            prompt: Some(prompt.to_string()),
            answer,
            created_at: Local::now(),
        })
    }
}

/// Pull `choices[0].message.content` out of a response body.
fn extract_answer(body: &str) -> Result<String, FreeChatError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| FreeChatError::ParseError(format!("chat response: {}", e)))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| FreeChatError::ParseError("response contained no answer".to_string()))
}

/// Provider error message from an error body, if it has one.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_default()
}
