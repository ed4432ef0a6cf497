//! Relay to the hosted completion API.
//!
//! One request per call, non-streaming, fixed sampling parameters, no retry.
//! The `ChatRelay` trait is the seam the controller and detector talk
//! through; `LlmClient` is the production implementation over an
//! OpenAI-compatible endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::files::{format_manifest, FileAttachment};

// Fixed sampling parameters; not user-tunable.
pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 1500;

const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Failure taxonomy for one relay call. Every variant is terminal for its
/// round trip; user-facing wording is the controller's responsibility.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream API error ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("no completion text in upstream response")]
    EmptyCompletion,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
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

/// Stateless forwarder of chat payloads to the completion API.
#[async_trait]
pub trait ChatRelay: Send + Sync {
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, RelayError>;
}

#[async_trait]
impl<T: ChatRelay + ?Sized> ChatRelay for Arc<T> {
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, RelayError> {
        (**self).chat_completion(messages, temperature, max_tokens).await
    }
}

pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl ChatRelay for LlmClient {
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, RelayError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature,
            max_tokens,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Status { status, body });
        }

        let completion: ChatCompletionResponse = response.json().await?;

        completion
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or(RelayError::EmptyCompletion)
    }
}

/// Build the two-message payload every chat path uses.
pub fn build_chat(system_prompt: &str, user_content: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(user_content),
    ]
}

/// Append the attachment manifest to the user message. Only metadata is
/// forwarded; file bytes never reach the model.
pub fn enhance_with_manifest(message: &str, files: &[FileAttachment]) -> String {
    format!("{}\n\nUploaded files: {}", message, format_manifest(files))
}

/// One plain chat round trip with the fixed sampling parameters.
pub async fn send_chat<R: ChatRelay + ?Sized>(
    relay: &R,
    system_prompt: &str,
    user_content: &str,
) -> Result<String, RelayError> {
    relay
        .chat_completion(build_chat(system_prompt, user_content), TEMPERATURE, MAX_TOKENS)
        .await
}

/// File-aware chat round trip: the manifest is embedded into the prompt.
pub async fn send_chat_with_files<R: ChatRelay + ?Sized>(
    relay: &R,
    system_prompt: &str,
    user_content: &str,
    files: &[FileAttachment],
) -> Result<String, RelayError> {
    let enhanced = enhance_with_manifest(user_content, files);
    relay
        .chat_completion(build_chat(system_prompt, &enhanced), TEMPERATURE, MAX_TOKENS)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_chat() {
        let messages = build_chat("You are helpful.", "Hello");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "You are helpful.");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "Hello");
    }

    #[test]
    fn test_enhance_with_manifest() {
        let files = vec![FileAttachment::new("reads.fastq", 2_097_152, "text/plain")];

        assert_eq!(
            enhance_with_manifest("Analyze my reads", &files),
            "Analyze my reads\n\nUploaded files: reads.fastq (2.00 MB)"
        );
    }

    #[test]
    fn test_request_serializes_non_streaming() {
        let request = ChatCompletionRequest {
            model: "test-model".to_string(),
            messages: build_chat("sys", "usr"),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            stream: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], serde_json::json!(false));
        assert_eq!(json["max_tokens"], serde_json::json!(1500));
    }
}
