//! Language-model capability: completion over an ordered turn history.
//!
//! Two call shapes exist. Routing calls decode deterministically with a
//! short output ceiling so the tool envelope stays parseable; synthesis
//! calls sample with a longer ceiling so the summary reads naturally.
//! [`OpenAiCompatClient`] speaks the `/v1/chat/completions` dialect served
//! by vLLM, llama.cpp and Ollama alike.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::Turn;

const ROUTING_TEMPERATURE: f32 = 0.0;
const ROUTING_MAX_TOKENS: u32 = 200;
const SYNTHESIS_TEMPERATURE: f32 = 0.5;
const SYNTHESIS_MAX_TOKENS: u32 = 1200;

/// Errors from the completion capability. All of them are fatal to the turn.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Transport(String),

    #[error("completion endpoint returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("completion response was malformed: {0}")]
    Malformed(String),
}

/// Decoding parameters for one completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub sample: bool,
}

impl CompletionOptions {
    /// Deterministic decoding with a short ceiling, for tool routing.
    pub fn routing() -> Self {
        Self {
            temperature: ROUTING_TEMPERATURE,
            max_tokens: ROUTING_MAX_TOKENS,
            sample: false,
        }
    }

    /// Sampled decoding with a longer ceiling, for answer synthesis.
    pub fn synthesis() -> Self {
        Self {
            temperature: SYNTHESIS_TEMPERATURE,
            max_tokens: SYNTHESIS_MAX_TOKENS,
            sample: true,
        }
    }
}

/// Completes an ordered turn history into assistant text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(
        &self,
        turns: &[Turn],
        options: &CompletionOptions,
    ) -> Result<String, CompletionError>;
}

/// Client for an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompatClient {
    /// Creates a client for the given endpoint and model id.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
        }
    }

    /// Adds a bearer token to every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Returns the configured model id.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, turns: &[Turn], options: &CompletionOptions) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: turns
                .iter()
                .map(|turn| ChatMessage {
                    role: turn.role.as_str().to_string(),
                    content: turn.content.clone(),
                })
                .collect(),
            // Without sampling the decode must be deterministic regardless
            // of the requested temperature.
            temperature: if options.sample { options.temperature } else { 0.0 },
            max_tokens: options.max_tokens,
            stream: false,
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatClient {
    async fn complete(
        &self,
        turns: &[Turn],
        options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        let request = self.build_request(turns, options);

        let mut builder = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| CompletionError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(map_http_error(status, body));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| CompletionError::Malformed(err.to_string()))?;

        extract_completion_text(parsed)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_completion_text(response: ChatCompletionResponse) -> Result<String, CompletionError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| {
            CompletionError::Malformed("response carried no completion text".to_string())
        })
}

fn map_http_error(status: u16, body: String) -> CompletionError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);
    CompletionError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_options_decode_deterministically() {
        let options = CompletionOptions::routing();
        assert_eq!(options.temperature, 0.0);
        assert_eq!(options.max_tokens, 200);
        assert!(!options.sample);
    }

    #[test]
    fn synthesis_options_sample_with_longer_ceiling() {
        let options = CompletionOptions::synthesis();
        assert_eq!(options.temperature, 0.5);
        assert_eq!(options.max_tokens, 1200);
        assert!(options.sample);
    }

    #[test]
    fn request_serialization_matches_wire_shape() {
        let client = OpenAiCompatClient::new("http://localhost:8000", "llama-3.1-8b");
        let turns = [Turn::system("be terse"), Turn::user("hello")];
        let request = client.build_request(&turns, &CompletionOptions::synthesis());

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"model\":\"llama-3.1-8b\""));
        assert!(json.contains("\"role\":\"system\""));
        assert!(json.contains("\"content\":\"hello\""));
        assert!(json.contains("\"temperature\":0.5"));
        assert!(json.contains("\"max_tokens\":1200"));
        assert!(json.contains("\"stream\":false"));
    }

    #[test]
    fn unsampled_request_forces_temperature_to_zero() {
        let client = OpenAiCompatClient::new("http://localhost:8000", "m");
        let options = CompletionOptions {
            temperature: 0.9,
            max_tokens: 50,
            sample: false,
        };
        let request = client.build_request(&[Turn::user("hi")], &options);
        assert_eq!(request.temperature, 0.0);
    }

    #[test]
    fn response_parsing_trims_completion_text() {
        let json = r#"{"choices": [{"message": {"content": "  {\"function\": \"none\"}\n"}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            extract_completion_text(response).unwrap(),
            "{\"function\": \"none\"}"
        );
    }

    #[test]
    fn empty_choices_are_malformed() {
        let response: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            extract_completion_text(response),
            Err(CompletionError::Malformed(_))
        ));
    }

    #[test]
    fn api_error_body_is_unwrapped() {
        let body = r#"{"error": {"message": "model not found"}}"#;
        match map_http_error(404, body.to_string()) {
            CompletionError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "model not found");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn non_json_error_body_is_passed_through() {
        match map_http_error(502, "bad gateway".to_string()) {
            CompletionError::Api { message, .. } => assert_eq!(message, "bad gateway"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
