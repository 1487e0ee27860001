//! Generation provider abstraction.
//!
//! The pipeline treats text generation as an opaque function: prompt in,
//! text out, `ProviderError` on failure. The concrete provider is the Google
//! Gemini API; `MockGenerator` backs tests and offline development.

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// The default Google Gemini API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// An opaque text generator used by the Plan, Analyze, Critique, and
/// Strategize stages.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate text for a prompt.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    /// The provider/model name, for logging.
    fn name(&self) -> &str;
}

/// Google Gemini API generator.
///
/// Auth is via the `?key=` query parameter, with the key read from the
/// environment variable named in the config. Only the non-streaming
/// `generateContent` path is used.
pub struct GeminiGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl GeminiGenerator {
    /// Create a generator from configuration.
    ///
    /// Returns `ProviderError::AuthFailed` if the API key environment
    /// variable is not set.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key =
            std::env::var(&config.api_key_env).map_err(|_| ProviderError::AuthFailed {
                provider: format!("Gemini (env var '{}' not set)", config.api_key_env),
            })?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| ProviderError::Connection {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Pull the first candidate's text out of a Gemini response body.
    fn parse_response(body: &Value) -> Result<String, ProviderError> {
        let candidates = body["candidates"]
            .as_array()
            .ok_or_else(|| ProviderError::ResponseParse {
                message: "Missing 'candidates' array in response".to_string(),
            })?;

        let first = candidates.first().ok_or_else(|| ProviderError::ResponseParse {
            message: "Empty 'candidates' array in response".to_string(),
        })?;

        let parts = first["content"]["parts"]
            .as_array()
            .ok_or_else(|| ProviderError::ResponseParse {
                message: "Missing 'parts' array in candidate content".to_string(),
            })?;

        let text: String = parts
            .iter()
            .filter_map(|p| p["text"].as_str())
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(ProviderError::ResponseParse {
                message: "No text parts in candidate content".to_string(),
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": prompt}],
            }],
        });

        debug!(model = %self.model, prompt_chars = prompt.len(), "Generation request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        timeout_secs: self.timeout_secs,
                    }
                } else {
                    ProviderError::Connection {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiRequest {
                message: format!("HTTP {status}: {text}"),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::ResponseParse {
                message: e.to_string(),
            })?;

        Self::parse_response(&body)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// One scripted reply for the mock generator.
enum MockReply {
    Text(String),
    Failure(ProviderError),
}

/// A mock generator for testing and offline development.
///
/// Returns queued replies in order; an empty queue falls back to a fixed
/// placeholder string.
#[derive(Default)]
pub struct MockGenerator {
    replies: std::sync::Mutex<Vec<MockReply>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator that always returns the given text.
    ///
    /// Queues many copies so it can serve every stage of a run.
    pub fn with_response(text: &str) -> Self {
        let generator = Self::new();
        for _ in 0..20 {
            generator.queue_text(text);
        }
        generator
    }

    /// Queue a text reply for the next `generate` call.
    pub fn queue_text(&self, text: impl Into<String>) {
        self.replies
            .lock()
            .unwrap()
            .push(MockReply::Text(text.into()));
    }

    /// Queue a failure for the next `generate` call.
    pub fn queue_failure(&self, error: ProviderError) {
        self.replies.lock().unwrap().push(MockReply::Failure(error));
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            Ok("Mock generator: no queued replies.".to_string())
        } else {
            match replies.remove(0) {
                MockReply::Text(text) => Ok(text),
                MockReply::Failure(error) => Err(error),
            }
        }
    }

    fn name(&self) -> &str {
        "mock-model"
    }
}

/// Strip Markdown code fences from generated structured output.
///
/// Models routinely wrap JSON answers in ```json fences; parsers downstream
/// want the bare payload. Text without fences passes through trimmed.
pub fn extract_json_block(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip an optional language tag on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").map(str::trim).unwrap_or(trimmed)
}
