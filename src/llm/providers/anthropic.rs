//! Anthropic Messages API provider (`/v1/messages`).
//!
//! Same shape as the OpenAI-compatible adapter: wire types stay private and
//! each call is a single user turn. Authentication uses the `x-api-key`
//! header plus the pinned `anthropic-version`.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use super::check_status;
use crate::llm::ProviderError;

#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    client: Client,
    api_base_url: String,
    model: String,
    api_version: String,
    max_tokens: u32,
    api_key: String,
}

impl AnthropicProvider {
    pub fn new(
        api_base_url: String,
        model: String,
        api_version: String,
        max_tokens: u32,
        timeout_seconds: u64,
        api_key: String,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_base_url, model, api_version, max_tokens, api_key })
    }

    pub async fn complete(&self, content: &str) -> Result<String, ProviderError> {
        let payload = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message { role: "user", content }],
        };

        debug!(model = %self.model, content_len = content.len(), "sending LLM request");
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full LLM request payload");
        }

        let response = self
            .client
            .post(&self.api_base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(url = %self.api_base_url, error = %e, "LLM HTTP request failed (transport)");
                ProviderError::Request(e.to_string())
            })?;

        let response = check_status(response).await?;

        let parsed = response.json::<MessagesResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize LLM response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        debug!(blocks = parsed.content.len(), stop_reason = ?parsed.stop_reason, "received LLM response");
        first_text(parsed)
    }
}

/// Text of the first `text` content block, trimmed.
fn first_text(parsed: MessagesResponse) -> Result<String, ProviderError> {
    parsed
        .content
        .into_iter()
        .find(|b| b.kind == "text")
        .and_then(|b| b.text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProviderError::Request("empty or missing content in response".into()))
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_shape() {
        let payload = MessagesRequest {
            model: "m",
            max_tokens: 1024,
            messages: vec![Message { role: "user", content: "سؤال" }],
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["messages"][0]["content"], "سؤال");
    }

    #[test]
    fn first_text_block_is_used() {
        let body = r#"{
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "  الجواب  "}
            ],
            "stop_reason": "end_turn"
        }"#;
        let parsed: MessagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(first_text(parsed).unwrap(), "الجواب");
    }

    #[test]
    fn empty_content_is_error() {
        let parsed: MessagesResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert!(first_text(parsed).is_err());
    }
}
