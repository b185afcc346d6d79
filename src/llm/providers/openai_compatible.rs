//! OpenAI-compatible chat completion provider (`/v1/chat/completions`).
//!
//! All OpenAI wire types are private to this module; callers only see
//! `complete(&str) -> String`. The provider is stateless: one request, one
//! reply.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use super::check_status;
use crate::llm::ProviderError;

/// Adapter for any HTTP endpoint implementing `/v1/chat/completions`.
///
/// Covers OpenAI, OpenAI-compatible local servers (Ollama, LM Studio…),
/// and hosted alternatives. Constructed once at startup, then cheaply cloned
/// because `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    api_base_url: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// `api_key` is `None` for keyless local models. When present it is sent
    /// as `Authorization: Bearer <key>` on every request.
    pub fn new(
        api_base_url: String,
        model: String,
        temperature: f32,
        timeout_seconds: u64,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_base_url, model, temperature, api_key })
    }

    pub async fn complete(&self, content: &str) -> Result<String, ProviderError> {
        // Some models (gpt-5 family) do not accept a temperature parameter.
        let temperature = if self.model.starts_with("gpt-5") {
            None
        } else {
            Some(self.temperature)
        };

        let payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![Message { role: "user".to_string(), content: content.to_string() }],
            temperature,
        };

        debug!(
            model = %payload.model,
            temperature = ?payload.temperature,
            content_len = content.len(),
            "sending LLM request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full LLM request payload");
        }

        let mut req = self.client.post(&self.api_base_url).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            error!(url = %self.api_base_url, error = %e, "LLM HTTP request failed (transport)");
            ProviderError::Request(e.to_string())
        })?;

        let response = check_status(response).await?;

        let parsed = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize LLM response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        debug!(choices = parsed.choices.len(), "received LLM response");

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProviderError::Request("empty or missing content in response".into()))
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_missing_temperature() {
        let payload = ChatCompletionRequest {
            model: "gpt-5-mini".into(),
            messages: vec![Message { role: "user".into(), content: "hi".into() }],
            temperature: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("temperature").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn response_content_parses() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":" answer "}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some(" answer "));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_request_error() {
        let p = OpenAiCompatibleProvider::new(
            "http://127.0.0.1:1/v1/chat/completions".into(),
            "m".into(),
            0.0,
            1,
            None,
        )
        .unwrap();
        assert!(matches!(p.complete("q").await, Err(ProviderError::Request(_))));
    }
}
