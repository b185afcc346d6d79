//! LLM provider implementations.
//!
//! `build(config, api_key)` is the factory — called at startup.
//! Adding a new backend = new module + new match arm.

pub mod anthropic;
pub mod dummy;
pub mod openai_compatible;

use serde::Deserialize;
use tracing::{error, info};

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct the configured provider, or `None` when the assistant is off.
///
/// `"none"` disables it explicitly. The hosted Anthropic backend is also
/// disabled when no API key is available; OpenAI-compatible endpoints may be
/// keyless local servers and are built either way.
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<Option<LlmProvider>, ProviderError> {
    match config.provider.as_str() {
        "none" | "" => Ok(None),
        "dummy" => Ok(Some(LlmProvider::Dummy(dummy::DummyProvider))),
        "anthropic" => {
            let Some(key) = api_key else {
                info!("no LLM API key set, answering without the assistant");
                return Ok(None);
            };
            let a = &config.anthropic;
            let p = anthropic::AnthropicProvider::new(
                a.api_base_url.clone(),
                a.model.clone(),
                a.api_version.clone(),
                a.max_tokens,
                a.timeout_seconds,
                key,
            )?;
            Ok(Some(LlmProvider::Anthropic(p)))
        }
        "openai" | "openai-compatible" => {
            let oai = &config.openai;
            let p = openai_compatible::OpenAiCompatibleProvider::new(
                oai.api_base_url.clone(),
                oai.model.clone(),
                oai.temperature,
                oai.timeout_seconds,
                api_key,
            )?;
            Ok(Some(LlmProvider::OpenAiCompatible(p)))
        }
        _ => Err(ProviderError::UnknownProvider(config.provider.clone())),
    }
}

// ── Shared HTTP error handling ───────────────────────────────────────────────

// Error envelope used by both Anthropic and OpenAI-compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Return the response if successful, or a structured error built from the
/// provider's error envelope.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(env) => {
            let code = env
                .error
                .code
                .map(|v| match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .or(env.error.kind)
                .map(|c| format!(" [{c}]"))
                .unwrap_or_default();
            format!("HTTP {status}{code}: {}", env.error.message)
        }
        Err(_) => format!("HTTP {status}: {body}"),
    };

    error!(%status, %message, "LLM request returned HTTP error");
    Err(ProviderError::Request(message))
}
