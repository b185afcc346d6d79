//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities — clone them freely.
//! The `complete` method is `async fn` on the enum so callers need no
//! trait-object machinery.

pub mod providers;

use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    Anthropic(providers::anthropic::AnthropicProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Send `content` as a single user turn and return the text reply.
    pub async fn complete(&self, content: &str) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(content).await,
            LlmProvider::Anthropic(p) => p.complete(content).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(content).await,
        }
    }

    /// Short name for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::Anthropic(_) => "anthropic",
            LlmProvider::OpenAiCompatible(_) => "openai",
        }
    }
}
