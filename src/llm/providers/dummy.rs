//! Offline assistant, selected with `provider = "dummy"`.
//!
//! Echoes the rendered library prompt back as the answer, so the whole
//! assistant path (context rows, prompt, smart-answer reply) runs locally
//! without an API key or network access.

use crate::llm::ProviderError;

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        Ok(format!("[echo] {prompt}"))
    }
}
