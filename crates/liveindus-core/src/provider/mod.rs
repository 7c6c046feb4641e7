//! Language-model capability: `generate(prompt) -> text`, fallible.
//!
//! The handler only sees `dyn LanguageModel`, so the live client can be swapped for the
//! offline mock (or a test double) without touching classification or prompt assembly.

mod gemini;
mod mock;

pub use gemini::GeminiClient;
pub use mock::MockModel;

use crate::config::{LlmMode, RelayConfig};
use crate::error::ProviderError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Single completion for a fully assembled prompt.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    fn model_name(&self) -> &str;
}

/// Model handle for the configured mode. `None` means live mode without a key, which
/// the handler turns into its missing-credential answer.
pub fn build_model(config: &RelayConfig, api_key: Option<String>) -> Option<Arc<dyn LanguageModel>> {
    match config.llm_mode {
        LlmMode::Mock => Some(Arc::new(MockModel::new())),
        LlmMode::Live => {
            let key = api_key?;
            let client = GeminiClient::new(key, Duration::from_secs(config.request_timeout_secs))
                .with_model(&config.model)
                .with_api_base(&config.api_base);
            Some(Arc::new(client))
        }
    }
}
