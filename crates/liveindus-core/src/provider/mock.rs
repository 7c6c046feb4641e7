//! Offline model: deterministic reply derived from the prompt, no network.

use super::LanguageModel;
use crate::error::ProviderError;
use async_trait::async_trait;

const PREVIEW_CHARS: usize = 80;

#[derive(Debug, Clone, Default)]
pub struct MockModel;

impl MockModel {
    pub fn new() -> Self {
        Self
    }

    /// Echoes the phase label (when the prompt carries one) and a preview of the user's message.
    fn reply_for(prompt: &str) -> String {
        let phase = crate::phase::Phase::ALL
            .iter()
            .find(|p| prompt.contains(&format!("{}:", p.label())))
            .map(|p| p.label());
        let message = prompt
            .lines()
            .rev()
            .find_map(|l| {
                l.strip_prefix("Current user message: ")
                    .or_else(|| l.strip_prefix("Current message from user: "))
                    .or_else(|| l.strip_prefix("User message: "))
                    .or_else(|| l.strip_prefix("User: "))
            })
            .unwrap_or("");
        let mut preview: String = message.chars().take(PREVIEW_CHARS).collect();
        if message.chars().count() > PREVIEW_CHARS {
            preview.push('…');
        }
        match phase {
            Some(label) => format!("[Generated – Mock LLM | {}] I hear you: \"{}\".", label, preview),
            None => format!("[Generated – Mock LLM] I hear you: \"{}\".", preview),
        }
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        Ok(Self::reply_for(prompt))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
