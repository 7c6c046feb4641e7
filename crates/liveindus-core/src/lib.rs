//! LiveIndus guide relay core library.
//! Conversation phase heuristics, prompt assembly, fallback policy and the language-model capability.

pub mod config;
pub mod error;
pub mod fallback;
pub mod message;
pub mod phase;
pub mod prompt;
pub mod provider;

pub use crate::config::{LlmMode, RelayConfig};
pub use error::{ConfigError, ProviderError, ProviderErrorKind, RelayError};
pub use fallback::{classify_error_text, ErrorBody, FailureContext, Resolution};
pub use message::{ChatReply, ChatRequest, Message, Role};
pub use phase::{classify, ConversationSignals, Phase, PhaseDecision};
pub use prompt::{assemble, AssembledPrompt, PromptStrategy};
pub use provider::{build_model, GeminiClient, LanguageModel, MockModel};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
