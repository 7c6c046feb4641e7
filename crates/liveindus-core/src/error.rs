//! Error types for the guide relay.

use thiserror::Error;

/// What went wrong talking to the language-model provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Key rejected by the provider (invalid, expired, wrong project).
    Credential,
    Network,
    Quota,
    Safety,
    Permission,
    /// Non-success HTTP status not covered above.
    Status,
    /// Response body was not the expected JSON.
    Decode,
    /// Provider answered without any text.
    Empty,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::Credential => "credential",
            ProviderErrorKind::Network => "network",
            ProviderErrorKind::Quota => "quota",
            ProviderErrorKind::Safety => "safety",
            ProviderErrorKind::Permission => "permission",
            ProviderErrorKind::Status => "status",
            ProviderErrorKind::Decode => "decode",
            ProviderErrorKind::Empty => "empty",
        }
    }
}

/// Failure of a single `generate` call.
#[derive(Debug, Clone, Error)]
#[error("{detail}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub detail: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn network(err: reqwest::Error) -> Self {
        Self::new(ProviderErrorKind::Network, format!("request failed: {}", err))
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    /// `var` is the name of the environment variable that should hold the key.
    #[error("{var} environment variable is missing")]
    MissingCredential { var: String },

    #[error("Message is required")]
    MissingMessage,

    #[error("invalid request body: {0}")]
    InvalidRequestBody(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::InvalidRequestBody(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
