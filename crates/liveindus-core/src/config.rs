//! Relay configuration: defaults, optional TOML file, then `LIVEINDUS_*` environment.
//!
//! | Key | Env | Default |
//! |-----|-----|---------|
//! | host | LIVEINDUS_HOST | 127.0.0.1 |
//! | port | LIVEINDUS_PORT or PORT | 8080 |
//! | static_dir | LIVEINDUS_STATIC_DIR | public |
//! | prompt_strategy | LIVEINDUS_PROMPT_STRATEGY | smart |
//! | llm_mode | LIVEINDUS_LLM_MODE | live |
//! | model | LIVEINDUS_MODEL | gemini-2.5-flash |
//! | api_base | LIVEINDUS_API_BASE | https://generativelanguage.googleapis.com/v1beta |
//! | request_timeout_secs | LIVEINDUS_REQUEST_TIMEOUT_SECS | 60 |
//! | debug_errors | LIVEINDUS_DEBUG_ERRORS | false |
//! | api_key_env | LIVEINDUS_API_KEY_ENV | GEMINI_API_KEY |
//!
//! The provider key itself is never stored in the file; it is read from the variable named by
//! `api_key_env`.

use crate::error::ConfigError;
use crate::prompt::PromptStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;

const ENV_CONFIG_PATH: &str = "LIVEINDUS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/gateway";
const ENV_PREFIX: &str = "LIVEINDUS";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Mode for model invocation: live calls the provider, mock answers locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmMode {
    #[default]
    Live,
    Mock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Directory served for non-API GETs; unknown paths fall back to its `index.html`.
    pub static_dir: String,
    /// Strategy used by `POST /api/chat`.
    pub prompt_strategy: PromptStrategy,
    pub llm_mode: LlmMode,
    pub model: String,
    pub api_base: String,
    pub request_timeout_secs: u64,
    /// Attach raw failure text to 5xx payloads.
    #[serde(default)]
    pub debug_errors: bool,
    pub api_key_env: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: "public".to_string(),
            prompt_strategy: PromptStrategy::Smart,
            llm_mode: LlmMode::Live,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_secs: 60,
            debug_errors: false,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

impl RelayConfig {
    /// Load config from file and environment. Precedence: env > `LIVEINDUS_CONFIG` file
    /// (default `config/gateway.*`, optional) > defaults. `PORT` overrides the port last.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut cfg = Self::load_from(Path::new(&path), true)?;
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.trim().parse().ok()) {
            cfg.port = port;
        }
        Ok(cfg)
    }

    /// Defaults, then `path` (missing file is fine), then environment when `with_env`.
    pub fn load_from(path: &Path, with_env: bool) -> Result<Self, ConfigError> {
        let d = Self::default();
        let builder = config::Config::builder()
            .set_default("host", d.host)?
            .set_default("port", i64::from(d.port))?
            .set_default("static_dir", d.static_dir)?
            .set_default("prompt_strategy", d.prompt_strategy.as_str())?
            .set_default("llm_mode", "live")?
            .set_default("model", d.model)?
            .set_default("api_base", d.api_base)?
            .set_default("request_timeout_secs", d.request_timeout_secs as i64)?
            .set_default("debug_errors", d.debug_errors)?
            .set_default("api_key_env", d.api_key_env)?
            .add_source(config::File::from(path).required(false));

        let builder = if with_env {
            builder.add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
        } else {
            builder
        };

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".into()));
        }
        if self.api_key_env.trim().is_empty() {
            return Err(ConfigError::Invalid("api_key_env must not be empty".into()));
        }
        Ok(())
    }

    /// Provider key from the configured variable. Unset or blank counts as missing.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
