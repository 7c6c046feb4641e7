//! Gemini `generateContent` client (REST, reqwest only).

use super::LanguageModel;
use crate::config::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::error::{ProviderError, ProviderErrorKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Google API error envelope: `{"error": {"code", "message", "status", "details"}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

pub struct GeminiClient {
    api_key: String,
    model: String,
    api_base: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GeminiClient {
    /// `timeout` bounds every call, including on the default client used when the
    /// configured one cannot be built.
    pub fn new(api_key: String, timeout: Duration) -> Self {
        let client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "Gemini client builder failed; using default client");
                reqwest::Client::new()
            }
        };
        Self {
            api_key: api_key.trim().to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout,
            client,
        }
    }

    /// Set the model (e.g. `gemini-2.5-flash`, `gemini-pro`).
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.trim().to_string();
        self
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "dispatching to Gemini");

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let res = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::network)?;

        let status = res.status();
        let text = res.text().await.map_err(ProviderError::network)?;

        if !status.is_success() {
            return Err(error_from_status(status.as_u16(), &text));
        }

        extract_text(&text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Maps a non-success response to a provider error, keeping Google's status and reason
/// codes in the detail so text classification still works on them.
fn error_from_status(code: u16, body: &str) -> ProviderError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);
    let (message, status, reasons) = match parsed {
        Some(e) => {
            let reasons: Vec<String> = e.details.into_iter().filter_map(|d| d.reason).collect();
            (e.message, e.status, reasons)
        }
        None => (body.chars().take(300).collect(), String::new(), Vec::new()),
    };

    let lowered = message.to_lowercase();
    let kind = if reasons.iter().any(|r| r.contains("API_KEY")) || lowered.contains("api key") {
        ProviderErrorKind::Credential
    } else if code == 429 || status == "RESOURCE_EXHAUSTED" || lowered.contains("quota") {
        ProviderErrorKind::Quota
    } else if code == 403 || status == "PERMISSION_DENIED" {
        ProviderErrorKind::Permission
    } else {
        ProviderErrorKind::Status
    };

    let mut detail = format!("[{}", code);
    if !status.is_empty() {
        detail.push(' ');
        detail.push_str(&status);
    }
    detail.push_str("] ");
    detail.push_str(&message);
    if !reasons.is_empty() {
        detail.push_str(&format!(" (reason: {})", reasons.join(", ")));
    }
    ProviderError::new(kind, detail)
}

/// Concatenated text of the first candidate. Blocked prompts and empty safety stops are
/// safety failures.
fn extract_text(body: &str) -> Result<String, ProviderError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::new(ProviderErrorKind::Decode, format!("response parse: {}", e))
    })?;

    if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ProviderError::new(
            ProviderErrorKind::Safety,
            format!("prompt blocked for safety: {}", reason),
        ));
    }

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        return Err(ProviderError::new(ProviderErrorKind::Empty, "no candidates in response"));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if !text.is_empty() {
        return Ok(text);
    }
    match candidate.finish_reason.as_deref() {
        Some("SAFETY") => Err(ProviderError::new(
            ProviderErrorKind::Safety,
            "response stopped for safety",
        )),
        Some(reason) => Err(ProviderError::new(
            ProviderErrorKind::Empty,
            format!("empty response (finish reason: {})", reason),
        )),
        None => Err(ProviderError::new(ProviderErrorKind::Empty, "empty response")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_candidate_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Hope you "},{"text":"are well."}],"role":"model"},"finishReason":"STOP"}]}"#;
        assert_eq!(extract_text(body).unwrap(), "Hope you are well.");
    }

    #[test]
    fn blocked_prompt_is_safety() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let err = extract_text(body).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Safety);
        assert!(err.to_string().contains("safety"));
    }

    #[test]
    fn empty_safety_stop_is_safety() {
        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        assert_eq!(extract_text(body).unwrap_err().kind, ProviderErrorKind::Safety);
    }

    #[test]
    fn no_candidates_is_empty() {
        assert_eq!(extract_text("{}").unwrap_err().kind, ProviderErrorKind::Empty);
    }

    #[test]
    fn garbage_is_decode_error() {
        assert_eq!(
            extract_text("<html>").unwrap_err().kind,
            ProviderErrorKind::Decode
        );
    }

    #[test]
    fn invalid_key_is_credential() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"@type":"type.googleapis.com/google.rpc.ErrorInfo","reason":"API_KEY_INVALID"}]}}"#;
        let err = error_from_status(400, body);
        assert_eq!(err.kind, ProviderErrorKind::Credential);
        assert!(err.detail.contains("API_KEY_INVALID"));
        assert!(err.detail.starts_with("[400 INVALID_ARGUMENT]"));
    }

    #[test]
    fn rate_limit_is_quota() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted (e.g. check quota).","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(error_from_status(429, body).kind, ProviderErrorKind::Quota);
    }

    #[test]
    fn forbidden_is_permission() {
        let body = r#"{"error":{"code":403,"message":"Method doesn't allow unregistered callers.","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(error_from_status(403, body).kind, ProviderErrorKind::Permission);
    }

    #[test]
    fn non_json_error_body_is_status() {
        let err = error_from_status(502, "Bad Gateway");
        assert_eq!(err.kind, ProviderErrorKind::Status);
        assert_eq!(err.detail, "[502] Bad Gateway");
    }

    #[tokio::test]
    async fn hung_provider_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let client = GeminiClient::new("k".into(), Duration::from_millis(200))
            .with_api_base(&format!("http://{}/v1beta", addr));
        let started = std::time::Instant::now();
        let err = client.generate("hello").await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Network);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new("k".into(), Duration::from_secs(5))
            .with_model("gemini-pro")
            .with_api_base("http://localhost:9999/v1beta/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-pro:generateContent"
        );
    }
}
