//! What each prompt strategy answers when something goes wrong.
//!
//! `smart` and `final` never surface provider or configuration failures: the caller gets
//! HTTP 200 with a canned line. `simple` and `plain` report configuration failures as 5xx,
//! `plain` also reports provider failures. `debug` always answers 200 and puts the failure
//! text in the reply. A missing message is a 400 everywhere it is checked.

use crate::error::{ProviderError, ProviderErrorKind, RelayError};
use crate::message::{ChatReply, ChatRequest};
use crate::prompt::PromptStrategy;
use serde::Serialize;

pub const GREETING: &str = "Hi there. I'm here to help guide you through whatever you're facing. What's on your mind today?";
pub const LISTENING: &str = "I'm here to listen and help. Please continue sharing what's on your mind.";
pub const GUIDE_GREETING: &str = "Hope you are doing fine. Tell me, what brings you to this divine knowledge today? What is stirring in your heart that seeks guidance?";
pub const UNAVAILABLE_NOTE: &str = "(Note: AI service temporarily unavailable, but I'm here to listen.)";

pub const GEMINI_SESSION: &str = "gemini_session";
pub const FALLBACK_SESSION: &str = "fallback_session";
pub const ERROR_SESSION: &str = "error_session";
pub const TEST_SESSION: &str = "test_session";
pub const DEBUG_SESSION: &str = "debug_session";

const API_CONFIG_MESSAGE: &str = "API configuration error. Please check your Gemini API key.";
const QUOTA_MESSAGE: &str = "API quota exceeded. Please try again later.";
const SAFETY_MESSAGE: &str = "Your message was filtered for safety. Please rephrase your question.";
const PERMISSION_MESSAGE: &str = "API permission denied. Please check your API key.";
const GENERIC_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

fn setup_note(var: &str) -> String {
    format!(
        "(Note: Please set your {} environment variable to enable AI responses.)",
        var
    )
}

/// User-facing summary of a failure, by substring on its text. First match wins.
pub fn classify_error_text(text: &str) -> &'static str {
    if text.contains("API_KEY") {
        API_CONFIG_MESSAGE
    } else if text.contains("quota") {
        QUOTA_MESSAGE
    } else if text.contains("safety") {
        SAFETY_MESSAGE
    } else if text.contains("permission") {
        PERMISSION_MESSAGE
    } else {
        GENERIC_MESSAGE
    }
}

impl ProviderError {
    /// Uses the kind when the client could tell; otherwise falls back to the text.
    pub fn classified_message(&self) -> &'static str {
        match self.kind {
            ProviderErrorKind::Credential => API_CONFIG_MESSAGE,
            ProviderErrorKind::Quota => QUOTA_MESSAGE,
            ProviderErrorKind::Safety => SAFETY_MESSAGE,
            ProviderErrorKind::Permission => PERMISSION_MESSAGE,
            _ => classify_error_text(&self.detail),
        }
    }
}

/// `{error, message?, debug?}` payload for rejected requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
            debug: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Outcome of a chat call: a reply (HTTP 200) or a rejection with a status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Reply(ChatReply),
    Reject { status: u16, body: ErrorBody },
}

impl Resolution {
    fn reply(response: impl Into<String>, session: &str) -> Self {
        Resolution::Reply(ChatReply {
            response: response.into(),
            session_id: Some(session.to_string()),
        })
    }
}

/// What the failure policy knows about the request beyond the error itself.
#[derive(Debug, Clone, Copy)]
pub struct FailureContext {
    /// History length when the body parsed far enough to know it.
    pub history_len: Option<usize>,
    /// Attach raw failure text as `debug` on 5xx payloads.
    pub debug_errors: bool,
}

impl FailureContext {
    fn opening(&self) -> &'static str {
        match self.history_len {
            Some(n) if n > 0 => LISTENING,
            _ => GREETING,
        }
    }
}

fn internal_error(message: &str, detail: String, debug_errors: bool) -> Resolution {
    let mut body = ErrorBody::new("Internal server error").with_message(message);
    if debug_errors {
        body.debug = Some(detail);
    }
    Resolution::Reject { status: 500, body }
}

impl PromptStrategy {
    /// Strict strategies refuse to touch the body when no key is configured.
    pub fn checks_credential_first(&self) -> bool {
        matches!(self, PromptStrategy::Simple | PromptStrategy::Plain)
    }

    pub fn requires_message(&self) -> bool {
        !matches!(self, PromptStrategy::Debug)
    }

    /// Wraps model text with the session id this strategy reports on success.
    pub fn success(&self, text: String, request: &ChatRequest) -> ChatReply {
        let session_id = match self {
            PromptStrategy::Smart | PromptStrategy::Final => Some(GEMINI_SESSION.to_string()),
            PromptStrategy::Simple => Some(TEST_SESSION.to_string()),
            PromptStrategy::Plain => request.session_id.clone(),
            PromptStrategy::Debug => Some(DEBUG_SESSION.to_string()),
        };
        ChatReply {
            response: text,
            session_id,
        }
    }

    /// `plain` has no permission message; it answers the generic one instead.
    fn reported_message(&self, classified: &'static str) -> &'static str {
        match self {
            PromptStrategy::Plain if classified == PERMISSION_MESSAGE => GENERIC_MESSAGE,
            _ => classified,
        }
    }

    pub fn resolve_failure(&self, err: &RelayError, ctx: &FailureContext) -> Resolution {
        use PromptStrategy::*;

        match (self, err) {
            (_, RelayError::MissingMessage) => Resolution::Reject {
                status: 400,
                body: ErrorBody::new("Message is required"),
            },

            (Smart, RelayError::MissingCredential { var }) => Resolution::reply(
                format!("{} {}", ctx.opening(), setup_note(var)),
                FALLBACK_SESSION,
            ),
            (Final, RelayError::MissingCredential { var }) => Resolution::reply(
                format!("{} {}", GUIDE_GREETING, setup_note(var)),
                FALLBACK_SESSION,
            ),
            (Simple | Plain, RelayError::MissingCredential { .. }) => Resolution::Reject {
                status: 500,
                body: ErrorBody::new("API key not configured").with_message(err.to_string()),
            },
            (Debug, RelayError::MissingCredential { var }) => Resolution::reply(
                format!(
                    "ERROR: No API key found. Please set {} environment variable.",
                    var
                ),
                DEBUG_SESSION,
            ),

            (Smart, RelayError::Provider(_)) => Resolution::reply(
                format!("{} {}", ctx.opening(), UNAVAILABLE_NOTE),
                FALLBACK_SESSION,
            ),
            (Final, RelayError::Provider(_)) => Resolution::reply(
                format!("{} {}", GUIDE_GREETING, UNAVAILABLE_NOTE),
                FALLBACK_SESSION,
            ),
            (Simple, RelayError::Provider(_)) => Resolution::reply(
                format!("{} {}", GUIDE_GREETING, UNAVAILABLE_NOTE),
                TEST_SESSION,
            ),
            (Plain, RelayError::Provider(e)) => internal_error(
                self.reported_message(e.classified_message()),
                e.to_string(),
                ctx.debug_errors,
            ),
            (Debug, RelayError::Provider(e)) => {
                Resolution::reply(format!("GEMINI ERROR: {}", e), DEBUG_SESSION)
            }

            (Smart, _) => Resolution::reply(ctx.opening(), ERROR_SESSION),
            (Final, _) => Resolution::reply(GUIDE_GREETING, ERROR_SESSION),
            (Simple | Plain, _) => {
                let detail = err.to_string();
                internal_error(
                    self.reported_message(classify_error_text(&detail)),
                    detail,
                    ctx.debug_errors,
                )
            }
            (Debug, _) => Resolution::reply(format!("MAIN ERROR: {}", err), DEBUG_SESSION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(history_len: Option<usize>) -> FailureContext {
        FailureContext {
            history_len,
            debug_errors: false,
        }
    }

    fn missing_key() -> RelayError {
        RelayError::MissingCredential {
            var: "GEMINI_API_KEY".into(),
        }
    }

    fn reply_of(r: Resolution) -> ChatReply {
        match r {
            Resolution::Reply(reply) => reply,
            other => panic!("expected reply, got {:?}", other),
        }
    }

    #[test]
    fn smart_missing_key_greets_on_first_message() {
        let reply = reply_of(PromptStrategy::Smart.resolve_failure(&missing_key(), &ctx(Some(0))));
        assert!(reply.response.starts_with(GREETING));
        assert!(reply.response.contains("GEMINI_API_KEY"));
        assert_eq!(reply.session_id.as_deref(), Some(FALLBACK_SESSION));
    }

    #[test]
    fn smart_provider_failure_keeps_listening_mid_conversation() {
        let err = RelayError::Provider(ProviderError::new(ProviderErrorKind::Network, "timeout"));
        let reply = reply_of(PromptStrategy::Smart.resolve_failure(&err, &ctx(Some(4))));
        assert_eq!(reply.response, format!("{} {}", LISTENING, UNAVAILABLE_NOTE));
        assert_eq!(reply.session_id.as_deref(), Some(FALLBACK_SESSION));
    }

    #[test]
    fn smart_unparseable_body_uses_error_session() {
        let err = RelayError::InvalidRequestBody("expected value".into());
        let reply = reply_of(PromptStrategy::Smart.resolve_failure(&err, &ctx(None)));
        assert_eq!(reply.response, GREETING);
        assert_eq!(reply.session_id.as_deref(), Some(ERROR_SESSION));
    }

    #[test]
    fn strict_strategies_reject_missing_key() {
        for s in [PromptStrategy::Simple, PromptStrategy::Plain] {
            match s.resolve_failure(&missing_key(), &ctx(None)) {
                Resolution::Reject { status, body } => {
                    assert_eq!(status, 500);
                    assert_eq!(body.error, "API key not configured");
                    assert_eq!(
                        body.message.as_deref(),
                        Some("GEMINI_API_KEY environment variable is missing")
                    );
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn plain_reports_classified_provider_failure() {
        let err = RelayError::Provider(ProviderError::new(
            ProviderErrorKind::Quota,
            "429 RESOURCE_EXHAUSTED",
        ));
        let mut c = ctx(Some(0));
        c.debug_errors = true;
        match PromptStrategy::Plain.resolve_failure(&err, &c) {
            Resolution::Reject { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.message.as_deref(), Some(QUOTA_MESSAGE));
                assert_eq!(body.debug.as_deref(), Some("429 RESOURCE_EXHAUSTED"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    fn rejected_message(r: Resolution) -> Option<String> {
        match r {
            Resolution::Reject { body, .. } => body.message,
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn plain_has_no_permission_message() {
        let err = RelayError::Provider(ProviderError::new(
            ProviderErrorKind::Permission,
            "[403 PERMISSION_DENIED] Method doesn't allow unregistered callers.",
        ));
        assert_eq!(
            rejected_message(PromptStrategy::Plain.resolve_failure(&err, &ctx(Some(0)))).as_deref(),
            Some(GENERIC_MESSAGE)
        );

        let err = RelayError::Unknown("permission lookup failed".into());
        assert_eq!(
            rejected_message(PromptStrategy::Plain.resolve_failure(&err, &ctx(None))).as_deref(),
            Some(GENERIC_MESSAGE)
        );
        assert_eq!(
            rejected_message(PromptStrategy::Simple.resolve_failure(&err, &ctx(None))).as_deref(),
            Some(PERMISSION_MESSAGE)
        );
    }

    #[test]
    fn simple_swallows_provider_failure() {
        let err = RelayError::Provider(ProviderError::new(ProviderErrorKind::Status, "503"));
        let reply = reply_of(PromptStrategy::Simple.resolve_failure(&err, &ctx(Some(0))));
        assert!(reply.response.starts_with(GUIDE_GREETING));
        assert_eq!(reply.session_id.as_deref(), Some(TEST_SESSION));
    }

    #[test]
    fn debug_inlines_failure_text() {
        let err = RelayError::Provider(ProviderError::new(ProviderErrorKind::Network, "boom"));
        let reply = reply_of(PromptStrategy::Debug.resolve_failure(&err, &ctx(Some(0))));
        assert_eq!(reply.response, "GEMINI ERROR: boom");
        assert_eq!(reply.session_id.as_deref(), Some(DEBUG_SESSION));
    }

    #[test]
    fn missing_message_is_400_everywhere() {
        for s in PromptStrategy::ALL {
            match s.resolve_failure(&RelayError::MissingMessage, &ctx(None)) {
                Resolution::Reject { status, body } => {
                    assert_eq!(status, 400);
                    assert_eq!(body.error, "Message is required");
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn unknown_failure_per_strategy() {
        let err = RelayError::Unknown("handler state lost".into());
        let reply = reply_of(PromptStrategy::Debug.resolve_failure(&err, &ctx(None)));
        assert_eq!(reply.response, "MAIN ERROR: Unknown error: handler state lost");
        let reply = reply_of(PromptStrategy::Final.resolve_failure(&err, &ctx(None)));
        assert_eq!(reply.response, GUIDE_GREETING);
        assert_eq!(reply.session_id.as_deref(), Some(ERROR_SESSION));
        assert!(matches!(
            PromptStrategy::Simple.resolve_failure(&err, &ctx(None)),
            Resolution::Reject { status: 500, .. }
        ));
    }

    #[test]
    fn error_text_classification_order() {
        assert_eq!(classify_error_text("reason: API_KEY_INVALID"), API_CONFIG_MESSAGE);
        assert_eq!(classify_error_text("quota exceeded for safety"), QUOTA_MESSAGE);
        assert_eq!(classify_error_text("blocked for safety"), SAFETY_MESSAGE);
        assert_eq!(classify_error_text("permission denied"), PERMISSION_MESSAGE);
        assert_eq!(classify_error_text("socket closed"), GENERIC_MESSAGE);
    }

    #[test]
    fn plain_echoes_session_id() {
        let req = ChatRequest {
            session_id: Some("abc".into()),
            ..Default::default()
        };
        assert_eq!(
            PromptStrategy::Plain.success("hi".into(), &req).session_id.as_deref(),
            Some("abc")
        );
        assert_eq!(
            PromptStrategy::Smart.success("hi".into(), &req).session_id.as_deref(),
            Some(GEMINI_SESSION)
        );
    }
}
