//! Versioned reply/response envelopes for the directive bridge.

use crate::directive::{Directive, DirectiveKind};
use crate::dispatch::DispatchOutcome;
use serde::{Deserialize, Serialize};

/// Contract version for reply/response envelopes.
pub const CONTRACT_VERSION: u32 = 1;

/// Request id used when an input line cannot be decoded at all.
pub const PARSE_ERROR_ID: &str = "parse-error";

pub const MSG_SENT_TO_DEVICE: &str = "Message sent to device";
pub const MSG_CHAT: &str = "Chat response.";
pub const MSG_DISPATCH_FAILED: &str = "Failed to dispatch to device";
pub const MSG_UNRECOGNIZED: &str = "Unrecognized device command";

/// One model reply to interpret, caller -> bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    pub v: u32,
    pub request_id: String,
    pub reply: String,
}

impl ReplyEnvelope {
    /// Build a v1 reply envelope.
    #[must_use]
    pub fn new(request_id: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            v: CONTRACT_VERSION,
            request_id: request_id.into(),
            reply: reply.into(),
        }
    }

    /// Validate envelope version, request id and reply text.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.v != CONTRACT_VERSION {
            return Err(ContractError::new(
                ContractErrorKind::UnsupportedVersion,
                format!(
                    "unsupported contract version {}; expected {}",
                    self.v, CONTRACT_VERSION
                ),
            ));
        }
        if self.request_id.trim().is_empty() {
            return Err(ContractError::new(
                ContractErrorKind::InvalidEnvelope,
                "request_id cannot be empty".to_owned(),
            ));
        }
        if self.reply.is_empty() {
            return Err(ContractError::new(
                ContractErrorKind::InvalidEnvelope,
                "reply cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Caller-facing result of one reply: `{success, message, response}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptOutcome {
    pub success: bool,
    pub message: String,
    /// Natural-language text of the reply.
    pub response: String,
    pub kind: DirectiveKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchOutcome>,
}

impl PromptOutcome {
    /// Map a directive and its dispatch result to the caller-facing outcome.
    ///
    /// Malformed replies are reported as failures with the reply text echoed;
    /// they are never treated as a device action.
    #[must_use]
    pub fn from_dispatch(
        directive: &Directive,
        dispatched: crate::Result<DispatchOutcome>,
    ) -> Self {
        let response = directive.text().to_owned();
        let kind = directive.kind();
        match (directive, dispatched) {
            (Directive::Malformed { reason, .. }, _) => Self {
                success: false,
                message: format!("{MSG_UNRECOGNIZED}: {reason}"),
                response,
                kind,
                dispatch: None,
            },
            (_, Err(e)) => Self {
                success: false,
                message: format!("{MSG_DISPATCH_FAILED}: {e}"),
                response,
                kind,
                dispatch: None,
            },
            (Directive::Control { .. }, Ok(outcome)) => Self {
                success: true,
                message: MSG_SENT_TO_DEVICE.to_owned(),
                response,
                kind,
                dispatch: Some(outcome),
            },
            (Directive::Chat { .. }, Ok(_)) => Self {
                success: true,
                message: MSG_CHAT.to_owned(),
                response,
                kind,
                dispatch: None,
            },
        }
    }
}

/// A versioned response envelope, bridge -> caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub v: u32,
    pub request_id: String,
    pub ok: bool,
    pub payload: serde_json::Value,
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Build a successful response envelope.
    #[must_use]
    pub fn ok(request_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            v: CONTRACT_VERSION,
            request_id: request_id.into(),
            ok: true,
            payload,
            error: None,
        }
    }

    /// Build an error response envelope.
    #[must_use]
    pub fn error(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            v: CONTRACT_VERSION,
            request_id: request_id.into(),
            ok: false,
            payload: serde_json::Value::Null,
            error: Some(message.into()),
        }
    }

    /// Wrap a prompt outcome; unsuccessful outcomes also carry their message as `error`.
    ///
    /// # Errors
    ///
    /// Returns an error if the outcome cannot be encoded as JSON.
    pub fn from_outcome(
        request_id: impl Into<String>,
        outcome: &PromptOutcome,
    ) -> crate::Result<Self> {
        let payload = serde_json::to_value(outcome)
            .map_err(|e| crate::SolError::Serialize(e.to_string()))?;
        Ok(Self {
            v: CONTRACT_VERSION,
            request_id: request_id.into(),
            ok: outcome.success,
            payload,
            error: (!outcome.success).then(|| outcome.message.clone()),
        })
    }
}

/// Contract validation error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractErrorKind {
    UnsupportedVersion,
    InvalidEnvelope,
}

/// Contract validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractError {
    pub kind: ContractErrorKind,
    pub message: String,
}

impl ContractError {
    #[must_use]
    pub fn new(kind: ContractErrorKind, message: String) -> Self {
        Self { kind, message }
    }
}

impl std::fmt::Display for ContractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ContractError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::parse_reply;
    use crate::error::SolError;

    #[test]
    fn validate_rejects_wrong_version() {
        let mut envelope = ReplyEnvelope::new("req-1", "hello");
        envelope.v = 2;
        let err = envelope.validate().expect_err("version 2 is unsupported");
        assert_eq!(err.kind, ContractErrorKind::UnsupportedVersion);
    }

    #[test]
    fn validate_rejects_blank_fields() {
        let err = ReplyEnvelope::new(" ", "hello")
            .validate()
            .expect_err("blank request id");
        assert_eq!(err.kind, ContractErrorKind::InvalidEnvelope);

        let err = ReplyEnvelope::new("req-1", "")
            .validate()
            .expect_err("empty reply");
        assert_eq!(err.kind, ContractErrorKind::InvalidEnvelope);

        assert!(ReplyEnvelope::new("req-1", " \n ").validate().is_ok());
    }

    #[test]
    fn chat_outcome_succeeds_without_dispatch() {
        let directive = parse_reply("Hi there!");
        let outcome = PromptOutcome::from_dispatch(
            &directive,
            Ok(DispatchOutcome::Skipped {
                kind: DirectiveKind::Chat,
            }),
        );
        assert!(outcome.success);
        assert_eq!(outcome.message, MSG_CHAT);
        assert_eq!(outcome.response, "Hi there!");
        assert!(outcome.dispatch.is_none());
    }

    #[test]
    fn malformed_outcome_reports_failure_and_echoes_text() {
        let directive = parse_reply("Sure ```action:control,device:thermostat,state:ON```");
        let outcome = PromptOutcome::from_dispatch(
            &directive,
            Ok(DispatchOutcome::Skipped {
                kind: DirectiveKind::Malformed,
            }),
        );
        assert!(!outcome.success);
        assert!(outcome.message.starts_with(MSG_UNRECOGNIZED));
        assert_eq!(outcome.response, "Sure");
    }

    #[test]
    fn dispatch_failure_is_reported() {
        let directive = parse_reply("```action:control,device:led,state:ON```");
        let outcome = PromptOutcome::from_dispatch(
            &directive,
            Err(SolError::Dispatch("broker down".to_owned())),
        );
        assert!(!outcome.success);
        assert!(outcome.message.contains("broker down"));
    }

    #[test]
    fn from_outcome_copies_failure_message() {
        let outcome = PromptOutcome {
            success: false,
            message: "nope".to_owned(),
            response: "text".to_owned(),
            kind: DirectiveKind::Malformed,
            dispatch: None,
        };
        let envelope = ResponseEnvelope::from_outcome("req-9", &outcome).expect("encode outcome");
        assert!(!envelope.ok);
        assert_eq!(envelope.error.as_deref(), Some("nope"));
        assert_eq!(envelope.payload["response"], "text");
        assert_eq!(envelope.v, CONTRACT_VERSION);
    }

    #[test]
    fn response_envelope_roundtrip_json() {
        let resp = ResponseEnvelope::ok("req-1", serde_json::json!({"success": true}));
        let json = serde_json::to_string(&resp).expect("serialize in test");
        let parsed: ResponseEnvelope = serde_json::from_str(&json).expect("deserialize in test");
        assert_eq!(parsed, resp);
    }
}
