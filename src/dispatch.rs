//! Dispatch of control directives to the LED topic.
//!
//! Only [`Directive::Control`] produces a publish. Chat and malformed
//! replies are skipped, so a rejected command block can never turn into a
//! device action. The transport itself sits behind [`DirectivePublisher`].

use crate::config::DeviceConfig;
use crate::directive::{ControlParameters, DeviceState, Directive, DirectiveKind};
use crate::error::{Result, SolError};
use serde::{Deserialize, Serialize};

/// Topic the LED listens on.
pub const DEFAULT_LED_TOPIC: &str = "device/led";

/// JSON body published for a control directive.
///
/// Serializes as `{"state": "BLINK", "params": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DevicePayload {
    pub state: DeviceState,
    pub params: ControlParameters,
}

impl DevicePayload {
    /// Build the payload for a control directive; `None` for anything else.
    #[must_use]
    pub fn from_directive(directive: &Directive) -> Option<Self> {
        match directive {
            Directive::Control {
                state, parameters, ..
            } => Some(Self {
                state: *state,
                params: *parameters,
            }),
            _ => None,
        }
    }
}

/// Sink for serialized device payloads.
pub trait DirectivePublisher: Send + Sync + 'static {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<()>;
}

/// Publisher that drops every payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl DirectivePublisher for NoopPublisher {
    fn publish(&self, _topic: &str, _payload: &[u8]) -> Result<()> {
        Ok(())
    }
}

/// Publisher that records each payload as a tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

impl DirectivePublisher for LogPublisher {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<()> {
        let body = std::str::from_utf8(payload)
            .map_err(|e| SolError::Dispatch(format!("payload is not UTF-8: {e}")))?;
        tracing::info!(topic, payload = body, "publishing device payload");
        Ok(())
    }
}

/// What the dispatcher did with a directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The payload was handed to the publisher.
    Published {
        topic: String,
        payload: serde_json::Value,
    },
    /// Nothing was published.
    Skipped { kind: DirectiveKind },
}

impl DispatchOutcome {
    #[must_use]
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }
}

/// Publishes control directives on one topic.
pub struct Dispatcher<P> {
    topic: String,
    publisher: P,
}

impl<P: DirectivePublisher> Dispatcher<P> {
    #[must_use]
    pub fn new(topic: impl Into<String>, publisher: P) -> Self {
        Self {
            topic: topic.into(),
            publisher,
        }
    }

    #[must_use]
    pub fn from_config(config: &DeviceConfig, publisher: P) -> Self {
        Self::new(config.topic.clone(), publisher)
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Publish once for a control directive; skip everything else.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be encoded or the publisher fails.
    pub fn dispatch(&self, directive: &Directive) -> Result<DispatchOutcome> {
        let Some(payload) = DevicePayload::from_directive(directive) else {
            tracing::debug!(kind = %directive.kind(), "no device payload for directive");
            return Ok(DispatchOutcome::Skipped {
                kind: directive.kind(),
            });
        };

        // Encode from the struct, not the Value, to keep field order on the wire.
        let bytes =
            serde_json::to_vec(&payload).map_err(|e| SolError::Serialize(e.to_string()))?;
        let value =
            serde_json::to_value(&payload).map_err(|e| SolError::Serialize(e.to_string()))?;
        self.publisher.publish(&self.topic, &bytes)?;

        tracing::debug!(topic = %self.topic, state = %payload.state, "dispatched device payload");
        Ok(DispatchOutcome::Published {
            topic: self.topic.clone(),
            payload: value,
        })
    }
}
