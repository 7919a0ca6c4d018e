//! Per-reply handling: parse, dispatch, respond.

use crate::config::SolConfig;
use crate::directive::{BlinkDefaults, parse_reply_with};
use crate::dispatch::{DirectivePublisher, Dispatcher};
use crate::host::contract::{PARSE_ERROR_ID, PromptOutcome, ReplyEnvelope, ResponseEnvelope};

/// Turns reply envelopes into response envelopes.
///
/// Each envelope is parsed once and published at most once. The handler
/// keeps no state between envelopes.
pub struct ReplyHandler<P> {
    dispatcher: Dispatcher<P>,
    blink: BlinkDefaults,
}

impl<P: DirectivePublisher> ReplyHandler<P> {
    #[must_use]
    pub fn new(dispatcher: Dispatcher<P>, blink: BlinkDefaults) -> Self {
        Self { dispatcher, blink }
    }

    #[must_use]
    pub fn from_config(config: &SolConfig, publisher: P) -> Self {
        Self::new(Dispatcher::from_config(&config.device, publisher), config.blink)
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher<P> {
        &self.dispatcher
    }

    /// Handle one decoded envelope.
    pub fn handle(&self, envelope: &ReplyEnvelope) -> ResponseEnvelope {
        if let Err(e) = envelope.validate() {
            tracing::warn!(request_id = %envelope.request_id, error = %e, "invalid reply envelope");
            return ResponseEnvelope::error(envelope.request_id.clone(), e.to_string());
        }

        let directive = parse_reply_with(&envelope.reply, &self.blink);
        let dispatched = self.dispatcher.dispatch(&directive);
        if let Err(e) = &dispatched {
            tracing::error!(request_id = %envelope.request_id, error = %e, "dispatch failed");
        }

        let outcome = PromptOutcome::from_dispatch(&directive, dispatched);
        tracing::info!(
            request_id = %envelope.request_id,
            kind = %outcome.kind,
            success = outcome.success,
            "handled model reply"
        );

        ResponseEnvelope::from_outcome(envelope.request_id.clone(), &outcome).unwrap_or_else(|e| {
            ResponseEnvelope::error(
                envelope.request_id.clone(),
                format!("failed to encode outcome: {e}"),
            )
        })
    }

    /// Decode one JSON line and handle it.
    pub fn handle_line(&self, line: &str) -> ResponseEnvelope {
        self.handle_bytes(line.as_bytes())
    }

    /// Decode one raw input line and handle it. Bytes that are not UTF-8
    /// JSON get a `parse-error` response like any other undecodable line.
    pub fn handle_bytes(&self, line: &[u8]) -> ResponseEnvelope {
        match serde_json::from_slice::<ReplyEnvelope>(line) {
            Ok(envelope) => self.handle(&envelope),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    raw_line = %String::from_utf8_lossy(line),
                    "failed to parse reply envelope"
                );
                ResponseEnvelope::error(
                    PARSE_ERROR_ID,
                    format!("failed to parse reply envelope: {e}"),
                )
            }
        }
    }
}
