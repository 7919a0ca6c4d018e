//! Directive data types.
//!
//! A [`Directive`] is built fresh from one model reply and never mutated.
//! Control parameters are typed per device state, so a `Control` directive
//! cannot carry parameters that do not belong to its state.

use serde::{Deserialize, Serialize};

/// The three mutually exclusive reply classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveKind {
    /// The reply carries a valid LED command.
    Control,
    /// The reply is plain conversation with no command block.
    Chat,
    /// The reply carries a command block that could not be accepted.
    Malformed,
}

impl std::fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Control => write!(f, "control"),
            Self::Chat => write!(f, "chat"),
            Self::Malformed => write!(f, "malformed"),
        }
    }
}

/// LED modes understood by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceState {
    On,
    Off,
    Blink,
}

impl DeviceState {
    /// Render the state in wire format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Blink => "BLINK",
        }
    }

    /// Parse a state from wire format. Matching is exact.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ON" => Some(Self::On),
            "OFF" => Some(Self::Off),
            "BLINK" => Some(Self::Blink),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric fields a command block may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    Duration,
    Delay,
    Times,
}

impl NumericField {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Duration => "duration",
            Self::Delay => "delay",
            Self::Times => "times",
        }
    }
}

impl std::fmt::Display for NumericField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blink parameters as read from a command block, before normalization.
///
/// Absent fields are `None`, never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBlinkInput {
    /// Seconds between toggles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    /// Repeat count. Zero or negative counts are treated as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<i64>,
    /// Total blink duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// A fully populated blink parameter triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlinkParams {
    /// Seconds between toggles.
    pub delay: f64,
    /// Repeat count, always at least 1.
    pub times: u32,
    /// Total blink duration in seconds.
    pub duration: f64,
}

/// Parameters attached to a control directive, one shape per state.
///
/// Serializes to the flat parameter map the device expects: `{}` for OFF,
/// `{}` or `{"duration": n}` for ON, and the full triple for BLINK.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ControlParameters {
    On {
        #[serde(skip_serializing_if = "Option::is_none")]
        duration: Option<f64>,
    },
    Off {},
    Blink(BlinkParams),
}

impl ControlParameters {
    /// The device state these parameters belong to.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        match self {
            Self::On { .. } => DeviceState::On,
            Self::Off {} => DeviceState::Off,
            Self::Blink(_) => DeviceState::Blink,
        }
    }
}

/// Why a fenced command block was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum MalformedReason {
    /// The block has no tokens at all.
    #[error("command block is empty")]
    EmptyBlock,

    /// A token has no `:` or `=` between key and value.
    #[error("token `{token}` has no key/value separator")]
    MissingSeparator { token: String },

    /// A key outside the accepted vocabulary.
    #[error("unknown field `{key}`")]
    UnknownField { key: String },

    /// The same key appears more than once.
    #[error("field `{key}` given more than once")]
    DuplicateField { key: String },

    /// action/device/state missing or not a known LED command.
    #[error(
        "unrecognized command (action={}, device={}, state={})",
        display_opt(.action),
        display_opt(.device),
        display_opt(.state)
    )]
    UnrecognizedCommand {
        action: Option<String>,
        device: Option<String>,
        state: Option<String>,
    },

    /// A numeric field whose value is not a usable number.
    #[error("field `{field}` value `{value}` is not a valid number")]
    UnparsableNumericField { field: NumericField, value: String },
}

fn display_opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("<missing>")
}

/// The interpreted outcome of one model reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Directive {
    /// A validated LED command.
    Control {
        state: DeviceState,
        parameters: ControlParameters,
        text: String,
    },
    /// A conversational reply with no device effect.
    Chat { text: String },
    /// A command block was present but rejected.
    Malformed {
        reason: MalformedReason,
        text: String,
    },
}

impl Directive {
    #[must_use]
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Self::Control { .. } => DirectiveKind::Control,
            Self::Chat { .. } => DirectiveKind::Chat,
            Self::Malformed { .. } => DirectiveKind::Malformed,
        }
    }

    /// Device state, present only for control directives.
    #[must_use]
    pub fn device_state(&self) -> Option<DeviceState> {
        match self {
            Self::Control { state, .. } => Some(*state),
            _ => None,
        }
    }

    /// Control parameters, present only for control directives.
    #[must_use]
    pub fn parameters(&self) -> Option<&ControlParameters> {
        match self {
            Self::Control { parameters, .. } => Some(parameters),
            _ => None,
        }
    }

    /// The natural-language part of the reply. Always present.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Control { text, .. } | Self::Chat { text } | Self::Malformed { text, .. } => text,
        }
    }

    #[must_use]
    pub fn is_control(&self) -> bool {
        matches!(self, Self::Control { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_state_wire_format() {
        for state in [DeviceState::On, DeviceState::Off, DeviceState::Blink] {
            assert_eq!(DeviceState::parse(state.as_str()), Some(state));
        }
        assert_eq!(DeviceState::parse("on"), None);
        assert_eq!(DeviceState::parse("FLASH"), None);
    }

    #[test]
    fn control_parameters_serialize_flat() {
        let off = serde_json::to_value(ControlParameters::Off {}).expect("serialize off");
        assert_eq!(off, serde_json::json!({}));

        let on = serde_json::to_value(ControlParameters::On { duration: None })
            .expect("serialize on");
        assert_eq!(on, serde_json::json!({}));

        let on = serde_json::to_value(ControlParameters::On {
            duration: Some(10.0),
        })
        .expect("serialize on with duration");
        assert_eq!(on, serde_json::json!({"duration": 10.0}));

        let blink = serde_json::to_value(ControlParameters::Blink(BlinkParams {
            delay: 1.0,
            times: 5,
            duration: 10.0,
        }))
        .expect("serialize blink");
        assert_eq!(
            blink,
            serde_json::json!({"delay": 1.0, "times": 5, "duration": 10.0})
        );
    }

    #[test]
    fn directive_accessors() {
        let directive = Directive::Control {
            state: DeviceState::Off,
            parameters: ControlParameters::Off {},
            text: "Turning LED OFF".to_owned(),
        };
        assert_eq!(directive.kind(), DirectiveKind::Control);
        assert_eq!(directive.device_state(), Some(DeviceState::Off));
        assert_eq!(directive.text(), "Turning LED OFF");

        let chat = Directive::Chat {
            text: "hello".to_owned(),
        };
        assert_eq!(chat.device_state(), None);
        assert!(chat.parameters().is_none());
        assert!(!chat.is_control());
    }

    #[test]
    fn malformed_reason_messages() {
        let reason = MalformedReason::UnrecognizedCommand {
            action: Some("control".to_owned()),
            device: Some("thermostat".to_owned()),
            state: None,
        };
        assert_eq!(
            reason.to_string(),
            "unrecognized command (action=control, device=thermostat, state=<missing>)"
        );

        let reason = MalformedReason::UnparsableNumericField {
            field: NumericField::Duration,
            value: "abc".to_owned(),
        };
        assert_eq!(
            reason.to_string(),
            "field `duration` value `abc` is not a valid number"
        );
    }

    #[test]
    fn directive_serializes_with_kind_tag() {
        let directive = Directive::Malformed {
            reason: MalformedReason::EmptyBlock,
            text: "ok".to_owned(),
        };
        let json = serde_json::to_value(&directive).expect("serialize directive");
        assert_eq!(json["kind"], "malformed");
        assert_eq!(json["reason"]["code"], "empty_block");
        assert_eq!(json["text"], "ok");
    }
}
