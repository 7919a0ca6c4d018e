//! Model reply parsing.
//!
//! A reply is plain conversation unless it contains a fenced block
//! (three backticks on each side). The block holds comma-separated
//! `key:value` tokens such as `action:control,device:led,state:ON,duration:10`,
//! usually next to a short confirmation like "Turning LED ON for 10 seconds".
//!
//! Only the first block is read. Keys come from a closed vocabulary and
//! anything outside it makes the reply [`Directive::Malformed`].

use crate::directive::normalize::{BlinkDefaults, normalize_blink_with};
use crate::directive::types::{
    ControlParameters, DeviceState, Directive, MalformedReason, NumericField, RawBlinkInput,
};
use tracing::{debug, warn};

/// Delimiter on both sides of a command block.
pub const FENCE: &str = "```";

/// The only accepted `action` value.
pub const ACTION_CONTROL: &str = "control";

/// The only accepted `device` value.
pub const DEVICE_LED: &str = "led";

/// Parse a model reply using the built-in blink defaults.
#[must_use]
pub fn parse_reply(reply: &str) -> Directive {
    parse_reply_with(reply, &BlinkDefaults::default())
}

/// Parse a model reply, filling missing blink fields from `defaults`.
///
/// Pure apart from logging; the same input always gives the same directive.
#[must_use]
pub fn parse_reply_with(reply: &str, defaults: &BlinkDefaults) -> Directive {
    let Some(block) = find_fenced_block(reply) else {
        debug!(reply_len = reply.len(), "model reply has no command block");
        return Directive::Chat {
            text: reply.to_owned(),
        };
    };

    let text = text_around(reply, &block);
    let directive = match read_command(block.content, defaults) {
        Ok(parameters) => Directive::Control {
            state: parameters.state(),
            parameters,
            text,
        },
        Err(reason) => {
            warn!(%reason, block = block.content, "rejected malformed command block");
            Directive::Malformed { reason, text }
        }
    };

    debug!(
        kind = %directive.kind(),
        state = ?directive.device_state(),
        "classified model reply"
    );
    directive
}

/// Byte span of the first fenced block and its trimmed content.
struct FencedBlock<'a> {
    start: usize,
    end: usize,
    content: &'a str,
}

fn find_fenced_block(reply: &str) -> Option<FencedBlock<'_>> {
    let open = reply.find(FENCE)?;
    let body_start = open + FENCE.len();
    let close = body_start + reply[body_start..].find(FENCE)?;
    Some(FencedBlock {
        start: open,
        end: close + FENCE.len(),
        content: skip_info_string(reply[body_start..close].trim()),
    })
}

/// Drop a leading language tag line such as `text` in "```text\n...".
fn skip_info_string(content: &str) -> &str {
    match content.split_once('\n') {
        Some((first, rest))
            if !first.trim().is_empty()
                && first
                    .trim()
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') =>
        {
            rest.trim()
        }
        _ => content,
    }
}

/// Reply text with the block cut out. Falls back to the whole reply so
/// the text is never empty when the reply was not.
fn text_around(reply: &str, block: &FencedBlock<'_>) -> String {
    let before = reply[..block.start].trim();
    let after = reply[block.end..].trim();
    let text = match (before.is_empty(), after.is_empty()) {
        (false, false) => format!("{before} {after}"),
        (false, true) => before.to_owned(),
        (true, false) => after.to_owned(),
        (true, true) => String::new(),
    };
    if text.is_empty() {
        reply.to_owned()
    } else {
        text
    }
}

/// Keys accepted inside a command block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKey {
    Action,
    Device,
    State,
    Duration,
    Delay,
    Times,
}

impl FieldKey {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "action" => Some(Self::Action),
            "device" => Some(Self::Device),
            "state" => Some(Self::State),
            "duration" => Some(Self::Duration),
            "delay" => Some(Self::Delay),
            "times" => Some(Self::Times),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Device => "device",
            Self::State => "state",
            Self::Duration => "duration",
            Self::Delay => "delay",
            Self::Times => "times",
        }
    }
}

/// Raw string values of a block, at most one per key.
#[derive(Debug, Default)]
struct CommandFields<'a> {
    action: Option<&'a str>,
    device: Option<&'a str>,
    state: Option<&'a str>,
    duration: Option<&'a str>,
    delay: Option<&'a str>,
    times: Option<&'a str>,
}

impl<'a> CommandFields<'a> {
    fn slot_mut(&mut self, key: FieldKey) -> &mut Option<&'a str> {
        match key {
            FieldKey::Action => &mut self.action,
            FieldKey::Device => &mut self.device,
            FieldKey::State => &mut self.state,
            FieldKey::Duration => &mut self.duration,
            FieldKey::Delay => &mut self.delay,
            FieldKey::Times => &mut self.times,
        }
    }
}

fn tokenize(content: &str) -> Result<CommandFields<'_>, MalformedReason> {
    let mut fields = CommandFields::default();
    let mut seen_any = false;

    for token in content.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        seen_any = true;
        let (key, value) = split_token(token).ok_or_else(|| MalformedReason::MissingSeparator {
            token: token.to_owned(),
        })?;
        let key = FieldKey::parse(key).ok_or_else(|| MalformedReason::UnknownField {
            key: key.to_owned(),
        })?;
        let slot = fields.slot_mut(key);
        if slot.is_some() {
            return Err(MalformedReason::DuplicateField {
                key: key.as_str().to_owned(),
            });
        }
        *slot = Some(value);
    }

    if seen_any {
        Ok(fields)
    } else {
        Err(MalformedReason::EmptyBlock)
    }
}

/// Split on the first `:` or `=`.
fn split_token(token: &str) -> Option<(&str, &str)> {
    let at = token.find([':', '='])?;
    Some((token[..at].trim(), token[at + 1..].trim()))
}

fn read_command(
    content: &str,
    defaults: &BlinkDefaults,
) -> Result<ControlParameters, MalformedReason> {
    let fields = tokenize(content)?;

    let state = match (fields.action, fields.device, fields.state) {
        (Some(ACTION_CONTROL), Some(DEVICE_LED), Some(state)) => DeviceState::parse(state),
        _ => None,
    }
    .ok_or_else(|| MalformedReason::UnrecognizedCommand {
        action: fields.action.map(str::to_owned),
        device: fields.device.map(str::to_owned),
        state: fields.state.map(str::to_owned),
    })?;

    let raw = RawBlinkInput {
        delay: parse_seconds(NumericField::Delay, fields.delay)?,
        times: parse_times(fields.times)?,
        duration: parse_seconds(NumericField::Duration, fields.duration)?,
    };

    Ok(match state {
        DeviceState::On => ControlParameters::On {
            duration: raw.duration.filter(|secs| *secs >= 0.0),
        },
        DeviceState::Off => ControlParameters::Off {},
        DeviceState::Blink => ControlParameters::Blink(normalize_blink_with(raw, defaults)),
    })
}

/// Seconds must be finite. Range checks happen where the value is used.
fn parse_seconds(field: NumericField, value: Option<&str>) -> Result<Option<f64>, MalformedReason> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.parse::<f64>() {
        Ok(secs) if secs.is_finite() => Ok(Some(secs)),
        _ => Err(MalformedReason::UnparsableNumericField {
            field,
            value: value.to_owned(),
        }),
    }
}

fn parse_times(value: Option<&str>) -> Result<Option<i64>, MalformedReason> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.parse::<i64>() {
        Ok(times) => Ok(Some(times)),
        // Out of range for any usable count, same as a too-large u32.
        Err(_) if is_integer_literal(value) => Ok(None),
        Err(_) => Err(MalformedReason::UnparsableNumericField {
            field: NumericField::Times,
            value: value.to_owned(),
        }),
    }
}

fn is_integer_literal(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
