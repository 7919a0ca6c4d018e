//! Directive extraction from model replies.
//!
//! - **Types** (`types.rs`): `Directive`, `DeviceState`, `ControlParameters`, `MalformedReason`
//! - **Parser** (`parser.rs`): finds the fenced command block and classifies the reply
//! - **Normalize** (`normalize.rs`): completes partial BLINK parameters

pub mod normalize;
pub mod parser;
pub mod types;

pub use normalize::{BlinkDefaults, BlinkRule, derive_delay, normalize_blink, normalize_blink_with};
pub use parser::{parse_reply, parse_reply_with};
pub use types::{
    BlinkParams, ControlParameters, DeviceState, Directive, DirectiveKind, MalformedReason,
    NumericField, RawBlinkInput,
};
