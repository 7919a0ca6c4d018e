//! Sol: natural-language LED control.
//!
//! Interprets a language-model reply as either a device directive for a
//! single LED (ON, OFF, BLINK) or a plain chat reply.
//!
//! # Architecture
//!
//! - **Directive**: finds the fenced command block in a reply, classifies it
//!   as control, chat or malformed, and completes BLINK parameters
//! - **Dispatch**: publishes control payloads to the LED topic through a
//!   pluggable publisher
//! - **Host**: versioned reply/response envelopes and a stdin/stdout bridge
//!
//! ```
//! use sol::directive::{ControlParameters, DeviceState, parse_reply};
//!
//! let directive = parse_reply(
//!     "Turning LED ON for 10 seconds ```action:control,device:led,state:ON,duration:10```",
//! );
//! assert_eq!(directive.device_state(), Some(DeviceState::On));
//! assert_eq!(
//!     directive.parameters(),
//!     Some(&ControlParameters::On { duration: Some(10.0) })
//! );
//! assert_eq!(directive.text(), "Turning LED ON for 10 seconds");
//! ```

pub mod config;
pub mod directive;
pub mod dispatch;
pub mod error;
pub mod host;

pub use config::SolConfig;
pub use directive::{Directive, DirectiveKind, normalize_blink, parse_reply};
pub use dispatch::{DirectivePublisher, Dispatcher};
pub use error::{Result, SolError};
