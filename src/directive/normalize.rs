//! Blink parameter normalization.
//!
//! Turns a partial [`RawBlinkInput`] into a complete [`BlinkParams`] triple.
//! The policy is an ordered table; the first matching row wins:
//!
//! | duration | times | delay | times | duration |
//! |----------|-------|-------|-------|----------|
//! | yes | yes | derived | given | given |
//! | yes | no | default | default | given |
//! | no | yes | default | given | default |
//! | no | no | default | default | default |
//!
//! An explicit `delay` is never consulted. See [`derive_delay`].

use crate::directive::types::{BlinkParams, RawBlinkInput};
use serde::{Deserialize, Serialize};

/// Default values filled in for missing blink fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkDefaults {
    /// Seconds between toggles when not derived.
    pub delay_secs: f64,
    /// Repeat count when none is given.
    pub times: u32,
    /// Total duration in seconds when none is given.
    pub duration_secs: f64,
}

impl Default for BlinkDefaults {
    fn default() -> Self {
        Self {
            delay_secs: 0.5,
            times: 5,
            duration_secs: 5.0,
        }
    }
}

impl BlinkDefaults {
    fn params(&self) -> BlinkParams {
        BlinkParams {
            delay: self.delay_secs,
            times: self.times.max(1),
            duration: self.duration_secs,
        }
    }
}

/// Which row of the normalization table applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlinkRule {
    /// Duration and times given; delay derived from them.
    DerivedDelay,
    /// Only duration given.
    DurationOnly,
    /// Only times given.
    TimesOnly,
    /// Nothing usable given.
    Defaults,
}

impl BlinkRule {
    /// Select the table row for a raw input.
    #[must_use]
    pub fn select(raw: &RawBlinkInput) -> Self {
        match (usable_duration(raw.duration), usable_times(raw.times)) {
            (Some(_), Some(_)) => Self::DerivedDelay,
            (Some(_), None) => Self::DurationOnly,
            (None, Some(_)) => Self::TimesOnly,
            (None, None) => Self::Defaults,
        }
    }
}

/// Delay between toggles so that `times` blinks fill `duration`.
///
/// This is the only place delay is computed. Whenever both duration and
/// times are known, the result replaces any delay the model supplied.
#[must_use]
pub fn derive_delay(duration: f64, times: u32) -> f64 {
    duration / (f64::from(times) * 2.0)
}

/// Normalize with the built-in defaults (0.5 s delay, 5 times, 5 s).
#[must_use]
pub fn normalize_blink(raw: RawBlinkInput) -> BlinkParams {
    normalize_blink_with(raw, &BlinkDefaults::default())
}

/// Normalize with the given defaults. Never fails.
#[must_use]
pub fn normalize_blink_with(raw: RawBlinkInput, defaults: &BlinkDefaults) -> BlinkParams {
    let fallback = defaults.params();
    let duration = usable_duration(raw.duration);
    let times = usable_times(raw.times);

    let params = match (duration, times) {
        (Some(duration), Some(times)) => BlinkParams {
            delay: derive_delay(duration, times),
            times,
            duration,
        },
        (Some(duration), None) => BlinkParams {
            duration,
            ..fallback
        },
        (None, Some(times)) => BlinkParams { times, ..fallback },
        (None, None) => fallback,
    };

    tracing::trace!(
        rule = ?BlinkRule::select(&raw),
        ignored_delay = ?raw.delay,
        delay = params.delay,
        times = params.times,
        duration = params.duration,
        "normalized blink parameters"
    );
    params
}

/// Zero, negative and out-of-range counts count as absent.
fn usable_times(times: Option<i64>) -> Option<u32> {
    times
        .filter(|t| *t > 0)
        .and_then(|t| u32::try_from(t).ok())
}

/// Negative or non-finite durations count as absent; zero is kept.
fn usable_duration(duration: Option<f64>) -> Option<f64> {
    duration.filter(|d| d.is_finite() && *d >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(delay: Option<f64>, times: Option<i64>, duration: Option<f64>) -> RawBlinkInput {
        RawBlinkInput {
            delay,
            times,
            duration,
        }
    }

    #[test]
    fn duration_and_times_derive_delay() {
        let params = normalize_blink(raw(None, Some(5), Some(10.0)));
        assert_eq!(
            params,
            BlinkParams {
                delay: 1.0,
                times: 5,
                duration: 10.0
            }
        );
    }

    #[test]
    fn explicit_delay_is_overridden_by_derivation() {
        let params = normalize_blink(raw(Some(3.0), Some(4), Some(2.0)));
        assert!((params.delay - 0.25).abs() < f64::EPSILON);
        assert_eq!(params.times, 4);
    }

    #[test]
    fn explicit_delay_is_ignored_without_derivation() {
        let params = normalize_blink(raw(Some(3.0), None, None));
        assert!((params.delay - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn duration_only_defaults_times_and_delay() {
        let params = normalize_blink(raw(None, None, Some(8.0)));
        assert_eq!(
            params,
            BlinkParams {
                delay: 0.5,
                times: 5,
                duration: 8.0
            }
        );
    }

    #[test]
    fn times_only_defaults_duration_and_delay() {
        let params = normalize_blink(raw(None, Some(3), None));
        assert_eq!(
            params,
            BlinkParams {
                delay: 0.5,
                times: 3,
                duration: 5.0
            }
        );
    }

    #[test]
    fn empty_input_uses_all_defaults() {
        let params = normalize_blink(RawBlinkInput::default());
        assert_eq!(
            params,
            BlinkParams {
                delay: 0.5,
                times: 5,
                duration: 5.0
            }
        );
    }

    #[test]
    fn zero_times_falls_back_to_duration_only() {
        let input = raw(None, Some(0), Some(10.0));
        assert_eq!(BlinkRule::select(&input), BlinkRule::DurationOnly);
        let params = normalize_blink(input);
        assert_eq!(
            params,
            BlinkParams {
                delay: 0.5,
                times: 5,
                duration: 10.0
            }
        );
        assert!(params.delay.is_finite());
    }

    #[test]
    fn negative_times_is_absent() {
        let input = raw(None, Some(-3), None);
        assert_eq!(BlinkRule::select(&input), BlinkRule::Defaults);
        assert_eq!(normalize_blink(input).times, 5);
    }

    #[test]
    fn oversized_times_is_absent() {
        let input = raw(None, Some(i64::from(u32::MAX) + 1), Some(4.0));
        assert_eq!(BlinkRule::select(&input), BlinkRule::DurationOnly);
    }

    #[test]
    fn zero_duration_passes_through() {
        let params = normalize_blink(raw(None, Some(2), Some(0.0)));
        assert_eq!(params.duration, 0.0);
        assert_eq!(params.delay, 0.0);
        assert_eq!(params.times, 2);
    }

    #[test]
    fn non_finite_duration_is_absent() {
        let params = normalize_blink(raw(None, Some(2), Some(f64::NAN)));
        assert_eq!(params.duration, 5.0);
        assert!(params.delay.is_finite());
    }

    #[test]
    fn rule_table_is_exhaustive() {
        let cases = [
            (raw(None, Some(1), Some(1.0)), BlinkRule::DerivedDelay),
            (raw(None, None, Some(1.0)), BlinkRule::DurationOnly),
            (raw(None, Some(1), None), BlinkRule::TimesOnly),
            (raw(Some(1.0), None, None), BlinkRule::Defaults),
        ];
        for (input, expected) in cases {
            assert_eq!(BlinkRule::select(&input), expected, "input {input:?}");
        }
    }

    #[test]
    fn custom_defaults_are_applied() {
        let defaults = BlinkDefaults {
            delay_secs: 0.2,
            times: 10,
            duration_secs: 3.0,
        };
        let params = normalize_blink_with(RawBlinkInput::default(), &defaults);
        assert_eq!(
            params,
            BlinkParams {
                delay: 0.2,
                times: 10,
                duration: 3.0
            }
        );
    }

    #[test]
    fn zero_times_default_is_clamped() {
        let defaults = BlinkDefaults {
            times: 0,
            ..BlinkDefaults::default()
        };
        assert_eq!(
            normalize_blink_with(RawBlinkInput::default(), &defaults).times,
            1
        );
    }

    #[test]
    fn normalization_is_deterministic() {
        let input = raw(Some(0.1), Some(7), Some(3.5));
        assert_eq!(normalize_blink(input), normalize_blink(input));
    }
}
