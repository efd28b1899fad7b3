//! Reduced-Motion Accessibility Mode
//!
//! Lets users who prefer less motion calm the companion down.
//!
//! # Motion Preferences
//!
//! - `Full`: normal idle float/breath and fades
//! - `Reduced`: idle loops run at 0.25x speed
//! - `None`: no idle loops, fades complete instantly
//!
//! # Environment Variable
//!
//! Read by the config loader through [`parse_motion_preference`]:
//!
//! - `REDUCE_MOTION=1` or `REDUCE_MOTION=reduced` -> `MotionPreference::Reduced`
//! - `REDUCE_MOTION=none` or `REDUCE_MOTION=static` -> `MotionPreference::None`
//! - Unset or other values -> `MotionPreference::Full`

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable holding the motion preference
pub const REDUCE_MOTION_ENV: &str = "REDUCE_MOTION";

/// User preference for motion and animation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionPreference {
    /// Full animation at normal speed
    #[default]
    Full,
    /// Reduced motion - idle loops play at 0.25x speed
    Reduced,
    /// No motion - static body, instant fades
    None,
}

impl MotionPreference {
    /// Whether fades take time
    #[must_use]
    pub fn allows_transitions(&self) -> bool {
        !matches!(self, MotionPreference::None)
    }

    /// Idle loop period adjusted for this preference (`None` when loops are off)
    #[must_use]
    pub fn idle_period(&self, base: Duration) -> Option<Duration> {
        match self {
            MotionPreference::Full => Some(base),
            MotionPreference::Reduced => Some(base * 4),
            MotionPreference::None => None,
        }
    }

    /// Fade duration adjusted for this preference
    #[must_use]
    pub fn fade_duration(&self, base: Duration) -> Duration {
        if self.allows_transitions() {
            base
        } else {
            Duration::ZERO
        }
    }
}

/// Parse a motion preference value string
#[must_use]
pub fn parse_motion_preference(value: &str) -> MotionPreference {
    match value.to_lowercase().trim() {
        "1" | "true" | "yes" | "reduced" => MotionPreference::Reduced,
        "none" | "static" | "off" | "2" => MotionPreference::None,
        _ => MotionPreference::Full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reduced_values() {
        for value in ["1", "true", "YES", " reduced "] {
            assert_eq!(parse_motion_preference(value), MotionPreference::Reduced);
        }
    }

    #[test]
    fn test_parse_none_values() {
        for value in ["none", "static", "off", "2"] {
            assert_eq!(parse_motion_preference(value), MotionPreference::None);
        }
    }

    #[test]
    fn test_parse_other_is_full() {
        assert_eq!(parse_motion_preference(""), MotionPreference::Full);
        assert_eq!(parse_motion_preference("0"), MotionPreference::Full);
        assert_eq!(parse_motion_preference("fast"), MotionPreference::Full);
    }

    #[test]
    fn test_idle_period_scaling() {
        let base = Duration::from_millis(2800);
        assert_eq!(MotionPreference::Full.idle_period(base), Some(base));
        assert_eq!(
            MotionPreference::Reduced.idle_period(base),
            Some(Duration::from_millis(11200))
        );
        assert_eq!(MotionPreference::None.idle_period(base), None);
    }

    #[test]
    fn test_fade_duration() {
        let base = Duration::from_millis(600);
        assert_eq!(MotionPreference::Reduced.fade_duration(base), base);
        assert_eq!(MotionPreference::None.fade_duration(base), Duration::ZERO);
    }
}
