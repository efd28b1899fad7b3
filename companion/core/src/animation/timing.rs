//! Easing Curves
//!
//! Maps linear tween progress onto the curves used by the presenter's
//! transitions and idle motion.

use serde::{Deserialize, Serialize};

/// Easing functions for smooth animation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EasingFunction {
    /// No easing (constant speed)
    #[default]
    Linear,

    /// Slow start, fast end
    EaseIn,

    /// Fast start, slow end
    EaseOut,

    /// Slow start and end
    EaseInOut,

    /// Half a cosine wave; used for the idle float and breath loops
    EaseInOutSine,

    /// Cubic ease in
    EaseInCubic,

    /// Cubic ease out
    EaseOutCubic,
}

impl EasingFunction {
    /// Apply the easing function to a progress value (0.0 to 1.0)
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t).powi(2),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::EaseInOutSine => -((std::f32::consts::PI * t).cos() - 1.0) / 2.0,
            Self::EaseInCubic => t * t * t,
            Self::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [EasingFunction; 7] = [
        EasingFunction::Linear,
        EasingFunction::EaseIn,
        EasingFunction::EaseOut,
        EasingFunction::EaseInOut,
        EasingFunction::EaseInOutSine,
        EasingFunction::EaseInCubic,
        EasingFunction::EaseOutCubic,
    ];

    #[test]
    fn test_endpoints_are_fixed() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-5, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-5, "{easing:?} at 1");
        }
    }

    #[test]
    fn test_input_is_clamped() {
        assert_eq!(EasingFunction::EaseOut.apply(-3.0), 0.0);
        assert_eq!(EasingFunction::EaseOut.apply(4.0), 1.0);
    }

    #[test]
    fn test_sine_is_symmetric() {
        let e = EasingFunction::EaseInOutSine;
        assert!((e.apply(0.5) - 0.5).abs() < 1e-5);
        assert!((e.apply(0.25) + e.apply(0.75) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_ease_out_leads_ease_in() {
        assert!(EasingFunction::EaseOut.apply(0.3) > EasingFunction::EaseIn.apply(0.3));
    }
}
