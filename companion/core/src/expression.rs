//! Companion Expressions
//!
//! The fixed, closed set of moods the companion can show. An expression
//! selects both the static image (image mode) and the synthesized frame row
//! and looping animation (procedural mode).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the companion's moods
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    /// Waving hello
    Greet,
    /// Thumbs up
    Encourage,
    /// Hand to chin
    Think,
    /// Raised alert hand
    Warning,
    /// Both arms open
    Success,
}

/// Error returned when parsing an unknown expression name
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown expression: {0}")]
pub struct UnknownExpression(pub String);

impl Expression {
    /// All expressions in sheet row order
    pub const ALL: [Expression; 5] = [
        Expression::Greet,
        Expression::Encourage,
        Expression::Think,
        Expression::Warning,
        Expression::Success,
    ];

    /// Lowercase name used in resource keys
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Greet => "greet",
            Self::Encourage => "encourage",
            Self::Think => "think",
            Self::Warning => "warning",
            Self::Success => "success",
        }
    }

    /// Row of this expression in the synthesized sheet
    #[must_use]
    pub fn row(self) -> usize {
        match self {
            Self::Greet => 0,
            Self::Encourage => 1,
            Self::Think => 2,
            Self::Warning => 3,
            Self::Success => 4,
        }
    }

    /// Texture key of the pre-authored image for this expression
    #[must_use]
    pub fn image_key(self) -> String {
        format!("companion.{}", self.name())
    }

    /// Key of the synthesized looping animation for this expression
    #[must_use]
    pub fn animation_key(self) -> String {
        format!("companion.{}.loop", self.name())
    }

    /// Name of a synthesized frame within the sheet
    #[must_use]
    pub fn frame_name(self, index: usize) -> String {
        format!("{}-{}", self.name(), index)
    }

    /// Playback rate of the synthesized loop (frames per second)
    #[must_use]
    pub fn frame_rate(self) -> f32 {
        match self {
            Self::Greet => 6.0,
            Self::Encourage => 5.0,
            Self::Think => 3.0,
            Self::Warning => 7.0,
            Self::Success => 8.0,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Expression {
    type Err = UnknownExpression;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|e| e.name() == lowered)
            .ok_or(UnknownExpression(s.to_string()))
    }
}
