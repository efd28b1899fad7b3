//! Presentation Options
//!
//! What the caller can ask for when showing the companion: where to anchor
//! it, whether it should hide itself, and which captions to attach.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where the companion group is anchored in the viewport
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Geometric center of the viewport
    Center,
    /// Fixed offset from the top, kept clear of the bottom edge
    #[default]
    Top,
}

/// Options passed to `Presenter::show`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationOptions {
    /// Anchor mode (defaults to `Top`)
    pub position: Position,
    /// Auto-hide delay in milliseconds; `None` or zero never auto-hides
    pub duration_ms: Option<u64>,
    /// Primary caption
    pub message: Option<String>,
    /// Secondary caption, rendered smaller and dimmer
    pub secondary_message: Option<String>,
}

impl PresentationOptions {
    /// Options with every field at its default
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the anchor mode
    #[must_use]
    pub fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Auto-hide after `ms` milliseconds
    #[must_use]
    pub fn duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    /// Set the primary caption
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the secondary caption
    #[must_use]
    pub fn secondary_message(mut self, message: impl Into<String>) -> Self {
        self.secondary_message = Some(message.into());
        self
    }

    /// The auto-hide delay, if one should be scheduled
    #[must_use]
    pub fn auto_hide_after(&self) -> Option<Duration> {
        self.duration_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = PresentationOptions::new();
        assert_eq!(options.position, Position::Top);
        assert_eq!(options.auto_hide_after(), None);
        assert!(options.message.is_none());
        assert!(options.secondary_message.is_none());
    }

    #[test]
    fn test_zero_duration_never_hides() {
        let options = PresentationOptions::new().duration_ms(0);
        assert_eq!(options.auto_hide_after(), None);

        let options = PresentationOptions::new().duration_ms(500);
        assert_eq!(options.auto_hide_after(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_deserialize_partial() {
        let options: PresentationOptions =
            toml::from_str("position = \"center\"\nmessage = \"hi\"").unwrap();
        assert_eq!(options.position, Position::Center);
        assert_eq!(options.message.as_deref(), Some("hi"));
        assert_eq!(options.duration_ms, None);
    }
}
