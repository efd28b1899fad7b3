//! Group Layout
//!
//! Fixed offsets of every element inside the companion group, plus the
//! viewport-dependent anchor and caption wrap rules. Offsets are identical
//! for all expressions, so switching expression never re-lays anything out.

use crate::canvas::Color;
use crate::config::PresenterConfig;
use crate::host::{Shape, TextStyle};
use crate::options::Position;

/// Background glow radius
pub const GLOW_RADIUS: f32 = 84.0;
/// Glow offset above the anchor
pub const GLOW_Y: f32 = -6.0;
/// Glow opacity (kept constant; the group alpha does the fading)
pub const GLOW_ALPHA: f32 = 0.9;
/// Warm halo color
pub const GLOW_COLOR: Color = Color::rgba(255, 214, 140, 170);

/// Displayed body size (square)
pub const BODY_SIZE: f32 = 128.0;

/// Outer accent ring
pub const RING_OUTER: Shape = Shape::Ring {
    radius: 72.0,
    color: Color::rgba(214, 160, 60, 230),
    width: 3.0,
};
/// Inner highlight ring
pub const RING_INNER: Shape = Shape::Ring {
    radius: 67.0,
    color: Color::rgba(255, 244, 214, 150),
    width: 1.5,
};

/// Primary caption offset below the anchor
pub const PRIMARY_CAPTION_Y: f32 = 104.0;
/// Secondary caption offset below the anchor
pub const SECONDARY_CAPTION_Y: f32 = 148.0;

/// Where the group sits for a position mode in a viewport
#[must_use]
pub fn anchor(config: &PresenterConfig, position: Position, viewport: (f32, f32)) -> (f32, f32) {
    let (width, height) = viewport;
    match position {
        Position::Center => (width / 2.0, height / 2.0),
        Position::Top => (
            width / 2.0,
            config.top_offset.min(height - config.bottom_margin),
        ),
    }
}

/// Caption wrap width for a viewport width
#[must_use]
pub fn caption_wrap_width(config: &PresenterConfig, viewport_width: f32) -> f32 {
    (viewport_width * config.caption_width_ratio).min(config.caption_max_width)
}

/// Guess the position mode from where the group currently sits
#[must_use]
pub fn infer_position(config: &PresenterConfig, group_y: f32, viewport_height: f32) -> Position {
    if (group_y - viewport_height / 2.0).abs() < config.center_tolerance {
        Position::Center
    } else {
        Position::Top
    }
}

/// Style of the primary caption
#[must_use]
pub fn primary_caption_style(wrap_width: f32) -> TextStyle {
    TextStyle {
        size_px: 22.0,
        color: Color::rgb(255, 250, 235),
        stroke: Some((Color::rgb(58, 36, 18), 4.0)),
        wrap_width,
    }
}

/// Style of the secondary caption: smaller and dimmer
#[must_use]
pub fn secondary_caption_style(wrap_width: f32) -> TextStyle {
    TextStyle {
        size_px: 16.0,
        color: Color::rgba(236, 226, 204, 210),
        stroke: Some((Color::rgb(58, 36, 18), 3.0)),
        wrap_width,
    }
}
