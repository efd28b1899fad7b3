//! Theme and Colors
//!
//! Palette for the terminal surface. The companion itself is drawn in the
//! colors baked into its textures; these cover the backdrop and overlays.

use companion_core::Color as PixelColor;
use ratatui::style::Color;

// ============================================================================
// Backdrop
// ============================================================================

/// Night-sky backdrop behind the stage
pub const BACKDROP: PixelColor = PixelColor::rgb(18, 22, 38);

/// Same backdrop as a terminal color
pub const BACKDROP_CELL: Color = Color::Rgb(18, 22, 38);

// ============================================================================
// Overlays
// ============================================================================

/// Panel title - desert gold
pub const PANEL_TITLE: Color = Color::Rgb(255, 214, 102);

/// Panel body text
pub const PANEL_TEXT: Color = Color::Rgb(230, 230, 240);

/// Panel frame and confirm hint
pub const PANEL_ACCENT: Color = Color::Rgb(120, 200, 180);

/// Panel background
pub const PANEL_BG: Color = Color::Rgb(34, 40, 64);

/// Earned stars
pub const STAR_GOLD: Color = Color::Rgb(255, 200, 60);

// ============================================================================
// Status line
// ============================================================================

/// System/dim text
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

/// Error red
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// Convert a pixel color to a terminal color, dropping alpha
#[must_use]
pub fn cell_color(color: PixelColor) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}
