//! 2D Canvas Abstraction
//!
//! The drawing surface the synthesizer paints the companion onto. The API
//! mirrors a classic immediate-mode 2D context: a transform/state stack,
//! path building, fill/stroke with solid or gradient paint, clipping and a
//! drop shadow.
//!
//! Hosts provide an implementation; [`crate::raster::Raster`] adapts a
//! `tiny_skia` surface to it.
//!
//! # Scoped state
//!
//! ```ignore
//! use companion_core::canvas::{Canvas, CanvasExt};
//!
//! fn draw_arm(canvas: &mut impl Canvas) {
//!     let mut c = canvas.scoped();
//!     c.translate(10.0, 4.0);
//!     c.rotate(0.3);
//!     // ... draw ...
//! } // state restored here, even on early return
//! ```

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red component (0-255)
    pub r: u8,
    /// Green component (0-255)
    pub g: u8,
    /// Blue component (0-255)
    pub b: u8,
    /// Alpha component (0=transparent, 255=opaque)
    pub a: u8,
}

impl Color {
    /// Create a fully opaque color from RGB components
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a color with explicit alpha channel
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a fully transparent color
    #[must_use]
    pub const fn transparent() -> Self {
        Self::rgba(0, 0, 0, 0)
    }

    /// Same color with a new alpha
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Check if this color is fully transparent
    #[must_use]
    pub const fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Linearly interpolate between two colors (`t` = 0.0 gives `self`)
    #[must_use]
    pub fn lerp(&self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 {
            (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8
        };
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

/// A color stop in a gradient (`offset` in 0.0..=1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Position along the gradient
    pub offset: f32,
    /// Color at this position
    pub color: Color,
}

/// Gradient geometry and stops, in user space
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    /// Linear: start point; radial: center
    pub start: (f32, f32),
    /// Linear: end point; radial: unused
    pub end: (f32, f32),
    /// Radial: radius; linear: unused
    pub radius: f32,
    /// Stops, sorted by offset
    pub stops: Vec<ColorStop>,
}

/// Paint used for fills and strokes
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    /// A single color
    Solid(Color),
    /// Linear gradient from `start` to `end`
    Linear(Gradient),
    /// Radial gradient around `start` with `radius`
    Radial(Gradient),
}

impl Paint {
    /// Linear gradient between two points with evenly specified stops
    #[must_use]
    pub fn linear(from: (f32, f32), to: (f32, f32), stops: &[(f32, Color)]) -> Self {
        Self::Linear(Gradient {
            start: from,
            end: to,
            radius: 0.0,
            stops: to_stops(stops),
        })
    }

    /// Radial gradient around a center
    #[must_use]
    pub fn radial(center: (f32, f32), radius: f32, stops: &[(f32, Color)]) -> Self {
        Self::Radial(Gradient {
            start: center,
            end: center,
            radius,
            stops: to_stops(stops),
        })
    }
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Self::Solid(color)
    }
}

fn to_stops(stops: &[(f32, Color)]) -> Vec<ColorStop> {
    let mut stops: Vec<ColorStop> = stops
        .iter()
        .map(|&(offset, color)| ColorStop {
            offset: offset.clamp(0.0, 1.0),
            color,
        })
        .collect();
    stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
    stops
}

/// Drop shadow applied to subsequent fills and strokes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    /// Shadow color
    pub color: Color,
    /// Blur radius in device pixels
    pub blur: f32,
    /// Offset in device pixels
    pub offset: (f32, f32),
}

/// Immediate-mode 2D drawing surface
///
/// Path coordinates are transformed by the current transform when they are
/// added, as in an HTML canvas context.
pub trait Canvas {
    /// Push the full drawing state (transform, paints, clip, shadow, alpha)
    fn save(&mut self);
    /// Pop the drawing state; unbalanced calls are ignored
    fn restore(&mut self);

    /// Translate the current transform
    fn translate(&mut self, x: f32, y: f32);
    /// Rotate the current transform (radians, clockwise on screen)
    fn rotate(&mut self, radians: f32);
    /// Scale the current transform
    fn scale(&mut self, sx: f32, sy: f32);

    /// Start a new, empty path
    fn begin_path(&mut self);
    /// Start a new subpath at a point
    fn move_to(&mut self, x: f32, y: f32);
    /// Straight segment to a point
    fn line_to(&mut self, x: f32, y: f32);
    /// Quadratic Bézier segment
    fn quadratic_curve_to(&mut self, cx: f32, cy: f32, x: f32, y: f32);
    /// Circular arc between two angles
    fn arc(&mut self, cx: f32, cy: f32, radius: f32, start: f32, end: f32, anticlockwise: bool);
    /// Elliptical arc between two angles, rotated by `rotation`
    #[allow(clippy::too_many_arguments)]
    fn ellipse(
        &mut self,
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
        rotation: f32,
        start: f32,
        end: f32,
    );
    /// Close the current subpath
    fn close_path(&mut self);

    /// Paint used by `fill`
    fn set_fill(&mut self, paint: Paint);
    /// Paint and width used by `stroke`
    fn set_stroke(&mut self, paint: Paint, width: f32);
    /// Shadow for subsequent drawing (`None` disables it)
    fn set_shadow(&mut self, shadow: Option<Shadow>);
    /// Global opacity multiplier (0.0..=1.0)
    fn set_global_alpha(&mut self, alpha: f32);

    /// Fill the current path (nonzero winding)
    fn fill(&mut self);
    /// Stroke the current path
    fn stroke(&mut self);
    /// Intersect the clip region with the current path
    fn clip(&mut self);

    /// Fill an axis-aligned rectangle in user space
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.begin_path();
        self.move_to(x, y);
        self.line_to(x + w, y);
        self.line_to(x + w, y + h);
        self.line_to(x, y + h);
        self.close_path();
        self.fill();
    }
}

/// Guard returned by [`CanvasExt::scoped`]; restores the canvas state on drop
pub struct Scoped<'a, C: Canvas + ?Sized> {
    canvas: &'a mut C,
}

impl<C: Canvas + ?Sized> Deref for Scoped<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.canvas
    }
}

impl<C: Canvas + ?Sized> DerefMut for Scoped<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.canvas
    }
}

impl<C: Canvas + ?Sized> Drop for Scoped<'_, C> {
    fn drop(&mut self) {
        self.canvas.restore();
    }
}

/// Convenience helpers available on every canvas
pub trait CanvasExt: Canvas {
    /// Save the state and return a guard that restores it when dropped
    fn scoped(&mut self) -> Scoped<'_, Self> {
        self.save();
        Scoped { canvas: self }
    }

    /// Full ellipse as its own subpath
    fn full_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32) {
        self.ellipse(cx, cy, rx, ry, 0.0, 0.0, std::f32::consts::TAU);
        self.close_path();
    }

    /// Full circle as its own subpath
    fn circle(&mut self, cx: f32, cy: f32, radius: f32) {
        self.full_ellipse(cx, cy, radius, radius);
    }
}

impl<C: Canvas + ?Sized> CanvasExt for C {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_stops_are_sorted_and_clamped() {
        let paint = Paint::linear(
            (0.0, 0.0),
            (10.0, 0.0),
            &[(1.5, Color::rgb(255, 255, 255)), (0.0, Color::rgb(0, 0, 0))],
        );
        let Paint::Linear(gradient) = paint else {
            panic!("expected linear gradient");
        };
        let offsets: Vec<f32> = gradient.stops.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.0, 1.0]);
        assert_eq!(gradient.stops[1].color, Color::rgb(255, 255, 255));
    }

    #[test]
    fn test_lerp_midpoint() {
        let mid = Color::rgb(0, 0, 0).lerp(Color::rgb(200, 100, 50), 0.5);
        assert_eq!(mid, Color::rgb(100, 50, 25));
    }

    #[derive(Default)]
    struct DepthCanvas {
        depth: i32,
    }

    impl Canvas for DepthCanvas {
        fn save(&mut self) {
            self.depth += 1;
        }
        fn restore(&mut self) {
            self.depth -= 1;
        }
        fn translate(&mut self, _: f32, _: f32) {}
        fn rotate(&mut self, _: f32) {}
        fn scale(&mut self, _: f32, _: f32) {}
        fn begin_path(&mut self) {}
        fn move_to(&mut self, _: f32, _: f32) {}
        fn line_to(&mut self, _: f32, _: f32) {}
        fn quadratic_curve_to(&mut self, _: f32, _: f32, _: f32, _: f32) {}
        fn arc(&mut self, _: f32, _: f32, _: f32, _: f32, _: f32, _: bool) {}
        fn ellipse(&mut self, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32) {}
        fn close_path(&mut self) {}
        fn set_fill(&mut self, _: Paint) {}
        fn set_stroke(&mut self, _: Paint, _: f32) {}
        fn set_shadow(&mut self, _: Option<Shadow>) {}
        fn set_global_alpha(&mut self, _: f32) {}
        fn fill(&mut self) {}
        fn stroke(&mut self) {}
        fn clip(&mut self) {}
    }

    fn nested_early_return(canvas: &mut DepthCanvas, bail: bool) -> i32 {
        let mut outer = canvas.scoped();
        let mut inner = outer.scoped();
        if bail {
            return inner.depth;
        }
        inner.translate(1.0, 1.0);
        inner.depth
    }

    #[test]
    fn test_scoped_restores_on_every_path() {
        let mut canvas = DepthCanvas::default();
        assert_eq!(nested_early_return(&mut canvas, true), 2);
        assert_eq!(canvas.depth, 0);
        assert_eq!(nested_early_return(&mut canvas, false), 2);
        assert_eq!(canvas.depth, 0);
    }
}
