//! Software Raster
//!
//! An RGBA pixel surface implementing [`Canvas`]. Used by the in-process
//! stage for synthesized textures and by the terminal surface to compose a
//! frame before it is converted to half-block cells.
//!
//! # Rendering model
//!
//! - Pixels are premultiplied RGBA in an [`RgbaImage`], borrowed as a
//!   `tiny_skia` surface for every draw
//! - Paths are built as a `kurbo` [`BezPath`] in device space; arcs and
//!   ellipses come from [`kurbo::Arc`]
//! - Fills, strokes, gradients and clip masks are `tiny_skia` operations
//! - A shadow repaints the shape at its offset in the shadow color, with a
//!   half-strength stroke of the blur width as a soft edge
//! - Sprite regions are downscaled with `image` before they are composited

use std::f64::consts::TAU;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use image::imageops::{self, FilterType};
use image::{ImageResult, Rgba, RgbaImage};
use kurbo::{Affine, BezPath, PathEl, Point, Vec2};
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, GradientStop, LineCap, LineJoin, LinearGradient, Mask,
    PixmapMut, PixmapPaint, PixmapRef, PremultipliedColorU8, RadialGradient, Shader, SpreadMode,
    Stroke, Transform,
};

use crate::canvas::{Canvas, Color, Gradient, Paint, Shadow};
use crate::host::FrameRect;

/// Flattening tolerance for arcs, in user units
const ARC_TOLERANCE: f64 = 0.1;

#[derive(Clone)]
struct DrawState {
    transform: Affine,
    fill: Paint,
    stroke: Paint,
    line_width: f32,
    shadow: Option<Shadow>,
    alpha: f32,
    clip: Option<Rc<Mask>>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            fill: Paint::Solid(Color::rgb(0, 0, 0)),
            stroke: Paint::Solid(Color::rgb(0, 0, 0)),
            line_width: 1.0,
            shadow: None,
            alpha: 1.0,
            clip: None,
        }
    }
}

/// Where the current subpath starts and ends, in device space
#[derive(Clone, Copy, Debug)]
struct Cursor {
    start: Point,
    current: Point,
    closed: bool,
}

/// RGBA software canvas
#[derive(Clone)]
pub struct Raster {
    pixels: RgbaImage,
    state: DrawState,
    stack: Vec<DrawState>,
    path: BezPath,
    cursor: Option<Cursor>,
    draw_ops: u64,
}

impl Raster {
    /// Create a transparent raster
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            state: DrawState::default(),
            stack: Vec::new(),
            path: BezPath::new(),
            cursor: None,
            draw_ops: 0,
        }
    }

    /// Wrap a decoded (straight alpha) image
    #[must_use]
    pub fn from_image(mut pixels: RgbaImage) -> Self {
        for pixel in pixels.pixels_mut() {
            let Rgba([r, g, b, a]) = *pixel;
            let p = ColorU8::from_rgba(r, g, b, a).premultiply();
            *pixel = Rgba([p.red(), p.green(), p.blue(), p.alpha()]);
        }
        let mut raster = Self::new(0, 0);
        raster.pixels = pixels;
        raster
    }

    /// Width in pixels
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Pixel at a position (transparent when out of bounds)
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        if x >= self.width() || y >= self.height() {
            return Color::transparent();
        }
        let Rgba([r, g, b, a]) = *self.pixels.get_pixel(x, y);
        demultiply(r, g, b, a)
    }

    /// Number of fill/stroke operations performed so far
    #[must_use]
    pub fn draw_ops(&self) -> u64 {
        self.draw_ops
    }

    /// Fill the whole surface, ignoring transform and clip
    pub fn clear(&mut self, color: Color) {
        let p = ColorU8::from_rgba(color.r, color.g, color.b, color.a).premultiply();
        for pixel in self.pixels.pixels_mut() {
            *pixel = Rgba([p.red(), p.green(), p.blue(), p.alpha()]);
        }
    }

    /// Save the surface as a PNG file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be encoded or written.
    pub fn save_png(&self, path: impl AsRef<Path>) -> ImageResult<()> {
        let mut straight = self.pixels.clone();
        for pixel in straight.pixels_mut() {
            let Rgba([r, g, b, a]) = *pixel;
            let c = demultiply(r, g, b, a);
            *pixel = Rgba([c.r, c.g, c.b, c.a]);
        }
        straight.save(path)
    }

    /// Draw a region of another raster scaled into a device rectangle
    ///
    /// The region is area-filtered down to the target size first, so large
    /// downscales stay smooth. `alpha` multiplies the source opacity;
    /// transform, clip and shadow are not applied.
    pub fn draw_region(&mut self, source: &Raster, src: FrameRect, dest: (f32, f32, f32, f32), alpha: f32) {
        let (dx, dy, dw, dh) = dest;
        if src.x >= source.width() || src.y >= source.height() {
            return;
        }
        if src.width == 0 || src.height == 0 || dw <= 0.0 || dh <= 0.0 || alpha <= 0.0 {
            return;
        }
        let width = src.width.min(source.width() - src.x);
        let height = src.height.min(source.height() - src.y);
        let (tw, th) = (dw.ceil().max(1.0) as u32, dh.ceil().max(1.0) as u32);

        let region = imageops::crop_imm(&source.pixels, src.x, src.y, width, height).to_image();
        let scaled = imageops::resize(&region, tw, th, FilterType::Triangle);
        let Some(sprite) = PixmapRef::from_bytes(scaled.as_raw(), tw, th) else {
            return;
        };
        let paint = PixmapPaint {
            opacity: alpha.min(1.0),
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        let transform = Transform::from_row(dw / tw as f32, 0.0, 0.0, dh / th as f32, dx, dy);
        if let Some(mut surface) = surface(&mut self.pixels) {
            surface.draw_pixmap(0, 0, sprite, &paint, transform, None);
        }
    }

    // ------------------------------------------------------------------
    // Path helpers
    // ------------------------------------------------------------------

    fn device(&self, x: f32, y: f32) -> Point {
        self.state.transform * Point::new(f64::from(x), f64::from(y))
    }

    fn start_subpath(&mut self, at: Point) {
        self.path.move_to(at);
        self.cursor = Some(Cursor {
            start: at,
            current: at,
            closed: false,
        });
    }

    /// Make sure a subpath is open before a segment is added
    ///
    /// With no current point the subpath starts at `fallback`; after a close
    /// it restarts from the closed subpath's start.
    fn open_subpath(&mut self, fallback: Point) -> Point {
        match self.cursor {
            None => {
                self.start_subpath(fallback);
                fallback
            }
            Some(Cursor { start, closed: true, .. }) => {
                self.start_subpath(start);
                start
            }
            Some(Cursor { current, .. }) => current,
        }
    }

    fn advance_to(&mut self, to: Point) {
        if let Some(cursor) = &mut self.cursor {
            cursor.current = to;
        }
    }

    /// Append an elliptical arc (user space) joined to the current point
    fn push_arc(&mut self, arc: kurbo::Arc) {
        let (sin, cos) = arc.start_angle.sin_cos();
        let (sin_r, cos_r) = arc.x_rotation.sin_cos();
        let (lx, ly) = (arc.radii.x * cos, arc.radii.y * sin);
        let start = arc.center + Vec2::new(lx * cos_r - ly * sin_r, lx * sin_r + ly * cos_r);
        let start = self.state.transform * start;

        let current = self.open_subpath(start);
        if current != start {
            self.path.line_to(start);
        }
        let transform = self.state.transform;
        let mut end = start;
        for el in arc.append_iter(ARC_TOLERANCE) {
            if let PathEl::CurveTo(a, b, c) = el {
                end = transform * c;
                self.path.curve_to(transform * a, transform * b, end);
            }
        }
        self.advance_to(end);
    }

    fn draw(&mut self, stroke: Option<Stroke>) {
        self.draw_ops += 1;
        let Some(path) = to_skia_path(&self.path) else {
            return;
        };
        let ctm = to_transform(self.state.transform);
        let alpha = self.state.alpha;
        let paint = match &stroke {
            None => &self.state.fill,
            Some(_) => &self.state.stroke,
        };
        let Some(paint) = skia_paint(paint, alpha, ctm) else {
            return;
        };

        // Strokes are drawn in user space so the current transform scales the width
        let (geometry, base) = match &stroke {
            None => (path.clone(), Transform::identity()),
            Some(_) => {
                if self.state.transform.determinant().abs() < 1e-9 {
                    return;
                }
                let Some(user) = path.clone().transform(to_transform(self.state.transform.inverse())) else {
                    return;
                };
                (user, ctm)
            }
        };

        let mask = self.state.clip.clone();
        let mask = mask.as_deref();
        let shadow = self.state.shadow.filter(|s| !s.color.is_transparent());
        let Some(mut surface) = surface(&mut self.pixels) else {
            return;
        };

        if let Some(shadow) = shadow {
            let offset = Transform::from_translate(shadow.offset.0, shadow.offset.1);
            let solid = solid_paint(shadow.color, alpha);
            match &stroke {
                None => surface.fill_path(&geometry, &solid, FillRule::Winding, offset, mask),
                Some(s) => surface.stroke_path(&geometry, &solid, s, offset.pre_concat(base), mask),
            }
            if shadow.blur > 0.0 {
                let edge = Stroke {
                    width: shadow.blur,
                    line_join: LineJoin::Round,
                    ..Stroke::default()
                };
                let soft = solid_paint(shadow.color, alpha * 0.5);
                surface.stroke_path(&path, &soft, &edge, offset, mask);
            }
        }

        match &stroke {
            None => surface.fill_path(&geometry, &paint, FillRule::Winding, base, mask),
            Some(s) => surface.stroke_path(&geometry, &paint, s, base, mask),
        }
    }
}

impl fmt::Debug for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("saved", &self.stack.len())
            .field("draw_ops", &self.draw_ops)
            .finish_non_exhaustive()
    }
}

/// Borrow the pixels as a drawing surface (`None` for an empty raster)
fn surface(pixels: &mut RgbaImage) -> Option<PixmapMut<'_>> {
    let (width, height) = pixels.dimensions();
    PixmapMut::from_bytes(&mut **pixels, width, height)
}

fn demultiply(r: u8, g: u8, b: u8, a: u8) -> Color {
    PremultipliedColorU8::from_rgba(r.min(a), g.min(a), b.min(a), a).map_or(Color::transparent(), |p| {
        let c = p.demultiply();
        Color::rgba(c.red(), c.green(), c.blue(), c.alpha())
    })
}

fn to_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut builder = tiny_skia::PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(c, p) => builder.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(a, b, p) => builder.cubic_to(
                a.x as f32, a.y as f32, b.x as f32, b.y as f32, p.x as f32, p.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}

fn skia_color(color: Color, alpha: f32) -> tiny_skia::Color {
    let a = (f32::from(color.a) * alpha.clamp(0.0, 1.0)).round() as u8;
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, a)
}

fn solid_paint(color: Color, alpha: f32) -> tiny_skia::Paint<'static> {
    let mut paint = tiny_skia::Paint::default();
    paint.set_color(skia_color(color, alpha));
    paint.anti_alias = true;
    paint
}

fn gradient_stops(gradient: &Gradient, alpha: f32) -> Vec<GradientStop> {
    gradient
        .stops
        .iter()
        .map(|stop| GradientStop::new(stop.offset, skia_color(stop.color, alpha)))
        .collect()
}

/// Gradient geometry stays in user space: the shader carries the transform
fn skia_paint(paint: &Paint, alpha: f32, ctm: Transform) -> Option<tiny_skia::Paint<'static>> {
    let shader = match paint {
        Paint::Solid(color) => Shader::SolidColor(skia_color(*color, alpha)),
        Paint::Linear(g) => LinearGradient::new(
            tiny_skia::Point::from_xy(g.start.0, g.start.1),
            tiny_skia::Point::from_xy(g.end.0, g.end.1),
            gradient_stops(g, alpha),
            SpreadMode::Pad,
            ctm,
        )?,
        Paint::Radial(g) => RadialGradient::new(
            tiny_skia::Point::from_xy(g.start.0, g.start.1),
            tiny_skia::Point::from_xy(g.start.0, g.start.1),
            g.radius.max(f32::EPSILON),
            gradient_stops(g, alpha),
            SpreadMode::Pad,
            ctm,
        )?,
    };
    Some(tiny_skia::Paint {
        shader,
        anti_alias: true,
        ..tiny_skia::Paint::default()
    })
}

/// Canvas sweep rules: clockwise sweeps are wrapped into `0..=TAU`,
/// anticlockwise ones into `-TAU..=0`
fn normalize_sweep(start: f32, end: f32, anticlockwise: bool) -> f64 {
    let sweep = f64::from(end - start);
    if anticlockwise {
        if sweep <= -TAU {
            -TAU
        } else if sweep > 0.0 {
            sweep.rem_euclid(TAU) - TAU
        } else {
            sweep
        }
    } else if sweep >= TAU {
        TAU
    } else if sweep < 0.0 {
        sweep.rem_euclid(TAU)
    } else {
        sweep
    }
}

impl Canvas for Raster {
    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.state.transform =
            self.state.transform * Affine::translate((f64::from(x), f64::from(y)));
    }

    fn rotate(&mut self, radians: f32) {
        self.state.transform = self.state.transform * Affine::rotate(f64::from(radians));
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.state.transform =
            self.state.transform * Affine::scale_non_uniform(f64::from(sx), f64::from(sy));
    }

    fn begin_path(&mut self) {
        self.path = BezPath::new();
        self.cursor = None;
    }

    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.device(x, y);
        self.start_subpath(p);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.device(x, y);
        // Without a current point this only starts a subpath
        let had_point = self.cursor.is_some();
        self.open_subpath(p);
        if had_point {
            self.path.line_to(p);
        }
        self.advance_to(p);
    }

    fn quadratic_curve_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        let control = self.device(cx, cy);
        let p = self.device(x, y);
        self.open_subpath(control);
        self.path.quad_to(control, p);
        self.advance_to(p);
    }

    fn arc(&mut self, cx: f32, cy: f32, radius: f32, start: f32, end: f32, anticlockwise: bool) {
        let radius = f64::from(radius);
        self.push_arc(kurbo::Arc {
            center: Point::new(f64::from(cx), f64::from(cy)),
            radii: Vec2::new(radius, radius),
            start_angle: f64::from(start),
            sweep_angle: normalize_sweep(start, end, anticlockwise),
            x_rotation: 0.0,
        });
    }

    fn ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, rotation: f32, start: f32, end: f32) {
        self.push_arc(kurbo::Arc {
            center: Point::new(f64::from(cx), f64::from(cy)),
            radii: Vec2::new(f64::from(rx), f64::from(ry)),
            start_angle: f64::from(start),
            sweep_angle: normalize_sweep(start, end, false),
            x_rotation: f64::from(rotation),
        });
    }

    fn close_path(&mut self) {
        if let Some(cursor) = &mut self.cursor {
            if !cursor.closed {
                self.path.close_path();
                cursor.closed = true;
                cursor.current = cursor.start;
            }
        }
    }

    fn set_fill(&mut self, paint: Paint) {
        self.state.fill = paint;
    }

    fn set_stroke(&mut self, paint: Paint, width: f32) {
        self.state.stroke = paint;
        self.state.line_width = width.max(0.0);
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.state.shadow = shadow;
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    fn fill(&mut self) {
        self.draw(None);
    }

    fn stroke(&mut self) {
        if self.state.line_width <= 0.0 {
            return;
        }
        self.draw(Some(Stroke {
            width: self.state.line_width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        }));
    }

    fn clip(&mut self) {
        let (width, height) = self.pixels.dimensions();
        let path = to_skia_path(&self.path);
        let mask = match (&self.state.clip, path) {
            (Some(existing), Some(path)) => {
                let mut mask = Mask::clone(existing);
                mask.intersect_path(&path, FillRule::Winding, true, Transform::identity());
                Some(mask)
            }
            (None, Some(path)) => Mask::new(width, height).map(|mut mask| {
                mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
                mask
            }),
            // An empty path clips everything away
            (_, None) => Mask::new(width, height),
        };
        if let Some(mask) = mask {
            self.state.clip = Some(Rc::new(mask));
        }
    }
}
