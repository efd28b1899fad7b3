//! Stage Renderer
//!
//! Turns the stage's node tree into terminal cells. Shapes and sprites are
//! composed into an offscreen [`Raster`] at one raster pixel per 8×8
//! logical pixels; each terminal cell then shows two stacked raster pixels
//! with the upper-half-block glyph. Captions are laid over the result as
//! real text so they stay readable.
//!
//! ```text
//!   logical px          raster            terminal
//!   ┌────────┐ 8×16    ┌──┐ 1×2          ┌─┐
//!   │        │ ──────▶ │▓▓│ ───────────▶ │▀│  fg = top, bg = bottom
//!   └────────┘         └──┘              └─┘
//! ```

use companion_core::{
    Canvas, CanvasExt, Color, NodeId, NodeKind, Paint, Raster, Shape, Stage, TextStyle,
};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use unicode_width::UnicodeWidthChar;

use crate::theme::{cell_color, BACKDROP};

/// Logical pixels per terminal column
pub const PX_PER_COL: f32 = 8.0;

/// Logical pixels per terminal row
pub const PX_PER_ROW: f32 = 16.0;

/// Logical pixels per raster pixel (both axes)
const PX_PER_DOT: f32 = 8.0;

/// Upper half block: fg paints the top half, bg the bottom
const HALF_BLOCK: char = '▀';

/// Stage viewport in logical pixels for a terminal area
#[must_use]
pub fn viewport_for(area: Rect) -> (f32, f32) {
    (
        f32::from(area.width) * PX_PER_COL,
        f32::from(area.height) * PX_PER_ROW,
    )
}

/// Accumulated parent transform while walking the tree
#[derive(Clone, Copy, Debug)]
struct Placement {
    x: f32,
    y: f32,
    scale: (f32, f32),
    alpha: f32,
}

impl Placement {
    const ROOT: Placement = Placement {
        x: 0.0,
        y: 0.0,
        scale: (1.0, 1.0),
        alpha: 1.0,
    };
}

/// A caption waiting to be laid over the composed frame
#[derive(Clone, Debug, PartialEq)]
struct Caption {
    x: f32,
    y: f32,
    content: String,
    style: TextStyle,
    alpha: f32,
}

/// Draws a [`Stage`] into a ratatui buffer
pub struct StageRenderer {
    frame: Raster,
    captions: Vec<Caption>,
    background: Color,
}

impl Default for StageRenderer {
    fn default() -> Self {
        Self::new(BACKDROP)
    }
}

impl StageRenderer {
    pub fn new(background: Color) -> Self {
        Self {
            frame: Raster::new(1, 2),
            captions: Vec::new(),
            background,
        }
    }

    /// Last composed frame (one pixel per 8×8 logical px)
    pub fn frame(&self) -> &Raster {
        &self.frame
    }

    /// Compose the stage and write it into `area` of `buf`
    pub fn render(&mut self, stage: &Stage, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let (w, h) = (u32::from(area.width), u32::from(area.height) * 2);
        if self.frame.width() != w || self.frame.height() != h {
            self.frame = Raster::new(w, h);
        }
        self.frame.clear(self.background);
        self.captions.clear();

        for &root in stage.roots() {
            self.draw_node(stage, root, Placement::ROOT);
        }

        self.blit(area, buf);
        for caption in std::mem::take(&mut self.captions) {
            self.draw_caption(&caption, area, buf);
        }
    }

    fn draw_node(&mut self, stage: &Stage, id: NodeId, parent: Placement) {
        let Some(node) = stage.node(id) else {
            return;
        };
        if !node.visible() {
            return;
        }
        let (nx, ny) = node.position();
        let (sx, sy) = node.scale();
        let here = Placement {
            x: parent.x + nx * parent.scale.0,
            y: parent.y + ny * parent.scale.1,
            scale: (parent.scale.0 * sx, parent.scale.1 * sy),
            alpha: parent.alpha * node.alpha(),
        };
        if here.alpha <= 0.0 {
            return;
        }

        match node.kind() {
            NodeKind::Group => {}
            NodeKind::Shape(shape) => self.draw_shape(*shape, here),
            NodeKind::Sprite {
                texture,
                frame,
                width,
                height,
            } => {
                let Some(texture) = stage.texture(texture) else {
                    return;
                };
                let rect = match frame {
                    Some(name) => match texture.frame(name) {
                        Some(rect) => rect,
                        None => return,
                    },
                    None => texture.bounds(),
                };
                let (w, h) = (width * here.scale.0, height * here.scale.1);
                let dest = (
                    (here.x - w / 2.0) / PX_PER_DOT,
                    (here.y - h / 2.0) / PX_PER_DOT,
                    w / PX_PER_DOT,
                    h / PX_PER_DOT,
                );
                self.frame.draw_region(texture.raster(), rect, dest, here.alpha);
            }
            NodeKind::Text { content, style } => self.captions.push(Caption {
                x: here.x,
                y: here.y,
                content: content.clone(),
                style: style.clone(),
                alpha: here.alpha,
            }),
        }

        for &child in stage.children(id) {
            self.draw_node(stage, child, here);
        }
    }

    fn draw_shape(&mut self, shape: Shape, at: Placement) {
        let mut canvas = self.frame.scoped();
        canvas.scale(1.0 / PX_PER_DOT, 1.0 / PX_PER_DOT);
        canvas.set_global_alpha(at.alpha);
        let scale = at.scale.0.max(at.scale.1);
        canvas.begin_path();
        match shape {
            Shape::Glow { radius, color } => {
                let radius = radius * scale;
                canvas.set_fill(Paint::radial(
                    (at.x, at.y),
                    radius,
                    &[(0.0, color), (1.0, color.with_alpha(0))],
                ));
                canvas.circle(at.x, at.y, radius);
                canvas.fill();
            }
            Shape::Ring {
                radius,
                color,
                width,
            } => {
                canvas.set_stroke(Paint::Solid(color), width * scale);
                canvas.circle(at.x, at.y, radius * scale);
                canvas.stroke();
            }
        }
    }

    fn blit(&self, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for col in 0..area.width {
                let top = self.frame.pixel(u32::from(col), u32::from(row) * 2);
                let bottom = self.frame.pixel(u32::from(col), u32::from(row) * 2 + 1);
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_char(HALF_BLOCK)
                        .set_fg(cell_color(top))
                        .set_bg(cell_color(bottom));
                }
            }
        }
    }

    /// Average of the two raster pixels behind a cell
    fn cell_background(&self, col: u16, row: u16) -> Color {
        let top = self.frame.pixel(u32::from(col), u32::from(row) * 2);
        let bottom = self.frame.pixel(u32::from(col), u32::from(row) * 2 + 1);
        top.lerp(bottom, 0.5)
    }

    fn draw_caption(&self, caption: &Caption, area: Rect, buf: &mut Buffer) {
        let columns = (caption.style.wrap_width / PX_PER_COL).floor().max(1.0) as usize;
        let ink = caption.style.color.with_alpha(255);
        let opacity = caption.alpha * f32::from(caption.style.color.a) / 255.0;
        let center = caption.x / PX_PER_COL;
        let top = (caption.y / PX_PER_ROW).floor() as i32;

        for (i, line) in textwrap::wrap(&caption.content, columns).iter().enumerate() {
            let row = top + i as i32;
            if row < 0 || row >= i32::from(area.height) {
                continue;
            }
            let width: usize = line.chars().filter_map(UnicodeWidthChar::width).sum();
            let mut col = (center - width as f32 / 2.0).round() as i32;

            for ch in line.chars() {
                let w = ch.width().unwrap_or(0) as i32;
                if w == 0 {
                    continue;
                }
                if col >= 0 && col + w <= i32::from(area.width) {
                    let (c, r) = (col as u16, row as u16);
                    let bg = self.cell_background(c, r);
                    let fg = bg.lerp(ink, opacity);
                    if let Some(cell) = buf.cell_mut((area.x + c, area.y + r)) {
                        cell.set_char(ch)
                            .set_fg(cell_color(fg))
                            .set_bg(cell_color(bg));
                    }
                    for extra in 1..w {
                        if let Some(cell) = buf.cell_mut((area.x + c + extra as u16, area.y + r)) {
                            cell.reset();
                        }
                    }
                }
                col += w;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use companion_core::{Expression, PresentationOptions, Presenter, PresenterConfig};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn row_text(buf: &Buffer, row: u16) -> String {
        (0..buf.area.width)
            .map(|col| buf[(col, row)].symbol().to_string())
            .collect()
    }

    fn settle(stage: &mut Stage, presenter: &mut Presenter) {
        for _ in 0..50 {
            for event in stage.advance(Duration::from_millis(16)) {
                presenter.handle_event(stage, event);
            }
        }
    }

    #[test]
    fn test_viewport_mapping() {
        assert_eq!(viewport_for(Rect::new(0, 0, 80, 24)), (640.0, 384.0));
    }

    #[test]
    fn test_empty_stage_is_backdrop() {
        let stage = Stage::new(320.0, 160.0);
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        StageRenderer::default().render(&stage, area, &mut buf);

        let cell = &buf[(5, 5)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, cell_color(BACKDROP));
        assert_eq!(cell.bg, cell_color(BACKDROP));
    }

    #[test]
    fn test_hidden_presenter_draws_nothing() {
        let area = Rect::new(0, 0, 80, 40);
        let (w, h) = viewport_for(area);
        let mut stage = Stage::new(w, h);
        let _presenter = Presenter::new(&mut stage, PresenterConfig::default());

        let mut buf = Buffer::empty(area);
        StageRenderer::default().render(&stage, area, &mut buf);
        assert!((0..area.height).all(|row| row_text(&buf, row).chars().all(|c| c == '▀')));
    }

    #[test]
    fn test_shown_presenter_draws_body_and_caption() {
        let area = Rect::new(0, 0, 80, 40);
        let (w, h) = viewport_for(area);
        let mut stage = Stage::new(w, h);
        let mut presenter = Presenter::new(&mut stage, PresenterConfig::default());
        presenter.show(
            &mut stage,
            Expression::Greet,
            &PresentationOptions::new().message("hello there"),
        );
        settle(&mut stage, &mut presenter);

        let mut buf = Buffer::empty(area);
        StageRenderer::default().render(&stage, area, &mut buf);

        // Anchor at (320, 278): column 40, row 17
        let body = &buf[(40, 17)];
        assert_ne!((body.fg, body.bg), (cell_color(BACKDROP), cell_color(BACKDROP)));

        // Caption hangs 104px below the anchor, within the float range
        let caption_rows: Vec<u16> = (0..area.height)
            .filter(|&row| row_text(&buf, row).contains("hello there"))
            .collect();
        assert_eq!(caption_rows, vec![23]);
    }

    #[test]
    fn test_caption_wraps_to_columns() {
        let area = Rect::new(0, 0, 20, 40);
        let (w, h) = viewport_for(area);
        let mut stage = Stage::new(w, h);
        let mut presenter = Presenter::new(&mut stage, PresenterConfig::default());
        // 160px viewport: wrap at 128px = 16 columns
        presenter.show(
            &mut stage,
            Expression::Think,
            &PresentationOptions::new().message("one two three four five"),
        );
        settle(&mut stage, &mut presenter);

        let mut buf = Buffer::empty(area);
        StageRenderer::default().render(&stage, area, &mut buf);
        let text: Vec<String> = (0..area.height)
            .map(|row| row_text(&buf, row).replace('▀', " ").trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();
        assert!(text.contains(&"one two three".to_string()), "{text:?}");
        assert!(text.contains(&"four five".to_string()), "{text:?}");
    }
}
