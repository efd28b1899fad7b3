//! Procedural Sprite Sheet
//!
//! Draws the fallback companion used when no pre-authored images exist: one
//! row per expression, [`FRAMES_PER_EXPRESSION`] columns of [`CELL_SIZE`]
//! cells, then registers a named frame per cell and one looping frame
//! sequence per expression.
//!
//! Synthesis is admitted once per host. The sheet canvas is created through
//! [`Assets::create_canvas`], which refuses existing keys, so a second call
//! draws nothing; animations already registered are skipped the same way.
//!
//! # Figure
//!
//! Every cell is drawn in a frame translated to the cell center, then bobbed
//! and leaned by the frame's [`Pose`]. Back to front: robe, vest, belt,
//! head, turban, eyes, mouth, arms.

use std::f32::consts::{PI, TAU};

use tracing::{debug, info};

use crate::animation::{FrameSequence, Repeat};
use crate::canvas::{Canvas, CanvasExt, Color, Paint, Shadow};
use crate::expression::Expression;
use crate::host::{Assets, FrameRect};

/// Texture key of the synthesized sheet
pub const SHEET_KEY: &str = "companion.sheet";
/// Edge of one square cell in px
pub const CELL_SIZE: u32 = 128;
/// Columns per expression row
pub const FRAMES_PER_EXPRESSION: usize = 3;

const BOB_AMPLITUDE: f32 = 3.0;
const WAVE_AMPLITUDE: f32 = 0.35;

const UPPER_ARM: f32 = 20.0;
const FOREARM: f32 = 18.0;
const SHOULDER: (f32, f32) = (24.0, -10.0);

const ROBE: Color = Color::rgb(238, 230, 214);
const ROBE_SHADE: Color = Color::rgb(214, 204, 186);
const VEST_TOP: Color = Color::rgb(52, 98, 150);
const VEST_BOTTOM: Color = Color::rgb(28, 58, 98);
const TRIM: Color = Color::rgb(214, 170, 80);
const BELT_LIGHT: Color = Color::rgb(186, 128, 58);
const BELT_DARK: Color = Color::rgb(128, 82, 30);
const SKIN: Color = Color::rgb(222, 172, 128);
const TURBAN: Color = Color::rgb(250, 246, 236);
const INK: Color = Color::rgb(42, 28, 20);
const LIPS: Color = Color::rgb(122, 52, 40);

/// What happened during a synthesis call
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SynthesisReport {
    /// The sheet was drawn by this call
    pub drew_sheet: bool,
    /// Named frames registered by this call
    pub frames_registered: usize,
    /// Frame sequences registered by this call
    pub animations_registered: usize,
}

impl SynthesisReport {
    /// Nothing was created
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.drew_sheet && self.frames_registered == 0 && self.animations_registered == 0
    }
}

/// Per-frame body offsets derived from the frame phase
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// Vertical offset of the whole figure
    pub bob: f32,
    /// Body rotation in radians
    pub lean: f32,
    /// Forearm oscillation for the wave pose
    pub wave: f32,
}

/// Pose of `expression` at column `frame`
#[must_use]
pub fn pose(expression: Expression, frame: usize) -> Pose {
    let t = frame as f32 / FRAMES_PER_EXPRESSION as f32;
    let swing = (TAU * t).sin();
    let amplitude = match expression {
        Expression::Think => BOB_AMPLITUDE / 2.0,
        _ => BOB_AMPLITUDE,
    };
    let lean = match expression {
        Expression::Greet => 0.03,
        Expression::Encourage => -0.02,
        Expression::Think => 0.06,
        Expression::Warning => -0.04,
        Expression::Success => 0.0,
    };
    Pose {
        bob: swing * amplitude,
        lean,
        wave: if expression == Expression::Greet {
            swing * WAVE_AMPLITUDE
        } else {
            0.0
        },
    }
}

/// Sheet dimensions in px
#[must_use]
pub fn sheet_size() -> (u32, u32) {
    (
        CELL_SIZE * FRAMES_PER_EXPRESSION as u32,
        CELL_SIZE * Expression::ALL.len() as u32,
    )
}

/// Cell of `expression` at column `frame`
#[must_use]
pub fn frame_rect(expression: Expression, frame: usize) -> FrameRect {
    FrameRect::new(
        frame as u32 * CELL_SIZE,
        expression.row() as u32 * CELL_SIZE,
        CELL_SIZE,
        CELL_SIZE,
    )
}

/// Looping sequence over one expression's row
#[must_use]
pub fn sequence(expression: Expression) -> FrameSequence {
    FrameSequence {
        key: expression.animation_key(),
        texture: SHEET_KEY.to_string(),
        frames: (0..FRAMES_PER_EXPRESSION)
            .map(|i| expression.frame_name(i))
            .collect(),
        frame_rate: expression.frame_rate(),
        repeat: Repeat::Infinite,
    }
}

/// Draw the sheet and register its frames and animations, once
pub fn ensure_sheet<A: Assets + ?Sized>(assets: &mut A) -> SynthesisReport {
    let mut report = SynthesisReport::default();
    let (width, height) = sheet_size();

    if let Some(canvas) = assets.create_canvas(SHEET_KEY, width, height) {
        draw_sheet(canvas);
        report.drew_sheet = true;
    } else {
        debug!(key = SHEET_KEY, "sheet already present, skipping draw");
    }

    if report.drew_sheet {
        for expression in Expression::ALL {
            for frame in 0..FRAMES_PER_EXPRESSION {
                assets.add_frame(
                    SHEET_KEY,
                    &expression.frame_name(frame),
                    frame_rect(expression, frame),
                );
                report.frames_registered += 1;
            }
        }
    }

    for expression in Expression::ALL {
        if assets.has_animation(&expression.animation_key()) {
            continue;
        }
        if assets.add_animation(sequence(expression)) {
            report.animations_registered += 1;
        }
    }

    if !report.is_noop() {
        info!(
            frames = report.frames_registered,
            animations = report.animations_registered,
            width,
            height,
            "synthesized companion sheet"
        );
    }
    report
}

/// Paint every cell of the sheet
pub fn draw_sheet<C: Canvas + ?Sized>(canvas: &mut C) {
    let half = CELL_SIZE as f32 / 2.0;
    for expression in Expression::ALL {
        for frame in 0..FRAMES_PER_EXPRESSION {
            let rect = frame_rect(expression, frame);
            draw_cell(
                canvas,
                expression,
                frame,
                rect.x as f32 + half,
                rect.y as f32 + half,
            );
        }
    }
}

/// Paint one figure centered on `(cx, cy)`
pub fn draw_cell<C: Canvas + ?Sized>(canvas: &mut C, expression: Expression, frame: usize, cx: f32, cy: f32) {
    let pose = pose(expression, frame);
    let mut c = canvas.scoped();
    c.translate(cx, cy + pose.bob);
    c.rotate(pose.lean);

    draw_robe(&mut *c);
    draw_vest(&mut *c);
    draw_belt(&mut *c);
    draw_head(&mut *c);
    draw_turban(&mut *c);
    draw_eyes(&mut *c, expression);
    draw_mouth(&mut *c, expression);
    draw_arms(&mut *c, expression, pose);
}

fn draw_robe<C: Canvas + ?Sized>(c: &mut C) {
    let mut c = c.scoped();
    c.set_shadow(Some(Shadow {
        color: Color::rgba(20, 10, 0, 90),
        blur: 6.0,
        offset: (0.0, 3.0),
    }));
    c.set_fill(ROBE.into());
    c.begin_path();
    c.move_to(-26.0, -14.0);
    c.quadratic_curve_to(-40.0, -10.0, -38.0, 20.0);
    c.line_to(-40.0, 48.0);
    c.quadratic_curve_to(0.0, 53.0, 40.0, 48.0);
    c.line_to(38.0, 20.0);
    c.quadratic_curve_to(40.0, -10.0, 26.0, -14.0);
    c.close_path();
    c.fill();
}

fn draw_vest<C: Canvas + ?Sized>(c: &mut C) {
    c.set_fill(Paint::linear(
        (0.0, -12.0),
        (0.0, 30.0),
        &[(0.0, VEST_TOP), (1.0, VEST_BOTTOM)],
    ));
    c.begin_path();
    c.move_to(-22.0, -12.0);
    c.line_to(-6.0, -12.0);
    c.line_to(0.0, 4.0);
    c.line_to(6.0, -12.0);
    c.line_to(22.0, -12.0);
    c.line_to(28.0, 28.0);
    c.line_to(-28.0, 28.0);
    c.close_path();
    c.fill();
    c.set_stroke(TRIM.into(), 1.5);
    c.stroke();
}

fn draw_belt<C: Canvas + ?Sized>(c: &mut C) {
    c.set_fill(Paint::linear(
        (-30.0, 0.0),
        (30.0, 0.0),
        &[(0.0, BELT_DARK), (0.5, BELT_LIGHT), (1.0, BELT_DARK)],
    ));
    c.fill_rect(-30.0, 24.0, 60.0, 8.0);
    c.set_fill(TRIM.into());
    c.fill_rect(-3.0, 24.0, 6.0, 8.0);
}

fn draw_head<C: Canvas + ?Sized>(c: &mut C) {
    c.set_fill(Color::rgba(60, 30, 10, 70).into());
    c.begin_path();
    c.full_ellipse(2.0, -28.0, 17.0, 19.0);
    c.fill();

    c.set_fill(Paint::radial(
        (-4.0, -34.0),
        24.0,
        &[(0.0, Color::rgb(236, 190, 148)), (1.0, SKIN)],
    ));
    c.begin_path();
    c.full_ellipse(0.0, -30.0, 17.0, 19.0);
    c.fill();
}

fn draw_turban<C: Canvas + ?Sized>(c: &mut C) {
    c.set_fill(TURBAN.into());
    c.begin_path();
    c.full_ellipse(0.0, -46.0, 22.0, 13.0);
    c.fill();
    c.set_stroke(ROBE_SHADE.into(), 1.0);
    c.stroke();

    // Highlight stays inside the wrap
    let mut c = c.scoped();
    c.begin_path();
    c.full_ellipse(0.0, -46.0, 22.0, 13.0);
    c.clip();
    c.set_stroke(Color::rgba(255, 255, 255, 220).into(), 3.0);
    c.begin_path();
    c.arc(-4.0, -40.0, 16.0, PI * 1.1, PI * 1.7, false);
    c.stroke();
}

fn draw_eyes<C: Canvas + ?Sized>(c: &mut C, expression: Expression) {
    let (spacing, scale) = match expression {
        Expression::Think => (6.0, 0.8),
        Expression::Warning => (8.5, 1.2),
        _ => (7.0, 1.0),
    };
    c.set_fill(INK.into());
    c.begin_path();
    c.full_ellipse(-spacing, -31.0, 2.2 * scale, 2.8 * scale);
    c.full_ellipse(spacing, -31.0, 2.2 * scale, 2.8 * scale);
    c.fill();
}

fn draw_mouth<C: Canvas + ?Sized>(c: &mut C, expression: Expression) {
    c.set_stroke(LIPS.into(), 1.8);
    c.begin_path();
    match expression {
        Expression::Greet | Expression::Encourage | Expression::Success => {
            c.arc(0.0, -25.0, 6.0, PI * 0.2, PI * 0.8, false);
        }
        Expression::Think => {
            c.move_to(-3.5, -20.0);
            c.line_to(3.5, -20.0);
        }
        Expression::Warning => {
            c.arc(0.0, -16.0, 5.0, PI * 1.2, PI * 1.8, false);
        }
    }
    c.stroke();
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Hand {
    Open,
    ThumbUp,
}

/// Joint angles for one arm, radians from hanging straight down
#[derive(Clone, Copy, Debug)]
struct ArmPose {
    upper: f32,
    lower: f32,
    hand: Hand,
}

const REST: ArmPose = ArmPose {
    upper: -0.15,
    lower: 0.1,
    hand: Hand::Open,
};

fn arm_poses(expression: Expression, pose: Pose) -> (ArmPose, ArmPose) {
    let right = match expression {
        Expression::Greet => ArmPose {
            upper: -2.5,
            lower: 0.5 + pose.wave,
            hand: Hand::Open,
        },
        Expression::Encourage => ArmPose {
            upper: -0.6,
            lower: -2.4,
            hand: Hand::ThumbUp,
        },
        Expression::Think => ArmPose {
            upper: 0.5,
            lower: 1.9,
            hand: Hand::Open,
        },
        Expression::Warning => ArmPose {
            upper: -2.6,
            lower: -0.1,
            hand: Hand::Open,
        },
        Expression::Success => ArmPose {
            upper: -2.2,
            lower: -0.2,
            hand: Hand::Open,
        },
    };
    let left = if expression == Expression::Success {
        right
    } else {
        REST
    };
    (left, right)
}

fn draw_arms<C: Canvas + ?Sized>(c: &mut C, expression: Expression, pose: Pose) {
    let (left, right) = arm_poses(expression, pose);
    draw_arm(c, left, true);
    draw_arm(c, right, false);
}

fn draw_arm<C: Canvas + ?Sized>(c: &mut C, arm: ArmPose, mirrored: bool) {
    let mut c = c.scoped();
    if mirrored {
        c.scale(-1.0, 1.0);
    }
    c.translate(SHOULDER.0, SHOULDER.1);
    c.rotate(arm.upper);

    c.set_stroke(ROBE_SHADE.into(), 10.0);
    c.begin_path();
    c.move_to(0.0, 0.0);
    c.line_to(0.0, UPPER_ARM);
    c.stroke();

    c.translate(0.0, UPPER_ARM);
    c.rotate(arm.lower);
    c.set_stroke(ROBE.into(), 8.0);
    c.begin_path();
    c.move_to(0.0, 0.0);
    c.line_to(0.0, FOREARM);
    c.stroke();

    c.translate(0.0, FOREARM);
    c.set_fill(SKIN.into());
    c.begin_path();
    match arm.hand {
        Hand::Open => c.circle(0.0, 2.0, 5.0),
        Hand::ThumbUp => {
            c.move_to(-5.0, -3.0);
            c.line_to(5.0, -3.0);
            c.line_to(6.0, 4.0);
            c.line_to(2.0, 5.0);
            c.line_to(2.0, 12.0);
            c.line_to(-1.0, 12.0);
            c.line_to(-2.0, 5.0);
            c.line_to(-5.0, 4.0);
            c.close_path();
        }
    }
    c.fill();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Raster;
    use crate::stage::Stage;

    #[test]
    fn test_sheet_layout() {
        assert_eq!(sheet_size(), (384, 640));
        assert_eq!(
            frame_rect(Expression::Warning, 2),
            FrameRect::new(256, 384, 128, 128)
        );
    }

    #[test]
    fn test_pose_phase() {
        let first = pose(Expression::Greet, 0);
        assert!(first.bob.abs() < 1e-5);
        assert!(first.wave.abs() < 1e-5);

        let greet = pose(Expression::Greet, 1);
        let think = pose(Expression::Think, 1);
        assert!((think.bob * 2.0 - greet.bob).abs() < 1e-5);
        assert!(greet.wave != 0.0);
        assert_eq!(think.wave, 0.0);
    }

    #[test]
    fn test_sequence_references_row_in_order() {
        let seq = sequence(Expression::Think);
        assert_eq!(seq.key, "companion.think.loop");
        assert_eq!(seq.texture, SHEET_KEY);
        assert_eq!(seq.frames, vec!["think-0", "think-1", "think-2"]);
        assert_eq!(seq.repeat, Repeat::Infinite);
        assert_eq!(seq.frame_rate, 3.0);
    }

    #[test]
    fn test_cells_are_painted_and_separated() {
        let mut raster = Raster::new(CELL_SIZE * 2, CELL_SIZE);
        draw_cell(&mut raster, Expression::Greet, 0, 64.0, 64.0);

        // Something opaque near the middle of the robe
        assert!(raster.pixel(64, 90).a > 200);
        // Nothing spills into the neighbouring cell
        for y in 0..CELL_SIZE {
            for x in CELL_SIZE..CELL_SIZE * 2 {
                assert!(raster.pixel(x, y).is_transparent(), "spill at {x},{y}");
            }
        }
    }

    #[test]
    fn test_ensure_sheet_is_idempotent() {
        let mut stage = Stage::new(800.0, 600.0);

        let first = ensure_sheet(&mut stage);
        assert!(first.drew_sheet);
        assert_eq!(first.frames_registered, 15);
        assert_eq!(first.animations_registered, 5);

        let ops = stage.texture(SHEET_KEY).map(|t| t.raster().draw_ops());
        let second = ensure_sheet(&mut stage);
        assert!(second.is_noop());
        assert_eq!(stage.texture(SHEET_KEY).map(|t| t.raster().draw_ops()), ops);
        assert_eq!(stage.animation_count(), 5);
    }
}
