//! Host Runtime Seam
//!
//! The presenter and synthesizer never talk to a renderer directly. They are
//! written against these traits, which any scene runtime can implement:
//!
//! - [`Scene`] - retained nodes (groups, sprites, text, shapes) and viewport
//! - [`Tweens`] - property interpolation with easing, yoyo and repeat
//! - [`Timers`] - one-shot deferred calls
//! - [`Assets`] - textures, canvases, named frames and frame sequences
//!
//! # Events
//!
//! Completion callbacks are not closures. The host reports them as
//! [`HostEvent`] values and whoever owns the update loop hands each event to
//! the interested component (see `Presenter::handle_event`). This keeps all
//! presenter state single-owner with no shared interior mutability.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::animation::{FrameSequence, TweenSpec};
use crate::canvas::{Canvas, Color};

/// Handle to a scene node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Handle to a running tween
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(pub u64);

/// Handle to a pending deferred call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Animatable node property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Property {
    /// Horizontal position relative to the parent
    X,
    /// Vertical position relative to the parent
    Y,
    /// Opacity, 0.0..=1.0
    Alpha,
    /// Horizontal scale
    ScaleX,
    /// Vertical scale
    ScaleY,
}

/// Pixel rectangle within a texture
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FrameRect {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Styling for text nodes
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Glyph size in logical pixels
    pub size_px: f32,
    /// Fill color
    pub color: Color,
    /// Outline color and width, if any
    pub stroke: Option<(Color, f32)>,
    /// Word-wrap width in logical pixels
    pub wrap_width: f32,
}

/// Vector decoration drawn by the host
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Disc fading from `color` at the center to transparent at `radius`
    Glow { radius: f32, color: Color },
    /// Stroked circle outline
    Ring { radius: f32, color: Color, width: f32 },
}

/// What kind of node to create
///
/// Sprites and text are drawn centered horizontally on their position;
/// sprites are also centered vertically, text hangs down from it.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Positioned container; children inherit its offset, alpha and visibility
    Group,
    /// Textured quad with a fixed display size
    Sprite {
        texture: String,
        frame: Option<String>,
        width: f32,
        height: f32,
    },
    /// Word-wrapped text block
    Text { content: String, style: TextStyle },
    /// Vector decoration
    Shape(Shape),
}

/// Callback-style notifications produced while the host advances
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostEvent {
    /// A finite tween reached its end (never sent for infinite or stopped tweens)
    TweenCompleted(TweenId),
    /// A deferred call came due (never sent for cancelled timers)
    TimerFired(TimerId),
}

/// Retained scene graph
///
/// Operations on unknown or destroyed nodes are silently ignored.
pub trait Scene {
    /// Viewport size in logical pixels
    fn viewport(&self) -> (f32, f32);

    /// Create a node under `parent` (or at the root) at a local position
    fn spawn(&mut self, parent: Option<NodeId>, kind: NodeKind, x: f32, y: f32) -> NodeId;
    /// Destroy a node and all of its descendants
    fn destroy(&mut self, node: NodeId);
    /// Whether a node is still alive
    fn exists(&self, node: NodeId) -> bool;

    /// Write a property
    fn set(&mut self, node: NodeId, property: Property, value: f32);
    /// Read a property (`None` for unknown nodes)
    fn get(&self, node: NodeId, property: Property) -> Option<f32>;

    /// Show or hide a node and its subtree
    fn set_visible(&mut self, node: NodeId, visible: bool);
    /// Whether a node is flagged visible
    fn is_visible(&self, node: NodeId) -> bool;

    /// Point a sprite at a texture (and optionally a named frame), stopping playback
    fn set_texture(&mut self, node: NodeId, texture: &str, frame: Option<&str>);
    /// Start a registered frame sequence on a sprite; `false` when unknown
    fn play(&mut self, node: NodeId, animation: &str) -> bool;
    /// Change the wrap width of a text node
    fn set_wrap_width(&mut self, node: NodeId, width: f32);
}

/// Property interpolation scheduler
pub trait Tweens {
    /// Start a tween; start values are captured now
    fn add_tween(&mut self, spec: TweenSpec) -> TweenId;
    /// Stop a tween where it is; no completion event is sent
    fn stop_tween(&mut self, id: TweenId);
}

/// One-shot deferred calls
pub trait Timers {
    /// Schedule a `TimerFired` event after `delay`
    fn delayed_call(&mut self, delay: Duration) -> TimerId;
    /// Cancel a pending call; unknown ids are ignored
    fn cancel_timer(&mut self, id: TimerId);
}

/// Texture and animation registry
pub trait Assets {
    /// Drawing surface handed out by `create_canvas`
    type Canvas: Canvas;

    /// Whether a texture (image or canvas) is registered under `key`
    fn has_texture(&self, key: &str) -> bool;
    /// Register a blank canvas texture
    ///
    /// Returns `None` when `key` is already taken, so only the first caller
    /// ever gets to draw.
    fn create_canvas(&mut self, key: &str, width: u32, height: u32) -> Option<&mut Self::Canvas>;
    /// Name a region of a texture
    fn add_frame(&mut self, texture: &str, name: &str, rect: FrameRect);
    /// Whether a frame sequence is registered under `key`
    fn has_animation(&self, key: &str) -> bool;
    /// Register a frame sequence; returns `false` (and keeps the old one) on duplicates
    fn add_animation(&mut self, sequence: FrameSequence) -> bool;
}

/// Everything the presenter needs from its runtime
pub trait Host: Scene + Tweens + Timers + Assets {}

impl<T: Scene + Tweens + Timers + Assets> Host for T {}
