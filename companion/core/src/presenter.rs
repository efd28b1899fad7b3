//! Expression Presenter
//!
//! Owns the companion's group on the host scene (glow, body, ring, up to two
//! captions) and drives its transitions:
//!
//! - `show` - anchor, recreate captions, switch expression, restart idle
//!   motion, fade in, arm the auto-hide timer
//! - `hide` - tear down idle motion and captions at once, then fade out
//! - `resize` - re-anchor and re-wrap while visible
//!
//! # Lifecycle
//!
//! ```text
//!            show                 fade done
//!   Hidden ────────▶ FadingIn ─────────────▶ Shown
//!     ▲                │  ▲                    │
//!     │ fade done      │  │ show               │ hide / auto-hide
//!     │                ▼  │                    │
//!     └─────────── FadingOut ◀─────────────────┘
//! ```
//!
//! Completion of tweens and timers arrives through [`Presenter::handle_event`];
//! the presenter never holds a reference to the host between calls, so any
//! number of presenters can share one host.

use tracing::{debug, trace, warn};

use crate::animation::{AnimationSlot, EasingFunction, TweenSpec};
use crate::config::{PresenterConfig, ResizeAnchor};
use crate::expression::Expression;
use crate::host::{Host, HostEvent, NodeId, NodeKind, Property, Scene, TimerId, Timers, TweenId};
use crate::layout;
use crate::options::{PresentationOptions, Position};
use crate::synth;

/// Where the body's visuals come from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetMode {
    /// One pre-authored texture per expression
    Image,
    /// The synthesized sheet and its looping frame sequences
    Procedural,
}

/// Transition state of the group
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Invisible; no expression
    Hidden,
    /// Visible, opacity rising to 1
    FadingIn,
    /// Visible at full opacity
    Shown,
    /// Visible, opacity falling to 0; expression kept until the fade ends
    FadingOut,
}

#[derive(Clone, Copy, Debug)]
struct PendingHide {
    timer: TimerId,
    expected: Expression,
}

/// The on-screen companion
#[derive(Debug)]
pub struct Presenter {
    config: PresenterConfig,
    mode: AssetMode,

    group: NodeId,
    body: NodeId,
    primary: Option<NodeId>,
    secondary: Option<NodeId>,

    current: Option<Expression>,
    phase: Phase,
    position: Position,
    viewport: (f32, f32),
    anchor: (f32, f32),

    fade: AnimationSlot,
    float: AnimationSlot,
    breath: AnimationSlot,
    pending_hide: Option<PendingHide>,
}

/// Whether every per-expression image is registered
#[must_use]
pub fn images_available<H: Host + ?Sized>(host: &H) -> bool {
    Expression::ALL
        .iter()
        .all(|e| host.has_texture(&e.image_key()))
}

impl Presenter {
    /// Build the hidden group, synthesizing the sheet first when no images exist
    pub fn new<H: Host + ?Sized>(host: &mut H, config: PresenterConfig) -> Self {
        let mode = if !config.force_procedural && images_available(host) {
            AssetMode::Image
        } else {
            synth::ensure_sheet(host);
            AssetMode::Procedural
        };
        debug!(?mode, "creating presenter");

        let viewport = host.viewport();
        let position = Position::default();
        let anchor = layout::anchor(&config, position, viewport);

        let group = host.spawn(None, NodeKind::Group, anchor.0, anchor.1);

        let glow = host.spawn(
            Some(group),
            NodeKind::Shape(crate::host::Shape::Glow {
                radius: layout::GLOW_RADIUS,
                color: layout::GLOW_COLOR,
            }),
            0.0,
            layout::GLOW_Y,
        );
        host.set(glow, Property::Alpha, layout::GLOW_ALPHA);

        let (texture, frame) = match mode {
            AssetMode::Image => (Expression::Greet.image_key(), None),
            AssetMode::Procedural => (
                synth::SHEET_KEY.to_string(),
                Some(Expression::Greet.frame_name(0)),
            ),
        };
        let body = host.spawn(
            Some(group),
            NodeKind::Sprite {
                texture,
                frame,
                width: layout::BODY_SIZE,
                height: layout::BODY_SIZE,
            },
            0.0,
            0.0,
        );

        let ring = host.spawn(Some(group), NodeKind::Group, 0.0, 0.0);
        host.spawn(Some(ring), NodeKind::Shape(layout::RING_OUTER), 0.0, 0.0);
        host.spawn(Some(ring), NodeKind::Shape(layout::RING_INNER), 0.0, 0.0);

        host.set(group, Property::Alpha, 0.0);
        host.set_visible(group, false);

        Self {
            config,
            mode,
            group,
            body,
            primary: None,
            secondary: None,
            current: None,
            phase: Phase::Hidden,
            position,
            viewport,
            anchor,
            fade: AnimationSlot::default(),
            float: AnimationSlot::default(),
            breath: AnimationSlot::default(),
            pending_hide: None,
        }
    }

    /// Present `expression` with `options`
    pub fn show<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        expression: Expression,
        options: &PresentationOptions,
    ) {
        debug!(
            %expression,
            position = ?options.position,
            phase = ?self.phase,
            "show"
        );

        // 1. Anchor
        self.viewport = host.viewport();
        self.position = options.position;
        self.anchor = layout::anchor(&self.config, self.position, self.viewport);
        host.set(self.group, Property::X, self.anchor.0);

        // 2-3. Captions are always rebuilt, never edited
        self.destroy_captions(host);
        let wrap = layout::caption_wrap_width(&self.config, self.viewport.0);
        if let Some(message) = &options.message {
            self.primary = Some(host.spawn(
                Some(self.group),
                NodeKind::Text {
                    content: message.clone(),
                    style: layout::primary_caption_style(wrap),
                },
                0.0,
                layout::PRIMARY_CAPTION_Y,
            ));
        }
        if let Some(message) = &options.secondary_message {
            self.secondary = Some(host.spawn(
                Some(self.group),
                NodeKind::Text {
                    content: message.clone(),
                    style: layout::secondary_caption_style(wrap),
                },
                0.0,
                layout::SECONDARY_CAPTION_Y,
            ));
        }

        // 4. Expression
        let was_hidden = self.phase == Phase::Hidden;
        if was_hidden || self.current != Some(expression) {
            self.apply_expression(host, expression);
        }
        self.current = Some(expression);

        // 5. Idle motion, always restarted as a pair
        self.restart_idle(host);

        // 6. Fade in from wherever opacity is now
        if was_hidden {
            host.set(self.group, Property::Alpha, 0.0);
            host.set_visible(self.group, true);
        }
        let fade = self.config.motion.fade_duration(self.config.fade);
        self.fade.replace(
            host,
            TweenSpec::new(self.group, fade)
                .to(Property::Alpha, 1.0)
                .easing(EasingFunction::EaseOut),
        );
        self.phase = Phase::FadingIn;

        // 7. Auto-hide
        self.cancel_pending_hide(host);
        if let Some(delay) = options.auto_hide_after() {
            let timer = host.delayed_call(delay);
            self.pending_hide = Some(PendingHide {
                timer,
                expected: expression,
            });
            trace!(timer = timer.0, delay_ms = delay.as_millis() as u64, "auto-hide armed");
        }
    }

    /// Fade out and forget the current expression
    ///
    /// Idle motion, captions and any pending auto-hide are torn down before
    /// this returns; only the fade itself is asynchronous.
    pub fn hide<H: Host + ?Sized>(&mut self, host: &mut H) {
        match self.phase {
            Phase::Hidden | Phase::FadingOut => {
                trace!(phase = ?self.phase, "hide ignored");
                return;
            }
            Phase::Shown if host.get(self.group, Property::Alpha).unwrap_or(0.0) <= 0.0 => {
                trace!("hide ignored: already transparent");
                return;
            }
            Phase::FadingIn | Phase::Shown => {}
        }
        debug!(expression = ?self.current, "hide");

        self.float.clear(host);
        self.breath.clear(host);
        self.destroy_captions(host);
        self.cancel_pending_hide(host);

        let fade = self.config.motion.fade_duration(self.config.fade);
        self.fade.replace(
            host,
            TweenSpec::new(self.group, fade)
                .to(Property::Alpha, 0.0)
                .easing(EasingFunction::EaseIn),
        );
        self.phase = Phase::FadingOut;
    }

    /// Re-anchor and re-wrap for a new viewport; ignored while hidden
    pub fn resize<H: Host + ?Sized>(&mut self, host: &mut H, width: f32, height: f32) {
        if self.phase == Phase::Hidden {
            return;
        }

        let position = match self.config.resize_anchor {
            ResizeAnchor::Stored => self.position,
            ResizeAnchor::Inferred => {
                let y = host.get(self.group, Property::Y).unwrap_or(self.anchor.1);
                layout::infer_position(&self.config, y, self.viewport.1)
            }
        };
        debug!(width, height, ?position, "resize");

        self.position = position;
        self.viewport = (width, height);
        self.anchor = layout::anchor(&self.config, position, self.viewport);
        host.set(self.group, Property::X, self.anchor.0);

        if self.float.is_active() || self.breath.is_active() {
            self.restart_idle(host);
        } else {
            host.set(self.group, Property::Y, self.anchor.1);
        }

        let wrap = layout::caption_wrap_width(&self.config, width);
        for caption in [self.primary, self.secondary].into_iter().flatten() {
            host.set_wrap_width(caption, wrap);
        }
    }

    /// Feed a host event; returns `true` when it belonged to this presenter
    pub fn handle_event<H: Host + ?Sized>(&mut self, host: &mut H, event: HostEvent) -> bool {
        match event {
            HostEvent::TweenCompleted(id) => self.on_tween_completed(host, id),
            HostEvent::TimerFired(id) => self.on_timer_fired(host, id),
        }
    }

    fn on_tween_completed<H: Host + ?Sized>(&mut self, host: &mut H, id: TweenId) -> bool {
        if !self.fade.release(id) {
            return false;
        }
        match self.phase {
            Phase::FadingIn => {
                self.phase = Phase::Shown;
                trace!("fade-in complete");
            }
            Phase::FadingOut => {
                host.set_visible(self.group, false);
                self.current = None;
                self.phase = Phase::Hidden;
                debug!("hidden");
            }
            Phase::Hidden | Phase::Shown => {}
        }
        true
    }

    fn on_timer_fired<H: Host + ?Sized>(&mut self, host: &mut H, id: TimerId) -> bool {
        match self.pending_hide {
            Some(pending) if pending.timer == id => {
                self.pending_hide = None;
                if self.current == Some(pending.expected) {
                    self.hide(host);
                } else {
                    trace!(
                        expected = %pending.expected,
                        current = ?self.current,
                        "stale auto-hide ignored"
                    );
                }
                true
            }
            _ => false,
        }
    }

    fn apply_expression<H: Host + ?Sized>(&mut self, host: &mut H, expression: Expression) {
        match self.mode {
            AssetMode::Image => host.set_texture(self.body, &expression.image_key(), None),
            AssetMode::Procedural => {
                let key = expression.animation_key();
                if !host.play(self.body, &key) {
                    warn!(animation = %key, "animation not registered, keeping current body");
                }
            }
        }
    }

    fn restart_idle<H: Host + ?Sized>(&mut self, host: &mut H) {
        self.float.clear(host);
        self.breath.clear(host);

        // Reset before the new tweens capture their start values
        host.set(self.group, Property::Y, self.anchor.1);
        host.set(self.body, Property::Y, 0.0);
        host.set(self.body, Property::ScaleX, 1.0);
        host.set(self.body, Property::ScaleY, 1.0);

        let Some(period) = self.config.motion.idle_period(self.config.idle_period) else {
            return;
        };

        self.float.replace(
            host,
            TweenSpec::new(self.group, period)
                .to(Property::Y, self.anchor.1 - self.config.float_amplitude)
                .easing(EasingFunction::EaseInOutSine)
                .looping(),
        );
        let scale = 1.0 + self.config.breath_scale;
        self.breath.replace(
            host,
            TweenSpec::new(self.body, period)
                .to(Property::ScaleX, scale)
                .to(Property::ScaleY, scale)
                .to(Property::Y, -self.config.breath_nudge)
                .easing(EasingFunction::EaseInOutSine)
                .looping(),
        );
    }

    fn destroy_captions<H: Scene + ?Sized>(&mut self, host: &mut H) {
        for caption in [self.primary.take(), self.secondary.take()].into_iter().flatten() {
            host.destroy(caption);
        }
    }

    fn cancel_pending_hide<H: Timers + ?Sized>(&mut self, host: &mut H) {
        if let Some(pending) = self.pending_hide.take() {
            host.cancel_timer(pending.timer);
        }
    }

    /// Remove every node this presenter created
    pub fn destroy<H: Host + ?Sized>(mut self, host: &mut H) {
        self.fade.clear(host);
        self.float.clear(host);
        self.breath.clear(host);
        self.cancel_pending_hide(host);
        host.destroy(self.group);
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Last applied expression; `None` once a fade-out has completed
    #[must_use]
    pub fn current_expression(&self) -> Option<Expression> {
        self.current
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the group is on screen (including while fading)
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.phase != Phase::Hidden
    }

    /// Current group opacity
    #[must_use]
    pub fn opacity<H: Scene + ?Sized>(&self, host: &H) -> f32 {
        host.get(self.group, Property::Alpha).unwrap_or(0.0)
    }

    #[must_use]
    pub fn mode(&self) -> AssetMode {
        self.mode
    }

    /// Position mode of the last `show` (or inferred by the last `resize`)
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Anchor point of the group, before float offset
    #[must_use]
    pub fn anchor(&self) -> (f32, f32) {
        self.anchor
    }

    #[must_use]
    pub fn group(&self) -> NodeId {
        self.group
    }

    #[must_use]
    pub fn body(&self) -> NodeId {
        self.body
    }

    #[must_use]
    pub fn primary_caption(&self) -> Option<NodeId> {
        self.primary
    }

    #[must_use]
    pub fn secondary_caption(&self) -> Option<NodeId> {
        self.secondary
    }

    #[must_use]
    pub fn float_handle(&self) -> Option<TweenId> {
        self.float.handle()
    }

    #[must_use]
    pub fn breath_handle(&self) -> Option<TweenId> {
        self.breath.handle()
    }

    /// Whether an auto-hide is armed
    #[must_use]
    pub fn auto_hide_pending(&self) -> bool {
        self.pending_hide.is_some()
    }

    #[must_use]
    pub fn config(&self) -> &PresenterConfig {
        &self.config
    }
}
