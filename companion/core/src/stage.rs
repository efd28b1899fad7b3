//! In-Process Stage
//!
//! A small retained-mode scene runtime implementing every host trait:
//! node tree, tween engine, one-shot timers, textures with named frames and
//! frame-sequence playback on sprites. Time only moves when the owner calls
//! [`Stage::advance`], which makes the stage equally usable from a terminal
//! frame loop and from deterministic tests.
//!
//! # Tween semantics
//!
//! - Start values are captured when the tween is added
//! - A yoyo tween plays forward, then backward along the mirrored curve
//! - `Repeat::Count(n)` runs `n` extra passes, `Repeat::Infinite` never ends
//! - Zero-length tweens finish on the next `advance`, even `advance(0)`
//! - Tweens whose target is destroyed are dropped without an event

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, trace};

use crate::animation::{FrameSequence, Repeat, TweenSpec};
use crate::host::{
    Assets, FrameRect, HostEvent, NodeId, NodeKind, Property, Scene, TextStyle, TimerId, Timers,
    TweenId, Tweens,
};
use crate::raster::Raster;

/// A scene node
#[derive(Clone, Debug)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
    x: f32,
    y: f32,
    alpha: f32,
    scale_x: f32,
    scale_y: f32,
    visible: bool,
    playback: Option<Playback>,
}

#[derive(Clone, Debug)]
struct Playback {
    animation: String,
    elapsed: Duration,
}

impl Node {
    fn new(parent: Option<NodeId>, kind: NodeKind, x: f32, y: f32) -> Self {
        Self {
            parent,
            children: Vec::new(),
            kind,
            x,
            y,
            alpha: 1.0,
            scale_x: 1.0,
            scale_y: 1.0,
            visible: true,
            playback: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[must_use]
    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    #[must_use]
    pub fn scale(&self) -> (f32, f32) {
        (self.scale_x, self.scale_y)
    }

    #[must_use]
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Content and style, for text nodes
    #[must_use]
    pub fn text(&self) -> Option<(&str, &TextStyle)> {
        match &self.kind {
            NodeKind::Text { content, style } => Some((content, style)),
            _ => None,
        }
    }

    /// Name of the frame sequence playing on this sprite
    #[must_use]
    pub fn playing(&self) -> Option<&str> {
        self.playback.as_ref().map(|p| p.animation.as_str())
    }

    fn property(&self, property: Property) -> f32 {
        match property {
            Property::X => self.x,
            Property::Y => self.y,
            Property::Alpha => self.alpha,
            Property::ScaleX => self.scale_x,
            Property::ScaleY => self.scale_y,
        }
    }

    fn set_property(&mut self, property: Property, value: f32) {
        match property {
            Property::X => self.x = value,
            Property::Y => self.y = value,
            Property::Alpha => self.alpha = value.clamp(0.0, 1.0),
            Property::ScaleX => self.scale_x = value,
            Property::ScaleY => self.scale_y = value,
        }
    }
}

/// A registered texture: pixels plus named regions
#[derive(Clone, Debug)]
pub struct Texture {
    raster: Raster,
    frames: HashMap<String, FrameRect>,
}

impl Texture {
    fn new(raster: Raster) -> Self {
        Self {
            raster,
            frames: HashMap::new(),
        }
    }

    #[must_use]
    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    /// Region of a named frame
    #[must_use]
    pub fn frame(&self, name: &str) -> Option<FrameRect> {
        self.frames.get(name).copied()
    }

    /// Whole-texture rectangle
    #[must_use]
    pub fn bounds(&self) -> FrameRect {
        FrameRect::new(0, 0, self.raster.width(), self.raster.height())
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

#[derive(Clone, Debug)]
struct Tween {
    id: TweenId,
    spec: TweenSpec,
    from: Vec<f32>,
    elapsed: Duration,
}

impl Tween {
    fn legs_per_pass(&self) -> u64 {
        if self.spec.yoyo {
            2
        } else {
            1
        }
    }

    /// Total running time, `None` when infinite
    fn total(&self) -> Option<Duration> {
        match self.spec.repeat {
            Repeat::Infinite => None,
            Repeat::Count(n) => {
                let legs = (u64::from(n) + 1) * self.legs_per_pass();
                Some(self.spec.duration.saturating_mul(legs as u32))
            }
        }
    }

    /// Eased blend factor between `from` (0.0) and `to` (1.0) at `elapsed`
    fn blend(&self) -> f32 {
        if let Some(total) = self.total() {
            if self.elapsed >= total {
                return if self.spec.yoyo { 0.0 } else { 1.0 };
            }
        }
        let leg = self.spec.duration.as_secs_f64();
        if leg <= 0.0 {
            return 1.0;
        }
        let position = self.elapsed.as_secs_f64() / leg;
        let leg_index = position.floor() as u64;
        let progress = (position - position.floor()) as f32;
        if self.spec.yoyo && leg_index % 2 == 1 {
            self.spec.easing.apply(1.0 - progress)
        } else {
            self.spec.easing.apply(progress)
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    id: TimerId,
    due: Duration,
}

/// In-process scene runtime with a simulated clock
#[derive(Debug)]
pub struct Stage {
    viewport: (f32, f32),
    nodes: HashMap<NodeId, Node>,
    roots: Vec<NodeId>,
    tweens: Vec<Tween>,
    timers: Vec<Timer>,
    textures: HashMap<String, Texture>,
    animations: HashMap<String, FrameSequence>,
    clock: Duration,
    next_id: u64,
}

impl Stage {
    /// Empty stage with a viewport in logical pixels
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            viewport: (width, height),
            nodes: HashMap::new(),
            roots: Vec::new(),
            tweens: Vec::new(),
            timers: Vec::new(),
            textures: HashMap::new(),
            animations: HashMap::new(),
            clock: Duration::ZERO,
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Change the viewport (callers forward this to `Presenter::resize`)
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = (width, height);
    }

    /// Register a pre-authored image; returns `false` if the key is taken
    pub fn add_texture(&mut self, key: &str, raster: Raster) -> bool {
        if self.textures.contains_key(key) {
            return false;
        }
        self.textures.insert(key.to_string(), Texture::new(raster));
        true
    }

    /// Time simulated so far
    #[must_use]
    pub fn clock(&self) -> Duration {
        self.clock
    }

    /// Move time forward and collect the events that came due, in time order
    pub fn advance(&mut self, dt: Duration) -> Vec<HostEvent> {
        let start = self.clock;
        self.clock += dt;
        let mut due: Vec<(Duration, u64, HostEvent)> = Vec::new();

        let mut tweens = std::mem::take(&mut self.tweens);
        tweens.retain_mut(|tween| {
            let Some(node) = self.nodes.get_mut(&tween.spec.target) else {
                trace!(tween = tween.id.0, "dropping tween on destroyed node");
                return false;
            };
            let before = tween.elapsed;
            tween.elapsed += dt;
            let blend = tween.blend();
            for (&(property, to), &from) in tween.spec.properties.iter().zip(&tween.from) {
                node.set_property(property, from + (to - from) * blend);
            }
            match tween.total() {
                Some(total) if tween.elapsed >= total => {
                    let finished_at = start + total.saturating_sub(before);
                    due.push((finished_at, tween.id.0, HostEvent::TweenCompleted(tween.id)));
                    false
                }
                _ => true,
            }
        });
        self.tweens = tweens;

        let clock = self.clock;
        self.timers.retain(|timer| {
            if timer.due <= clock {
                due.push((timer.due, timer.id.0, HostEvent::TimerFired(timer.id)));
                false
            } else {
                true
            }
        });

        for node in self.nodes.values_mut() {
            let Some(playback) = node.playback.as_mut() else {
                continue;
            };
            playback.elapsed += dt;
            if let Some(sequence) = self.animations.get(&playback.animation) {
                if let NodeKind::Sprite { texture, frame, .. } = &mut node.kind {
                    *texture = sequence.texture.clone();
                    *frame = sequence.frame_at(playback.elapsed).map(str::to_string);
                }
            }
        }

        due.sort_by_key(|&(at, seq, _)| (at, seq));
        due.into_iter().map(|(_, _, event)| event).collect()
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Top-level nodes in creation order
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Children of a node in creation order
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map_or(&[], |n| n.children.as_slice())
    }

    /// Live tweens targeting a node
    #[must_use]
    pub fn live_tweens(&self, target: NodeId) -> usize {
        self.tweens.iter().filter(|t| t.spec.target == target).count()
    }

    /// Live tweens targeting a node that animate `property`
    #[must_use]
    pub fn live_tweens_on(&self, target: NodeId, property: Property) -> usize {
        self.tweens
            .iter()
            .filter(|t| t.spec.target == target)
            .filter(|t| t.spec.properties.iter().any(|(p, _)| *p == property))
            .count()
    }

    /// Whether a tween is still running
    #[must_use]
    pub fn is_tween_live(&self, id: TweenId) -> bool {
        self.tweens.iter().any(|t| t.id == id)
    }

    /// Total live tweens
    #[must_use]
    pub fn tween_count(&self) -> usize {
        self.tweens.len()
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    #[must_use]
    pub fn texture(&self, key: &str) -> Option<&Texture> {
        self.textures.get(key)
    }

    #[must_use]
    pub fn animation(&self, key: &str) -> Option<&FrameSequence> {
        self.animations.get(key)
    }

    #[must_use]
    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    /// Texture key and frame name a sprite currently shows
    #[must_use]
    pub fn current_frame(&self, id: NodeId) -> Option<(&str, Option<&str>)> {
        match &self.nodes.get(&id)?.kind {
            NodeKind::Sprite { texture, frame, .. } => Some((texture, frame.as_deref())),
            _ => None,
        }
    }

    /// Text nodes in the subtree under `id`, depth first
    #[must_use]
    pub fn texts_under(&self, id: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            if matches!(node.kind, NodeKind::Text { .. }) {
                found.push(current);
            }
            stack.extend(node.children.iter().rev());
        }
        found
    }
}

impl Scene for Stage {
    fn viewport(&self) -> (f32, f32) {
        self.viewport
    }

    fn spawn(&mut self, parent: Option<NodeId>, kind: NodeKind, x: f32, y: f32) -> NodeId {
        let id = NodeId(self.next_id());
        let parent = parent.filter(|p| self.nodes.contains_key(p));
        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(parent_node) => parent_node.children.push(id),
            None => self.roots.push(id),
        }
        self.nodes.insert(id, Node::new(parent, kind, x, y));
        id
    }

    fn destroy(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get(&node).map(|n| n.parent) else {
            return;
        };
        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(parent) => parent.children.retain(|c| *c != node),
            None => self.roots.retain(|r| *r != node),
        }

        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(n) = self.nodes.remove(&current) {
                stack.extend(n.children);
            }
        }
        let nodes = &self.nodes;
        self.tweens.retain(|t| nodes.contains_key(&t.spec.target));
    }

    fn exists(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn set(&mut self, node: NodeId, property: Property, value: f32) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.set_property(property, value);
        }
    }

    fn get(&self, node: NodeId, property: Property) -> Option<f32> {
        self.nodes.get(&node).map(|n| n.property(property))
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.visible = visible;
        }
    }

    fn is_visible(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.visible)
    }

    fn set_texture(&mut self, node: NodeId, key: &str, frame: Option<&str>) {
        if let Some(n) = self.nodes.get_mut(&node) {
            if let NodeKind::Sprite {
                texture, frame: f, ..
            } = &mut n.kind
            {
                *texture = key.to_string();
                *f = frame.map(str::to_string);
                n.playback = None;
            }
        }
    }

    fn play(&mut self, node: NodeId, animation: &str) -> bool {
        let Some(sequence) = self.animations.get(animation) else {
            return false;
        };
        let Some(n) = self.nodes.get_mut(&node) else {
            return false;
        };
        let NodeKind::Sprite { texture, frame, .. } = &mut n.kind else {
            return false;
        };
        *texture = sequence.texture.clone();
        *frame = sequence.frame_at(Duration::ZERO).map(str::to_string);
        n.playback = Some(Playback {
            animation: animation.to_string(),
            elapsed: Duration::ZERO,
        });
        true
    }

    fn set_wrap_width(&mut self, node: NodeId, width: f32) {
        if let Some(n) = self.nodes.get_mut(&node) {
            if let NodeKind::Text { style, .. } = &mut n.kind {
                style.wrap_width = width;
            }
        }
    }
}

impl Tweens for Stage {
    fn add_tween(&mut self, spec: TweenSpec) -> TweenId {
        let id = TweenId(self.next_id());
        let Some(node) = self.nodes.get(&spec.target) else {
            trace!(tween = id.0, "tween target does not exist");
            return id;
        };
        let from = spec.properties.iter().map(|(p, _)| node.property(*p)).collect();
        self.tweens.push(Tween {
            id,
            spec,
            from,
            elapsed: Duration::ZERO,
        });
        id
    }

    fn stop_tween(&mut self, id: TweenId) {
        self.tweens.retain(|t| t.id != id);
    }
}

impl Timers for Stage {
    fn delayed_call(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id());
        self.timers.push(Timer {
            id,
            due: self.clock + delay,
        });
        id
    }

    fn cancel_timer(&mut self, id: TimerId) {
        self.timers.retain(|t| t.id != id);
    }
}

impl Assets for Stage {
    type Canvas = Raster;

    fn has_texture(&self, key: &str) -> bool {
        self.textures.contains_key(key)
    }

    fn create_canvas(&mut self, key: &str, width: u32, height: u32) -> Option<&mut Raster> {
        if self.textures.contains_key(key) {
            return None;
        }
        debug!(key, width, height, "creating canvas texture");
        let texture = self
            .textures
            .entry(key.to_string())
            .or_insert_with(|| Texture::new(Raster::new(width, height)));
        Some(&mut texture.raster)
    }

    fn add_frame(&mut self, texture: &str, name: &str, rect: FrameRect) {
        if let Some(t) = self.textures.get_mut(texture) {
            t.frames.insert(name.to_string(), rect);
        }
    }

    fn has_animation(&self, key: &str) -> bool {
        self.animations.contains_key(key)
    }

    fn add_animation(&mut self, sequence: FrameSequence) -> bool {
        if self.animations.contains_key(&sequence.key) {
            return false;
        }
        self.animations.insert(sequence.key.clone(), sequence);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::EasingFunction;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_spawn_and_destroy_subtree() {
        let mut stage = Stage::new(800.0, 600.0);
        let group = stage.spawn(None, NodeKind::Group, 10.0, 20.0);
        let child = stage.spawn(Some(group), NodeKind::Group, 0.0, 0.0);
        let grandchild = stage.spawn(Some(child), NodeKind::Group, 0.0, 0.0);

        assert_eq!(stage.roots(), &[group]);
        assert_eq!(stage.children(group), &[child]);

        stage.destroy(child);
        assert!(!stage.exists(child));
        assert!(!stage.exists(grandchild));
        assert!(stage.children(group).is_empty());

        // Unknown nodes are ignored
        stage.destroy(child);
        stage.set(child, Property::X, 5.0);
        assert_eq!(stage.get(child, Property::X), None);
    }

    #[test]
    fn test_linear_tween_reaches_target_and_completes() {
        let mut stage = Stage::new(100.0, 100.0);
        let node = stage.spawn(None, NodeKind::Group, 0.0, 0.0);
        let id = stage.add_tween(TweenSpec::new(node, ms(100)).to(Property::X, 10.0));

        assert!(stage.advance(ms(50)).is_empty());
        assert_eq!(stage.get(node, Property::X), Some(5.0));

        let events = stage.advance(ms(60));
        assert_eq!(events, vec![HostEvent::TweenCompleted(id)]);
        assert_eq!(stage.get(node, Property::X), Some(10.0));
        assert!(!stage.is_tween_live(id));
    }

    #[test]
    fn test_yoyo_returns_to_start_and_infinite_never_completes() {
        let mut stage = Stage::new(100.0, 100.0);
        let node = stage.spawn(None, NodeKind::Group, 0.0, 100.0);
        let id = stage.add_tween(
            TweenSpec::new(node, ms(1000))
                .to(Property::Y, 90.0)
                .easing(EasingFunction::EaseInOutSine)
                .looping(),
        );

        stage.advance(ms(1000));
        let top = stage.get(node, Property::Y).unwrap();
        assert!((top - 90.0).abs() < 0.01, "y was {top}");

        stage.advance(ms(1000));
        let back = stage.get(node, Property::Y).unwrap();
        assert!((back - 100.0).abs() < 0.01, "y was {back}");

        assert!(stage.advance(ms(60_000)).is_empty());
        assert!(stage.is_tween_live(id));
    }

    #[test]
    fn test_zero_duration_completes_on_next_advance() {
        let mut stage = Stage::new(100.0, 100.0);
        let node = stage.spawn(None, NodeKind::Group, 0.0, 0.0);
        stage.set(node, Property::Alpha, 0.0);
        let id = stage.add_tween(TweenSpec::new(node, Duration::ZERO).to(Property::Alpha, 1.0));

        assert_eq!(stage.advance(Duration::ZERO), vec![HostEvent::TweenCompleted(id)]);
        assert_eq!(stage.get(node, Property::Alpha), Some(1.0));
    }

    #[test]
    fn test_stopped_tween_holds_value_without_event() {
        let mut stage = Stage::new(100.0, 100.0);
        let node = stage.spawn(None, NodeKind::Group, 0.0, 0.0);
        let id = stage.add_tween(TweenSpec::new(node, ms(100)).to(Property::X, 10.0));
        stage.advance(ms(50));
        stage.stop_tween(id);

        assert!(stage.advance(ms(100)).is_empty());
        assert_eq!(stage.get(node, Property::X), Some(5.0));
    }

    #[test]
    fn test_destroying_target_drops_tweens() {
        let mut stage = Stage::new(100.0, 100.0);
        let node = stage.spawn(None, NodeKind::Group, 0.0, 0.0);
        stage.add_tween(TweenSpec::new(node, ms(100)).to(Property::X, 10.0));
        stage.destroy(node);

        assert_eq!(stage.tween_count(), 0);
        assert!(stage.advance(ms(200)).is_empty());
    }

    #[test]
    fn test_timers_fire_in_due_order_and_cancel() {
        let mut stage = Stage::new(100.0, 100.0);
        let late = stage.delayed_call(ms(300));
        let early = stage.delayed_call(ms(100));
        let cancelled = stage.delayed_call(ms(200));
        stage.cancel_timer(cancelled);

        let events = stage.advance(ms(500));
        assert_eq!(
            events,
            vec![HostEvent::TimerFired(early), HostEvent::TimerFired(late)]
        );
        assert_eq!(stage.pending_timers(), 0);
    }

    #[test]
    fn test_events_interleave_by_time() {
        let mut stage = Stage::new(100.0, 100.0);
        let node = stage.spawn(None, NodeKind::Group, 0.0, 0.0);
        let timer = stage.delayed_call(ms(50));
        let tween = stage.add_tween(TweenSpec::new(node, ms(20)).to(Property::X, 1.0));

        assert_eq!(
            stage.advance(ms(100)),
            vec![HostEvent::TweenCompleted(tween), HostEvent::TimerFired(timer)]
        );
    }

    #[test]
    fn test_create_canvas_admits_once() {
        let mut stage = Stage::new(100.0, 100.0);
        assert!(stage.create_canvas("sheet", 4, 4).is_some());
        assert!(stage.create_canvas("sheet", 4, 4).is_none());
        assert!(!stage.add_texture("sheet", Raster::new(1, 1)));
    }

    #[test]
    fn test_sprite_playback_cycles_frames() {
        let mut stage = Stage::new(100.0, 100.0);
        stage.create_canvas("sheet", 8, 4);
        stage.add_frame("sheet", "a", FrameRect::new(0, 0, 4, 4));
        stage.add_frame("sheet", "b", FrameRect::new(4, 0, 4, 4));
        assert!(stage.add_animation(FrameSequence {
            key: "loop".into(),
            texture: "sheet".into(),
            frames: vec!["a".into(), "b".into()],
            frame_rate: 10.0,
            repeat: Repeat::Infinite,
        }));

        let sprite = stage.spawn(
            None,
            NodeKind::Sprite {
                texture: String::new(),
                frame: None,
                width: 4.0,
                height: 4.0,
            },
            0.0,
            0.0,
        );
        assert!(!stage.play(sprite, "missing"));
        assert!(stage.play(sprite, "loop"));
        assert_eq!(stage.current_frame(sprite), Some(("sheet", Some("a"))));

        stage.advance(ms(150));
        assert_eq!(stage.current_frame(sprite), Some(("sheet", Some("b"))));

        stage.set_texture(sprite, "still", None);
        stage.advance(ms(100));
        assert_eq!(stage.current_frame(sprite), Some(("still", None)));
        assert_eq!(stage.node(sprite).and_then(Node::playing), None);
    }
}
