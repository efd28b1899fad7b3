//! Animation Primitives
//!
//! Tween descriptions handed to the host scheduler, the owned-handle slot
//! that keeps at most one tween alive per role, and frame sequences for
//! sprite playback.
//!
//! # Slots
//!
//! Every continuous or interruptible animation the presenter runs lives in
//! an [`AnimationSlot`]. Starting a new tween through a slot always stops the
//! previous one first, in a single call:
//!
//! ```ignore
//! let mut float = AnimationSlot::default();
//! float.replace(host, TweenSpec::new(group, Duration::from_millis(2800)).to(Property::Y, 275.0));
//! float.replace(host, ...); // the first tween is stopped, never stacked
//! ```

pub mod timing;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use timing::EasingFunction;

use crate::host::{NodeId, Property, TweenId, Tweens};

/// How many extra times a tween or frame sequence runs after the first pass
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Repeat {
    /// Run `n` more times, then complete
    Count(u32),
    /// Never complete
    Infinite,
}

impl Default for Repeat {
    fn default() -> Self {
        Self::Count(0)
    }
}

/// Description of a property tween
#[derive(Clone, Debug, PartialEq)]
pub struct TweenSpec {
    /// Node whose properties are animated
    pub target: NodeId,
    /// End values; start values are read when the tween is added
    pub properties: Vec<(Property, f32)>,
    /// Length of one forward pass
    pub duration: Duration,
    /// Curve applied to progress
    pub easing: EasingFunction,
    /// Play back to the start value after each forward pass
    pub yoyo: bool,
    /// Extra passes after the first
    pub repeat: Repeat,
}

impl TweenSpec {
    /// Single-pass linear tween with no properties yet
    #[must_use]
    pub fn new(target: NodeId, duration: Duration) -> Self {
        Self {
            target,
            properties: Vec::new(),
            duration,
            easing: EasingFunction::Linear,
            yoyo: false,
            repeat: Repeat::default(),
        }
    }

    /// Animate `property` to `value`
    #[must_use]
    pub fn to(mut self, property: Property, value: f32) -> Self {
        self.properties.push((property, value));
        self
    }

    #[must_use]
    pub fn easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    /// Yoyo forever: the shape of every idle loop
    #[must_use]
    pub fn looping(mut self) -> Self {
        self.yoyo = true;
        self.repeat = Repeat::Infinite;
        self
    }

    /// Whether this tween can ever complete
    #[must_use]
    pub fn is_finite(&self) -> bool {
        matches!(self.repeat, Repeat::Count(_))
    }
}

/// Owned handle to at most one live tween
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AnimationSlot {
    handle: Option<TweenId>,
}

impl AnimationSlot {
    /// Stop the current tween (if any) and start `spec` in its place
    pub fn replace<T: Tweens + ?Sized>(&mut self, tweens: &mut T, spec: TweenSpec) -> TweenId {
        self.clear(tweens);
        let id = tweens.add_tween(spec);
        self.handle = Some(id);
        id
    }

    /// Stop the current tween, if any
    pub fn clear<T: Tweens + ?Sized>(&mut self, tweens: &mut T) {
        if let Some(id) = self.handle.take() {
            tweens.stop_tween(id);
        }
    }

    /// Forget the handle without stopping it (the tween already completed)
    ///
    /// Returns `true` when `id` was the tween held by this slot.
    pub fn release(&mut self, id: TweenId) -> bool {
        if self.is(id) {
            self.handle = None;
            true
        } else {
            false
        }
    }

    /// Whether `id` is the tween held by this slot
    #[must_use]
    pub fn is(&self, id: TweenId) -> bool {
        self.handle == Some(id)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    #[must_use]
    pub fn handle(&self) -> Option<TweenId> {
        self.handle
    }
}

/// Named looping playback over frames of one texture
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameSequence {
    /// Registry key
    pub key: String,
    /// Texture holding every frame
    pub texture: String,
    /// Frame names in playback order
    pub frames: Vec<String>,
    /// Frames per second
    pub frame_rate: f32,
    /// Extra passes after the first
    pub repeat: Repeat,
}

impl FrameSequence {
    /// Frame shown `elapsed` after playback started
    #[must_use]
    pub fn frame_at(&self, elapsed: Duration) -> Option<&str> {
        let count = self.frames.len();
        if count == 0 {
            return None;
        }
        let step = elapsed.as_secs_f32() * self.frame_rate.max(0.0);
        let index = step.floor() as usize;
        let index = match self.repeat {
            Repeat::Infinite => index % count,
            Repeat::Count(n) => {
                let total = count * (n as usize + 1);
                if index >= total {
                    count - 1
                } else {
                    index % count
                }
            }
        };
        self.frames.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        next: u64,
        added: Vec<TweenId>,
        stopped: Vec<TweenId>,
    }

    impl Tweens for Recorder {
        fn add_tween(&mut self, _spec: TweenSpec) -> TweenId {
            self.next += 1;
            let id = TweenId(self.next);
            self.added.push(id);
            id
        }

        fn stop_tween(&mut self, id: TweenId) {
            self.stopped.push(id);
        }
    }

    fn spec() -> TweenSpec {
        TweenSpec::new(NodeId(1), Duration::from_millis(100)).to(Property::Alpha, 1.0)
    }

    #[test]
    fn test_replace_stops_previous() {
        let mut rec = Recorder::default();
        let mut slot = AnimationSlot::default();

        let first = slot.replace(&mut rec, spec());
        assert!(rec.stopped.is_empty());

        let second = slot.replace(&mut rec, spec());
        assert_eq!(rec.stopped, vec![first]);
        assert!(slot.is(second));
        assert!(!slot.is(first));
    }

    #[test]
    fn test_release_only_matches_own_handle() {
        let mut rec = Recorder::default();
        let mut slot = AnimationSlot::default();
        let id = slot.replace(&mut rec, spec());

        assert!(!slot.release(TweenId(999)));
        assert!(slot.is_active());
        assert!(slot.release(id));
        assert!(!slot.is_active());

        // Released tweens are not stopped again
        slot.clear(&mut rec);
        assert!(rec.stopped.is_empty());
    }

    #[test]
    fn test_looping_is_infinite_yoyo() {
        let s = spec().looping();
        assert!(s.yoyo);
        assert!(!s.is_finite());
    }

    #[test]
    fn test_frame_at_wraps_infinite() {
        let seq = FrameSequence {
            key: "k".into(),
            texture: "t".into(),
            frames: vec!["a".into(), "b".into(), "c".into()],
            frame_rate: 2.0,
            repeat: Repeat::Infinite,
        };
        assert_eq!(seq.frame_at(Duration::ZERO), Some("a"));
        assert_eq!(seq.frame_at(Duration::from_millis(500)), Some("b"));
        assert_eq!(seq.frame_at(Duration::from_millis(1500)), Some("a"));
    }

    #[test]
    fn test_frame_at_holds_last_when_finished() {
        let seq = FrameSequence {
            key: "k".into(),
            texture: "t".into(),
            frames: vec!["a".into(), "b".into()],
            frame_rate: 1.0,
            repeat: Repeat::Count(0),
        };
        assert_eq!(seq.frame_at(Duration::from_secs(10)), Some("b"));
    }
}
