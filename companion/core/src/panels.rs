//! Boundary Panels
//!
//! Data shapes for the overlays that sit beside the companion: the intro
//! card and the stage-results card. Each carries static text and one
//! confirmation callback that fires at most once. Rendering is up to the
//! surface.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A callback that can run at most once
pub struct OneShot(Option<Box<dyn FnOnce()>>);

impl OneShot {
    pub fn new(callback: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(callback)))
    }

    /// Run the callback; `false` if it already ran
    pub fn fire(&mut self) -> bool {
        match self.0.take() {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Debug for OneShot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneShot")
            .field("fired", &self.has_fired())
            .finish()
    }
}

/// Intro card shown before a stage
#[derive(Debug)]
pub struct IntroPanel {
    title: String,
    lines: Vec<String>,
    confirm_label: String,
    on_confirm: OneShot,
}

impl IntroPanel {
    pub fn new(
        title: impl Into<String>,
        lines: Vec<String>,
        confirm_label: impl Into<String>,
        on_confirm: impl FnOnce() + 'static,
    ) -> Self {
        Self {
            title: title.into(),
            lines,
            confirm_label: confirm_label.into(),
            on_confirm: OneShot::new(on_confirm),
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn confirm_label(&self) -> &str {
        &self.confirm_label
    }

    /// Fire `on_confirm`; later calls do nothing and return `false`
    pub fn confirm(&mut self) -> bool {
        self.on_confirm.fire()
    }

    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.on_confirm.has_fired()
    }
}

/// Outcome of one stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
    /// Distance covered, in meters
    pub distance: u32,
    /// Stars earned, 0..=3
    pub stars: u8,
    /// Correct answers
    pub correct: u32,
    /// Incorrect answers
    pub incorrect: u32,
    /// Time spent on the stage
    pub elapsed: Duration,
}

impl StageSummary {
    /// Maximum stars per stage
    pub const MAX_STARS: u8 = 3;

    /// Build a summary; stars above the maximum are clamped
    #[must_use]
    pub fn new(distance: u32, stars: u8, correct: u32, incorrect: u32, elapsed: Duration) -> Self {
        Self {
            distance,
            stars: stars.min(Self::MAX_STARS),
            correct,
            incorrect,
            elapsed,
        }
    }

    /// Elapsed time as `mm:ss` (minutes keep counting past 59)
    #[must_use]
    pub fn elapsed_label(&self) -> String {
        let secs = self.elapsed.as_secs();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    /// Earned and missing stars as glyphs
    #[must_use]
    pub fn star_label(&self) -> String {
        let earned = usize::from(self.stars);
        let missing = usize::from(Self::MAX_STARS - self.stars);
        format!("{}{}", "★".repeat(earned), "☆".repeat(missing))
    }

    /// Share of correct answers, `None` when nothing was answered
    #[must_use]
    pub fn accuracy(&self) -> Option<f32> {
        let total = self.correct + self.incorrect;
        (total > 0).then(|| self.correct as f32 / total as f32)
    }
}

/// Stage-results card
#[derive(Debug)]
pub struct StageResultsPanel {
    title: String,
    summary: StageSummary,
    continue_label: String,
    on_continue: OneShot,
}

impl StageResultsPanel {
    pub fn new(
        title: impl Into<String>,
        summary: StageSummary,
        continue_label: impl Into<String>,
        on_continue: impl FnOnce() + 'static,
    ) -> Self {
        Self {
            title: title.into(),
            summary,
            continue_label: continue_label.into(),
            on_continue: OneShot::new(on_continue),
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn summary(&self) -> &StageSummary {
        &self.summary
    }

    #[must_use]
    pub fn continue_label(&self) -> &str {
        &self.continue_label
    }

    /// Fire `on_continue`; later calls do nothing and return `false`
    pub fn confirm(&mut self) -> bool {
        self.on_continue.fire()
    }

    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.on_continue.has_fired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_confirm_fires_once() {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let mut panel = IntroPanel::new("t", vec![], "ok", move || seen.set(seen.get() + 1));

        assert!(!panel.is_confirmed());
        assert!(panel.confirm());
        assert!(!panel.confirm());
        assert!(panel.is_confirmed());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_results_continue_fires_once() {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let summary = StageSummary::new(120, 2, 8, 2, Duration::from_secs(75));
        let mut panel = StageResultsPanel::new("done", summary, "next", move || seen.set(seen.get() + 1));

        panel.confirm();
        panel.confirm();
        assert_eq!(count.get(), 1);
        assert_eq!(panel.summary().distance, 120);
    }

    #[test]
    fn test_elapsed_label() {
        let label = |secs| StageSummary::new(0, 0, 0, 0, Duration::from_secs(secs)).elapsed_label();
        assert_eq!(label(0), "00:00");
        assert_eq!(label(75), "01:15");
        assert_eq!(label(3605), "60:05");
    }

    #[test]
    fn test_stars_are_clamped() {
        let summary = StageSummary::new(0, 9, 0, 0, Duration::ZERO);
        assert_eq!(summary.stars, 3);
        assert_eq!(summary.star_label(), "★★★");
        assert_eq!(StageSummary::new(0, 1, 0, 0, Duration::ZERO).star_label(), "★☆☆");
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(StageSummary::new(0, 0, 0, 0, Duration::ZERO).accuracy(), None);
        assert_eq!(StageSummary::new(0, 0, 3, 1, Duration::ZERO).accuracy(), Some(0.75));
    }
}
