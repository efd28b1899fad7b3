//! Companion Core - Headless Mascot Presenter
//!
//! This crate holds the companion character logic for the learning game,
//! independent of any UI framework: the expression presenter, the procedural
//! sprite-sheet synthesizer, and the host seam both are written against.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Surfaces                              │
//! │   ┌──────────────────┐        ┌───────────────────────────┐  │
//! │   │  Terminal (tui)  │        │  Tests / headless drivers │  │
//! │   └────────┬─────────┘        └─────────────┬─────────────┘  │
//! │            │  advance(dt) -> HostEvent      │                │
//! │            └───────────────┬────────────────┘                │
//! └────────────────────────────┼─────────────────────────────────┘
//!                              │
//! ┌────────────────────────────┼─────────────────────────────────┐
//! │                      COMPANION CORE                          │
//! │   ┌────────────────────────┴──────────────────────────────┐  │
//! │   │ Host traits: Scene · Tweens · Timers · Assets         │  │
//! │   │   implemented in-process by Stage (+ Raster canvas)   │  │
//! │   └───────────▲───────────────────────────▲───────────────┘  │
//! │   ┌───────────┴──────────┐   ┌────────────┴──────────────┐   │
//! │   │      Presenter       │──▶│       Synthesizer         │   │
//! │   │ show / hide / resize │   │ sheet + frame sequences   │   │
//! │   └──────────────────────┘   └───────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//! use companion_core::{Expression, PresentationOptions, Presenter, PresenterConfig, Stage};
//!
//! let mut stage = Stage::new(800.0, 600.0);
//! let mut presenter = Presenter::new(&mut stage, PresenterConfig::default());
//!
//! presenter.show(&mut stage, Expression::Greet, &PresentationOptions::new().message("مرحبا"));
//!
//! // Frame loop
//! for event in stage.advance(Duration::from_millis(16)) {
//!     presenter.handle_event(&mut stage, event);
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`accessibility`]: Reduced-motion preference
//! - [`animation`]: Tween specs, easing, owned animation slots, frame sequences
//! - [`canvas`]: 2D drawing abstraction with a scoped state stack
//! - [`config`]: TOML + environment configuration
//! - [`expression`]: The closed set of moods
//! - [`host`]: Traits the presenter consumes from its runtime
//! - [`layout`]: Fixed group offsets, anchor and wrap rules
//! - [`options`]: Per-call presentation options
//! - [`panels`]: Intro and stage-results overlay data
//! - [`presenter`]: The expression presenter
//! - [`raster`]: Software canvas over an RGBA image
//! - [`stage`]: In-process host runtime with a simulated clock
//! - [`synth`]: Procedural sprite sheet
//!
//! # No TUI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

pub mod accessibility;
pub mod animation;
pub mod canvas;
pub mod config;
pub mod expression;
pub mod host;
pub mod layout;
pub mod options;
pub mod panels;
pub mod presenter;
pub mod raster;
pub mod stage;
pub mod synth;

// Core exports
pub use expression::{Expression, UnknownExpression};
pub use options::{PresentationOptions, Position};
pub use presenter::{AssetMode, Phase, Presenter};

// Host exports
pub use host::{
    Assets, FrameRect, Host, HostEvent, NodeId, NodeKind, Property, Scene, Shape, TextStyle,
    TimerId, Timers, TweenId, Tweens,
};
pub use stage::{Node, Stage, Texture};

// Drawing exports
pub use canvas::{Canvas, CanvasExt, Color, Paint, Shadow};
pub use raster::Raster;

// Animation exports
pub use animation::{AnimationSlot, EasingFunction, FrameSequence, Repeat, TweenSpec};

// Synthesis exports
pub use synth::{ensure_sheet, SynthesisReport};

// Accessibility exports
pub use accessibility::MotionPreference;

// Panel exports
pub use panels::{IntroPanel, StageResultsPanel, StageSummary};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, PresenterConfig, ResizeAnchor,
};
