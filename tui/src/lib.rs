//! Companion TUI - Terminal surface for the learning-game companion
//!
//! Hosts the headless presenter from `companion-core` on an in-process
//! stage and draws it with half-block pixel art.
//!
//! # Architecture
//!
//! - **App**: Frame loop, key bindings, overlay panels
//! - **Render**: Stage tree to offscreen raster to terminal cells
//! - **Assets**: Optional pre-authored expression PNGs
//! - **Widgets**: Intro and stage-results cards

pub mod app;
pub mod assets;
pub mod render;
pub mod script;
pub mod theme;
pub mod widgets;

pub use app::App;
