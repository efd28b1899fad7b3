//! Overlay widgets

pub mod panel;

pub use panel::{centered, IntroCard, ResultsCard};
