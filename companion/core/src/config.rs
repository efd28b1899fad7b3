//! TOML Configuration File Support
//!
//! Presenter tunables, loaded from `~/.config/companion/presenter.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/companion/presenter.toml` (typically `~/.config/companion/presenter.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [presenter]
//! fade_ms = 600
//! top_offset = 278
//! bottom_margin = 90
//! caption_width_ratio = 0.8
//! caption_max_width = 420
//! resize_anchor = "stored"
//!
//! [motion]
//! preference = "reduced"
//! idle_period_ms = 2800
//! float_amplitude = 3.0
//!
//! [assets]
//! dir = "/usr/share/companion"
//! procedural = false
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::accessibility::{parse_motion_preference, MotionPreference, REDUCE_MOTION_ENV};

/// Fade duration override (milliseconds)
pub const FADE_MS_ENV: &str = "COMPANION_FADE_MS";
/// Idle loop period override (milliseconds)
pub const IDLE_PERIOD_ENV: &str = "COMPANION_IDLE_PERIOD_MS";
/// Pre-authored image directory
pub const ASSETS_DIR_ENV: &str = "COMPANION_ASSETS_DIR";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// How `resize` decides between center and top anchoring
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeAnchor {
    /// Reuse the position passed to the last `show`
    #[default]
    Stored,
    /// Treat the group as centered when it sits within `center_tolerance`
    /// of the old viewport's vertical center
    Inferred,
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[presenter]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenterToml {
    pub fade_ms: Option<u64>,
    pub top_offset: Option<f32>,
    pub bottom_margin: Option<f32>,
    pub caption_width_ratio: Option<f32>,
    pub caption_max_width: Option<f32>,
    pub center_tolerance: Option<f32>,
    pub resize_anchor: Option<ResizeAnchor>,
}

/// `[motion]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionToml {
    pub preference: Option<MotionPreference>,
    pub idle_period_ms: Option<u64>,
    pub float_amplitude: Option<f32>,
    pub breath_scale: Option<f32>,
    pub breath_nudge: Option<f32>,
}

/// `[assets]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsToml {
    /// Directory holding `<expression>.png` images
    pub dir: Option<PathBuf>,
    /// Ignore pre-authored images and always synthesize
    pub procedural: Option<bool>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionToml {
    pub presenter: PresenterToml,
    pub motion: MotionToml,
    pub assets: AssetsToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Presenter timing, motion and layout tunables
#[derive(Clone, Debug, PartialEq)]
pub struct PresenterConfig {
    /// Fade-in and fade-out length
    pub fade: Duration,
    /// Period of one float/breath half-cycle
    pub idle_period: Duration,
    /// Vertical float distance in px
    pub float_amplitude: f32,
    /// Breath scale delta (0.01 = 1%)
    pub breath_scale: f32,
    /// Breath vertical nudge in px
    pub breath_nudge: f32,
    /// Anchor y for `Position::Top`
    pub top_offset: f32,
    /// Minimum distance between a top anchor and the bottom edge
    pub bottom_margin: f32,
    /// Caption width as a share of viewport width
    pub caption_width_ratio: f32,
    /// Caption width cap in px
    pub caption_max_width: f32,
    /// Distance from vertical center treated as "centered" when inferring
    pub center_tolerance: f32,
    /// Anchoring rule used by `resize`
    pub resize_anchor: ResizeAnchor,
    /// Reduced-motion preference
    pub motion: MotionPreference,
    /// Directory of pre-authored images
    pub assets_dir: Option<PathBuf>,
    /// Skip pre-authored images even when present
    pub force_procedural: bool,
    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,
    /// Primary source of this configuration
    pub source: ConfigSource,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            fade: Duration::from_millis(600),
            idle_period: Duration::from_millis(2800),
            float_amplitude: 3.0,
            breath_scale: 0.01,
            breath_nudge: 1.0,
            top_offset: 278.0,
            bottom_margin: 90.0,
            caption_width_ratio: 0.8,
            caption_max_width: 420.0,
            center_tolerance: 10.0,
            resize_anchor: ResizeAnchor::Stored,
            motion: MotionPreference::Full,
            assets_dir: None,
            force_procedural: false,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl PresenterConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Copy with a different motion preference
    #[must_use]
    pub fn with_motion(mut self, motion: MotionPreference) -> Self {
        self.motion = motion;
        self
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bad = |msg: String| Err(ConfigError::ValidationError(msg));

        if self.fade > Duration::from_secs(10) {
            return bad(format!("fade_ms must be at most 10000, got {}", self.fade.as_millis()));
        }
        if self.idle_period < Duration::from_millis(100) || self.idle_period > Duration::from_secs(60) {
            return bad(format!(
                "idle_period_ms must be within 100..=60000, got {}",
                self.idle_period.as_millis()
            ));
        }
        if !(0.0..=50.0).contains(&self.float_amplitude) {
            return bad(format!("float_amplitude must be within 0..=50, got {}", self.float_amplitude));
        }
        if !(0.0..0.5).contains(&self.breath_scale) {
            return bad(format!("breath_scale must be within 0..0.5, got {}", self.breath_scale));
        }
        if !(0.0..=50.0).contains(&self.breath_nudge) {
            return bad(format!("breath_nudge must be within 0..=50, got {}", self.breath_nudge));
        }
        if self.top_offset < 0.0 || self.bottom_margin < 0.0 {
            return bad("top_offset and bottom_margin must not be negative".to_string());
        }
        if !(self.caption_width_ratio > 0.0 && self.caption_width_ratio <= 1.0) {
            return bad(format!(
                "caption_width_ratio must be within (0, 1], got {}",
                self.caption_width_ratio
            ));
        }
        if self.caption_max_width <= 0.0 {
            return bad(format!("caption_max_width must be positive, got {}", self.caption_max_width));
        }
        if self.center_tolerance < 0.0 {
            return bad(format!("center_tolerance must not be negative, got {}", self.center_tolerance));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/companion/presenter.toml` or
/// `~/.config/companion/presenter.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("companion").join("presenter.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the merged values are out of range. A missing config file is not an error.
pub fn load_config() -> Result<PresenterConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// `None` uses only defaults and environment variables.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the merged values are out of range.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<PresenterConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<PresenterConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = PresenterConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: CompanionToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut PresenterConfig, toml: &CompanionToml) {
    let p = &toml.presenter;
    if let Some(ms) = p.fade_ms {
        config.fade = Duration::from_millis(ms);
    }
    if let Some(y) = p.top_offset {
        config.top_offset = y;
    }
    if let Some(margin) = p.bottom_margin {
        config.bottom_margin = margin;
    }
    if let Some(ratio) = p.caption_width_ratio {
        config.caption_width_ratio = ratio;
    }
    if let Some(width) = p.caption_max_width {
        config.caption_max_width = width;
    }
    if let Some(tolerance) = p.center_tolerance {
        config.center_tolerance = tolerance;
    }
    if let Some(anchor) = p.resize_anchor {
        config.resize_anchor = anchor;
    }

    let m = &toml.motion;
    if let Some(preference) = m.preference {
        config.motion = preference;
    }
    if let Some(ms) = m.idle_period_ms {
        config.idle_period = Duration::from_millis(ms);
    }
    if let Some(amplitude) = m.float_amplitude {
        config.float_amplitude = amplitude;
    }
    if let Some(scale) = m.breath_scale {
        config.breath_scale = scale;
    }
    if let Some(nudge) = m.breath_nudge {
        config.breath_nudge = nudge;
    }

    if toml.assets.dir.is_some() {
        config.assets_dir = toml.assets.dir.clone();
    }
    if let Some(procedural) = toml.assets.procedural {
        config.force_procedural = procedural;
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut PresenterConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = env(FADE_MS_ENV) {
        if let Ok(ms) = value.trim().parse::<u64>() {
            config.fade = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }

    if let Some(value) = env(IDLE_PERIOD_ENV) {
        if let Ok(ms) = value.trim().parse::<u64>() {
            config.idle_period = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }

    if let Some(dir) = env(ASSETS_DIR_ENV) {
        if !dir.trim().is_empty() {
            config.assets_dir = Some(PathBuf::from(dir));
            config.source = ConfigSource::Env;
        }
    }

    if let Some(value) = env(REDUCE_MOTION_ENV) {
        config.motion = parse_motion_preference(&value);
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Asset directory override
    pub assets_dir: Option<PathBuf>,
    /// Force procedural synthesis
    pub force_procedural: Option<bool>,
    /// Motion preference override
    pub motion: Option<MotionPreference>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_assets_dir(mut self, dir: PathBuf) -> Self {
        self.assets_dir = Some(dir);
        self
    }

    #[must_use]
    pub fn with_force_procedural(mut self, procedural: bool) -> Self {
        self.force_procedural = Some(procedural);
        self
    }

    #[must_use]
    pub fn with_motion(mut self, motion: MotionPreference) -> Self {
        self.motion = Some(motion);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut PresenterConfig) {
        if self.assets_dir.is_some() || self.force_procedural.is_some() || self.motion.is_some() {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref dir) = self.assets_dir {
            config.assets_dir = Some(dir.clone());
        }
        if let Some(procedural) = self.force_procedural {
            config.force_procedural = procedural;
        }
        if let Some(motion) = self.motion {
            config.motion = motion;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // =========================================================================
    // Default Configuration Tests
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = PresenterConfig::default();
        assert_eq!(config.fade, Duration::from_millis(600));
        assert_eq!(config.idle_period, Duration::from_millis(2800));
        assert_eq!(config.top_offset, 278.0);
        assert_eq!(config.bottom_margin, 90.0);
        assert_eq!(config.caption_max_width, 420.0);
        assert_eq!(config.resize_anchor, ResizeAnchor::Stored);
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.to_string_lossy().contains("companion"));
            assert!(p.to_string_lossy().ends_with("presenter.toml"));
        }
    }

    // =========================================================================
    // TOML Parsing Tests
    // =========================================================================

    #[test]
    fn test_parse_valid_toml() {
        let file = write_toml(
            r#"
[presenter]
fade_ms = 400
top_offset = 200
caption_max_width = 360
resize_anchor = "inferred"

[motion]
preference = "reduced"
idle_period_ms = 2000
float_amplitude = 5.0

[assets]
dir = "/tmp/companion-art"
procedural = true
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();
        assert_eq!(config.fade, Duration::from_millis(400));
        assert_eq!(config.top_offset, 200.0);
        assert_eq!(config.caption_max_width, 360.0);
        assert_eq!(config.resize_anchor, ResizeAnchor::Inferred);
        assert_eq!(config.motion, MotionPreference::Reduced);
        assert_eq!(config.idle_period, Duration::from_millis(2000));
        assert_eq!(config.float_amplitude, 5.0);
        assert_eq!(config.assets_dir, Some(PathBuf::from("/tmp/companion-art")));
        assert!(config.force_procedural);
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_parse_partial_toml() {
        let file = write_toml("[motion]\nbreath_scale = 0.02\n");
        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.breath_scale, 0.02);
        assert_eq!(config.fade, Duration::from_millis(600));
        assert_eq!(config.caption_width_ratio, 0.8);
    }

    #[test]
    fn test_missing_file_graceful() {
        let path = PathBuf::from("/nonexistent/path/presenter.toml");
        let config = load_config_with_env(Some(path), no_env).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_malformed_toml_error() {
        let file = write_toml("[presenter\nfade_ms = \"slow\"\n");
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_out_of_range_is_validation_error() {
        let file = write_toml("[presenter]\ncaption_width_ratio = 1.5\n");
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        match result {
            Err(ConfigError::ValidationError(msg)) => assert!(msg.contains("caption_width_ratio")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    // =========================================================================
    // Priority Tests
    // =========================================================================

    #[test]
    fn test_env_overrides_file() {
        let file = write_toml("[presenter]\nfade_ms = 400\n[motion]\npreference = \"full\"\n");
        let env: HashMap<&str, &str> = [
            (FADE_MS_ENV, "250"),
            (REDUCE_MOTION_ENV, "none"),
            (ASSETS_DIR_ENV, "/srv/art"),
        ]
        .into_iter()
        .collect();

        let config = load_config_with_env(Some(file.path().to_path_buf()), |key| {
            env.get(key).map(ToString::to_string)
        })
        .unwrap();

        assert_eq!(config.fade, Duration::from_millis(250));
        assert_eq!(config.motion, MotionPreference::None);
        assert_eq!(config.assets_dir, Some(PathBuf::from("/srv/art")));
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_unparseable_env_is_ignored() {
        let config = load_config_with_env(None, |key| {
            (key == IDLE_PERIOD_ENV).then(|| "soon".to_string())
        })
        .unwrap();
        assert_eq!(config.idle_period, Duration::from_millis(2800));
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_cli_overrides_everything() {
        let mut config = load_config_with_env(None, |key| {
            (key == REDUCE_MOTION_ENV).then(|| "1".to_string())
        })
        .unwrap();
        assert_eq!(config.motion, MotionPreference::Reduced);

        ConfigOverrides::new()
            .with_motion(MotionPreference::Full)
            .with_force_procedural(true)
            .apply(&mut config);

        assert_eq!(config.motion, MotionPreference::Full);
        assert!(config.force_procedural);
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_empty_overrides_keep_source() {
        let mut config = PresenterConfig::default();
        ConfigOverrides::new().apply(&mut config);
        assert_eq!(config.source(), ConfigSource::Default);
    }
}
