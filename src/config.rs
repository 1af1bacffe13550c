//! Application configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults
//! are the base layer; a `config.toml` in the config directory overrides
//! any subset of them.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [parameters]
//! intensity = 0.5           # Initial slider values, each in [0, 1]
//! radius = 0.5
//! scale = 0.5
//!
//! [scaling]
//! radius_factor = 200.0     # native radius = intensity x radius_factor
//! scale_factor = 10.0       # native scale  = intensity x scale_factor
//!
//! [feedback]
//! threshold = 3             # Filter changes before asking for a review
//! policy = "first-crossing" # or "every-time"
//!
//! [preferences]
//! path = "preferences.json" # Relative paths resolve against the config dir
//!
//! [processing]
//! max_threads = 4           # Max filter threads (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [feedback]
//! policy = "every-time"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::feedback::FeedbackPolicy;
use crate::filters::{FilterParameters, Scaling};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Application configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Slider values a fresh pipeline starts with.
    pub parameters: FilterParameters,
    /// Intensity-to-native multipliers for radius and scale.
    pub scaling: Scaling,
    /// When to ask for a review.
    pub feedback: FeedbackConfig,
    /// Where the usage counter is persisted.
    pub preferences: PreferencesConfig,
    /// Parallel filter settings.
    pub processing: ProcessingConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("intensity", self.parameters.intensity),
            ("radius", self.parameters.radius),
            ("scale", self.parameters.scale),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "parameters.{name} must be between 0 and 1"
                )));
            }
        }
        for (name, value) in [
            ("radius_factor", self.scaling.radius_factor),
            ("scale_factor", self.scaling.scale_factor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "scaling.{name} must be a non-negative number"
                )));
            }
        }
        if self.feedback.threshold == 0 {
            return Err(ConfigError::Validation(
                "feedback.threshold must be at least 1".into(),
            ));
        }
        if self.preferences.path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "preferences.path must not be empty".into(),
            ));
        }
        if self.processing.max_threads == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_threads must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Review-request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedbackConfig {
    /// Number of filter changes at which feedback is requested.
    pub threshold: u32,
    pub policy: FeedbackPolicy,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            policy: FeedbackPolicy::default(),
        }
    }
}

/// Preference store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreferencesConfig {
    pub path: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: crate::store::PREFERENCES_FILENAME.to_string(),
        }
    }
}

impl PreferencesConfig {
    /// Absolute paths are used as-is; relative ones hang off `config_dir`.
    pub fn resolve(&self, config_dir: &Path) -> PathBuf {
        let path = Path::new(&self.path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            config_dir.join(path)
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of threads filter loops may use.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_threads.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the defaults.
pub fn load_config(dir: &Path) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# photofilter configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Initial slider values
# ---------------------------------------------------------------------------
[parameters]
# Each slider runs from 0 to 1. Only sliders the selected filter exposes
# are shown; the others keep their value across filter changes.
intensity = 0.5
radius = 0.5
scale = 0.5

# ---------------------------------------------------------------------------
# Slider scaling
# ---------------------------------------------------------------------------
[scaling]
# Radius and scale are driven by the intensity slider:
#   native radius = intensity * radius_factor
#   native scale  = intensity * scale_factor
radius_factor = 200.0
scale_factor = 10.0

# ---------------------------------------------------------------------------
# Review requests
# ---------------------------------------------------------------------------
[feedback]
# Number of filter changes before asking for a review.
threshold = 3

# "first-crossing": ask once, on the change that reaches the threshold.
# "every-time":     ask on every change at or past the threshold.
policy = "first-crossing"

# ---------------------------------------------------------------------------
# Preference store
# ---------------------------------------------------------------------------
[preferences]
# JSON file holding the filter-change counter.
# Relative paths are resolved against the config directory.
path = "preferences.json"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum threads for filter pixel loops.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_threads = 4
"##
}
