//! Configuration module.
//!
//! Handles loading, validating, and merging `widecrop.toml`. Stock defaults
//! are overridden by the user's file, and command-line flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [crop]
//! aspect_ratio = [16, 9]    # width:height of the output
//!
//! [output]
//! quality = 95              # JPEG quality (1-100)
//!
//! [archive]
//! folder = "16-9-images"    # Top-level folder inside the archive
//! file_name = "cropped_images_16_9.zip"
//! compression = "stored"    # "stored" or "deflated"
//!
//! [pipeline]
//! on_error = "skip"         # "skip" or "retry" failed items on re-run
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [output]
//! quality = 85
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::batch::{ErrorPolicy, SessionConfig};
use crate::imaging::{AspectRatio, CropSettings, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "widecrop.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration loaded from `widecrop.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Crop geometry.
    pub crop: CropConfig,
    /// Artifact encoding.
    pub output: OutputConfig,
    /// Archive layout and naming.
    pub archive: ArchiveConfig,
    /// Batch behavior.
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.crop.aspect_ratio[0] == 0 || self.crop.aspect_ratio[1] == 0 {
            return Err(ConfigError::Validation(
                "crop.aspect_ratio values must be non-zero".into(),
            ));
        }
        let file_name = &self.archive.file_name;
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "archive.file_name must be a plain file name".into(),
            ));
        }
        if self.archive.folder.contains('\\') || self.archive.folder.contains("..") {
            return Err(ConfigError::Validation(
                "archive.folder must be a relative path inside the archive".into(),
            ));
        }
        Ok(())
    }

    pub fn aspect(&self) -> AspectRatio {
        let [w, h] = self.crop.aspect_ratio;
        AspectRatio::new(w, h).unwrap_or_default()
    }

    pub fn crop_settings(&self) -> CropSettings {
        CropSettings {
            aspect: self.aspect(),
            quality: Quality::new(self.output.quality),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            crop: self.crop_settings(),
            on_error: self.pipeline.on_error,
        }
    }
}

/// Crop geometry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    /// Aspect ratio as `[width, height]`.
    pub aspect_ratio: [u32; 2],
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: [16, 9],
        }
    }
}

/// Artifact encoding settings. The format is always JPEG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// JPEG quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { quality: 95 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// No compression. JPEG data barely shrinks, so this is the default.
    #[default]
    Stored,
    Deflated,
}

/// Archive settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Top-level folder holding every entry. Empty puts entries at the root.
    pub folder: String,
    /// File name of the written archive.
    pub file_name: String,
    pub compression: Compression,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            folder: "16-9-images".to_string(),
            file_name: "cropped_images_16_9.zip".to_string(),
            compression: Compression::Stored,
        }
    }
}

/// Batch pipeline settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Whether a re-run retries items that failed before.
    pub on_error: ErrorPolicy,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the file at `path`, falling back to stock defaults when
/// it does not exist.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `widecrop.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# widecrop configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Crop geometry
# ---------------------------------------------------------------------------
[crop]
# Output aspect ratio as [width, height]. Every image is center-cropped to
# the largest region of this ratio; nothing is scaled.
aspect_ratio = [16, 9]

# ---------------------------------------------------------------------------
# Output encoding (always JPEG)
# ---------------------------------------------------------------------------
[output]
# JPEG quality (1 = worst, 100 = best).
quality = 95

# ---------------------------------------------------------------------------
# Archive
# ---------------------------------------------------------------------------
[archive]
# Folder inside the archive that holds every cropped image.
folder = "16-9-images"

# Name of the archive written to the output directory.
file_name = "cropped_images_16_9.zip"

# "stored" (no compression) or "deflated".
compression = "stored"

# ---------------------------------------------------------------------------
# Pipeline
# ---------------------------------------------------------------------------
[pipeline]
# What a re-run does with images that failed before:
#   "skip"  - leave them as errors
#   "retry" - try them again
on_error = "skip"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.crop.aspect_ratio, [16, 9]);
        assert_eq!(config.output.quality, 95);
        assert_eq!(config.archive.folder, "16-9-images");
        assert_eq!(config.archive.file_name, "cropped_images_16_9.zip");
        assert_eq!(config.archive.compression, Compression::Stored);
        assert_eq!(config.pipeline.on_error, ErrorPolicy::Skip);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[output]
quality = 80
"#;
        let config: Config = toml::from_str(toml).unwrap();
        // Overridden value
        assert_eq!(config.output.quality, 80);
        // Defaults preserved
        assert_eq!(config.crop.aspect_ratio, [16, 9]);
        assert_eq!(config.archive.folder, "16-9-images");
    }

    #[test]
    fn parse_enums() {
        let toml = r#"
[archive]
compression = "deflated"

[pipeline]
on_error = "retry"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.archive.compression, Compression::Deflated);
        assert_eq!(config.pipeline.on_error, ErrorPolicy::Retry);
    }

    #[test]
    fn unknown_keys_rejected() {
        let toml = r#"
[output]
qualty = 80
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<Config, _> = toml::from_str("[resize]\nwidth = 10\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_rejects_quality_out_of_range() {
        let mut config = Config::default();
        config.output.quality = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.output.quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_aspect() {
        let mut config = Config::default();
        config.crop.aspect_ratio = [16, 0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_archive_names() {
        let mut config = Config::default();
        config.archive.file_name = "out/archive.zip".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.archive.file_name = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.archive.folder = "../escape".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    // =========================================================================
    // Merging and loading
    // =========================================================================

    #[test]
    fn merge_overlay_overrides_nested_keys() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[archive]\nfolder = \"wide\"\n").unwrap();

        let config = resolve_config(base, Some(overlay)).unwrap();

        assert_eq!(config.archive.folder, "wide");
        assert_eq!(config.archive.file_name, "cropped_images_16_9.zip");
    }

    #[test]
    fn merge_replaces_arrays_whole() {
        let base: toml::Value = toml::from_str("a = [1, 2]\nb = 1\n").unwrap();
        let overlay: toml::Value = toml::from_str("a = [3]\n").unwrap();

        let merged = merge_toml(base, overlay);

        assert_eq!(merged["a"].as_array().unwrap().len(), 1);
        assert_eq!(merged["b"].as_integer(), Some(1));
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("widecrop.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_file_overrides_and_validates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("widecrop.toml");
        fs::write(&path, "[crop]\naspect_ratio = [4, 3]\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.aspect(), AspectRatio::new(4, 3).unwrap());

        fs::write(&path, "[output]\nquality = 0\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_invalid_toml_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("widecrop.toml");
        fs::write(&path, "[output\nquality = 1").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: Config = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn session_config_carries_settings() {
        let mut config = Config::default();
        config.output.quality = 70;
        config.pipeline.on_error = ErrorPolicy::Retry;

        let session = config.session_config();
        assert_eq!(session.crop.quality, Quality::new(70));
        assert_eq!(session.crop.aspect, AspectRatio::SIXTEEN_NINE);
        assert_eq!(session.on_error, ErrorPolicy::Retry);
    }
}
