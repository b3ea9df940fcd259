// SPDX-License-Identifier: MPL-2.0
//! This module handles the application's configuration, including loading and saving
//! settings from a `settings.toml` file.
//!
//! Every field has a default, so a partial file (or no file at all) is valid.
//!
//! # Examples
//!
//! ```no_run
//! use image_hd::config::{self, Config};
//!
//! let mut config = config::load().unwrap_or_default();
//! config.server.port = 8080;
//! config::save_to_path(&config, std::path::Path::new("settings.toml"))
//!     .expect("Failed to save config");
//! ```

pub mod defaults;

use crate::app::paths;
use crate::domain::{ColorizerModel, Device, ScaleFactor};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use defaults::DEFAULT_GRAYSCALE_THRESHOLD;

const CONFIG_FILE: &str = "settings.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub colorize: ColorizeConfig,
    pub upscale: UpscaleConfig,
    pub server: ServerConfig,
}

/// Working directories for uploads and results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(defaults::DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(defaults::DEFAULT_OUTPUT_DIR),
        }
    }
}

/// Colorization stage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorizeConfig {
    pub model: ColorizerModel,
    pub device: Device,
    pub saturation_boost: f32,
    pub grayscale_threshold: f32,
    /// Write the grayscale rendering instead of failing when inference errors.
    pub fallback_to_grayscale: bool,
    pub eccv16_path: Option<PathBuf>,
    pub siggraph17_path: Option<PathBuf>,
    pub eccv16_url: Option<String>,
    pub siggraph17_url: Option<String>,
    pub eccv16_blake3: Option<String>,
    pub siggraph17_blake3: Option<String>,
}

impl Default for ColorizeConfig {
    fn default() -> Self {
        Self {
            model: ColorizerModel::default(),
            device: Device::default(),
            saturation_boost: defaults::DEFAULT_SATURATION_BOOST,
            grayscale_threshold: defaults::DEFAULT_GRAYSCALE_THRESHOLD,
            fallback_to_grayscale: true,
            eccv16_path: None,
            siggraph17_path: None,
            eccv16_url: None,
            siggraph17_url: None,
            eccv16_blake3: None,
            siggraph17_blake3: None,
        }
    }
}

impl ColorizeConfig {
    /// Saturation multiplier clamped to the supported range.
    #[must_use]
    pub fn saturation(&self) -> f32 {
        if self.saturation_boost.is_nan() {
            return defaults::DEFAULT_SATURATION_BOOST;
        }
        self.saturation_boost
            .clamp(defaults::MIN_SATURATION_BOOST, defaults::MAX_SATURATION_BOOST)
    }

    /// Location of the ONNX graph for `model`.
    ///
    /// An explicit path from the config wins; otherwise the model lives in
    /// the `models` folder of the data directory.
    #[must_use]
    pub fn model_path(&self, model: ColorizerModel) -> PathBuf {
        let explicit = match model {
            ColorizerModel::Eccv16 => self.eccv16_path.as_ref(),
            ColorizerModel::Siggraph17 => self.siggraph17_path.as_ref(),
        };
        explicit
            .cloned()
            .unwrap_or_else(|| paths::models_dir().join(model.file_name()))
    }

    /// Download URL configured for `model`, if any.
    #[must_use]
    pub fn model_url(&self, model: ColorizerModel) -> Option<&str> {
        match model {
            ColorizerModel::Eccv16 => self.eccv16_url.as_deref(),
            ColorizerModel::Siggraph17 => self.siggraph17_url.as_deref(),
        }
    }

    /// Expected BLAKE3 checksum (hex) for `model`, if any.
    #[must_use]
    pub fn model_checksum(&self, model: ColorizerModel) -> Option<&str> {
        match model {
            ColorizerModel::Eccv16 => self.eccv16_blake3.as_deref(),
            ColorizerModel::Siggraph17 => self.siggraph17_blake3.as_deref(),
        }
    }
}

/// Super-resolution stage settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpscaleConfig {
    /// Explicit path to the Real-ESRGAN executable.
    pub executable: Option<PathBuf>,
    pub scale: ScaleFactor,
}

/// HTTP façade settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
    pub max_upload_mb: usize,
    /// Enhancement binary to spawn; defaults to the one next to the server.
    pub enhancer_bin: Option<PathBuf>,
    /// File receiving the command line and output of the last job.
    pub debug_log: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::DEFAULT_HOST.to_string(),
            port: defaults::DEFAULT_PORT,
            timeout_secs: defaults::DEFAULT_TIMEOUT_SECS,
            max_upload_mb: defaults::DEFAULT_MAX_UPLOAD_MB,
            enhancer_bin: None,
            debug_log: None,
        }
    }
}

impl ServerConfig {
    /// Subprocess time budget, bounded to `1..=MAX_TIMEOUT_SECS`.
    #[must_use]
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs.clamp(1, defaults::MAX_TIMEOUT_SECS))
    }

    /// Upload limit in bytes.
    #[must_use]
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.max(1).saturating_mul(1024 * 1024)
    }
}

fn default_config_path() -> Option<PathBuf> {
    paths::get_app_config_dir().map(|path| path.join(CONFIG_FILE))
}

pub fn load() -> Result<Config> {
    if let Some(path) = default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(Config::default())
}

pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    match toml::from_str(&content) {
        Ok(config) => Ok(config),
        Err(err) => {
            tracing::warn!(path = %path.display(), "invalid config, using defaults: {err}");
            Ok(Config::default())
        }
    }
}

pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
