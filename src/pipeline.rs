// SPDX-License-Identifier: MPL-2.0
//! Enhancement orchestration.
//!
//! [`Enhancer`] chains the colorization and upscaling stages according to an
//! [`EnhanceMode`]. Colorization always runs first, so in
//! [`EnhanceMode::Both`] the upscaler sees the colorized intermediate.
//!
//! # Example
//!
//! ```ignore
//! use image_hd::pipeline::Enhancer;
//! use image_hd::infrastructure::{NcnnUpscaler, OnnxColorizer};
//!
//! let config = image_hd::config::load()?;
//! let enhancer = Enhancer::from_config(
//!     &config,
//!     Box::new(OnnxColorizer::from_config(&config.colorize)),
//!     Box::new(NcnnUpscaler::from_config(&config.upscale)),
//! );
//! enhancer.run("old.jpg".as_ref(), "old_hd.png".as_ref(), EnhanceMode::Both, ScaleFactor::X4)?;
//! ```

use crate::application::port::{Colorizer, Upscaler};
use crate::config::defaults::{DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR};
use crate::config::{Config, DEFAULT_GRAYSCALE_THRESHOLD};
use crate::domain::{EnhanceMode, ScaleFactor};
use crate::media::{self, ColorizeError, UpscaleError};
use std::path::{Path, PathBuf};

/// Result type for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that can abort a pipeline run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error(transparent)]
    Media(#[from] crate::error::Error),
    #[error("Colorization failed: {0}")]
    Colorize(#[from] ColorizeError),
    #[error("Upscaling failed: {0}")]
    Upscale(#[from] UpscaleError),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}

/// Runs enhancement jobs against a pair of stages.
pub struct Enhancer {
    colorizer: Box<dyn Colorizer>,
    upscaler: Box<dyn Upscaler>,
    grayscale_threshold: f32,
    fallback_to_grayscale: bool,
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl Enhancer {
    /// Creates an enhancer with default thresholds and working directories.
    #[must_use]
    pub fn new(colorizer: Box<dyn Colorizer>, upscaler: Box<dyn Upscaler>) -> Self {
        Self {
            colorizer,
            upscaler,
            grayscale_threshold: DEFAULT_GRAYSCALE_THRESHOLD,
            fallback_to_grayscale: true,
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }

    /// Creates an enhancer using the thresholds and directories in `config`.
    #[must_use]
    pub fn from_config(
        config: &Config,
        colorizer: Box<dyn Colorizer>,
        upscaler: Box<dyn Upscaler>,
    ) -> Self {
        Self::new(colorizer, upscaler)
            .with_grayscale_threshold(config.colorize.grayscale_threshold)
            .with_fallback_to_grayscale(config.colorize.fallback_to_grayscale)
            .with_dirs(&config.paths.input_dir, &config.paths.output_dir)
    }

    #[must_use]
    pub fn with_grayscale_threshold(mut self, threshold: f32) -> Self {
        self.grayscale_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_fallback_to_grayscale(mut self, enabled: bool) -> Self {
        self.fallback_to_grayscale = enabled;
        self
    }

    /// Sets the directories relative inputs and outputs resolve against.
    #[must_use]
    pub fn with_dirs(mut self, input_dir: &Path, output_dir: &Path) -> Self {
        self.input_dir = input_dir.to_path_buf();
        self.output_dir = output_dir.to_path_buf();
        self
    }

    /// Creates the input and output working directories.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn ensure_dirs(&self) -> PipelineResult<()> {
        std::fs::create_dir_all(&self.input_dir)?;
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// Relative inputs live in the input directory.
    #[must_use]
    pub fn resolve_input(&self, input: &Path) -> PathBuf {
        resolve_under(&self.input_dir, input)
    }

    /// Relative outputs go to the output directory.
    #[must_use]
    pub fn resolve_output(&self, output: &Path) -> PathBuf {
        resolve_under(&self.output_dir, output)
    }

    /// Runs one job and returns the path the result was written to.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is missing or a stage fails. With
    /// grayscale fallback enabled, colorization failures are not errors.
    pub fn run(
        &self,
        input: &Path,
        output: &Path,
        mode: EnhanceMode,
        scale: ScaleFactor,
    ) -> PipelineResult<PathBuf> {
        let input = self.resolve_input(input);
        let output = self.resolve_output(output);

        if !input.is_file() {
            return Err(PipelineError::InputNotFound(input));
        }
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(%mode, %scale, input = %input.display(), "processing");
        match mode {
            EnhanceMode::Enhance => self.upscaler.upscale(&input, &output, scale)?,
            EnhanceMode::Colorize => self.colorize_if_grayscale(&input, &output)?,
            EnhanceMode::Both => {
                // Removed on drop, including when a stage fails.
                let scratch = tempfile::Builder::new().prefix("image_hd_").tempdir()?;
                let intermediate = scratch.path().join("colorized.png");
                self.colorize_if_grayscale(&input, &intermediate)?;
                self.upscaler.upscale(&intermediate, &output, scale)?;
            }
        }

        tracing::info!(output = %output.display(), "done");
        Ok(output)
    }

    /// Colorizes `input` into `output` if it is grayscale, otherwise copies
    /// it through re-encoded in the output format.
    fn colorize_if_grayscale(&self, input: &Path, output: &Path) -> PipelineResult<()> {
        let image = media::load_image(input)?;

        if !media::is_grayscale(&image, self.grayscale_threshold) {
            tracing::warn!("image is already in color, skipping colorization");
            media::save_rgb(&image.to_rgb8(), output)?;
            return Ok(());
        }

        tracing::info!(model = self.colorizer.name(), "colorizing grayscale image");
        let colorized = match self.colorizer.colorize(&image.to_rgb8()) {
            Ok(colorized) => colorized,
            Err(e) if self.fallback_to_grayscale => {
                tracing::warn!("colorizer error: {e}; writing grayscale image instead");
                media::grayscale_rgb(&image)
            }
            Err(e) => return Err(e.into()),
        };
        media::save_rgb(&colorized, output)?;
        Ok(())
    }
}

fn resolve_under(dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dir.join(path)
    }
}
