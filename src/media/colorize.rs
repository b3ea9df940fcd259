// SPDX-License-Identifier: MPL-2.0
//! AI-powered colorization of grayscale photos using ECCV16 / SIGGRAPH17 ONNX models.
//!
//! This module provides functionality for:
//! - Loading the exported networks into ONNX Runtime sessions, memoized per
//!   `(model, device)` for the lifetime of the process
//! - Converting an image into the lightness tensor the networks expect
//! - Merging the predicted chrominance back into the full-resolution image
//!
//! # Colorization Strategy
//!
//! The networks work at a fixed 256x256 resolution. The image is resized,
//! its L channel fed to the model, and the predicted `ab` planes upsampled
//! bilinearly to the original size. They are then combined with the
//! *original* L channel so no detail is lost to the resize.

use crate::config::defaults::COLORIZER_INPUT_SIZE;
use crate::config::ColorizeConfig;
use crate::domain::{ColorizerModel, Device};
use crate::media::color;
use image_rs::imageops::{self, FilterType};
use image_rs::RgbImage;
use ndarray::{Array2, Array3, Array4, Axis};
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

/// Result type for colorization operations.
pub type ColorizeResult<T> = Result<T, ColorizeError>;

/// Errors that can occur during colorization.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ColorizeError {
    /// Model file not found at expected path.
    #[error("Model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),
    /// ONNX Runtime rejected the model.
    #[error("Failed to load model: {0}")]
    ModelLoadFailed(String),
    /// Failed to download the model.
    #[error("Download failed: {0}")]
    DownloadFailed(String),
    /// Model checksum verification failed.
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
    /// ONNX inference failed.
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    /// Image preprocessing failed.
    #[error("Preprocessing failed: {0}")]
    PreprocessingFailed(String),
    /// Image postprocessing failed.
    #[error("Postprocessing failed: {0}")]
    PostprocessingFailed(String),
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(String),
    /// A shared session mutex was poisoned by a panicking thread.
    #[error("Lock poisoned")]
    LockPoisoned,
}

impl From<std::io::Error> for ColorizeError {
    fn from(err: std::io::Error) -> Self {
        ColorizeError::Io(err.to_string())
    }
}

// =============================================================================
// Model cache
// =============================================================================

/// Memo of loaded models keyed by `K`.
///
/// Entries are created on first use and never evicted. The map lock is held
/// while loading so two callers never load the same model twice.
pub struct ModelCache<K, V> {
    entries: Mutex<HashMap<K, Arc<Mutex<V>>>>,
}

impl<K, V> Default for ModelCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Copy, V> ModelCache<K, V> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, running `load` on a miss.
    ///
    /// A failed load is not cached; the next call retries.
    ///
    /// # Errors
    ///
    /// Returns the loader's error, or [`ColorizeError::LockPoisoned`].
    pub fn get_or_load<F>(&self, key: K, load: F) -> ColorizeResult<Arc<Mutex<V>>>
    where
        F: FnOnce() -> ColorizeResult<V>,
    {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ColorizeError::LockPoisoned)?;
        if let Some(existing) = entries.get(&key) {
            return Ok(Arc::clone(existing));
        }
        let value = Arc::new(Mutex::new(load()?));
        entries.insert(key, Arc::clone(&value));
        Ok(value)
    }

    /// Number of loaded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Returns `true` if nothing has been loaded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-wide cache of colorization sessions.
pub type ColorizerCache = ModelCache<(ColorizerModel, Device), Session>;

/// Shared handle to a loaded session.
pub type SharedSession = Arc<Mutex<Session>>;

/// Returns the process-wide session cache.
pub fn session_cache() -> &'static ColorizerCache {
    static CACHE: OnceLock<ColorizerCache> = OnceLock::new();
    CACHE.get_or_init(ColorizerCache::new)
}

/// Builds an ONNX Runtime session for the model at `path`.
///
/// # Errors
///
/// Returns [`ColorizeError::ModelNotFound`] if the file is missing, or
/// [`ColorizeError::ModelLoadFailed`] if ONNX Runtime rejects it.
pub fn load_session(path: &Path, device: Device) -> ColorizeResult<Session> {
    if !path.exists() {
        return Err(ColorizeError::ModelNotFound(path.to_path_buf()));
    }

    #[cfg_attr(not(feature = "cuda"), allow(unused_mut))]
    let mut builder = Session::builder()
        .map_err(|e| ColorizeError::ModelLoadFailed(e.to_string()))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| ColorizeError::ModelLoadFailed(e.to_string()))?;

    if device == Device::Cuda {
        #[cfg(feature = "cuda")]
        {
            builder = builder
                .with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default().build(),
                ])
                .map_err(|e| ColorizeError::ModelLoadFailed(e.to_string()))?;
        }
        #[cfg(not(feature = "cuda"))]
        return Err(ColorizeError::ModelLoadFailed(
            "CUDA execution provider requested but the cuda feature is not enabled".to_string(),
        ));
    }

    builder
        .commit_from_file(path)
        .map_err(|e| ColorizeError::ModelLoadFailed(e.to_string()))
}

// =============================================================================
// ColorizeManager
// =============================================================================

/// Manager for one colorization model on one device.
///
/// Handles model lookup, lazy session loading and inference.
pub struct ColorizeManager {
    model: ColorizerModel,
    device: Device,
    model_path: PathBuf,
    saturation: f32,
    session: Option<SharedSession>,
}

impl ColorizeManager {
    /// Creates a manager; the session is loaded on first use.
    #[must_use]
    pub fn new(model: ColorizerModel, device: Device, model_path: PathBuf, saturation: f32) -> Self {
        Self {
            model,
            device,
            model_path,
            saturation,
            session: None,
        }
    }

    /// Creates a manager for the model selected in the config.
    #[must_use]
    pub fn from_config(config: &ColorizeConfig) -> Self {
        Self::new(
            config.model,
            config.device,
            config.model_path(config.model),
            config.saturation(),
        )
    }

    /// The network variant this manager runs.
    #[must_use]
    pub fn model(&self) -> ColorizerModel {
        self.model
    }

    /// Returns the path where the model is/will be stored.
    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Checks if the model file exists on disk.
    #[must_use]
    pub fn is_model_downloaded(&self) -> bool {
        self.model_path.exists()
    }

    /// Fetches the session from the process-wide cache, loading it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the model file is missing or cannot be loaded.
    pub fn load_session(&mut self) -> ColorizeResult<()> {
        if self.session.is_some() {
            return Ok(());
        }
        let (path, device) = (&self.model_path, self.device);
        let session = session_cache()
            .get_or_load((self.model, device), || {
                tracing::info!(model = %self.model, %device, path = %path.display(), "loading colorization model");
                load_session(path, device)
            })?;
        self.session = Some(session);
        Ok(())
    }

    /// Colorizes an image, returning an RGB image of the same dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be loaded, the image is empty,
    /// or inference fails.
    pub fn colorize(&mut self, image: &RgbImage) -> ColorizeResult<RgbImage> {
        self.load_session()?;
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| ColorizeError::ModelLoadFailed("session not initialized".to_string()))?;

        let prepared = preprocess(image)?;
        let ab = {
            let mut session = session.lock().map_err(|_| ColorizeError::LockPoisoned)?;
            predict_ab(&mut session, &prepared.input)?
        };
        postprocess(&prepared.original_l, &ab, self.saturation)
    }
}

// =============================================================================
// Pre/post-processing
// =============================================================================

/// Network input derived from an image.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Lightness plane of the image at its original resolution.
    pub original_l: Array2<f32>,
    /// Lightness of the resized image as a `(1, 1, 256, 256)` tensor.
    pub input: Array4<f32>,
}

/// Prepares an image for the colorization network.
///
/// # Errors
///
/// Returns [`ColorizeError::PreprocessingFailed`] for an empty image.
pub fn preprocess(image: &RgbImage) -> ColorizeResult<Preprocessed> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ColorizeError::PreprocessingFailed(format!(
            "empty image ({width}x{height})"
        )));
    }

    let resized = imageops::resize(
        image,
        COLORIZER_INPUT_SIZE,
        COLORIZER_INPUT_SIZE,
        FilterType::CatmullRom,
    );

    let input = color::lightness(&resized)
        .insert_axis(Axis(0))
        .insert_axis(Axis(0));

    Ok(Preprocessed {
        original_l: color::lightness(image),
        input,
    })
}

/// Runs the network and returns the predicted `(2, h, w)` chrominance.
///
/// SIGGRAPH17 exports take two extra inputs (user color hints and their
/// mask); they are fed zeros, which is the automatic colorization mode.
fn predict_ab(session: &mut Session, input: &Array4<f32>) -> ColorizeResult<Array3<f32>> {
    let input = input.as_standard_layout().into_owned();
    let (_, _, height, width) = input.dim();

    let names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
    let hint = Array4::<f32>::zeros((1, 2, height, width));
    let mask = Array4::<f32>::zeros((1, 1, height, width));

    let l_ref = ort::value::TensorRef::from_array_view(&input)
        .map_err(|e| ColorizeError::InferenceFailed(e.to_string()))?;

    let outputs = match names.as_slice() {
        [l_name] => session.run(ort::inputs![l_name.as_str() => l_ref]),
        [l_name, hint_name, mask_name] => {
            let hint_ref = ort::value::TensorRef::from_array_view(&hint)
                .map_err(|e| ColorizeError::InferenceFailed(e.to_string()))?;
            let mask_ref = ort::value::TensorRef::from_array_view(&mask)
                .map_err(|e| ColorizeError::InferenceFailed(e.to_string()))?;
            session.run(ort::inputs![
                l_name.as_str() => l_ref,
                hint_name.as_str() => hint_ref,
                mask_name.as_str() => mask_ref
            ])
        }
        other => {
            return Err(ColorizeError::InferenceFailed(format!(
                "unsupported model signature with {} inputs",
                other.len()
            )))
        }
    }
    .map_err(|e| ColorizeError::InferenceFailed(e.to_string()))?;

    extract_ab(&outputs)
}

fn extract_ab(outputs: &SessionOutputs<'_>) -> ColorizeResult<Array3<f32>> {
    let (_, output) = outputs
        .iter()
        .next()
        .ok_or_else(|| ColorizeError::PostprocessingFailed("No output tensor".to_string()))?;

    let (shape, data) = output
        .try_extract_tensor::<f32>()
        .map_err(|e: ort::Error| ColorizeError::PostprocessingFailed(e.to_string()))?;

    // Shape is NCHW: [1, 2, height, width]
    if shape.len() != 4 || shape[1] != 2 {
        return Err(ColorizeError::PostprocessingFailed(format!(
            "expected [1, 2, H, W] output, got {:?}",
            &shape[..]
        )));
    }
    let height = usize::try_from(shape[2])
        .map_err(|_| ColorizeError::PostprocessingFailed("Invalid tensor height".to_string()))?;
    let width = usize::try_from(shape[3])
        .map_err(|_| ColorizeError::PostprocessingFailed("Invalid tensor width".to_string()))?;

    let len = 2 * height * width;
    if data.len() < len {
        return Err(ColorizeError::PostprocessingFailed(format!(
            "output has {} values, expected {len}",
            data.len()
        )));
    }
    Array3::from_shape_vec((2, height, width), data[..len].to_vec())
        .map_err(|e| ColorizeError::PostprocessingFailed(e.to_string()))
}

/// Combines the original lightness with predicted chrominance.
///
/// `ab` is resized to the lightness resolution when needed, the Lab image is
/// converted to RGB (clipped to gamut) and the saturation boost applied.
///
/// # Errors
///
/// Returns [`ColorizeError::PostprocessingFailed`] if `ab` does not have two
/// channels.
pub fn postprocess(
    original_l: &Array2<f32>,
    ab: &Array3<f32>,
    saturation: f32,
) -> ColorizeResult<RgbImage> {
    if ab.dim().0 != 2 {
        return Err(ColorizeError::PostprocessingFailed(format!(
            "expected 2 chrominance channels, got {}",
            ab.dim().0
        )));
    }

    let (height, width) = original_l.dim();
    let mut ab_full = Array3::<f32>::zeros((2, height, width));
    for channel in 0..2 {
        let resized = color::resize_bilinear(ab.index_axis(Axis(0), channel), height, width);
        ab_full.index_axis_mut(Axis(0), channel).assign(&resized);
    }

    let mut rgb = color::lab_to_rgb(original_l.view(), ab_full.view());
    color::adjust_saturation(&mut rgb, saturation);
    Ok(rgb)
}

/// Validates a freshly downloaded model by running a test inference.
///
/// # Errors
///
/// Returns an error if the model cannot be loaded or its output does not
/// match the input size.
pub fn validate_model(manager: &mut ColorizeManager) -> ColorizeResult<()> {
    let test_image = RgbImage::from_pixel(64, 64, image_rs::Rgb([128, 128, 128]));
    let result = manager.colorize(&test_image)?;
    if result.dimensions() != (64, 64) {
        return Err(ColorizeError::InferenceFailed(format!(
            "Unexpected output size: {}x{}, expected 64x64",
            result.width(),
            result.height()
        )));
    }
    Ok(())
}
