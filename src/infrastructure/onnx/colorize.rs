// SPDX-License-Identifier: MPL-2.0
//! ONNX colorization adapter implementing the [`Colorizer`] trait.
//!
//! [`Colorizer`]: crate::application::port::Colorizer

use std::sync::{Arc, Mutex};

use crate::application::port::Colorizer;
use crate::config::ColorizeConfig;
use crate::domain::ColorizerModel;
use crate::media::{ColorizeError, ColorizeManager, ColorizeResult};
use image_rs::RgbImage;

/// ONNX-based colorizer (ECCV16 or SIGGRAPH17).
///
/// Wraps a [`ColorizeManager`]; sessions themselves are shared through the
/// process-wide cache, so several adapters for the same model and device
/// only load it once.
///
/// # Thread Safety
///
/// This type is `Send + Sync` via internal locking.
pub struct OnnxColorizer {
    manager: Arc<Mutex<ColorizeManager>>,
    model: ColorizerModel,
}

impl OnnxColorizer {
    /// Creates a colorizer for the model selected in `config`.
    #[must_use]
    pub fn from_config(config: &ColorizeConfig) -> Self {
        Self::from_manager(ColorizeManager::from_config(config))
    }

    /// Creates a colorizer around an existing manager.
    #[must_use]
    pub fn from_manager(manager: ColorizeManager) -> Self {
        let model = manager.model();
        Self {
            manager: Arc::new(Mutex::new(manager)),
            model,
        }
    }
}

impl Colorizer for OnnxColorizer {
    fn colorize(&self, image: &RgbImage) -> ColorizeResult<RgbImage> {
        self.manager
            .lock()
            .map_err(|_| ColorizeError::LockPoisoned)?
            .colorize(image)
    }

    fn name(&self) -> &str {
        self.model.display_name()
    }
}
