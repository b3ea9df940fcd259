// SPDX-License-Identifier: MPL-2.0
//! Enhancement stage ports.
//!
//! The pipeline only talks to these traits, so the ONNX colorizer and the
//! NCNN upscaler can be replaced by test doubles.

use crate::domain::ScaleFactor;
use crate::media::{ColorizeResult, UpscaleResult};
use image_rs::RgbImage;
use std::path::Path;

// =============================================================================
// Colorizer
// =============================================================================

/// Port for colorizing a grayscale photo.
pub trait Colorizer: Send + Sync {
    /// Returns a colorized image with the same dimensions as `image`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is unavailable or inference fails.
    fn colorize(&self, image: &RgbImage) -> ColorizeResult<RgbImage>;

    /// Short name used in log messages.
    fn name(&self) -> &str;
}

// =============================================================================
// Upscaler
// =============================================================================

/// Port for file-to-file super-resolution.
///
/// Works on paths rather than decoded images because the backing tool is an
/// external executable.
pub trait Upscaler: Send + Sync {
    /// Upscales `input` by `scale`, writing the result to `output`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool is missing, fails, or produces no
    /// readable output.
    fn upscale(&self, input: &Path, output: &Path, scale: ScaleFactor) -> UpscaleResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{ColorizeError, UpscaleError};
    use crate::test_utils::solid_rgb;

    struct MockColorizer {
        ready: bool,
    }

    impl Colorizer for MockColorizer {
        fn colorize(&self, image: &RgbImage) -> ColorizeResult<RgbImage> {
            if !self.ready {
                return Err(ColorizeError::ModelLoadFailed("not ready".into()));
            }
            Ok(image.clone())
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    struct MissingUpscaler;

    impl Upscaler for MissingUpscaler {
        fn upscale(&self, _: &Path, _: &Path, _: ScaleFactor) -> UpscaleResult<()> {
            Err(UpscaleError::ExecutableNotFound("mock".into()))
        }
    }

    #[test]
    fn colorizer_is_object_safe() {
        let colorizer: Box<dyn Colorizer> = Box::new(MockColorizer { ready: true });
        let out = colorizer.colorize(&solid_rgb(3, 2, [9, 9, 9])).unwrap();
        assert_eq!(out.dimensions(), (3, 2));
        assert_eq!(colorizer.name(), "mock");
    }

    #[test]
    fn colorizer_errors_propagate() {
        let colorizer = MockColorizer { ready: false };
        assert!(colorizer.colorize(&solid_rgb(1, 1, [0, 0, 0])).is_err());
    }

    #[test]
    fn upscaler_is_object_safe() {
        let upscaler: Box<dyn Upscaler> = Box::new(MissingUpscaler);
        let err = upscaler
            .upscale(Path::new("a.png"), Path::new("b.png"), ScaleFactor::X4)
            .unwrap_err();
        assert!(matches!(err, UpscaleError::ExecutableNotFound(_)));
    }
}
