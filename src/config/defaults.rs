// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! # Categories
//!
//! - **Colorization**: grayscale detection, network input size, saturation
//! - **Upscaling**: executable name and scale
//! - **Server**: bind address, subprocess timeout, upload limits
//! - **Files**: working directories and naming

// ==========================================================================
// Colorization Defaults
// ==========================================================================

/// Channel-difference score below which an image counts as grayscale.
///
/// Hand-tuned heuristic; override with `[colorize] grayscale_threshold`.
pub const DEFAULT_GRAYSCALE_THRESHOLD: f32 = 10.0;

/// Side length of the square image fed to the colorization network.
pub const COLORIZER_INPUT_SIZE: u32 = 256;

/// Default saturation multiplier applied after colorization.
pub const DEFAULT_SATURATION_BOOST: f32 = 1.3;

/// Smallest accepted saturation multiplier (no boost).
pub const MIN_SATURATION_BOOST: f32 = 1.0;

/// Largest accepted saturation multiplier.
pub const MAX_SATURATION_BOOST: f32 = 2.0;

/// Downloaded model files smaller than this are treated as failed downloads.
pub const MIN_MODEL_SIZE_BYTES: u64 = 1_000_000;

// ==========================================================================
// Upscaling Defaults
// ==========================================================================

/// Name of the Real-ESRGAN NCNN Vulkan executable.
#[cfg(windows)]
pub const REALESRGAN_EXECUTABLE: &str = "realesrgan-ncnn-vulkan.exe";

/// Name of the Real-ESRGAN NCNN Vulkan executable.
#[cfg(not(windows))]
pub const REALESRGAN_EXECUTABLE: &str = "realesrgan-ncnn-vulkan";

// ==========================================================================
// Server Defaults
// ==========================================================================

/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default time budget for one enhancement subprocess (in seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Maximum enhancement subprocess time budget (in seconds).
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Default upload size limit in megabytes.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;

/// Name of the enhancement binary the server spawns.
#[cfg(windows)]
pub const ENHANCER_BINARY: &str = "image_hd.exe";

/// Name of the enhancement binary the server spawns.
#[cfg(not(windows))]
pub const ENHANCER_BINARY: &str = "image_hd";

// ==========================================================================
// File Defaults
// ==========================================================================

/// Directory uploads are written to.
pub const DEFAULT_INPUT_DIR: &str = "input";

/// Directory results are written to and served from.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Upload extensions accepted by the HTTP façade (lowercase).
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Prefix added to the file name offered for download.
pub const DOWNLOAD_NAME_PREFIX: &str = "hd_";

/// Length of the random identifier appended to stored file names.
pub const JOB_ID_LEN: usize = 8;

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    assert!(DEFAULT_GRAYSCALE_THRESHOLD > 0.0);
    assert!(COLORIZER_INPUT_SIZE > 0);

    assert!(MIN_SATURATION_BOOST >= 1.0);
    assert!(MAX_SATURATION_BOOST > MIN_SATURATION_BOOST);
    assert!(DEFAULT_SATURATION_BOOST >= MIN_SATURATION_BOOST);
    assert!(DEFAULT_SATURATION_BOOST <= MAX_SATURATION_BOOST);

    assert!(DEFAULT_TIMEOUT_SECS > 0);
    assert!(DEFAULT_TIMEOUT_SECS <= MAX_TIMEOUT_SECS);
    assert!(DEFAULT_MAX_UPLOAD_MB > 0);

    // uuid v4 renders as 32 hex digits plus hyphens
    assert!(JOB_ID_LEN > 0 && JOB_ID_LEN <= 32);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grayscale_threshold_default() {
        assert!((DEFAULT_GRAYSCALE_THRESHOLD - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn saturation_defaults_are_valid() {
        assert!(DEFAULT_SATURATION_BOOST >= MIN_SATURATION_BOOST);
        assert!(DEFAULT_SATURATION_BOOST <= MAX_SATURATION_BOOST);
    }

    #[test]
    fn timeout_default_is_five_minutes() {
        assert_eq!(DEFAULT_TIMEOUT_SECS, 300);
    }

    #[test]
    fn allowed_extensions_are_lowercase() {
        for ext in ALLOWED_EXTENSIONS {
            assert_eq!(ext, ext.to_ascii_lowercase());
        }
    }
}
