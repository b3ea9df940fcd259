// SPDX-License-Identifier: MPL-2.0
//! Grayscale detection.
//!
//! A photo counts as monochrome when its red, green and blue channels are
//! nearly identical. The score is the sum of the mean absolute differences
//! `|R-G|`, `|G-B|` and `|R-B|` over all pixels, compared against a
//! configurable threshold (see [`DEFAULT_GRAYSCALE_THRESHOLD`]).
//!
//! [`DEFAULT_GRAYSCALE_THRESHOLD`]: crate::config::defaults::DEFAULT_GRAYSCALE_THRESHOLD

use image_rs::{DynamicImage, RgbImage};

/// Returns `true` if `image` should be treated as grayscale.
///
/// Single-channel images (luma, luma + alpha) are always grayscale. For color
/// images the channel difference score must be strictly below `threshold`.
#[must_use]
pub fn is_grayscale(image: &DynamicImage, threshold: f32) -> bool {
    if image.color().channel_count() <= 2 {
        return true;
    }
    channel_difference(&image.to_rgb8()) < threshold
}

/// Sum of the mean absolute pairwise channel differences of an image.
///
/// Returns `0.0` for an empty image.
#[must_use]
pub fn channel_difference(image: &RgbImage) -> f32 {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return 0.0;
    }

    let (mut rg, mut gb, mut rb) = (0u64, 0u64, 0u64);
    for pixel in image.pixels() {
        let [r, g, b] = pixel.0;
        rg += u64::from(r.abs_diff(g));
        gb += u64::from(g.abs_diff(b));
        rb += u64::from(r.abs_diff(b));
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let total = ((rg + gb + rb) as f64 / count as f64) as f32;
    total
}
