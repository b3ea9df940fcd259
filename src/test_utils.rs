// SPDX-License-Identifier: MPL-2.0
//! Test utilities for float comparisons and synthetic test images.
//!
//! Re-exports the `approx` crate's assertion macros for float comparison,
//! which properly handle floating-point precision issues that `assert_eq!` cannot.

pub use approx::assert_abs_diff_eq;

use image_rs::{Rgb, RgbImage};

/// Solid-color RGB image.
pub fn solid_rgb(width: u32, height: u32, rgb: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(rgb))
}

/// RGB image whose channels are equal, ramping from black to white left to right.
pub fn gray_gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| {
        #[allow(clippy::cast_possible_truncation)]
        let v = ((x * 255) / width.max(2).saturating_sub(1)).min(255) as u8;
        Rgb([v, v, v])
    })
}

/// Writes an executable `/bin/sh` script named `name` into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
