// SPDX-License-Identifier: MPL-2.0
//! Image loading and saving for the enhancement stages.

use crate::error::{Error, Result};
use image_rs::{DynamicImage, ImageFormat, RgbImage};
use std::path::Path;

/// Decodes an image file, guessing the format from its contents.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and [`Error::Image`] if
/// it cannot be decoded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();
    let reader = image_rs::ImageReader::open(path)?.with_guessed_format()?;
    Ok(reader.decode()?)
}

/// Encodes an RGB image, choosing the format from the extension of `path`.
///
/// Parent directories are created as needed.
///
/// # Errors
///
/// Returns an error if the extension is unknown or encoding fails.
pub fn save_rgb(image: &RgbImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path)
        .map_err(|_| Error::Image(format!("unsupported output format: {}", path.display())))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    image.save_with_format(path, format)?;
    Ok(())
}

/// Grayscale rendering of an image, kept as three equal channels.
#[must_use]
pub fn grayscale_rgb(image: &DynamicImage) -> RgbImage {
    DynamicImage::ImageLuma8(image.to_luma8()).to_rgb8()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::solid_rgb;
    use tempfile::tempdir;

    #[test]
    fn save_then_load_keeps_dimensions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub").join("photo.jpg");
        save_rgb(&solid_rgb(7, 3, [200, 100, 50]), &path).unwrap();

        let loaded = load_image(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (7, 3));
    }

    #[test]
    fn load_missing_image_returns_io_error() {
        let err = load_image("/nonexistent/photo.png").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn load_garbage_returns_image_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(load_image(&path).unwrap_err(), Error::Image(_)));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempdir().unwrap();
        let err = save_rgb(&solid_rgb(1, 1, [0, 0, 0]), &dir.path().join("out.xyz")).unwrap_err();
        assert!(matches!(err, Error::Image(_)));
    }

    #[test]
    fn grayscale_rgb_has_equal_channels() {
        let image = DynamicImage::ImageRgb8(solid_rgb(2, 2, [255, 0, 0]));
        let gray = grayscale_rgb(&image);
        let px = gray.get_pixel(0, 0);
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }
}
