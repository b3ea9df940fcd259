// SPDX-License-Identifier: MPL-2.0
//! Color space conversions used by the colorization stage.
//!
//! The colorization networks consume the CIELAB lightness channel and predict
//! the two chrominance channels. Conversions use sRGB primaries with the D65
//! white point, matching the representation the models were trained on.
//!
//! Planes are stored as `ndarray` arrays in `(height, width)` order so they can
//! be reshaped into NCHW tensors without copying.

use image_rs::{Rgb, RgbImage};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3};
use palette::white_point::D65;
use palette::{FromColor, Hsv, IntoColor, Lab, LinSrgb, Srgb};

type LabD65 = Lab<D65, f32>;

/// Converts an 8-bit sRGB pixel to CIELAB.
#[must_use]
pub fn pixel_to_lab(pixel: Rgb<u8>) -> (f32, f32, f32) {
    let [r, g, b] = pixel.0;
    let srgb: Srgb<f32> = Srgb::new(r, g, b).into_format();
    let lin: LinSrgb<f32> = srgb.into_linear();
    let lab: LabD65 = lin.into_color();
    (lab.l, lab.a, lab.b)
}

/// Converts a CIELAB triple back to an 8-bit sRGB pixel.
///
/// Out-of-gamut colors are clipped to the sRGB cube.
#[must_use]
pub fn lab_to_pixel(l: f32, a: f32, b: f32) -> Rgb<u8> {
    let lab = LabD65::new(l, a, b);
    let lin: LinSrgb<f32> = lab.into_color();
    let srgb: Srgb<f32> = Srgb::from_linear(lin);
    let out: Srgb<u8> = srgb.into_format();
    Rgb([out.red, out.green, out.blue])
}

/// Converts an image to a `(3, height, width)` Lab array.
#[must_use]
pub fn rgb_to_lab(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    let mut lab = Array3::<f32>::zeros((3, height as usize, width as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
        let (l, a, b) = pixel_to_lab(*pixel);
        let (y, x) = (y as usize, x as usize);
        lab[[0, y, x]] = l;
        lab[[1, y, x]] = a;
        lab[[2, y, x]] = b;
    }
    lab
}

/// Extracts the lightness plane (L in `[0, 100]`) of an image.
#[must_use]
pub fn lightness(image: &RgbImage) -> Array2<f32> {
    let (width, height) = image.dimensions();
    let mut plane = Array2::<f32>::zeros((height as usize, width as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
        plane[[y as usize, x as usize]] = pixel_to_lab(*pixel).0;
    }
    plane
}

/// Merges a lightness plane with a `(2, height, width)` chrominance array.
///
/// # Panics
///
/// Panics if the spatial dimensions of `l` and `ab` differ, or if `ab` does
/// not have exactly two channels.
#[must_use]
pub fn lab_to_rgb(l: ArrayView2<'_, f32>, ab: ArrayView3<'_, f32>) -> RgbImage {
    let (height, width) = l.dim();
    assert_eq!(
        ab.dim(),
        (2, height, width),
        "chrominance planes must match the lightness plane"
    );

    #[allow(clippy::cast_possible_truncation)]
    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let (y, x) = (y as usize, x as usize);
        lab_to_pixel(l[[y, x]], ab[[0, y, x]], ab[[1, y, x]])
    })
}

/// Multiplies the HSV saturation of every pixel by `factor`.
///
/// Saturation is clamped to `[0, 1]`. A factor of `1.0` or less leaves the
/// image untouched.
pub fn adjust_saturation(image: &mut RgbImage, factor: f32) {
    if factor <= 1.0 {
        return;
    }
    for pixel in image.pixels_mut() {
        let [r, g, b] = pixel.0;
        let srgb: Srgb<f32> = Srgb::new(r, g, b).into_format();
        let mut hsv: Hsv = Hsv::from_color(srgb);
        hsv.saturation = (hsv.saturation * factor).clamp(0.0, 1.0);
        let boosted: Srgb<u8> = Srgb::<f32>::from_color(hsv).into_format();
        *pixel = Rgb([boosted.red, boosted.green, boosted.blue]);
    }
}

/// Resamples a plane to `(out_height, out_width)` with bilinear interpolation.
///
/// Uses half-pixel centers, so a plane resized to its own size is unchanged.
#[must_use]
pub fn resize_bilinear(plane: ArrayView2<'_, f32>, out_height: usize, out_width: usize) -> Array2<f32> {
    let (in_height, in_width) = plane.dim();
    if in_height == out_height && in_width == out_width {
        return plane.to_owned();
    }
    if in_height == 0 || in_width == 0 {
        return Array2::zeros((out_height, out_width));
    }

    #[allow(clippy::cast_precision_loss)]
    let scale_y = in_height as f32 / out_height.max(1) as f32;
    #[allow(clippy::cast_precision_loss)]
    let scale_x = in_width as f32 / out_width.max(1) as f32;

    let source = |pos: usize, scale: f32, limit: usize| -> (usize, usize, f32) {
        #[allow(clippy::cast_precision_loss)]
        let src = ((pos as f32 + 0.5) * scale - 0.5).max(0.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let lo = (src.floor() as usize).min(limit - 1);
        let hi = (lo + 1).min(limit - 1);
        #[allow(clippy::cast_precision_loss)]
        let frac = src - lo as f32;
        (lo, hi, frac)
    };

    Array2::from_shape_fn((out_height, out_width), |(y, x)| {
        let (y0, y1, fy) = source(y, scale_y, in_height);
        let (x0, x1, fx) = source(x, scale_x, in_width);
        let top = plane[[y0, x0]] * (1.0 - fx) + plane[[y0, x1]] * fx;
        let bottom = plane[[y1, x0]] * (1.0 - fx) + plane[[y1, x1]] * fx;
        top * (1.0 - fy) + bottom * fy
    })
}
