// SPDX-License-Identifier: MPL-2.0
//! Image processing building blocks used by the enhancement pipeline.
//!
//! - [`grayscale`]: monochrome detection
//! - [`color`]: sRGB / CIE Lab conversion and saturation adjustment
//! - [`colorize`]: ONNX colorization models
//! - [`model_store`]: model download and checksum verification
//! - [`upscale`]: Real-ESRGAN NCNN executable driver
//! - [`image`]: decoding and encoding of image files

pub mod color;
pub mod colorize;
pub mod grayscale;
pub mod image;
pub mod model_store;
pub mod upscale;

pub use colorize::{ColorizeError, ColorizeManager, ColorizeResult};
pub use grayscale::is_grayscale;
pub use image::{grayscale_rgb, load_image, save_rgb};
pub use upscale::{UpscaleError, UpscaleResult};
