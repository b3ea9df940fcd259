// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! Concrete implementations of the port traits defined in
//! `application::port`:
//!
//! - [`onnx`]: colorization via ONNX Runtime (implements [`Colorizer`])
//! - [`ncnn`]: upscaling via the Real-ESRGAN executable (implements [`Upscaler`])
//!
//! [`Colorizer`]: crate::application::port::Colorizer
//! [`Upscaler`]: crate::application::port::Upscaler

pub mod ncnn;
pub mod onnx;

pub use ncnn::NcnnUpscaler;
pub use onnx::OnnxColorizer;
