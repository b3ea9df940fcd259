// SPDX-License-Identifier: MPL-2.0
//! ONNX Runtime adapters implementing the [`Colorizer`] port trait.
//!
//! [`Colorizer`]: crate::application::port::Colorizer

mod colorize;

pub use colorize::OnnxColorizer;
