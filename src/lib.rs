// SPDX-License-Identifier: MPL-2.0
//! `image_hd` restores old photos: it colorizes black-and-white images with
//! an ONNX model and upscales them with Real-ESRGAN.
//!
//! The crate ships two binaries: the `image_hd` command-line tool and the
//! `image_hd_server` HTTP front end, which runs the former per upload.

pub mod app;
pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod media;
pub mod pipeline;
pub mod web;

pub use error::{Error, Result};

#[cfg(test)]
pub mod test_utils;
