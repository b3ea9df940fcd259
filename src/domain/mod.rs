// SPDX-License-Identifier: MPL-2.0
//! Domain layer: value types shared by the pipeline, the CLI and the HTTP façade.
//!
//! # Modules
//!
//! - [`enhance`]: request options ([`EnhanceMode`], [`ScaleFactor`])
//! - [`model`]: colorization variants ([`ColorizerModel`]) and [`Device`]

pub mod enhance;
pub mod model;

pub use enhance::{EnhanceMode, ParseOptionError, ScaleFactor};
pub use model::{ColorizerModel, Device};
