// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! Infrastructure adapters implement these; the pipeline depends only on them.
//!
//! - [`stage`]: colorization and upscaling stages

pub mod stage;

pub use stage::{Colorizer, Upscaler};
