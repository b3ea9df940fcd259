// SPDX-License-Identifier: MPL-2.0
//! Application layer.
//!
//! - [`port`]: trait definitions implemented by the infrastructure adapters
//!
//! The orchestration that uses these ports lives in [`crate::pipeline`].

pub mod port;
