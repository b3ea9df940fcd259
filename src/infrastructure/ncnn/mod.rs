// SPDX-License-Identifier: MPL-2.0
//! Real-ESRGAN NCNN Vulkan adapter implementing the [`Upscaler`] trait.
//!
//! [`Upscaler`]: crate::application::port::Upscaler

use std::path::{Path, PathBuf};

use crate::application::port::Upscaler;
use crate::config::UpscaleConfig;
use crate::domain::ScaleFactor;
use crate::media::upscale::{find_executable, run_realesrgan};
use crate::media::UpscaleResult;

/// Upscaler backed by the `realesrgan-ncnn-vulkan` executable.
///
/// The executable is located on every call, so installing it while a server
/// is running takes effect without a restart.
#[derive(Debug, Clone, Default)]
pub struct NcnnUpscaler {
    executable: Option<PathBuf>,
}

impl NcnnUpscaler {
    /// Creates an upscaler; `None` searches the default locations.
    #[must_use]
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }

    #[must_use]
    pub fn from_config(config: &UpscaleConfig) -> Self {
        Self::new(config.executable.clone())
    }

    /// Resolves the executable that would be run.
    ///
    /// # Errors
    ///
    /// Returns an error if no executable can be found.
    pub fn executable(&self) -> UpscaleResult<PathBuf> {
        find_executable(self.executable.as_deref())
    }
}

impl Upscaler for NcnnUpscaler {
    fn upscale(&self, input: &Path, output: &Path, scale: ScaleFactor) -> UpscaleResult<()> {
        let executable = self.executable()?;
        run_realesrgan(&executable, input, output, scale).map(|_| ())
    }
}
