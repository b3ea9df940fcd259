// SPDX-License-Identifier: MPL-2.0
//! Colorization model variants and inference devices.

use super::enhance::ParseOptionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pretrained colorization network architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorizerModel {
    /// Zhang et al., "Colorful Image Colorization" (ECCV 2016).
    Eccv16,
    /// Zhang et al., "Real-Time User-Guided Image Colorization" (SIGGRAPH 2017).
    #[default]
    Siggraph17,
}

impl ColorizerModel {
    /// Both supported architectures.
    pub const ALL: [ColorizerModel; 2] = [Self::Eccv16, Self::Siggraph17];

    /// Lowercase identifier, also used as the model file stem.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Eccv16 => "eccv16",
            Self::Siggraph17 => "siggraph17",
        }
    }

    /// Name shown in log output.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Eccv16 => "ECCV16",
            Self::Siggraph17 => "SIGGRAPH17",
        }
    }

    /// File name of the exported ONNX graph.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.onnx", self.id())
    }
}

impl fmt::Display for ColorizerModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ColorizerModel {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eccv16" => Ok(Self::Eccv16),
            "siggraph17" => Ok(Self::Siggraph17),
            _ => Err(ParseOptionError::new("model", s, "eccv16, siggraph17")),
        }
    }
}

/// Execution device for ONNX inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
            Self::Cuda => f.write_str("cuda"),
        }
    }
}

impl FromStr for Device {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" => Ok(Self::Cuda),
            _ => Err(ParseOptionError::new("device", s, "cpu, cuda")),
        }
    }
}
