// SPDX-License-Identifier: MPL-2.0
//! Enhancement request options.
//!
//! [`EnhanceMode`] selects which stages run and [`ScaleFactor`] is the
//! upscale factor handed to the super-resolution executable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a textual option does not name a known value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{value}' (expected one of: {expected})")]
pub struct ParseOptionError {
    /// Which option was being parsed ("mode", "scale", ...).
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
    /// Human-readable list of accepted values.
    pub expected: &'static str,
}

impl ParseOptionError {
    pub(crate) fn new(kind: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}

// =============================================================================
// EnhanceMode
// =============================================================================

/// Which stages of the pipeline run for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhanceMode {
    /// Super-resolution only.
    #[default]
    Enhance,
    /// Colorization only.
    Colorize,
    /// Colorization followed by super-resolution.
    Both,
}

impl EnhanceMode {
    /// All modes, in CLI help order.
    pub const ALL: [EnhanceMode; 3] = [Self::Enhance, Self::Colorize, Self::Both];

    /// Returns the lowercase name used on the command line and in forms.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enhance => "enhance",
            Self::Colorize => "colorize",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for EnhanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnhanceMode {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enhance" => Ok(Self::Enhance),
            "colorize" => Ok(Self::Colorize),
            "both" => Ok(Self::Both),
            _ => Err(ParseOptionError::new("mode", s, "enhance, colorize, both")),
        }
    }
}

// =============================================================================
// ScaleFactor
// =============================================================================

/// Upscale factor supported by the Real-ESRGAN executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ScaleFactor {
    /// Double both dimensions.
    X2,
    /// Quadruple both dimensions.
    #[default]
    X4,
}

impl ScaleFactor {
    /// Returns the numeric multiplier.
    #[must_use]
    pub const fn factor(self) -> u32 {
        match self {
            Self::X2 => 2,
            Self::X4 => 4,
        }
    }

    /// Applies the factor to a `(width, height)` pair.
    #[must_use]
    pub const fn apply(self, width: u32, height: u32) -> (u32, u32) {
        (width * self.factor(), height * self.factor())
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.factor())
    }
}

impl TryFrom<u32> for ScaleFactor {
    type Error = ParseOptionError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Self::X2),
            4 => Ok(Self::X4),
            other => Err(ParseOptionError::new("scale", &other.to_string(), "2, 4")),
        }
    }
}

impl From<ScaleFactor> for u32 {
    fn from(scale: ScaleFactor) -> Self {
        scale.factor()
    }
}

impl FromStr for ScaleFactor {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map_err(|_| ParseOptionError::new("scale", s, "2, 4"))
            .and_then(Self::try_from)
    }
}
