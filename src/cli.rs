// SPDX-License-Identifier: MPL-2.0
//! Command-line parsing for the `image_hd` binary.

use crate::config::Config;
use crate::domain::{ColorizerModel, Device, EnhanceMode, ScaleFactor};
use std::ffi::OsString;
use std::path::PathBuf;

pub const USAGE: &str = "\
Usage:
  image_hd <input> <output> [OPTIONS]
  image_hd --download-models [--config PATH]

Relative input paths are read from the input directory and relative output
paths are written to the output directory.

Options:
  --mode <enhance|colorize|both>   Processing mode [default: enhance]
  --scale <2|4>                    Upscale factor [default: 4]
  --model <eccv16|siggraph17>      Colorization model [default: siggraph17]
  --device <cpu|cuda>              Inference device [default: cpu]
  --exe <PATH>                     Path to realesrgan-ncnn-vulkan
  --config <PATH>                  Settings file to use
  --download-models                Fetch the colorization models listed in the settings
  -h, --help                       Print this help";

/// A parsed invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    DownloadModels { config: Option<PathBuf> },
    Run(RunArgs),
}

/// Arguments of a processing run. Unset options fall back to the settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RunArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub mode: EnhanceMode,
    pub scale: Option<ScaleFactor>,
    pub model: Option<ColorizerModel>,
    pub device: Option<Device>,
    pub exe: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl RunArgs {
    /// Applies command-line overrides on top of loaded settings.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(model) = self.model {
            config.colorize.model = model;
        }
        if let Some(device) = self.device {
            config.colorize.device = device;
        }
        if let Some(exe) = &self.exe {
            config.upscale.executable = Some(exe.clone());
        }
        if let Some(scale) = self.scale {
            config.upscale.scale = scale;
        }
    }
}

/// Parses arguments (without the program name).
///
/// # Errors
///
/// Returns an error for unknown flags, invalid option values, or missing
/// positional arguments.
pub fn parse(args: Vec<OsString>) -> Result<Command, pico_args::Error> {
    let mut args = pico_args::Arguments::from_vec(args);

    if args.contains(["-h", "--help"]) {
        return Ok(Command::Help);
    }

    let config = args.opt_value_from_str("--config")?;
    if args.contains("--download-models") {
        reject_leftovers(args)?;
        return Ok(Command::DownloadModels { config });
    }

    let run = RunArgs {
        mode: args.opt_value_from_str("--mode")?.unwrap_or_default(),
        scale: args.opt_value_from_str("--scale")?,
        model: args.opt_value_from_str("--model")?,
        device: args.opt_value_from_str("--device")?,
        exe: args.opt_value_from_str("--exe")?,
        config,
        input: args.free_from_str()?,
        output: args.free_from_str()?,
    };
    reject_leftovers(args)?;
    Ok(Command::Run(run))
}

fn reject_leftovers(args: pico_args::Arguments) -> Result<(), pico_args::Error> {
    let rest = args.finish();
    if rest.is_empty() {
        Ok(())
    } else {
        Err(pico_args::Error::UnusedArgsLeft(
            rest.into_iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
        ))
    }
}
