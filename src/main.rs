// SPDX-License-Identifier: MPL-2.0
use image_hd::cli::{self, Command, RunArgs};
use image_hd::config::{self, Config};
use image_hd::domain::ColorizerModel;
use image_hd::infrastructure::{NcnnUpscaler, OnnxColorizer};
use image_hd::media::colorize::validate_model;
use image_hd::media::model_store::{download_model, verify_checksum};
use image_hd::media::{ColorizeError, ColorizeManager};
use image_hd::pipeline::{Enhancer, PipelineError};
use image_hd::web::runner::ERROR_MARKER;
use std::path::Path;
use std::process::ExitCode;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] image_hd::Error),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Model(#[from] ColorizeError),
}

fn main() -> ExitCode {
    image_hd::app::init_tracing();

    let command = match cli::parse(std::env::args_os().skip(1).collect()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {e}\n\n{}", cli::USAGE);
            return ExitCode::from(2);
        }
    };

    let result = match command {
        Command::Help => {
            println!("{}", cli::USAGE);
            Ok(())
        }
        Command::DownloadModels { config } => {
            load_config(config.as_deref()).and_then(|config| download_models(&config))
        }
        Command::Run(args) => run(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{ERROR_MARKER} {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, CliError> {
    Ok(match path {
        Some(path) => config::load_from_path(path)?,
        None => config::load()?,
    })
}

fn run(args: &RunArgs) -> Result<(), CliError> {
    let mut config = load_config(args.config.as_deref())?;
    args.apply_to(&mut config);

    let enhancer = Enhancer::from_config(
        &config,
        Box::new(OnnxColorizer::from_config(&config.colorize)),
        Box::new(NcnnUpscaler::from_config(&config.upscale)),
    );
    enhancer.ensure_dirs()?;

    let output = enhancer.run(&args.input, &args.output, args.mode, config.upscale.scale)?;
    println!("Done! Result saved to: {}", output.display());
    Ok(())
}

fn download_models(config: &Config) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ColorizeError::from)?;

    let mut fetched = 0;
    for model in ColorizerModel::ALL {
        let Some(url) = config.colorize.model_url(model) else {
            tracing::info!(%model, "no download URL configured, skipping");
            continue;
        };
        let dest = config.colorize.model_path(model);
        let mut manager = ColorizeManager::new(
            model,
            config.colorize.device,
            dest.clone(),
            config.colorize.saturation(),
        );

        if manager.is_model_downloaded() {
            tracing::info!(%model, path = %dest.display(), "model already present");
        } else {
            tracing::info!(%model, url, "downloading");
            let bytes = runtime.block_on(download_model(url, &dest, |progress| {
                tracing::debug!("{model}: {:.0}%", progress * 100.0);
            }))?;
            tracing::info!(%model, bytes, path = %dest.display(), "downloaded");
        }

        if let Some(expected) = config.colorize.model_checksum(model) {
            verify_checksum(&dest, expected)?;
            tracing::info!(%model, "checksum verified");
        }

        validate_model(&mut manager)?;
        fetched += 1;
    }

    if fetched == 0 {
        tracing::warn!("no colorization model URLs configured in [colorize]");
    }
    Ok(())
}
