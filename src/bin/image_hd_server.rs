// SPDX-License-Identifier: MPL-2.0
use image_hd::config;
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "\
Usage: image_hd_server [--config PATH] [--host HOST] [--port PORT]

Serves the upload page and the /process, /download and /preview endpoints.";

struct Overrides {
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
}

fn parse_overrides(mut args: pico_args::Arguments) -> Result<Overrides, pico_args::Error> {
    let overrides = Overrides {
        config_path: args.opt_value_from_str("--config")?,
        host: args.opt_value_from_str("--host")?,
        port: args.opt_value_from_str("--port")?,
    };
    let rest = args.finish();
    if !rest.is_empty() {
        return Err(pico_args::Error::UnusedArgsLeft(
            rest.iter().map(|a| a.to_string_lossy().into_owned()).collect(),
        ));
    }
    Ok(overrides)
}

#[tokio::main]
async fn main() -> ExitCode {
    image_hd::app::init_tracing();

    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let Overrides {
        config_path,
        host,
        port,
    } = match parse_overrides(args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("error: {e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let loaded = match &config_path {
        Some(path) => config::load_from_path(path),
        None => config::load(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[ERROR] {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    match image_hd::web::serve(&config, config_path.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("server error: {e}");
            ExitCode::FAILURE
        }
    }
}
