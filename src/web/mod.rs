// SPDX-License-Identifier: MPL-2.0
//! HTTP front end.
//!
//! Uploads are stored in the input directory and handed to the `image_hd`
//! binary as a subprocess; results are served back from the output
//! directory.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /` | upload page |
//! | `POST /process` | multipart `file`, `mode`, `scale` |
//! | `GET /download/{filename}` | result as attachment |
//! | `GET /preview/{filename}` | result inline |

pub mod error;
pub mod handlers;
pub mod job;
pub mod runner;

use crate::config::defaults::ENHANCER_BINARY;
use crate::config::Config;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use runner::EnhancerCommand;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use error::{WebError, WebResult};

/// Shared, read-only server settings.
#[derive(Debug, Clone)]
pub struct ServerContext {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub enhancer: EnhancerCommand,
    pub max_upload_bytes: usize,
}

pub type AppState = Arc<ServerContext>;

impl ServerContext {
    /// Builds the context from settings.
    ///
    /// Directories are made absolute because the enhancer would otherwise
    /// resolve relative paths against its own working directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn from_config(config: &Config, config_path: Option<&Path>) -> std::io::Result<Self> {
        Ok(Self {
            input_dir: std::path::absolute(&config.paths.input_dir)?,
            output_dir: std::path::absolute(&config.paths.output_dir)?,
            enhancer: EnhancerCommand {
                program: config
                    .server
                    .enhancer_bin
                    .clone()
                    .unwrap_or_else(default_enhancer_bin),
                config: config_path.map(std::path::absolute).transpose()?,
                timeout: config.server.timeout(),
                debug_log: config.server.debug_log.clone(),
            },
            max_upload_bytes: config.server.max_upload_bytes(),
        })
    }
}

/// `image_hd` next to the running server binary, or on `PATH`.
fn default_enhancer_bin() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(ENHANCER_BINARY)))
        .filter(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from(ENHANCER_BINARY))
}

/// Builds the application router.
pub fn router(context: ServerContext) -> Router {
    let limit = context.max_upload_bytes;
    Router::new()
        .route("/", get(handlers::index))
        .route("/process", post(handlers::process))
        .route("/download/{filename}", get(handlers::download))
        .route("/preview/{filename}", get(handlers::preview))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(Arc::new(context))
}

/// Binds `host:port` from the settings and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(config: &Config, config_path: Option<&Path>) -> std::io::Result<()> {
    let context = ServerContext::from_config(config, config_path)?;
    tokio::fs::create_dir_all(&context.input_dir).await?;
    tokio::fs::create_dir_all(&context.output_dir).await?;
    tracing::info!(
        input = %context.input_dir.display(),
        output = %context.output_dir.display(),
        enhancer = %context.enhancer.program.display(),
        "starting server"
    );

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(context))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
