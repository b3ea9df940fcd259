// SPDX-License-Identifier: MPL-2.0
//! Process-level setup shared by the `image_hd` and `image_hd_server` binaries.

pub mod paths;

/// Initializes the tracing subscriber for logging.
///
/// Honors `RUST_LOG`; falls back to `info` when it is unset or invalid.
/// Output goes to stderr so the CLI's stdout stays free for the caller.
/// Colors are only used when stderr is a terminal, so captured output is
/// plain text.
pub fn init_tracing() {
    use std::io::IsTerminal;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .try_init();
}
