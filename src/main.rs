// src/main.rs
use std::process::ExitCode;

use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use storage_fit::api;
use storage_fit::config::{self, AppConfig};

/// Initialises the tracing subscriber; `RUST_LOG` directives take precedence.
fn init_tracing(level: Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env may carry the log level, so load it before the subscriber.
    let dotenv_result = dotenvy::dotenv();
    init_tracing(config::log_level_from_env());

    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            warn!("Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    info!(version = env!("CARGO_PKG_VERSION"), "Storage fit service starting");

    match api::start_api_server(app_config.api, app_config.optimizer).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "API server terminated with an error");
            ExitCode::FAILURE
        }
    }
}
