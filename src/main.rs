//! bims server entry point.
//!
//! Reads configuration from the environment (and `.env`), opens the payload
//! log, and serves the records-office routes until SIGTERM / Ctrl-C.

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};

use bims::{LogSink, Server, ServerConfig, Unprovisioned, routes, telemetry};

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();

    let config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = telemetry::init(&config) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded environment file");
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServerConfig) -> bims::Result<()> {
    info!(?config, "starting bims backend service");

    // The service does not run unlogged: a sink that cannot be opened is fatal.
    let sink = Arc::new(LogSink::open(&config.log_path).await?);
    info!(path = %sink.path().display(), "payload log ready");

    let app = routes::router(Arc::new(Unprovisioned), Arc::clone(&sink));
    let server = Server::bind(config.bind_addr()).await?;
    server.serve(app).await?;

    if let Err(e) = sink.flush().await {
        warn!("failed to flush payload log: {e}");
    }
    Ok(())
}
