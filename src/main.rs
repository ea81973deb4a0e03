//! Code explainer HTTP service.
//!
//! # Architecture Overview
//!
//! ```text
//!   POST /explain
//!   ─────────────▶ http (request id, trace, CORS, body limit, timeout)
//!                    │
//!                    ▼
//!                  explain::ExplainService
//!                    validate → sanitize → rate limit
//!                    │
//!                    ▼
//!                  llm::ModelInvoker ──prompt──▶ Ollama /api/generate
//!                    │          ◀──JSON text──
//!                    ▼
//!                  schema::SchemaValidator
//!                    │
//!   ◀────────────────┘  200 CodeExplanation | 400 | 413 | 429 | 500
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use code_explainer::config::load_config;
use code_explainer::http::HttpServer;
use code_explainer::lifecycle::{spawn_signal_handler, Shutdown};
use code_explainer::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "code-explainer", version, about = "Explain code snippets with a local LLM")]
struct Args {
    /// Path to a TOML config file; defaults and EXPLAINER_* env vars apply without it.
    #[arg(short, long, env = "EXPLAINER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    logging::init(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "code-explainer starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %config.backend.endpoint,
        model = %config.backend.model,
        rate_limit = config.rate_limit.requests_per_window,
        retries = config.retries.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let receiver = shutdown.subscribe();
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
