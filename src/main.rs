//! Application entry point for the `sensordash` backend service.
//!
//! This binary orchestrates the full startup sequence for the ride sensor
//! dashboard API, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Connecting the selected storage backend (document database or object store)
//! - Mounting all API routes via the `routes` gateway
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `SENSOR_BACKEND` (optional) – `docdb` (default) or `s3`
//! - `SENSOR_PORT` (optional) – HTTP port (default: 8052)
//! - `DASH_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `DASH_SPAN_EVENTS` (optional) – span event mode for tracing
//! - plus the backend-specific variables documented in `config`
//!
//! Schema normalization lives in `processing`, derived metrics in `analysis`,
//! storage access behind the `loaders::Loader` trait, and route registration
//! in `routes`.

use std::{env, io::IsTerminal, net::SocketAddr, sync::Arc};

use axum::Router;
use dotenvy::dotenv;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::Result;

mod analysis;
mod config;
mod error;
mod loaders;
mod models;
mod processing;
mod query;
mod routes;

use config::BackendConfig;
use loaders::{DocDbLoader, ObjectStoreLoader, SharedLoader};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let loader: SharedLoader = match &cfg.backend {
        BackendConfig::DocDb(db_cfg) => {
            tracing::info!("Connecting to document database backend");
            Arc::new(DocDbLoader::connect(db_cfg).await?)
        }
        BackendConfig::ObjectStore(s3_cfg) => {
            tracing::info!("Connecting to object store backend");
            Arc::new(ObjectStoreLoader::connect(s3_cfg).await)
        }
    };
    tracing::info!("Serving recordings from the {} backend", loader.source_name());

    let app: Router = routes::router(loader);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `DASH_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `DASH_LOG_LEVEL` env var
///
/// This should be called once at application startup before any logging
/// or tracing macros are invoked. It installs the subscriber globally
/// for the lifetime of the process.
fn init_tracing() {
    // ---
    let span_events = match env::var("DASH_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to DASH_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("DASH_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},aws_config=warn,hyper_util=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
