//! Application entry point for the `farmiq-reports` service.
//!
//! This binary orchestrates the startup sequence for the report API:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Loading label translations, if configured
//! - Building the upstream API client
//! - Mounting all API routes via the `routes` gateway
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `SOURCE_API_URL` (**required**) – upstream farm API base URL
//! - `SOURCE_API_TOKEN` (optional) – bearer token for the upstream API
//! - `SOURCE_TIMEOUT_SECS` (optional) – upstream timeout (default: 10)
//! - `REPORTS_PORT` (optional) – listen port (default: 8080)
//! - `REPORT_LABELS_PATH` (optional) – JSON label translation file
//! - `REPORT_BRAND` (optional) – full report cover brand (default: `FarmIQ`)
//! - `REPORTS_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `REPORTS_SPAN_EVENTS` (optional) – span event mode for tracing
use std::{env, net::SocketAddr, path::Path, sync::Arc};

use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::{Context, Result};

use farmiq_reports::config;
use farmiq_reports::labels::{LabelCatalog, Labels, NoLabels};
use farmiq_reports::routes::{self, AppState};
use farmiq_reports::sources::SourceClient;

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let labels: Arc<dyn Labels> = match &cfg.labels_path {
        Some(path) => Arc::new(LabelCatalog::from_json_file(Path::new(path))?),
        None => Arc::new(NoLabels),
    };

    let sources = SourceClient::from_config(&cfg).context("Failed to build upstream API client")?;
    tracing::info!("Upstream API client ready for {}", sources.base_url());

    // Build app from routes gateway
    let app: Router = routes::router(AppState::new(sources, labels, &cfg.brand));

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
/// - Span event emission mode controlled by the `REPORTS_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `REPORTS_LOG_LEVEL` env var
///
/// Call once at startup, before any logging macro runs.
fn init_tracing() {
    // ---
    let span_events = match env::var("REPORTS_SPAN_EVENTS").as_deref() {
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

    // Use RUST_LOG if available, otherwise fall back to REPORTS_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("REPORTS_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},hyper=info,reqwest=info"))
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
