//! ConvertIO Server
//!
//! Backend for the ConvertIO document tools. A single multipart endpoint
//! dispatches on the tool slug and returns the resulting PDF:
//!
//! - `image-to-pdf` - one A4 page per uploaded image
//! - `merge-pdf` - concatenate PDFs in upload order
//! - `split-pdf` - extract a page selection
//! - `rotate-pdf` - rotate every (or selected) page
//! - `protect-pdf` - encrypt with an open password
//!
//! Requests are independent; nothing outlives the response.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;

use api::{handle_convert, handle_health, handle_list_tools};

/// Command-line arguments for the ConvertIO server
#[derive(Parser, Debug)]
#[command(name = "convertio-server")]
#[command(about = "ConvertIO server for PDF merge, split, rotate, protect and image conversion")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "CONVERTIO_PORT", default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "CONVERTIO_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Per-request processing timeout in milliseconds
    #[arg(long, env = "CONVERTIO_TIMEOUT_MS", default_value = "30000")]
    timeout_ms: u64,

    /// Rate limit: requests per second per IP
    #[arg(long, env = "CONVERTIO_RATE_LIMIT", default_value = "10")]
    rate_limit: u32,

    /// Maximum total upload size in megabytes
    #[arg(long, env = "CONVERTIO_MAX_UPLOAD_MB", default_value = "50")]
    max_upload_mb: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Processing timeout in milliseconds
    pub timeout_ms: u64,
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
}

/// Routes and per-request layers, without the rate limiter
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/tools", get(handle_list_tools))
        .route("/api/convert", post(handle_convert))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ConvertIO server on {}:{}", args.host, args.port);

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit * 2)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limit: {}", args.rate_limit))?,
    );

    let state = AppState {
        timeout_ms: args.timeout_ms,
        max_upload_bytes: args.max_upload_mb * 1024 * 1024,
    };

    let app = build_router(state).layer(GovernorLayer {
        config: governor_conf,
    });

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);
    info!("Upload limit: {} MB", args.max_upload_mb);
    info!("Processing timeout: {}ms", args.timeout_ms);

    // The rate limiter keys on the peer address
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
