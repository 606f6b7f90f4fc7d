//! PDF Hub Web - browser front end for merging, reducing and converting PDFs.

mod helpers;
mod routes;
mod state;
mod templates;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, header};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use clap::Parser;
use pdf_hub_core::AppConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir,
    set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use state::AppState;

/// Resolve the static files directory.
///
/// Priority:
/// 1. Explicit path if provided
/// 2. ./static if it exists
/// 3. Crate's built-in static directory
fn resolve_static_dir(explicit_path: Option<&str>) -> PathBuf {
    if let Some(path) = explicit_path {
        return PathBuf::from(path);
    }

    let local_static = PathBuf::from("static");
    if local_static.is_dir() {
        return local_static;
    }

    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
}

#[derive(Parser, Debug)]
#[command(name = "pdf-hub-web")]
#[command(author, version, about = "PDF Hub Web Server", long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Config file path
    #[arg(short, long, env = "PDF_HUB_CONFIG")]
    config: Option<PathBuf>,

    /// Combined size ceiling in MB
    #[arg(long, env = "PDF_HUB_CEILING_MB")]
    ceiling_mb: Option<f64>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Static files directory (defaults to ./static or crate's static dir)
    #[arg(long, env = "STATIC_DIR")]
    static_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // lopdf reports every recoverable parse issue; keep it at warn
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},lopdf=warn")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };
    if let Some(ceiling_mb) = args.ceiling_mb {
        config.combine.ceiling_mb = ceiling_mb;
    }

    let state = Arc::new(
        AppState::new(config).context("Failed to initialize application state")?,
    );

    // Spawn background task for session cleanup (runs every 5 minutes)
    let cleanup_state = Arc::clone(&state);
    tokio::spawn(async move {
        let cleanup_interval = Duration::from_secs(5 * 60);
        loop {
            tokio::time::sleep(cleanup_interval).await;
            let removed = cleanup_state.cleanup_old_sessions().await;
            info!("Session cleanup removed {} sessions", removed);
        }
    });

    let app = build_router(state, &resolve_static_dir(args.static_dir.as_deref()));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: Arc<AppState>, static_dir: &std::path::Path) -> Router {
    let body_limit = state.config().server.max_upload_bytes();

    Router::new()
        // Pages
        .route("/", get(routes::index))
        .route("/reduce", get(routes::reduce_page))
        .route("/convert", get(routes::convert_page))
        .route("/combine/{session_id}", get(routes::combine_page))
        // Combine API - HTML fragments (HTMX) or redirects
        .route("/api/combine", post(routes::create_session))
        .route("/api/combine/{session_id}/files", post(routes::upload_files))
        .route(
            "/api/combine/{session_id}/files/{index}/remove",
            post(routes::remove_file),
        )
        .route("/api/combine/{session_id}/clear", post(routes::clear))
        .route("/api/combine/{session_id}/merge", post(routes::merge))
        .route("/api/combine/{session_id}/report", get(routes::report))
        // Binary responses
        .route("/api/combine/{session_id}/download", get(routes::download))
        .route("/api/reduce", post(routes::reduce_pdf))
        .route("/api/convert", post(routes::convert_pdf))
        // Static files with Cache-Control: no-cache (cache but always revalidate via ETag)
        .nest_service(
            "/static",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-cache"),
                ))
                .service(ServeDir::new(static_dir)),
        )
        // Cache-Control for HTML fragments - prevents bfcache issues with HTMX
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, max-age=0"),
        ))
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
