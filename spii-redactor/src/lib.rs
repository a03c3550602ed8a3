//! # spii-redactor: Upload Gateway for the SPII Redaction Pipeline
//!
//! `spii-redactor` is the web front-end of a document redaction system. Users
//! upload a document or scanned image through a browser form; the gateway
//! stores the file under a sanitized name inside a configured upload
//! directory, hands the stored path to a processing engine (OCR + PII
//! redaction), and renders the engine's output back to the user.
//!
//! ## Overview
//!
//! The crate deliberately contains no redaction logic of its own. The hard
//! work - text extraction, PII detection, redaction - sits behind the
//! [`processor::Processor`] trait and is supplied by the configured engine.
//! What this crate owns is the HTTP boundary around that engine: multipart
//! intake with a transport-level size limit, filename sanitization as a
//! security contract, atomic persistence into the upload directory, and
//! template rendering for the landing, result, and error pages.
//!
//! ### Request Flow
//!
//! `GET /` renders the upload form. `POST /upload` validates the multipart
//! `file` field (a missing field or empty filename bounces back to the form
//! with a redirect), streams the upload to disk under its sanitized name, and
//! dispatches the stored path to the engine exactly once. The results page
//! shows the redacted text next to the stored original, which is served back
//! under `GET /uploads/{filename}`. Each request is stateless and
//! independent; the only persistent state is the upload directory's contents,
//! where colliding names resolve by atomic-rename last-write-wins.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use spii_redactor::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Parse CLI arguments and load configuration
//!     let args = spii_redactor::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     // Initialize telemetry (structured logging and optional OpenTelemetry)
//!     spii_redactor::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     // Create and start the application
//!     let app = Application::new(config).await?;
//!
//!     // Run with graceful shutdown on Ctrl+C
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod config;
pub mod errors;
pub mod processor;
mod static_assets;
pub mod storage;
pub mod telemetry;
pub mod templates;

use crate::processor::Processor;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `config`: Application configuration loaded from file/environment
/// - `processor`: The processing engine uploads are dispatched to
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub processor: Arc<dyn Processor>,
}

/// Build the application router with all endpoints and middleware.
///
/// The upload route carries its own body limit so oversized bodies are
/// rejected by the transport layer with 413 before handler logic runs.
pub fn build_router(state: &AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes as usize;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/", get(api::handlers::pages::index))
        .route(
            "/upload",
            post(api::handlers::uploads::upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/uploads/{filename}", get(api::handlers::uploads::serve_upload))
        .route("/static/{*path}", get(api::handlers::static_assets::serve_static))
        .with_state(state.clone());

    // Add tracing layer
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] validates the upload directory and
///    builds the processing engine and router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts
///    handling requests
/// 3. **Shutdown**: when the shutdown signal resolves, in-flight requests
///    drain and telemetry is flushed
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        tracing::debug!("Starting upload gateway with configuration: {:#?}", config);

        // Explicit, idempotent initialization - handlers never create directories
        storage::ensure_upload_dir(&config.upload_dir).await?;

        let processor = processor::create_processor(&config.processor);

        let state = AppState {
            config: config.clone(),
            processor,
        };
        let router = build_router(&state);

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Upload gateway listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        // Shutdown telemetry
        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_application_startup_creates_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            upload_dir: dir.path().join("uploads"),
            ..Config::default()
        };

        let app = Application::new(config).await.unwrap();
        assert!(dir.path().join("uploads").is_dir());

        let server = app.into_test_server();

        let health = server.get("/healthz").await;
        health.assert_status_ok();
        assert_eq!(health.text(), "OK");

        let index = server.get("/").await;
        index.assert_status_ok();
    }
}
