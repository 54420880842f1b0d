//! # helios-vstore-rest - REST interface for the versioned resource store
//!
//! Serves the create, read, update, delete, vread and history interactions
//! over a [`helios_vstore::VersionStore`] backend. Every write is
//! serialized per logical resource, so concurrent clients either see their
//! expected version honored or get `409 Conflict`; no update is lost.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use helios_vstore::backends::memory::InMemoryStore;
//! use helios_vstore_rest::{create_app_with_config, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = create_app_with_config(InMemoryStore::new(), ServerConfig::default());
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Interaction | HTTP Method | URL Pattern |
//! |------------|-------------|-------------|
//! | create | POST | `/[type]` |
//! | read | GET | `/[type]/[id]` |
//! | update | PUT | `/[type]/[id]` |
//! | delete | DELETE | `/[type]/[id]` |
//! | history | GET | `/[type]/[id]/_history` |
//! | vread | GET | `/[type]/[id]/_history/[vid]` |
//! | health | GET | `/health` |
//!
//! ## HTTP Headers
//!
//! - `ETag` / `If-Match` - Optimistic locking for updates and deletes
//! - `If-None-Match` - Conditional read, and create-only-if-absent on update
//! - `If-Modified-Since` / `Last-Modified` - Conditional read by date
//! - `Prefer` - Response body (return=minimal, return=representation, return=OperationOutcome)
//!
//! Conditional headers may be repeated; every occurrence is honored.
//!
//! ## Error Handling
//!
//! All errors are returned as FHIR [OperationOutcome](https://hl7.org/fhir/operationoutcome.html)
//! resources with appropriate HTTP status codes:
//!
//! | HTTP Status | FHIR Issue Code | Description |
//! |-------------|-----------------|-------------|
//! | 400 | invalid | Bad request / malformed If-Match |
//! | 404 | not-found | Resource or version not found |
//! | 405 | not-supported | Interaction disabled |
//! | 409 | conflict | Version conflict |
//! | 410 | deleted | Resource was deleted |
//! | 415 | not-supported | Unsupported media type |
//! | 500 | exception | Internal server error |
//!
//! ## Architecture
//!
//! - [`error`] - Error types and OperationOutcome generation
//! - [`config`] - Server configuration
//! - [`state`] - Application state (repository, configuration)
//! - [`handlers`] - HTTP request handlers for each interaction
//! - [`middleware`] - Conditional and Prefer header extraction
//! - [`extractors`] - Request body extraction
//! - [`responses`] - Response formatting and header generation
//! - [`routing`] - Route configuration

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod responses;
pub mod routing;
pub mod state;

// Re-export commonly used types
pub use config::{ServerConfig, StorageKind};
pub use error::{RestError, RestResult};
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use helios_vstore::core::VersionStore;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Creates the Axum application with default configuration.
///
/// For more control, use [`create_app_with_config`].
pub fn create_app<S>(store: S) -> Router
where
    S: VersionStore + 'static,
{
    create_app_with_config(store, ServerConfig::default())
}

/// Creates the Axum application with custom configuration.
///
/// # Arguments
///
/// * `store` - The storage backend to use
/// * `config` - Server configuration
///
/// # Example
///
/// ```rust,ignore
/// use helios_vstore::backends::memory::InMemoryStore;
/// use helios_vstore_rest::{create_app_with_config, ServerConfig};
///
/// let config = ServerConfig {
///     delete_enabled: false,
///     ..Default::default()
/// };
/// let app = create_app_with_config(InMemoryStore::new(), config);
/// ```
pub fn create_app_with_config<S>(store: S, config: ServerConfig) -> Router
where
    S: VersionStore + 'static,
{
    create_app_from_arc(Arc::new(store), config)
}

/// Creates the Axum application over a shared store.
pub fn create_app_from_arc<S>(store: Arc<S>, config: ServerConfig) -> Router
where
    S: VersionStore + 'static,
{
    info!(
        "Creating REST API server with backend: {}",
        store.backend_name()
    );

    let state = AppState::new(store, config.clone());

    let router = routing::create_routes(state);

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(config.request_timeout),
        ));

    let router = if config.enable_cors {
        let cors = build_cors_layer(&config);
        router.layer(cors)
    } else {
        router
    };

    router.layer(service_builder)
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let mut cors = CorsLayer::new();

    // Configure origins
    if config.cors_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    // Configure methods
    if config.cors_methods == "*" {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Vec<_> = config
            .cors_methods
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_methods(methods);
    }

    // Configure headers
    if config.cors_headers == "*" {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<_> = config
            .cors_headers
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    cors
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!(
            "helios_vstore_rest={level},helios_vstore={level},tower_http=debug"
        )));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
