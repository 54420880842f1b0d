//! Resource route configuration.

use axum::{
    Router,
    routing::{get, post},
};
use helios_vstore::core::VersionStore;

use crate::handlers;
use crate::state::AppState;

/// Creates all REST API routes.
///
/// # Routes
///
/// - `GET /health` - Health check
/// - `POST /{type}` - Create
/// - `GET /{type}/{id}` - Read
/// - `PUT /{type}/{id}` - Update
/// - `DELETE /{type}/{id}` - Delete
/// - `GET /{type}/{id}/_history` - Instance history
/// - `GET /{type}/{id}/_history/{vid}` - Version read
pub fn create_routes<S>(state: AppState<S>) -> Router
where
    S: VersionStore + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(handlers::health_handler::<S>))
        .route("/{resource_type}", post(handlers::create_handler::<S>))
        .route(
            "/{resource_type}/{id}",
            get(handlers::read_handler::<S>)
                .put(handlers::update_handler::<S>)
                .delete(handlers::delete_handler::<S>),
        )
        .route(
            "/{resource_type}/{id}/_history",
            get(handlers::history_handler::<S>),
        )
        .route(
            "/{resource_type}/{id}/_history/{version_id}",
            get(handlers::vread_handler::<S>),
        )
        .with_state(state)
}
