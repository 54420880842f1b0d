//! Route configuration for the REST API.

pub mod resource_routes;

pub use resource_routes::create_routes;
