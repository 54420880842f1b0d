//! Axum extractors for request bodies.

pub mod resource_body;

pub use resource_body::ResourceBody;
