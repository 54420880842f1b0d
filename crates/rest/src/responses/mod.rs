//! Response formatting for the REST API.
//!
//! - [`operation_outcome`] - OperationOutcome generation
//! - [`bundle`] - History Bundle building
//! - [`headers`] - Response header generation (ETag, Last-Modified, Location)
//! - [`format`] - Resource rendering from version records

pub mod bundle;
pub mod format;
pub mod headers;
pub mod operation_outcome;

pub use bundle::{BundleBuilder, BundleEntry};
pub use format::{render_resource, resource_response};
pub use headers::ResourceHeaders;
pub use operation_outcome::OperationOutcomeBuilder;
