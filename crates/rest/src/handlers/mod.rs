//! HTTP handlers for the resource interactions.
//!
//! Each handler is generic over the storage backend `S` and extracts its
//! shared state, path parameters and headers through Axum extractors.

pub mod create;
pub mod delete;
pub mod health;
pub mod history;
pub mod read;
pub mod update;
pub mod vread;

pub use create::create_handler;
pub use delete::delete_handler;
pub use health::health_handler;
pub use history::history_handler;
pub use read::read_handler;
pub use update::update_handler;
pub use vread::vread_handler;

use axum::http::StatusCode;
use axum::response::Response;

use helios_vstore::types::VersionRecord;

use crate::middleware::prefer::{PreferHeader, ReturnPreference};
use crate::responses::format::{render_resource, resource_response};
use crate::responses::headers::ResourceHeaders;
use crate::responses::operation_outcome::OperationOutcomeBuilder;

/// Builds the response of a successful create or update.
///
/// The body follows the client's `Prefer: return=` choice. `outcome` is
/// rendered only for `return=OperationOutcome`.
pub(crate) fn write_response(
    status: StatusCode,
    record: &VersionRecord,
    headers: ResourceHeaders,
    prefer: PreferHeader,
    outcome: OperationOutcomeBuilder,
) -> Response {
    let body = match prefer.return_preference() {
        ReturnPreference::Minimal => None,
        ReturnPreference::OperationOutcome => Some(outcome.build()),
        ReturnPreference::Representation => Some(render_resource(record)),
    };

    resource_response(status, headers, body)
}

/// Builds the `Location` of a version.
///
/// Path segments are percent-encoded so that any id yields a valid header
/// value.
pub(crate) fn version_location(base_url: &str, record: &VersionRecord) -> String {
    let version = record.version_id().to_string();
    let segments = [
        record.resource_type(),
        record.id(),
        "_history",
        version.as_str(),
    ];

    match url::Url::parse(base_url) {
        Ok(mut url) => {
            if let Ok(mut path) = url.path_segments_mut() {
                path.pop_if_empty().extend(segments);
            }
            url.to_string()
        }
        Err(_) => format!("{}/{}", base_url, record.versioned_url()),
    }
}
