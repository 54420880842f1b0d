//! Response header generation.

use axum::http::{HeaderMap, HeaderValue, header};
use helios_vstore::precondition::format_http_date;
use helios_vstore::types::VersionRecord;

/// The media type of every resource body.
pub const FHIR_JSON: &str = "application/fhir+json";

/// Builder for resource response headers.
///
/// Generates the standard headers of a resource response:
/// - ETag (weak validator, `W/"<versionId>"`)
/// - Last-Modified (RFC 1123)
/// - Location (for created resources)
/// - Content-Type
#[derive(Debug, Default)]
pub struct ResourceHeaders {
    etag: Option<String>,
    last_modified: Option<String>,
    location: Option<String>,
    content_type: Option<String>,
}

impl ResourceHeaders {
    /// Creates a new ResourceHeaders builder.
    pub fn new() -> Self {
        Self {
            content_type: Some(FHIR_JSON.to_string()),
            ..Default::default()
        }
    }

    /// Creates headers describing a version record.
    pub fn from_record(record: &VersionRecord) -> Self {
        Self::new()
            .with_etag(record.etag())
            .with_last_modified(format_http_date(&record.last_modified()))
    }

    /// Sets the ETag value.
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    /// Sets the Last-Modified value.
    pub fn with_last_modified(mut self, timestamp: impl Into<String>) -> Self {
        self.last_modified = Some(timestamp.into());
        self
    }

    /// Sets the Location URL.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Drops the Content-Type, for responses without a body.
    pub fn without_content_type(mut self) -> Self {
        self.content_type = None;
        self
    }

    /// Converts to an Axum HeaderMap.
    pub fn to_header_map(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        let pairs = [
            (header::CONTENT_TYPE, &self.content_type),
            (header::ETAG, &self.etag),
            (header::LAST_MODIFIED, &self.last_modified),
            (header::LOCATION, &self.location),
        ];
        for (name, value) in pairs {
            if let Some(value) = value.as_deref().and_then(|v| HeaderValue::from_str(v).ok()) {
                headers.insert(name, value);
            }
        }

        headers
    }

    /// Returns the ETag value.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Returns the Last-Modified value.
    pub fn last_modified(&self) -> Option<&str> {
        self.last_modified.as_deref()
    }

    /// Returns the Location value.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}
