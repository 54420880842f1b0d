//! Conditional request header handling.
//!
//! Collects every occurrence of `If-Match`, `If-None-Match` and
//! `If-Modified-Since` without interpreting them. A header may be repeated or
//! comma-combined, and how repeated occurrences combine is decided by the
//! precondition evaluator, not here. Values that are not valid UTF-8 are
//! dropped, which makes them count as absent.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderName, StatusCode, header, request::Parts},
};
use tracing::warn;

use helios_vstore::precondition::{ConditionalRequest, IfMatch};

use crate::error::RestResult;

/// Extracted conditional headers from a request.
#[derive(Debug, Default, Clone)]
pub struct ConditionalHeaders {
    request: ConditionalRequest,
}

fn occurrences(headers: &HeaderMap, name: HeaderName) -> Vec<String> {
    headers
        .get_all(&name)
        .iter()
        .filter_map(|value| match value.to_str() {
            Ok(s) => Some(s.to_string()),
            Err(_) => {
                warn!(header = %name, "Ignoring non-ASCII conditional header");
                None
            }
        })
        .collect()
}

impl ConditionalHeaders {
    /// Creates a new ConditionalHeaders from a HeaderMap.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            request: ConditionalRequest {
                if_match: occurrences(headers, header::IF_MATCH),
                if_none_match: occurrences(headers, header::IF_NONE_MATCH),
                if_modified_since: occurrences(headers, header::IF_MODIFIED_SINCE),
            },
        }
    }

    /// Returns the raw conditions for the precondition evaluator.
    pub fn request(&self) -> &ConditionalRequest {
        &self.request
    }

    /// Returns the raw If-None-Match occurrences.
    pub fn if_none_match(&self) -> &[String] {
        &self.request.if_none_match
    }

    /// Parses If-Match into the version a write expects to replace.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` if If-Match is present but names no version.
    pub fn expected_version(&self) -> RestResult<Option<IfMatch>> {
        Ok(self.request.if_match()?)
    }

    /// Checks if any conditional headers are present.
    pub fn has_conditions(&self) -> bool {
        !self.request.if_match.is_empty()
            || !self.request.if_none_match.is_empty()
            || !self.request.if_modified_since.is_empty()
    }
}

/// Axum extractor for conditional headers.
impl<S> FromRequestParts<S> for ConditionalHeaders
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ConditionalHeaders::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_collects_repeated_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::IF_NONE_MATCH, HeaderValue::from_static("W/\"1\""));
        headers.append(header::IF_NONE_MATCH, HeaderValue::from_static("W/\"2\", W/\"3\""));

        let conditional = ConditionalHeaders::from_headers(&headers);
        assert_eq!(conditional.if_none_match(), &["W/\"1\"", "W/\"2\", W/\"3\""]);
        assert!(conditional.has_conditions());
    }

    #[test]
    fn test_expected_version() {
        let mut headers = HeaderMap::new();
        headers.insert(header::IF_MATCH, HeaderValue::from_static("W/\"4\""));
        let conditional = ConditionalHeaders::from_headers(&headers);
        assert_eq!(conditional.expected_version().unwrap(), Some(IfMatch::Version(4)));

        let mut headers = HeaderMap::new();
        headers.insert(header::IF_MATCH, HeaderValue::from_static("W/\"four\""));
        let conditional = ConditionalHeaders::from_headers(&headers);
        assert!(conditional.expected_version().is_err());
    }

    #[test]
    fn test_no_conditions() {
        let conditional = ConditionalHeaders::from_headers(&HeaderMap::new());
        assert!(!conditional.has_conditions());
        assert_eq!(conditional.expected_version().unwrap(), None);
    }

    #[test]
    fn test_non_ascii_value_is_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::IF_MODIFIED_SINCE,
            HeaderValue::from_bytes(b"Sun, 06 Nov 1994 \xff").unwrap(),
        );

        let conditional = ConditionalHeaders::from_headers(&headers);
        assert!(conditional.request().if_modified_since.is_empty());
    }
}
