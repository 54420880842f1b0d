//! Prefer header handling.
//!
//! Only the `return` preference affects this server: it chooses the body of a
//! successful create or update. See <https://hl7.org/fhir/http.html#ops>.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, request::Parts},
};
use http::HeaderName;

const PREFER: HeaderName = HeaderName::from_static("prefer");

/// What a successful write returns in its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnPreference {
    /// Headers only, no body.
    Minimal,
    /// The stored resource.
    #[default]
    Representation,
    /// An OperationOutcome describing the write.
    OperationOutcome,
}

/// Extracted Prefer header values from a request.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreferHeader {
    return_preference: ReturnPreference,
}

impl PreferHeader {
    /// Creates a new PreferHeader from a HeaderMap.
    ///
    /// Directives may be spread over several Prefer headers; the last
    /// recognised `return=` wins. Unknown values are ignored.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut result = Self::default();

        let directives = headers
            .get_all(PREFER)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(str::trim);

        for directive in directives {
            let Some(value) = directive.strip_prefix("return=") else {
                continue;
            };
            match value.trim_matches('"') {
                "minimal" => result.return_preference = ReturnPreference::Minimal,
                "representation" => result.return_preference = ReturnPreference::Representation,
                "OperationOutcome" => {
                    result.return_preference = ReturnPreference::OperationOutcome
                }
                _ => {}
            }
        }

        result
    }

    /// Returns the return preference.
    pub fn return_preference(&self) -> ReturnPreference {
        self.return_preference
    }

    /// Checks if minimal return is requested.
    pub fn is_minimal(&self) -> bool {
        self.return_preference == ReturnPreference::Minimal
    }

    /// Checks if OperationOutcome return is requested.
    pub fn is_operation_outcome(&self) -> bool {
        self.return_preference == ReturnPreference::OperationOutcome
    }
}

/// Axum extractor for Prefer header.
impl<S> FromRequestParts<S> for PreferHeader
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(PreferHeader::from_headers(&parts.headers))
    }
}
