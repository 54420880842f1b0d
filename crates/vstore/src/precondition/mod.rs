//! HTTP precondition evaluation.
//!
//! Decides whether a caller's cached view of a resource is still current,
//! from the raw `If-None-Match`, `If-Modified-Since` and `If-Match` header
//! occurrences of a request.
//!
//! Every function here is pure: header strings and head metadata in, a small
//! decision enum out. Malformed input never fails a request. A header that
//! cannot be understood is treated as absent ("fail open"), with the single
//! exception of `If-Match`, which guards a write and is rejected instead.
//!
//! # Precedence
//!
//! For reads, `If-None-Match` decides whenever it carries at least one usable
//! token. `If-Modified-Since` is consulted only when `If-None-Match` is absent
//! or holds nothing but unparseable tokens.

pub mod http_date;

use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;
use tracing::debug;

use crate::types::{EntityTag, VersionRecord};

pub use http_date::{format_http_date, parse_http_date};

/// Outcome of a read precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Serve the full response.
    Proceed,
    /// The caller's copy is current; answer 304.
    NotModified,
}

/// Outcome of `If-None-Match` evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoneMatch {
    /// No token matched, or none could be parsed.
    Proceed,
    /// A version tag matched the head in a read.
    NotModified,
    /// `*` matched an existing resource, or a version tag matched in a write.
    AllMatch,
}

/// Whether `If-None-Match` guards a read or a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchContext {
    /// Conditional read.
    Read,
    /// Conditional create-on-update.
    Write,
}

/// The version a version-qualified write expects to replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfMatch {
    /// `If-Match: *`, any live version.
    Any,
    /// A specific version.
    Version(u64),
}

impl std::fmt::Display for IfMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IfMatch::Any => f.write_str("*"),
            IfMatch::Version(v) => write!(f, "{}", v),
        }
    }
}

/// An `If-Match` header that names no usable version.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid If-Match value: {value}")]
pub struct InvalidIfMatch {
    /// The offending header value.
    pub value: String,
}

/// A single `If-None-Match` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoneMatchToken {
    Any,
    Tag(EntityTag),
}

/// Splits header occurrences on commas and parses each token leniently.
/// Unparseable tokens are dropped.
fn none_match_tokens<S: AsRef<str>>(values: &[S]) -> Vec<NoneMatchToken> {
    values
        .iter()
        .flat_map(|value| value.as_ref().split(','))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            if token == "*" {
                Some(NoneMatchToken::Any)
            } else {
                let parsed = EntityTag::parse_lenient(token).map(NoneMatchToken::Tag);
                if parsed.is_none() {
                    debug!(token = %token, "Ignoring unparseable If-None-Match token");
                }
                parsed
            }
        })
        .collect()
}

/// Evaluates `If-None-Match` against the head of a logical resource.
///
/// A tombstoned head is not an existing resource for this purpose, so neither
/// `*` nor a version tag match it.
///
/// # Arguments
///
/// * `values` - Every occurrence of the header, unsplit
/// * `head` - The current head, if any
/// * `context` - Whether the request is a read or a write
pub fn evaluate_if_none_match<S: AsRef<str>>(
    values: &[S],
    head: Option<&VersionRecord>,
    context: MatchContext,
) -> NoneMatch {
    let Some(head) = head.filter(|h| !h.is_deleted()) else {
        return NoneMatch::Proceed;
    };

    let mut version_matched = false;
    for token in none_match_tokens(values) {
        match token {
            NoneMatchToken::Any => return NoneMatch::AllMatch,
            NoneMatchToken::Tag(tag) if tag.version_id() == head.version_id() => {
                version_matched = true;
            }
            NoneMatchToken::Tag(_) => {}
        }
    }

    match (version_matched, context) {
        (false, _) => NoneMatch::Proceed,
        (true, MatchContext::Read) => NoneMatch::NotModified,
        (true, MatchContext::Write) => NoneMatch::AllMatch,
    }
}

/// Returns true if the `If-None-Match` values contain the wildcard `*`.
pub fn is_wildcard<S: AsRef<str>>(values: &[S]) -> bool {
    none_match_tokens(values).contains(&NoneMatchToken::Any)
}

/// Reduces `If-Modified-Since` occurrences to a single instant.
///
/// Occurrences holding only invalid tokens are ignored. All remaining valid
/// tokens must name the same instant; if they disagree, or if there are none,
/// the result is `None` and the precondition does not apply.
pub fn if_modified_since_instant<S: AsRef<str>>(values: &[S]) -> Option<DateTime<Utc>> {
    let mut agreed: Option<DateTime<Utc>> = None;

    for value in values {
        let value = value.as_ref();
        let tokens = http_date::scan(value);

        if !tokens.iter().any(Option::is_some) {
            if !tokens.is_empty() {
                debug!(value = %value, "Ignoring unparseable If-Modified-Since");
            }
            continue;
        }

        for instant in tokens.into_iter().flatten() {
            match agreed {
                None => agreed = Some(instant),
                Some(previous) if previous == instant => {}
                Some(previous) => {
                    debug!(
                        first = %previous,
                        second = %instant,
                        "Ignoring conflicting If-Modified-Since values"
                    );
                    return None;
                }
            }
        }
    }

    agreed
}

/// Evaluates `If-Modified-Since` against a head's `lastModified`.
///
/// HTTP dates carry whole seconds, so `last_modified` is truncated to the
/// second before the comparison.
pub fn evaluate_if_modified_since<S: AsRef<str>>(
    values: &[S],
    last_modified: DateTime<Utc>,
) -> Precondition {
    match if_modified_since_instant(values) {
        Some(instant) if last_modified.trunc_subsecs(0) <= instant => Precondition::NotModified,
        _ => Precondition::Proceed,
    }
}

/// Parses `If-Match` occurrences into the version a write expects.
///
/// Returns `Ok(None)` when the header is absent or blank. Several tokens are
/// accepted only if they all name the same version.
///
/// # Errors
///
/// Returns [`InvalidIfMatch`] when a token is not `*` or a version tag, or when
/// tokens disagree.
pub fn parse_if_match<S: AsRef<str>>(values: &[S]) -> Result<Option<IfMatch>, InvalidIfMatch> {
    let mut expected: Option<IfMatch> = None;

    for value in values {
        for token in value.as_ref().split(',').map(str::trim) {
            if token.is_empty() {
                continue;
            }

            let parsed = if token == "*" {
                IfMatch::Any
            } else {
                EntityTag::parse_lenient(token)
                    .map(|tag| IfMatch::Version(tag.version_id()))
                    .ok_or_else(|| InvalidIfMatch {
                        value: value.as_ref().to_string(),
                    })?
            };

            match expected {
                None => expected = Some(parsed),
                Some(existing) if existing == parsed => {}
                Some(_) => {
                    return Err(InvalidIfMatch {
                        value: value.as_ref().to_string(),
                    });
                }
            }
        }
    }

    Ok(expected)
}

/// The conditional headers of one request, as raw occurrences.
#[derive(Debug, Clone, Default)]
pub struct ConditionalRequest {
    /// Every `If-Match` occurrence.
    pub if_match: Vec<String>,
    /// Every `If-None-Match` occurrence.
    pub if_none_match: Vec<String>,
    /// Every `If-Modified-Since` occurrence.
    pub if_modified_since: Vec<String>,
}

impl ConditionalRequest {
    /// Creates an empty set of conditions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an `If-None-Match` occurrence.
    pub fn with_if_none_match(mut self, value: impl Into<String>) -> Self {
        self.if_none_match.push(value.into());
        self
    }

    /// Adds an `If-Modified-Since` occurrence.
    pub fn with_if_modified_since(mut self, value: impl Into<String>) -> Self {
        self.if_modified_since.push(value.into());
        self
    }

    /// Adds an `If-Match` occurrence.
    pub fn with_if_match(mut self, value: impl Into<String>) -> Self {
        self.if_match.push(value.into());
        self
    }

    /// Returns true if `If-None-Match` holds `*` or a parseable version tag.
    pub fn has_if_none_match(&self) -> bool {
        !none_match_tokens(&self.if_none_match).is_empty()
    }

    /// Returns true if `If-None-Match` contains `*`.
    pub fn is_create_only(&self) -> bool {
        is_wildcard(&self.if_none_match)
    }

    /// Returns the version expected by `If-Match`.
    pub fn if_match(&self) -> Result<Option<IfMatch>, InvalidIfMatch> {
        parse_if_match(&self.if_match)
    }

    /// Decides a conditional read against the current head.
    pub fn evaluate_read(&self, head: &VersionRecord) -> Precondition {
        if self.has_if_none_match() {
            match evaluate_if_none_match(&self.if_none_match, Some(head), MatchContext::Read) {
                NoneMatch::Proceed => Precondition::Proceed,
                NoneMatch::NotModified | NoneMatch::AllMatch => Precondition::NotModified,
            }
        } else {
            evaluate_if_modified_since(&self.if_modified_since, head.last_modified())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ResourceKey, ResourceMethod};
    use chrono::TimeZone;
    use serde_json::json;

    const NOV_6: &str = "Sun, 06 Nov 1994 08:49:37 GMT";
    const NOV_7: &str = "Mon, 07 Nov 1994 08:49:37 GMT";

    fn head(version: u64) -> VersionRecord {
        VersionRecord::new(
            ResourceKey::new("Patient", "p1"),
            version,
            Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap(),
            json!({"resourceType": "Patient"}),
            ResourceMethod::Put,
        )
    }

    fn tombstone(version: u64) -> VersionRecord {
        VersionRecord::tombstone(
            ResourceKey::new("Patient", "p1"),
            version,
            Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap(),
        )
    }

    // ========================================================================
    // If-None-Match
    // ========================================================================

    #[test]
    fn test_none_match_forms() {
        let h = head(2);
        for form in ["2", "\"2\"", "W/\"2\"", "W/2"] {
            assert_eq!(
                evaluate_if_none_match(&[form], Some(&h), MatchContext::Read),
                NoneMatch::NotModified,
                "form {form:?}"
            );
        }
    }

    #[test]
    fn test_none_match_version_in_write_context() {
        assert_eq!(
            evaluate_if_none_match(&["W/\"2\""], Some(&head(2)), MatchContext::Write),
            NoneMatch::AllMatch
        );
    }

    #[test]
    fn test_none_match_wildcard() {
        assert_eq!(
            evaluate_if_none_match(&["*"], Some(&head(5)), MatchContext::Write),
            NoneMatch::AllMatch
        );
        assert_eq!(
            evaluate_if_none_match(&["*"], None, MatchContext::Write),
            NoneMatch::Proceed
        );
    }

    #[test]
    fn test_none_match_tombstone_never_matches() {
        let t = tombstone(3);
        assert_eq!(
            evaluate_if_none_match(&["*"], Some(&t), MatchContext::Write),
            NoneMatch::Proceed
        );
        assert_eq!(
            evaluate_if_none_match(&["W/\"3\""], Some(&t), MatchContext::Read),
            NoneMatch::Proceed
        );
    }

    #[test]
    fn test_none_match_non_matching_and_invalid() {
        let h = head(2);
        assert_eq!(
            evaluate_if_none_match(&["W/\"1\""], Some(&h), MatchContext::Read),
            NoneMatch::Proceed
        );
        assert_eq!(
            evaluate_if_none_match(&["bogus"], Some(&h), MatchContext::Read),
            NoneMatch::Proceed
        );
        let empty: [&str; 0] = [];
        assert_eq!(
            evaluate_if_none_match(&empty, Some(&h), MatchContext::Read),
            NoneMatch::Proceed
        );
    }

    #[test]
    fn test_none_match_lists_and_repeated_headers() {
        let h = head(2);
        assert_eq!(
            evaluate_if_none_match(&["W/\"1\", W/\"2\""], Some(&h), MatchContext::Read),
            NoneMatch::NotModified
        );
        assert_eq!(
            evaluate_if_none_match(&["W/\"1\"", "bogus, 2"], Some(&h), MatchContext::Read),
            NoneMatch::NotModified
        );
    }

    // ========================================================================
    // If-Modified-Since
    // ========================================================================

    #[test]
    fn test_modified_since_not_modified_when_equal_or_later() {
        let lm = head(1).last_modified();
        assert_eq!(evaluate_if_modified_since(&[NOV_6], lm), Precondition::NotModified);
        assert_eq!(evaluate_if_modified_since(&[NOV_7], lm), Precondition::NotModified);
    }

    #[test]
    fn test_modified_since_proceeds_when_earlier() {
        let lm = Utc.with_ymd_and_hms(1994, 11, 8, 0, 0, 0).unwrap();
        assert_eq!(evaluate_if_modified_since(&[NOV_6], lm), Precondition::Proceed);
    }

    #[test]
    fn test_modified_since_ignores_subsecond_precision() {
        let lm = head(1).last_modified() + chrono::Duration::milliseconds(500);
        assert_eq!(evaluate_if_modified_since(&[NOV_6], lm), Precondition::NotModified);
    }

    #[test]
    fn test_modified_since_truncated_token_fails_open() {
        let lm = head(1).last_modified();
        assert_eq!(evaluate_if_modified_since(&["Tue"], lm), Precondition::Proceed);
    }

    #[test]
    fn test_modified_since_invalid_occurrence_is_ignored() {
        let lm = head(1).last_modified();
        assert_eq!(
            evaluate_if_modified_since(&["Tue", NOV_6], lm),
            Precondition::NotModified
        );
    }

    #[test]
    fn test_modified_since_duplicates_agree() {
        let lm = head(1).last_modified();
        let combined = format!("{}, {}", NOV_6, NOV_6);
        assert_eq!(
            evaluate_if_modified_since(&[NOV_6, NOV_6], lm),
            evaluate_if_modified_since(&[NOV_6], lm)
        );
        assert_eq!(
            evaluate_if_modified_since(&[combined.as_str()], lm),
            Precondition::NotModified
        );
        // Same instant in a different format is still the same instant.
        assert_eq!(
            evaluate_if_modified_since(&[NOV_6, "Sunday, 06-Nov-94 08:49:37 GMT"], lm),
            Precondition::NotModified
        );
    }

    #[test]
    fn test_modified_since_conflicting_values_fail_open() {
        let lm = head(1).last_modified();
        assert_eq!(
            evaluate_if_modified_since(&[NOV_6, NOV_7], lm),
            Precondition::Proceed
        );
        let combined = format!("{}, {}", NOV_7, NOV_6);
        assert_eq!(
            evaluate_if_modified_since(&[combined.as_str()], lm),
            Precondition::Proceed
        );
    }

    #[test]
    fn test_modified_since_wrong_weekday_fails_open() {
        let lm = head(1).last_modified();
        assert_eq!(
            evaluate_if_modified_since(&["Mon, 06 Nov 1994 08:49:37 GMT"], lm),
            Precondition::Proceed
        );
    }

    // ========================================================================
    // If-Match
    // ========================================================================

    #[test]
    fn test_parse_if_match() {
        let empty: [&str; 0] = [];
        assert_eq!(parse_if_match(&empty), Ok(None));
        assert_eq!(parse_if_match(&["W/\"4\""]), Ok(Some(IfMatch::Version(4))));
        assert_eq!(parse_if_match(&["*"]), Ok(Some(IfMatch::Any)));
        assert_eq!(
            parse_if_match(&["W/\"4\"", "4"]),
            Ok(Some(IfMatch::Version(4)))
        );
        assert!(parse_if_match(&["abc"]).is_err());
        assert!(parse_if_match(&["W/\"4\", W/\"5\""]).is_err());
    }

    // ========================================================================
    // Combined read decision
    // ========================================================================

    #[test]
    fn test_none_match_takes_precedence() {
        let h = head(2);
        // If-None-Match does not match, If-Modified-Since would say 304.
        let conditions = ConditionalRequest::new()
            .with_if_none_match("W/\"1\"")
            .with_if_modified_since(NOV_7);
        assert_eq!(conditions.evaluate_read(&h), Precondition::Proceed);

        // If-None-Match matches, If-Modified-Since is far in the past.
        let conditions = ConditionalRequest::new()
            .with_if_none_match("W/\"2\"")
            .with_if_modified_since("Sat, 01 Jan 1944 00:00:00 GMT");
        assert_eq!(conditions.evaluate_read(&h), Precondition::NotModified);
    }

    #[test]
    fn test_unparseable_none_match_defers_to_modified_since() {
        let h = head(2);
        let conditions = ConditionalRequest::new()
            .with_if_none_match("bogus")
            .with_if_modified_since(NOV_6);
        assert!(!conditions.has_if_none_match());
        assert_eq!(conditions.evaluate_read(&h), Precondition::NotModified);

        let conditions = ConditionalRequest::new()
            .with_if_none_match("bogus, W/\"1\"")
            .with_if_modified_since(NOV_6);
        assert!(conditions.has_if_none_match());
        assert_eq!(conditions.evaluate_read(&h), Precondition::Proceed);
    }

    #[test]
    fn test_modified_since_alone() {
        let conditions = ConditionalRequest::new().with_if_modified_since(NOV_6);
        assert_eq!(conditions.evaluate_read(&head(1)), Precondition::NotModified);
    }

    #[test]
    fn test_no_conditions_proceeds() {
        assert_eq!(
            ConditionalRequest::new().evaluate_read(&head(1)),
            Precondition::Proceed
        );
    }

    #[test]
    fn test_is_create_only() {
        assert!(ConditionalRequest::new().with_if_none_match("*").is_create_only());
        assert!(!ConditionalRequest::new().with_if_none_match("W/\"1\"").is_create_only());
    }
}
