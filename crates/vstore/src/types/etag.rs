//! Version entity tags.
//!
//! ETags are never stored. They are derived from a record's version number and
//! always rendered weak (`W/"N"`). Parsing is lenient and accepts the forms
//! clients send in practice: `N`, `"N"`, `W/"N"` and `W/N`.

use std::fmt;

/// An entity tag naming one version of a logical resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityTag {
    version_id: u64,
}

impl EntityTag {
    /// Creates the weak tag for a version number.
    pub fn weak(version_id: u64) -> Self {
        Self { version_id }
    }

    /// Returns the version number this tag names.
    pub fn version_id(&self) -> u64 {
        self.version_id
    }

    /// Parses a single tag token leniently.
    ///
    /// Returns `None` for anything that does not reduce to a positive integer,
    /// including the wildcard `*`.
    ///
    /// ```
    /// use helios_vstore::types::EntityTag;
    ///
    /// assert_eq!(EntityTag::parse_lenient("W/\"3\"").map(|t| t.version_id()), Some(3));
    /// assert_eq!(EntityTag::parse_lenient("W/3").map(|t| t.version_id()), Some(3));
    /// assert_eq!(EntityTag::parse_lenient("\"3\"").map(|t| t.version_id()), Some(3));
    /// assert!(EntityTag::parse_lenient("abc").is_none());
    /// ```
    pub fn parse_lenient(token: &str) -> Option<Self> {
        let token = token.trim();
        let token = token.strip_prefix("W/").unwrap_or(token).trim();
        let token = match token.strip_prefix('"') {
            Some(rest) => rest.strip_suffix('"')?,
            None => token,
        };

        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        match token.parse::<u64>() {
            Ok(0) | Err(_) => None,
            Ok(version_id) => Some(Self::weak(version_id)),
        }
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W/\"{}\"", self.version_id)
    }
}
