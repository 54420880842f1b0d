//! Request header extractors.
//!
//! - [`conditional`] - Conditional request headers (If-Match, If-None-Match, If-Modified-Since)
//! - [`prefer`] - Prefer header handling

pub mod conditional;
pub mod prefer;

pub use conditional::ConditionalHeaders;
pub use prefer::{PreferHeader, ReturnPreference};
