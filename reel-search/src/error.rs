//! Error types for reel-search
//!
//! Only [`SearchFailure`] is ever surfaced to the user. Lookup, restoration
//! and validation failures are recovered where they occur and logged.

use thiserror::Error;

/// Typeahead lookup failures (recovered to an empty suggestion list)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupFailure {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No lookup client registered for {0}")]
    Unregistered(String),
}

/// Main search call failures (user-visible)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchFailure {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Unexpected response: {0}")]
    Decode(#[from] DecodeError),
}

impl SearchFailure {
    /// Message shown to the user in place of results
    pub fn user_message(&self) -> String {
        match self {
            SearchFailure::Network(_) => {
                "Search is unavailable right now. Check your connection and try again.".to_string()
            }
            SearchFailure::Api(status, _) if *status >= 500 => {
                "The search service had a problem. Please try again.".to_string()
            }
            SearchFailure::Api(_, _) => "The search could not be completed.".to_string(),
            SearchFailure::Decode(_) => "The search service returned an unexpected response.".to_string(),
        }
    }
}

/// Search service response did not match the paged envelope shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("response is neither a paged envelope nor a list: {0}")]
    Shape(String),
}

/// Navigation payload or backup snapshot could not be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestorationDecodeFailure {
    #[error("malformed restoration payload: {0}")]
    Malformed(String),

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    #[error("snapshot belongs to screen {found}, expected {expected}")]
    ScreenMismatch { expected: String, found: String },

    #[error("inconsistent snapshot: {0}")]
    Inconsistent(String),
}

/// Invalid filter spec set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterSpecError {
    #[error("duplicate filter key: {0}")]
    DuplicateKey(String),

    #[error("default value of {key} does not match kind {kind}")]
    DefaultKindMismatch { key: String, kind: String },

    #[error("invalid range bounds for {0}")]
    InvalidRange(String),

    #[error("filter {0} is not a dynamic lookup")]
    NotALookup(String),

    #[error("filter key {0} is reserved for the URL")]
    ReservedKey(String),
}
