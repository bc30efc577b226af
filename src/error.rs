use serde_json::{json, Value as JsonValue};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Table parser errors
// ---------------------------------------------------------------------------

/// Fatal failures of the table parser. Malformed rows and ill-fitting
/// delimiters are never reported here; the rows are dropped.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("input is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),
}

// ---------------------------------------------------------------------------
// Boundary errors
// ---------------------------------------------------------------------------

/// The two error signals handed back to collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Empty table or empty group-scoped subset.
    #[error("{0}")]
    NoData(String),

    /// Parse or internal failure.
    #[error("{0}")]
    Processing(String),
}

impl AnalysisError {
    /// HTTP-style status for the error.
    pub fn status(&self) -> u16 {
        match self {
            AnalysisError::NoData(_) => 400,
            AnalysisError::Processing(_) => 500,
        }
    }

    /// `{"error": "<message>"}` response body.
    pub fn to_body(&self) -> JsonValue {
        json!({ "error": self.to_string() })
    }
}
