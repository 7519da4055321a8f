//! Error types for Pocket

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Ways a generated payload can break the JSON contract
///
/// Every variant carries the raw generated text so callers can surface it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("{detail}")]
    MalformedJson { detail: String, raw: String },

    #[error("missing required field `{field}`")]
    MissingField { field: &'static str, raw: String },

    #[error("invalid field `{field}`: {detail}")]
    InvalidField {
        field: &'static str,
        detail: String,
        raw: String,
    },
}

impl ExtractionError {
    /// The generated text that failed to parse
    pub fn raw(&self) -> &str {
        match self {
            Self::MalformedJson { raw, .. }
            | Self::MissingField { raw, .. }
            | Self::InvalidField { raw, .. } => raw,
        }
    }

    /// Whether the failure means the query held no usable expense
    ///
    /// Client errors map to 400; everything else is a 500 parse failure.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::MalformedJson { .. } => false,
            Self::MissingField { .. } => true,
            Self::InvalidField { field, .. } => *field == "expense",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
