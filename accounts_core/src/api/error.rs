use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Easy alias for error handling
pub type Result<T> = std::result::Result<T, Error>;

/// Messages attached to individual request fields, keyed by field name.
pub type FieldMessages = BTreeMap<String, Vec<String>>;

/// Errors that can happen while processing requests
#[derive(Debug, Error)]
pub enum Error {
    /// We couldn't parse a URL, for example if the base URL was invalid.
    #[error("URL error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// We couldn't talk to the server, or couldn't read what it sent back.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server rejected the request (4xx). If the rejection was about
    /// specific fields, `fields` says which ones and why.
    #[error("{message}")]
    Client {
        /// The top-level error message
        message: String,

        /// Per-field validation messages, if any
        fields: FieldMessages,
    },

    /// The server had a problem (5xx)
    #[error("the server had an internal error")]
    Server,

    /// The server returned something we don't know how to handle.
    #[error("unexpected status: {0}")]
    Unexpected(StatusCode),
}

impl Error {
    /// Get the messages for a single field, if the server rejected that field.
    pub fn field(&self, name: &str) -> Option<&[String]> {
        match self {
            Self::Client { fields, .. } => fields.get(name).map(Vec::as_slice),
            _ => None,
        }
    }
}

/// The body the server sends along with any error.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResp {
    /// A human-readable description of the problem
    pub error: String,

    /// Field-scoped validation messages. Empty unless the request failed
    /// validation.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: FieldMessages,
}
