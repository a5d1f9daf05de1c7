//! # Flow Errors
//!
//! Error types for search tokens and the search flow.

use std::io;

use thiserror::Error;

use crate::spec::ConfigurationError;

/// Result type for token operations
pub type TokenResult<T> = Result<T, TokenError>;

/// Result type for search flow operations
pub type FlowResult<T> = Result<T, FlowError>;

/// Search token errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Token lifetime has passed
    #[error("Search token expired")]
    Expired,

    /// Signed with a different key, or tampered with
    #[error("Invalid search token signature")]
    InvalidSignature,

    /// Not a token at all
    #[error("Malformed search token: {0}")]
    Malformed(String),

    /// Criteria could not be signed
    #[error("Failed to encode search token: {0}")]
    Encoding(String),
}

/// Search flow errors
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Token(#[from] TokenError),

    /// An operation needed the current form before one was built
    #[error("No form has been built yet")]
    NoForm,

    #[error("Failed to read flow config {path}: {source}")]
    ConfigRead { path: String, source: io::Error },

    #[error("Invalid flow config {path}: {reason}")]
    ConfigParse { path: String, reason: String },

    /// Parsed, but a value is outside its usable range
    #[error("Invalid flow config: {0}")]
    ConfigInvalid(String),
}
