//! CLI-specific error types
//!
//! All CLI errors end the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::flow::{FlowError, TokenError};
use crate::spec::ConfigurationError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Flow configuration file error
    ConfigError,
    /// I/O error (files, stdout)
    IoError,
    /// Spec document or spec shape rejected
    SpecError,
    /// Search token could not be encoded or decoded
    TokenError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "FORMFLOW_CLI_CONFIG_ERROR",
            Self::IoError => "FORMFLOW_CLI_IO_ERROR",
            Self::SpecError => "FORMFLOW_CLI_SPEC_ERROR",
            Self::TokenError => "FORMFLOW_CLI_TOKEN_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn spec_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::SpecError, msg)
    }

    pub fn token_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::TokenError, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigurationError> for CliError {
    fn from(e: ConfigurationError) -> Self {
        Self::spec_error(e.to_string())
    }
}

impl From<TokenError> for CliError {
    fn from(e: TokenError) -> Self {
        Self::token_error(e.to_string())
    }
}

impl From<FlowError> for CliError {
    fn from(e: FlowError) -> Self {
        match e {
            FlowError::Configuration(e) => e.into(),
            FlowError::Token(e) => e.into(),
            other => Self::config_error(other.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
