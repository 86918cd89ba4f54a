//! Error types for query parsing and configuration
//!
//! Only filter value coercion can fail while parsing a query string. Every
//! other stage degrades to schema defaults, so [`ValidationError`] is the one
//! failure an HTTP layer needs to translate into a client error.
//!
//! # Example
//!
//! ```rust
//! use acton_query::error::{ValidationError, ValidationErrorKind};
//!
//! let error = ValidationError::invalid_number("age", "abc");
//! assert_eq!(error.kind, ValidationErrorKind::InvalidNumber);
//! assert_eq!(error.field, "age");
//! assert_eq!(error.error_code(), "VALIDATION_ERROR");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Category of filter value validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// Value could not be read as a number, or is outside the safe integer range
    InvalidNumber,
    /// Value is not one of the allowed values of an enum-restricted field
    InvalidValue,
    /// Value could not be read as a date
    InvalidDate,
    /// Value could not be read as a unix timestamp
    InvalidTimestamp,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNumber => write!(f, "invalid_number"),
            Self::InvalidValue => write!(f, "invalid_value"),
            Self::InvalidDate => write!(f, "invalid_date"),
            Self::InvalidTimestamp => write!(f, "invalid_timestamp"),
        }
    }
}

/// A filter value that does not fit its field type
///
/// Carries the offending field and raw value so callers can report them back
/// to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// The category of failure
    pub kind: ValidationErrorKind,
    /// Field the value was given for
    pub field: String,
    /// Raw value as it appeared in the query string
    pub value: String,
    /// Human-readable message
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(
        kind: ValidationErrorKind,
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field: field.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Value is not a usable number for `field`
    pub fn invalid_number(field: impl Into<String>, value: impl Into<String>) -> Self {
        let field = field.into();
        let value = value.into();
        let message = format!("{} is not a valid number for {}", value, field);
        Self::new(ValidationErrorKind::InvalidNumber, field, value, message)
    }

    /// Value is outside the allowed set for `field`
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        allowed: &[String],
    ) -> Self {
        let field = field.into();
        let value = value.into();
        let message = format!(
            "{} is not a valid value for {}, valid values are: {}",
            value,
            field,
            allowed.join(", ")
        );
        Self::new(ValidationErrorKind::InvalidValue, field, value, message)
    }

    /// Value could not be parsed as a date for `field`
    pub fn invalid_date(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        let field = field.into();
        let value = value.into();
        let message = format!(
            "{} could not be parsed as date for {}, Reason: {}",
            value, field, reason
        );
        Self::new(ValidationErrorKind::InvalidDate, field, value, message)
    }

    /// Value could not be parsed as a unix timestamp for `field`
    pub fn invalid_timestamp(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        let field = field.into();
        let value = value.into();
        let message = format!(
            "{} could not be parsed as unix timestamp for {}, Reason: {}",
            value, field, reason
        );
        Self::new(ValidationErrorKind::InvalidTimestamp, field, value, message)
    }

    /// Stable error code for HTTP-layer translators
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        "VALIDATION_ERROR"
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Main error type for the crate
///
/// Large error variants are boxed to reduce stack size
#[derive(Debug, Error)]
pub enum Error {
    /// A filter value failed type coercion
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Resource schema is internally inconsistent
    #[error("Schema error: {0}")]
    Schema(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Borrow the validation failure, if this is one
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}
