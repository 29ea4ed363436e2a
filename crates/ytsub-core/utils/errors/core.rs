//! Core error type for subtitle conversion
//!
//! Provides the main `CoreError` enum shared by the readers, the compiler
//! stages and the writers. Malformed tag arguments never surface here; they
//! are recovered inside the tag handlers.

use core::fmt;
use thiserror::Error;

/// Main error type for conversion operations
///
/// Covers structural document errors (fatal load failures), I/O and
/// configuration problems, and internal contract violations that indicate
/// a bug in an upstream pipeline stage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Structurally invalid source document
    #[error("Parse error: {0}")]
    Parse(String),

    /// Color format parsing errors
    #[error("Invalid color format: {0}")]
    InvalidColor(String),

    /// Numeric value parsing errors
    #[error("Invalid numeric value: {0}")]
    InvalidNumeric(String),

    /// Time format parsing errors
    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    /// Malformed timed-text XML
    #[error("XML error: {0}")]
    Xml(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Configuration errors (style options)
    #[error("Configuration error: {0}")]
    Config(String),

    /// No codec is registered for the file extension
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Validation errors (duplicate registrations, bad references)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal consistency error (should not happen)
    #[error("Internal error: {0} (this is a bug, please report)")]
    Internal(String),
}

impl CoreError {
    /// Create parse error from message
    pub fn parse<T: fmt::Display>(message: T) -> Self {
        Self::Parse(message.to_string())
    }

    /// Create XML error from message
    pub fn xml<T: fmt::Display>(message: T) -> Self {
        Self::Xml(message.to_string())
    }

    /// Create configuration error from message
    pub fn config<T: fmt::Display>(message: T) -> Self {
        Self::Config(message.to_string())
    }

    /// Create internal error (indicates a bug)
    pub fn internal<T: fmt::Display>(message: T) -> Self {
        Self::Internal(message.to_string())
    }

    /// Check if error is recoverable
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Parse(_)
            | Self::InvalidColor(_)
            | Self::InvalidNumeric(_)
            | Self::InvalidTime(_)
            | Self::Xml(_)
            | Self::Validation(_)
            | Self::Io(_)
            | Self::Config(_)
            | Self::UnsupportedFormat(_) => true,

            Self::Internal(_) => false,
        }
    }

    /// Check if error indicates a bug in the library
    #[must_use]
    pub const fn is_internal_bug(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

/// Result type alias for convenience
pub type Result<T> = core::result::Result<T, CoreError>;
