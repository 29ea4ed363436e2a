//! Error types for parsing, compiling and writing subtitles
//!
//! # Error Philosophy
//!
//! - Use `thiserror` for structured error handling in the library
//! - A malformed tag argument is recovered locally and never becomes an error
//! - Structural document problems abort the conversion with a descriptive message
//! - Contract violations between pipeline stages are `Internal` errors
//!
//! # Examples
//!
//! ```rust
//! use ytsub_core::utils::errors::{CoreError, ErrorCategory};
//!
//! let color_err = CoreError::invalid_color("invalid");
//! let time_err = CoreError::invalid_time("1:23", "missing seconds");
//!
//! assert_eq!(color_err.category(), ErrorCategory::Format);
//! assert!(time_err.suggestion().is_some());
//! ```

mod category;
mod core;

pub use category::ErrorCategory;
pub use self::core::{CoreError, Result};

impl CoreError {
    /// Create color error from invalid format
    pub fn invalid_color<T: ::core::fmt::Display>(format: T) -> Self {
        Self::InvalidColor(format!("{format}"))
    }

    /// Create numeric error from parsing failure
    pub fn invalid_numeric<T: ::core::fmt::Display>(value: T, reason: &str) -> Self {
        Self::InvalidNumeric(format!("'{value}': {reason}"))
    }

    /// Create time error from invalid format
    pub fn invalid_time<T: ::core::fmt::Display>(time: T, reason: &str) -> Self {
        Self::InvalidTime(format!("'{time}': {reason}"))
    }
}

/// Convert from standard I/O errors
impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(format!("{err}"))
    }
}

/// Convert from XML reader/writer errors
impl From<quick_xml::Error> for CoreError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(format!("{err}"))
    }
}

/// Convert from style options parse errors
impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("{err}"))
    }
}

/// Convert from integer parse errors
impl From<::core::num::ParseIntError> for CoreError {
    fn from(err: ::core::num::ParseIntError) -> Self {
        Self::InvalidNumeric(format!("Integer parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_creation_methods() {
        let parse_err = CoreError::parse("test message");
        assert!(matches!(parse_err, CoreError::Parse(_)));

        let color_err = CoreError::invalid_color("invalid");
        assert!(matches!(color_err, CoreError::InvalidColor(_)));

        let time_err = CoreError::invalid_time("invalid", "wrong format");
        assert!(matches!(time_err, CoreError::InvalidTime(_)));
    }

    #[test]
    fn error_display() {
        let error = CoreError::invalid_color("test");
        let display_str = format!("{error}");
        assert!(display_str.contains("Invalid color format"));
        assert!(display_str.contains("test"));

        let internal = CoreError::internal("two shadows");
        assert!(internal.to_string().contains("this is a bug"));
    }

    #[test]
    fn error_conversion() {
        let parse_int_err: ::core::num::ParseIntError = "abc".parse::<i32>().unwrap_err();
        let core_err: CoreError = parse_int_err.into();
        assert!(matches!(core_err, CoreError::InvalidNumeric(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.ass");
        let core_err: CoreError = io_err.into();
        assert!(matches!(core_err, CoreError::Io(ref msg) if msg.contains("missing.ass")));
    }

    #[test]
    fn error_properties() {
        let error = CoreError::invalid_color("test");
        assert!(error.is_recoverable());
        assert!(!error.is_internal_bug());

        let bug = CoreError::internal("unexpected");
        assert!(!bug.is_recoverable());
        assert!(bug.is_internal_bug());
    }
}
