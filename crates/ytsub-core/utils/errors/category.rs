//! Error categorization and suggestions
//!
//! Groups errors for the command-line front end, which prints the category
//! alongside the message and an optional hint.

use super::CoreError;
use core::fmt;

/// Error category for filtering and user interface organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Problems understanding the structure of a subtitle file
    Parsing,

    /// Problems with specific value formats like colors, numbers, or times
    Format,

    /// Problems reading from or writing to files
    Io,

    /// Problems with style options or other settings
    Configuration,

    /// Cross-reference and registration problems
    Validation,

    /// Errors that indicate bugs in the library itself
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ErrorCategory {
    /// Get human-readable category name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Parsing => "parsing",
            Self::Format => "format",
            Self::Io => "io",
            Self::Configuration => "configuration",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    /// Check if errors in this category are typically user-fixable
    #[must_use]
    pub const fn is_user_fixable(self) -> bool {
        match self {
            Self::Parsing | Self::Format | Self::Configuration | Self::Validation => true,
            Self::Io | Self::Internal => false,
        }
    }
}

impl CoreError {
    /// Get error category for filtering/grouping
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Parse(_) | Self::Xml(_) => ErrorCategory::Parsing,
            Self::InvalidColor(_) | Self::InvalidNumeric(_) | Self::InvalidTime(_) => {
                ErrorCategory::Format
            }
            Self::Io(_) => ErrorCategory::Io,
            Self::Config(_) | Self::UnsupportedFormat(_) => ErrorCategory::Configuration,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Get suggested action for this error
    ///
    /// Returns `None` for errors that don't have standard solutions.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InvalidColor(_) => Some("Use format like '&H00FF00FF' for colors"),
            Self::InvalidTime(_) => Some("Use format like '0:01:30.50' for times"),
            Self::InvalidNumeric(_) => Some("Check numeric format and range"),
            Self::UnsupportedFormat(_) => {
                Some("Supported extensions are .ass, .ytt, .srv3, .srt and .sbv")
            }
            Self::Config(_) => Some("Review the style options file"),
            Self::Internal(_) => Some("Please report this bug to the maintainers"),
            _ => None,
        }
    }
}
