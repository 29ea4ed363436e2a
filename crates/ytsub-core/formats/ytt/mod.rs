//! YouTube timed text (`.ytt`/`.srv3`, "format 3")
//!
//! The writer deduplicates line and section attributes into the `wp`, `ws`
//! and `pen` tables of the head and applies the compatibility passes of
//! [`enhance`]; the reader reverses both so that converted files can be
//! inspected as scripts again.
//!
//! # Example
//!
//! ```rust
//! use ytsub_core::document::Document;
//! use ytsub_core::formats::ytt::{self, YttOptions};
//! use ytsub_core::model::{Line, Section, Size};
//! use ytsub_core::utils::Color;
//!
//! let mut section = Section::new("Hello");
//! section.fore_color = Color::WHITE;
//! let mut document = Document::new(Size::new(1280, 720));
//! document.lines.push(Line::with_section(1000, 2000, section));
//!
//! let xml = ytt::write(&document, &YttOptions::default())?;
//! assert!(xml.contains(r#"<p t="940" d="1000" p="1" wp="1" ws="1">"#));
//!
//! let read_back = ytt::parse(&xml, &YttOptions::default())?;
//! assert_eq!(read_back.lines[0].start, 1000);
//! assert_eq!(read_back.lines[0].text(), "Hello");
//! # Ok::<(), ytsub_core::utils::CoreError>(())
//! ```

pub mod enhance;
pub mod reader;
pub mod tables;
pub mod writer;

pub use reader::YttReader;
pub use writer::YttWriter;

use crate::document::Document;
use crate::model::Size;
use crate::utils::Result;
use serde::{Deserialize, Serialize};

/// Separates sections without visible width
pub const ZERO_WIDTH_SPACE: &str = "\u{200B}";

/// Space used for manual padding, marked by zero-width spaces so the reader
/// can strip it
pub const PADDING_SPACE: &str = "\u{200B} \u{200B}";

/// Canvas that timed-text positions are resolved against when reading
pub const REFERENCE_VIDEO_DIMENSIONS: Size = Size::new(1280, 720);

/// Serializer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YttOptions {
    /// Time in ms the player shows lines late by, subtracted from every start
    pub display_delay_ms: i64,
}

impl Default for YttOptions {
    fn default() -> Self {
        Self {
            display_delay_ms: 60,
        }
    }
}

/// Serialize `document` as timed text
///
/// # Errors
///
/// See [`YttWriter::write`].
pub fn write(document: &Document, options: &YttOptions) -> Result<String> {
    YttWriter::new(*options).write(document)
}

/// Read timed text back into a document
///
/// # Errors
///
/// See [`YttReader::parse`].
pub fn parse(text: &str, options: &YttOptions) -> Result<Document> {
    YttReader::new(*options).parse(text)
}
