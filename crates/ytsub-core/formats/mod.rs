//! Subtitle file formats and extension-based dispatch
//!
//! Every format reads into and writes from a [`Document`]. Reading `.ass`
//! compiles the script; the other readers produce plain static lines.
//!
//! | Extension        | Read | Write |
//! |------------------|------|-------|
//! | `.ass`           | yes  | yes   |
//! | `.ytt`, `.srv3`  | yes  | yes   |
//! | `.srt`           | yes  | yes   |
//! | `.sbv`           | yes  | no    |

pub mod line_based;
pub mod sbv;
pub mod srt;
pub mod ytt;

use crate::ass::{self, AssWriter, VisualizingWriter};
use crate::document::Document;
use crate::style::StyleOptionsList;
use crate::utils::{CoreError, Result};
use core::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;
use ytt::YttOptions;

/// A file format known by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubtitleFormat {
    Ass,
    /// YouTube timed text, `.ytt` or `.srv3`
    Ytt,
    Srt,
    Sbv,
}

impl SubtitleFormat {
    /// Format for an extension without the dot, ignoring case
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.to_ascii_lowercase();
        match extension.as_str() {
            "ass" => Some(Self::Ass),
            "ytt" | "srv3" => Some(Self::Ytt),
            "srt" => Some(Self::Srt),
            "sbv" => Some(Self::Sbv),
            _ => None,
        }
    }

    /// Format of a file path
    ///
    /// # Errors
    ///
    /// [`CoreError::UnsupportedFormat`] if the extension is missing or unknown.
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|extension| extension.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| CoreError::UnsupportedFormat(path.display().to_string()))
    }

    #[must_use]
    pub const fn can_write(self) -> bool {
        !matches!(self, Self::Sbv)
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ass => "ass",
            Self::Ytt => "ytt",
            Self::Srt => "srt",
            Self::Sbv => "sbv",
        })
    }
}

/// Settings shared by the readers and writers
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    pub style_options: StyleOptionsList,
    pub ytt: YttOptions,
    /// Write `.ass` with the debug visualization
    pub visual: bool,
}

/// Parse `text` as `format`
///
/// # Errors
///
/// Returns the reader's structural errors.
pub fn read(text: &str, format: SubtitleFormat, options: &ConversionOptions) -> Result<Document> {
    let document = match format {
        SubtitleFormat::Ass => ass::parse(text, &options.style_options)?,
        SubtitleFormat::Ytt => ytt::parse(text, &options.ytt)?,
        SubtitleFormat::Srt => srt::parse(text)?,
        SubtitleFormat::Sbv => sbv::parse(text)?,
    };
    debug!(%format, lines = document.lines.len(), "read document");
    Ok(document)
}

/// Serialize `document` as `format`
///
/// # Errors
///
/// [`CoreError::UnsupportedFormat`] for read-only formats, otherwise the
/// writer's internal errors.
pub fn write(document: &Document, format: SubtitleFormat, options: &ConversionOptions) -> Result<String> {
    debug!(%format, lines = document.lines.len(), visual = options.visual, "writing document");
    match format {
        SubtitleFormat::Ass if options.visual => {
            VisualizingWriter::new(document.video_dimensions)?.write(document)
        }
        SubtitleFormat::Ass => AssWriter::new(document.video_dimensions)?.write(document),
        SubtitleFormat::Ytt => ytt::write(document, &options.ytt),
        SubtitleFormat::Srt => Ok(srt::write(document)),
        SubtitleFormat::Sbv => Err(CoreError::UnsupportedFormat(format!(
            "writing {format} is not supported"
        ))),
    }
}

/// Read a subtitle file, choosing the format by extension
///
/// # Errors
///
/// Unsupported extension, I/O failure or a reader error.
pub fn load(path: &Path, options: &ConversionOptions) -> Result<Document> {
    let format = SubtitleFormat::from_path(path)?;
    let text = std::fs::read_to_string(path)?;
    read(strip_bom(&text), format, options)
}

/// Destination used when none is given
///
/// `.sbv` becomes `.srt`, `.ytt` becomes `.reverse.ass`, `.srv3` becomes
/// `.ass` and everything else `.ytt`.
#[must_use]
pub fn default_destination(source: &Path) -> PathBuf {
    let extension = source
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    let new_extension = match extension.as_deref() {
        Some("sbv") => "srt",
        Some("ytt") => "reverse.ass",
        Some("srv3") => "ass",
        _ => "ytt",
    };
    source.with_extension(new_extension)
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{FEFF}').unwrap_or(text)
}
