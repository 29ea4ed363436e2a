//! SubRip (`.srt`)

use super::line_based::{parse_timestamps, LineBuilder, TIMESTAMP};
use crate::document::Document;
use crate::model::Size;
use crate::utils::time::format_srt_time;
use crate::utils::Result;
use core::fmt::Write as _;
use regex::Regex;
use std::sync::OnceLock;

fn timestamps_regex() -> &'static Regex {
    static TIMESTAMPS: OnceLock<Regex> = OnceLock::new();
    TIMESTAMPS.get_or_init(|| {
        Regex::new(&format!("^{TIMESTAMP} --> {TIMESTAMP}"))
            .expect("srt timestamp regex should compile")
    })
}

/// Parse SubRip text
///
/// A number on its own line is held back until the next line shows whether
/// it starts a new cue or belongs to the text.
///
/// # Errors
///
/// Currently infallible; the `Result` matches the other readers.
pub fn parse(text: &str) -> Result<Document> {
    let mut builder = LineBuilder::default();
    let mut pending_number: Option<&str> = None;

    for row in text.lines() {
        if row.trim().parse::<u64>().is_ok() {
            if let Some(number) = pending_number.take() {
                builder.append(number);
            }
            pending_number = Some(row);
            continue;
        }

        if pending_number.is_some() {
            if let Some((start, end)) = parse_timestamps(timestamps_regex(), row) {
                builder.start_line(start, end);
                pending_number = None;
                continue;
            }
        }

        if let Some(number) = pending_number.take() {
            builder.append(number);
        }
        builder.append(row);
    }

    if let Some(number) = pending_number {
        builder.append(number);
    }
    Ok(builder.finish(Size::default()))
}

/// Write `document` as SubRip, numbering cues from 1
#[must_use]
pub fn write(document: &Document) -> String {
    let mut out = String::new();
    for (index, line) in document.lines.iter().enumerate() {
        let _ = writeln!(out, "{}", index + 1);
        let _ = writeln!(
            out,
            "{} --> {}",
            format_srt_time(line.start),
            format_srt_time(line.end)
        );
        let _ = writeln!(out, "{}", line.text().replace("\r\n", "\n"));
        out.push('\n');
    }
    out
}
