//! YouTube SubViewer (`.sbv`), read only

use super::line_based::{parse_timestamps, LineBuilder, TIMESTAMP};
use crate::document::Document;
use crate::model::Size;
use crate::utils::Result;
use regex::Regex;
use std::sync::OnceLock;

fn timestamps_regex() -> &'static Regex {
    static TIMESTAMPS: OnceLock<Regex> = OnceLock::new();
    TIMESTAMPS.get_or_init(|| {
        Regex::new(&format!("^{TIMESTAMP},{TIMESTAMP}")).expect("sbv timestamp regex should compile")
    })
}

/// Parse SubViewer text: a `start,end` row followed by text rows
///
/// # Errors
///
/// Currently infallible; the `Result` matches the other readers.
pub fn parse(text: &str) -> Result<Document> {
    let mut builder = LineBuilder::default();
    for row in text.lines() {
        match parse_timestamps(timestamps_regex(), row) {
            Some((start, end)) => builder.start_line(start, end),
            None => builder.append(row),
        }
    }
    Ok(builder.finish(Size::default()))
}
