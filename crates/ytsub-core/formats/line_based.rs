//! Shared reader state of the line-oriented formats

use crate::document::Document;
use crate::model::{Line, Section, Size};
use crate::utils::Color;
use regex::{Captures, Regex};

/// `H:MM:SS.mmm` or `H:MM:SS,mmm`, capturing the four components
pub const TIMESTAMP: &str = r"(\d+):(\d+):(\d+)[.,](\d+)";

/// Start and end in ms if `row` begins with two timestamps
#[must_use]
pub fn parse_timestamps(regex: &Regex, row: &str) -> Option<(i64, i64)> {
    let caps = regex.captures(row)?;
    Some((timestamp_at(&caps, 1)?, timestamp_at(&caps, 5)?))
}

fn timestamp_at(caps: &Captures<'_>, first_group: usize) -> Option<i64> {
    let number = |offset: usize| caps.get(first_group + offset)?.as_str().parse::<i64>().ok();
    let fraction = caps.get(first_group + 3)?.as_str();
    // Fractions are milliseconds padded on the right
    let millis = format!("{fraction:0<3}").get(..3)?.parse::<i64>().ok()?;
    Some(((number(0)? * 60 + number(1)?) * 60 + number(2)?) * 1000 + millis)
}

/// Accumulates text rows into white-on-dark lines
#[derive(Debug, Default)]
pub struct LineBuilder {
    lines: Vec<Line>,
    current: Option<Line>,
}

impl LineBuilder {
    /// Close the current line and open a new one
    pub fn start_line(&mut self, start: i64, end: i64) {
        self.flush();
        self.current = Some(Line::new(start, end));
    }

    /// Add a text row to the current line; rows before the first line are dropped
    pub fn append(&mut self, row: &str) {
        let Some(line) = &mut self.current else {
            return;
        };
        match line.sections.first_mut() {
            Some(section) => {
                section.text.push_str("\r\n");
                section.text.push_str(row);
            }
            None => {
                let mut section = Section::new(row);
                section.fore_color = Color::WHITE;
                section.back_color = Color::from_argb(192, 8, 8, 8);
                line.sections.push(section);
            }
        }
    }

    /// Document of every finished line
    #[must_use]
    pub fn finish(mut self, video_dimensions: Size) -> Document {
        self.flush();
        let mut document = Document::new(video_dimensions);
        document.lines = self.lines;
        document
    }

    fn flush(&mut self) {
        let Some(mut line) = self.current.take() else {
            return;
        };
        let Some(section) = line.sections.first_mut() else {
            return;
        };
        let trimmed = section.text.trim_end().len();
        section.text.truncate(trimmed);
        self.lines.push(line);
    }
}
