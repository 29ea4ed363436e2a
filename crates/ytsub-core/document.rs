//! Format-independent subtitle document
//!
//! A [`Document`] is what every reader produces and every writer consumes:
//! the canvas size plus the lines in insertion order. It also hosts the
//! whole-document passes that several writers share.

use crate::model::{AnchorPoint, Line, PointF, Size};
use std::collections::BTreeSet;
use tracing::debug;

/// Lines shorter than this gap to the next start are extended to meet it
const GAP_CLOSE_THRESHOLD_MS: i64 = 50;

/// Canvas dimensions and the lines shown on it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub video_dimensions: Size,
    /// Lines in insertion order, not necessarily sorted by time
    pub lines: Vec<Line>,
}

impl Document {
    /// Create an empty document for a canvas
    #[must_use]
    pub const fn new(video_dimensions: Size) -> Self {
        Self {
            video_dimensions,
            lines: Vec::new(),
        }
    }

    /// Position an unpositioned line with `anchor` is shown at
    #[must_use]
    pub fn default_position(&self, anchor: AnchorPoint) -> PointF {
        self.video_dimensions.default_position(anchor)
    }

    /// Explicit or default position of `line`
    #[must_use]
    pub fn resolved_position(&self, line: &Line) -> PointF {
        line.position
            .unwrap_or_else(|| self.default_position(line.anchor_point))
    }

    /// Stable sort of the lines by start time
    pub fn sort_lines(&mut self) {
        self.lines.sort_by_key(|line| line.start);
    }

    /// Snap line ends onto a nearby line start
    ///
    /// An end within 50 ms of another line's start (before or after it) is
    /// moved onto that start, which avoids flicker between consecutive
    /// subtitles. The closer start wins; ties prefer extending.
    pub fn close_gaps(&mut self) {
        let starts: BTreeSet<i64> = self.lines.iter().map(|line| line.start).collect();

        for line in &mut self.lines {
            let gap_before = starts
                .range(..line.end)
                .next_back()
                .filter(|&&start| start > line.start)
                .map(|&start| (start, line.end - start));
            let gap_after = starts
                .range(line.end..)
                .next()
                .map(|&start| (start, start - line.end));

            let before = gap_before.map_or(i64::MAX, |(_, gap)| gap);
            let after = gap_after.map_or(i64::MAX, |(_, gap)| gap);

            if before < GAP_CLOSE_THRESHOLD_MS && before < after {
                if let Some((start, _)) = gap_before {
                    line.end = start;
                }
            } else if after < GAP_CLOSE_THRESHOLD_MS && after <= before {
                if let Some((start, _)) = gap_after {
                    line.end = start;
                }
            }
        }
    }

    /// Combine overlapping default-positioned lines with the same anchor
    ///
    /// Each overlapping pair is replaced by up to three lines: the part where
    /// only the first is shown, the part where both are shown stacked into
    /// one line, and the part where only the remaining one is shown. For
    /// bottom-aligned anchors the later line goes on top so earlier text
    /// does not jump. Zero-length lines are dropped.
    pub fn merge_simultaneous_lines(&mut self) {
        let mut lines: Vec<Line> = self
            .lines
            .drain(..)
            .filter(|line| line.start < line.end)
            .collect();
        lines.sort_by_key(|line| line.start);

        let mut i = 0;
        while i < lines.len() {
            if lines[i].position.is_some() {
                i += 1;
                continue;
            }

            let first_end = lines[i].end;
            let anchor = lines[i].anchor_point;
            let partner = lines[i + 1..]
                .iter()
                .take_while(|line| line.start < first_end)
                .position(|line| line.position.is_none() && line.anchor_point == anchor)
                .map(|offset| i + 1 + offset);

            let Some(j) = partner else {
                i += 1;
                continue;
            };

            let second = lines.remove(j);
            let first = lines.remove(i);

            if first.start < second.start {
                insert_concatenated(&mut lines, i, first.start, second.start, false, &[&first]);
            }

            let overlap_end = first.end.min(second.end);
            if first.anchor_point.is_bottom() {
                insert_concatenated(&mut lines, i, second.start, overlap_end, false, &[&second, &first]);
            } else {
                insert_concatenated(&mut lines, i, second.start, overlap_end, false, &[&first, &second]);
            }

            if first.end < second.end {
                insert_concatenated(&mut lines, i, first.end, second.end, true, &[&second]);
            } else if second.end < first.end {
                insert_concatenated(&mut lines, i, second.end, first.end, false, &[&first]);
            }
        }

        debug!(lines = lines.len(), "merged simultaneous lines");
        self.lines = lines;
    }

    /// Merge adjacent sections that render identically in every line
    pub fn merge_identically_formatted_sections(&mut self) {
        for line in &mut self.lines {
            merge_identically_formatted_sections(line);
        }
    }
}

fn insert_concatenated(
    lines: &mut Vec<Line>,
    base_index: usize,
    start: i64,
    end: i64,
    after_equal_start: bool,
    sources: &[&Line],
) {
    let Some((head, rest)) = sources.split_first() else {
        return;
    };

    let mut line = (*head).clone();
    for source in rest {
        if source.sections.is_empty() {
            continue;
        }
        let first_new = line.sections.len();
        line.sections.extend(source.sections.iter().cloned());
        line.sections[first_new].text.insert_str(0, "\r\n");
    }
    line.start = start;
    line.end = end;

    let mut index = base_index;
    while index < lines.len()
        && (lines[index].start < start || (after_equal_start && lines[index].start == start))
    {
        index += 1;
    }
    lines.insert(index, line);
}

/// Merge adjacent sections of `line` with identical formatting
///
/// Sections only merge when they also share the native karaoke start
/// offset and neither carries karaoke timing or animations.
pub fn merge_identically_formatted_sections(line: &mut Line) {
    let mut i = 0;
    while i + 1 < line.sections.len() {
        let (current, next) = (&line.sections[i], &line.sections[i + 1]);
        let mergeable = current.format_eq(next)
            && current.start_offset == next.start_offset
            && current.blur == next.blur
            && current.duration == 0
            && next.duration == 0
            && current.animations.is_empty()
            && next.animations.is_empty();

        if mergeable {
            let next = line.sections.remove(i + 1);
            line.sections[i].text.push_str(&next.text);
        } else {
            i += 1;
        }
    }
}

/// Split every section whose text mixes line breaks and text
///
/// Afterwards each section holds either only `\r`/`\n` characters or none.
pub fn move_line_breaks_to_separate_sections(line: &mut Line) {
    let mut index = line.sections.len();
    while index > 0 {
        index -= 1;
        let pieces = split_line_break_runs(&line.sections[index].text);
        if pieces.len() <= 1 {
            continue;
        }

        let template = line.sections.remove(index);
        for (offset, piece) in pieces.into_iter().enumerate() {
            let mut section = template.clone();
            section.text = piece;
            line.sections.insert(index + offset, section);
        }
    }
}

fn split_line_break_runs(text: &str) -> Vec<String> {
    let is_break = |c: char| c == '\r' || c == '\n';
    let mut pieces: Vec<String> = Vec::new();
    let mut previous: Option<bool> = None;
    for c in text.chars() {
        let kind = is_break(c);
        match pieces.last_mut() {
            Some(piece) if previous == Some(kind) => piece.push(c),
            _ => pieces.push(c.to_string()),
        }
        previous = Some(kind);
    }
    pieces
}
