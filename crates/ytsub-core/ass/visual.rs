//! Debug writer showing what the timed-text player will display
//!
//! Script renderers draw backgrounds, shadows and karaoke differently from
//! the timed-text player. This writer rewrites each line into layers that a
//! script renderer draws the same way: a background line, blurred or offset
//! copies per shadow kind, and the text on top. Ruby annotations are laid
//! out with a [`TextMeasurer`], and overlapping lines get increasing layers.

use super::interpreter::Interpreter;
use super::ruby::RubyLayout;
use super::writer::AssWriter;
use crate::document::{move_line_breaks_to_separate_sections, Document};
use crate::karaoke;
use crate::measure::{ApproximateTextMeasurer, TextMeasurer};
use crate::model::{Line, PointF, ShadowType, Size};
use crate::utils::{Color, Result};
use tracing::debug;

/// Bevel highlight drawn for the default dark bevel color
const BEVEL_HIGHLIGHT: Color = Color::from_rgb(0xCC, 0xCC, 0xCC);
const DEFAULT_SHADOW: Color = Color::from_rgb(0x22, 0x22, 0x22);

/// Layer counter for time-overlapping lines
#[derive(Debug)]
struct LayerAssigner {
    simultaneous_end: i64,
    layer: i32,
}

impl LayerAssigner {
    const fn new() -> Self {
        Self {
            simultaneous_end: i64::MIN,
            layer: 0,
        }
    }

    fn next(&mut self, line: &Line) -> i32 {
        if line.start < self.simultaneous_end {
            self.layer += 1;
        } else {
            self.layer = 0;
        }
        self.simultaneous_end = self.simultaneous_end.max(line.end);
        self.layer
    }
}

/// `.ass` writer that emulates the timed-text presentation
pub struct VisualizingWriter {
    writer: AssWriter,
    measurer: Box<dyn TextMeasurer>,
}

impl VisualizingWriter {
    /// Writer measuring ruby text with [`ApproximateTextMeasurer`]
    ///
    /// # Errors
    ///
    /// Fails only if the embedded styles are malformed.
    pub fn new(video_dimensions: Size) -> Result<Self> {
        Self::with_measurer(video_dimensions, Box::new(ApproximateTextMeasurer))
    }

    /// Writer measuring ruby text with `measurer`
    ///
    /// # Errors
    ///
    /// Fails only if the embedded styles are malformed.
    pub fn with_measurer(video_dimensions: Size, measurer: Box<dyn TextMeasurer>) -> Result<Self> {
        Ok(Self {
            writer: AssWriter::new(video_dimensions)?,
            measurer,
        })
    }

    /// Serialize `document` as visualization layers
    ///
    /// # Errors
    ///
    /// Returns the errors of [`AssWriter::write_line`].
    pub fn write(&self, document: &Document) -> Result<String> {
        let video = self.writer.stylesheet().video_dimensions;
        let mut lines = document.lines.clone();
        clear_explicit_default_positions(&mut lines, video);

        let interpreter = Interpreter::new(self.writer.stylesheet())?;
        emulate_karaoke_for_lines_with_background_or_shadow(&mut lines, &interpreter);
        self.visualize_ruby_text(&mut lines, video);
        lines.sort_by_key(|line| line.start);

        let mut out = String::new();
        self.writer.write_preamble(&mut out);
        let mut layers = LayerAssigner::new();
        let mut written = 0;
        for line in lines {
            for layer_line in visualization_lines(line, video) {
                let layer = layers.next(&layer_line);
                self.writer.write_line(&mut out, &layer_line, layer)?;
                written += 1;
            }
        }

        debug!(lines = written, "wrote visualization script");
        Ok(out)
    }

    fn visualize_ruby_text(&self, lines: &mut Vec<Line>, video: Size) {
        let line_height = self.writer.stylesheet().default_style().line_height;
        let mut index = 0;
        while index < lines.len() {
            let line = &lines[index];
            if !line.sections.iter().any(|section| section.ruby_part.is_ruby_text()) {
                index += 1;
                continue;
            }

            let position = line
                .position
                .unwrap_or_else(|| video.default_position(line.anchor_point));
            let laid_out = RubyLayout::new(line, position, line_height, self.measurer.as_ref()).into_lines();
            let count = laid_out.len();
            lines.splice(index..=index, laid_out);
            index += count;
        }
    }
}

/// Forget explicit positions within a pixel of the anchor's default
fn clear_explicit_default_positions(lines: &mut [Line], video: Size) {
    for line in lines {
        let Some(position) = line.position else {
            continue;
        };
        let default = video.default_position(line.anchor_point);
        if (default.x - position.x).abs() < 1.0 && (default.y - position.y).abs() < 1.0 {
            line.position = None;
        }
    }
}

/// Emulate karaoke whose unsung part would show a background or shadow
///
/// Script renderers only hide the unsung text of native karaoke, not its
/// box or shadow.
fn emulate_karaoke_for_lines_with_background_or_shadow(
    lines: &mut Vec<Line>,
    formatter: &dyn karaoke::CursorFormatter,
) {
    let mut index = 0;
    while index < lines.len() {
        let line = &lines[index];
        let timed = karaoke::syllable_durations(line).iter().any(|&d| d > 0);
        let decorated = line
            .sections
            .iter()
            .any(|section| section.back_color.a > 0 || !section.shadow_colors.is_empty());
        if !timed || !decorated {
            index += 1;
            continue;
        }

        let mut timed_line = line.clone();
        karaoke::restore_durations(&mut timed_line);
        let steps = karaoke::emulate(&timed_line, formatter);
        let count = steps.len();
        lines.splice(index..=index, steps);
        index += count;
    }
}

/// Background, shadow and text layers for one line, bottom first
fn visualization_lines(mut line: Line, video: Size) -> Vec<Line> {
    move_line_breaks_to_separate_sections(&mut line);
    emulate_borders(&mut line);
    protect_whitespace(&mut line);

    if line.sections.iter().all(|section| section.shadow_colors.is_empty()) {
        return vec![line];
    }

    let mut layers = Vec::new();
    if line.has_background() {
        let mut background = line.clone();
        for section in &mut background.sections {
            section.fore_color = Color::EMPTY;
            section.secondary_color = Color::EMPTY;
            section.shadow_colors.clear();
        }
        layers.push(background);
    }

    layers.extend(shadow_lines(&line, video));

    for section in &mut line.sections {
        section.back_color = Color::EMPTY;
        section.shadow_colors.clear();
    }
    layers.push(line);
    layers
}

fn shadow_lines(line: &Line, video: Size) -> Vec<Line> {
    let has = |shadow_type: ShadowType| {
        line.sections
            .iter()
            .any(|section| section.shadow_colors.contains_key(&shadow_type))
    };
    let plain = |shadow_type: ShadowType| {
        move |colors: &std::collections::BTreeMap<ShadowType, Color>| {
            colors.get(&shadow_type).copied().unwrap_or(Color::EMPTY)
        }
    };

    let mut lines = Vec::new();
    if has(ShadowType::SoftShadow) {
        for blur in [4.0, 3.0, 2.0] {
            lines.push(shadow_line(line, video, plain(ShadowType::SoftShadow), 2.0, blur));
        }
    }
    if has(ShadowType::HardShadow) {
        for offset in [3.0, 2.0, 1.0] {
            lines.push(shadow_line(line, video, plain(ShadowType::HardShadow), offset, 0.0));
        }
    }
    if has(ShadowType::Bevel) {
        lines.push(shadow_line(line, video, plain(ShadowType::Bevel), -1.0, 0.0));
        lines.push(shadow_line(
            line,
            video,
            |colors| match colors.get(&ShadowType::Bevel) {
                Some(color) if color.rgb_eq(DEFAULT_SHADOW) => BEVEL_HIGHLIGHT.with_alpha(color.a),
                Some(color) => *color,
                None => Color::EMPTY,
            },
            1.0,
            0.0,
        ));
    }
    if has(ShadowType::Glow) {
        for blur in [2.0, 1.5, 1.0] {
            lines.push(shadow_line(line, video, plain(ShadowType::Glow), 0.0, blur));
        }
    }
    lines
}

/// Copy of `line` drawn in its shadow color, shifted and blurred
fn shadow_line(
    line: &Line,
    video: Size,
    shadow_color: impl Fn(&std::collections::BTreeMap<ShadowType, Color>) -> Color,
    offset: f32,
    blur: f32,
) -> Line {
    let mut shadow = line.clone();
    if offset != 0.0 {
        let position = shadow
            .position
            .unwrap_or_else(|| video.default_position(shadow.anchor_point));
        shadow.position = Some(PointF::new(position.x + offset, position.y + offset));
    }

    for section in &mut shadow.sections {
        section.fore_color = shadow_color(&section.shadow_colors);
        section.back_color = Color::EMPTY;
        section.shadow_colors.clear();
        section.blur = blur;
    }
    shadow
}

fn is_line_break(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c == '\r' || c == '\n')
}

/// Pad each text row with a space on both ends, like the player's box padding
fn emulate_borders(line: &mut Line) {
    let count = line.sections.len();
    for idx in 0..count {
        if is_line_break(&line.sections[idx].text) {
            continue;
        }

        let row_start = idx == 0 || line.sections[idx - 1].text.ends_with("\r\n");
        let row_end = idx + 1 == count || line.sections[idx + 1].text.starts_with("\r\n");
        let text = &mut line.sections[idx].text;
        if row_start {
            text.insert(0, ' ');
        }
        if row_end {
            text.push(' ');
        }
    }
}

/// Keep edge whitespace from losing its background
///
/// Whitespace-only sections become invisible dots around spaces; leading and
/// trailing whitespace of other sections is wrapped in hard spaces.
fn protect_whitespace(line: &mut Line) {
    let is_space = |c: char| c == ' ' || c == '\u{A0}';
    for section in &mut line.sections {
        if section.text.is_empty() || is_line_break(&section.text) {
            continue;
        }

        let trimmed_start = section.text.trim_start_matches(is_space);
        if trimmed_start.is_empty() {
            let length = section.text.chars().count();
            section.text = protected_whitespace(length, '.');
            section.fore_color = section.fore_color.with_alpha(0);
            section.shadow_colors.clear();
            continue;
        }

        let leading = section.text.chars().count() - trimmed_start.chars().count();
        let body = trimmed_start.trim_end_matches(is_space);
        let trailing = trimmed_start.chars().count() - body.chars().count();
        section.text = format!(
            "{}{body}{}",
            protected_whitespace(leading, '\u{A0}'),
            protected_whitespace(trailing, '\u{A0}')
        );
    }
}

fn protected_whitespace(length: usize, protection: char) -> String {
    match length {
        0 => String::new(),
        1 => protection.to_string(),
        _ => format!("{protection}{}{protection}", " ".repeat(length - 2)),
    }
}
