//! Timed-text reader
//!
//! Rebuilds a document from the head tables and body entries, undoing the
//! writer's display delay shift, manual padding, zero-width spaces and
//! bright dark-text copies.

use super::tables::{
    anchor_point, edge_type, font_name, offset_type, real_font_scale, ruby_part, text_directions,
    WindowPosition, DEFAULT_SHADOW_RGB,
};
use super::{YttOptions, PADDING_SPACE, REFERENCE_VIDEO_DIMENSIONS, ZERO_WIDTH_SPACE};
use crate::document::Document;
use crate::model::{HorizontalTextDirection, Line, RubyPart, Section, VerticalTextType};
use crate::utils::{Color, CoreError, Result};
use quick_xml::events::attributes::Attributes;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Karaoke offsets closer than this to the previous one are padding artifacts
const OFFSET_MERGE_THRESHOLD_MS: i64 = 10;

/// Default duration of an entry without `d`
const DEFAULT_DURATION_MS: i64 = 5000;

/// Head table entries by id
#[derive(Debug, Default)]
struct Head {
    positions: Vec<Option<WindowPosition>>,
    window_styles: Vec<Option<(HorizontalTextDirection, VerticalTextType)>>,
    pens: Vec<Option<Section>>,
}

/// Element attributes as unescaped strings
type AttributeMap = HashMap<String, String>;

/// Reads timed text into documents
#[derive(Debug, Clone, Copy, Default)]
pub struct YttReader {
    options: YttOptions,
}

impl YttReader {
    #[must_use]
    pub const fn new(options: YttOptions) -> Self {
        Self { options }
    }

    /// Parse a timed-text file
    ///
    /// Positions are resolved on a 1280×720 canvas.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Xml`] for malformed XML.
    pub fn parse(&self, text: &str) -> Result<Document> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(false);

        let mut head = Head::default();
        let mut lines = Vec::new();
        let mut in_head = false;
        let mut current_line: Option<(Line, Option<Section>)> = None;
        let mut open_section = false;

        loop {
            match reader.read_event()? {
                Event::Start(element) | Event::Empty(element) if in_head => {
                    let attributes = attribute_map(element.attributes(), &reader)?;
                    read_head_entry(&mut head, element.local_name().as_ref(), &attributes);
                }
                Event::Start(element) => match element.local_name().as_ref() {
                    b"head" => in_head = true,
                    b"p" => {
                        let attributes = attribute_map(element.attributes(), &reader)?;
                        current_line = Some(self.read_line_attributes(&head, &attributes));
                    }
                    b"s" => {
                        if let Some((line, line_pen)) = &mut current_line {
                            let attributes = attribute_map(element.attributes(), &reader)?;
                            line.sections
                                .push(read_element_section(&head, line_pen.as_ref(), &attributes));
                            open_section = true;
                        }
                    }
                    _ => {}
                },
                Event::Empty(element) if element.local_name().as_ref() == b"s" => {
                    if let Some((line, line_pen)) = &mut current_line {
                        let attributes = attribute_map(element.attributes(), &reader)?;
                        line.sections
                            .push(read_element_section(&head, line_pen.as_ref(), &attributes));
                    }
                }
                Event::Text(content) => {
                    if let Some((line, line_pen)) = &mut current_line {
                        let text = clean_text(&content.unescape()?);
                        if open_section {
                            if let Some(section) = line.sections.last_mut() {
                                section.text.push_str(&text);
                            }
                        } else {
                            let mut section = line_pen.clone().unwrap_or_else(default_section);
                            section.text = text;
                            line.sections.push(section);
                        }
                    }
                }
                Event::End(element) => match element.local_name().as_ref() {
                    b"head" => in_head = false,
                    b"s" => open_section = false,
                    b"p" => {
                        if let Some((mut line, _)) = current_line.take() {
                            undo_section_workarounds(&mut line);
                            lines.push(line);
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        let mut document = Document::new(REFERENCE_VIDEO_DIMENSIONS);
        document.lines = remove_dark_text_copies(lines);
        document
            .lines
            .retain(|line| line.sections.iter().any(|section| !section.text.is_empty()));
        document.merge_identically_formatted_sections();

        debug!(lines = document.lines.len(), "read timed text");
        Ok(document)
    }

    fn read_line_attributes(&self, head: &Head, attributes: &AttributeMap) -> (Line, Option<Section>) {
        let t = int_attribute(attributes, "t").unwrap_or(0);
        let d = int_attribute(attributes, "d").unwrap_or(DEFAULT_DURATION_MS);

        // A start of 1 ms is the writer's clamp of a start at or before zero
        let start = if t == 1 {
            0
        } else {
            t + self.options.display_delay_ms
        };
        let end = t + d + self.options.display_delay_ms;
        let mut line = Line::new(start, end);

        if let Some(position) = table_entry(&head.positions, attributes, "wp") {
            line.anchor_point = position.anchor_point;
            line.position = Some(position.to_pixels(REFERENCE_VIDEO_DIMENSIONS));
        }
        if let Some((horizontal, vertical)) = table_entry(&head.window_styles, attributes, "ws") {
            line.horizontal_text_direction = horizontal;
            line.vertical_text_type = vertical;
        }

        let line_pen = table_entry(&head.pens, attributes, "p");
        (line, line_pen)
    }
}

fn attribute_map(attributes: Attributes<'_>, reader: &Reader<&[u8]>) -> Result<AttributeMap> {
    let mut map = AttributeMap::new();
    for attribute in attributes {
        let attribute = attribute.map_err(CoreError::xml)?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute.decode_and_unescape_value(reader.decoder())?;
        map.insert(key, value.into_owned());
    }
    Ok(map)
}

fn int_attribute(attributes: &AttributeMap, name: &str) -> Option<i64> {
    attributes.get(name).and_then(|value| value.trim().parse().ok())
}

fn table_entry<T: Clone>(table: &[Option<T>], attributes: &AttributeMap, name: &str) -> Option<T> {
    let index = usize::try_from(int_attribute(attributes, name)?).ok()?;
    table.get(index).cloned().flatten()
}

fn set_table_entry<T>(table: &mut Vec<Option<T>>, id: usize, entry: T) {
    if table.len() <= id {
        table.resize_with(id + 1, || None);
    }
    table[id] = Some(entry);
}

fn read_head_entry(head: &mut Head, name: &[u8], attributes: &AttributeMap) {
    let id = int_attribute(attributes, "id")
        .and_then(|id| usize::try_from(id).ok())
        .unwrap_or(0);
    let int = |name: &str, default: i64| int_attribute(attributes, name).unwrap_or(default);

    match name {
        b"wp" => {
            let position = WindowPosition {
                anchor_point: anchor_point(int("ap", 7) as i32).unwrap_or_default(),
                horizontal: int("ah", 0) as i32,
                vertical: int("av", 0) as i32,
            };
            set_table_entry(&mut head.positions, id, position);
        }
        b"ws" => {
            let directions = text_directions(int("pd", 0) as i32, int("sd", 0) as i32);
            set_table_entry(&mut head.window_styles, id, directions);
        }
        b"pen" => set_table_entry(&mut head.pens, id, read_pen(attributes)),
        other => warn!(element = %String::from_utf8_lossy(other), "ignoring unknown head entry"),
    }
}

fn read_pen(attributes: &AttributeMap) -> Section {
    let int = |name: &str, default: i64| int_attribute(attributes, name).unwrap_or(default);
    let color = |name: &str, default: Color| {
        attributes
            .get(name)
            .and_then(|value| Color::from_html(value).ok())
            .unwrap_or(default)
    };
    let alpha = |name: &str, default: i64| int(name, default).clamp(0, 255) as u8;

    let mut pen = Section::new("");
    pen.font = Some(font_name(int("fs", 0) as i32).to_string());
    pen.scale = real_font_scale(int("sz", 100) as i32);
    pen.offset = offset_type(int("of", 1) as i32);
    pen.bold = int("b", 0) != 0;
    pen.italic = int("i", 0) != 0;
    pen.underline = int("u", 0) != 0;

    let fore_alpha = alpha("fo", 254);
    pen.fore_color = color("fc", Color::WHITE).with_alpha(fore_alpha);
    pen.back_color = color("bc", Color::from_rgb(8, 8, 8)).with_alpha(alpha("bo", 192));

    if let Some(kind) = edge_type(int("et", 0) as i32) {
        let shadow = attributes
            .get("ec")
            .and_then(|value| Color::from_html(value).ok())
            .map_or(DEFAULT_SHADOW_RGB.with_alpha(fore_alpha), |color| color.with_alpha(254));
        pen.shadow_colors.insert(kind, shadow);
    }

    pen.ruby_part = ruby_part(int("rb", 0) as i32);
    pen.packed = int("hg", 0) != 0;
    pen
}

fn read_element_section(head: &Head, line_pen: Option<&Section>, attributes: &AttributeMap) -> Section {
    let mut section = table_entry(&head.pens, attributes, "p")
        .or_else(|| line_pen.cloned())
        .unwrap_or_else(default_section);
    if let Some(offset) = int_attribute(attributes, "t") {
        section.start_offset = offset;
    }
    section
}

/// Formatting of text without a pen
fn default_section() -> Section {
    let mut section = Section::new("");
    section.font = Some("Roboto".to_string());
    section.fore_color = Color::WHITE;
    section.back_color = Color::from_argb(192, 8, 8, 8);
    section
}

fn clean_text(text: &str) -> String {
    text.replace(PADDING_SPACE, "")
        .replace(ZERO_WIDTH_SPACE, "")
        .replace("\r\n", "\n")
        .replace('\n', "\r\n")
}

/// Fold line breaks into the preceding section and drop padding leftovers
fn undo_section_workarounds(line: &mut Line) {
    let is_line_break =
        |text: &str| !text.is_empty() && text.chars().all(|c| c == '\r' || c == '\n');

    let mut i = 0;
    let mut previous_offset = 0;
    while i < line.sections.len() {
        if i > 0 && is_line_break(&line.sections[i].text) {
            let text = std::mem::take(&mut line.sections[i].text);
            line.sections[i - 1].text.push_str(&text);
        }

        if line.sections[i].start_offset - previous_offset < OFFSET_MERGE_THRESHOLD_MS {
            line.sections[i].start_offset = previous_offset;
            if i > 0 && line.sections[i - 1].text.is_empty() {
                line.sections.remove(i - 1);
                continue;
            }
            if line.sections[i].text.is_empty() {
                line.sections.remove(i);
                continue;
            }
        } else {
            previous_offset = line.sections[i].start_offset;
        }

        i += if line.sections[i].ruby_part == RubyPart::Base {
            4
        } else {
            1
        };
    }
}

/// Drop the invisible bright copies that follow lines with dark text
fn remove_dark_text_copies(lines: Vec<Line>) -> Vec<Line> {
    let has_dark_text =
        |line: &Line| line.sections.iter().any(|section| section.fore_color.is_dark());
    let is_copy_of = |copy: &Line, original: &Line| {
        copy.start == original.start
            && copy.end == original.end
            && copy.text() == original.text()
            && copy.sections.iter().all(|section| {
                !section.fore_color.is_dark()
                    && section.fore_color.a == 0
                    && section.back_color.a == 0
                    && section.shadow_colors.is_empty()
            })
    };

    let mut result: Vec<Line> = Vec::with_capacity(lines.len());
    let mut awaiting_copy = false;
    for line in lines {
        if has_dark_text(&line) {
            awaiting_copy = true;
        } else if awaiting_copy {
            awaiting_copy = false;
            if let Some(previous) = result.last_mut() {
                if is_copy_of(&line, previous) {
                    continue;
                }
                previous.android_dark_text_hack_allowed = false;
            }
        }
        result.push(line);
    }

    if awaiting_copy {
        if let Some(last) = result.last_mut() {
            last.android_dark_text_hack_allowed = false;
        }
    }
    result
}
