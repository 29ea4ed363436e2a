//! Timed-text serializer

use super::enhance::enhance;
use super::tables::{
    anchor_point_id, direction_ids, edge_type_id, offset_id, ruby_part_id, AttributeTable, Pen,
    WindowPosition, WindowStyle, DEFAULT_SHADOW_RGB,
};
use super::{YttOptions, ZERO_WIDTH_SPACE};
use crate::document::Document;
use crate::model::{AnchorPoint, Line, OffsetType, RubyPart, Section, VerticalTextType};
use crate::utils::{CoreError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

fn text_row_regex() -> &'static Regex {
    static TEXT_ROW: OnceLock<Regex> = OnceLock::new();
    TEXT_ROW.get_or_init(|| Regex::new(r"[^\r\n]+").expect("text row regex should compile"))
}

/// Attribute tables of one document
#[derive(Debug, Default)]
struct Tables {
    positions: AttributeTable<WindowPosition>,
    window_styles: AttributeTable<WindowStyle>,
    pens: AttributeTable<Pen>,
}

/// Writes documents as timed text
#[derive(Debug, Clone, Copy, Default)]
pub struct YttWriter {
    options: YttOptions,
}

impl YttWriter {
    #[must_use]
    pub const fn new(options: YttOptions) -> Self {
        Self { options }
    }

    /// Serialize `document`
    ///
    /// The document is copied, enhanced and reduced to attribute tables;
    /// the input is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] if a section still carries several
    /// shadows after enhancement, or an XML error from the writer.
    pub fn write(&self, document: &Document) -> Result<String> {
        let mut document = document.clone();
        enhance(&mut document);

        let mut tables = Tables::default();
        for line in &document.lines {
            tables
                .positions
                .intern(WindowPosition::of_line(line, document.video_dimensions));
            tables.window_styles.intern(WindowStyle::of_line(line));
            for section in &line.sections {
                tables.pens.intern(Pen::of_section(section)?);
            }
        }

        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        newline(&mut writer)?;
        writer.write_event(Event::Start(
            BytesStart::new("timedtext").with_attributes([("format", "3")]),
        ))?;
        newline(&mut writer)?;
        write_head(&mut writer, &tables)?;
        self.write_body(&mut writer, &document, &tables)?;
        writer.write_event(Event::End(BytesEnd::new("timedtext")))?;
        newline(&mut writer)?;

        debug!(
            lines = document.lines.len(),
            pens = tables.pens.len(),
            positions = tables.positions.len(),
            "wrote timed text"
        );
        String::from_utf8(writer.into_inner()).map_err(CoreError::internal)
    }

    fn write_body(&self, writer: &mut Writer<Vec<u8>>, document: &Document, tables: &Tables) -> Result<()> {
        writer.write_event(Event::Start(BytesStart::new("body")))?;
        newline(writer)?;
        for line in &document.lines {
            self.write_line(writer, line, document, tables)?;
        }
        writer.write_event(Event::End(BytesEnd::new("body")))?;
        newline(writer)
    }

    fn write_line(
        &self,
        writer: &mut Writer<Vec<u8>>,
        line: &Line,
        document: &Document,
        tables: &Tables,
    ) -> Result<()> {
        if line.sections.is_empty() {
            return Ok(());
        }

        // Starts at or before 0 ms are misplaced or dropped by the mobile apps
        let shifted_end = line.end - self.options.display_delay_ms;
        let start = (line.start - self.options.display_delay_ms).max(1);
        let duration = shifted_end - start;
        if duration <= 0 {
            return Ok(());
        }

        let position = table_id(
            &tables.positions,
            &WindowPosition::of_line(line, document.video_dimensions),
        )?;
        let window_style = table_id(&tables.window_styles, &WindowStyle::of_line(line))?;

        let mut attributes = vec![("t", start.to_string()), ("d", duration.to_string())];
        if let [section] = line.sections.as_slice() {
            attributes.push(("p", pen_id(tables, section)?.to_string()));
        }
        attributes.push(("wp", position.to_string()));
        attributes.push(("ws", window_style.to_string()));
        writer.write_event(Event::Start(element("p", &attributes)))?;

        if let [section] = line.sections.as_slice() {
            write_text(writer, line, section)?;
        } else {
            // Uploads drop the first section's pen unless text outside any
            // section follows it
            let workaround_index = if line.sections[0].ruby_part == RubyPart::None {
                0
            } else {
                3
            };
            for (index, section) in line.sections.iter().enumerate() {
                let mut attributes = vec![("p", pen_id(tables, section)?.to_string())];
                if section.start_offset > 0 {
                    attributes.push(("t", section.start_offset.to_string()));
                }
                writer.write_event(Event::Start(element("s", &attributes)))?;
                write_text(writer, line, section)?;
                writer.write_event(Event::End(BytesEnd::new("s")))?;

                if index == workaround_index {
                    writer.write_event(Event::Text(BytesText::new(ZERO_WIDTH_SPACE)))?;
                }
            }
        }

        writer.write_event(Event::End(BytesEnd::new("p")))?;
        newline(writer)
    }
}

fn write_head(writer: &mut Writer<Vec<u8>>, tables: &Tables) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("head")))?;
    newline(writer)?;

    // Index 0 of every table is an unused dummy; the iOS app ignores
    // parts of the first entry
    write_window_position(writer, 0, None)?;
    for (id, position) in tables.positions.iter() {
        write_window_position(writer, id, Some(position))?;
    }

    write_window_style(writer, 0, None)?;
    for (id, style) in tables.window_styles.iter() {
        write_window_style(writer, id, Some(style))?;
    }

    let dummy = Pen::of_section(&Section::default())?;
    write_pen(writer, 0, &dummy)?;
    for (id, pen) in tables.pens.iter() {
        write_pen(writer, id, pen)?;
    }

    writer.write_event(Event::End(BytesEnd::new("head")))?;
    newline(writer)
}

fn write_window_position(
    writer: &mut Writer<Vec<u8>>,
    id: usize,
    position: Option<&WindowPosition>,
) -> Result<()> {
    let attributes = match position {
        Some(position) => vec![
            ("id", id.to_string()),
            ("ap", anchor_point_id(position.anchor_point).to_string()),
            ("ah", position.horizontal.to_string()),
            ("av", position.vertical.to_string()),
        ],
        None => vec![
            ("id", id.to_string()),
            ("ap", anchor_point_id(AnchorPoint::BottomCenter).to_string()),
            ("ah", "0".to_string()),
            ("av", "0".to_string()),
        ],
    };
    write_empty(writer, "wp", &attributes)
}

fn write_window_style(writer: &mut Writer<Vec<u8>>, id: usize, style: Option<&WindowStyle>) -> Result<()> {
    let (justification, (print, scroll)) = style.map_or((2, (0, 0)), |style| {
        (
            style.justification,
            direction_ids(style.horizontal_text_direction, style.vertical_text_type),
        )
    });
    write_empty(
        writer,
        "ws",
        &[
            ("id", id.to_string()),
            ("ju", justification.to_string()),
            ("pd", print.to_string()),
            ("sd", scroll.to_string()),
        ],
    )
}

fn write_pen(writer: &mut Writer<Vec<u8>>, id: usize, pen: &Pen) -> Result<()> {
    let mut attributes = vec![("id", id.to_string())];
    if pen.font_style != 0 {
        attributes.push(("fs", pen.font_style.to_string()));
    }
    attributes.push(("sz", pen.size.to_string()));
    if pen.offset != OffsetType::Regular {
        attributes.push(("of", offset_id(pen.offset).to_string()));
    }
    for (flag, name) in [(pen.bold, "b"), (pen.italic, "i"), (pen.underline, "u")] {
        if flag {
            attributes.push((name, "1".to_string()));
        }
    }

    attributes.push(("fc", pen.fore_color.to_html()));
    attributes.push(("fo", pen.fore_color.a.to_string()));
    if pen.back_color.a > 0 {
        attributes.push(("bc", pen.back_color.to_html()));
    }
    attributes.push(("bo", pen.back_color.a.to_string()));

    if let Some((kind, color)) = pen.shadow {
        if color.a > 0 {
            attributes.push(("et", edge_type_id(kind).to_string()));
            // Without `ec` the player draws #222222 at the foreground
            // opacity; with it the edge is always opaque
            if !color.rgb_eq(DEFAULT_SHADOW_RGB) || color.a != pen.fore_color.a {
                attributes.push(("ec", color.to_html()));
            }
        }
    }

    if pen.ruby_part != RubyPart::None {
        attributes.push(("rb", ruby_part_id(pen.ruby_part).to_string()));
    }
    if pen.packed {
        attributes.push(("hg", "1".to_string()));
    }
    write_empty(writer, "pen", &attributes)
}

/// Section text with a zero-width space leading every row
///
/// Rows without one would render at a different height than rows of
/// multi-section lines.
fn write_text(writer: &mut Writer<Vec<u8>>, line: &Line, section: &Section) -> Result<()> {
    let mut text = section.text.clone();
    if line.vertical_text_type != VerticalTextType::Positioned {
        text = text_row_regex()
            .replace_all(&text, |caps: &regex::Captures<'_>| {
                if caps[0].contains(ZERO_WIDTH_SPACE) {
                    caps[0].to_string()
                } else {
                    format!("{ZERO_WIDTH_SPACE}{}", &caps[0])
                }
            })
            .into_owned();
    }
    // Carriage returns upset the iOS app
    let text = text.replace("\r\n", "\n");
    writer.write_event(Event::Text(BytesText::new(&text)))?;
    Ok(())
}

fn element<'a>(name: &'a str, attributes: &[(&str, String)]) -> BytesStart<'a> {
    let mut element = BytesStart::new(name);
    for (key, value) in attributes {
        element.push_attribute((*key, value.as_str()));
    }
    element
}

fn write_empty(writer: &mut Writer<Vec<u8>>, name: &str, attributes: &[(&str, String)]) -> Result<()> {
    writer.write_event(Event::Empty(element(name, attributes)))?;
    newline(writer)
}

fn newline(writer: &mut Writer<Vec<u8>>) -> Result<()> {
    writer.write_event(Event::Text(BytesText::new("\n")))?;
    Ok(())
}

fn table_id<K: Clone + Eq + std::hash::Hash>(table: &AttributeTable<K>, key: &K) -> Result<usize> {
    table
        .id(key)
        .ok_or_else(|| CoreError::internal("attribute missing from its table"))
}

fn pen_id(tables: &Tables, section: &Section) -> Result<usize> {
    table_id(&tables.pens, &Pen::of_section(section)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PointF, ShadowType, Size};
    use crate::utils::Color;
    use pretty_assertions::assert_eq;

    fn white(text: &str) -> Section {
        let mut section = Section::new(text);
        section.fore_color = Color::WHITE;
        section
    }

    fn write(lines: Vec<Line>) -> String {
        let mut document = Document::new(Size::new(1280, 720));
        document.lines = lines;
        YttWriter::default().write(&document).unwrap()
    }

    fn top_line(start: i64, end: i64, text: &str) -> Line {
        let mut line = Line::with_section(start, end, white(text));
        line.anchor_point = AnchorPoint::TopCenter;
        line
    }

    fn body_entries(xml: &str) -> Vec<&str> {
        xml.lines().filter(|line| line.starts_with("<p ")).collect()
    }

    #[test]
    fn start_is_shifted_and_clamped() {
        let xml = write(vec![
            Line::with_section(0, 1000, white("first")),
            Line::with_section(5000, 6000, white("second")),
            top_line(0, 50, "gone"),
        ]);
        let entries = body_entries(&xml);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].starts_with(r#"<p t="1" d="939""#), "{}", entries[0]);
        assert!(entries[1].starts_with(r#"<p t="4940" d="1000""#), "{}", entries[1]);
    }

    #[test]
    fn head_has_dummy_entries() {
        let xml = write(vec![Line::with_section(1000, 2000, white("x"))]);
        assert!(xml.contains(r#"<wp id="0""#));
        assert!(xml.contains(r#"<ws id="0""#));
        assert!(xml.contains(r##"<pen id="0" sz="100" fc="#000000" fo="0" bo="0"/>"##));
        assert!(xml.contains(r#"<wp id="1" ap="7" ah="50" av="100"/>"#));
        assert!(xml.contains(r#"<ws id="1" ju="2" pd="0" sd="0"/>"#));
        assert!(xml.contains(r##"<pen id="1" sz="100" fc="#FEFEFE" fo="254" bo="0"/>"##));
    }

    #[test]
    fn identical_formatting_shares_pen_across_positions() {
        let mut left = Line::with_section(1000, 2000, white("left"));
        left.position = Some(PointF::new(100.0, 100.0));
        left.anchor_point = AnchorPoint::TopLeft;
        let mut right = Line::with_section(1000, 2000, white("right"));
        right.position = Some(PointF::new(1000.0, 100.0));
        right.anchor_point = AnchorPoint::TopRight;

        let xml = write(vec![left, right]);
        assert_eq!(xml.matches("<pen ").count(), 2);
        assert_eq!(xml.matches("<wp ").count(), 3);
        let entries = body_entries(&xml);
        assert!(entries.iter().all(|entry| entry.contains(r#"p="1""#)));
    }

    #[test]
    fn multiple_sections_get_separator() {
        let mut red = white("red");
        red.fore_color = Color::from_rgb(255, 0, 0);
        let mut line = Line::with_section(1000, 2000, white("white "));
        line.sections.push(red);

        let xml = write(vec![line]);
        let entry = body_entries(&xml)[0];
        assert!(
            entry.contains("<s p=\"1\">\u{200B}white </s>\u{200B}<s p=\"2\">\u{200B}red</s>"),
            "{entry}"
        );
    }

    #[test]
    fn shadows_become_edges() {
        let mut glow = white("x");
        glow.shadow_colors.insert(ShadowType::Glow, Color::from_rgb(255, 0, 0));
        let mut soft = white("y");
        soft.shadow_colors.insert(ShadowType::SoftShadow, Color::from_rgb(0x22, 0x22, 0x22));

        let xml = write(vec![
            Line::with_section(1000, 2000, glow),
            Line::with_section(3000, 4000, soft),
        ]);
        assert!(xml.contains(r##"et="3" ec="#FF0000""##));
        assert!(xml.contains(r#"et="4"/>"#), "{xml}");
    }

    #[test]
    fn line_breaks_are_written_as_newlines() {
        let xml = write(vec![Line::with_section(1000, 2000, white("one\r\ntwo"))]);
        assert!(xml.contains("\u{200B}one\n\u{200B}two</p>"));
        assert!(!xml.contains('\r'));
    }

    #[test]
    fn input_document_is_not_modified() {
        let mut document = Document::new(Size::new(1280, 720));
        document.lines.push(Line::with_section(1000, 2000, white("x")));
        let before = document.clone();
        YttWriter::default().write(&document).unwrap();
        assert_eq!(document, before);
    }
}
