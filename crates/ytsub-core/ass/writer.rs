//! Reverse conversion of a document into an `.ass` script
//!
//! Documents from any reader are written against the embedded set of
//! built-in styles, scaled to the document's canvas. Each line picks the
//! style whose background and shadow structure matches its first section;
//! every later difference is expressed as override tags relative to the
//! previous section.

use super::interpreter::{Stylesheet, NO_ANDROID_DARK_TEXT_HACK};
use super::reader::AssScript;
use super::tags::text::vertical_text_type_id;
use crate::document::Document;
use crate::karaoke::syllable_durations;
use crate::model::{
    HorizontalTextDirection, Line, OffsetType, RubyPart, Section, ShadowType, Size,
    VerticalTextType,
};
use crate::style::{AssStyle, ShadowTypes, StyleOptionsList};
use crate::utils::time::format_ass_time;
use crate::utils::{Color, CoreError, Result};
use core::fmt::{self, Write};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use tracing::debug;

/// Built-in styles used for reverse conversion, authored for a 720p canvas
const DEFAULT_STYLES: &str = include_str!("resources/default_styles.ass");

/// Canvas height the built-in styles are authored for
const DEFAULT_STYLES_HEIGHT: f32 = 720.0;

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";

const EVENT_FORMAT: &str = "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

fn escaped_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\([nNh])").expect("escape regex should compile"))
}

/// Argument of an override tag
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TagArg<'a> {
    Bool(bool),
    Int(i64),
    /// Written as `&HXX&`
    Hex(i64),
    Float(f32),
    Text(&'a str),
    Color(Color),
}

impl fmt::Display for TagArg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => f.write_str(if *value { "1" } else { "0" }),
            Self::Int(value) => write!(f, "{value}"),
            Self::Hex(value) => write!(f, "&H{value:X}&"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
            Self::Color(color) => f.write_str(&color.to_ass_tag_hex()),
        }
    }
}

/// Accumulates the text field of one dialogue row
///
/// Tags are collected until the next text run and then flushed as one
/// `{...}` group.
#[derive(Debug, Default)]
pub struct LineContentBuilder {
    pending_tags: String,
    content: String,
}

impl LineContentBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `\name`, parenthesizing multiple arguments
    pub fn tag(&mut self, name: &str, args: &[TagArg<'_>]) {
        self.pending_tags.push('\\');
        self.pending_tags.push_str(name);
        if args.len() > 1 {
            self.pending_tags.push('(');
        }
        for (idx, arg) in args.iter().enumerate() {
            if idx > 0 {
                self.pending_tags.push(',');
            }
            let _ = write!(self.pending_tags, "{arg}");
        }
        if args.len() > 1 {
            self.pending_tags.push(')');
        }
    }

    /// Append literal text, escaping sequences the reader would interpret
    pub fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.flush_tags();

        let escaped = escaped_tag_regex().replace_all(text, "\\{}$1");
        let escaped = escaped.replace("\r\n", "\\N").replace('\u{A0}', "\\h");
        self.content.push_str(&escaped);
    }

    fn flush_tags(&mut self) {
        if self.pending_tags.is_empty() {
            return;
        }
        self.content.push('{');
        self.content.push_str(&self.pending_tags);
        self.content.push('}');
        self.pending_tags.clear();
    }

    /// Finished text field, including trailing tags
    #[must_use]
    pub fn finish(mut self) -> String {
        self.flush_tags();
        self.content
    }
}

/// Writes documents as `.ass` scripts
#[derive(Debug, Clone)]
pub struct AssWriter {
    stylesheet: Stylesheet,
}

impl AssWriter {
    /// Writer using the built-in styles scaled to `video_dimensions`
    ///
    /// # Errors
    ///
    /// Fails only if the embedded styles or style options are malformed.
    pub fn new(video_dimensions: Size) -> Result<Self> {
        let script = AssScript::parse(DEFAULT_STYLES)?;
        let factor = video_dimensions.height as f32 / DEFAULT_STYLES_HEIGHT;
        let styles = script
            .styles
            .into_iter()
            .map(|mut style| {
                style.line_height *= factor;
                style
            })
            .collect();

        Ok(Self {
            stylesheet: Stylesheet::new(video_dimensions, styles, StyleOptionsList::builtin()?),
        })
    }

    #[must_use]
    pub const fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    /// Serialize `document`
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] if a line holds an incomplete ruby
    /// group.
    pub fn write(&self, document: &Document) -> Result<String> {
        let mut out = String::new();
        self.write_preamble(&mut out);
        for line in &document.lines {
            self.write_line(&mut out, line, 0)?;
        }
        debug!(lines = document.lines.len(), "wrote ass script");
        Ok(out)
    }

    /// Script info, styles and the events header
    pub fn write_preamble(&self, out: &mut String) {
        let video = self.stylesheet.video_dimensions;
        out.push_str("[Script Info]\n");
        let _ = writeln!(out, "; Script generated by ytsub {}", crate::VERSION);
        out.push_str("ScriptType: v4.00+\n");
        out.push_str("WrapStyle: 0\n");
        out.push_str("ScaledBorderAndShadow: yes\n");
        let _ = writeln!(out, "PlayResX: {}", video.width);
        let _ = writeln!(out, "PlayResY: {}", video.height);
        out.push('\n');

        out.push_str("[V4+ Styles]\n");
        out.push_str(STYLE_FORMAT);
        out.push('\n');
        for style in self.stylesheet.styles() {
            write_style(out, style);
        }
        out.push('\n');

        out.push_str("[Events]\n");
        out.push_str(EVENT_FORMAT);
        out.push('\n');
    }

    /// Append one dialogue row for `line`; lines without sections are skipped
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] for a ruby base that is not followed
    /// by a parenthesis, ruby text and closing parenthesis.
    pub fn write_line(&self, out: &mut String, line: &Line, layer: i32) -> Result<()> {
        let Some(first) = line.sections.first() else {
            return Ok(());
        };

        let line_style = self.style_matching_structure(first);
        let effect = if line.android_dark_text_hack_allowed {
            ""
        } else {
            NO_ANDROID_DARK_TEXT_HACK
        };

        let mut previous = Section::default();
        self.apply_style(&mut previous, line_style);
        let mut previous_style = line_style;

        let mut content = LineContentBuilder::new();
        append_line_tags(line, line_style, &mut content);

        let durations = syllable_durations(line);
        let mut ruby = RubyPart::None;
        let mut index = 0;
        while index < line.sections.len() {
            let section = &line.sections[index];
            let style = self.style_matching_structure(section);
            if style.name != previous_style.name
                || (ruby != RubyPart::None && section.ruby_part == RubyPart::None)
            {
                content.tag("r", &[TagArg::Text(&style.name)]);
                ruby = RubyPart::None;
                self.apply_style(&mut previous, style);
            }

            self.append_section_tags(section, &previous, durations[index], &mut content);

            if section.ruby_part == RubyPart::Base {
                let ruby_part = line
                    .sections
                    .get(index + 2)
                    .filter(|_| index + 4 <= line.sections.len())
                    .map(|annotation| annotation.ruby_part)
                    .filter(|part| part.is_ruby_text())
                    .ok_or_else(|| CoreError::internal("Invalid ruby sequence"))?;

                if ruby_part != ruby {
                    let position = if ruby_part == RubyPart::RubyAbove { 8 } else { 2 };
                    content.tag("ytruby", &[TagArg::Int(position)]);
                    ruby = ruby_part;
                }
                content.text(&format!(
                    "[{}/{}]",
                    section.text,
                    line.sections[index + 2].text
                ));
                index += 3;
            } else {
                content.text(&section.text);
            }

            previous = section.clone();
            previous_style = style;
            index += 1;
        }

        let _ = writeln!(
            out,
            "Dialogue: {layer},{},{},{},,0,0,0,{effect},{}",
            format_ass_time(line.start),
            format_ass_time(line.end),
            line_style.name,
            content.finish()
        );
        Ok(())
    }

    fn apply_style(&self, section: &mut Section, style: &AssStyle) {
        let options = self.stylesheet.options_for(style);
        self.stylesheet.apply_style(section, style, &options);
    }

    /// First style whose box and shadow kinds equal those of `section`
    ///
    /// Falls back to the default style when none matches.
    fn style_matching_structure(&self, section: &Section) -> &AssStyle {
        let section_shadows: BTreeSet<ShadowType> = section.shadow_colors.keys().copied().collect();
        self.stylesheet
            .styles()
            .iter()
            .find(|style| {
                if style.has_outline_box() != (section.back_color.a > 0) {
                    return false;
                }
                let mut shadow_types = ShadowTypes::empty();
                if style.has_outline() && !style.outline_is_box {
                    shadow_types |= ShadowTypes::GLOW;
                }
                if let Some(options) = self.stylesheet.options().get(&style.name) {
                    shadow_types |= options.shadow_types;
                }
                shadow_types.shadow_types().collect::<BTreeSet<_>>() == section_shadows
            })
            .unwrap_or_else(|| self.stylesheet.default_style())
    }

    fn append_section_tags(
        &self,
        section: &Section,
        previous: &Section,
        duration: i64,
        content: &mut LineContentBuilder,
    ) {
        if section.font != previous.font {
            content.tag("fn", &[TagArg::Text(section.font.as_deref().unwrap_or_default())]);
        }

        let line_height = self.scale_to_line_height(section.scale);
        if line_height != self.scale_to_line_height(previous.scale) {
            content.tag("fs", &[TagArg::Float(line_height)]);
        }

        if section.bold != previous.bold {
            content.tag("b", &[TagArg::Bool(section.bold)]);
        }
        if section.italic != previous.italic {
            content.tag("i", &[TagArg::Bool(section.italic)]);
        }
        if section.underline != previous.underline {
            content.tag("u", &[TagArg::Bool(section.underline)]);
        }

        append_color_tags("c", "1a", previous.fore_color, section.fore_color, content);
        append_color_tags("2c", "2a", previous.secondary_color, section.secondary_color, content);

        let single_shadows = single_shadow(previous).zip(single_shadow(section));
        if section.back_color.a > 0 {
            append_color_tags("3c", "3a", previous.back_color, section.back_color, content);
            if let Some(((_, from), (_, to))) = single_shadows {
                append_color_tags("4c", "4a", from, to, content);
            }
        } else if let Some(((_, from), (shadow_type, to))) = single_shadows {
            if shadow_type == ShadowType::Glow {
                append_color_tags("3c", "3a", from, to, content);
            } else {
                append_color_tags("4c", "4a", from, to, content);
            }
        }

        if section.offset != previous.offset {
            let tag = match section.offset {
                OffsetType::Subscript => "ytsub",
                OffsetType::Superscript => "ytsup",
                OffsetType::Regular => "ytsur",
            };
            content.tag(tag, &[]);
        }

        if section.packed != previous.packed {
            content.tag("ytpack", &[TagArg::Bool(section.packed)]);
        }

        if duration > 0 {
            content.tag("k", &[TagArg::Int(duration / 10)]);
        }

        if section.blur != previous.blur {
            content.tag("blur", &[TagArg::Float(section.blur)]);
        }
    }

    fn scale_to_line_height(&self, scale: f32) -> f32 {
        self.stylesheet.default_style().line_height * scale
    }
}

fn write_style(out: &mut String, style: &AssStyle) {
    let flag = |value: bool| i32::from(value);
    let _ = writeln!(
        out,
        "Style: {},{},{},{},{},{},{},{},{},{},0,100,100,0,0,{},{},{},{},10,10,10,1",
        style.name,
        style.font,
        style.line_height,
        style.primary_color.to_ass_style_hex(),
        style.secondary_color.to_ass_style_hex(),
        style.outline_color.to_ass_style_hex(),
        style.shadow_color.to_ass_style_hex(),
        flag(style.bold),
        flag(style.italic),
        flag(style.underline),
        if style.outline_is_box { 3 } else { 1 },
        style.outline_thickness,
        style.shadow_distance,
        style.anchor_point.to_numpad(),
    );
}

fn append_line_tags(line: &Line, style: &AssStyle, content: &mut LineContentBuilder) {
    if line.anchor_point != style.anchor_point {
        content.tag("an", &[TagArg::Int(i64::from(line.anchor_point.to_numpad()))]);
    }

    if let Some(position) = line.position {
        content.tag("pos", &[TagArg::Float(position.x), TagArg::Float(position.y)]);
    }

    if line.vertical_text_type != VerticalTextType::None {
        let id = vertical_text_type_id(line.horizontal_text_direction, line.vertical_text_type);
        content.tag("ytvert", &[TagArg::Int(i64::from(id))]);
    } else if line.horizontal_text_direction == HorizontalTextDirection::RightToLeft {
        content.tag("ytdir", &[TagArg::Int(4)]);
    }
}

fn append_color_tags(
    color_tag: &str,
    alpha_tag: &str,
    previous: Color,
    color: Color,
    content: &mut LineContentBuilder,
) {
    if !previous.rgb_eq(color) {
        content.tag(color_tag, &[TagArg::Color(color)]);
    }
    if previous.a != color.a {
        content.tag(alpha_tag, &[TagArg::Hex(255 - i64::from(color.a))]);
    }
}

fn single_shadow(section: &Section) -> Option<(ShadowType, Color)> {
    if section.shadow_colors.len() != 1 {
        return None;
    }
    section
        .shadow_colors
        .iter()
        .next()
        .map(|(shadow_type, color)| (*shadow_type, *color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ass::parse;
    use crate::model::{AnchorPoint, PointF};
    use pretty_assertions::assert_eq;

    fn writer() -> AssWriter {
        AssWriter::new(Size::new(1280, 720)).unwrap()
    }

    fn dialogue_of(writer: &AssWriter, line: &Line) -> String {
        let mut out = String::new();
        writer.write_line(&mut out, line, 0).unwrap();
        out.trim_end().to_string()
    }

    /// Section formatted exactly like `style`
    fn styled(writer: &AssWriter, style: &str, text: &str) -> Section {
        let mut section = Section::new(text);
        let style = writer.stylesheet().get(style).unwrap();
        writer.apply_style(&mut section, style);
        section
    }

    #[test]
    fn content_builder_groups_and_escapes() {
        let mut content = LineContentBuilder::new();
        content.tag("b", &[TagArg::Bool(true)]);
        content.tag("pos", &[TagArg::Float(10.5), TagArg::Float(20.0)]);
        content.text("a\\Nb\r\nc\u{A0}d");
        content.tag("1a", &[TagArg::Hex(0x80)]);
        content.text("");
        assert_eq!(content.finish(), "{\\b1\\pos(10.5,20)}a\\{}Nb\\Nc\\hd{\\1a&H80&}");
    }

    #[test]
    fn styles_are_scaled_to_the_canvas() {
        let writer = AssWriter::new(Size::new(1920, 1080)).unwrap();
        assert_eq!(writer.stylesheet().default_style().line_height, 57.0);

        let mut out = String::new();
        writer.write_preamble(&mut out);
        assert!(out.contains("PlayResY: 1080"));
        assert!(out.contains(
            "Style: Default,Roboto,57,&H00FFFFFF,&H000000FF,&H3F080808,&H00000000,0,0,0,0,100,100,0,0,3,0.01,0,2,10,10,10,1"
        ));
    }

    #[test]
    fn plain_line_uses_matching_style() {
        let writer = writer();
        let line = Line::with_section(1000, 2500, styled(&writer, "Default", "Hello"));
        assert_eq!(
            dialogue_of(&writer, &line),
            "Dialogue: 0,0:00:01.00,0:00:02.50,Default,,0,0,0,,Hello"
        );

        let line = Line::with_section(0, 1000, styled(&writer, "GlowSoftShadow", "Hi"));
        assert!(dialogue_of(&writer, &line).contains(",GlowSoftShadow,"));
    }

    #[test]
    fn differences_become_tags() {
        let writer = writer();
        let mut red = styled(&writer, "NoBackground", "red");
        red.fore_color = Color::from_argb(0x7F, 255, 0, 0);
        red.bold = true;
        let mut line = Line::with_section(0, 1000, styled(&writer, "NoBackground", "plain "));
        line.sections.push(red);
        line.anchor_point = AnchorPoint::TopLeft;
        line.position = Some(PointF::new(100.0, 50.5));
        line.android_dark_text_hack_allowed = false;

        assert_eq!(
            dialogue_of(&writer, &line),
            "Dialogue: 0,0:00:00.00,0:00:01.00,NoBackground,,0,0,0,no_android_dark_text_hack,\
             {\\an7\\pos(100,50.5)}plain {\\b1\\c&H0000FF&\\1a&H80&}red"
        );
    }

    #[test]
    fn style_changes_reset() {
        let writer = writer();
        let mut line = Line::with_section(0, 1000, styled(&writer, "NoBackground", "a"));
        line.sections.push(styled(&writer, "Glow", "b"));
        assert!(dialogue_of(&writer, &line).ends_with("a{\\rGlow}b"));
    }

    #[test]
    fn ruby_groups_are_written_as_markup() {
        let writer = writer();
        let base = styled(&writer, "NoBackground", "");
        let part = |text: &str, ruby_part: RubyPart| {
            let mut section = base.clone();
            section.text = text.to_string();
            section.ruby_part = ruby_part;
            section
        };
        let mut line = Line::new(0, 1000);
        line.sections = vec![
            part("漢字", RubyPart::Base),
            part("(", RubyPart::Parenthesis),
            part("かんじ", RubyPart::RubyAbove),
            part(")", RubyPart::Parenthesis),
            part("です", RubyPart::None),
        ];
        assert!(dialogue_of(&writer, &line)
            .ends_with("{\\ytruby8}[漢字/かんじ]{\\rNoBackground}です"));

        line.sections.truncate(3);
        let mut out = String::new();
        let err = writer.write_line(&mut out, &line, 0).unwrap_err();
        assert!(matches!(err, CoreError::Internal(_)));
    }

    #[test]
    fn offsets_become_karaoke_durations() {
        let writer = writer();
        let mut line = Line::new(0, 1000);
        for (text, offset) in [("ka", 0), ("ra", 300)] {
            let mut section = styled(&writer, "NoBackground", text);
            section.start_offset = offset;
            line.sections.push(section);
        }
        assert!(dialogue_of(&writer, &line).ends_with("{\\k30}ka{\\k70}ra"));
    }

    #[test]
    fn written_script_reads_back() {
        let writer = writer();
        let mut document = Document::new(Size::new(1280, 720));
        let mut section = styled(&writer, "NoBackground", "Hello");
        section.fore_color = Color::from_rgb(255, 255, 0);
        section.italic = true;
        document.lines.push(Line::with_section(1000, 2000, section));

        let text = writer.write(&document).unwrap();
        let parsed = parse(&text, &StyleOptionsList::builtin().unwrap()).unwrap();
        assert_eq!(parsed.lines.len(), 1);
        let section = &parsed.lines[0].sections[0];
        assert_eq!(section.text, "Hello");
        assert!(section.italic);
        assert_eq!(section.fore_color, Color::from_rgb(255, 255, 0));
    }
}
