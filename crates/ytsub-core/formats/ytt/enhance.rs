//! Player compatibility rewrites applied before the tables are built
//!
//! Each pass works around one rendering difference between the desktop
//! player and the mobile apps. The passes run on the writer's own copy of
//! the document.

use super::tables::{WindowPosition, DEFAULT_SHADOW_RGB};
use super::{PADDING_SPACE, ZERO_WIDTH_SPACE};
use crate::document::{move_line_breaks_to_separate_sections, Document};
use crate::model::{AnchorPoint, Line, PointF, RubyPart, Section, ShadowType, Size, VerticalTextType};
use crate::utils::time::round_time_to_frame_center;
use crate::utils::{is_right_to_left, Color};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use tracing::debug;

/// Opacity written instead of 255, which uploads strip from the file
const MAX_OPACITY: u8 = 254;

fn space_run_regex() -> &'static Regex {
    static SPACE_RUN: OnceLock<Regex> = OnceLock::new();
    SPACE_RUN.get_or_init(|| Regex::new("  +").expect("space run regex should compile"))
}

/// Run every compatibility pass over `document`
pub fn enhance(document: &mut Document) {
    document
        .lines
        .retain(|line| line.sections.iter().any(|section| !section.text.is_empty()));
    document.close_gaps();
    document.merge_simultaneous_lines();
    document.merge_identically_formatted_sections();

    add_italic_prefetch(&mut document.lines);

    let mut index = 0;
    while index < document.lines.len() {
        let line = &mut document.lines[index];
        make_invisible_text_black(line);
        prevent_shadow_clipping(line);
        harden_spaces(line);
        limit_colors(line);

        let line = document.lines.remove(index);
        let mut expanded = Vec::new();
        for layer in expand_multi_shadows(line) {
            expanded.extend(expand_dark_text(layer));
        }
        let count = expanded.len();
        document.lines.splice(index..index, expanded);
        index += count;
    }

    apply_manual_line_padding(&mut document.lines, document.video_dimensions);
    document.merge_identically_formatted_sections();
    debug!(lines = document.lines.len(), "applied timed-text enhancements");
}

/// Invisible italic line that makes the desktop player load italics early
fn add_italic_prefetch(lines: &mut Vec<Line>) {
    let has_italic = lines
        .iter()
        .flat_map(|line| &line.sections)
        .any(|section| section.italic);
    if !has_italic {
        return;
    }

    let mut section = Section::new(ZERO_WIDTH_SPACE);
    section.fore_color = Color::from_argb(1, 255, 255, 255);
    section.back_color = Color::EMPTY;
    section.italic = true;

    let mut line = Line::with_section(
        round_time_to_frame_center(5000),
        round_time_to_frame_center(5100),
        section,
    );
    line.position = Some(PointF::new(0.0, 0.0));
    line.anchor_point = AnchorPoint::BottomRight;
    lines.push(line);
}

/// Transparent text turns black, as the mobile apps ignore transparency
fn make_invisible_text_black(line: &mut Line) {
    for section in &mut line.sections {
        if section.fore_color.a == 0 {
            section.fore_color = Color::EMPTY;
        }
    }
}

/// Give soft shadows room by moving a neighbor's space into the section
///
/// The space is taken from the start of the next section, or for
/// right-to-left text from the end of the previous one.
fn prevent_shadow_clipping(line: &mut Line) {
    let count = line.sections.len();
    let mut i = 0;
    while i < count {
        if line.sections[i].ruby_part == RubyPart::Base {
            i += 4;
            continue;
        }
        if !line.sections[i].shadow_colors.contains_key(&ShadowType::SoftShadow) {
            i += 1;
            continue;
        }

        let text = &line.sections[i].text;
        if text.chars().any(is_right_to_left) {
            let steal = i > 0
                && !text.starts_with(' ')
                && line.sections[i - 1].ruby_part != RubyPart::Parenthesis
                && line.sections[i - 1].text.ends_with(' ');
            if steal {
                line.sections[i - 1].text.pop();
                line.sections[i].text.insert(0, ' ');
            }
        } else {
            let steal = i + 1 < count
                && !text.ends_with(' ')
                && line.sections[i + 1].ruby_part != RubyPart::Base
                && line.sections[i + 1].text.starts_with(' ');
            if steal {
                line.sections[i + 1].text.remove(0);
                line.sections[i].text.push(' ');
            }
        }
        i += 1;
    }
}

/// Replace runs of spaces with hard spaces so browsers keep them
fn harden_spaces(line: &mut Line) {
    for section in &mut line.sections {
        if section.text.contains("  ") {
            section.text = space_run_regex()
                .replace_all(&section.text, |caps: &regex::Captures<'_>| {
                    "\u{A0}".repeat(caps[0].len())
                })
                .into_owned();
        }
    }
}

/// Keep colors inside what survives upload on every player
fn limit_colors(line: &mut Line) {
    let white = Color::from_rgb(255, 255, 255);
    for section in &mut line.sections {
        if section.fore_color.rgb_eq(white) {
            section.fore_color = Color::from_argb(section.fore_color.a, 0xFE, 0xFE, 0xFE);
        }
        if section.fore_color.a == 255 {
            section.fore_color = section.fore_color.with_alpha(MAX_OPACITY);
        }
        if section.back_color.a == 255 {
            section.back_color = section.back_color.with_alpha(MAX_OPACITY);
        }

        section.shadow_colors.retain(|_, color| color.a > 0);

        let fore_alpha = section.fore_color.a;
        for color in section.shadow_colors.values_mut() {
            let follows_foreground = color.rgb_eq(DEFAULT_SHADOW_RGB) && color.a == fore_alpha;
            if color.a != MAX_OPACITY && !follows_foreground {
                *color = color.with_alpha(MAX_OPACITY);
            }
        }
    }
}

/// One copy of the line per shadow layer, as a pen holds a single shadow
///
/// Layers are ordered soft, hard, bevel, glow per section; the background
/// stays on the first layer only.
fn expand_multi_shadows(line: Line) -> Vec<Line> {
    let layer_count = line
        .sections
        .iter()
        .map(|section| section.shadow_colors.len())
        .max()
        .unwrap_or(0);
    if layer_count <= 1 {
        return vec![line];
    }

    let section_layers: Vec<Vec<ShadowType>> = line
        .sections
        .iter()
        .map(|section| {
            ShadowType::LAYER_ORDER
                .into_iter()
                .filter(|kind| section.shadow_colors.contains_key(kind))
                .collect()
        })
        .collect();

    (0..layer_count)
        .map(|layer| {
            let mut shadow_line = line.clone();
            for (section, kinds) in shadow_line.sections.iter_mut().zip(&section_layers) {
                if layer > 0 {
                    section.back_color = Color::EMPTY;
                }
                match kinds.get(layer) {
                    Some(kind) => section.shadow_colors.retain(|shadow, _| shadow == kind),
                    None => section.shadow_colors.clear(),
                }
            }
            shadow_line
        })
        .collect()
}

/// Follow dark text with an invisible bright copy
///
/// The mobile apps draw an opaque black box and no transparency, so there
/// the copy is what gets read.
fn expand_dark_text(line: Line) -> Vec<Line> {
    let has_dark_text = line
        .sections
        .iter()
        .any(|section| section.fore_color.a > 0 && section.fore_color.is_dark());
    if !line.android_dark_text_hack_allowed || !has_dark_text {
        return vec![line];
    }

    let mut bright = line.clone();
    for section in &mut bright.sections {
        if section.fore_color.a > 0 && section.fore_color.is_dark() {
            section.fore_color = section.fore_color.brighten();
        }
        section.fore_color = section.fore_color.with_alpha(0);
        section.back_color = section.back_color.with_alpha(0);
        section.shadow_colors.clear();
    }
    vec![line, bright]
}

/// Pad lines with a background or sharing a position with an overlapping line
fn apply_manual_line_padding(lines: &mut [Line], video: Size) {
    let mut order: Vec<usize> = (0..lines.len()).collect();
    order.sort_by_key(|&index| lines[index].start);

    let mut to_pad = BTreeSet::new();
    for (rank, &first) in order.iter().enumerate() {
        let position = WindowPosition::of_line(&lines[first], video);
        for &second in &order[rank + 1..] {
            if lines[second].start >= lines[first].end {
                break;
            }
            if WindowPosition::of_line(&lines[second], video) == position {
                to_pad.insert(first);
                to_pad.insert(second);
            }
        }
        if lines[first].has_background() {
            to_pad.insert(first);
        }
    }

    for index in to_pad {
        pad_line(&mut lines[index]);
        avoid_zero_duration_karaoke(&mut lines[index]);
    }
}

/// Replace the player's padding with spaces at both ends of every row
///
/// The player's own padding breaks around line breaks and in right-to-left
/// text. The added sections are hidden through a color pair nothing else
/// uses, so uploads do not merge them into their neighbors.
fn pad_line(line: &mut Line) {
    if line.vertical_text_type == VerticalTextType::Positioned {
        return;
    }
    move_line_breaks_to_separate_sections(line);

    let hidden = Section {
        back_color: Color::from_argb(0, 130, 140, 150),
        fore_color: Color::from_argb(0, 160, 170, 180),
        scale: 0.1,
        ..Section::default()
    };

    let mut i = 0;
    while i < line.sections.len() {
        let section = line.sections[i].clone();
        let mut next = i + if section.ruby_part == RubyPart::Base { 4 } else { 1 };

        if section.text.contains("\r\n") {
            line.sections[i] = padding_section(&hidden, &section.text, section.start_offset);
            i = next;
            continue;
        }

        if i == 0 || line.sections[i - 1].text.ends_with("\r\n") {
            line.sections
                .insert(i, padding_section(&hidden, ZERO_WIDTH_SPACE, section.start_offset));
            line.sections
                .insert(i + 1, padding_section(&section, PADDING_SPACE, section.start_offset));
            next += 2;
        }

        let row_ends = next >= line.sections.len() || line.sections[next].text.starts_with("\r\n");
        if row_ends {
            let at = next.min(line.sections.len());
            line.sections
                .insert(at, padding_section(&section, PADDING_SPACE, section.start_offset));
            line.sections
                .insert(at + 1, padding_section(&hidden, ZERO_WIDTH_SPACE, section.start_offset));
            next = at + 2;
        }

        i = next;
    }
}

fn padding_section(template: &Section, text: &str, start_offset: i64) -> Section {
    let mut section = template.clone();
    section.text = text.to_string();
    section.ruby_part = RubyPart::None;
    section.underline = false;
    section.start_offset = start_offset;
    section
}

/// Give karaoke syllables sharing a start a 1 ms head start each
///
/// Uploads break zero-length syllables.
fn avoid_zero_duration_karaoke(line: &mut Line) {
    for i in 1..line.sections.len() {
        let previous = line.sections[i - 1].start_offset;
        let section = &mut line.sections[i];
        if section.start_offset > 0 && previous >= section.start_offset {
            section.start_offset = previous + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn section(text: &str) -> Section {
        let mut section = Section::new(text);
        section.fore_color = Color::WHITE;
        section
    }

    fn texts(line: &Line) -> Vec<&str> {
        line.sections.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn italic_text_adds_prefetch_line() {
        let mut italic = section("slanted");
        italic.italic = true;
        let mut lines = vec![Line::with_section(10_000, 11_000, italic)];
        add_italic_prefetch(&mut lines);

        assert_eq!(lines.len(), 2);
        let prefetch = &lines[1];
        assert_eq!(prefetch.start, round_time_to_frame_center(5000));
        assert_eq!(prefetch.anchor_point, AnchorPoint::BottomRight);
        assert_eq!(prefetch.sections[0].fore_color.a, 1);

        let mut plain = vec![Line::with_section(0, 100, section("x"))];
        add_italic_prefetch(&mut plain);
        assert_eq!(plain.len(), 1);
    }

    #[test]
    fn soft_shadow_takes_following_space() {
        let mut line = Line::new(0, 100);
        let mut shadowed = section("word");
        shadowed.shadow_colors.insert(ShadowType::SoftShadow, Color::BLACK);
        line.sections = vec![section("This "), shadowed, section(" is")];
        prevent_shadow_clipping(&mut line);
        assert_eq!(texts(&line), vec!["This ", "word ", "is"]);
    }

    #[test]
    fn right_to_left_shadow_takes_preceding_space() {
        let mut line = Line::new(0, 100);
        let mut shadowed = section("שלום");
        shadowed.shadow_colors.insert(ShadowType::SoftShadow, Color::BLACK);
        line.sections = vec![section("a "), shadowed];
        prevent_shadow_clipping(&mut line);
        assert_eq!(texts(&line), vec!["a", " שלום"]);
    }

    #[test]
    fn space_runs_become_hard_spaces() {
        let mut line = Line::with_section(0, 100, section("a   b c"));
        harden_spaces(&mut line);
        assert_eq!(line.sections[0].text, "a\u{A0}\u{A0}\u{A0}b c");
    }

    #[test]
    fn colors_are_limited() {
        let mut styled = section("x");
        styled.back_color = Color::from_argb(255, 8, 8, 8);
        styled.shadow_colors.insert(ShadowType::Glow, Color::from_argb(100, 255, 0, 0));
        styled.shadow_colors.insert(ShadowType::Bevel, Color::from_argb(0, 0, 0, 0));
        styled
            .shadow_colors
            .insert(ShadowType::HardShadow, DEFAULT_SHADOW_RGB.with_alpha(MAX_OPACITY));
        let mut line = Line::with_section(0, 100, styled);
        limit_colors(&mut line);

        let section = &line.sections[0];
        assert_eq!(section.fore_color, Color::from_argb(254, 0xFE, 0xFE, 0xFE));
        assert_eq!(section.back_color.a, 254);
        assert_eq!(section.shadow_colors.len(), 2);
        assert_eq!(section.shadow_colors[&ShadowType::Glow].a, 254);
    }

    #[test]
    fn default_shadow_keeps_foreground_opacity() {
        let mut faded = section("x");
        faded.fore_color = Color::from_argb(100, 10, 20, 30);
        faded
            .shadow_colors
            .insert(ShadowType::Glow, DEFAULT_SHADOW_RGB.with_alpha(100));
        let mut line = Line::with_section(0, 100, faded);
        limit_colors(&mut line);
        assert_eq!(line.sections[0].shadow_colors[&ShadowType::Glow].a, 100);
    }

    #[test]
    fn multi_shadow_lines_are_split_into_layers() {
        let mut styled = section("x");
        styled.back_color = Color::from_argb(192, 8, 8, 8);
        styled.shadow_colors.insert(ShadowType::Glow, Color::BLACK);
        styled.shadow_colors.insert(ShadowType::SoftShadow, Color::BLACK);
        let mut plain = section("y");
        plain.shadow_colors.insert(ShadowType::Bevel, Color::BLACK);
        let mut line = Line::with_section(0, 100, styled);
        line.sections.push(plain);

        let layers = expand_multi_shadows(line);
        assert_eq!(layers.len(), 2);

        let first = &layers[0].sections;
        assert_eq!(first[0].shadow_colors.keys().collect::<Vec<_>>(), vec![&ShadowType::SoftShadow]);
        assert_eq!(first[1].shadow_colors.keys().collect::<Vec<_>>(), vec![&ShadowType::Bevel]);
        assert_eq!(first[0].back_color.a, 192);

        let second = &layers[1].sections;
        assert_eq!(second[0].shadow_colors.keys().collect::<Vec<_>>(), vec![&ShadowType::Glow]);
        assert!(second[1].shadow_colors.is_empty());
        assert_eq!(second[0].back_color, Color::EMPTY);
    }

    #[test]
    fn dark_text_gets_bright_copy() {
        let mut dark = section("x");
        dark.fore_color = Color::from_rgb(0, 0, 100);
        dark.shadow_colors.insert(ShadowType::Glow, Color::WHITE);
        let line = Line::with_section(0, 100, dark);

        let lines = expand_dark_text(line.clone());
        assert_eq!(lines.len(), 2);
        let copy = &lines[1].sections[0];
        assert_eq!(copy.fore_color, Color::from_argb(0, 2, 2, 255));
        assert!(copy.shadow_colors.is_empty());

        let mut opted_out = line;
        opted_out.android_dark_text_hack_allowed = false;
        assert_eq!(expand_dark_text(opted_out).len(), 1);
    }

    #[test]
    fn background_lines_are_padded() {
        let mut boxed = section("one\r\ntwo");
        boxed.back_color = Color::from_argb(192, 8, 8, 8);
        let mut lines = vec![Line::with_section(0, 100, boxed)];
        apply_manual_line_padding(&mut lines, Size::default());

        assert_eq!(
            texts(&lines[0]),
            vec![
                ZERO_WIDTH_SPACE,
                PADDING_SPACE,
                "one",
                PADDING_SPACE,
                ZERO_WIDTH_SPACE,
                "\r\n",
                ZERO_WIDTH_SPACE,
                PADDING_SPACE,
                "two",
                PADDING_SPACE,
                ZERO_WIDTH_SPACE,
            ]
        );
        assert_eq!(lines[0].sections[5].fore_color.a, 0);
    }

    #[test]
    fn overlapping_lines_at_one_position_are_padded() {
        let mut lines = vec![
            Line::with_section(0, 1000, section("a")),
            Line::with_section(500, 1500, section("b")),
            Line::with_section(2000, 2500, section("c")),
        ];
        apply_manual_line_padding(&mut lines, Size::default());
        assert_eq!(lines[0].sections.len(), 5);
        assert_eq!(lines[1].sections.len(), 5);
        assert_eq!(lines[2].sections.len(), 1);
    }

    #[test]
    fn zero_length_syllables_get_a_millisecond() {
        let mut line = Line::new(0, 1000);
        for offset in [0, 300, 300, 300] {
            let mut syllable = section("x");
            syllable.start_offset = offset;
            line.sections.push(syllable);
        }
        avoid_zero_duration_karaoke(&mut line);
        let offsets: Vec<i64> = line.sections.iter().map(|s| s.start_offset).collect();
        assert_eq!(offsets, vec![0, 300, 301, 302]);
    }
}
