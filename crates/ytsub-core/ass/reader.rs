//! Line-oriented reader for `.ass` scripts
//!
//! Splits a script into `[Section]` blocks of `Key: value` items. A `Format`
//! item gives the column names for the rest of its section; other items are
//! split on commas into at most that many columns, so the last column (the
//! dialogue text) may itself contain commas. Fields are looked up by column
//! name, case-insensitively.

use crate::model::{AnchorPoint, Size};
use crate::style::AssStyle;
use crate::utils::time::parse_ass_time;
use crate::utils::{parse_numeric, parse_style_color, Color, CoreError, Result};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Canvas assumed when the script does not declare one
pub const DEFAULT_PLAY_RES: Size = Size::new(384, 288);

fn item_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\w[\w ]*?):\s*(.*)$").expect("item regex should compile"))
}

/// One `Dialogue` event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssDialogue {
    pub layer: i32,
    /// Start time in ms
    pub start: i64,
    /// End time in ms
    pub end: i64,
    pub style: String,
    /// `;`-separated effect flags
    pub effect: String,
    /// Text with override tags
    pub text: String,
}

/// `Key: value` line split into columns
#[derive(Debug, Clone, PartialEq, Eq)]
struct Item {
    key: String,
    values: Vec<String>,
    line_number: usize,
}

/// `[Name]` block of items
#[derive(Debug, Clone, Default)]
struct FileSection {
    name: String,
    format: Option<Vec<String>>,
    items: Vec<Item>,
}

impl FileSection {
    fn items<'s>(&'s self, key: &'s str) -> impl Iterator<Item = Fields<'s>> + 's {
        self.items
            .iter()
            .filter(move |item| item.key == key)
            .map(move |item| Fields {
                format: self.format.as_deref().unwrap_or(&[]),
                item,
            })
    }

    /// Value of the first item named `key`, for column-less sections
    fn value(&self, key: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.key.eq_ignore_ascii_case(key))
            .and_then(|item| item.values.first())
            .map(String::as_str)
    }
}

/// Column access for one item
struct Fields<'s> {
    format: &'s [String],
    item: &'s Item,
}

impl Fields<'_> {
    fn get(&self, name: &str) -> Result<&str> {
        self.format
            .iter()
            .position(|field| field.eq_ignore_ascii_case(name))
            .and_then(|idx| self.item.values.get(idx))
            .map(String::as_str)
            .ok_or_else(|| {
                CoreError::parse(format!(
                    "Line {}: {} has no {name} field",
                    self.item.line_number, self.item.key
                ))
            })
    }

    fn string(&self, name: &str) -> Result<String> {
        self.get(name).map(str::to_string)
    }

    fn int(&self, name: &str) -> i32 {
        self.get(name)
            .ok()
            .and_then(|value| parse_numeric(value).ok())
            .unwrap_or(0)
    }

    fn float(&self, name: &str) -> Result<f32> {
        parse_numeric(self.get(name)?)
    }

    fn bool(&self, name: &str) -> bool {
        self.int(name) != 0
    }

    fn color(&self, name: &str) -> Result<Color> {
        parse_style_color(self.get(name)?)
    }

    fn timestamp(&self, name: &str) -> Result<i64> {
        parse_ass_time(self.get(name)?)
    }
}

/// Canvas, styles and dialogue events of a script
#[derive(Debug, Clone, PartialEq)]
pub struct AssScript {
    pub video_dimensions: Size,
    pub styles: Vec<AssStyle>,
    pub dialogues: Vec<AssDialogue>,
}

impl AssScript {
    /// Parse script text
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Parse`] for unrecognized lines, items outside any
    /// section, duplicate `Format` items, missing columns or an invalid style
    /// alignment, and the field errors of malformed colors or timestamps.
    pub fn parse(text: &str) -> Result<Self> {
        let sections = read_sections(text)?;

        let mut video_dimensions = DEFAULT_PLAY_RES;
        let mut styles = Vec::new();
        let mut dialogues = Vec::new();
        for section in &sections {
            match section.name.as_str() {
                "Script Info" => {
                    if let Some(width) = section.value("PlayResX").and_then(|v| v.trim().parse().ok()) {
                        video_dimensions.width = width;
                    }
                    if let Some(height) = section.value("PlayResY").and_then(|v| v.trim().parse().ok()) {
                        video_dimensions.height = height;
                    }
                }
                "V4+ Styles" | "V4 Styles" => {
                    for fields in section.items("Style") {
                        styles.push(read_style(&fields)?);
                    }
                }
                "Events" => {
                    for fields in section.items("Dialogue") {
                        dialogues.push(read_dialogue(&fields)?);
                    }
                }
                _ => {}
            }
        }

        debug!(
            styles = styles.len(),
            dialogues = dialogues.len(),
            width = video_dimensions.width,
            height = video_dimensions.height,
            "read ass script"
        );
        Ok(Self {
            video_dimensions,
            styles,
            dialogues,
        })
    }
}

fn read_sections(text: &str) -> Result<Vec<FileSection>> {
    let mut sections: Vec<FileSection> = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_number = idx + 1;
        let line = raw.trim_start_matches('\u{FEFF}').trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            sections.push(FileSection {
                name: name.to_string(),
                ..FileSection::default()
            });
            continue;
        }

        let captures = item_regex()
            .captures(line)
            .ok_or_else(|| CoreError::parse(format!("Unrecognized line in .ass: {line}")))?;
        let section = sections
            .last_mut()
            .ok_or_else(|| CoreError::parse(format!("Line {line} is not inside a section")))?;

        let key = &captures[1];
        let value = &captures[2];
        if key == "Format" {
            if section.format.is_some() {
                return Err(CoreError::parse(format!(
                    "Line {line_number}: section [{}] has multiple Format items",
                    section.name
                )));
            }
            section.format = Some(value.split(',').map(|field| field.trim().to_string()).collect());
            continue;
        }

        let values = match &section.format {
            Some(format) => value
                .splitn(format.len().max(1), ',')
                .map(str::to_string)
                .collect(),
            None => vec![value.to_string()],
        };
        section.items.push(Item {
            key: key.to_string(),
            values,
            line_number,
        });
    }
    Ok(sections)
}

fn read_style(fields: &Fields<'_>) -> Result<AssStyle> {
    let alignment = fields.int("Alignment");
    let anchor_point = AnchorPoint::from_numpad(alignment).ok_or_else(|| {
        CoreError::parse(format!(
            "Line {}: invalid alignment {alignment}",
            fields.item.line_number
        ))
    })?;

    Ok(AssStyle {
        name: fields.get("Name")?.trim().to_string(),
        font: fields.get("Fontname")?.trim().to_string(),
        line_height: fields.float("Fontsize")?,
        bold: fields.bool("Bold"),
        italic: fields.bool("Italic"),
        underline: fields.bool("Underline"),
        primary_color: fields.color("PrimaryColour")?,
        secondary_color: fields.color("SecondaryColour")?,
        outline_color: fields.color("OutlineColour")?,
        shadow_color: fields.color("BackColour")?,
        outline_thickness: fields.float("Outline")?,
        outline_is_box: fields.int("BorderStyle") == 3,
        shadow_distance: fields.float("Shadow")?,
        anchor_point,
    })
}

fn read_dialogue(fields: &Fields<'_>) -> Result<AssDialogue> {
    Ok(AssDialogue {
        layer: fields.int("Layer"),
        start: fields.timestamp("Start")?,
        end: fields.timestamp("End")?,
        style: fields.get("Style")?.trim().to_string(),
        effect: fields.get("Effect").map(str::trim).unwrap_or_default().to_string(),
        text: fields.string("Text")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SCRIPT: &str = "\u{FEFF}[Script Info]
; comment
ScriptType: v4.00+
PlayResX: 1920
PlayResY: 1080

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Default,Arial,48,&H00FFFFFF,&H000000FF,&H80000000,&H00222222,-1,0,0,0,100,100,0,0,3,2,1.5,8,10,10,10,1

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Comment: 0,0:00:00.00,0:00:01.00,Default,,0,0,0,,ignored
Dialogue: 1,0:00:01.50,0:00:03.25,Default,,0,0,0,no_android_dark_text_hack,Hello, {\\b1}world
";

    #[test]
    fn reads_canvas_styles_and_dialogues() {
        let script = AssScript::parse(SCRIPT).unwrap();
        assert_eq!(script.video_dimensions, Size::new(1920, 1080));

        let style = &script.styles[0];
        assert_eq!(style.name, "Default");
        assert_eq!(style.font, "Arial");
        assert_eq!(style.line_height, 48.0);
        assert!(style.bold);
        assert!(style.outline_is_box);
        assert_eq!(style.outline_color, Color::from_argb(0x7F, 0, 0, 0));
        assert_eq!(style.secondary_color, Color::from_rgb(255, 0, 0));
        assert_eq!(style.shadow_color, Color::from_rgb(0x22, 0x22, 0x22));
        assert_eq!(style.shadow_distance, 1.5);
        assert_eq!(style.anchor_point, AnchorPoint::TopCenter);

        assert_eq!(
            script.dialogues,
            vec![AssDialogue {
                layer: 1,
                start: 1500,
                end: 3250,
                style: "Default".to_string(),
                effect: "no_android_dark_text_hack".to_string(),
                text: "Hello, {\\b1}world".to_string(),
            }]
        );
    }

    #[test]
    fn canvas_defaults_without_play_res() {
        let script = AssScript::parse("[Script Info]\nTitle: x\n").unwrap();
        assert_eq!(script.video_dimensions, DEFAULT_PLAY_RES);
        assert!(script.styles.is_empty());
    }

    #[test]
    fn structural_errors() {
        let err = AssScript::parse("Title: x").unwrap_err();
        assert!(err.to_string().contains("not inside a section"));

        let err = AssScript::parse("[Events]\nthis is not an item").unwrap_err();
        assert!(err.to_string().contains("Unrecognized line"));

        let err = AssScript::parse("[Events]\nFormat: Text\nFormat: Text").unwrap_err();
        assert!(err.to_string().contains("multiple Format"));
    }

    #[test]
    fn invalid_alignment_is_rejected() {
        let text = SCRIPT.replace(",8,10,10,10,1", ",12,10,10,10,1");
        let err = AssScript::parse(&text).unwrap_err();
        assert!(matches!(err, CoreError::Parse(_)));
    }

    #[test]
    fn embedded_default_styles_parse() {
        let script = AssScript::parse(include_str!("resources/default_styles.ass")).unwrap();
        assert_eq!(script.video_dimensions, Size::new(1280, 720));
        assert_eq!(script.styles.len(), 13);
        assert!(script.dialogues.is_empty());
    }
}
