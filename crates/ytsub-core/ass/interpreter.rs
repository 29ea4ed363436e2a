//! Override tag interpreter
//!
//! Turns the text of one dialogue event into styled [`Section`]s. Literal
//! runs between `{...}` groups become sections; each tag inside a group is
//! dispatched through the [`TagRegistry`] and mutates the section that is
//! being built, the line, or the queue of post-processors.

use super::reader::AssDialogue;
use super::tags::{PostProcessor, TagRegistry, TagResult, TagScope};
use crate::document::merge_identically_formatted_sections;
use crate::karaoke::CursorFormatter;
use crate::model::{AnchorPoint, Line, PointF, RubyPart, RubyPosition, Section, ShadowType, Size};
use crate::style::{AssStyle, StyleOptions, StyleOptionsList};
use crate::utils::hashers::create_hash_set;
use crate::utils::{Color, CoreError, Result};
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;
use tracing::{debug, trace};

/// Effect field value that opts a line out of the dark text duplicate
pub const NO_ANDROID_DARK_TEXT_HACK: &str = "no_android_dark_text_hack";

/// Placeholder text keeping an empty karaoke syllable alive
pub const KARAOKE_PLACEHOLDER: &str = "\u{200B}";

fn trailing_line_breaks_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:\\N)+$").expect("trailing break regex should compile"))
}

fn tag_group_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{(.*?)\}").expect("tag group regex should compile"))
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\\(?P<tag>fn|r|\d?[a-z]+)\s*(?P<arg>\([^()]*(?:\)|$)|[^\\()]*)")
            .expect("tag regex should compile")
    })
}

fn karaoke_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\k\s*\d+").expect("karaoke tag regex should compile"))
}

fn ruby_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[(?P<text>.+?)/(?P<ruby>.+?)\]").expect("ruby regex should compile")
    })
}

/// Styles, style options and canvas of a source document
#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet {
    pub video_dimensions: Size,
    styles: Vec<AssStyle>,
    default_index: usize,
    options: StyleOptionsList,
}

impl Stylesheet {
    /// Build a stylesheet; the default style is `Default` or else the first
    ///
    /// An empty style list gets a single default style.
    #[must_use]
    pub fn new(video_dimensions: Size, mut styles: Vec<AssStyle>, options: StyleOptionsList) -> Self {
        if styles.is_empty() {
            styles.push(AssStyle::default());
        }
        let default_index = styles
            .iter()
            .position(|style| style.name == "Default")
            .unwrap_or(0);

        Self {
            video_dimensions,
            styles,
            default_index,
            options,
        }
    }

    /// Style by exact name; later duplicates win
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AssStyle> {
        self.styles.iter().rev().find(|style| style.name == name)
    }

    #[must_use]
    pub fn default_style(&self) -> &AssStyle {
        &self.styles[self.default_index]
    }

    #[must_use]
    pub fn styles(&self) -> &[AssStyle] {
        &self.styles
    }

    #[must_use]
    pub const fn options(&self) -> &StyleOptionsList {
        &self.options
    }

    /// User options for `style`, or options derived from the style row
    #[must_use]
    pub fn options_for(&self, style: &AssStyle) -> Cow<'_, StyleOptions> {
        self.options
            .get(&style.name)
            .map_or_else(|| Cow::Owned(StyleOptions::for_style(style)), Cow::Borrowed)
    }

    #[must_use]
    pub fn default_position(&self, anchor: AnchorPoint) -> PointF {
        self.video_dimensions.default_position(anchor)
    }

    /// Reset `section` to the formatting of `style`
    ///
    /// Scale is relative to the default style. Current-word colors are only
    /// kept for karaoke styles. The style's shadow becomes every shadow kind
    /// of `options`; a box outline becomes the background and any other
    /// outline becomes a glow.
    pub fn apply_style(&self, section: &mut Section, style: &AssStyle, options: &StyleOptions) {
        section.font = Some(style.font.clone());
        section.scale = style.line_height / self.default_style().line_height;
        section.bold = style.bold;
        section.italic = style.italic;
        section.underline = style.underline;
        section.fore_color = style.primary_color;
        section.secondary_color = style.secondary_color;

        if options.is_karaoke {
            section.current_word_fore_color = options.current_word_text_color;
            section.current_word_outline_color = options.current_word_outline_color;
            section.current_word_shadow_color = options.current_word_shadow_color;
        } else {
            section.clear_current_word_colors();
        }

        section.back_color = Color::EMPTY;
        section.shadow_colors.clear();

        if style.has_shadow() {
            for shadow_type in options.shadow_types.shadow_types() {
                section.shadow_colors.insert(shadow_type, style.shadow_color);
            }
        }

        if style.has_outline() {
            if style.outline_is_box {
                section.back_color = style.outline_color;
            } else {
                section.shadow_colors.insert(ShadowType::Glow, style.outline_color);
            }
        }

        section.blur = 0.0;
    }
}

/// Mutable state while interpreting one dialogue event
pub struct TagContext<'a> {
    pub stylesheet: &'a Stylesheet,
    /// Style named by the dialogue row
    pub initial_style: &'a AssStyle,
    pub initial_options: Cow<'a, StyleOptions>,
    /// Style in effect, changed by `\r`
    pub style: &'a AssStyle,
    pub options: Cow<'a, StyleOptions>,
    /// Line receiving finished sections
    pub line: Line,
    /// Section currently being formatted
    pub section: Section,
    /// Effects run after the whole event is scanned
    pub post_processors: Vec<PostProcessor>,
}

impl<'a> TagContext<'a> {
    /// Context for `line` whose first section has the formatting of `style`
    #[must_use]
    pub fn new(stylesheet: &'a Stylesheet, style: &'a AssStyle, line: Line) -> Self {
        let options = stylesheet.options_for(style);
        let mut section = Section::default();
        stylesheet.apply_style(&mut section, style, &options);
        Self::with_section(stylesheet, style, line, section)
    }

    /// Context continuing from existing section formatting
    #[must_use]
    pub fn with_section(stylesheet: &'a Stylesheet, style: &'a AssStyle, line: Line, section: Section) -> Self {
        let options = stylesheet.options_for(style);
        Self {
            stylesheet,
            initial_style: style,
            initial_options: options.clone(),
            style,
            options,
            line,
            section,
            post_processors: Vec::new(),
        }
    }

    /// Line height all scales are relative to
    #[must_use]
    pub fn default_line_height(&self) -> f32 {
        self.stylesheet.default_style().line_height
    }

    /// Absolute time of an offset in ms from the line start
    #[must_use]
    pub fn line_time(&self, offset_ms: f32) -> i64 {
        self.line.start + offset_ms.round() as i64
    }

    /// Switch to the named style (or the initial one) and reapply it
    pub fn reset_style(&mut self, name: &str) {
        let stylesheet = self.stylesheet;
        let named = stylesheet.get(name);
        self.style = named.unwrap_or(self.initial_style);
        self.options = match (named, stylesheet.options().get(name)) {
            (_, Some(options)) => Cow::Borrowed(options),
            (Some(style), None) => stylesheet.options_for(style),
            (None, None) => self.initial_options.clone(),
        };
        stylesheet.apply_style(&mut self.section, self.style, &self.options);
    }
}

/// Interprets dialogue text against one stylesheet
#[derive(Debug)]
pub struct Interpreter<'a> {
    stylesheet: &'a Stylesheet,
    registry: TagRegistry,
}

impl<'a> Interpreter<'a> {
    /// Interpreter with every built-in tag handler
    ///
    /// # Errors
    ///
    /// Fails only if the built-in handler set is inconsistent.
    pub fn new(stylesheet: &'a Stylesheet) -> Result<Self> {
        Ok(Self::with_registry(stylesheet, TagRegistry::with_builtin_handlers()?))
    }

    #[must_use]
    pub const fn with_registry(stylesheet: &'a Stylesheet, registry: TagRegistry) -> Self {
        Self {
            stylesheet,
            registry,
        }
    }

    #[must_use]
    pub const fn stylesheet(&self) -> &'a Stylesheet {
        self.stylesheet
    }

    /// Interpret one dialogue event
    ///
    /// Returns the interpreted line followed by any lines added by
    /// post-processors.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Parse`] if the dialogue refers to an undefined
    /// style.
    pub fn parse_line(&self, dialogue: &AssDialogue) -> Result<Vec<Line>> {
        let style = self.stylesheet.get(&dialogue.style).ok_or_else(|| {
            CoreError::parse(format!(
                "Line \"{}\" refers to style \"{}\" which doesn't exist.",
                dialogue.text, dialogue.style
            ))
        })?;

        let mut line = Line::new(dialogue.start, dialogue.end);
        line.anchor_point = style.anchor_point;
        if dialogue.effect.split(';').any(|effect| effect == NO_ANDROID_DARK_TEXT_HACK) {
            line.android_dark_text_hack_allowed = false;
        }

        let mut ctx = TagContext::new(self.stylesheet, style, line);
        self.create_tag_sections(&mut ctx, &dialogue.text);
        create_ruby_sections(&mut ctx.line);

        let post_processors = std::mem::take(&mut ctx.post_processors);
        let mut primary = ctx.line;
        let mut extra = Vec::new();
        for processor in post_processors {
            extra.extend(processor.run(&mut primary, self.stylesheet.video_dimensions));
        }

        let mut lines = Vec::with_capacity(1 + extra.len());
        lines.push(primary);
        lines.extend(extra);
        for line in &mut lines {
            merge_identically_formatted_sections(line);
            line.normalize_alpha();
        }

        trace!(lines = lines.len(), style = %dialogue.style, "interpreted dialogue");
        Ok(lines)
    }

    /// Scan `text` and append its sections to the context's line
    pub fn create_tag_sections(&self, ctx: &mut TagContext<'a>, text: &str) {
        let text = trailing_line_breaks_regex().replace(text, "");
        let mut handled_line_tags = create_hash_set::<String>();

        let mut start = 0;
        for group in tag_group_regex().captures_iter(&text) {
            let (Some(whole), Some(tags)) = (group.get(0), group.get(1)) else {
                continue;
            };
            let end = whole.start();

            let continues_karaoke =
                ctx.section.duration > 0 && karaoke_tag_regex().is_match(tags.as_str());
            if end > start || continues_karaoke {
                let section_text = if end == start {
                    KARAOKE_PLACEHOLDER.to_string()
                } else {
                    resolve_escape_sequences(&text[start..end])
                };
                let mut next = ctx.section.formatting_only();
                next.duration = 0;
                let mut finished = std::mem::replace(&mut ctx.section, next);
                finished.text = section_text;
                ctx.line.sections.push(finished);
            }

            for tag in tag_regex().captures_iter(tags.as_str()) {
                let name = tag.name("tag").map_or("", |m| m.as_str());
                let arg = tag.name("arg").map_or("", |m| m.as_str()).trim();

                let Some(handler) = self.registry.get(name) else {
                    trace!(tag = name, "ignoring unknown tag");
                    continue;
                };
                if handler.scope() == TagScope::Line && !handled_line_tags.insert(name.to_string()) {
                    continue;
                }

                match handler.handle(ctx, arg) {
                    TagResult::Processed => trace!(tag = name, arg, "applied tag"),
                    TagResult::Ignored => trace!(tag = name, arg, "tag not applicable"),
                    TagResult::Failed(reason) => debug!(tag = name, arg, %reason, "malformed tag argument"),
                }
            }

            start = whole.end();
        }

        if start < text.len() {
            let mut finished = ctx.section.formatting_only();
            finished.text = resolve_escape_sequences(&text[start..]);
            ctx.line.sections.push(finished);
        }
    }
}

impl CursorFormatter for Interpreter<'_> {
    fn format_cursor(&self, formatting: &Section, cursor: &str) -> Vec<Section> {
        let style = self.stylesheet.default_style();
        let mut ctx = TagContext::with_section(
            self.stylesheet,
            style,
            Line::new(0, 0),
            formatting.formatting_only(),
        );
        self.create_tag_sections(&mut ctx, cursor);
        ctx.line.sections
    }
}

/// Replace the inline escapes `\h`, `\n` (hard spaces) and `\N` (line break)
#[must_use]
pub fn resolve_escape_sequences(text: &str) -> String {
    text.replace("\\h", "\u{A0}")
        .replace("\\n", "\u{A0}")
        .replace("\\N", "\r\n")
}

/// Expand `[base/ruby]` markup in sections that have a ruby position
///
/// Each match becomes base, `(`, ruby and `)` sections; surrounding text
/// stays unannotated. The first new section inherits the karaoke duration.
pub fn create_ruby_sections(line: &mut Line) {
    let mut index = line.sections.len();
    while index > 0 {
        index -= 1;
        let section = &line.sections[index];
        if section.ruby_position == RubyPosition::None || !ruby_regex().is_match(&section.text) {
            continue;
        }

        let template = line.sections.remove(index);
        let ruby_part = if template.ruby_position == RubyPosition::Below {
            RubyPart::RubyBelow
        } else {
            RubyPart::RubyAbove
        };

        let mut parts: Vec<(String, RubyPart)> = Vec::new();
        let mut inter_start = 0;
        for caps in ruby_regex().captures_iter(&template.text) {
            let (Some(whole), Some(base), Some(ruby)) = (caps.get(0), caps.name("text"), caps.name("ruby")) else {
                continue;
            };
            if whole.start() > inter_start {
                parts.push((template.text[inter_start..whole.start()].to_string(), RubyPart::None));
            }
            parts.push((base.as_str().to_string(), RubyPart::Base));
            parts.push(("(".to_string(), RubyPart::Parenthesis));
            parts.push((ruby.as_str().to_string(), ruby_part));
            parts.push((")".to_string(), RubyPart::Parenthesis));
            inter_start = whole.end();
        }
        if inter_start < template.text.len() {
            parts.push((template.text[inter_start..].to_string(), RubyPart::None));
        }

        for (offset, (text, part)) in parts.into_iter().enumerate() {
            let mut section = template.formatting_only();
            section.text = text;
            section.ruby_part = part;
            section.duration = if offset == 0 { template.duration } else { 0 };
            line.sections.insert(index + offset, section);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnimationKind, OffsetType};
    use crate::style::ShadowTypes;
    use pretty_assertions::assert_eq;

    fn stylesheet() -> Stylesheet {
        let default = AssStyle {
            name: "Default".to_string(),
            line_height: 40.0,
            outline_thickness: 0.0,
            shadow_distance: 0.0,
            ..AssStyle::default()
        };
        let boxed = AssStyle {
            name: "Box".to_string(),
            line_height: 80.0,
            outline_is_box: true,
            outline_color: Color::from_argb(192, 8, 8, 8),
            ..AssStyle::default()
        };
        Stylesheet::new(Size::new(1280, 720), vec![default, boxed], StyleOptionsList::default())
    }

    fn dialogue(style: &str, text: &str) -> AssDialogue {
        AssDialogue {
            layer: 0,
            start: 1000,
            end: 3000,
            style: style.to_string(),
            effect: String::new(),
            text: text.to_string(),
        }
    }

    fn parse(text: &str) -> Line {
        let sheet = stylesheet();
        let interpreter = Interpreter::new(&sheet).unwrap();
        interpreter
            .parse_line(&dialogue("Default", text))
            .unwrap()
            .remove(0)
    }

    #[test]
    fn colors_are_bgr() {
        let line = parse(r"{\c&H0000FF&}Red{\c&H00FF00&}Green");
        assert_eq!(line.sections.len(), 2);
        assert_eq!(line.sections[0].text, "Red");
        assert_eq!(line.sections[0].fore_color, Color::from_rgb(255, 0, 0));
        assert_eq!(line.sections[1].text, "Green");
        assert_eq!(line.sections[1].fore_color, Color::from_rgb(0, 255, 0));
        assert!(!line.has_animations());
    }

    #[test]
    fn alpha_reset_restores_style_default() {
        let line = parse(r"{\1a&H80&}half{\1a}full");
        assert_eq!(line.sections[0].fore_color.a, 0x7F);
        assert_eq!(line.sections[1].fore_color.a, 255);
    }

    #[test]
    fn parenthesized_alpha_arguments() {
        let line = parse(r"{\1a(&H80&)}half{\1a()}full");
        assert_eq!(line.sections[0].fore_color.a, 0x7F);
        // Empty parentheses are an argument of zero, not a reset
        assert_eq!(line.sections[1].fore_color.a, 255);
    }

    #[test]
    fn escapes_and_trailing_breaks() {
        let line = parse(r"one\Ntwo\hthree\N\N");
        assert_eq!(line.text(), "one\r\ntwo\u{A0}three");
    }

    #[test]
    fn unknown_tags_are_ignored() {
        let line = parse(r"{\frz45\b1}bold");
        assert_eq!(line.sections.len(), 1);
        assert!(line.sections[0].bold);
    }

    #[test]
    fn line_tags_only_count_once() {
        let line = parse(r"{\an8\pos(10,20)}a{\an2\pos(30,40)}b");
        assert_eq!(line.anchor_point, AnchorPoint::TopCenter);
        assert_eq!(line.position, Some(PointF::new(10.0, 20.0)));
    }

    #[test]
    fn karaoke_placeholder_keeps_empty_syllable() {
        let line = parse(r"{\k50}{\k30}b");
        let texts: Vec<&str> = line.sections.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec![KARAOKE_PLACEHOLDER, "b"]);
        assert_eq!(line.sections[0].duration, 500);
        assert_eq!(line.sections[1].duration, 300);
    }

    #[test]
    fn reset_switches_style() {
        let line = parse(r"{\b1\ytsup}a{\rBox}b{\r}c");
        assert!(line.sections[0].bold);
        assert_eq!(line.sections[0].offset, OffsetType::Superscript);

        let boxed = &line.sections[1];
        assert!(!boxed.bold);
        assert_eq!(boxed.offset, OffsetType::Regular);
        assert_eq!(boxed.scale, 2.0);
        assert_eq!(boxed.back_color, Color::from_argb(192, 8, 8, 8));

        assert_eq!(line.sections[2].scale, 1.0);
        assert_eq!(line.sections[2].back_color, Color::EMPTY);
    }

    #[test]
    fn ruby_markup_is_expanded() {
        let line = parse(r"{\ytruby}x[漢/かん]y");
        let parts: Vec<(&str, RubyPart)> = line
            .sections
            .iter()
            .map(|s| (s.text.as_str(), s.ruby_part))
            .collect();
        assert_eq!(
            parts,
            vec![
                ("x", RubyPart::None),
                ("漢", RubyPart::Base),
                ("(", RubyPart::Parenthesis),
                ("かん", RubyPart::RubyAbove),
                (")", RubyPart::Parenthesis),
                ("y", RubyPart::None),
            ]
        );
    }

    #[test]
    fn transform_creates_animation() {
        let line = parse(r"{\t(0,500,\c&H0000FF&)}x");
        let anim = &line.sections[0].animations[0];
        assert_eq!((anim.start, anim.end), (1000, 1500));
        assert_eq!(
            anim.kind,
            AnimationKind::ForeColor {
                from: Color::WHITE,
                to: Color::from_rgb(255, 0, 0)
            }
        );
        assert!(!line.android_dark_text_hack_allowed);
    }

    #[test]
    fn effect_field_disables_dark_text_hack() {
        let sheet = stylesheet();
        let interpreter = Interpreter::new(&sheet).unwrap();
        let mut row = dialogue("Default", "x");
        row.effect = format!("foo;{NO_ANDROID_DARK_TEXT_HACK}");
        let lines = interpreter.parse_line(&row).unwrap();
        assert!(!lines[0].android_dark_text_hack_allowed);
    }

    #[test]
    fn unknown_style_is_an_error() {
        let sheet = stylesheet();
        let interpreter = Interpreter::new(&sheet).unwrap();
        let err = interpreter.parse_line(&dialogue("Missing", "x")).unwrap_err();
        assert_eq!(
            err,
            CoreError::Parse(
                "Line \"x\" refers to style \"Missing\" which doesn't exist.".to_string()
            )
        );
    }

    #[test]
    fn apply_style_maps_outline_and_shadow() {
        let sheet = stylesheet();
        let style = AssStyle::default();
        let mut options = StyleOptions::for_style(&style);
        options.shadow_types = ShadowTypes::HARD_SHADOW | ShadowTypes::BEVEL;
        let mut section = Section::default();
        sheet.apply_style(&mut section, &style, &options);

        let kinds: Vec<ShadowType> = section.shadow_colors.keys().copied().collect();
        assert_eq!(
            kinds,
            vec![ShadowType::Glow, ShadowType::Bevel, ShadowType::HardShadow]
        );
        assert_eq!(section.scale, 0.5);
        assert_eq!(section.current_word_fore_color, None);
    }

    #[test]
    fn cursor_formatting_uses_tags() {
        let sheet = stylesheet();
        let interpreter = Interpreter::new(&sheet).unwrap();
        let mut formatting = Section::new("ignored");
        formatting.fore_color = Color::WHITE;
        let sections = interpreter.format_cursor(&formatting, r"{\c&H0000FF&}_");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].text, "_");
        assert_eq!(sections[0].fore_color, Color::from_rgb(255, 0, 0));
    }
}
