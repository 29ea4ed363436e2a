//! Uniformly formatted text run

use super::{Animation, AnimationKind, OffsetType, RubyPart, RubyPosition, ShadowType};
use crate::utils::Color;
use std::collections::BTreeMap;

/// Run of text with one formatting
///
/// Besides the fields every target understands, a section carries the
/// source-format state that only lives until compilation finishes: the
/// secondary (unsung karaoke) color, blur, current-word highlight colors,
/// karaoke duration and pending animations.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub text: String,
    /// Font family, `None` for the player default
    pub font: Option<String>,
    /// Size relative to the default style's line height
    pub scale: f32,
    pub offset: OffsetType,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub fore_color: Color,
    pub back_color: Color,
    /// Edge effects keyed by kind; targets accept only one per section
    pub shadow_colors: BTreeMap<ShadowType, Color>,
    pub ruby_part: RubyPart,
    /// Ruby position in effect for `[base/ruby]` markup in this section
    pub ruby_position: RubyPosition,
    pub packed: bool,
    /// Native karaoke start offset relative to the line start, in ms
    pub start_offset: i64,
    pub secondary_color: Color,
    pub blur: f32,
    pub current_word_fore_color: Option<Color>,
    pub current_word_outline_color: Option<Color>,
    pub current_word_shadow_color: Option<Color>,
    /// Karaoke syllable duration in ms, zero when not timed
    pub duration: i64,
    pub animations: Vec<Animation>,
}

impl Default for Section {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: None,
            scale: 1.0,
            offset: OffsetType::Regular,
            bold: false,
            italic: false,
            underline: false,
            fore_color: Color::EMPTY,
            back_color: Color::EMPTY,
            shadow_colors: BTreeMap::new(),
            ruby_part: RubyPart::None,
            ruby_position: RubyPosition::None,
            packed: false,
            start_offset: 0,
            secondary_color: Color::EMPTY,
            blur: 0.0,
            current_word_fore_color: None,
            current_word_outline_color: None,
            current_word_shadow_color: None,
            duration: 0,
            animations: Vec::new(),
        }
    }
}

impl Section {
    /// Create an unformatted section holding `text`
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Copy of this section's formatting with empty text
    #[must_use]
    pub fn formatting_only(&self) -> Self {
        Self {
            text: String::new(),
            ..self.clone()
        }
    }

    /// Whether both sections render identically, ignoring text and timing
    ///
    /// Compares the formatting a target can display: font, scale, flags,
    /// foreground, background and shadow colors, ruby role and packing.
    #[must_use]
    pub fn format_eq(&self, other: &Self) -> bool {
        self.bold == other.bold
            && self.italic == other.italic
            && self.underline == other.underline
            && self.font == other.font
            && (self.scale - other.scale).abs() <= 0.001
            && self.offset == other.offset
            && self.fore_color == other.fore_color
            && self.back_color == other.back_color
            && self.ruby_part == other.ruby_part
            && self.packed == other.packed
            && self.shadow_colors == other.shadow_colors
    }

    /// Whether any current-word highlight color is set
    #[must_use]
    pub const fn has_current_word_colors(&self) -> bool {
        self.current_word_fore_color.is_some()
            || self.current_word_outline_color.is_some()
            || self.current_word_shadow_color.is_some()
    }

    pub fn clear_current_word_colors(&mut self) {
        self.current_word_fore_color = None;
        self.current_word_outline_color = None;
        self.current_word_shadow_color = None;
    }

    /// Drop every animation matching `predicate`
    pub fn remove_animations(&mut self, predicate: impl Fn(&AnimationKind) -> bool) {
        self.animations.retain(|anim| !predicate(&anim.kind));
    }

    /// Set every existing shadow to `color`
    pub fn set_all_shadows(&mut self, color: Color) {
        for shadow in self.shadow_colors.values_mut() {
            *shadow = color;
        }
    }
}
