//! Timed subtitle line

use super::{
    Animation, AnchorPoint, HorizontalTextDirection, PointF, Section, VerticalTextType,
};
use crate::utils::Color;

/// Highlight strategy for emulated karaoke
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KaraokeType {
    /// Recolor the singing syllables
    #[default]
    Simple,
    /// Cross-fade into and out of the highlight
    Fade,
    /// Briefly scramble the first character of the singing syllable
    Glitch,
    /// Insert a caret that blinks at a fixed interval
    Cursor {
        /// Caret sits before the singing syllable instead of after it
        before: bool,
        /// Cursor change cadence in ms
        interval: i64,
        /// Override-tag strings cycled through for the caret
        cursors: Vec<String>,
    },
}

/// A subtitle shown during `[start, end)`
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Start time in ms
    pub start: i64,
    /// End time in ms
    pub end: i64,
    pub sections: Vec<Section>,
    pub anchor_point: AnchorPoint,
    /// Explicit pixel position, `None` for the anchor's default position
    pub position: Option<PointF>,
    pub horizontal_text_direction: HorizontalTextDirection,
    pub vertical_text_type: VerticalTextType,
    /// Whether dark text may be duplicated as an invisible bright copy
    pub android_dark_text_hack_allowed: bool,
    /// Opacity multiplier written by fades, folded into colors afterwards
    pub alpha: u8,
    /// Line-scoped animations (move, fade, shake)
    pub animations: Vec<Animation>,
    pub karaoke_type: KaraokeType,
}

impl Line {
    /// Create an empty bottom-centered line
    #[must_use]
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start,
            end,
            sections: Vec::new(),
            anchor_point: AnchorPoint::BottomCenter,
            position: None,
            horizontal_text_direction: HorizontalTextDirection::LeftToRight,
            vertical_text_type: VerticalTextType::None,
            android_dark_text_hack_allowed: true,
            alpha: 255,
            animations: Vec::new(),
            karaoke_type: KaraokeType::Simple,
        }
    }

    /// Create a line holding one section
    #[must_use]
    pub fn with_section(start: i64, end: i64, section: Section) -> Self {
        let mut line = Self::new(start, end);
        line.sections.push(section);
        line
    }

    /// Copy of this line's attributes without any sections
    #[must_use]
    pub fn without_sections(&self) -> Self {
        Self {
            sections: Vec::new(),
            ..self.clone()
        }
    }

    /// Concatenated text of all sections
    #[must_use]
    pub fn text(&self) -> String {
        self.sections.iter().map(|s| s.text.as_str()).collect()
    }

    /// Duration in ms, zero for inverted lines
    #[must_use]
    pub const fn duration(&self) -> i64 {
        if self.end > self.start {
            self.end - self.start
        } else {
            0
        }
    }

    /// Whether the line or any section carries an animation
    #[must_use]
    pub fn has_animations(&self) -> bool {
        !self.animations.is_empty() || self.sections.iter().any(|s| !s.animations.is_empty())
    }

    /// Fold the line alpha into every section color and reset it to opaque
    ///
    /// Empty colors stay empty.
    pub fn normalize_alpha(&mut self) {
        if self.alpha == 255 {
            return;
        }

        let factor = f32::from(self.alpha) / 255.0;
        for section in &mut self.sections {
            section.fore_color = section.fore_color.multiply_alpha(factor);
            section.back_color = section.back_color.multiply_alpha(factor);
            for shadow in section.shadow_colors.values_mut() {
                *shadow = shadow.multiply_alpha(factor);
            }
        }
        self.alpha = 255;
    }

    /// Whether any section has a visible background box
    #[must_use]
    pub fn has_background(&self) -> bool {
        self.sections.iter().any(|s| s.back_color.a > 0)
    }

    /// Foreground of the first section, white when there is none
    #[must_use]
    pub fn base_fore_color(&self) -> Color {
        self.sections.first().map_or(Color::WHITE, |s| s.fore_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShadowType;

    #[test]
    fn normalize_alpha_scales_colors() {
        let mut line = Line::new(0, 100);
        let mut section = Section::new("x");
        section.fore_color = Color::WHITE;
        section.back_color = Color::EMPTY;
        section
            .shadow_colors
            .insert(ShadowType::Glow, Color::from_argb(200, 0, 0, 0));
        line.sections.push(section);
        line.alpha = 51;

        line.normalize_alpha();

        let section = &line.sections[0];
        assert_eq!(line.alpha, 255);
        assert_eq!(section.fore_color.a, 51);
        assert_eq!(section.back_color, Color::EMPTY);
        assert_eq!(section.shadow_colors[&ShadowType::Glow].a, 40);
    }

    #[test]
    fn opaque_line_is_untouched() {
        let mut line = Line::with_section(0, 100, Section::new("x"));
        line.sections[0].fore_color = Color::from_argb(10, 1, 2, 3);
        let before = line.clone();
        line.normalize_alpha();
        assert_eq!(line, before);
    }

    #[test]
    fn text_and_duration() {
        let mut line = Line::new(100, 50);
        line.sections.push(Section::new("ab"));
        line.sections.push(Section::new("cd"));
        assert_eq!(line.text(), "abcd");
        assert_eq!(line.duration(), 0);
        assert!(line.without_sections().sections.is_empty());
    }
}
