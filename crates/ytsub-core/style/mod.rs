//! Named styles and user rendering preferences
//!
//! An [`AssStyle`] holds the defaults of one style row from a source
//! document. [`StyleOptions`] add the choices a style row cannot express:
//! which edge effects its shadow becomes and the karaoke highlight colors.
//! Both are read-only during compilation.

mod options;

pub use options::{ShadowTypes, StyleOptions, StyleOptionsList};

use crate::model::AnchorPoint;
use crate::utils::Color;

/// Formatting defaults of one named style
#[derive(Debug, Clone, PartialEq)]
pub struct AssStyle {
    pub name: String,
    pub font: String,
    /// Font size, interpreted as line height in pixels
    pub line_height: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub primary_color: Color,
    pub secondary_color: Color,
    pub outline_color: Color,
    pub outline_thickness: f32,
    /// Border style 3: the outline color fills a background box
    pub outline_is_box: bool,
    pub shadow_color: Color,
    pub shadow_distance: f32,
    pub anchor_point: AnchorPoint,
}

impl AssStyle {
    #[must_use]
    pub fn has_outline(&self) -> bool {
        self.outline_thickness > 0.0
    }

    #[must_use]
    pub fn has_outline_box(&self) -> bool {
        self.has_outline() && self.outline_is_box
    }

    #[must_use]
    pub fn has_shadow(&self) -> bool {
        self.shadow_distance > 0.0
    }
}

impl Default for AssStyle {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            font: "Arial".to_string(),
            line_height: 20.0,
            bold: false,
            italic: false,
            underline: false,
            primary_color: Color::WHITE,
            secondary_color: Color::from_rgb(255, 0, 0),
            outline_color: Color::BLACK,
            outline_thickness: 2.0,
            outline_is_box: false,
            shadow_color: Color::BLACK,
            shadow_distance: 2.0,
            anchor_point: AnchorPoint::BottomCenter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_flags() {
        let mut style = AssStyle::default();
        assert!(style.has_outline());
        assert!(!style.has_outline_box());
        assert!(style.has_shadow());

        style.outline_is_box = true;
        assert!(style.has_outline_box());

        style.outline_thickness = 0.0;
        style.shadow_distance = 0.0;
        assert!(!style.has_outline_box());
        assert!(!style.has_shadow());
    }
}
