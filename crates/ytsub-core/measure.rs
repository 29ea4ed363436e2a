//! Text measurement for layout helpers
//!
//! Only the ruby layout of the debug writer needs text sizes. It talks to a
//! [`TextMeasurer`] so that callers can plug in real font metrics; the
//! library ships [`ApproximateTextMeasurer`], which estimates advances from
//! character classes and treats the font size as the line height.

use crate::utils::CharRange;

/// Character blocks rendered at full em width
const WIDE_RANGES: [CharRange; 7] = [
    CharRange::HIRAGANA,
    CharRange::KATAKANA,
    CharRange::IDEOGRAPH_EXTENSION,
    CharRange::IDEOGRAPH,
    CharRange::IDEOGRAPH_COMPATIBILITY,
    CharRange::HANGUL,
    // Fullwidth forms
    CharRange::new(0xFF00, 0xFF61),
];

/// Measures the rendered size of a text run
pub trait TextMeasurer {
    /// Width and height in pixels of `text` set in `font` at `size` pixels
    fn measure(&self, text: &str, font: &str, size: f32, bold: bool, italic: bool) -> (f32, f32);
}

/// Font-independent estimate of text extents
///
/// Deterministic: equal input always produces equal output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateTextMeasurer;

impl ApproximateTextMeasurer {
    /// Advance of `c` in ems
    fn advance(c: char) -> f32 {
        if WIDE_RANGES.iter().any(|range| range.contains(c)) || c == '\u{3000}' {
            return 1.0;
        }
        match c {
            '\u{200B}' => 0.0,
            'i' | 'j' | 'l' | '!' | '.' | ',' | ':' | ';' | '\'' | '|' => 0.25,
            ' ' | '\u{A0}' | 'f' | 't' | 'r' | '(' | ')' | '[' | ']' => 0.33,
            'm' | 'w' | 'M' | 'W' | '@' => 0.85,
            c if c.is_ascii_uppercase() || c.is_ascii_digit() => 0.62,
            _ => 0.52,
        }
    }
}

impl TextMeasurer for ApproximateTextMeasurer {
    fn measure(&self, text: &str, _font: &str, size: f32, bold: bool, _italic: bool) -> (f32, f32) {
        let ems: f32 = text.chars().map(Self::advance).sum();
        let weight = if bold { 1.06 } else { 1.0 };
        (ems * size * weight, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_characters_take_a_full_em() {
        let measurer = ApproximateTextMeasurer;
        let (width, height) = measurer.measure("漢字かな", "Arial", 10.0, false, false);
        assert!((width - 40.0).abs() < 0.001);
        assert_eq!(height, 10.0);
    }

    #[test]
    fn bold_is_wider_and_measurement_is_stable() {
        let measurer = ApproximateTextMeasurer;
        let (regular, _) = measurer.measure("Hello", "Arial", 20.0, false, false);
        let (bold, _) = measurer.measure("Hello", "Arial", 20.0, true, false);
        assert!(bold > regular);
        assert_eq!(
            measurer.measure("Hello", "Arial", 20.0, false, true),
            measurer.measure("Hello", "Arial", 20.0, false, true)
        );
        assert_eq!(measurer.measure("", "Arial", 20.0, false, false).0, 0.0);
    }
}
