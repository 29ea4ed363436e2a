//! Unicode block ranges used for glitch alphabets and direction detection

/// Half-open range of Unicode scalar values `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharRange {
    /// First code point
    pub start: u32,
    /// One past the last code point
    pub end: u32,
}

impl CharRange {
    /// Arabic block
    pub const ARABIC: Self = Self::new(0x600, 0x6FF);
    /// Hebrew block
    pub const HEBREW: Self = Self::new(0x590, 0x5FF);
    /// Hiragana block
    pub const HIRAGANA: Self = Self::new(0x3041, 0x3097);
    /// Katakana block
    pub const KATAKANA: Self = Self::new(0x30A0, 0x3100);
    /// CJK unified ideographs extension A
    pub const IDEOGRAPH_EXTENSION: Self = Self::new(0x3400, 0x4DB6);
    /// CJK unified ideographs
    pub const IDEOGRAPH: Self = Self::new(0x4E00, 0x9FCC);
    /// CJK compatibility ideographs
    pub const IDEOGRAPH_COMPATIBILITY: Self = Self::new(0xF900, 0xFA6B);
    /// Hangul syllables
    pub const HANGUL: Self = Self::new(0xAC00, 0xD7A4);

    /// Create a range from its bounds
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Whether `c` lies inside the range
    #[must_use]
    pub const fn contains(&self, c: char) -> bool {
        let code = c as u32;
        code >= self.start && code < self.end
    }

    /// Number of code points in the range
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Whether the range holds no code points
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Code point at `offset` from the start, if it is a valid `char`
    #[must_use]
    pub fn nth(&self, offset: u32) -> Option<char> {
        char::from_u32(self.start + offset)
    }
}

/// Whether `c` belongs to a right-to-left script
#[must_use]
pub const fn is_right_to_left(c: char) -> bool {
    CharRange::ARABIC.contains(c) || CharRange::HEBREW.contains(c)
}

const LATIN: &[CharRange] = &[CharRange::new(0x41, 0x5A), CharRange::new(0x61, 0x7A)];
const IDEOGRAPHS: &[CharRange] = &[
    CharRange::IDEOGRAPH,
    CharRange::IDEOGRAPH_EXTENSION,
    CharRange::IDEOGRAPH_COMPATIBILITY,
];
const HIRAGANA: &[CharRange] = &[CharRange::HIRAGANA];
const KATAKANA: &[CharRange] = &[CharRange::KATAKANA];
const HANGUL: &[CharRange] = &[CharRange::HANGUL];
const SYMBOLS: &[CharRange] = &[CharRange::new(0x2300, 0x231A), CharRange::new(0x231C, 0x23E1)];

/// Alphabet that a glitching `c` should draw its substitutes from
///
/// Falls back to a block of technical symbols for scripts without a
/// dedicated alphabet.
#[must_use]
pub fn glitch_alphabet(c: char) -> &'static [CharRange] {
    [LATIN, IDEOGRAPHS, HIRAGANA, KATAKANA, HANGUL]
        .into_iter()
        .find(|ranges| ranges.iter().any(|range| range.contains(c)))
        .unwrap_or(SYMBOLS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_selection() {
        assert_eq!(glitch_alphabet('k'), LATIN);
        assert_eq!(glitch_alphabet('漢'), IDEOGRAPHS);
        assert_eq!(glitch_alphabet('か'), HIRAGANA);
        assert_eq!(glitch_alphabet('カ'), KATAKANA);
        assert_eq!(glitch_alphabet('한'), HANGUL);
        assert_eq!(glitch_alphabet('1'), SYMBOLS);
    }

    #[test]
    fn direction_detection() {
        assert!(is_right_to_left('ש'));
        assert!(is_right_to_left('م'));
        assert!(!is_right_to_left('a'));
    }
}
