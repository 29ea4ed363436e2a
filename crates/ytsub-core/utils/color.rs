//! Alpha-aware ARGB color type
//!
//! Colors are stored as straight (non-premultiplied) ARGB where alpha 255 is
//! fully opaque. Source scripts encode colors as BGR hex and alpha as
//! transparency; the conversions live in [`crate::utils::parse_color`] and
//! [`Color::to_ass_style_hex`].

use crate::utils::errors::{CoreError, Result};
use core::fmt;

/// Straight-alpha ARGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Opacity, 255 is fully opaque
    pub a: u8,
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Color {
    /// Fully transparent black, used for "no color"
    pub const EMPTY: Self = Self::from_argb(0, 0, 0, 0);
    /// Opaque white
    pub const WHITE: Self = Self::from_argb(255, 255, 255, 255);
    /// Opaque black
    pub const BLACK: Self = Self::from_argb(255, 0, 0, 0);

    /// Create a color from its four channels
    #[must_use]
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// Create an opaque color
    #[must_use]
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::from_argb(255, r, g, b)
    }

    /// Same color with a different alpha
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Same color with an alpha given as a possibly out-of-range integer
    #[must_use]
    pub fn with_alpha_clamped(self, a: i32) -> Self {
        self.with_alpha(a.clamp(0, 255) as u8)
    }

    /// Whether the RGB channels are equal, ignoring alpha
    #[must_use]
    pub const fn rgb_eq(self, other: Self) -> bool {
        self.r == other.r && self.g == other.g && self.b == other.b
    }

    /// Largest of the three color channels
    #[must_use]
    pub fn max_channel(self) -> u8 {
        self.r.max(self.g).max(self.b)
    }

    /// Whether every channel is below half intensity
    #[must_use]
    pub fn is_dark(self) -> bool {
        self.max_channel() < 128
    }

    /// Scale the channels up until the brightest one reaches 255
    #[must_use]
    pub fn brighten(self) -> Self {
        let (r, g, b) = (self.r.max(1), self.g.max(1), self.b.max(1));
        let brightest = u32::from(r.max(g).max(b));
        let scale = |channel: u8| (u32::from(channel) * 255 / brightest) as u8;
        Self::from_argb(self.a, scale(r), scale(g), scale(b))
    }

    /// Scale alpha by `factor` (0..=1), truncating toward zero
    #[must_use]
    pub fn multiply_alpha(self, factor: f32) -> Self {
        if self == Self::EMPTY {
            return self;
        }
        self.with_alpha_clamped((f32::from(self.a) * factor) as i32)
    }

    /// Per-channel interpolation with an already-eased progress value
    #[must_use]
    pub fn lerp(from: Self, to: Self, eased: f32) -> Self {
        let channel = |a: u8, b: u8| -> u8 {
            let value = i32::from(a) + ((i32::from(b) - i32::from(a)) as f32 * eased) as i32;
            value.clamp(0, 255) as u8
        };
        Self::from_argb(
            channel(from.a, to.a),
            channel(from.r, to.r),
            channel(from.g, to.g),
            channel(from.b, to.b),
        )
    }

    /// `#RRGGBB` notation used by the timed-text format
    #[must_use]
    pub fn to_html(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Style-row notation `&HAABBGGRR` with inverted alpha
    #[must_use]
    pub fn to_ass_style_hex(self) -> String {
        format!(
            "&H{:02X}{:02X}{:02X}{:02X}",
            255 - self.a,
            self.b,
            self.g,
            self.r
        )
    }

    /// Override-tag notation `&HBBGGRR&` (alpha is written separately)
    #[must_use]
    pub fn to_ass_tag_hex(self) -> String {
        format!("&H{:02X}{:02X}{:02X}&", self.b, self.g, self.r)
    }

    /// Parse `#RRGGBB` or `#AARRGGBB`
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidColor`] if the string is not one of those forms.
    pub fn from_html(value: &str) -> Result<Self> {
        let hex = value
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| CoreError::invalid_color(value))?;
        let parsed =
            u32::from_str_radix(hex, 16).map_err(|_| CoreError::invalid_color(value))?;
        let channel = |shift: u32| ((parsed >> shift) & 0xFF) as u8;
        match hex.len() {
            6 => Ok(Self::from_rgb(channel(16), channel(8), channel(0))),
            8 => Ok(Self::from_argb(
                channel(24),
                channel(16),
                channel(8),
                channel(0),
            )),
            _ => Err(CoreError::invalid_color(value)),
        }
    }

    /// `#AARRGGBB` notation used by the style options file
    #[must_use]
    pub fn to_html_argb(self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html_argb())
    }
}
