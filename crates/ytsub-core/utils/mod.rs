//! Utility functions and shared types for the subtitle compiler
//!
//! Contains the color and time primitives used by every pipeline stage, the
//! error types, and the lenient argument parsers shared by the override tag
//! handlers.
//!
//! # Lenient parsing
//!
//! Override tag arguments are parsed the way renderers do: malformed input
//! degrades to a neutral value instead of failing. The `try_*` helpers return
//! `None` so that a handler can leave its property untouched, while
//! [`parse_hex`] and [`parse_float_list`] fall back to zero.
//!
//! # Example
//!
//! ```rust
//! use ytsub_core::utils::{parse_color, parse_float_list};
//!
//! let red = parse_color("&H0000FF&", 255);
//! assert_eq!((red.r, red.g, red.b), (255, 0, 0));
//! assert_eq!(parse_float_list("(10, 20.5)"), Some(vec![10.0, 20.5]));
//! ```

use core::fmt;

pub mod char_range;
pub mod color;
pub mod errors;
pub mod hashers;
pub mod time;

pub use char_range::{glitch_alphabet, is_right_to_left, CharRange};
pub use color::Color;
pub use errors::{CoreError, Result};
pub use time::TimeRange;

/// Parse a style-row color (`&HAABBGGRR`, alpha stored as transparency)
///
/// # Example
///
/// ```rust
/// # use ytsub_core::utils::parse_style_color;
/// let color = parse_style_color("&H800000FF")?;
/// assert_eq!((color.a, color.r, color.g, color.b), (0x7F, 0xFF, 0, 0));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// # Errors
///
/// Returns [`CoreError::InvalidColor`] unless the value is `&H` followed by
/// exactly eight hex digits.
pub fn parse_style_color(color_str: &str) -> Result<Color> {
    let trimmed = color_str.trim();
    let hex_part = trimmed
        .strip_prefix("&H")
        .filter(|hex| hex.len() == 8)
        .ok_or_else(|| CoreError::invalid_color(color_str))?;

    let abgr = u32::from_str_radix(hex_part, 16)
        .map_err(|_| CoreError::invalid_color(color_str))?;

    Ok(Color::from_argb(
        255 - (abgr >> 24) as u8,
        (abgr & 0xFF) as u8,
        ((abgr >> 8) & 0xFF) as u8,
        ((abgr >> 16) & 0xFF) as u8,
    ))
}

/// Parse numeric value from a document field with validation
///
/// # Errors
///
/// Returns an error if the string cannot be parsed as the target numeric type.
pub fn parse_numeric<T>(value_str: &str) -> Result<T>
where
    T: core::str::FromStr,
    T::Err: fmt::Display,
{
    value_str
        .trim()
        .parse::<T>()
        .map_err(|e| CoreError::invalid_numeric(value_str, &e.to_string()))
}

fn strip_tag_punctuation(arg: &str) -> String {
    arg.chars()
        .filter(|c| !matches!(c, '(' | ')' | ' '))
        .collect()
}

/// Parse an integer tag argument, ignoring parentheses and spaces
#[must_use]
pub fn try_parse_int(arg: &str) -> Option<i32> {
    strip_tag_punctuation(arg).parse().ok()
}

/// Parse an integer tag argument, zero when malformed
#[must_use]
pub fn parse_int(arg: &str) -> i32 {
    try_parse_int(arg).unwrap_or(0)
}

/// Parse a decimal tag argument, ignoring parentheses and spaces
#[must_use]
pub fn try_parse_float(arg: &str) -> Option<f32> {
    strip_tag_punctuation(arg)
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Parse a hex tag argument such as `&H80&`, zero when malformed
///
/// Only the uppercase `H` marker is recognized.
#[must_use]
pub fn parse_hex(arg: &str) -> u32 {
    let digits: String = arg
        .chars()
        .filter(|c| !matches!(c, '&' | 'H' | '(' | ')'))
        .collect();
    u32::from_str_radix(digits.trim(), 16).unwrap_or(0)
}

/// Split a parenthesized argument list on commas
///
/// A blank argument yields an empty list; an argument that does not start
/// with `(` yields `None`.
#[must_use]
pub fn parse_string_list(arg: &str) -> Option<Vec<String>> {
    let trimmed = arg.trim();
    if trimmed.is_empty() {
        return Some(Vec::new());
    }
    if !trimmed.starts_with('(') {
        return None;
    }

    let inner: String = trimmed.chars().filter(|c| !matches!(c, '(' | ')')).collect();
    Some(inner.split(',').map(|item| item.trim().to_string()).collect())
}

/// Parse a parenthesized list of numbers; malformed items become zero
#[must_use]
pub fn parse_float_list(arg: &str) -> Option<Vec<f32>> {
    parse_string_list(arg).map(|items| {
        items
            .iter()
            .map(|item| try_parse_float(item).unwrap_or(0.0))
            .collect()
    })
}

/// Parse an override-tag color (`&HBBGGRR&`) with the given alpha
#[must_use]
pub fn parse_color(arg: &str, alpha: u8) -> Color {
    let bgr = parse_hex(arg);
    Color::from_argb(
        alpha,
        (bgr & 0xFF) as u8,
        ((bgr >> 8) & 0xFF) as u8,
        ((bgr >> 16) & 0xFF) as u8,
    )
}

/// Parse an alpha tag argument into an opacity (`255 - (hex & 255)`)
#[must_use]
pub fn parse_opacity(arg: &str) -> u8 {
    255 - (parse_hex(arg) & 0xFF) as u8
}
