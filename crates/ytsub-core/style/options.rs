//! Per-style rendering options loaded from TOML
//!
//! ```toml
//! [[style]]
//! name = "Karaoke"
//! shadow_types = ["glow", "soft_shadow"]
//! karaoke = true
//! current_word_text_color = "#FFFF00"
//! ```
//!
//! A built-in list is embedded in the library. User lists are merged on top
//! of it so that user entries win by name.

use super::AssStyle;
use crate::model::ShadowType;
use crate::utils::{Color, CoreError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

const DEFAULT_STYLE_OPTIONS: &str = include_str!("../ass/resources/default_style_options.toml");

bitflags::bitflags! {
    /// Edge effects a style's shadow is rendered as
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShadowTypes: u8 {
        const GLOW = 1 << 0;
        const HARD_SHADOW = 1 << 1;
        const SOFT_SHADOW = 1 << 2;
        const BEVEL = 1 << 3;
    }
}

impl ShadowTypes {
    /// Flag for a single shadow kind
    #[must_use]
    pub const fn from_shadow_type(shadow_type: ShadowType) -> Self {
        match shadow_type {
            ShadowType::Glow => Self::GLOW,
            ShadowType::HardShadow => Self::HARD_SHADOW,
            ShadowType::SoftShadow => Self::SOFT_SHADOW,
            ShadowType::Bevel => Self::BEVEL,
        }
    }

    /// Contained shadow kinds in map order
    pub fn shadow_types(self) -> impl Iterator<Item = ShadowType> {
        [
            ShadowType::Glow,
            ShadowType::Bevel,
            ShadowType::HardShadow,
            ShadowType::SoftShadow,
        ]
        .into_iter()
        .filter(move |t| self.contains(Self::from_shadow_type(*t)))
    }
}

impl FromIterator<ShadowType> for ShadowTypes {
    fn from_iter<I: IntoIterator<Item = ShadowType>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |acc, t| acc | Self::from_shadow_type(t))
    }
}

/// Rendering preferences for one named style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleOptions {
    pub name: String,
    pub shadow_types: ShadowTypes,
    /// Whether the current-word colors below are used for karaoke
    pub is_karaoke: bool,
    pub current_word_text_color: Option<Color>,
    pub current_word_outline_color: Option<Color>,
    pub current_word_shadow_color: Option<Color>,
}

impl StyleOptions {
    /// Options derived from a style row: glow for a non-box outline, soft
    /// shadow for a shadow
    #[must_use]
    pub fn for_style(style: &AssStyle) -> Self {
        let mut shadow_types = ShadowTypes::empty();
        if style.has_outline() && !style.has_outline_box() {
            shadow_types |= ShadowTypes::GLOW;
        }
        if style.has_shadow() {
            shadow_types |= ShadowTypes::SOFT_SHADOW;
        }

        Self {
            name: style.name.clone(),
            shadow_types,
            is_karaoke: false,
            current_word_text_color: None,
            current_word_outline_color: None,
            current_word_shadow_color: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ShadowTypeName {
    Glow,
    HardShadow,
    SoftShadow,
    Bevel,
}

impl From<ShadowTypeName> for ShadowType {
    fn from(name: ShadowTypeName) -> Self {
        match name {
            ShadowTypeName::Glow => Self::Glow,
            ShadowTypeName::HardShadow => Self::HardShadow,
            ShadowTypeName::SoftShadow => Self::SoftShadow,
            ShadowTypeName::Bevel => Self::Bevel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StyleOptionsEntry {
    name: String,
    #[serde(default)]
    shadow_types: Vec<ShadowTypeName>,
    #[serde(default)]
    karaoke: bool,
    current_word_text_color: Option<String>,
    current_word_outline_color: Option<String>,
    current_word_shadow_color: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StyleOptionsFile {
    #[serde(default)]
    style: Vec<StyleOptionsEntry>,
}

fn parse_optional_color(value: Option<String>) -> Result<Option<Color>> {
    value.map(|v| Color::from_html(&v)).transpose()
}

impl TryFrom<StyleOptionsEntry> for StyleOptions {
    type Error = CoreError;

    fn try_from(entry: StyleOptionsEntry) -> Result<Self> {
        Ok(Self {
            name: entry.name,
            shadow_types: entry.shadow_types.into_iter().map(ShadowType::from).collect(),
            is_karaoke: entry.karaoke,
            current_word_text_color: parse_optional_color(entry.current_word_text_color)?,
            current_word_outline_color: parse_optional_color(entry.current_word_outline_color)?,
            current_word_shadow_color: parse_optional_color(entry.current_word_shadow_color)?,
        })
    }
}

/// Style options keyed by style name, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleOptionsList {
    options: Vec<StyleOptions>,
}

impl StyleOptionsList {
    /// Parse a TOML options document
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] for malformed TOML, unknown keys or
    /// shadow names, and [`CoreError::InvalidColor`] for bad colors.
    pub fn from_toml(text: &str) -> Result<Self> {
        let file: StyleOptionsFile = toml::from_str(text)?;
        let mut list = Self::default();
        for entry in file.style {
            list.insert(StyleOptions::try_from(entry)?);
        }
        Ok(list)
    }

    /// Read a TOML options file
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or any error of
    /// [`Self::from_toml`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let list = Self::from_toml(&text)?;
        debug!(path = %path.display(), count = list.len(), "loaded style options");
        Ok(list)
    }

    /// The embedded options for the built-in styles
    ///
    /// # Errors
    ///
    /// Fails only if the embedded resource is malformed.
    pub fn builtin() -> Result<Self> {
        Self::from_toml(DEFAULT_STYLE_OPTIONS)
    }

    /// Built-in options with `user` merged on top
    ///
    /// # Errors
    ///
    /// Fails only if the embedded resource is malformed.
    pub fn with_builtin_defaults(user: Option<Self>) -> Result<Self> {
        let mut merged = Self::builtin()?;
        if let Some(user) = user {
            merged.merge(user);
        }
        Ok(merged)
    }

    /// Add or replace the options for a style name
    pub fn insert(&mut self, options: StyleOptions) {
        if let Some(existing) = self.options.iter_mut().find(|o| o.name == options.name) {
            *existing = options;
        } else {
            self.options.push(options);
        }
    }

    /// Merge `other` into this list, `other` winning on conflicts
    pub fn merge(&mut self, other: Self) {
        for options in other.options {
            self.insert(options);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StyleOptions> {
        self.options.iter().find(|o| o.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleOptions> {
        self.options.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_entries() {
        let list = StyleOptionsList::from_toml(
            r##"
            [[style]]
            name = "Karaoke"
            shadow_types = ["glow", "bevel"]
            karaoke = true
            current_word_text_color = "#FFFF00"
            current_word_outline_color = "#80FF0000"
            "##,
        )
        .unwrap();

        let options = list.get("Karaoke").unwrap();
        assert_eq!(options.shadow_types, ShadowTypes::GLOW | ShadowTypes::BEVEL);
        assert!(options.is_karaoke);
        assert_eq!(
            options.current_word_text_color,
            Some(Color::from_rgb(255, 255, 0))
        );
        assert_eq!(
            options.current_word_outline_color,
            Some(Color::from_argb(0x80, 255, 0, 0))
        );
        assert_eq!(options.current_word_shadow_color, None);
    }

    #[test]
    fn rejects_unknown_shadow_type() {
        let err = StyleOptionsList::from_toml(
            "[[style]]\nname = \"A\"\nshadow_types = [\"sparkle\"]\n",
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn rejects_bad_color() {
        let err = StyleOptionsList::from_toml(
            "[[style]]\nname = \"A\"\ncurrent_word_text_color = \"yellow\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidColor(_)));
    }

    #[test]
    fn user_options_override_builtin() {
        let builtin = StyleOptionsList::builtin().unwrap();
        assert!(!builtin.is_empty());
        let name = builtin.iter().next().unwrap().name.clone();

        let user = StyleOptionsList::from_toml(&format!(
            "[[style]]\nname = \"{name}\"\nshadow_types = [\"hard_shadow\"]\n"
        ))
        .unwrap();
        let merged = StyleOptionsList::with_builtin_defaults(Some(user)).unwrap();

        assert_eq!(merged.len(), builtin.len());
        assert_eq!(
            merged.get(&name).unwrap().shadow_types,
            ShadowTypes::HARD_SHADOW
        );
    }

    #[test]
    fn derived_from_style() {
        let style = AssStyle::default();
        let options = StyleOptions::for_style(&style);
        assert_eq!(
            options.shadow_types,
            ShadowTypes::GLOW | ShadowTypes::SOFT_SHADOW
        );
        assert_eq!(
            options.shadow_types.shadow_types().collect::<Vec<_>>(),
            vec![ShadowType::Glow, ShadowType::SoftShadow]
        );
    }
}
