//! Override tag handlers
//!
//! Every tag the interpreter understands is a small [`TagHandler`]
//! implementation. Handlers mutate the [`TagContext`] of the dialogue line
//! being interpreted and never fail hard: a malformed argument leaves the
//! affected property unchanged and reports [`TagResult::Failed`], which the
//! interpreter only logs.
//!
//! # Modules
//!
//! - [`formatting`] - Font and flag tags (`\b`, `\i`, `\u`, `\fn`, `\fs`)
//! - [`color`] - Color tags (`\c`, `\1c`-`\4c`)
//! - [`alpha`] - Transparency tags (`\alpha`, `\1a`-`\4a`)
//! - [`position`] - Line placement and fades (`\pos`, `\an`, `\move`, `\fad`, `\fade`)
//! - [`karaoke`] - Karaoke timing and strategy (`\k`, `\ytkt`)
//! - [`transform`] - Animated transforms (`\t`)
//! - [`effects`] - Post-processing effects (`\ytshake`, `\ytchroma`)
//! - [`text`] - Reset, direction, offset and ruby tags
//!
//! # Usage
//!
//! ```rust
//! use ytsub_core::ass::tags::TagRegistry;
//!
//! let registry = TagRegistry::with_builtin_handlers().unwrap();
//! assert!(registry.get("pos").is_some());
//! assert!(registry.get("frz").is_none());
//! ```

pub mod alpha;
pub mod color;
pub mod effects;
pub mod formatting;
pub mod karaoke;
pub mod position;
pub mod text;
pub mod transform;

pub use effects::{ChromaEffect, PostProcessor};

use crate::ass::interpreter::TagContext;
use crate::utils::hashers::create_hash_map_with_capacity;
use crate::utils::{CoreError, Result};
use ahash::RandomState;
use std::collections::HashMap;

/// Whether a tag affects the section being built or the whole line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagScope {
    /// Applies from its position onwards, may repeat
    #[default]
    Section,
    /// Applies to the whole line, only the first occurrence counts
    Line,
}

/// Outcome of handling one tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagResult {
    /// The context was updated
    Processed,
    /// The tag does not apply in this context (e.g. `\3c` without outline)
    Ignored,
    /// The argument was malformed, the context is unchanged
    Failed(String),
}

/// Handler for one override tag name
pub trait TagHandler: Send + Sync {
    /// Tag name without the leading backslash
    fn name(&self) -> &'static str;

    /// Scope of the tag, section by default
    fn scope(&self) -> TagScope {
        TagScope::Section
    }

    /// Apply the tag with its trimmed argument to the context
    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult;
}

/// Tag name to handler lookup
pub struct TagRegistry {
    handlers: HashMap<&'static str, Box<dyn TagHandler>, RandomState>,
}

impl TagRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: create_hash_map_with_capacity(48),
        }
    }

    /// Registry holding every built-in handler
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if two built-in handlers share a
    /// name.
    pub fn with_builtin_handlers() -> Result<Self> {
        let mut registry = Self::new();
        let groups = [
            formatting::create_formatting_handlers(),
            color::create_color_handlers(),
            alpha::create_alpha_handlers(),
            position::create_position_handlers(),
            karaoke::create_karaoke_handlers(),
            transform::create_transform_handlers(),
            effects::create_effect_handlers(),
            text::create_text_handlers(),
        ];
        for handler in groups.into_iter().flatten() {
            registry.register(handler)?;
        }
        Ok(registry)
    }

    /// Add a handler
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if a handler with the same name is
    /// already registered.
    pub fn register(&mut self, handler: Box<dyn TagHandler>) -> Result<()> {
        let name = handler.name();
        if self.handlers.contains_key(name) {
            return Err(CoreError::Validation(format!(
                "Tag handler '{name}' already registered"
            )));
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn TagHandler> {
        self.handlers.get(name).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut names: Vec<&str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        f.debug_struct("TagRegistry").field("handlers", &names).finish()
    }
}

/// Stylesheet with an outlined, shadowed `Default` style (line height 20)
/// and a `Box` style with a background box
#[cfg(test)]
pub(crate) fn test_stylesheet() -> crate::ass::interpreter::Stylesheet {
    use crate::model::Size;
    use crate::style::{AssStyle, StyleOptionsList};
    use crate::utils::Color;

    let boxed = AssStyle {
        name: "Box".to_string(),
        outline_is_box: true,
        outline_color: Color::from_argb(192, 8, 8, 8),
        shadow_distance: 0.0,
        ..AssStyle::default()
    };
    crate::ass::interpreter::Stylesheet::new(
        Size::new(1280, 720),
        vec![AssStyle::default(), boxed],
        StyleOptionsList::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DummyHandler;

    impl TagHandler for DummyHandler {
        fn name(&self) -> &'static str {
            "b"
        }

        fn handle(&self, _ctx: &mut TagContext<'_>, _arg: &str) -> TagResult {
            TagResult::Ignored
        }
    }

    #[test]
    fn builtin_registry_covers_all_tags() {
        let registry = TagRegistry::with_builtin_handlers().unwrap();
        for name in [
            "b", "i", "u", "fn", "fs", "c", "1c", "2c", "3c", "4c", "alpha", "1a", "2a", "3a",
            "4a", "pos", "an", "move", "fad", "fade", "k", "ytkt", "r", "t", "ytshake",
            "ytchroma", "ytvert", "ytdir", "ytsub", "ytsup", "ytsur", "ytpack", "ytruby",
        ] {
            assert!(registry.get(name).is_some(), "missing handler for {name}");
        }
        assert_eq!(registry.len(), 33);
    }

    #[test]
    fn line_scoped_tags() {
        let registry = TagRegistry::with_builtin_handlers().unwrap();
        for name in ["pos", "an", "move", "fad", "fade", "ytkt", "ytchroma", "ytvert", "ytdir"] {
            assert_eq!(registry.get(name).unwrap().scope(), TagScope::Line, "{name}");
        }
        for name in ["b", "c", "k", "r", "t", "ytshake", "ytruby"] {
            assert_eq!(registry.get(name).unwrap().scope(), TagScope::Section, "{name}");
        }
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = TagRegistry::with_builtin_handlers().unwrap();
        let err = registry.register(Box::new(DummyHandler)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn empty_registry() {
        let registry = TagRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.get("b").is_none());
    }
}
