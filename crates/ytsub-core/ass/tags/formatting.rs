//! Font and text flag tag handlers
//!
//! # Supported Tags
//!
//! - `b`: Bold (0/1, or any font weight)
//! - `i`: Italic (0/1)
//! - `u`: Underline (0/1)
//! - `fn`: Font family
//! - `fs`: Font size, stored as a scale relative to the default style

use super::{TagHandler, TagResult};
use crate::ass::interpreter::TagContext;
use crate::utils::{try_parse_float, try_parse_int};

/// Resolve a flag argument
///
/// Empty restores the initial style's value, `0`/`1` switch the flag,
/// other integers restore the initial value (or mean bold for weights),
/// and unparsable input switches the flag off.
fn flag_value(arg: &str, initial: bool, accept_weight: bool) -> (bool, TagResult) {
    if arg.is_empty() {
        return (initial, TagResult::Processed);
    }
    match try_parse_int(arg) {
        None => (false, TagResult::Failed(format!("'{arg}' is not an integer"))),
        Some(0) => (false, TagResult::Processed),
        Some(1) => (true, TagResult::Processed),
        Some(_) if accept_weight => (true, TagResult::Processed),
        Some(_) => (initial, TagResult::Processed),
    }
}

/// Handler for bold (`\b`)
pub struct BoldTagHandler;

impl TagHandler for BoldTagHandler {
    fn name(&self) -> &'static str {
        "b"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        let (value, result) = flag_value(arg, ctx.initial_style.bold, true);
        ctx.section.bold = value;
        result
    }
}

/// Handler for italic (`\i`)
pub struct ItalicTagHandler;

impl TagHandler for ItalicTagHandler {
    fn name(&self) -> &'static str {
        "i"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        let (value, result) = flag_value(arg, ctx.initial_style.italic, false);
        ctx.section.italic = value;
        result
    }
}

/// Handler for underline (`\u`)
pub struct UnderlineTagHandler;

impl TagHandler for UnderlineTagHandler {
    fn name(&self) -> &'static str {
        "u"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        let (value, result) = flag_value(arg, ctx.initial_style.underline, false);
        ctx.section.underline = value;
        result
    }
}

/// Handler for font family (`\fn`)
pub struct FontNameTagHandler;

impl TagHandler for FontNameTagHandler {
    fn name(&self) -> &'static str {
        "fn"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        let font = if arg.is_empty() { ctx.style.font.as_str() } else { arg };
        ctx.section.font = Some(font.to_string());
        TagResult::Processed
    }
}

/// Handler for font size (`\fs`)
pub struct FontSizeTagHandler;

impl TagHandler for FontSizeTagHandler {
    fn name(&self) -> &'static str {
        "fs"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        let (line_height, result) = match try_parse_float(arg) {
            Some(size) => (size, TagResult::Processed),
            None if arg.is_empty() => (ctx.style.line_height, TagResult::Processed),
            None => (
                ctx.style.line_height,
                TagResult::Failed(format!("'{arg}' is not a font size")),
            ),
        };
        ctx.section.scale = line_height / ctx.default_line_height();
        result
    }
}

/// Create all formatting handlers
#[must_use]
pub fn create_formatting_handlers() -> Vec<Box<dyn TagHandler>> {
    vec![
        Box::new(BoldTagHandler),
        Box::new(ItalicTagHandler),
        Box::new(UnderlineTagHandler),
        Box::new(FontNameTagHandler),
        Box::new(FontSizeTagHandler),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ass::tags::test_stylesheet;
    use crate::model::Line;

    #[test]
    fn bold_values() {
        let sheet = test_stylesheet();
        let mut ctx = TagContext::new(&sheet, sheet.default_style(), Line::new(0, 1000));

        assert_eq!(BoldTagHandler.handle(&mut ctx, "1"), TagResult::Processed);
        assert!(ctx.section.bold);
        BoldTagHandler.handle(&mut ctx, "0");
        assert!(!ctx.section.bold);
        BoldTagHandler.handle(&mut ctx, "700");
        assert!(ctx.section.bold);
        BoldTagHandler.handle(&mut ctx, "");
        assert!(!ctx.section.bold);
        assert!(matches!(
            BoldTagHandler.handle(&mut ctx, "heavy"),
            TagResult::Failed(_)
        ));
    }

    #[test]
    fn italic_other_integers_restore_initial() {
        let sheet = test_stylesheet();
        let mut ctx = TagContext::new(&sheet, sheet.default_style(), Line::new(0, 1000));
        ItalicTagHandler.handle(&mut ctx, "1");
        assert!(ctx.section.italic);
        ItalicTagHandler.handle(&mut ctx, "5");
        assert!(!ctx.section.italic);
        UnderlineTagHandler.handle(&mut ctx, "(1)");
        assert!(ctx.section.underline);
    }

    #[test]
    fn font_name_and_size() {
        let sheet = test_stylesheet();
        let mut ctx = TagContext::new(&sheet, sheet.default_style(), Line::new(0, 1000));

        FontNameTagHandler.handle(&mut ctx, "Comic Sans MS");
        assert_eq!(ctx.section.font.as_deref(), Some("Comic Sans MS"));
        FontNameTagHandler.handle(&mut ctx, "");
        assert_eq!(ctx.section.font.as_deref(), Some("Arial"));

        FontSizeTagHandler.handle(&mut ctx, "40");
        assert_eq!(ctx.section.scale, 2.0);
        assert!(matches!(
            FontSizeTagHandler.handle(&mut ctx, "big"),
            TagResult::Failed(_)
        ));
        assert_eq!(ctx.section.scale, 1.0);
    }

    #[test]
    fn creates_five_handlers() {
        assert_eq!(create_formatting_handlers().len(), 5);
    }
}
