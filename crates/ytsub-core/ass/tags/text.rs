//! Style reset, text direction, offset and ruby tag handlers

use super::{TagHandler, TagResult, TagScope};
use crate::ass::interpreter::TagContext;
use crate::model::{HorizontalTextDirection, OffsetType, RubyPosition, VerticalTextType};

/// Direction and vertical layout for a `\ytvert` value
///
/// 9 and 7 stack characters right-to-left / left-to-right, 1 and 3 rotate
/// the text; anything else is horizontal.
#[must_use]
pub const fn vertical_text_type(id: i32) -> (HorizontalTextDirection, VerticalTextType) {
    match id {
        9 => (HorizontalTextDirection::RightToLeft, VerticalTextType::Positioned),
        7 => (HorizontalTextDirection::LeftToRight, VerticalTextType::Positioned),
        1 => (HorizontalTextDirection::LeftToRight, VerticalTextType::Rotated),
        3 => (HorizontalTextDirection::RightToLeft, VerticalTextType::Rotated),
        _ => (HorizontalTextDirection::LeftToRight, VerticalTextType::None),
    }
}

/// `\ytvert` value for a layout, 0 for horizontal text
#[must_use]
pub const fn vertical_text_type_id(direction: HorizontalTextDirection, vertical: VerticalTextType) -> i32 {
    match (direction, vertical) {
        (HorizontalTextDirection::LeftToRight, VerticalTextType::Positioned) => 7,
        (HorizontalTextDirection::LeftToRight, VerticalTextType::Rotated) => 1,
        (HorizontalTextDirection::RightToLeft, VerticalTextType::Positioned) => 9,
        (HorizontalTextDirection::RightToLeft, VerticalTextType::Rotated) => 3,
        (_, VerticalTextType::None) => 0,
    }
}

/// Handler for style reset (`\r`, `\rStyle`)
pub struct ResetTagHandler;

impl TagHandler for ResetTagHandler {
    fn name(&self) -> &'static str {
        "r"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        ctx.reset_style(arg);
        ctx.section.offset = OffsetType::Regular;
        ctx.section.ruby_position = RubyPosition::None;
        ctx.section.animations.clear();
        TagResult::Processed
    }
}

/// Handler for vertical text (`\ytvert`)
pub struct VerticalTextTagHandler;

impl TagHandler for VerticalTextTagHandler {
    fn name(&self) -> &'static str {
        "ytvert"
    }

    fn scope(&self) -> TagScope {
        TagScope::Line
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        let id = arg.parse().unwrap_or(9);
        (ctx.line.horizontal_text_direction, ctx.line.vertical_text_type) = vertical_text_type(id);
        TagResult::Processed
    }
}

/// Handler for horizontal text direction (`\ytdir`, 4 is right-to-left)
pub struct TextDirectionTagHandler;

impl TagHandler for TextDirectionTagHandler {
    fn name(&self) -> &'static str {
        "ytdir"
    }

    fn scope(&self) -> TagScope {
        TagScope::Line
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        ctx.line.horizontal_text_direction = if arg.parse::<i32>() == Ok(4) {
            HorizontalTextDirection::RightToLeft
        } else {
            HorizontalTextDirection::LeftToRight
        };
        TagResult::Processed
    }
}

/// Handler for the offset tags (`\ytsub`, `\ytsup`, `\ytsur`)
pub struct OffsetTagHandler {
    name: &'static str,
    offset: OffsetType,
}

impl OffsetTagHandler {
    #[must_use]
    pub const fn new(name: &'static str, offset: OffsetType) -> Self {
        Self { name, offset }
    }
}

impl TagHandler for OffsetTagHandler {
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle(&self, ctx: &mut TagContext<'_>, _arg: &str) -> TagResult {
        ctx.section.offset = self.offset;
        TagResult::Processed
    }
}

/// Handler for character packing (`\ytpack`)
pub struct PackTagHandler;

impl TagHandler for PackTagHandler {
    fn name(&self) -> &'static str {
        "ytpack"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        ctx.section.packed = arg != "0";
        TagResult::Processed
    }
}

/// Handler for ruby markup (`\ytruby`, 2 places the annotation below)
pub struct RubyTagHandler;

impl TagHandler for RubyTagHandler {
    fn name(&self) -> &'static str {
        "ytruby"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        ctx.section.ruby_position = if arg.parse::<i32>() == Ok(2) {
            RubyPosition::Below
        } else {
            RubyPosition::Above
        };
        TagResult::Processed
    }
}

/// Create all text handlers
#[must_use]
pub fn create_text_handlers() -> Vec<Box<dyn TagHandler>> {
    vec![
        Box::new(ResetTagHandler),
        Box::new(VerticalTextTagHandler),
        Box::new(TextDirectionTagHandler),
        Box::new(OffsetTagHandler::new("ytsub", OffsetType::Subscript)),
        Box::new(OffsetTagHandler::new("ytsup", OffsetType::Superscript)),
        Box::new(OffsetTagHandler::new("ytsur", OffsetType::Regular)),
        Box::new(PackTagHandler),
        Box::new(RubyTagHandler),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ass::tags::test_stylesheet;
    use crate::model::{Animation, AnimationKind, Line};
    use crate::utils::Color;

    #[test]
    fn vertical_ids_round_trip() {
        for id in [1, 3, 7, 9] {
            let (direction, vertical) = vertical_text_type(id);
            assert_eq!(vertical_text_type_id(direction, vertical), id);
        }
        assert_eq!(
            vertical_text_type(5),
            (HorizontalTextDirection::LeftToRight, VerticalTextType::None)
        );
    }

    #[test]
    fn vertical_defaults_to_right_to_left() {
        let sheet = test_stylesheet();
        let mut ctx = TagContext::new(&sheet, sheet.default_style(), Line::new(0, 1000));
        VerticalTextTagHandler.handle(&mut ctx, "");
        assert_eq!(ctx.line.vertical_text_type, VerticalTextType::Positioned);
        assert_eq!(
            ctx.line.horizontal_text_direction,
            HorizontalTextDirection::RightToLeft
        );

        TextDirectionTagHandler.handle(&mut ctx, "6");
        assert_eq!(
            ctx.line.horizontal_text_direction,
            HorizontalTextDirection::LeftToRight
        );
    }

    #[test]
    fn reset_clears_offset_ruby_and_animations() {
        let sheet = test_stylesheet();
        let mut ctx = TagContext::new(&sheet, sheet.default_style(), Line::new(0, 1000));
        ctx.section.offset = OffsetType::Subscript;
        ctx.section.ruby_position = RubyPosition::Below;
        ctx.section.fore_color = Color::BLACK;
        ctx.section.animations.push(Animation::new(
            0,
            10,
            AnimationKind::Scale { from: 1.0, to: 2.0 },
        ));

        ResetTagHandler.handle(&mut ctx, "Box");
        assert_eq!(ctx.style.name, "Box");
        assert_eq!(ctx.section.offset, OffsetType::Regular);
        assert_eq!(ctx.section.ruby_position, RubyPosition::None);
        assert_eq!(ctx.section.fore_color, Color::WHITE);
        assert!(ctx.section.animations.is_empty());

        ResetTagHandler.handle(&mut ctx, "");
        assert_eq!(ctx.style.name, "Default");
    }

    #[test]
    fn pack_and_ruby() {
        let sheet = test_stylesheet();
        let mut ctx = TagContext::new(&sheet, sheet.default_style(), Line::new(0, 1000));
        PackTagHandler.handle(&mut ctx, "");
        assert!(ctx.section.packed);
        PackTagHandler.handle(&mut ctx, "0");
        assert!(!ctx.section.packed);

        RubyTagHandler.handle(&mut ctx, "2");
        assert_eq!(ctx.section.ruby_position, RubyPosition::Below);
        RubyTagHandler.handle(&mut ctx, "8");
        assert_eq!(ctx.section.ruby_position, RubyPosition::Above);
    }
}
