//! Color tag handlers
//!
//! Colors are written as `&HBBGGRR&`. Setting a color keeps the channel's
//! current alpha; an empty argument restores the current style's color.
//! Every color tag cancels pending transforms of the same channel.
//!
//! # Supported Tags
//!
//! - `c` / `1c`: Text color
//! - `2c`: Secondary (karaoke) color
//! - `3c`: Outline color, which is the background box or the glow
//! - `4c`: Shadow color

use super::{TagHandler, TagResult};
use crate::ass::interpreter::TagContext;
use crate::model::{AnimationKind, ShadowType};
use crate::style::AssStyle;
use crate::utils::{parse_color, Color};

/// Whether the `4c`/`4a` family drives a shadow kind of `style`
///
/// A glow created from a regular outline belongs to `3c`/`3a` instead.
pub(crate) fn is_shadow_channel(style: &AssStyle, shadow_type: ShadowType) -> bool {
    shadow_type != ShadowType::Glow || !style.has_outline() || style.has_outline_box()
}

/// Handler for the text color (`\c`, `\1c`)
pub struct ForeColorTagHandler {
    name: &'static str,
}

impl ForeColorTagHandler {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl TagHandler for ForeColorTagHandler {
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        ctx.section.fore_color = if arg.is_empty() {
            ctx.style.primary_color
        } else {
            parse_color(arg, ctx.section.fore_color.a)
        };
        ctx.section
            .remove_animations(|kind| matches!(kind, AnimationKind::ForeColor { .. }));
        TagResult::Processed
    }
}

/// Handler for the secondary color (`\2c`)
pub struct SecondaryColorTagHandler;

impl TagHandler for SecondaryColorTagHandler {
    fn name(&self) -> &'static str {
        "2c"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        ctx.section.secondary_color = if arg.is_empty() {
            ctx.style.secondary_color
        } else {
            parse_color(arg, ctx.section.secondary_color.a)
        };
        ctx.section
            .remove_animations(|kind| matches!(kind, AnimationKind::SecondaryColor { .. }));
        TagResult::Processed
    }
}

/// Handler for the outline color (`\3c`)
pub struct OutlineColorTagHandler;

impl TagHandler for OutlineColorTagHandler {
    fn name(&self) -> &'static str {
        "3c"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        if !ctx.style.has_outline() {
            return TagResult::Ignored;
        }

        let section = &mut ctx.section;
        if ctx.style.outline_is_box {
            section.back_color = if arg.is_empty() {
                ctx.style.outline_color
            } else {
                parse_color(arg, section.back_color.a)
            };
            section.remove_animations(|kind| matches!(kind, AnimationKind::BackColor { .. }));
        } else {
            let current = section
                .shadow_colors
                .get(&ShadowType::Glow)
                .copied()
                .unwrap_or(Color::EMPTY);
            let glow = if arg.is_empty() {
                ctx.style.outline_color
            } else {
                parse_color(arg, current.a)
            };
            section.shadow_colors.insert(ShadowType::Glow, glow);
            section.remove_animations(|kind| matches!(kind, AnimationKind::ShadowColor { .. }));
        }
        TagResult::Processed
    }
}

/// Handler for the shadow color (`\4c`)
pub struct ShadowColorTagHandler;

impl TagHandler for ShadowColorTagHandler {
    fn name(&self) -> &'static str {
        "4c"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        if !ctx.style.has_shadow() {
            return TagResult::Ignored;
        }

        let style = ctx.style;
        for (shadow_type, color) in &mut ctx.section.shadow_colors {
            if is_shadow_channel(style, *shadow_type) {
                *color = if arg.is_empty() {
                    style.shadow_color
                } else {
                    parse_color(arg, color.a)
                };
            }
        }
        ctx.section
            .remove_animations(|kind| matches!(kind, AnimationKind::ShadowColor { .. }));
        TagResult::Processed
    }
}

/// Create all color handlers
#[must_use]
pub fn create_color_handlers() -> Vec<Box<dyn TagHandler>> {
    vec![
        Box::new(ForeColorTagHandler::new("c")),
        Box::new(ForeColorTagHandler::new("1c")),
        Box::new(SecondaryColorTagHandler),
        Box::new(OutlineColorTagHandler),
        Box::new(ShadowColorTagHandler),
    ]
}
