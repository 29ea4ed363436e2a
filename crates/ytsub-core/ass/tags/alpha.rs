//! Transparency tag handlers
//!
//! Alpha tags carry transparency (`&H00&` is opaque), stored as opacity
//! `255 - (value & 255)`. An empty argument restores the style's opacity for
//! the channel.

use super::color::is_shadow_channel;
use super::{TagHandler, TagResult};
use crate::ass::interpreter::TagContext;
use crate::model::{AnimationKind, ShadowType};
use crate::utils::parse_opacity;

/// Handler for all channels at once (`\alpha`)
pub struct AlphaTagHandler;

impl TagHandler for AlphaTagHandler {
    fn name(&self) -> &'static str {
        "alpha"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        let alpha = parse_opacity(arg);
        let section = &mut ctx.section;
        section.fore_color = section.fore_color.with_alpha(alpha);
        section.secondary_color = section.secondary_color.with_alpha(alpha);
        if ctx.style.has_outline_box() {
            section.back_color = section.back_color.with_alpha(alpha);
        }
        for color in section.shadow_colors.values_mut() {
            *color = color.with_alpha(alpha);
        }
        section.remove_animations(AnimationKind::is_color);
        TagResult::Processed
    }
}

/// Handler for the text alpha (`\1a`)
pub struct ForeAlphaTagHandler;

impl TagHandler for ForeAlphaTagHandler {
    fn name(&self) -> &'static str {
        "1a"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        let alpha = if arg.is_empty() {
            ctx.style.primary_color.a
        } else {
            parse_opacity(arg)
        };
        ctx.section.fore_color = ctx.section.fore_color.with_alpha(alpha);
        ctx.section
            .remove_animations(|kind| matches!(kind, AnimationKind::ForeColor { .. }));
        TagResult::Processed
    }
}

/// Handler for the secondary alpha (`\2a`)
pub struct SecondaryAlphaTagHandler;

impl TagHandler for SecondaryAlphaTagHandler {
    fn name(&self) -> &'static str {
        "2a"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        let alpha = if arg.is_empty() {
            ctx.style.secondary_color.a
        } else {
            parse_opacity(arg)
        };
        ctx.section.secondary_color = ctx.section.secondary_color.with_alpha(alpha);
        ctx.section
            .remove_animations(|kind| matches!(kind, AnimationKind::SecondaryColor { .. }));
        TagResult::Processed
    }
}

/// Handler for the outline alpha (`\3a`)
pub struct OutlineAlphaTagHandler;

impl TagHandler for OutlineAlphaTagHandler {
    fn name(&self) -> &'static str {
        "3a"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        if !ctx.style.has_outline() {
            return TagResult::Ignored;
        }

        let alpha = if arg.is_empty() {
            ctx.style.outline_color.a
        } else {
            parse_opacity(arg)
        };
        let section = &mut ctx.section;
        if ctx.style.outline_is_box {
            section.back_color = section.back_color.with_alpha(alpha);
            section.remove_animations(|kind| matches!(kind, AnimationKind::BackColor { .. }));
        } else {
            if let Some(glow) = section.shadow_colors.get_mut(&ShadowType::Glow) {
                *glow = glow.with_alpha(alpha);
            }
            section.remove_animations(|kind| matches!(kind, AnimationKind::ShadowColor { .. }));
        }
        TagResult::Processed
    }
}

/// Handler for the shadow alpha (`\4a`)
pub struct ShadowAlphaTagHandler;

impl TagHandler for ShadowAlphaTagHandler {
    fn name(&self) -> &'static str {
        "4a"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        if !ctx.style.has_shadow() {
            return TagResult::Ignored;
        }

        let style = ctx.style;
        let alpha = if arg.is_empty() {
            style.shadow_color.a
        } else {
            parse_opacity(arg)
        };
        for (shadow_type, color) in &mut ctx.section.shadow_colors {
            if is_shadow_channel(style, *shadow_type) {
                *color = color.with_alpha(alpha);
            }
        }
        ctx.section
            .remove_animations(|kind| matches!(kind, AnimationKind::ShadowColor { .. }));
        TagResult::Processed
    }
}

/// Create all alpha handlers
#[must_use]
pub fn create_alpha_handlers() -> Vec<Box<dyn TagHandler>> {
    vec![
        Box::new(AlphaTagHandler),
        Box::new(ForeAlphaTagHandler),
        Box::new(SecondaryAlphaTagHandler),
        Box::new(OutlineAlphaTagHandler),
        Box::new(ShadowAlphaTagHandler),
    ]
}
