//! Animated transform tag handler (`\t`)
//!
//! `\t([t1,t2,][accel,]modifiers)` animates the section towards the values
//! of the color, alpha and font size tags listed in `modifiers`. Without
//! times the transform spans the whole line.
//!
//! Several transforms over the same interval share one animation per
//! channel, so `\t(\c&H0000FF&\1a&H80&)` produces a single color animation.
//! A transform starting earlier than an existing one cancels it.

use super::color::is_shadow_channel;
use super::{TagHandler, TagResult};
use crate::ass::interpreter::TagContext;
use crate::model::{Animation, AnimationKind, Section, ShadowType};
use crate::utils::{parse_color, parse_opacity, parse_string_list, try_parse_float, try_parse_int, Color};
use regex::Regex;
use std::sync::OnceLock;

fn modifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\\(?P<tag>\d?[a-z]+)(?P<arg>[^\\]*)").expect("transform modifier regex should compile")
    })
}

/// Color property a transform modifier animates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorChannel {
    Fore,
    Secondary,
    Back,
    Shadow(ShadowType),
}

impl ColorChannel {
    /// Whether `kind` animates the same kind of property, ignoring shadow type
    const fn same_kind(self, kind: &AnimationKind) -> bool {
        matches!(
            (self, kind),
            (Self::Fore, AnimationKind::ForeColor { .. })
                | (Self::Secondary, AnimationKind::SecondaryColor { .. })
                | (Self::Back, AnimationKind::BackColor { .. })
                | (Self::Shadow(_), AnimationKind::ShadowColor { .. })
        )
    }

    fn targets(self, kind: &AnimationKind) -> bool {
        match (self, kind) {
            (Self::Shadow(wanted), AnimationKind::ShadowColor { shadow_type, .. }) => wanted == *shadow_type,
            _ => self.same_kind(kind),
        }
    }

    fn current(self, section: &Section) -> Color {
        match self {
            Self::Fore => section.fore_color,
            Self::Secondary => section.secondary_color,
            Self::Back => section.back_color,
            Self::Shadow(shadow_type) => section
                .shadow_colors
                .get(&shadow_type)
                .copied()
                .unwrap_or(Color::EMPTY),
        }
    }

    const fn animation(self, from: Color, to: Color) -> AnimationKind {
        match self {
            Self::Fore => AnimationKind::ForeColor { from, to },
            Self::Secondary => AnimationKind::SecondaryColor { from, to },
            Self::Back => AnimationKind::BackColor { from, to },
            Self::Shadow(shadow_type) => AnimationKind::ShadowColor { shadow_type, from, to },
        }
    }
}

const fn end_color(kind: &AnimationKind) -> Option<Color> {
    match kind {
        AnimationKind::ForeColor { to, .. }
        | AnimationKind::BackColor { to, .. }
        | AnimationKind::SecondaryColor { to, .. }
        | AnimationKind::ShadowColor { to, .. } => Some(*to),
        _ => None,
    }
}

fn target_color(kind: &mut AnimationKind) -> Option<&mut Color> {
    match kind {
        AnimationKind::ForeColor { to, .. }
        | AnimationKind::BackColor { to, .. }
        | AnimationKind::SecondaryColor { to, .. }
        | AnimationKind::ShadowColor { to, .. } => Some(to),
        _ => None,
    }
}

/// Interval and easing shared by all modifiers of one `\t`
#[derive(Debug, Clone, Copy)]
struct Transform {
    start: i64,
    end: i64,
    acceleration: f32,
}

impl Transform {
    /// Animation of `channel` over this interval, created if missing
    ///
    /// A new animation starts from where the previous one of the channel
    /// ends, or from the section's current color.
    fn fetch_color_animation<'s>(&self, section: &'s mut Section, channel: ColorChannel) -> &'s mut Animation {
        section
            .animations
            .retain(|anim| !(channel.same_kind(&anim.kind) && anim.start > self.start));

        let existing = section
            .animations
            .iter()
            .position(|anim| anim.start == self.start && anim.end == self.end && channel.targets(&anim.kind));
        let index = if let Some(index) = existing {
            index
        } else {
            let from = section
                .animations
                .iter()
                .rev()
                .find(|anim| channel.targets(&anim.kind))
                .and_then(|anim| end_color(&anim.kind))
                .unwrap_or_else(|| channel.current(section));
            section.animations.push(
                Animation::new(self.start, self.end, channel.animation(from, from))
                    .with_acceleration(self.acceleration),
            );
            section.animations.len() - 1
        };
        &mut section.animations[index]
    }

    fn animate_color(&self, section: &mut Section, channel: ColorChannel, arg: &str) {
        let anim = self.fetch_color_animation(section, channel);
        if let Some(to) = target_color(&mut anim.kind) {
            *to = parse_color(arg, to.a);
        }
    }

    fn animate_alpha(&self, section: &mut Section, channel: ColorChannel, arg: &str) {
        let anim = self.fetch_color_animation(section, channel);
        if let Some(to) = target_color(&mut anim.kind) {
            *to = to.with_alpha(parse_opacity(arg));
        }
    }

    /// Shadow channels driven by `\4c`/`\4a` for the current style
    fn shadow_channels(ctx: &TagContext<'_>) -> Vec<ColorChannel> {
        ctx.section
            .shadow_colors
            .keys()
            .filter(|shadow_type| is_shadow_channel(ctx.style, **shadow_type))
            .map(|shadow_type| ColorChannel::Shadow(*shadow_type))
            .collect()
    }

    fn outline_channel(ctx: &TagContext<'_>) -> Option<ColorChannel> {
        if !ctx.style.has_outline() {
            None
        } else if ctx.style.outline_is_box {
            Some(ColorChannel::Back)
        } else {
            Some(ColorChannel::Shadow(ShadowType::Glow))
        }
    }

    fn apply_modifier(&self, ctx: &mut TagContext<'_>, tag: &str, arg: &str) {
        match tag {
            "c" | "1c" => self.animate_color(&mut ctx.section, ColorChannel::Fore, arg),
            "2c" => self.animate_color(&mut ctx.section, ColorChannel::Secondary, arg),
            "3c" => {
                if let Some(channel) = Self::outline_channel(ctx) {
                    self.animate_color(&mut ctx.section, channel, arg);
                }
            }
            "4c" => {
                for channel in Self::shadow_channels(ctx) {
                    self.animate_color(&mut ctx.section, channel, arg);
                }
            }
            "alpha" => {
                for tag in ["1a", "2a", "3a", "4a"] {
                    self.apply_modifier(ctx, tag, arg);
                }
            }
            "1a" => self.animate_alpha(&mut ctx.section, ColorChannel::Fore, arg),
            "2a" => self.animate_alpha(&mut ctx.section, ColorChannel::Secondary, arg),
            "3a" => {
                if let Some(channel) = Self::outline_channel(ctx) {
                    self.animate_alpha(&mut ctx.section, channel, arg);
                }
            }
            "4a" => {
                for channel in Self::shadow_channels(ctx) {
                    self.animate_alpha(&mut ctx.section, channel, arg);
                }
            }
            "fs" => self.animate_font_size(ctx, arg),
            _ => {}
        }
    }

    fn animate_font_size(&self, ctx: &mut TagContext<'_>, arg: &str) {
        let Some(line_height) = try_parse_float(arg) else {
            return;
        };
        let default_line_height = ctx.default_line_height();
        let section = &mut ctx.section;
        section
            .animations
            .retain(|anim| !(matches!(anim.kind, AnimationKind::Scale { .. }) && anim.start >= self.start));

        let from = section
            .animations
            .iter()
            .rev()
            .find_map(|anim| match anim.kind {
                AnimationKind::Scale { to, .. } => Some(to),
                _ => None,
            })
            .unwrap_or(section.scale);
        section.animations.push(
            Animation::new(
                self.start,
                self.end,
                AnimationKind::Scale {
                    from,
                    to: line_height / default_line_height,
                },
            )
            .with_acceleration(self.acceleration),
        );
    }
}

/// Handler for animated transforms (`\t`)
pub struct TransformTagHandler;

impl TransformTagHandler {
    fn parse_args(ctx: &TagContext<'_>, arg: &str) -> Option<(Transform, String)> {
        let mut args = parse_string_list(arg)?;
        let mut transform = Transform {
            start: ctx.line.start,
            end: ctx.line.end,
            acceleration: 1.0,
        };

        match args.len() {
            1 => {}
            2 => transform.acceleration = try_parse_float(&args[0])?,
            3 | 4 => {
                let t1 = try_parse_int(&args[0])?;
                let t2 = try_parse_int(&args[1])?;
                transform.start = ctx.line.start + i64::from(t1);
                transform.end = ctx.line.start + i64::from(t2);
                if args.len() == 4 {
                    transform.acceleration = try_parse_float(&args[2])?;
                }
            }
            _ => return None,
        }

        let modifiers = args.pop()?;
        Some((transform, modifiers))
    }
}

impl TagHandler for TransformTagHandler {
    fn name(&self) -> &'static str {
        "t"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        let Some((transform, modifiers)) = Self::parse_args(ctx, arg) else {
            return TagResult::Failed(format!("'{arg}' is not a transform"));
        };

        ctx.line.android_dark_text_hack_allowed = false;
        for caps in modifier_regex().captures_iter(&modifiers) {
            let tag = caps.name("tag").map_or("", |m| m.as_str());
            let value = caps.name("arg").map_or("", |m| m.as_str()).trim();
            transform.apply_modifier(ctx, tag, value);
        }
        TagResult::Processed
    }
}

/// Create the transform handler
#[must_use]
pub fn create_transform_handlers() -> Vec<Box<dyn TagHandler>> {
    vec![Box::new(TransformTagHandler)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ass::tags::test_stylesheet;
    use crate::model::Line;
    use pretty_assertions::assert_eq;

    fn run(args: &[&str]) -> TagContext<'static> {
        let sheet: &'static _ = Box::leak(Box::new(test_stylesheet()));
        let mut ctx = TagContext::new(sheet, sheet.default_style(), Line::new(1000, 3000));
        for arg in args {
            TransformTagHandler.handle(&mut ctx, arg);
        }
        ctx
    }

    #[test]
    fn whole_line_color_transform() {
        let ctx = run(&[r"(\1c&H0000FF&)"]);
        assert_eq!(
            ctx.section.animations,
            vec![Animation::new(
                1000,
                3000,
                AnimationKind::ForeColor {
                    from: Color::WHITE,
                    to: Color::from_rgb(255, 0, 0)
                }
            )]
        );
        assert!(!ctx.line.android_dark_text_hack_allowed);
    }

    #[test]
    fn color_and_alpha_share_one_animation() {
        let ctx = run(&[r"(0,500,\c&H0000FF&\1a&HFF&)"]);
        assert_eq!(ctx.section.animations.len(), 1);
        assert_eq!(
            ctx.section.animations[0].kind,
            AnimationKind::ForeColor {
                from: Color::WHITE,
                to: Color::from_argb(0, 255, 0, 0)
            }
        );
    }

    #[test]
    fn chained_transforms_continue_from_previous_end() {
        let ctx = run(&[r"(0,500,\c&H0000FF&)", r"(500,1000,\c&H00FF00&)"]);
        let kinds: Vec<&AnimationKind> = ctx.section.animations.iter().map(|a| &a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &AnimationKind::ForeColor {
                    from: Color::WHITE,
                    to: Color::from_rgb(255, 0, 0)
                },
                &AnimationKind::ForeColor {
                    from: Color::from_rgb(255, 0, 0),
                    to: Color::from_rgb(0, 255, 0)
                },
            ]
        );
    }

    #[test]
    fn earlier_transform_cancels_later_one() {
        let ctx = run(&[r"(500,1000,\c&H00FF00&)", r"(0,500,\c&H0000FF&)"]);
        assert_eq!(ctx.section.animations.len(), 1);
        assert_eq!(ctx.section.animations[0].start, 1000);
    }

    #[test]
    fn acceleration_and_font_size() {
        let ctx = run(&[r"(2,\fs40)"]);
        let anim = &ctx.section.animations[0];
        assert_eq!(anim.acceleration, 2.0);
        assert_eq!(anim.kind, AnimationKind::Scale { from: 1.0, to: 2.0 });
    }

    #[test]
    fn outline_and_shadow_channels() {
        let ctx = run(&[r"(\3c&HFFFFFF&\4c&H0000FF&)"]);
        let shadows: Vec<(ShadowType, Color)> = ctx
            .section
            .animations
            .iter()
            .filter_map(|a| match a.kind {
                AnimationKind::ShadowColor { shadow_type, to, .. } => Some((shadow_type, to)),
                _ => None,
            })
            .collect();
        assert_eq!(
            shadows,
            vec![
                (ShadowType::Glow, Color::WHITE),
                (ShadowType::SoftShadow, Color::from_rgb(255, 0, 0)),
            ]
        );
    }

    #[test]
    fn malformed_arguments_fail() {
        let sheet = test_stylesheet();
        let mut ctx = TagContext::new(&sheet, sheet.default_style(), Line::new(0, 1000));
        assert!(matches!(
            TransformTagHandler.handle(&mut ctx, r"\c&HFF&"),
            TagResult::Failed(_)
        ));
        assert!(matches!(
            TransformTagHandler.handle(&mut ctx, r"(a,b,\c&HFF&)"),
            TagResult::Failed(_)
        ));
        assert!(ctx.line.android_dark_text_hack_allowed);
    }
}
