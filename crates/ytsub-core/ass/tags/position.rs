//! Line placement and fade tag handlers
//!
//! All of these are line-scoped: only their first occurrence in a dialogue
//! event counts. Times in arguments are milliseconds relative to the line
//! start.

use super::{TagHandler, TagResult, TagScope};
use crate::ass::interpreter::TagContext;
use crate::model::{AnchorPoint, Animation, AnimationKind, PointF};
use crate::utils::{parse_float_list, parse_hex, try_parse_int};

/// Handler for explicit placement (`\pos(x,y)`)
pub struct PositionTagHandler;

impl TagHandler for PositionTagHandler {
    fn name(&self) -> &'static str {
        "pos"
    }

    fn scope(&self) -> TagScope {
        TagScope::Line
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        let Some(coords) = parse_float_list(arg).filter(|list| list.len() == 2) else {
            return TagResult::Failed(format!("'{arg}' is not a coordinate pair"));
        };
        if ctx.line.position.is_some() {
            return TagResult::Ignored;
        }
        ctx.line.position = Some(PointF::new(coords[0], coords[1]));
        TagResult::Processed
    }
}

/// Handler for the numpad alignment (`\an`)
pub struct AlignmentTagHandler;

impl TagHandler for AlignmentTagHandler {
    fn name(&self) -> &'static str {
        "an"
    }

    fn scope(&self) -> TagScope {
        TagScope::Line
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        match try_parse_int(arg).and_then(AnchorPoint::from_numpad) {
            Some(anchor) => {
                ctx.line.anchor_point = anchor;
                TagResult::Processed
            }
            None => TagResult::Failed(format!("'{arg}' is not an alignment")),
        }
    }
}

/// Handler for movement (`\move(x1,y1,x2,y2[,t1,t2])`)
pub struct MoveTagHandler;

impl TagHandler for MoveTagHandler {
    fn name(&self) -> &'static str {
        "move"
    }

    fn scope(&self) -> TagScope {
        TagScope::Line
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        let Some(args) = parse_float_list(arg).filter(|list| list.len() >= 4) else {
            return TagResult::Failed(format!("'{arg}' needs at least four values"));
        };

        let (start, end) = if args.len() >= 6 {
            (ctx.line_time(args[4]), ctx.line_time(args[5]))
        } else {
            (ctx.line.start, ctx.line.end)
        };
        if end <= start {
            return TagResult::Ignored;
        }

        ctx.line.animations.push(Animation::new(
            start,
            end,
            AnimationKind::Move {
                from: PointF::new(args[0], args[1]),
                to: PointF::new(args[2], args[3]),
            },
        ));
        TagResult::Processed
    }
}

/// Handler for the simple fade (`\fad(in,out)`)
pub struct SimpleFadeTagHandler;

impl TagHandler for SimpleFadeTagHandler {
    fn name(&self) -> &'static str {
        "fad"
    }

    fn scope(&self) -> TagScope {
        TagScope::Line
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        let Some(args) = parse_float_list(arg).filter(|list| list.len() == 2) else {
            return TagResult::Failed(format!("'{arg}' is not a fade-in/fade-out pair"));
        };

        let line = &mut ctx.line;
        let fade_in_end = line.start + args[0].round() as i64;
        if fade_in_end > line.start {
            line.animations.push(Animation::new(
                line.start,
                fade_in_end,
                AnimationKind::Fade { from: 0, to: 255 },
            ));
        }

        let fade_out_start = line.end - args[1].round() as i64;
        if line.end > fade_out_start {
            line.animations.push(Animation::new(
                fade_out_start,
                line.end,
                AnimationKind::Fade { from: 255, to: 0 },
            ));
        }
        TagResult::Processed
    }
}

/// Handler for the complex fade (`\fade(a1,a2,a3,t1,t2,t3,t4)`)
pub struct ComplexFadeTagHandler;

impl TagHandler for ComplexFadeTagHandler {
    fn name(&self) -> &'static str {
        "fade"
    }

    fn scope(&self) -> TagScope {
        TagScope::Line
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        let inner = arg.trim().trim_start_matches('(').trim_end_matches(')');
        let args: Vec<&str> = inner.split(',').map(str::trim).collect();
        if args.len() != 7 {
            return TagResult::Failed(format!("'{arg}' needs seven values"));
        }

        let opacity = |value: &str| -> u8 {
            let transparency = try_parse_int(value).map_or_else(|| parse_hex(value), |v| v as u32);
            255 - (transparency & 0xFF) as u8
        };
        let alphas = [opacity(args[0]), opacity(args[1]), opacity(args[2])];

        let mut times = [0_i64; 4];
        for (slot, value) in times.iter_mut().zip(&args[3..]) {
            let Some(offset) = try_parse_int(value) else {
                return TagResult::Failed(format!("'{value}' is not a time"));
            };
            *slot = ctx.line.start + i64::from(offset);
        }

        if times[1] > times[0] {
            ctx.line.animations.push(Animation::new(
                times[0],
                times[1],
                AnimationKind::Fade {
                    from: alphas[0],
                    to: alphas[1],
                },
            ));
        }
        if times[3] > times[2] {
            ctx.line.animations.push(Animation::new(
                times[2],
                times[3],
                AnimationKind::Fade {
                    from: alphas[1],
                    to: alphas[2],
                },
            ));
        }
        TagResult::Processed
    }
}

/// Create all position and fade handlers
#[must_use]
pub fn create_position_handlers() -> Vec<Box<dyn TagHandler>> {
    vec![
        Box::new(PositionTagHandler),
        Box::new(AlignmentTagHandler),
        Box::new(MoveTagHandler),
        Box::new(SimpleFadeTagHandler),
        Box::new(ComplexFadeTagHandler),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ass::tags::test_stylesheet;
    use crate::model::Line;
    use pretty_assertions::assert_eq;

    fn context(sheet: &crate::ass::interpreter::Stylesheet) -> TagContext<'_> {
        TagContext::new(sheet, sheet.default_style(), Line::new(1000, 5000))
    }

    #[test]
    fn pos_needs_two_values() {
        let sheet = test_stylesheet();
        let mut ctx = context(&sheet);
        assert!(matches!(
            PositionTagHandler.handle(&mut ctx, "(10)"),
            TagResult::Failed(_)
        ));
        assert_eq!(PositionTagHandler.handle(&mut ctx, "(10, 20.5)"), TagResult::Processed);
        assert_eq!(ctx.line.position, Some(PointF::new(10.0, 20.5)));
    }

    #[test]
    fn alignment_range() {
        let sheet = test_stylesheet();
        let mut ctx = context(&sheet);
        AlignmentTagHandler.handle(&mut ctx, "7");
        assert_eq!(ctx.line.anchor_point, AnchorPoint::TopLeft);
        assert!(matches!(AlignmentTagHandler.handle(&mut ctx, "0"), TagResult::Failed(_)));
        assert_eq!(ctx.line.anchor_point, AnchorPoint::TopLeft);
    }

    #[test]
    fn move_with_and_without_times() {
        let sheet = test_stylesheet();
        let mut ctx = context(&sheet);
        MoveTagHandler.handle(&mut ctx, "(0,0,100,50)");
        assert_eq!(
            (ctx.line.animations[0].start, ctx.line.animations[0].end),
            (1000, 5000)
        );

        let mut ctx = context(&sheet);
        MoveTagHandler.handle(&mut ctx, "(0,0,100,50,200,700)");
        assert_eq!(
            (ctx.line.animations[0].start, ctx.line.animations[0].end),
            (1200, 1700)
        );

        let mut ctx = context(&sheet);
        assert_eq!(
            MoveTagHandler.handle(&mut ctx, "(0,0,100,50,700,700)"),
            TagResult::Ignored
        );
        assert!(ctx.line.animations.is_empty());
    }

    #[test]
    fn simple_fade_adds_both_sides() {
        let sheet = test_stylesheet();
        let mut ctx = context(&sheet);
        SimpleFadeTagHandler.handle(&mut ctx, "(300,0)");
        assert_eq!(ctx.line.animations.len(), 1);
        let fade_in = &ctx.line.animations[0];
        assert_eq!((fade_in.start, fade_in.end), (1000, 1300));
        assert_eq!(fade_in.kind, AnimationKind::Fade { from: 0, to: 255 });

        let mut ctx = context(&sheet);
        SimpleFadeTagHandler.handle(&mut ctx, "(300,400)");
        let fade_out = &ctx.line.animations[1];
        assert_eq!((fade_out.start, fade_out.end), (4600, 5000));
        assert_eq!(fade_out.kind, AnimationKind::Fade { from: 255, to: 0 });
    }

    #[test]
    fn complex_fade_inverts_alpha() {
        let sheet = test_stylesheet();
        let mut ctx = context(&sheet);
        ComplexFadeTagHandler.handle(&mut ctx, "(255,0,255,0,500,3500,4000)");
        assert_eq!(
            ctx.line.animations,
            vec![
                Animation::new(1000, 1500, AnimationKind::Fade { from: 0, to: 255 }),
                Animation::new(4500, 5000, AnimationKind::Fade { from: 255, to: 0 }),
            ]
        );
        assert!(matches!(
            ComplexFadeTagHandler.handle(&mut ctx, "(1,2,3)"),
            TagResult::Failed(_)
        ));
    }
}
