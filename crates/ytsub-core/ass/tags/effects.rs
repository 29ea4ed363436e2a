//! Post-processing effect tags
//!
//! These effects depend on the final position of the line, so their
//! handlers only record a [`PostProcessor`] which the interpreter runs after
//! the whole dialogue event has been scanned.
//!
//! - `\ytshake[(r)|(rx,ry)|(r,t1,t2)|(rx,ry,t1,t2)]` jitters the line
//! - `\ytchroma[([colors...,]alpha,ox,oy,in,out)]` adds colored copies that
//!   converge on the line when it appears and diverge when it disappears

use super::{TagHandler, TagResult, TagScope};
use crate::ass::interpreter::TagContext;
use crate::model::{Animation, AnimationKind, Line, PointF, Size};
use crate::utils::time::round_time_to_frame_center;
use crate::utils::{parse_color, parse_float_list, parse_hex, parse_string_list, try_parse_int, Color};

const DEFAULT_SHAKE_RADIUS: f32 = 20.0;

/// Deferred effect run once the line is complete
#[derive(Debug, Clone, PartialEq)]
pub enum PostProcessor {
    /// Add a shake animation around the line's final position
    Shake { radius: PointF, start: i64, end: i64 },
    /// Add chromatic aberration lines
    Chroma(ChromaEffect),
}

impl PostProcessor {
    /// Apply the effect to `line` and return any lines it creates
    pub fn run(self, line: &mut Line, video_dimensions: Size) -> Vec<Line> {
        let center = line
            .position
            .unwrap_or_else(|| video_dimensions.default_position(line.anchor_point));
        match self {
            Self::Shake { radius, start, end } => {
                line.animations
                    .push(Animation::new(start, end, AnimationKind::Shake { center, radius }));
                Vec::new()
            }
            Self::Chroma(effect) => effect.apply(line, center),
        }
    }
}

/// Parameters of a chromatic aberration effect
#[derive(Debug, Clone, PartialEq)]
pub struct ChromaEffect {
    /// Explicit copy colors; red, green and blue copies when empty
    pub colors: Vec<Color>,
    /// Opacity of the generated default colors
    pub alpha: u8,
    /// Largest horizontal distance of a copy from the line, in pixels
    pub max_offset_x: i32,
    pub max_offset_y: i32,
    /// Duration of the converging copies when the line appears
    pub in_ms: i64,
    /// Duration of the diverging copies when the line disappears
    pub out_ms: i64,
}

impl Default for ChromaEffect {
    fn default() -> Self {
        Self {
            colors: Vec::new(),
            alpha: 255 - 128,
            max_offset_x: 20,
            max_offset_y: 0,
            in_ms: 270,
            out_ms: 270,
        }
    }
}

impl ChromaEffect {
    /// Parse the argument list of `\ytchroma`, counted from its end
    #[must_use]
    pub fn parse(arg: &str) -> Option<Self> {
        let args = parse_string_list(arg)?;
        let count = args.len();
        let from_end = |n: usize| -> Option<Option<i32>> {
            if count >= n {
                try_parse_int(&args[count - n]).map(Some)
            } else {
                Some(None)
            }
        };

        let mut effect = Self::default();
        let mut transparency = 128;
        if count >= 5 {
            transparency = parse_hex(&args[count - 5]) & 0xFF;
        }
        if let Some(value) = from_end(4)? {
            effect.max_offset_x = value;
        }
        if let Some(value) = from_end(3)? {
            effect.max_offset_y = value;
        }
        if let Some(value) = from_end(2)? {
            effect.in_ms = i64::from(value);
        }
        if let Some(value) = from_end(1)? {
            effect.out_ms = i64::from(value);
        }

        effect.alpha = 255 - transparency as u8;
        effect.colors = args
            .iter()
            .take(count.saturating_sub(5))
            .map(|color| parse_color(color, effect.alpha))
            .collect();
        Some(effect)
    }

    fn resolved_colors(&self, line: &Line) -> Vec<Color> {
        if !self.colors.is_empty() {
            return self.colors.clone();
        }

        let base = line.base_fore_color();
        let scaled = |channel: u8| (f32::from(channel) * f32::from(self.alpha) / 255.0) as u8;
        vec![
            Color::from_argb(scaled(base.r), 255, 0, 0),
            Color::from_argb(scaled(base.g), 0, 255, 0),
            Color::from_argb(scaled(base.b), 0, 0, 255),
        ]
    }

    /// Shorten `line` by the in/out durations and return the copies
    pub fn apply(&self, line: &mut Line, center: PointF) -> Vec<Line> {
        let colors = self.resolved_colors(line);
        let mut chroma_lines = Vec::new();

        if self.in_ms > 0 {
            chroma_lines.extend(self.create_lines(line, &colors, center, self.in_ms, true));
            line.start = round_time_to_frame_center(line.start + self.in_ms);
        }
        if self.out_ms > 0 {
            chroma_lines.extend(self.create_lines(line, &colors, center, self.out_ms, false));
            line.end = round_time_to_frame_center(line.end - self.out_ms);
        }
        chroma_lines
    }

    fn create_lines(&self, original: &Line, colors: &[Color], center: PointF, duration: i64, move_in: bool) -> Vec<Line> {
        if original.sections.is_empty() {
            return Vec::new();
        }

        let mut lines = Vec::with_capacity(colors.len());
        for (index, color) in colors.iter().enumerate() {
            if color.a == 0 {
                continue;
            }

            let mut chroma = original.clone();
            for section in &mut chroma.sections {
                let alpha = (f32::from(section.fore_color.a) * (f32::from(color.a) / 255.0)) as u8;
                section.fore_color = color.with_alpha(alpha);
                section.back_color = Color::EMPTY;
                section.shadow_colors.clear();
            }

            let factor = if colors.len() > 1 {
                index as f32 / (colors.len() - 1) as f32
            } else {
                0.5
            };
            let max_x = self.max_offset_x as f32;
            let max_y = self.max_offset_y as f32;
            let offset_x = factor * (-max_x * 2.0) + max_x;
            let offset_y = factor * (-max_y * 2.0) + max_y;
            let far = PointF::new(center.x + offset_x, center.y + offset_y);
            let near = PointF::new(center.x + offset_x / 5.0, center.y + offset_y / 5.0);

            let (from, to) = if move_in {
                chroma.end = round_time_to_frame_center(original.start + duration);
                (far, near)
            } else {
                chroma.start = round_time_to_frame_center(original.end - duration);
                (near, far)
            };
            chroma
                .animations
                .push(Animation::new(chroma.start, chroma.end, AnimationKind::Move { from, to }));
            lines.push(chroma);
        }
        lines
    }
}

/// Handler for the shake effect (`\ytshake`)
pub struct ShakeTagHandler;

impl TagHandler for ShakeTagHandler {
    fn name(&self) -> &'static str {
        "ytshake"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        let mut radius = PointF::new(DEFAULT_SHAKE_RADIUS, DEFAULT_SHAKE_RADIUS);
        let mut start = ctx.line.start;
        let mut end = ctx.line.end;

        if !arg.trim().is_empty() {
            let Some(args) = parse_float_list(arg) else {
                return TagResult::Failed(format!("'{arg}' is not a shake radius"));
            };
            match args.as_slice() {
                [] => {}
                [r] => radius = PointF::new(*r, *r),
                [rx, ry] => radius = PointF::new(*rx, *ry),
                [r, t1, t2] => {
                    radius = PointF::new(*r, *r);
                    start = ctx.line_time(*t1);
                    end = ctx.line_time(*t2);
                }
                [rx, ry, t1, t2] => {
                    radius = PointF::new(*rx, *ry);
                    start = ctx.line_time(*t1);
                    end = ctx.line_time(*t2);
                }
                _ => return TagResult::Failed(format!("'{arg}' has too many values")),
            }
        }

        ctx.post_processors
            .push(PostProcessor::Shake { radius, start, end });
        TagResult::Processed
    }
}

/// Handler for chromatic aberration (`\ytchroma`)
pub struct ChromaTagHandler;

impl TagHandler for ChromaTagHandler {
    fn name(&self) -> &'static str {
        "ytchroma"
    }

    fn scope(&self) -> TagScope {
        TagScope::Line
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        match ChromaEffect::parse(arg) {
            Some(effect) => {
                ctx.post_processors.push(PostProcessor::Chroma(effect));
                TagResult::Processed
            }
            None => TagResult::Failed(format!("'{arg}' is not a chroma argument list")),
        }
    }
}

/// Create all effect handlers
#[must_use]
pub fn create_effect_handlers() -> Vec<Box<dyn TagHandler>> {
    vec![Box::new(ShakeTagHandler), Box::new(ChromaTagHandler)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ass::tags::test_stylesheet;
    use crate::model::Section;
    use pretty_assertions::assert_eq;

    fn visible_line() -> Line {
        let mut section = Section::new("text");
        section.fore_color = Color::WHITE;
        section.back_color = Color::BLACK;
        let mut line = Line::with_section(1000, 3000, section);
        line.position = Some(PointF::new(100.0, 100.0));
        line
    }

    #[test]
    fn shake_arguments() {
        let sheet = test_stylesheet();
        let mut ctx = TagContext::new(&sheet, sheet.default_style(), Line::new(1000, 3000));
        ShakeTagHandler.handle(&mut ctx, "");
        ShakeTagHandler.handle(&mut ctx, "(5,6,100,200)");
        assert!(matches!(
            ShakeTagHandler.handle(&mut ctx, "(1,2,3,4,5)"),
            TagResult::Failed(_)
        ));
        assert_eq!(
            ctx.post_processors,
            vec![
                PostProcessor::Shake {
                    radius: PointF::new(20.0, 20.0),
                    start: 1000,
                    end: 3000
                },
                PostProcessor::Shake {
                    radius: PointF::new(5.0, 6.0),
                    start: 1100,
                    end: 1200
                },
            ]
        );
    }

    #[test]
    fn shake_centers_on_default_position() {
        let mut line = Line::with_section(0, 1000, Section::new("x"));
        let extra = PostProcessor::Shake {
            radius: PointF::new(1.0, 1.0),
            start: 0,
            end: 1000,
        }
        .run(&mut line, Size::new(1280, 720));
        assert!(extra.is_empty());
        assert_eq!(
            line.animations[0].kind,
            AnimationKind::Shake {
                center: Size::new(1280, 720).default_position(line.anchor_point),
                radius: PointF::new(1.0, 1.0)
            }
        );
    }

    #[test]
    fn chroma_arguments_count_from_the_end() {
        assert_eq!(ChromaEffect::parse("").unwrap(), ChromaEffect::default());

        let effect = ChromaEffect::parse("(100,200)").unwrap();
        assert_eq!((effect.in_ms, effect.out_ms), (100, 200));
        assert_eq!(effect.max_offset_x, 20);

        let effect = ChromaEffect::parse("(&H0000FF&,&H00FF00&,&H40&,10,5,300,0)").unwrap();
        assert_eq!(effect.alpha, 0xBF);
        assert_eq!(
            effect.colors,
            vec![Color::from_argb(0xBF, 255, 0, 0), Color::from_argb(0xBF, 0, 255, 0)]
        );
        assert_eq!((effect.max_offset_x, effect.max_offset_y), (10, 5));

        assert!(ChromaEffect::parse("(x,200)").is_none());
    }

    #[test]
    fn chroma_creates_converging_and_diverging_copies() {
        let mut line = visible_line();
        let effect = ChromaEffect {
            alpha: 255,
            ..ChromaEffect::default()
        };
        let lines = effect.apply(&mut line, PointF::new(100.0, 100.0));

        assert_eq!(lines.len(), 6);
        assert_eq!(line.start, round_time_to_frame_center(1270));
        assert_eq!(line.end, round_time_to_frame_center(2730));

        let red_in = &lines[0];
        assert_eq!(red_in.start, 1000);
        assert_eq!(red_in.end, round_time_to_frame_center(1270));
        assert_eq!(red_in.sections[0].fore_color, Color::from_rgb(255, 0, 0));
        assert_eq!(red_in.sections[0].back_color, Color::EMPTY);
        assert_eq!(
            red_in.animations[0].kind,
            AnimationKind::Move {
                from: PointF::new(120.0, 100.0),
                to: PointF::new(104.0, 100.0)
            }
        );

        let blue_out = &lines[5];
        assert_eq!(blue_out.end, 3000);
        assert_eq!(
            blue_out.animations[0].kind,
            AnimationKind::Move {
                from: PointF::new(96.0, 100.0),
                to: PointF::new(80.0, 100.0)
            }
        );
    }

    #[test]
    fn chroma_skips_empty_lines_and_transparent_colors() {
        let mut empty = Line::new(0, 1000);
        assert!(ChromaEffect::default().apply(&mut empty, PointF::default()).is_empty());

        let mut line = visible_line();
        let effect = ChromaEffect {
            colors: vec![Color::EMPTY],
            in_ms: 100,
            out_ms: 0,
            ..ChromaEffect::default()
        };
        assert!(effect.apply(&mut line, PointF::default()).is_empty());
    }
}
