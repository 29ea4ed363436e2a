//! Karaoke tag handlers
//!
//! `\k` gives the section being built a syllable duration in centiseconds.
//! `\ytkt` chooses how the karaoke of the line is emulated when the target
//! cannot time syllables natively:
//!
//! - `\ytkt(fade)`: cross-fade into and out of the highlight
//! - `\ytkt(glitch)`: scramble the first character of the sung syllable
//! - `\ytkt(cursor, ...)` / `\ytkt(lcursor, ...)`: caret after / before it
//! - anything else: plain recoloring

use super::{TagHandler, TagResult, TagScope};
use crate::ass::interpreter::TagContext;
use crate::model::KaraokeType;
use crate::utils::{parse_int, parse_string_list, try_parse_int};

/// Cursor interval when no cadence is given, long enough to never blink
const STEADY_CURSOR_INTERVAL_MS: i64 = 3_600_000;

/// Handler for syllable timing (`\k`)
pub struct KaraokeTagHandler;

impl TagHandler for KaraokeTagHandler {
    fn name(&self) -> &'static str {
        "k"
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        ctx.section.duration = i64::from(parse_int(arg)) * 10;
        TagResult::Processed
    }
}

/// Handler for the karaoke strategy (`\ytkt`)
pub struct KaraokeTypeTagHandler;

impl KaraokeTypeTagHandler {
    fn cursor(before: bool, args: &[String]) -> KaraokeType {
        let (interval, cursors) = match args.len() {
            0 | 1 => (STEADY_CURSOR_INTERVAL_MS, vec!["_".to_string()]),
            2 => (STEADY_CURSOR_INTERVAL_MS, vec![args[1].clone()]),
            3 => (
                STEADY_CURSOR_INTERVAL_MS,
                vec![format!("{{{}}}{}", args[1], args[2])],
            ),
            _ => {
                let interval = try_parse_int(&args[1]).unwrap_or(i32::MAX);
                let cursors = args[2..]
                    .chunks(2)
                    .map(|pair| {
                        let text = pair.get(1).map_or("_", String::as_str);
                        format!("{{{}}}{text}", pair[0])
                    })
                    .collect();
                (i64::from(interval), cursors)
            }
        };

        KaraokeType::Cursor {
            before,
            interval,
            cursors,
        }
    }
}

impl TagHandler for KaraokeTypeTagHandler {
    fn name(&self) -> &'static str {
        "ytkt"
    }

    fn scope(&self) -> TagScope {
        TagScope::Line
    }

    fn handle(&self, ctx: &mut TagContext<'_>, arg: &str) -> TagResult {
        let args = parse_string_list(arg).unwrap_or_default();
        let type_name = args.first().map_or(arg, String::as_str).to_lowercase();

        ctx.line.karaoke_type = match type_name.as_str() {
            "fade" => KaraokeType::Fade,
            "glitch" => KaraokeType::Glitch,
            "cursor" => Self::cursor(false, &args),
            "lcursor" => Self::cursor(true, &args),
            _ => KaraokeType::Simple,
        };
        TagResult::Processed
    }
}

/// Create all karaoke handlers
#[must_use]
pub fn create_karaoke_handlers() -> Vec<Box<dyn TagHandler>> {
    vec![Box::new(KaraokeTagHandler), Box::new(KaraokeTypeTagHandler)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ass::tags::test_stylesheet;
    use crate::model::Line;
    use pretty_assertions::assert_eq;

    fn karaoke_type(arg: &str) -> KaraokeType {
        let sheet = test_stylesheet();
        let mut ctx = TagContext::new(&sheet, sheet.default_style(), Line::new(0, 1000));
        KaraokeTypeTagHandler.handle(&mut ctx, arg);
        ctx.line.karaoke_type
    }

    #[test]
    fn duration_in_centiseconds() {
        let sheet = test_stylesheet();
        let mut ctx = TagContext::new(&sheet, sheet.default_style(), Line::new(0, 1000));
        KaraokeTagHandler.handle(&mut ctx, "45");
        assert_eq!(ctx.section.duration, 450);
        KaraokeTagHandler.handle(&mut ctx, "x");
        assert_eq!(ctx.section.duration, 0);
    }

    #[test]
    fn strategy_names() {
        assert_eq!(karaoke_type("(Fade)"), KaraokeType::Fade);
        assert_eq!(karaoke_type("glitch"), KaraokeType::Glitch);
        assert_eq!(karaoke_type("(wobble)"), KaraokeType::Simple);
    }

    #[test]
    fn cursor_arguments() {
        assert_eq!(
            karaoke_type("(cursor)"),
            KaraokeType::Cursor {
                before: false,
                interval: STEADY_CURSOR_INTERVAL_MS,
                cursors: vec!["_".to_string()],
            }
        );
        assert_eq!(
            karaoke_type("(lcursor, |)"),
            KaraokeType::Cursor {
                before: true,
                interval: STEADY_CURSOR_INTERVAL_MS,
                cursors: vec!["|".to_string()],
            }
        );
        assert_eq!(
            karaoke_type(r"(cursor, \1a&HFF&, |)"),
            KaraokeType::Cursor {
                before: false,
                interval: STEADY_CURSOR_INTERVAL_MS,
                cursors: vec![r"{\1a&HFF&}|".to_string()],
            }
        );
        assert_eq!(
            karaoke_type(r"(cursor, 500, \c&HFFFFFF&, |, \c&H0000FF&)"),
            KaraokeType::Cursor {
                before: false,
                interval: 500,
                cursors: vec![r"{\c&HFFFFFF&}|".to_string(), r"{\c&H0000FF&}_".to_string()],
            }
        );
    }
}
