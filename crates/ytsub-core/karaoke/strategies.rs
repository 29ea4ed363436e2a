//! Highlight strategies applied to each karaoke step

use super::{CursorFormatter, StepContext};
use crate::model::{Animation, AnimationKind, KaraokeType, Line, RubyPart, Section, ShadowType};
use crate::utils::glitch_alphabet;
use crate::utils::time::{frame_to_end_time, round_time_to_frame_center, start_time_to_frame};

/// Length of the cross-fade into the highlight
const FADE_IN_MS: i64 = 500;
/// Length of the cross-fade back out of it
const FADE_OUT_MS: i64 = 1000;

/// Decorate one step line according to the original line's karaoke type
pub fn apply(ctx: StepContext<'_>, formatter: &dyn CursorFormatter) -> Vec<Line> {
    let original = ctx.original;
    match &original.karaoke_type {
        KaraokeType::Simple => {
            let mut ctx = ctx;
            highlight_singing(&mut ctx);
            vec![ctx.line]
        }
        KaraokeType::Fade => vec![fade(ctx)],
        KaraokeType::Glitch => vec![glitch(ctx)],
        KaraokeType::Cursor {
            before,
            interval,
            cursors,
        } => cursor(ctx, *before, *interval, cursors, formatter),
    }
}

/// Switch the singing sections to their current-word colors
fn highlight_singing(ctx: &mut StepContext<'_>) {
    for index in ctx.singing() {
        let section = &mut ctx.line.sections[index];
        if let Some(color) = section.current_word_fore_color {
            section.fore_color = color;
        }
        if let Some(color) = section.current_word_shadow_color {
            section.set_all_shadows(color);
        }
        if let Some(color) = section.current_word_outline_color {
            if let Some(glow) = section.shadow_colors.get_mut(&ShadowType::Glow) {
                *glow = color;
            }
        }
    }
}

fn fade(mut ctx: StepContext<'_>) -> Line {
    let fade_in_start = ctx.line.start;
    let fade_in_end = (fade_in_start + FADE_IN_MS).min(ctx.line.end);
    for index in ctx.singing() {
        fade_in(&mut ctx.line.sections[index], fade_in_start, fade_in_end);
    }

    let count = ctx.line.sections.len();
    let mut first = 0;
    for previous in 0..ctx.index {
        let fade_out_start = ctx.original.start + ctx.steps[previous + 1].offset;
        let fade_out_end = fade_out_start + FADE_OUT_MS;
        let last = ctx.steps[previous].active_sections.min(count).max(first);
        for section in &mut ctx.line.sections[first..last] {
            fade_out(section, fade_out_start, fade_out_end);
        }
        first = last;
    }
    ctx.line
}

fn fade_in(section: &mut Section, start: i64, end: i64) {
    let secondary = section.secondary_color;
    let target = section.current_word_fore_color.unwrap_or(section.fore_color);
    if target != secondary {
        section.animations.push(Animation::new(
            start,
            end,
            AnimationKind::ForeColor {
                from: secondary,
                to: target,
            },
        ));
    }

    if let Some(highlight) = section.current_word_shadow_color {
        let shadows: Vec<_> = section
            .shadow_colors
            .iter()
            .filter(|(_, color)| **color != highlight)
            .map(|(shadow_type, color)| (*shadow_type, *color))
            .collect();
        for (shadow_type, color) in shadows {
            section.animations.push(Animation::new(
                start,
                end,
                AnimationKind::ShadowColor {
                    shadow_type,
                    from: color,
                    to: highlight,
                },
            ));
        }
    }

    if let Some(highlight) = section.current_word_outline_color {
        if let Some(&glow) = section.shadow_colors.get(&ShadowType::Glow) {
            if glow != highlight {
                section.animations.push(Animation::new(
                    start,
                    end,
                    AnimationKind::ShadowColor {
                        shadow_type: ShadowType::Glow,
                        from: glow,
                        to: highlight,
                    },
                ));
            }
        }
    }
}

fn fade_out(section: &mut Section, start: i64, end: i64) {
    if let Some(highlight) = section.current_word_fore_color {
        if highlight != section.fore_color {
            let to = section.fore_color;
            section.animations.push(Animation::new(
                start,
                end,
                AnimationKind::ForeColor { from: highlight, to },
            ));
        }
    }

    if let Some(highlight) = section.current_word_shadow_color {
        let shadows: Vec<_> = section
            .shadow_colors
            .iter()
            .filter(|(_, color)| **color != highlight)
            .map(|(shadow_type, color)| (*shadow_type, *color))
            .collect();
        for (shadow_type, color) in shadows {
            section.animations.push(Animation::new(
                start,
                end,
                AnimationKind::ShadowColor {
                    shadow_type,
                    from: highlight,
                    to: color,
                },
            ));
        }
    }

    if let Some(highlight) = section.current_word_outline_color {
        if let Some(&glow) = section.shadow_colors.get(&ShadowType::Glow) {
            if glow != highlight {
                section.animations.push(Animation::new(
                    start,
                    end,
                    AnimationKind::ShadowColor {
                        shadow_type: ShadowType::Glow,
                        from: highlight,
                        to: glow,
                    },
                ));
            }
        }
    }
}

fn glitch(mut ctx: StepContext<'_>) -> Line {
    let target = ctx.singing().rev().find(|&index| {
        matches!(
            ctx.line.sections[index].ruby_part,
            RubyPart::None | RubyPart::Base
        )
    });
    let Some(index) = target else {
        return ctx.line;
    };
    let Some(first) = ctx.line.sections[index].text.chars().next() else {
        return ctx.line;
    };

    highlight_singing(&mut ctx);
    let start = ctx.line.start;
    let end = frame_to_end_time(start_time_to_frame(start) + 1);
    ctx.line.sections[index].animations.push(Animation::new(
        start,
        end,
        AnimationKind::GlitchChar {
            alphabet: glitch_alphabet(first),
        },
    ));
    ctx.line
}

/// One line per cursor interval within the step, caret inserted
fn cursor(
    mut ctx: StepContext<'_>,
    before: bool,
    interval: i64,
    cursors: &[String],
    formatter: &dyn CursorFormatter,
) -> Vec<Line> {
    highlight_singing(&mut ctx);
    if cursors.is_empty() || interval <= 0 || ctx.line.sections.is_empty() {
        return vec![ctx.line];
    }

    let origin = ctx.original.start;
    let first_interval = (ctx.line.start - origin) / interval;
    let last_interval = (ctx.line.end - origin) / interval;

    let active = ctx.active_sections();
    let cursor_index = if before {
        active - ctx.singing().len()
    } else {
        active
    };
    let formatting = &ctx.line.sections[cursor_index.saturating_sub(1)];

    let mut lines = Vec::new();
    for interval_index in first_interval..=last_interval {
        let mut line = ctx.line.clone();
        if interval_index > first_interval {
            line.start = round_time_to_frame_center(origin + interval_index * interval);
        }
        if interval_index < last_interval {
            line.end = round_time_to_frame_center(origin + (interval_index + 1) * interval);
        }
        if line.start == line.end {
            continue;
        }

        let cursor = &cursors[interval_index.unsigned_abs() as usize % cursors.len()];
        let caret = formatter.format_cursor(formatting, cursor);
        line.sections.splice(cursor_index..cursor_index, caret);
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::super::{emulate, expand};
    use super::*;
    use crate::utils::Color;
    use pretty_assertions::assert_eq;

    struct TextCursor;

    impl CursorFormatter for TextCursor {
        fn format_cursor(&self, formatting: &Section, cursor: &str) -> Vec<Section> {
            let mut section = formatting.formatting_only();
            section.text = cursor.to_string();
            vec![section]
        }
    }

    const RED: Color = Color::from_rgb(255, 0, 0);
    const YELLOW: Color = Color::from_rgb(255, 255, 0);

    fn karaoke_line(karaoke_type: KaraokeType, syllables: &[&str]) -> Line {
        let mut line = Line::new(0, 3000);
        line.karaoke_type = karaoke_type;
        for text in syllables {
            let mut section = Section::new(*text);
            section.fore_color = Color::WHITE;
            section.secondary_color = RED;
            section.duration = 1000;
            line.sections.push(section);
        }
        line
    }

    #[test]
    fn simple_uses_current_word_colors() {
        let mut line = karaoke_line(KaraokeType::Simple, &["a", "b"]);
        for section in &mut line.sections {
            section.current_word_fore_color = Some(YELLOW);
            section.current_word_outline_color = Some(Color::BLACK);
            section.shadow_colors.insert(ShadowType::Glow, Color::WHITE);
        }

        let lines = expand(line, &TextCursor);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].sections[0].fore_color, YELLOW);
        assert_eq!(lines[0].sections[0].shadow_colors[&ShadowType::Glow], Color::BLACK);
        assert_eq!(lines[1].sections[0].fore_color, Color::WHITE);
        assert_eq!(lines[1].sections[1].fore_color, YELLOW);
        assert!(lines
            .iter()
            .flat_map(|l| &l.sections)
            .all(|s| !s.has_current_word_colors()));
    }

    #[test]
    fn fade_in_from_secondary() {
        let line = karaoke_line(KaraokeType::Fade, &["a", "b"]);
        let lines = expand(line, &TextCursor);
        let anim = &lines[1].sections[1].animations[0];
        assert_eq!(anim.start, lines[1].start);
        assert_eq!(anim.end, lines[1].start + FADE_IN_MS);
        assert_eq!(
            anim.kind,
            AnimationKind::ForeColor {
                from: RED,
                to: Color::WHITE
            }
        );
    }

    #[test]
    fn fade_out_previous_highlight() {
        let mut line = karaoke_line(KaraokeType::Fade, &["a", "b", "c"]);
        for section in &mut line.sections {
            section.current_word_fore_color = Some(YELLOW);
        }
        let lines = expand(line, &TextCursor);
        assert_eq!(lines.len(), 3);

        let faded = &lines[2].sections[0].animations;
        assert_eq!(faded.len(), 1);
        assert_eq!(faded[0].start, 1000);
        assert_eq!(faded[0].end, 1000 + FADE_OUT_MS);
        assert_eq!(
            faded[0].kind,
            AnimationKind::ForeColor {
                from: YELLOW,
                to: Color::WHITE
            }
        );
        assert_eq!(lines[2].sections[1].animations[0].start, 2000);
    }

    #[test]
    fn glitch_scrambles_one_frame() {
        let line = karaoke_line(KaraokeType::Glitch, &["ab", "cd"]);
        let lines = expand(line, &TextCursor);
        let anim = &lines[1].sections[1].animations[0];
        assert!(anim.affects_text());
        assert_eq!(anim.start, lines[1].start);
        assert!(anim.end > anim.start && anim.end - anim.start < 70);
    }

    #[test]
    fn glitch_skips_ruby_text() {
        let mut line = karaoke_line(KaraokeType::Glitch, &["a", "b"]);
        line.sections[1].ruby_part = RubyPart::RubyAbove;
        let lines = expand(line, &TextCursor);
        assert!(lines[1].sections[1].animations.is_empty());
    }

    #[test]
    fn cursor_after_singing_syllable() {
        let line = karaoke_line(
            KaraokeType::Cursor {
                before: false,
                interval: 3_600_000,
                cursors: vec!["_".to_string()],
            },
            &["a", "b", "c"],
        );
        let lines = emulate(&line, &TextCursor);
        let texts: Vec<String> = lines.iter().map(Line::text).collect();
        assert_eq!(texts, vec!["a_bc", "ab_c", "abc_"]);
    }

    #[test]
    fn cursor_before_blinks_per_interval() {
        let line = karaoke_line(
            KaraokeType::Cursor {
                before: true,
                interval: 500,
                cursors: vec!["|".to_string(), " ".to_string()],
            },
            &["a", "b", "c"],
        );
        let lines = emulate(&line, &TextCursor);
        let texts: Vec<String> = lines.iter().map(Line::text).collect();
        assert_eq!(texts[..2], ["|abc".to_string(), " abc".to_string()]);
        assert_eq!(texts[2], "a|bc");
        assert!(lines.windows(2).all(|w| w[0].end <= w[1].start));
    }
}
