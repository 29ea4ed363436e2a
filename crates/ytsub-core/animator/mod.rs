//! Animation timeline compiler
//!
//! Replaces the continuous animations of a line by a sequence of static
//! lines on the target's frame grid. Overlapping animations are grouped into
//! clusters; inside a cluster one line is emitted per pair of frames,
//! evaluated at the pair's center. The time between clusters is covered by a
//! single line holding the values the previous cluster ended with.
//!
//! ```rust
//! use ytsub_core::animator;
//! use ytsub_core::model::{Animation, AnimationKind, Line, PointF, Section, Size};
//!
//! let mut line = Line::with_section(0, 1000, Section::new("moving"));
//! line.animations.push(Animation::new(
//!     0,
//!     1000,
//!     AnimationKind::Move {
//!         from: PointF::new(0.0, 0.0),
//!         to: PointF::new(100.0, 100.0),
//!     },
//! ));
//!
//! let frames = animator::expand(line, Size::new(1280, 720));
//! assert!(frames.len() > 2);
//! assert!(frames.iter().all(|frame| !frame.has_animations()));
//! ```

pub mod cluster;

use crate::model::{Line, PointF, Size};
use crate::utils::time::{
    end_time_to_frame, frame_to_end_time, frame_to_start_time, round_time_to_frame_center,
    start_time_to_frame,
};
use cluster::{cluster_animations, collect_animations, Cluster, IndexedAnimation};
use tracing::debug;

/// Frames covered by one emitted line inside a cluster
const FRAME_STEP: i64 = 2;

/// Compile the animations of `line` into static lines
///
/// A line without animations comes back unchanged. Otherwise the returned
/// lines are ordered, carry no animations, start at the line's snapped start
/// and the last one ends at the line's end.
#[must_use]
pub fn expand(line: Line, video_dimensions: Size) -> Vec<Line> {
    if !line.has_animations() {
        return vec![line];
    }

    if collect_animations(&line).is_empty() {
        let mut line = line;
        strip_animations(&mut line);
        return vec![line];
    }

    let animations = collect_animations(&line);

    let default_position = video_dimensions.default_position(line.anchor_point);
    let clusters = cluster_animations(&line, &animations);

    let mut lines: Vec<Line> = Vec::new();
    let mut last = initial_line(&line, &animations);
    let mut last_emitted = false;
    if clusters.first().map_or(true, |cluster| cluster.range.start > last.start) {
        lines.push(last.clone());
        last_emitted = true;
    }

    for (idx, cluster) in clusters.iter().enumerate() {
        for frame in frame_lines(&last, cluster, default_position) {
            if last_emitted {
                if let Some(previous) = lines.last_mut() {
                    previous.end = frame.start;
                }
            }
            last = frame.clone();
            lines.push(frame);
            last_emitted = true;
        }

        let gap_start = cluster.range.end;
        let gap_end = clusters.get(idx + 1).map_or(line.end, |next| next.range.start);
        if gap_end > gap_start {
            let post = post_cluster_line(&line, &last, gap_start, gap_end, cluster);
            last = post.clone();
            lines.push(post);
            last_emitted = true;
        }
    }

    if last_emitted {
        if let Some(final_line) = lines.last_mut() {
            final_line.end = line.end;
        }
    } else {
        last.end = line.end;
        lines.push(last);
    }

    for output in &mut lines {
        strip_animations(output);
    }
    debug!(
        clusters = clusters.len(),
        lines = lines.len(),
        start = line.start,
        "expanded animations"
    );
    lines
}

fn strip_animations(line: &mut Line) {
    line.animations.clear();
    for section in &mut line.sections {
        section.animations.clear();
    }
}

/// State at the line start
///
/// Animations that ended before the line are applied at their end value;
/// past-affecting animations that start later are applied at their start
/// value, latest first so that the earliest one wins.
fn initial_line(original: &Line, animations: &[IndexedAnimation<'_>]) -> Line {
    let mut line = original.clone();
    line.start = round_time_to_frame_center(line.start);

    let mut finished: Vec<&IndexedAnimation<'_>> = animations
        .iter()
        .filter(|anim| anim.animation.end < original.start)
        .collect();
    finished.sort_by_key(|anim| anim.animation.end);
    for anim in finished {
        anim.apply(&mut line, 1.0);
    }

    let mut upcoming: Vec<&IndexedAnimation<'_>> = animations
        .iter()
        .filter(|anim| anim.animation.affects_past() && anim.animation.start >= original.start)
        .collect();
    upcoming.sort_by_key(|anim| std::cmp::Reverse(anim.animation.start));
    for anim in upcoming {
        anim.apply(&mut line, 0.0);
    }

    line
}

/// Line holding the final values of `cluster` during `[start, end)`
fn post_cluster_line(
    original: &Line,
    last: &Line,
    start: i64,
    end: i64,
    cluster: &Cluster<'_>,
) -> Line {
    let mut line = last.clone();
    line.start = start;
    line.end = end;

    let mut finished = cluster.animations.clone();
    finished.sort_by_key(|anim| anim.animation.end);
    for anim in &finished {
        if anim.animation.affects_text() {
            reset_text(&mut line, original);
        }
        anim.apply(&mut line, 1.0);
    }
    line
}

/// One line per frame pair of `cluster`, starting from the state of `previous`
fn frame_lines(previous: &Line, cluster: &Cluster<'_>, default_position: PointF) -> Vec<Line> {
    let first_frame = start_time_to_frame(cluster.range.start);
    let last_frame = end_time_to_frame(cluster.range.end);
    let partial_step = (last_frame + 1 - first_frame).rem_euclid(FRAME_STEP);
    let last_iteration = last_frame + 1 - partial_step - FRAME_STEP;
    let resets_text = cluster
        .animations
        .iter()
        .any(|anim| anim.animation.affects_text());
    let position = previous.position.unwrap_or(default_position);

    let mut lines = Vec::new();
    let mut current = previous.clone();
    let mut frame = first_frame;
    while frame <= last_iteration {
        current.start = frame_to_start_time(frame);
        current.end = if frame < last_iteration {
            frame_to_end_time(frame + FRAME_STEP - 1)
        } else {
            cluster.range.end
        };
        current.position = Some(position);
        if resets_text {
            reset_text(&mut current, previous);
        }

        let center = frame as f32 + (FRAME_STEP - 1) as f32 / 2.0;
        for anim in &cluster.animations {
            let anim_start = start_time_to_frame(anim.animation.start);
            let anim_end = end_time_to_frame(anim.animation.end);
            if center >= anim_start as f32 && center < anim_end as f32 {
                let progress = (center - anim_start as f32) / (anim_end - anim_start) as f32;
                anim.apply(&mut current, progress);
            } else if center >= anim_end as f32 && center < (anim_end + FRAME_STEP) as f32 {
                anim.apply(&mut current, 1.0);
            }
        }

        lines.push(current.clone());
        frame += FRAME_STEP;
    }
    lines
}

fn reset_text(line: &mut Line, source: &Line) {
    for (section, original) in line.sections.iter_mut().zip(&source.sections) {
        section.text.clone_from(&original.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Animation, AnimationKind, Section};
    use crate::utils::{glitch_alphabet, Color};
    use pretty_assertions::assert_eq;

    const VIDEO: Size = Size::new(1280, 720);

    fn text_line(start: i64, end: i64) -> Line {
        let mut section = Section::new("text");
        section.fore_color = Color::WHITE;
        Line::with_section(start, end, section)
    }

    fn assert_ordered(lines: &[Line]) {
        assert!(lines.iter().all(|l| l.start < l.end), "{lines:#?}");
        assert!(lines.windows(2).all(|w| w[0].end <= w[1].start), "{lines:#?}");
    }

    #[test]
    fn static_line_is_unchanged() {
        let line = text_line(100, 900);
        assert_eq!(expand(line.clone(), VIDEO), vec![line]);
    }

    #[test]
    fn degenerate_animations_are_dropped() {
        let mut line = text_line(0, 1000);
        line.animations.push(Animation::new(
            500,
            500,
            AnimationKind::Fade { from: 0, to: 255 },
        ));
        let lines = expand(line, VIDEO);
        assert_eq!(lines.len(), 1);
        assert!(!lines[0].has_animations());
        assert_eq!(lines[0].alpha, 255);
    }

    #[test]
    fn move_approaches_target() {
        let mut line = text_line(0, 1000);
        line.animations.push(Animation::new(
            0,
            1000,
            AnimationKind::Move {
                from: PointF::new(0.0, 0.0),
                to: PointF::new(100.0, 100.0),
            },
        ));

        let lines = expand(line, VIDEO);
        assert!(lines.len() >= 2);
        assert_ordered(&lines);
        assert_eq!(lines.last().unwrap().end, 1000);

        let xs: Vec<f32> = lines.iter().map(|l| l.position.unwrap().x).collect();
        assert!(xs.windows(2).all(|w| w[0] <= w[1]), "{xs:?}");
        assert!(xs[xs.len() - 1] > 90.0);
    }

    #[test]
    fn color_change_in_the_middle() {
        let mut line = text_line(0, 3000);
        line.sections[0].animations.push(Animation::new(
            1000,
            1500,
            AnimationKind::ForeColor {
                from: Color::WHITE,
                to: Color::BLACK,
            },
        ));

        let lines = expand(line, VIDEO);
        assert_ordered(&lines);
        let first = &lines[0];
        assert_eq!(first.start, 0);
        assert_eq!(first.sections[0].fore_color, Color::WHITE);

        let last = lines.last().unwrap();
        assert_eq!(last.end, 3000);
        assert_eq!(last.sections[0].fore_color, Color::BLACK);
        assert!(last.start > 1000);
        assert!(lines.len() > 3);
    }

    #[test]
    fn later_fade_in_defines_initial_alpha() {
        let mut line = text_line(0, 2000);
        line.animations.push(Animation::new(
            500,
            800,
            AnimationKind::Fade { from: 0, to: 255 },
        ));
        let lines = expand(line, VIDEO);
        assert_eq!(lines[0].alpha, 0);
        assert_eq!(lines.last().unwrap().alpha, 255);
    }

    #[test]
    fn finished_animation_applies_end_value() {
        let mut line = text_line(1000, 2000);
        line.sections[0].animations.push(Animation::new(
            0,
            500,
            AnimationKind::ForeColor {
                from: Color::WHITE,
                to: Color::BLACK,
            },
        ));
        line.sections[0].animations.push(Animation::new(
            1500,
            1700,
            AnimationKind::Scale { from: 1.0, to: 2.0 },
        ));
        let lines = expand(line, VIDEO);
        assert_eq!(lines[0].sections[0].fore_color, Color::BLACK);
        assert_eq!(lines[0].sections[0].scale, 1.0);
        assert_eq!(lines.last().unwrap().sections[0].scale, 2.0);
    }

    #[test]
    fn glitch_text_is_restored() {
        let mut line = text_line(0, 1000);
        line.sections[0].animations.push(Animation::new(
            100,
            400,
            AnimationKind::GlitchChar {
                alphabet: glitch_alphabet('t'),
            },
        ));
        let lines = expand(line, VIDEO);
        assert_eq!(lines.last().unwrap().text(), "text");
        assert!(lines.iter().any(|l| l.text() != "text"));
    }
}
