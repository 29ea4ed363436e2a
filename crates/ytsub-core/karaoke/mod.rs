//! Karaoke step expansion
//!
//! A line whose sections carry `\k` durations is split into one line per
//! highlight boundary ("step"). Sections up to and including the singing
//! syllable show their regular color; later sections show their secondary
//! color. The line's [`KaraokeType`] then decorates each step, see
//! [`strategies`].
//!
//! Lines that the target can time natively (plain strategy, transparent
//! secondary color, nothing animated) are kept as one line whose sections
//! get cumulative start offsets instead.
//!
//! # Example
//!
//! ```rust
//! use ytsub_core::karaoke::{expand, CursorFormatter};
//! use ytsub_core::model::{Line, Section};
//! use ytsub_core::utils::Color;
//!
//! struct NoCursor;
//! impl CursorFormatter for NoCursor {
//!     fn format_cursor(&self, _: &Section, _: &str) -> Vec<Section> {
//!         Vec::new()
//!     }
//! }
//!
//! let mut line = Line::new(0, 1000);
//! for text in ["ka", "ra"] {
//!     let mut section = Section::new(text);
//!     section.fore_color = Color::WHITE;
//!     section.secondary_color = Color::from_rgb(255, 0, 0);
//!     section.duration = 500;
//!     line.sections.push(section);
//! }
//!
//! let steps = expand(line, &NoCursor);
//! assert_eq!(steps.len(), 2);
//! assert_eq!(steps[0].sections[1].fore_color, Color::from_rgb(255, 0, 0));
//! ```

pub mod strategies;

use crate::ass::interpreter::KARAOKE_PLACEHOLDER;
use crate::model::{Animation, AnimationKind, KaraokeType, Line, Section};
use crate::utils::time::round_time_to_frame_center;
use crate::utils::Color;
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::debug;

/// Interprets cursor override-tag strings into sections
///
/// Implemented by the tag interpreter; the cursor strategy calls it with the
/// formatting of the section next to the cursor.
pub trait CursorFormatter {
    fn format_cursor(&self, formatting: &Section, cursor: &str) -> Vec<Section>;
}

/// Highlight boundary of a karaoke line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KaraokeStep {
    /// Offset from the line start in ms
    pub offset: i64,
    /// Number of sections sung once this step begins
    pub active_sections: usize,
}

/// Highlight boundaries of `line`
///
/// Sections without a duration join the step of the preceding syllable.
#[must_use]
pub fn karaoke_steps(line: &Line) -> Vec<KaraokeStep> {
    let mut steps: BTreeMap<i64, usize> = BTreeMap::new();
    let mut offset = 0;
    for (index, section) in line.sections.iter().enumerate() {
        let active_sections = index + 1;
        if section.duration > 0 {
            steps.insert(offset, active_sections);
            offset += section.duration;
        } else {
            let last = steps.keys().next_back().copied().unwrap_or(0);
            steps.insert(last, active_sections);
        }
    }

    steps
        .into_iter()
        .map(|(offset, active_sections)| KaraokeStep {
            offset,
            active_sections,
        })
        .collect()
}

/// Whether the target can show the karaoke of `line` by itself
#[must_use]
pub fn can_use_native_karaoke(line: &Line) -> bool {
    line.karaoke_type == KaraokeType::Simple
        && line.animations.is_empty()
        && line.sections.iter().all(|section| {
            section.secondary_color.a == 0
                && !section.has_current_word_colors()
                && section.animations.is_empty()
                && section.duration != 0
        })
}

/// Give each section its cumulative start offset
pub fn apply_native_karaoke(line: &mut Line) {
    let mut offset = 0;
    for section in &mut line.sections {
        section.start_offset = offset;
        offset += section.duration;
    }
}

/// Syllable duration of every section
///
/// Lines that only carry native start offsets get each duration from the
/// distance to the next offset, the last syllable running to the line end.
#[must_use]
pub fn syllable_durations(line: &Line) -> Vec<i64> {
    let timed_by_offset = line.sections.iter().all(|section| section.duration == 0)
        && line.sections.iter().any(|section| section.start_offset > 0);
    if !timed_by_offset {
        return line.sections.iter().map(|section| section.duration).collect();
    }

    let offsets: Vec<i64> = line.sections.iter().map(|section| section.start_offset).collect();
    offsets
        .iter()
        .enumerate()
        .map(|(idx, &offset)| {
            let next = offsets.get(idx + 1).copied().unwrap_or_else(|| line.duration());
            (next - offset).max(0)
        })
        .collect()
}

/// Fill in syllable durations from native start offsets, see [`syllable_durations`]
pub fn restore_durations(line: &mut Line) {
    let durations = syllable_durations(line);
    for (section, duration) in line.sections.iter_mut().zip(durations) {
        section.duration = duration;
    }
}

/// Expand the karaoke of `line` into discrete steps
///
/// Lines without syllable timing and natively timed lines come back as a
/// single line. Current-word colors are cleared on every returned line.
pub fn expand(mut line: Line, formatter: &dyn CursorFormatter) -> Vec<Line> {
    if line.sections.iter().all(|section| section.duration == 0) {
        clear_current_word_colors(&mut line);
        return vec![line];
    }

    if can_use_native_karaoke(&line) {
        apply_native_karaoke(&mut line);
        clear_current_word_colors(&mut line);
        return vec![line];
    }

    emulate(&line, formatter)
}

/// One line per karaoke step of `line`, regardless of native support
#[must_use]
pub fn emulate(line: &Line, formatter: &dyn CursorFormatter) -> Vec<Line> {
    let steps = karaoke_steps(line);
    let mut lines = Vec::with_capacity(steps.len());
    for index in 0..steps.len() {
        let Some(step_line) = create_step_line(line, &steps, index) else {
            continue;
        };

        let ctx = StepContext {
            original: line,
            steps: &steps,
            index,
            line: step_line,
        };
        for mut result in strategies::apply(ctx, formatter) {
            result.sections.retain(|section| section.text != KARAOKE_PLACEHOLDER);
            clear_current_word_colors(&mut result);
            lines.push(result);
        }
    }

    debug!(steps = steps.len(), lines = lines.len(), "emulated karaoke");
    lines
}

fn clear_current_word_colors(line: &mut Line) {
    for section in &mut line.sections {
        section.clear_current_word_colors();
    }
}

/// Clone of `original` narrowed to step `index`, sung state applied
fn create_step_line(original: &Line, steps: &[KaraokeStep], index: usize) -> Option<Line> {
    let step = steps[index];
    let start = round_time_to_frame_center(original.start + step.offset);
    if start >= original.end {
        return None;
    }
    let end = steps.get(index + 1).map_or(original.end, |next| {
        round_time_to_frame_center(original.start + next.offset).min(original.end)
    });
    // Syllables shorter than a frame can snap onto the next step
    if end <= start {
        return None;
    }

    let mut line = original.clone();
    line.start = start;
    line.end = end;

    let (sung, unsung) = line.sections.split_at_mut(step.active_sections.min(original.sections.len()));
    for section in sung {
        section.duration = 0;
        section.start_offset = 0;
        section.remove_animations(|kind| matches!(kind, AnimationKind::SecondaryColor { .. }));
    }
    for section in unsung {
        show_unsung(section);
    }
    Some(line)
}

/// Switch a not yet sung section to its secondary color
fn show_unsung(section: &mut Section) {
    section.duration = 0;
    section.start_offset = 0;
    section.fore_color = section.secondary_color;

    section.remove_animations(|kind| matches!(kind, AnimationKind::ForeColor { .. }));
    for anim in &mut section.animations {
        if let AnimationKind::SecondaryColor { from, to } = anim.kind {
            *anim = Animation::new(anim.start, anim.end, AnimationKind::ForeColor { from, to })
                .with_acceleration(anim.acceleration);
        }
    }

    let fore_animated = section
        .animations
        .iter()
        .any(|anim| matches!(anim.kind, AnimationKind::ForeColor { .. }));
    if section.fore_color.a == 0 && !fore_animated {
        section.fore_color = Color::EMPTY;
        section.back_color = Color::EMPTY;
        section.shadow_colors.clear();
    }
}

/// State handed to a highlight strategy for one step
#[derive(Debug)]
pub struct StepContext<'a> {
    /// Line before expansion
    pub original: &'a Line,
    pub steps: &'a [KaraokeStep],
    pub index: usize,
    /// Line of this step, with sung and unsung colors applied
    pub line: Line,
}

impl StepContext<'_> {
    /// Number of sections sung once this step begins
    #[must_use]
    pub fn active_sections(&self) -> usize {
        self.steps[self.index].active_sections.min(self.line.sections.len())
    }

    /// Indices of the sections that start singing in this step
    #[must_use]
    pub fn singing(&self) -> Range<usize> {
        let previous = if self.index > 0 {
            self.steps[self.index - 1].active_sections
        } else {
            0
        };
        previous.min(self.active_sections())..self.active_sections()
    }
}
