//! Grouping of overlapping animations into time clusters

use crate::model::{Animation, AnimationKind, Line};
use crate::utils::time::round_time_to_frame_center;
use crate::utils::TimeRange;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Animation together with the section it belongs to
#[derive(Debug, Clone, Copy)]
pub struct IndexedAnimation<'a> {
    pub animation: &'a Animation,
    /// `None` for line-scoped animations
    pub section: Option<usize>,
}

impl IndexedAnimation<'_> {
    #[must_use]
    pub const fn range(&self) -> TimeRange {
        TimeRange::new(self.animation.start, self.animation.end)
    }

    /// Write the value at `progress` into `line`
    pub fn apply(&self, line: &mut Line, progress: f32) {
        self.animation.apply(line, self.section, progress);
    }
}

/// Animations that run during one span of the line
#[derive(Debug, Clone)]
pub struct Cluster<'a> {
    /// Span snapped to frame boundaries and clipped to the line
    pub range: TimeRange,
    pub animations: Vec<IndexedAnimation<'a>>,
}

/// Every animation of `line` that has a duration
///
/// Move animations come first, then the other line-scoped animations, then
/// section animations in section order.
#[must_use]
pub fn collect_animations(line: &Line) -> Vec<IndexedAnimation<'_>> {
    let (moves, others): (Vec<&Animation>, Vec<&Animation>) = line
        .animations
        .iter()
        .partition(|anim| matches!(anim.kind, AnimationKind::Move { .. }));

    let line_scoped = moves
        .into_iter()
        .chain(others)
        .map(|animation| IndexedAnimation {
            animation,
            section: None,
        });
    let section_scoped = line.sections.iter().enumerate().flat_map(|(index, section)| {
        section.animations.iter().map(move |animation| IndexedAnimation {
            animation,
            section: Some(index),
        })
    });

    line_scoped
        .chain(section_scoped)
        .filter(|anim| anim.animation.end > anim.animation.start)
        .collect()
}

/// Merge ranges until no two of them overlap
///
/// Each range is unioned with every collected range it overlaps; ranges that
/// only touch stay separate.
#[must_use]
pub fn merge_overlapping(ranges: impl IntoIterator<Item = TimeRange>) -> Vec<TimeRange> {
    let mut merged: Vec<TimeRange> = Vec::new();
    for range in ranges {
        let mut range = range;
        let mut idx = merged.len();
        while idx > 0 {
            idx -= 1;
            if merged[idx].overlaps(&range) {
                range = range.union(&merged[idx]);
                merged.remove(idx);
                // The grown range may now overlap entries already passed
                idx = merged.len();
            }
        }
        merged.push(range);
    }
    merged
}

/// Clusters of `animations` inside `line`, in time order
///
/// Cluster spans are clipped to the line and snapped to frame boundaries.
/// Clusters that snap to the same start are combined.
#[must_use]
pub fn cluster_animations<'a>(line: &Line, animations: &[IndexedAnimation<'a>]) -> Vec<Cluster<'a>> {
    let line_range = TimeRange::new(line.start, line.end);
    let mut clusters: BTreeMap<i64, Cluster<'a>> = BTreeMap::new();

    for range in merge_overlapping(animations.iter().map(IndexedAnimation::range)) {
        let Some(clipped) = range.intersection(&line_range) else {
            continue;
        };

        let members: Vec<IndexedAnimation<'a>> = animations
            .iter()
            .filter(|anim| range.contains(anim.animation.start))
            .copied()
            .collect();

        let snapped = TimeRange::new(
            round_time_to_frame_center(clipped.start),
            round_time_to_frame_center(clipped.end),
        );
        match clusters.entry(snapped.start) {
            Entry::Occupied(mut entry) => {
                let cluster = entry.get_mut();
                cluster.range.end = cluster.range.end.max(snapped.end);
                cluster.animations.extend(members);
            }
            Entry::Vacant(entry) => {
                entry.insert(Cluster {
                    range: snapped,
                    animations: members,
                });
            }
        }
    }

    clusters.into_values().collect()
}
