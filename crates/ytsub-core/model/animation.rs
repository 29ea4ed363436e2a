//! Continuous property animations
//!
//! Every animation mutates exactly one property of a line or of one of its
//! sections. [`Animation::apply`] is a pure function of the progress value:
//! the randomized kinds seed their generator from the start time and the
//! progress so that repeated compilation produces identical output.

use super::{Line, PointF, Section, ShadowType};
use crate::utils::{CharRange, Color};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Property an animation drives, with its start and end values
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationKind {
    /// Section foreground color
    ForeColor { from: Color, to: Color },
    /// Section background color
    BackColor { from: Color, to: Color },
    /// Section secondary (unsung karaoke) color
    SecondaryColor { from: Color, to: Color },
    /// One named shadow color of a section
    ShadowColor {
        shadow_type: ShadowType,
        from: Color,
        to: Color,
    },
    /// Section scale
    Scale { from: f32, to: f32 },
    /// Line position
    Move { from: PointF, to: PointF },
    /// Line alpha multiplier
    Fade { from: u8, to: u8 },
    /// Replaces a section's text by one random character from `alphabet`
    GlitchChar { alphabet: &'static [CharRange] },
    /// Jitters the line position around `center` by up to `radius`
    Shake { center: PointF, radius: PointF },
}

impl AnimationKind {
    /// Whether the animation targets the line rather than a section
    #[must_use]
    pub const fn is_line_scoped(&self) -> bool {
        matches!(self, Self::Move { .. } | Self::Fade { .. } | Self::Shake { .. })
    }

    /// Whether both animations drive the same property
    ///
    /// Shadow animations of different kinds count as the same property.
    #[must_use]
    pub fn same_property(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }

    #[must_use]
    pub const fn is_color(&self) -> bool {
        matches!(
            self,
            Self::ForeColor { .. }
                | Self::BackColor { .. }
                | Self::SecondaryColor { .. }
                | Self::ShadowColor { .. }
        )
    }
}

/// Time-bounded interpolation of one property
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    /// Absolute start time in ms
    pub start: i64,
    /// Absolute end time in ms
    pub end: i64,
    /// Exponent applied to the normalized progress, 1 is linear
    pub acceleration: f32,
    pub kind: AnimationKind,
}

impl Animation {
    /// Create a linear animation
    #[must_use]
    pub const fn new(start: i64, end: i64, kind: AnimationKind) -> Self {
        Self {
            start,
            end,
            acceleration: 1.0,
            kind,
        }
    }

    /// Same animation with a different acceleration exponent
    #[must_use]
    pub const fn with_acceleration(mut self, acceleration: f32) -> Self {
        self.acceleration = acceleration;
        self
    }

    /// Whether the value before `start` is defined as the start value
    #[must_use]
    pub const fn affects_past(&self) -> bool {
        matches!(self.kind, AnimationKind::Move { .. } | AnimationKind::Fade { .. })
    }

    /// Whether the animation rewrites section text
    #[must_use]
    pub const fn affects_text(&self) -> bool {
        matches!(self.kind, AnimationKind::GlitchChar { .. })
    }

    fn eased(&self, progress: f32) -> f32 {
        progress.powf(self.acceleration)
    }

    fn rng(&self, progress: f32) -> StdRng {
        let seed = (self.start as u64) ^ (u64::from(progress.to_bits()) << 32);
        StdRng::seed_from_u64(seed)
    }

    /// Write the value at `progress` (0..=1) into the target property
    ///
    /// Line-scoped kinds mutate `line`; section-scoped kinds mutate the
    /// section at `section_index` and do nothing without one.
    pub fn apply(&self, line: &mut Line, section_index: Option<usize>, progress: f32) {
        if self.kind.is_line_scoped() {
            self.apply_to_line(line, progress);
        } else if let Some(section) = section_index.and_then(|idx| line.sections.get_mut(idx)) {
            self.apply_to_section(section, progress);
        }
    }

    fn apply_to_line(&self, line: &mut Line, progress: f32) {
        let t = self.eased(progress);
        match &self.kind {
            AnimationKind::Move { from, to } => {
                line.position = Some(PointF::new(
                    from.x + (to.x - from.x) * t,
                    from.y + (to.y - from.y) * t,
                ));
            }
            AnimationKind::Fade { from, to } => {
                let value = i32::from(*from) + ((i32::from(*to) - i32::from(*from)) as f32 * t) as i32;
                line.alpha = value.clamp(0, 255) as u8;
            }
            AnimationKind::Shake { center, radius } => {
                if progress > 0.0 && progress < 1.0 {
                    let mut rng = self.rng(progress);
                    let dx = radius.x * (rng.gen::<f32>() * 2.0 - 1.0);
                    let dy = radius.y * (rng.gen::<f32>() * 2.0 - 1.0);
                    line.position = Some(PointF::new(center.x + dx, center.y + dy));
                } else {
                    line.position = Some(*center);
                }
            }
            _ => {}
        }
    }

    fn apply_to_section(&self, section: &mut Section, progress: f32) {
        let t = self.eased(progress);
        match &self.kind {
            AnimationKind::ForeColor { from, to } => section.fore_color = Color::lerp(*from, *to, t),
            AnimationKind::BackColor { from, to } => section.back_color = Color::lerp(*from, *to, t),
            AnimationKind::SecondaryColor { from, to } => {
                section.secondary_color = Color::lerp(*from, *to, t);
            }
            AnimationKind::ShadowColor {
                shadow_type,
                from,
                to,
            } => {
                section
                    .shadow_colors
                    .insert(*shadow_type, Color::lerp(*from, *to, t));
            }
            AnimationKind::Scale { from, to } => section.scale = from + (to - from) * t,
            AnimationKind::GlitchChar { alphabet } => {
                if progress > 0.0 && progress < 1.0 && !alphabet.is_empty() {
                    let mut rng = self.rng(progress);
                    let range = alphabet[rng.gen_range(0..alphabet.len())];
                    if let Some(c) = range.nth(rng.gen_range(0..range.len().max(1))) {
                        section.text = c.to_string();
                    }
                }
            }
            _ => {}
        }
    }
}
