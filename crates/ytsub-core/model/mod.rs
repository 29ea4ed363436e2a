//! Structural subtitle model shared by every pipeline stage
//!
//! A [`Line`] is a display interval holding styled [`Section`]s and pending
//! [`Animation`]s. The tag interpreter builds lines, the karaoke expander and
//! the animator replace them with discrete variants, and the writers read
//! them.

mod animation;
mod line;
mod section;

pub use animation::{Animation, AnimationKind};
pub use line::{KaraokeType, Line};
pub use section::Section;

/// One of the nine compass reference points a line is positioned by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum AnchorPoint {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    Center,
    MiddleRight,
    BottomLeft,
    #[default]
    BottomCenter,
    BottomRight,
}

impl AnchorPoint {
    /// All anchor points in numbering order
    pub const ALL: [Self; 9] = [
        Self::TopLeft,
        Self::TopCenter,
        Self::TopRight,
        Self::MiddleLeft,
        Self::Center,
        Self::MiddleRight,
        Self::BottomLeft,
        Self::BottomCenter,
        Self::BottomRight,
    ];

    /// Anchor for a numpad-style alignment (1 = bottom left, 9 = top right)
    #[must_use]
    pub const fn from_numpad(alignment: i32) -> Option<Self> {
        Some(match alignment {
            1 => Self::BottomLeft,
            2 => Self::BottomCenter,
            3 => Self::BottomRight,
            4 => Self::MiddleLeft,
            5 => Self::Center,
            6 => Self::MiddleRight,
            7 => Self::TopLeft,
            8 => Self::TopCenter,
            9 => Self::TopRight,
            _ => return None,
        })
    }

    /// Numpad-style alignment of this anchor
    #[must_use]
    pub const fn to_numpad(self) -> i32 {
        match self {
            Self::BottomLeft => 1,
            Self::BottomCenter => 2,
            Self::BottomRight => 3,
            Self::MiddleLeft => 4,
            Self::Center => 5,
            Self::MiddleRight => 6,
            Self::TopLeft => 7,
            Self::TopCenter => 8,
            Self::TopRight => 9,
        }
    }

    #[must_use]
    pub const fn is_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::MiddleLeft | Self::BottomLeft)
    }

    #[must_use]
    pub const fn is_center(self) -> bool {
        matches!(self, Self::TopCenter | Self::Center | Self::BottomCenter)
    }

    #[must_use]
    pub const fn is_right(self) -> bool {
        matches!(self, Self::TopRight | Self::MiddleRight | Self::BottomRight)
    }

    #[must_use]
    pub const fn is_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopCenter | Self::TopRight)
    }

    #[must_use]
    pub const fn is_middle(self) -> bool {
        matches!(self, Self::MiddleLeft | Self::Center | Self::MiddleRight)
    }

    #[must_use]
    pub const fn is_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::BottomCenter | Self::BottomRight)
    }

    /// Mirror top and bottom, leaving the middle row untouched
    #[must_use]
    pub const fn vertical_opposite(self) -> Self {
        match self {
            Self::TopLeft => Self::BottomLeft,
            Self::TopCenter => Self::BottomCenter,
            Self::TopRight => Self::BottomRight,
            Self::BottomLeft => Self::TopLeft,
            Self::BottomCenter => Self::TopCenter,
            Self::BottomRight => Self::TopRight,
            other => other,
        }
    }

    /// Same column, top row
    #[must_use]
    pub const fn make_top_aligned(self) -> Self {
        match self {
            Self::MiddleLeft | Self::BottomLeft => Self::TopLeft,
            Self::Center | Self::BottomCenter => Self::TopCenter,
            Self::MiddleRight | Self::BottomRight => Self::TopRight,
            other => other,
        }
    }

    /// Same column, bottom row
    #[must_use]
    pub const fn make_bottom_aligned(self) -> Self {
        match self {
            Self::TopLeft | Self::MiddleLeft => Self::BottomLeft,
            Self::TopCenter | Self::Center => Self::BottomCenter,
            Self::TopRight | Self::MiddleRight => Self::BottomRight,
            other => other,
        }
    }
}

/// Kind of edge effect drawn around text
///
/// The declaration order is the map order used for shadow tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShadowType {
    Glow,
    Bevel,
    HardShadow,
    SoftShadow,
}

impl ShadowType {
    /// Layer order used when a line carries several shadows at once
    pub const LAYER_ORDER: [Self; 4] = [
        Self::SoftShadow,
        Self::HardShadow,
        Self::Bevel,
        Self::Glow,
    ];
}

/// Vertical text offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OffsetType {
    #[default]
    Regular,
    Subscript,
    Superscript,
}

/// Role of a section inside a ruby annotation group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RubyPart {
    #[default]
    None,
    Base,
    Parenthesis,
    RubyAbove,
    RubyBelow,
}

impl RubyPart {
    /// Whether this section holds the annotation text itself
    #[must_use]
    pub const fn is_ruby_text(self) -> bool {
        matches!(self, Self::RubyAbove | Self::RubyBelow)
    }
}

/// Where `[base/ruby]` markup places its annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RubyPosition {
    #[default]
    None,
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalTextDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalTextType {
    #[default]
    None,
    Positioned,
    Rotated,
}

/// Pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Video canvas dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Position an unpositioned line with `anchor` is displayed at
    ///
    /// Lines sit 2% inside the canvas edges.
    #[must_use]
    pub fn default_position(&self, anchor: AnchorPoint) -> PointF {
        let width = self.width as f32;
        let height = self.height as f32;

        let x = if anchor.is_left() {
            width * 0.02
        } else if anchor.is_center() {
            width / 2.0
        } else {
            width * 0.98
        };
        let y = if anchor.is_top() {
            height * 0.02
        } else if anchor.is_middle() {
            height / 2.0
        } else {
            height * 0.98
        };
        PointF::new(x, y)
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}
