//! Attribute tables and id mappings of the timed-text head
//!
//! Body entries reference window positions (`wp`), window styles (`ws`) and
//! pens by id. Equal attributes share one id; ids are handed out in first-use
//! order starting at 1, since entry 0 is a dummy.

use crate::model::{
    AnchorPoint, HorizontalTextDirection, Line, OffsetType, PointF, RubyPart, Section, ShadowType,
    Size, VerticalTextType,
};
use crate::utils::hashers::create_hash_map;
use crate::utils::{Color, CoreError, Result};
use ahash::RandomState;
use std::collections::HashMap;
use std::hash::Hash;

/// Shadow color the player derives from the foreground opacity
pub const DEFAULT_SHADOW_RGB: Color = Color::from_rgb(0x22, 0x22, 0x22);

/// Position table key: anchor plus player percentage coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowPosition {
    pub anchor_point: AnchorPoint,
    pub horizontal: i32,
    pub vertical: i32,
}

impl WindowPosition {
    /// Position `line` is shown at on a `video` canvas
    #[must_use]
    pub fn of_line(line: &Line, video: Size) -> Self {
        let pixel = line
            .position
            .unwrap_or_else(|| video.default_position(line.anchor_point));
        Self::from_pixels(line.anchor_point, pixel, video)
    }

    #[must_use]
    pub fn from_pixels(anchor_point: AnchorPoint, pixel: PointF, video: Size) -> Self {
        Self {
            anchor_point,
            horizontal: player_coordinate(pixel.x, video.width as f32),
            vertical: player_coordinate(pixel.y, video.height as f32),
        }
    }

    /// Pixel position on `video` that this entry is displayed at
    #[must_use]
    pub fn to_pixels(self, video: Size) -> PointF {
        PointF::new(
            pixel_coordinate(self.horizontal, video.width as f32),
            pixel_coordinate(self.vertical, video.height as f32),
        )
    }
}

/// Window style table key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowStyle {
    pub justification: i32,
    pub horizontal_text_direction: HorizontalTextDirection,
    pub vertical_text_type: VerticalTextType,
}

impl WindowStyle {
    #[must_use]
    pub const fn of_line(line: &Line) -> Self {
        Self {
            justification: justification_id(line.anchor_point),
            horizontal_text_direction: line.horizontal_text_direction,
            vertical_text_type: line.vertical_text_type,
        }
    }
}

/// Pen table key: a section's formatting as the player can express it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pen {
    pub font_style: i32,
    /// Player size percentage (`sz`)
    pub size: i32,
    pub offset: OffsetType,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub fore_color: Color,
    pub back_color: Color,
    pub shadow: Option<(ShadowType, Color)>,
    pub ruby_part: RubyPart,
    pub packed: bool,
}

impl Pen {
    /// Normalized pen for `section`
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Internal`] if the section still carries more
    /// than one shadow.
    pub fn of_section(section: &Section) -> Result<Self> {
        if section.shadow_colors.len() > 1 {
            return Err(CoreError::internal(
                "timed-text sections must be reduced to one shadow color before writing",
            ));
        }

        Ok(Self {
            font_style: font_style_id(section.font.as_deref()),
            size: player_font_scale(section.scale),
            offset: section.offset,
            bold: section.bold,
            italic: section.italic,
            underline: section.underline,
            fore_color: section.fore_color,
            back_color: section.back_color,
            shadow: section
                .shadow_colors
                .iter()
                .next()
                .map(|(&kind, &color)| (kind, color)),
            ruby_part: section.ruby_part,
            packed: section.packed,
        })
    }

    /// Section with this pen's formatting and no text
    #[must_use]
    pub fn to_section(&self) -> Section {
        let mut section = Section::new("");
        section.font = Some(font_name(self.font_style).to_string());
        section.scale = real_font_scale(self.size);
        section.offset = self.offset;
        section.bold = self.bold;
        section.italic = self.italic;
        section.underline = self.underline;
        section.fore_color = self.fore_color;
        section.back_color = self.back_color;
        if let Some((kind, color)) = self.shadow {
            section.shadow_colors.insert(kind, color);
        }
        section.ruby_part = self.ruby_part;
        section.packed = self.packed;
        section
    }
}

/// Deduplicating id table
#[derive(Debug)]
pub struct AttributeTable<K> {
    ids: HashMap<K, usize, RandomState>,
    entries: Vec<K>,
}

impl<K: Clone + Eq + Hash> AttributeTable<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: create_hash_map(),
            entries: Vec::new(),
        }
    }

    /// Id of `key`, registering it on first use
    pub fn intern(&mut self, key: K) -> usize {
        if let Some(&id) = self.ids.get(&key) {
            return id;
        }
        self.entries.push(key.clone());
        let id = self.entries.len();
        self.ids.insert(key, id);
        id
    }

    /// Id of an already registered key
    #[must_use]
    pub fn id(&self, key: &K) -> Option<usize> {
        self.ids.get(key).copied()
    }

    /// Entries with their ids, in id order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &K)> {
        self.entries.iter().enumerate().map(|(index, key)| (index + 1, key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Clone + Eq + Hash> Default for AttributeTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Percentage the player needs to be told to show a pixel coordinate
///
/// The player moves positions toward the center (`2 + 0.96 × requested`),
/// so the inverse is written.
#[must_use]
pub fn player_coordinate(pixel: f32, extent: f32) -> i32 {
    let percentage = pixel / extent * 100.0;
    ((percentage - 2.0) / 0.96).clamp(0.0, 100.0).round() as i32
}

/// Pixel coordinate the player shows a percentage at
#[must_use]
pub fn pixel_coordinate(percentage: i32, extent: f32) -> f32 {
    (percentage as f32).mul_add(0.96, 2.0) / 100.0 * extent
}

/// Player size percentage for a real scale (the player shows `1 + (sz - 1) / 4`)
#[must_use]
pub fn player_font_scale(scale: f32) -> i32 {
    ((scale - 1.0).mul_add(4.0, 1.0).max(0.0) * 100.0).round() as i32
}

#[must_use]
pub fn real_font_scale(size: i32) -> f32 {
    1.0 + (size as f32 / 100.0 - 1.0) / 4.0
}

#[must_use]
pub const fn anchor_point_id(anchor: AnchorPoint) -> i32 {
    match anchor {
        AnchorPoint::TopLeft => 0,
        AnchorPoint::TopCenter => 1,
        AnchorPoint::TopRight => 2,
        AnchorPoint::MiddleLeft => 3,
        AnchorPoint::Center => 4,
        AnchorPoint::MiddleRight => 5,
        AnchorPoint::BottomLeft => 6,
        AnchorPoint::BottomCenter => 7,
        AnchorPoint::BottomRight => 8,
    }
}

#[must_use]
pub fn anchor_point(id: i32) -> Option<AnchorPoint> {
    usize::try_from(id)
        .ok()
        .and_then(|index| AnchorPoint::ALL.get(index).copied())
}

/// `ju` value: 0 left, 1 right, 2 center
#[must_use]
pub const fn justification_id(anchor: AnchorPoint) -> i32 {
    if anchor.is_left() {
        0
    } else if anchor.is_right() {
        1
    } else {
        2
    }
}

/// `pd` print direction and `sd` scroll direction
#[must_use]
pub const fn direction_ids(
    horizontal: HorizontalTextDirection,
    vertical: VerticalTextType,
) -> (i32, i32) {
    let right_to_left = matches!(horizontal, HorizontalTextDirection::RightToLeft);
    match vertical {
        VerticalTextType::Positioned => (2, if right_to_left { 0 } else { 1 }),
        VerticalTextType::Rotated => (3, if right_to_left { 1 } else { 0 }),
        VerticalTextType::None => (if right_to_left { 1 } else { 0 }, 0),
    }
}

#[must_use]
pub const fn text_directions(
    print_direction: i32,
    scroll_direction: i32,
) -> (HorizontalTextDirection, VerticalTextType) {
    use HorizontalTextDirection::{LeftToRight, RightToLeft};
    match print_direction {
        1 => (RightToLeft, VerticalTextType::None),
        2 if scroll_direction == 0 => (RightToLeft, VerticalTextType::Positioned),
        2 => (LeftToRight, VerticalTextType::Positioned),
        3 if scroll_direction == 0 => (LeftToRight, VerticalTextType::Rotated),
        3 => (RightToLeft, VerticalTextType::Rotated),
        _ => (LeftToRight, VerticalTextType::None),
    }
}

/// `et` edge type
#[must_use]
pub const fn edge_type_id(kind: ShadowType) -> i32 {
    match kind {
        ShadowType::HardShadow => 1,
        ShadowType::Bevel => 2,
        ShadowType::Glow => 3,
        ShadowType::SoftShadow => 4,
    }
}

#[must_use]
pub const fn edge_type(id: i32) -> Option<ShadowType> {
    match id {
        1 => Some(ShadowType::HardShadow),
        2 => Some(ShadowType::Bevel),
        3 => Some(ShadowType::Glow),
        4 => Some(ShadowType::SoftShadow),
        _ => None,
    }
}

#[must_use]
pub const fn offset_id(offset: OffsetType) -> i32 {
    match offset {
        OffsetType::Subscript => 0,
        OffsetType::Regular => 1,
        OffsetType::Superscript => 2,
    }
}

#[must_use]
pub const fn offset_type(id: i32) -> OffsetType {
    match id {
        0 => OffsetType::Subscript,
        2 => OffsetType::Superscript,
        _ => OffsetType::Regular,
    }
}

#[must_use]
pub const fn ruby_part_id(part: RubyPart) -> i32 {
    match part {
        RubyPart::None => 0,
        RubyPart::Base => 1,
        RubyPart::Parenthesis => 2,
        RubyPart::RubyAbove => 4,
        RubyPart::RubyBelow => 5,
    }
}

#[must_use]
pub const fn ruby_part(id: i32) -> RubyPart {
    match id {
        1 => RubyPart::Base,
        2 => RubyPart::Parenthesis,
        4 => RubyPart::RubyAbove,
        5 => RubyPart::RubyBelow,
        _ => RubyPart::None,
    }
}

/// `fs` font style for a font family, 0 for the default proportional sans
#[must_use]
pub fn font_style_id(font: Option<&str>) -> i32 {
    let Some(font) = font else {
        return 0;
    };
    match font.to_lowercase().as_str() {
        "courier new" | "courier" | "nimbus mono l" | "cutive mono" => 1,
        "times new roman" | "times" | "georgia" | "cambria" | "pt serif caption" => 2,
        "deja vu sans mono" | "dejavu sans mono" | "lucida console" | "monaco" | "consolas"
        | "pt mono" => 3,
        "comic sans ms" | "impact" | "handlee" => 5,
        "monotype corsiva" | "urw chancery l" | "apple chancery" | "dancing script" => 6,
        "carrois gothic sc" => 7,
        _ => 0,
    }
}

/// Representative family of a font style
#[must_use]
pub const fn font_name(font_style: i32) -> &'static str {
    match font_style {
        1 => "Courier New",
        2 => "Times New Roman",
        3 => "Lucida Console",
        5 => "Comic Sans Ms",
        6 => "Monotype Corsiva",
        7 => "Carrois Gothic Sc",
        _ => "Roboto",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn positions_are_inverse_scaled() {
        assert_eq!(player_coordinate(0.0, 1280.0), 0);
        assert_eq!(player_coordinate(640.0, 1280.0), 50);
        assert_eq!(player_coordinate(1280.0, 1280.0), 100);
        assert_eq!(player_coordinate(128.0, 1280.0), 8);

        let video = Size::new(1280, 720);
        let position = WindowPosition::from_pixels(AnchorPoint::Center, PointF::new(640.0, 360.0), video);
        let back = position.to_pixels(video);
        assert!((back.x - 640.0).abs() < 0.5);
        assert!((back.y - 360.0).abs() < 0.5);
    }

    #[test]
    fn font_scales() {
        assert_eq!(player_font_scale(1.0), 100);
        assert_eq!(player_font_scale(1.25), 200);
        assert_eq!(player_font_scale(0.5), 0);
        assert!((real_font_scale(200) - 1.25).abs() < 0.0001);
    }

    #[test]
    fn fonts_map_to_styles() {
        assert_eq!(font_style_id(Some("Times New Roman")), 2);
        assert_eq!(font_style_id(Some("consolas")), 3);
        assert_eq!(font_style_id(Some("Arial")), 0);
        assert_eq!(font_style_id(None), 0);
        assert_eq!(font_name(font_style_id(Some("Georgia"))), "Times New Roman");
    }

    #[test]
    fn directions_round_trip() {
        for horizontal in [HorizontalTextDirection::LeftToRight, HorizontalTextDirection::RightToLeft] {
            for vertical in [VerticalTextType::None, VerticalTextType::Positioned, VerticalTextType::Rotated] {
                let (pd, sd) = direction_ids(horizontal, vertical);
                assert_eq!(text_directions(pd, sd), (horizontal, vertical));
            }
        }
    }

    #[test]
    fn tables_deduplicate_in_first_use_order() {
        let mut table = AttributeTable::new();
        assert_eq!(table.intern("b"), 1);
        assert_eq!(table.intern("a"), 2);
        assert_eq!(table.intern("b"), 1);
        assert_eq!(table.len(), 2);
        assert_eq!(table.iter().collect::<Vec<_>>(), vec![(1, &"b"), (2, &"a")]);
    }

    #[test]
    fn multi_shadow_pen_is_rejected() {
        let mut section = Section::new("x");
        section.shadow_colors.insert(ShadowType::Glow, Color::BLACK);
        assert!(Pen::of_section(&section).is_ok());
        section.shadow_colors.insert(ShadowType::Bevel, Color::BLACK);
        assert!(matches!(Pen::of_section(&section), Err(CoreError::Internal(_))));
    }
}
