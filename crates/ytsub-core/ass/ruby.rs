//! Ruby annotation layout for the debug writer
//!
//! A script cannot draw ruby text natively, so every base run and every
//! annotation becomes its own bottom-left anchored line at a measured
//! position. Annotations are drawn at half size and centered over (or under)
//! their base; a base narrower than its annotation is centered as well.

use crate::measure::TextMeasurer;
use crate::model::{AnchorPoint, Line, PointF, RubyPart, Section};
use crate::utils::hashers::create_hash_map;
use ahash::RandomState;
use std::collections::HashMap;

/// Text measured once per font to relate measurer units to line heights
const CALIBRATION_TEXT: &str = "Mgあ";

/// Font size all measurements are taken at
const MEASURE_SIZE: f32 = 120.0;

/// Laid out lines of one text row, relative to the row's baseline
#[derive(Debug, Default)]
struct RowLayout {
    lines: Vec<Line>,
    /// Line that following plain sections are appended to
    last_base: Option<usize>,
    right: f32,
    top: f32,
    bottom: f32,
}

/// Lays out the ruby groups of one line
pub struct RubyLayout<'a> {
    line: &'a Line,
    position: PointF,
    default_line_height: f32,
    measurer: &'a dyn TextMeasurer,
    size_factors: HashMap<String, f32, RandomState>,
}

impl<'a> RubyLayout<'a> {
    /// Layout of `line` drawn at `position` relative to its anchor
    #[must_use]
    pub fn new(
        line: &'a Line,
        position: PointF,
        default_line_height: f32,
        measurer: &'a dyn TextMeasurer,
    ) -> Self {
        Self {
            line,
            position,
            default_line_height,
            measurer,
            size_factors: create_hash_map(),
        }
    }

    /// Positioned lines replacing the input line
    #[must_use]
    pub fn into_lines(mut self) -> Vec<Line> {
        let rows: Vec<RowLayout> = split_rows(self.line)
            .into_iter()
            .map(|row| self.layout_row(row))
            .collect();
        self.fix_positions(rows)
    }

    fn layout_row(&mut self, sections: Vec<Section>) -> RowLayout {
        let mut row = RowLayout::default();
        let mut idx = 0;
        while idx < sections.len() {
            if is_ruby_group(&sections, idx) {
                let mut ruby = sections[idx + 2].clone();
                ruby.scale /= 2.0;
                self.append_base_and_ruby(&mut row, sections[idx].clone(), ruby);
                idx += 4;
            } else {
                self.append_base(&mut row, sections[idx].clone());
                idx += 1;
            }
        }
        row
    }

    fn append_base(&mut self, row: &mut RowLayout, section: Section) {
        let (width, height) = self.measure_section(&section);
        self.add_to_base_line(row, section);
        row.top = row.top.min(-height);
        row.right += width;
    }

    fn add_to_base_line(&self, row: &mut RowLayout, mut section: Section) {
        section.ruby_part = RubyPart::None;
        let index = match row.last_base {
            Some(index) => index,
            None => {
                row.lines.push(self.layout_line(PointF::new(row.right, 0.0)));
                row.lines.len() - 1
            }
        };
        row.last_base = Some(index);
        row.lines[index].sections.push(section);
    }

    fn append_base_and_ruby(&mut self, row: &mut RowLayout, base: Section, ruby: Section) {
        let (base_width, base_height) = self.measure_section(&base);
        let (ruby_width, ruby_height) = self.measure_section(&ruby);
        let max_width = base_width.max(ruby_width);

        if ruby_width <= base_width {
            self.add_to_base_line(row, base);
        } else {
            row.last_base = None;
            self.add_centered(row, base, max_width, base_width, 0.0);
        }
        row.top = row.top.min(-base_height);

        let ruby_bottom = if ruby.ruby_part == RubyPart::RubyAbove {
            let bottom = -base_height;
            row.top = row.top.min(bottom - ruby_height);
            bottom
        } else {
            row.bottom = row.bottom.max(ruby_height);
            ruby_height
        };
        self.add_centered(row, ruby, max_width, ruby_width, ruby_bottom);
        row.right += max_width;
    }

    fn add_centered(
        &self,
        row: &mut RowLayout,
        mut section: Section,
        containing_width: f32,
        width: f32,
        bottom: f32,
    ) {
        section.ruby_part = RubyPart::None;
        let x = row.right + containing_width / 2.0 - width / 2.0;
        let mut line = self.layout_line(PointF::new(x, bottom));
        line.sections.push(section);
        row.lines.push(line);
    }

    fn layout_line(&self, position: PointF) -> Line {
        let mut line = self.line.without_sections();
        line.anchor_point = AnchorPoint::BottomLeft;
        line.position = Some(position);
        line
    }

    fn fix_positions(&self, rows: Vec<RowLayout>) -> Vec<Line> {
        let anchor = self.line.anchor_point;
        let total_height: f32 = rows.iter().map(|row| row.bottom - row.top).sum();
        let mut y = if anchor.is_top() {
            self.position.y
        } else if anchor.is_middle() {
            self.position.y - total_height / 2.0
        } else {
            self.position.y - total_height
        };

        let mut lines = Vec::new();
        for row in rows {
            let x = if anchor.is_left() {
                self.position.x
            } else if anchor.is_center() {
                self.position.x - row.right / 2.0
            } else {
                self.position.x - row.right
            };

            y -= row.top;
            for mut line in row.lines {
                if let Some(position) = &mut line.position {
                    position.x += x;
                    position.y += y;
                }
                lines.push(line);
            }
            y += row.bottom;
        }
        lines
    }

    fn measure_section(&mut self, section: &Section) -> (f32, f32) {
        if section.text.is_empty() {
            return (0.0, section.scale * self.default_line_height);
        }

        let font = section.font.as_deref().unwrap_or_default();
        let factor = match self.size_factors.get(font) {
            Some(&factor) => factor,
            None => {
                let (_, height) = self
                    .measurer
                    .measure(CALIBRATION_TEXT, font, MEASURE_SIZE, false, false);
                let factor = if height > 0.0 {
                    self.default_line_height / height
                } else {
                    1.0
                };
                self.size_factors.insert(font.to_string(), factor);
                factor
            }
        };

        let (width, height) = self.measurer.measure(
            &section.text,
            font,
            MEASURE_SIZE,
            section.bold,
            section.italic,
        );
        (
            width * factor * section.scale,
            height * factor * section.scale,
        )
    }
}

/// Whether `sections[idx..idx + 4]` is base, `(`, annotation, `)`
fn is_ruby_group(sections: &[Section], idx: usize) -> bool {
    let Some(group) = sections.get(idx..idx + 4) else {
        return false;
    };
    group[0].ruby_part == RubyPart::Base
        && group[1].ruby_part == RubyPart::Parenthesis
        && group[2].ruby_part.is_ruby_text()
        && group[3].ruby_part == RubyPart::Parenthesis
}

/// Sections of `line` grouped into rows at each line break
fn split_rows(line: &Line) -> Vec<Vec<Section>> {
    let mut rows = Vec::new();
    let mut row: Vec<Section> = Vec::new();
    for section in &line.sections {
        let has_break = section.text.contains("\r\n");
        for (idx, piece) in section.text.split("\r\n").enumerate() {
            if idx > 0 && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
            }
            if !piece.is_empty() || !has_break {
                let mut piece_section = section.clone();
                piece_section.text = piece.to_string();
                row.push(piece_section);
            }
        }
    }
    if !row.is_empty() {
        rows.push(row);
    }
    rows
}
