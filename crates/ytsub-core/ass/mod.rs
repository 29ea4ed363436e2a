//! Advanced SubStation Alpha (`.ass`) support
//!
//! Reading runs the full compilation pipeline: every dialogue event is
//! interpreted into lines, karaoke is expanded into steps and animations are
//! compiled into static frame-aligned lines. The resulting [`Document`] holds
//! nothing a timed-text writer cannot express.
//!
//! # Modules
//!
//! - [`reader`] - Script sections, style rows and dialogue events
//! - [`interpreter`] - Override tag interpretation against a [`Stylesheet`]
//! - [`tags`] - The override tag handlers
//! - [`writer`] - Reverse conversion of any document into a script
//! - [`visual`] - Debug writer that draws what the timed-text player shows
//! - [`ruby`] - Ruby annotation layout for the debug writer
//!
//! # Example
//!
//! ```rust
//! use ytsub_core::ass;
//! use ytsub_core::style::StyleOptionsList;
//!
//! let script = "[Script Info]
//! PlayResX: 1280
//! PlayResY: 720
//!
//! [V4+ Styles]
//! Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
//! Style: Default,Arial,40,&H00FFFFFF,&H000000FF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,0,0,2,10,10,10,1
//!
//! [Events]
//! Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
//! Dialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,{\\c&H0000FF&}Red{\\c&H00FF00&}Green
//! ";
//!
//! let document = ass::parse(script, &StyleOptionsList::default()).unwrap();
//! let line = &document.lines[0];
//! assert_eq!(line.sections[0].text, "Red");
//! assert_eq!(line.sections[1].text, "Green");
//! ```

pub mod interpreter;
pub mod reader;
pub mod ruby;
pub mod tags;
pub mod visual;
pub mod writer;

pub use interpreter::{Interpreter, Stylesheet, TagContext};
pub use reader::{AssDialogue, AssScript};
pub use visual::VisualizingWriter;
pub use writer::AssWriter;

use crate::document::Document;
use crate::karaoke::{self, CursorFormatter};
use crate::model::Line;
use crate::style::StyleOptionsList;
use crate::{animator, utils::Result};
use tracing::debug;

/// Compile a script into a document of static lines
///
/// # Errors
///
/// Returns the structural errors of [`AssScript::parse`] and
/// [`Interpreter::parse_line`].
pub fn parse(text: &str, options: &StyleOptionsList) -> Result<Document> {
    let script = AssScript::parse(text)?;
    let stylesheet = Stylesheet::new(script.video_dimensions, script.styles, options.clone());
    let interpreter = Interpreter::new(&stylesheet)?;

    let mut document = Document::new(stylesheet.video_dimensions);
    for dialogue in &script.dialogues {
        for line in interpreter.parse_line(dialogue)? {
            for step in karaoke::expand(line, &interpreter) {
                document
                    .lines
                    .extend(animator::expand(step, stylesheet.video_dimensions));
            }
        }
    }

    emulate_karaoke_for_simultaneous_lines(&mut document.lines, &interpreter);
    for line in &mut document.lines {
        line.normalize_alpha();
    }

    debug!(
        dialogues = script.dialogues.len(),
        lines = document.lines.len(),
        "compiled ass script"
    );
    Ok(document)
}

/// Replace natively timed karaoke that shares the screen with another line
///
/// Lines merged for display lose their native timing, so a natively timed
/// unpositioned line overlapping another unpositioned line with the same
/// anchor is emulated step by step instead.
pub fn emulate_karaoke_for_simultaneous_lines(lines: &mut Vec<Line>, formatter: &dyn CursorFormatter) {
    let mut index = 0;
    while index < lines.len() {
        let line = &lines[index];
        let native = line.position.is_none()
            && line.sections.iter().any(|section| section.start_offset > 0);
        if !native || !has_simultaneous_line(lines, index) {
            index += 1;
            continue;
        }

        let steps = karaoke::emulate(line, formatter);
        let count = steps.len();
        lines.splice(index..=index, steps);
        index += count;
    }
}

fn has_simultaneous_line(lines: &[Line], index: usize) -> bool {
    let line = &lines[index];
    lines.iter().enumerate().any(|(other_index, other)| {
        other_index != index
            && other.position.is_none()
            && other.anchor_point == line.anchor_point
            && other.start < line.end
            && other.end > line.start
    })
}
