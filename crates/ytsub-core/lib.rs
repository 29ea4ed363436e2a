//! # ytsub core
//!
//! Compiles Advanced `SubStation` Alpha scripts into YouTube timed text
//! (`srv3`). The source format describes continuous effects such as color
//! fades, motion and karaoke sweeps; the target can only show a sequence of
//! static, frame-aligned entries. Reading a script therefore runs a small
//! compiler:
//!
//! 1. [`ass::Interpreter`] turns override tags into formatted [`Section`]s
//!    and pending [`Animation`]s
//! 2. [`karaoke`] expands syllable timing into discrete highlight steps
//! 3. [`animator`] samples animations on the frame grid and merges identical
//!    neighbouring frames
//! 4. [`formats::ytt`] interns pens, window positions and window styles and
//!    applies the player workarounds
//!
//! ## Features
//!
//! - **Compilation**: colors, alpha, fades, `\move`, `\t` and karaoke become
//!   static lines
//! - **Reverse conversion**: timed text back into a script, optionally
//!   visualizing what the player will draw
//! - **Line-oriented formats**: SRT in both directions, SBV input
//! - **Deterministic output**: identical input yields byte-identical files
//!
//! ## Quick Start
//!
//! ```rust
//! use ytsub_core::formats::{self, ConversionOptions, SubtitleFormat};
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
//! Dialogue: 0,0:00:01.00,0:00:03.00,Default,,0,0,0,,Hello World!
//! ";
//!
//! let options = ConversionOptions::default();
//! let document = formats::read(script, SubtitleFormat::Ass, &options)?;
//! let ytt = formats::write(&document, SubtitleFormat::Ytt, &options)?;
//! assert!(ytt.contains("Hello World!"));
//! # Ok::<(), ytsub_core::CoreError>(())
//! ```

#![deny(unsafe_code)]

pub mod animator;
pub mod ass;
pub mod document;
pub mod formats;
pub mod karaoke;
pub mod measure;
pub mod model;
pub mod style;
pub mod utils;

pub use document::Document;
pub use formats::{ConversionOptions, SubtitleFormat};
pub use measure::{ApproximateTextMeasurer, TextMeasurer};
pub use model::{Animation, AnchorPoint, Line, Section, ShadowType, Size};
pub use style::{StyleOptions, StyleOptionsList};
pub use utils::{Color, CoreError, Result};

/// Crate version, written into generated script headers
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
