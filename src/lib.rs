//! Decode and encode EIA-608 closed captions in the Scenarist SCC format.
//!
//! An SCC document is a list of timecoded lines of 16-bit codewords, each
//! two line-21 bytes. [`SccReader`] interprets the codeword stream the way
//! a caption decoder would, driving the three EIA-608 display buffers
//! (Pop-On, Paint-On, Roll-Up), and produces timed, positioned captions.
//! [`SccWriter`] packs captions back into codeword lines, advancing start
//! times so a decoder has time to receive them.

use std::fmt;
use std::fs::File;
use std::io;
use std::io::prelude::*;

pub mod constants;
pub mod parser;
pub mod reader;
pub mod time;
pub mod tracking;
pub mod writer;

mod buffer;
mod emitter;

pub use crate::parser::ParseError;
pub use crate::reader::{detect, ReadOptions, SccReader};
pub use crate::time::Timecode;
pub use crate::writer::SccWriter;

// Caption model

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub value: f64,
    pub unit: Unit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: Size,
    pub y: Size,
}

/// Where a caption sits on the screen, as a percent-based origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub origin: Point,
}

/// A piece of caption content: a text run, a line break, or a styling
/// toggle.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptionNode {
    Text {
        content: String,
        layout_info: Option<Layout>,
    },
    Break,
    Style {
        #[doc = "true opens the styled run, false closes it"]
        start: bool,
        italics: bool,
    },
}

impl CaptionNode {
    pub fn style(start: bool) -> CaptionNode {
        CaptionNode::Style {
            start,
            italics: true,
        }
    }
}

/// One timed caption. An `end` of 0 means the end is not known yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    #[doc = "Start time in microseconds"]
    pub start: i64,
    #[doc = "End time in microseconds; 0 while still unknown"]
    pub end: i64,
    pub nodes: Vec<CaptionNode>,
    pub layout_info: Option<Layout>,
}

impl Caption {
    pub fn new(start: i64) -> Caption {
        Caption {
            start,
            end: 0,
            nodes: Vec::new(),
            layout_info: None,
        }
    }

    /// The caption text without styling, line breaks rendered as `\n`.
    pub fn get_text(&self) -> String {
        let mut text = String::new();
        for node in &self.nodes {
            match node {
                CaptionNode::Text { content, .. } => text.push_str(content),
                CaptionNode::Break => text.push('\n'),
                CaptionNode::Style { .. } => {}
            }
        }
        text
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-->{} [{}]", self.start, self.end, self.get_text())
    }
}

/// Captions grouped by language.
#[derive(Debug, Default)]
pub struct CaptionSet {
    captions: std::collections::BTreeMap<String, Vec<Caption>>,
}

impl CaptionSet {
    pub fn new() -> CaptionSet {
        CaptionSet::default()
    }

    pub fn set_captions(&mut self, lang: &str, captions: Vec<Caption>) {
        self.captions.insert(lang.to_string(), captions);
    }

    pub fn get_captions(&self, lang: &str) -> &[Caption] {
        self.captions.get(lang).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_languages(&self) -> Vec<&str> {
        self.captions.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.captions.values().all(Vec::is_empty)
    }
}

/// Read and decode a whole SCC file with default options.
pub fn parse_scc_from_file(filename: &str) -> Result<CaptionSet, ParseError> {
    let mut f = File::open(filename)?;
    let mut content = String::new();
    f.read_to_string(&mut content)?;

    SccReader::new().read(&content, &ReadOptions::default())
}

/// Encode a caption set and write it out as an SCC file.
pub fn write_scc_to_file(caption_set: &CaptionSet, filename: &str) -> Result<(), io::Error> {
    let mut f = File::create(filename)?;
    f.write_all(SccWriter::new().write(caption_set).as_bytes())?;
    Ok(())
}
