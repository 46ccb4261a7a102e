//! Turns drained node buffers into finished, timed captions.

use crate::buffer::{InterpretableNode, NodeBuffer};
use crate::tracking::{ItalicsTracker, Position};
use crate::{Caption, CaptionNode, Layout, Point, Size, Unit};

/// Percent-based origin for a caption grid position.
fn get_layout(position: Position) -> Layout {
    Layout {
        origin: Point {
            x: Size {
                value: 100.0 * f64::from(position.col) / 32.0,
                unit: Unit::Percent,
            },
            y: Size {
                value: 100.0 * f64::from(position.row - 1) / 15.0,
                unit: Unit::Percent,
            },
        },
    }
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Caption list that refuses empty captions and, on append, fills in the
/// previous caption's end time if it is still unknown.
#[derive(Debug, Default)]
pub(crate) struct CaptionList {
    captions: Vec<Caption>,
}

impl CaptionList {
    /// Returns the index the caption was stored at, or None if it was
    /// dropped for having no nodes.
    fn push(&mut self, caption: Caption) -> Option<usize> {
        if caption.nodes.is_empty() {
            return None;
        }
        if let Some(last) = self.captions.last_mut() {
            if last.end == 0 {
                last.end = caption.start;
            }
        }
        self.captions.push(caption);
        Some(self.captions.len() - 1)
    }
}

/// Creates captions out of node buffers and maintains the growing
/// collection, remembering which captions are still open for timing
/// corrections.
#[derive(Debug, Default)]
pub(crate) struct CaptionStash {
    collection: CaptionList,
    still_editing: Vec<usize>,
}

impl CaptionStash {
    pub fn new() -> CaptionStash {
        CaptionStash::default()
    }

    /// Set the end time of the captions produced by the latest
    /// [`create_and_store`](Self::create_and_store) call. Without `force`
    /// only captions whose end is still unknown are touched.
    pub fn correct_last_timing(&mut self, end: i64, force: bool) {
        for &index in &self.still_editing {
            let caption = &mut self.collection.captions[index];
            if force || caption.end == 0 {
                caption.end = end;
            }
        }
    }

    /// Converts the buffer into one caption per positioning run, all
    /// starting at `start`, and stores them. Empty buffers are ignored.
    pub fn create_and_store(&mut self, buffer: &NodeBuffer, start: i64) {
        if buffer.is_empty() {
            return;
        }

        let mut finished = Vec::new();
        let mut caption = Caption::new(start);
        let mut italics = ItalicsTracker::new();

        for node in buffer.nodes() {
            match node {
                InterpretableNode::Reposition => {
                    remove_extra_italics(&mut caption);
                    italics = ItalicsTracker::new();
                    finished.push(std::mem::replace(&mut caption, Caption::new(start)));
                }
                InterpretableNode::Break { .. } => {
                    // A hard break always closes an open italics run; the
                    // cleanup pass below reconnects runs that continue on
                    // the next line.
                    if italics.command_off() {
                        caption.nodes.push(CaptionNode::style(false));
                    }
                    caption.nodes.push(CaptionNode::Break);
                }
                InterpretableNode::ItalicsOn { .. } => {
                    if italics.command_on() {
                        caption.nodes.push(CaptionNode::style(true));
                    }
                }
                InterpretableNode::ItalicsOff { .. } => {
                    if italics.command_off() {
                        caption.nodes.push(CaptionNode::style(false));
                    }
                }
                InterpretableNode::Text { chars, position } => {
                    if chars.is_empty() {
                        continue;
                    }
                    let layout = get_layout(*position);
                    caption.nodes.push(CaptionNode::Text {
                        content: normalize_text(chars),
                        layout_info: Some(layout),
                    });
                    caption.layout_info = Some(layout);
                }
            }
        }

        if italics.is_on() {
            caption.nodes.push(CaptionNode::style(false));
        }
        remove_extra_italics(&mut caption);
        finished.push(caption);

        self.still_editing.clear();
        for caption in finished {
            if let Some(index) = self.collection.push(caption) {
                self.still_editing.push(index);
            }
        }
    }

    pub fn get_all(self) -> Vec<Caption> {
        self.collection.captions
    }
}

/// Collapse `[Style, Break, Style]` italics triples into a single run
/// crossing the break. One in-place scan; on a removal the index stays
/// put, because another triple may start at the same spot.
fn remove_extra_italics(caption: &mut Caption) {
    let mut i = 0;
    while i + 2 < caption.nodes.len() {
        let is_triple = matches!(
            (
                &caption.nodes[i],
                &caption.nodes[i + 1],
                &caption.nodes[i + 2],
            ),
            (
                CaptionNode::Style { italics: true, .. },
                CaptionNode::Break,
                CaptionNode::Style { italics: true, .. },
            )
        );
        if is_triple {
            caption.nodes.remove(i + 2);
            caption.nodes.remove(i);
        } else {
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::new_shared_default;

    fn text_buffer(chars: &str) -> NodeBuffer {
        let mut buffer = NodeBuffer::new(new_shared_default());
        buffer.add_chars(chars);
        buffer
    }

    #[test]
    fn test_empty_buffers_produce_nothing() {
        let mut stash = CaptionStash::new();
        stash.create_and_store(&NodeBuffer::new(new_shared_default()), 1_000_000);
        assert!(stash.get_all().is_empty());
    }

    #[test]
    fn test_text_is_normalized_and_positioned() {
        let mut stash = CaptionStash::new();
        stash.create_and_store(&text_buffer("  spaced   out  "), 1_000_000);
        let captions = stash.get_all();
        assert_eq!(captions.len(), 1);
        assert_eq!(captions[0].get_text(), "spaced out");
        // Default position (14, 0): top-left origin at (0%, ~86.7%).
        let layout = captions[0].layout_info.unwrap();
        assert_eq!(layout.origin.x.value, 0.0);
        assert!((layout.origin.y.value - 100.0 * 13.0 / 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_append_backfills_previous_end() {
        let mut stash = CaptionStash::new();
        stash.create_and_store(&text_buffer("one"), 1_000_000);
        stash.create_and_store(&text_buffer("two"), 2_500_000);
        let captions = stash.get_all();
        assert_eq!(captions[0].end, 2_500_000);
        assert_eq!(captions[1].end, 0);
    }

    #[test]
    fn test_correct_last_timing() {
        let mut stash = CaptionStash::new();
        stash.create_and_store(&text_buffer("one"), 1_000_000);
        stash.correct_last_timing(3_000_000, false);
        stash.correct_last_timing(9_000_000, false);
        let captions = stash.get_all();
        // The second call found the end already set.
        assert_eq!(captions[0].end, 3_000_000);

        let mut stash = CaptionStash::new();
        stash.create_and_store(&text_buffer("one"), 1_000_000);
        stash.correct_last_timing(3_000_000, false);
        stash.correct_last_timing(9_000_000, true);
        assert_eq!(stash.get_all()[0].end, 9_000_000);
    }

    #[test]
    fn test_open_italics_are_closed() {
        let mut stash = CaptionStash::new();
        let mut buffer = NodeBuffer::new(new_shared_default());
        buffer.interpret_command("91ae");
        buffer.add_chars("slanted");
        stash.create_and_store(&buffer, 0);
        let captions = stash.get_all();
        assert_eq!(
            captions[0].nodes.last(),
            Some(&CaptionNode::style(false))
        );
    }

    #[test]
    fn test_reposition_splits_captions() {
        let mut stash = CaptionStash::new();
        let mut buffer = NodeBuffer::new(new_shared_default());
        buffer.interpret_command("9470"); // row 15
        buffer.add_chars("first");
        buffer.interpret_command("9140"); // row 1
        buffer.add_chars("second");
        stash.create_and_store(&buffer, 5_000_000);

        let captions = stash.get_all();
        assert_eq!(captions.len(), 2);
        assert_eq!(captions[0].get_text(), "first");
        assert_eq!(captions[1].get_text(), "second");
        // Siblings share the start; the first end was backfilled with it.
        assert_eq!(captions[0].start, 5_000_000);
        assert_eq!(captions[1].start, 5_000_000);
        assert_eq!(captions[0].end, 5_000_000);
    }

    #[test]
    fn test_remove_extra_italics_bridges_breaks() {
        let mut caption = Caption::new(0);
        caption.nodes = vec![
            CaptionNode::style(true),
            CaptionNode::Text {
                content: "one".to_string(),
                layout_info: None,
            },
            CaptionNode::style(false),
            CaptionNode::Break,
            CaptionNode::style(true),
            CaptionNode::Text {
                content: "two".to_string(),
                layout_info: None,
            },
            CaptionNode::style(false),
        ];
        remove_extra_italics(&mut caption);
        assert_eq!(
            caption.nodes,
            vec![
                CaptionNode::style(true),
                CaptionNode::Text {
                    content: "one".to_string(),
                    layout_info: None,
                },
                CaptionNode::Break,
                CaptionNode::Text {
                    content: "two".to_string(),
                    layout_info: None,
                },
                CaptionNode::style(false),
            ]
        );

        // The cleanup is idempotent.
        let before = caption.nodes.clone();
        remove_extra_italics(&mut caption);
        assert_eq!(caption.nodes, before);
    }
}
