//! Ordered builder for the nodes a display buffer accumulates before it
//! is turned into captions.

use crate::constants::{self, CommandEffect};
use crate::tracking::{DefaultProvidingPositionTracker, Position, SharedDefaultPosition};

/// One step of a buffer's content, in the order it was received.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpretableNode {
    Text { chars: String, position: Position },
    Break { position: Position },
    ItalicsOn { position: Position },
    ItalicsOff { position: Position },
    /// A hard positioning discontinuity: whatever follows belongs to a
    /// separate caption.
    Reposition,
}

impl InterpretableNode {
    fn text(position: Position) -> InterpretableNode {
        InterpretableNode::Text {
            chars: String::new(),
            position,
        }
    }

    fn is_text(&self) -> bool {
        matches!(self, InterpretableNode::Text { .. })
    }
}

/// Accumulates text runs, explicit breaks, italics markers and
/// repositioning markers for one display mode.
#[derive(Debug)]
pub struct NodeBuffer {
    nodes: Vec<InterpretableNode>,
    position_tracker: DefaultProvidingPositionTracker,
}

impl NodeBuffer {
    pub fn new(default: SharedDefaultPosition) -> NodeBuffer {
        NodeBuffer {
            nodes: Vec::new(),
            position_tracker: DefaultProvidingPositionTracker::new(default),
        }
    }

    /// A buffer is empty until some text reaches it; breaks and style
    /// markers alone don't count.
    pub fn is_empty(&self) -> bool {
        !self
            .nodes
            .iter()
            .any(|node| matches!(node, InterpretableNode::Text { chars, .. } if !chars.is_empty()))
    }

    pub fn nodes(&self) -> &[InterpretableNode] {
        &self.nodes
    }

    /// Adds characters to the last text node, or to a new one. A pending
    /// line break or repositioning is materialized first, so the marker
    /// lands between the old text and the new.
    pub fn add_chars(&mut self, chars: &str) {
        let current = self.position_tracker.get_current_position();

        let mut target = match self.nodes.iter().rposition(InterpretableNode::is_text) {
            Some(index) => index,
            None => {
                self.nodes.push(InterpretableNode::text(current));
                self.nodes.len() - 1
            }
        };

        if self.position_tracker.is_linebreak_required() {
            self.nodes.push(InterpretableNode::Break { position: current });
            self.nodes.push(InterpretableNode::text(current));
            target = self.nodes.len() - 1;
            self.position_tracker.acknowledge_linebreak_consumed();
        } else if self.position_tracker.is_repositioning_required() {
            self.nodes.push(InterpretableNode::Reposition);
            self.nodes.push(InterpretableNode::text(current));
            target = self.nodes.len() - 1;
            self.position_tracker.acknowledge_position_changed();
        }

        if let InterpretableNode::Text { chars: existing, .. } = &mut self.nodes[target] {
            existing.push_str(chars);
        }
    }

    /// Feed a control codeword to the buffer: PAC bytes update the
    /// positioning, italics codes append style markers, everything else
    /// is discarded.
    pub fn interpret_command(&mut self, word: &str) {
        if let Some(positioning) = constants::pac_positioning(word) {
            self.position_tracker.update_positioning(positioning);
        }

        let position = self.position_tracker.get_current_position();
        match constants::command_effect(word) {
            CommandEffect::ItalicsOn => self.nodes.push(InterpretableNode::ItalicsOn { position }),
            CommandEffect::ItalicsOff => self.nodes.push(InterpretableNode::ItalicsOff { position }),
            CommandEffect::Other => {}
        }
    }

    /// Concatenates several buffers into one, separating consecutive
    /// buffers with a single space. When the seam joins two text nodes
    /// they are merged around the space, so the separator survives the
    /// whitespace normalization applied at emission.
    pub fn from_list(buffers: &[NodeBuffer], default: SharedDefaultPosition) -> NodeBuffer {
        let mut combined = NodeBuffer::new(default);
        for (index, buffer) in buffers.iter().enumerate() {
            let mut incoming = buffer.nodes.as_slice();
            if index > 0 {
                if let (
                    Some(InterpretableNode::Text { chars: tail, .. }),
                    Some(InterpretableNode::Text { chars: head, .. }),
                ) = (combined.nodes.last_mut(), incoming.first())
                {
                    tail.push(' ');
                    tail.push_str(head);
                    incoming = &incoming[1..];
                }
            }
            combined.nodes.extend(incoming.iter().cloned());
        }
        combined
    }
}
