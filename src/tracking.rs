//! State machines tracking cursor positioning and italics while a buffer
//! is being filled or drained.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::parser::ParseError;

/// Cursor position on the caption grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    #[doc = "Row, 1..=15"]
    pub row: u8,
    #[doc = "Column, 0..=31"]
    pub col: u8,
}

impl Position {
    pub const fn new(row: u8, col: u8) -> Position {
        Position { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Fallback position used until the document provides a PAC.
pub const DEFAULT_POSITION: Position = Position::new(14, 0);

/// The last position any tracker in the document observed. One cell is
/// shared by every buffer created during a single read, and reset when a
/// new read starts, so positioning never leaks between documents.
pub type SharedDefaultPosition = Rc<Cell<Position>>;

pub fn new_shared_default() -> SharedDefaultPosition {
    Rc::new(Cell::new(DEFAULT_POSITION))
}

/// Classifies each positioning change as either a natural line wrap or a
/// cursor jump, so the buffer can translate PACs into break or
/// repositioning nodes.
#[derive(Debug, Default)]
pub struct PositionTracker {
    positions: Vec<Position>,
    break_required: bool,
    reposition_required: bool,
}

impl PositionTracker {
    pub fn new() -> PositionTracker {
        PositionTracker::default()
    }

    pub fn update_positioning(&mut self, positioning: Position) {
        let current = match self.positions.last() {
            Some(p) => *p,
            None => {
                self.positions.push(positioning);
                return;
            }
        };

        if positioning.row == current.row + 1 {
            // One line below: a plain wrap. The column carries over.
            self.positions.push(Position::new(positioning.row, current.col));
            self.break_required = true;
        } else {
            // Anything else restarts positioning from scratch.
            self.positions = vec![positioning];
            self.reposition_required = true;
        }
    }

    /// The position the next node should carry. This is the first position
    /// of the current run, not the row the cursor wrapped to.
    pub fn get_current_position(&self) -> Result<Position, ParseError> {
        self.positions.first().copied().ok_or(ParseError::MissingPac)
    }

    pub fn is_linebreak_required(&self) -> bool {
        self.break_required
    }

    pub fn acknowledge_linebreak_consumed(&mut self) {
        self.break_required = false;
    }

    pub fn is_repositioning_required(&self) -> bool {
        self.reposition_required
    }

    pub fn acknowledge_position_changed(&mut self) {
        self.reposition_required = false;
    }
}

/// A [`PositionTracker`] that never fails: with no PAC observed it falls
/// back to the document-wide last seen position, or `(14, 0)`.
#[derive(Debug)]
pub struct DefaultProvidingPositionTracker {
    inner: PositionTracker,
    default: SharedDefaultPosition,
}

impl DefaultProvidingPositionTracker {
    pub fn new(default: SharedDefaultPosition) -> DefaultProvidingPositionTracker {
        DefaultProvidingPositionTracker {
            inner: PositionTracker::new(),
            default,
        }
    }

    pub fn update_positioning(&mut self, positioning: Position) {
        self.default.set(positioning);
        self.inner.update_positioning(positioning);
    }

    pub fn get_current_position(&self) -> Position {
        self.inner
            .get_current_position()
            .unwrap_or_else(|_| self.default.get())
    }

    pub fn is_linebreak_required(&self) -> bool {
        self.inner.is_linebreak_required()
    }

    pub fn acknowledge_linebreak_consumed(&mut self) {
        self.inner.acknowledge_linebreak_consumed()
    }

    pub fn is_repositioning_required(&self) -> bool {
        self.inner.is_repositioning_required()
    }

    pub fn acknowledge_position_changed(&mut self) {
        self.inner.acknowledge_position_changed()
    }
}

/// Whether an italics run is currently open. Consulted by the caption
/// emitter so style nodes always alternate polarity.
#[derive(Debug, Default)]
pub struct ItalicsTracker {
    on: bool,
}

impl ItalicsTracker {
    pub fn new() -> ItalicsTracker {
        ItalicsTracker::default()
    }

    /// Returns true if this actually opened a run.
    pub fn command_on(&mut self) -> bool {
        let changed = !self.on;
        self.on = true;
        changed
    }

    /// Returns true if this actually closed a run.
    pub fn command_off(&mut self) -> bool {
        let changed = self.on;
        self.on = false;
        changed
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_position_is_stored() {
        let mut tracker = PositionTracker::new();
        assert!(tracker.get_current_position().is_err());
        tracker.update_positioning(Position::new(5, 8));
        assert_eq!(tracker.get_current_position().unwrap(), Position::new(5, 8));
        assert!(!tracker.is_linebreak_required());
        assert!(!tracker.is_repositioning_required());
    }

    #[test]
    fn test_next_row_is_a_linebreak() {
        let mut tracker = PositionTracker::new();
        tracker.update_positioning(Position::new(14, 4));
        tracker.update_positioning(Position::new(15, 0));
        assert!(tracker.is_linebreak_required());
        assert!(!tracker.is_repositioning_required());
        // The usable position stays the first of the run.
        assert_eq!(tracker.get_current_position().unwrap(), Position::new(14, 4));
        tracker.acknowledge_linebreak_consumed();
        assert!(!tracker.is_linebreak_required());
    }

    #[test]
    fn test_jump_is_a_reposition() {
        let mut tracker = PositionTracker::new();
        tracker.update_positioning(Position::new(14, 0));
        tracker.update_positioning(Position::new(2, 12));
        assert!(tracker.is_repositioning_required());
        assert!(!tracker.is_linebreak_required());
        assert_eq!(tracker.get_current_position().unwrap(), Position::new(2, 12));
    }

    #[test]
    fn test_default_providing_fallback() {
        let shared = new_shared_default();
        let tracker = DefaultProvidingPositionTracker::new(shared.clone());
        assert_eq!(tracker.get_current_position(), DEFAULT_POSITION);

        // A sibling buffer sees what another tracker observed last.
        let mut first = DefaultProvidingPositionTracker::new(shared.clone());
        first.update_positioning(Position::new(3, 8));
        let second = DefaultProvidingPositionTracker::new(shared.clone());
        assert_eq!(second.get_current_position(), Position::new(3, 8));

        // Resetting the shared cell starts the next document clean.
        shared.set(DEFAULT_POSITION);
        let third = DefaultProvidingPositionTracker::new(shared);
        assert_eq!(third.get_current_position(), DEFAULT_POSITION);
    }

    #[test]
    fn test_italics_tracker_dedups_transitions() {
        let mut italics = ItalicsTracker::new();
        assert!(!italics.is_on());
        assert!(italics.command_on());
        assert!(!italics.command_on());
        assert!(italics.is_on());
        assert!(italics.command_off());
        assert!(!italics.command_off());
    }
}
