//! SCC timecode arithmetic.

use std::fmt;

/// A `HH:MM:SS:FF` (non-drop-frame) or `HH:MM:SS;FF` (drop-frame)
/// timecode as written at the start of an SCC line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timecode {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u8,
    pub drop_frame: bool,
}

impl Timecode {
    pub fn new(hours: u8, minutes: u8, seconds: u8, frames: u8, drop_frame: bool) -> Timecode {
        Timecode {
            hours,
            minutes,
            seconds,
            frames,
            drop_frame,
        }
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}{}{:02}",
            self.hours,
            self.minutes,
            self.seconds,
            if self.drop_frame { ';' } else { ':' },
            self.frames
        )
    }
}

/// Converts SCC time to microseconds, counting the frames consumed since
/// the line's timecode. One codeword costs one frame.
#[derive(Debug, Default)]
pub struct TimeTranslator {
    timecode: Option<Timecode>,
    offset: i64,
    frames: u32,
}

impl TimeTranslator {
    pub fn new() -> TimeTranslator {
        TimeTranslator::default()
    }

    /// Microseconds subtracted from every translated time, for material
    /// whose captions are globally shifted.
    pub fn set_offset(&mut self, microseconds: i64) {
        self.offset = microseconds;
    }

    pub fn get_offset(&self) -> i64 {
        self.offset
    }

    /// Reset the counter to the given time.
    pub fn start_at(&mut self, timecode: Timecode) {
        self.timecode = Some(timecode);
        self.frames = 0;
    }

    /// Account for one processed codeword.
    pub fn increment_frames(&mut self) {
        self.frames += 1;
    }

    /// The current time in microseconds, never negative.
    pub fn get_time(&self) -> i64 {
        let tc = self.timecode.unwrap_or_default();

        // The frame field absorbs the consumed codewords without carrying
        // into seconds; values past 30 are accepted.
        let frames = f64::from(tc.frames) + f64::from(self.frames);
        let timecode_seconds = f64::from(tc.hours) * 3600.0
            + f64::from(tc.minutes) * 60.0
            + f64::from(tc.seconds)
            + frames / 30.0;

        // A non-drop-frame timecode second is 1.001 wall seconds; the
        // drop-frame timebase matches the wall clock.
        let scale = if tc.drop_frame { 1.0 } else { 1001.0 / 1000.0 };

        let microseconds = (timecode_seconds * scale * 1_000_000.0).round() as i64 - self.offset;
        microseconds.max(0)
    }
}
