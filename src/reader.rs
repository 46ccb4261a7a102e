//! The SCC interpreter: drives the three EIA-608 display buffers one
//! codeword at a time and fires caption emission.

use log::{debug, warn};

use crate::buffer::NodeBuffer;
use crate::constants;
use crate::emitter::CaptionStash;
use crate::parser::{self, ParseError};
use crate::time::{TimeTranslator, Timecode};
use crate::tracking::{new_shared_default, SharedDefaultPosition, DEFAULT_POSITION};
use crate::CaptionSet;

/// Whether the given content is an SCC document.
pub fn detect(content: &str) -> bool {
    content.lines().next() == Some(constants::HEADER)
}

/// Knobs for one decode pass.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    #[doc = "Language key the decoded captions are stored under"]
    pub lang: String,
    #[doc = "Emit every visible row with each roll-up caption, not just the new one"]
    pub simulate_roll_up: bool,
    #[doc = "Seconds subtracted from every caption time"]
    pub offset_seconds: i64,
}

impl Default for ReadOptions {
    fn default() -> ReadOptions {
        ReadOptions {
            lang: "en-US".to_string(),
            simulate_roll_up: false,
            offset_seconds: 0,
        }
    }
}

/// The three caption styles of EIA-608. Each owns a display buffer;
/// exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Pop,
    Paint,
    Roll,
}

#[derive(Debug)]
struct Buffers {
    pop: NodeBuffer,
    paint: NodeBuffer,
    roll: NodeBuffer,
}

impl Buffers {
    fn new(default: &SharedDefaultPosition) -> Buffers {
        Buffers {
            pop: NodeBuffer::new(default.clone()),
            paint: NodeBuffer::new(default.clone()),
            roll: NodeBuffer::new(default.clone()),
        }
    }

    fn get(&self, mode: Mode) -> &NodeBuffer {
        match mode {
            Mode::Pop => &self.pop,
            Mode::Paint => &self.paint,
            Mode::Roll => &self.roll,
        }
    }

    fn get_mut(&mut self, mode: Mode) -> &mut NodeBuffer {
        match mode {
            Mode::Pop => &mut self.pop,
            Mode::Paint => &mut self.paint,
            Mode::Roll => &mut self.roll,
        }
    }

    fn replace(&mut self, mode: Mode, buffer: NodeBuffer) -> NodeBuffer {
        std::mem::replace(self.get_mut(mode), buffer)
    }
}

/// Converts an SCC document into a [`CaptionSet`].
///
/// The reader carries decoding state and is meant for a single document:
/// create one, call [`read`](Self::read), drop it.
#[derive(Debug)]
pub struct SccReader {
    caption_stash: CaptionStash,
    time_translator: TimeTranslator,
    last_command: String,
    buffers: Buffers,
    active: Mode,
    roll_rows: Vec<NodeBuffer>,
    roll_rows_expected: usize,
    simulate_roll_up: bool,
    /// Committed start time, in microseconds, for the caption the active
    /// buffer will produce.
    time: i64,
    default_position: SharedDefaultPosition,
}

impl SccReader {
    pub fn new() -> SccReader {
        let default_position = new_shared_default();
        SccReader {
            caption_stash: CaptionStash::new(),
            time_translator: TimeTranslator::new(),
            last_command: String::new(),
            buffers: Buffers::new(&default_position),
            active: Mode::Pop,
            roll_rows: Vec::new(),
            roll_rows_expected: 0,
            simulate_roll_up: false,
            time: 0,
            default_position,
        }
    }

    /// Decode a whole SCC document.
    pub fn read(mut self, content: &str, options: &ReadOptions) -> Result<CaptionSet, ParseError> {
        // Positioning must not leak in from a previously decoded document.
        self.default_position.set(DEFAULT_POSITION);
        self.simulate_roll_up = options.simulate_roll_up;
        self.time_translator
            .set_offset(options.offset_seconds * 1_000_000);

        // The first line is the format header.
        for line in content.lines().skip(1) {
            self.translate_line(line);
        }
        self.flush_implicit_buffers(None);

        let mut caption_set = CaptionSet::new();
        caption_set.set_captions(&options.lang, self.caption_stash.get_all());

        if caption_set.is_empty() {
            return Err(ParseError::NoCaptions);
        }
        Ok(caption_set)
    }

    fn translate_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        let line = line.trim().to_lowercase();

        let (timecode, words) = match parser::caption_line(&line) {
            Ok((_, parts)) => parts,
            Err(_) => {
                warn!("skipping malformed SCC line: {:?}", line);
                return;
            }
        };

        // A line carrying nothing but the End Of Caption command closes a
        // Paint-On caption begun on an earlier line; patch its timing
        // before the translator is reset.
        if words.trim() == "942f" {
            self.fix_last_timing(timecode);
        }

        self.time_translator.start_at(timecode);

        for word in words.split_whitespace() {
            self.translate_word(word);
        }
    }

    /// Emit the pending buffer with the previously reached time as its
    /// start, and this line's timecode as its end.
    fn fix_last_timing(&mut self, timecode: Timecode) {
        let mut end_translator = TimeTranslator::new();
        end_translator.start_at(timecode);
        end_translator.set_offset(self.time_translator.get_offset());

        self.caption_stash.create_and_store(
            self.buffers.get(self.active),
            self.time_translator.get_time(),
        );
        self.caption_stash
            .correct_last_timing(end_translator.get_time(), false);
        self.replace_active_buffer();
    }

    fn translate_word(&mut self, word: &str) {
        // One codeword costs one frame of transmission time.
        self.time_translator.increment_frames();

        if constants::is_command(word) || constants::is_pac_command(word) {
            self.translate_command(word);
        } else if let Some(chars) = constants::SPECIAL_CHARS.get(word) {
            self.translate_special_char(word, chars);
        } else if let Some(chars) = constants::EXTENDED_CHARS.get(word) {
            self.translate_extended_char(word, chars);
        } else {
            self.translate_characters(word);
        }
    }

    /// Control codewords are transmitted twice for robustness. Returns
    /// true when the word is such an echo and must be dropped.
    fn handle_double_command(&mut self, word: &str) -> bool {
        if word == self.last_command {
            self.last_command.clear();
            true
        } else {
            self.last_command = word.to_string();
            false
        }
    }

    // Doubling suppression applies to special and extended characters as
    // well as commands, so a legitimately repeated glyph needs a null
    // codeword between the two.
    fn translate_special_char(&mut self, word: &str, chars: &str) {
        if self.handle_double_command(word) {
            return;
        }
        self.active_buffer_mut().add_chars(chars);
    }

    fn translate_extended_char(&mut self, word: &str, chars: &str) {
        if self.handle_double_command(word) {
            return;
        }
        self.active_buffer_mut().add_chars(chars);
    }

    fn translate_characters(&mut self, word: &str) {
        if word.len() != 4 || !word.is_ascii() {
            debug!("dropping unrecognized codeword {:?}", word);
            return;
        }
        let (byte1, byte2) = word.split_at(2);
        let (Some(char1), Some(char2)) = (
            constants::CHARACTERS.get(byte1),
            constants::CHARACTERS.get(byte2),
        ) else {
            debug!("dropping unrecognized codeword {:?}", word);
            return;
        };

        let mut chars = String::with_capacity(2);
        chars.push_str(char1);
        chars.push_str(char2);
        self.active_buffer_mut().add_chars(&chars);
    }

    fn translate_command(&mut self, word: &str) {
        if self.handle_double_command(word) {
            return;
        }

        match word {
            // Resume Caption Loading
            "9420" => self.set_active_mode(Mode::Pop),

            // Resume Direct Captioning
            "9429" => {
                self.set_active_mode(Mode::Paint);
                self.roll_rows_expected = 1;
                if !self.buffers.get(self.active).is_empty() {
                    self.caption_stash
                        .create_and_store(self.buffers.get(self.active), self.time);
                    self.replace_active_buffer();
                }
                self.time = self.time_translator.get_time();
            }

            // Roll-Up, 2 to 4 rows
            "9425" | "9426" | "94a7" => {
                self.set_active_mode(Mode::Roll);
                self.roll_rows_expected = match word {
                    "9425" => 2,
                    "9426" => 3,
                    _ => 4,
                };
                if !self.buffers.get(self.active).is_empty() {
                    self.caption_stash
                        .create_and_store(self.buffers.get(self.active), self.time);
                    self.replace_active_buffer();
                }
                self.roll_rows.clear();
                self.time = self.time_translator.get_time();
            }

            // Erase Non-displayed Memory
            "94ae" => self.replace_active_buffer(),

            // End Of Caption: reveal the composed pop-on buffer
            "942f" => {
                self.time = self.time_translator.get_time();
                self.caption_stash
                    .create_and_store(self.buffers.get(self.active), self.time);
                self.replace_active_buffer();
            }

            // Carriage Return
            "94ad" => {
                if !self.buffers.get(self.active).is_empty() {
                    self.roll_up();
                }
            }

            // Erase Displayed Memory. The Paint buffer is flushed here
            // whatever mode is active.
            "942c" => {
                self.roll_rows.clear();
                if !self.buffers.paint.is_empty() {
                    self.caption_stash
                        .create_and_store(&self.buffers.paint, self.time);
                    self.replace_active_buffer();
                }
                self.caption_stash
                    .correct_last_timing(self.time_translator.get_time(), false);
            }

            _ => self.active_buffer_mut().interpret_command(word),
        }
    }

    fn active_buffer_mut(&mut self) -> &mut NodeBuffer {
        self.buffers.get_mut(self.active)
    }

    fn replace_active_buffer(&mut self) {
        self.buffers
            .replace(self.active, NodeBuffer::new(self.default_position.clone()));
    }

    fn set_active_mode(&mut self, mode: Mode) {
        if self.active == mode {
            return;
        }
        // The flush below still sees the outgoing mode as active.
        self.flush_implicit_buffers(Some(self.active));
        self.active = mode;
    }

    /// Convert to captions those buffers whose display is implicit. The
    /// Pop buffer is only ever revealed by an explicit End Of Caption;
    /// Roll and Paint content may simply scroll or stay on screen, so a
    /// mode change (or the end of the document, `old == None`) must not
    /// lose it.
    fn flush_implicit_buffers(&mut self, old: Option<Mode>) {
        match old {
            Some(Mode::Pop) => {}
            None | Some(Mode::Roll) => {
                if !self.buffers.get(self.active).is_empty() {
                    self.roll_up();
                }
            }
            Some(Mode::Paint) => {
                if !self.buffers.paint.is_empty() {
                    self.caption_stash
                        .create_and_store(&self.buffers.paint, self.time);
                }
            }
        }
    }

    fn roll_up(&mut self) {
        if self.simulate_roll_up && self.roll_rows_expected > 1 {
            if self.roll_rows.len() >= self.roll_rows_expected {
                self.roll_rows.remove(0);
            }
            let active = self
                .buffers
                .replace(self.active, NodeBuffer::new(self.default_position.clone()));
            self.roll_rows.push(active);
            let rebuilt = NodeBuffer::from_list(&self.roll_rows, self.default_position.clone());
            self.buffers.replace(self.active, rebuilt);
        }

        self.caption_stash
            .create_and_store(self.buffers.get(self.active), self.time);
        self.replace_active_buffer();

        // The next caption starts where this one scrolled away.
        self.time = self.time_translator.get_time();
        self.caption_stash.correct_last_timing(self.time, true);
    }
}

impl Default for SccReader {
    fn default() -> Self {
        Self::new()
    }
}
