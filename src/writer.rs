//! Encode a caption set back into an SCC document.
//!
//! Captions are rewritten as pop-on sequences: load into the
//! non-displayed memory, reveal with End Of Caption, clear with Erase
//! Displayed Memory. Start times are advanced by the transmission time of
//! each caption's codewords, so a real decoder would reveal the text on
//! cue.

use log::debug;

use crate::constants::{
    CHARACTER_TO_CODE, HEADER, MICROSECONDS_PER_CODEWORD, PAC_HIGH_BYTE_BY_ROW,
    PAC_LOW_BYTE_BY_ROW_RESTRICTED, SPECIAL_OR_EXTENDED_CHAR_TO_CODE, UNKNOWN_CHAR_CODE,
};
use crate::{Caption, CaptionNode, CaptionSet};

/// Characters per caption row.
const CAPTION_WIDTH: usize = 32;

#[derive(Debug, Default)]
pub struct SccWriter;

impl SccWriter {
    pub fn new() -> SccWriter {
        SccWriter
    }

    /// Serialize the caption set. Only one caption channel exists, so only
    /// the first language is written.
    pub fn write(&self, caption_set: &CaptionSet) -> String {
        let mut output = format!("{}\n\n", HEADER);

        if caption_set.is_empty() {
            return output;
        }

        let languages = caption_set.get_languages();
        let captions = caption_set.get_captions(languages[0]);

        // Pass 1: compute the codewords for each caption.
        let mut codes: Vec<(String, i64, Option<i64>)> = captions
            .iter()
            .map(|caption| (self.text_to_code(caption), caption.start, Some(caption.end)))
            .collect();

        // Pass 2: advance start times to leave room to fill the pop-on
        // buffer. A clear-screen that would land inside that window is
        // dropped along with the previous caption's end.
        for index in 1..codes.len() {
            let code_words = codes[index].0.len() / 5 + 8;
            let code_time_microseconds = (code_words as f64 * MICROSECONDS_PER_CODEWORD) as i64;
            let code_start = codes[index].1 - code_time_microseconds;

            if let Some(previous_end) = codes[index - 1].2 {
                if previous_end + (3.0 * MICROSECONDS_PER_CODEWORD) as i64 >= code_start {
                    codes[index - 1].2 = None;
                }
            }
            codes[index].1 = code_start;
        }

        // Pass 3: write the lines out.
        for (code, start, end) in codes {
            output.push_str(&format_timestamp(start));
            output.push('\t');
            output.push_str("94ae 94ae 9420 9420 ");
            output.push_str(&code);
            output.push_str("942c 942c 942f 942f\n\n");
            if let Some(end) = end {
                output.push_str(&format!("{}\t942c 942c\n\n", format_timestamp(end)));
            }
        }

        output
    }

    /// Wrap the caption text at the row width, keeping explicit breaks.
    fn layout_line(&self, caption: &Caption) -> String {
        let mut text = String::new();
        for node in &caption.nodes {
            match node {
                CaptionNode::Text { content, .. } => text.push_str(content),
                CaptionNode::Break => text.push('\n'),
                CaptionNode::Style { .. } => {}
            }
        }
        text.split('\n')
            .map(|line| fill(line, CAPTION_WIDTH))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn text_to_code(&self, caption: &Caption) -> String {
        let mut code = String::new();
        let laid_out = self.layout_line(caption);
        let lines: Vec<&str> = laid_out.split('\n').collect();
        let count = lines.len() as isize;

        for (index, line) in lines.iter().enumerate() {
            // Captions stack up from row 15.
            let row = (16 - count + index as isize).clamp(1, 15) as usize;

            // Move the cursor to column 0 of the destination row; PACs are
            // doubled like any control code.
            for _ in 0..2 {
                code.push_str(&PAC_HIGH_BYTE_BY_ROW[row]);
                code.push_str(&PAC_LOW_BYTE_BY_ROW_RESTRICTED[row]);
                code.push(' ');
            }

            for character in line.chars() {
                code = print_character(code, character);
                code = maybe_space(code);
            }
            code = maybe_align(code);
        }
        code
    }
}

/// Finish a half word with a null byte so the next 4-digit code starts on
/// a word boundary.
fn maybe_align(code: String) -> String {
    if code.len() % 5 == 2 {
        code + "80 "
    } else {
        code
    }
}

fn maybe_space(code: String) -> String {
    if code.len() % 5 == 4 {
        code + " "
    } else {
        code
    }
}

fn print_character(code: String, character: char) -> String {
    let char_code = CHARACTER_TO_CODE
        .get(&character)
        .or_else(|| SPECIAL_OR_EXTENDED_CHAR_TO_CODE.get(&character))
        .cloned()
        .unwrap_or_else(|| {
            debug!("no EIA-608 code for {:?}, writing £", character);
            UNKNOWN_CHAR_CODE.to_string()
        });

    if char_code.len() == 2 {
        code + &char_code
    } else {
        maybe_align(code) + &char_code
    }
}

/// Greedy wrap at `width` columns; words longer than a whole row are
/// hard-broken.
fn fill(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        loop {
            let word_len = word.chars().count();
            let needed = if current.is_empty() {
                word_len
            } else {
                current.chars().count() + 1 + word_len
            };

            if needed <= width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(&word);
                break;
            }
            if current.is_empty() {
                let head: String = word.chars().take(width).collect();
                word = word.chars().skip(width).collect();
                lines.push(head);
                continue;
            }
            lines.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

/// Microseconds of wall time to a non-drop-frame `HH:MM:SS:FF` timestamp.
fn format_timestamp(microseconds: i64) -> String {
    let mut seconds_float = microseconds as f64 / 1000.0 / 1000.0;
    seconds_float *= 1000.0 / 1001.0;

    let hours = (seconds_float / 3600.0).floor();
    seconds_float -= hours * 3600.0;
    let minutes = (seconds_float / 60.0).floor();
    seconds_float -= minutes * 60.0;
    let seconds = seconds_float.floor();
    let frames = ((seconds_float - seconds) * 30.0).floor();

    format!(
        "{:02}:{:02}:{:02}:{:02}",
        hours as u32, minutes as u32, seconds as u32, frames as u32
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{detect, ReadOptions, SccReader};

    fn caption(text: &str, start: i64, end: i64) -> Caption {
        let mut caption = Caption::new(start);
        caption.end = end;
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                caption.nodes.push(CaptionNode::Break);
            }
            caption.nodes.push(CaptionNode::Text {
                content: line.to_string(),
                layout_info: None,
            });
        }
        caption
    }

    fn set_of(captions: Vec<Caption>) -> CaptionSet {
        let mut set = CaptionSet::new();
        set.set_captions("en-US", captions);
        set
    }

    #[test]
    fn test_empty_set_writes_only_the_header() {
        let output = SccWriter::new().write(&CaptionSet::new());
        assert_eq!(output, "Scenarist_SCC V1.0\n\n");
    }

    #[test]
    fn test_header_round_trips_through_detect() {
        let set = set_of(vec![caption("Hello", 1_001_000, 3_003_000)]);
        let output = SccWriter::new().write(&set);
        assert!(detect(&output));
        assert!(output.starts_with("Scenarist_SCC V1.0\n\n"));
    }

    #[test]
    fn test_single_caption_codes() {
        let set = set_of(vec![caption("Hello", 1_001_000, 3_003_000)]);
        let output = SccWriter::new().write(&set);
        // Row 15, column 0, then the five characters padded to a full
        // word, framed by the pop-on load/reveal commands.
        assert!(output
            .contains("\t94ae 94ae 9420 9420 9470 9470 c8e5 ecec ef80 942c 942c 942f 942f\n"));
        assert!(output.contains("\t942c 942c\n"));
    }

    #[test]
    fn test_written_output_decodes_back() {
        let set = set_of(vec![caption("Hello", 2_002_000, 4_004_000)]);
        let output = SccWriter::new().write(&set);

        let reread = SccReader::new()
            .read(&output, &ReadOptions::default())
            .unwrap();
        let captions = reread.get_captions("en-US");
        assert_eq!(captions.len(), 1);
        assert_eq!(captions[0].get_text(), "Hello");
    }

    #[test]
    fn test_unknown_glyphs_become_pounds() {
        let set = set_of(vec![caption("नमस्ते", 1_001_000, 3_003_000)]);
        let output = SccWriter::new().write(&set);
        assert!(output.contains("91b6"));
    }

    #[test]
    fn test_long_lines_wrap() {
        let word = "a".repeat(70);
        let wrapped = fill(&word, 32);
        let lines: Vec<&str> = wrapped.split('\n').collect();
        // ceil(70 / 32) rows, none wider than a row.
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|line| line.chars().count() <= 32));

        let wrapped = fill("the quick brown fox jumps over the lazy dog", 32);
        assert!(wrapped
            .split('\n')
            .all(|line| line.chars().count() <= 32));
    }

    #[test]
    fn test_wrapped_caption_stacks_rows_upward() {
        let text = "the quick brown fox jumps over the lazy dog near the river bank at dawn";
        let set = set_of(vec![caption(text, 1_001_000, 5_005_000)]);
        let output = SccWriter::new().write(&set);
        // Three laid-out rows start at row 13.
        assert!(output.contains("1370 1370 "));
        assert!(output.contains("94d0 94d0 "));
        assert!(output.contains("9470 9470 "));
    }

    #[test]
    fn test_preroll_collapses_adjacent_captions() {
        let near = set_of(vec![
            caption("first words", 1_000_000, 2_000_000),
            caption("second words", 2_100_000, 3_000_000),
        ]);
        let output = SccWriter::new().write(&near);
        // The first caption's clear-screen would land inside the second's
        // transmission window, so only one end line survives.
        assert_eq!(output.matches("\t942c 942c\n\n").count(), 1);

        let apart = set_of(vec![
            caption("first words", 1_000_000, 2_000_000),
            caption("second words", 8_000_000, 9_000_000),
        ]);
        let output = SccWriter::new().write(&apart);
        assert_eq!(output.matches("\t942c 942c\n\n").count(), 2);
    }

    #[test]
    fn test_preroll_advances_start_times() {
        let set = set_of(vec![
            caption("one", 1_000_000, 2_000_000),
            caption("two", 8_000_000, 9_000_000),
        ]);
        let output = SccWriter::new().write(&set);
        // 8s of wall time is 07:23 in the non-drop-frame timebase; the
        // pre-roll pulls the second caption earlier still.
        let second_line = output
            .lines()
            .find(|line| line.contains("9420 9420") && !line.starts_with("00:00:00"))
            .unwrap();
        let timestamp = second_line.split('\t').next().unwrap();
        assert!(timestamp < "00:00:07:23");
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(format_timestamp(0), "00:00:00:00");
        assert_eq!(format_timestamp(3_600_000), "00:00:03:17");
        assert_eq!(format_timestamp(3_600_000_000_000 / 1000), "00:59:56:12");
    }
}
