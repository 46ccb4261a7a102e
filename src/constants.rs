//! Static EIA-608 codeword tables.
//!
//! SCC spells every 16-bit codeword as four lowercase hex digits, with the
//! odd-parity bit still applied to both bytes. Rather than listing several
//! hundred parity-mangled words literally, the tables are generated once
//! from the channel-1 byte layout, so lookups work directly on the words
//! found in a document.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::tracking::Position;

pub const HEADER: &str = "Scenarist_SCC V1.0";

/// One codeword occupies one frame of line 21 at 29.97 fps.
pub const MICROSECONDS_PER_CODEWORD: f64 = 1_000_000.0 / (30.0 * 0.999);

/// Code emitted for glyphs that have no EIA-608 encoding (renders `£`).
pub const UNKNOWN_CHAR_CODE: &str = "91b6";

/// What a control codeword does to the caption model. Positioning is
/// resolved separately through [`pac_positioning`]; every command that
/// neither positions nor toggles italics is a no-op for decoding purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandEffect {
    ItalicsOn,
    ItalicsOff,
    Other,
}

/// (high byte, first low byte) of the PAC range for rows 1..=15, before
/// parity. Odd rows use lows 0x40..=0x5f, even rows 0x60..=0x7f.
const ROW_PAC_BASES: [(u8, u8); 15] = [
    (0x11, 0x40),
    (0x11, 0x60),
    (0x12, 0x40),
    (0x12, 0x60),
    (0x15, 0x40),
    (0x15, 0x60),
    (0x16, 0x40),
    (0x16, 0x60),
    (0x17, 0x40),
    (0x17, 0x60),
    (0x10, 0x40),
    (0x13, 0x40),
    (0x13, 0x60),
    (0x14, 0x40),
    (0x14, 0x60),
];

/// Special characters, second byte 0x30..=0x3f after a 0x11 high byte.
/// 0x39 is the transparent space.
const SPECIAL_SET: [char; 16] = [
    '®', '°', '½', '¿', '™', '¢', '£', '♪', 'à', ' ', 'è', 'â', 'ê', 'î', 'ô', 'û',
];

/// Extended Spanish/Miscellaneous/French set, high byte 0x12.
const EXTENDED_SET_12: [char; 32] = [
    'Á', 'É', 'Ó', 'Ú', 'Ü', 'ü', '‘', '¡', '*', '\'', '—', '©', '℠', '•', '“', '”', 'À', 'Â',
    'Ç', 'È', 'Ê', 'Ë', 'ë', 'Î', 'Ï', 'ï', 'Ô', 'Ù', 'ù', 'Û', '«', '»',
];

/// Extended Portuguese/German/Danish set, high byte 0x13.
const EXTENDED_SET_13: [char; 32] = [
    'Ã', 'ã', 'Í', 'Ì', 'ì', 'Ò', 'ò', 'Õ', 'õ', '{', '}', '\\', '^', '_', '¦', '~', 'Ä', 'ä',
    'Ö', 'ö', 'ß', '¥', '¤', '|', 'Å', 'å', 'Ø', 'ø', '┌', '┐', '└', '┘',
];

fn odd_parity(byte: u8) -> u8 {
    if byte.count_ones() % 2 == 0 {
        byte | 0x80
    } else {
        byte
    }
}

fn hex_byte(byte: u8) -> String {
    format!("{:02x}", odd_parity(byte))
}

fn hex_word(high: u8, low: u8) -> String {
    format!("{}{}", hex_byte(high), hex_byte(low))
}

/// The basic character set: printable ASCII with the EIA-608 substitutions.
fn basic_character(byte: u8) -> char {
    match byte {
        0x2a => 'á',
        0x5c => 'é',
        0x5e => 'í',
        0x5f => 'ó',
        0x60 => 'ú',
        0x7b => 'ç',
        0x7c => '÷',
        0x7d => 'Ñ',
        0x7e => 'ñ',
        0x7f => '█',
        b => b as char,
    }
}

fn build_commands() -> HashMap<String, CommandEffect> {
    let mut map = HashMap::new();

    // Miscellaneous control codes: RCL, BS, AOF, AON, DER, RU2, RU3, RU4,
    // FON, RDC, TR, RTD, EDM, CR, ENM, EOC. The interpreter dispatches the
    // interesting ones by word; here they only need to be recognized.
    for low in 0x20..=0x2f {
        map.insert(hex_word(0x14, low), CommandEffect::Other);
    }

    // Tab offsets 1-3.
    for low in 0x21..=0x23 {
        map.insert(hex_word(0x17, low), CommandEffect::Other);
    }

    // Mid-row codes: 0x2e/0x2f select italics, every other attribute
    // (white through magenta, underlined or not) implicitly ends them.
    for low in 0x20..=0x2f {
        let effect = if low >= 0x2e {
            CommandEffect::ItalicsOn
        } else {
            CommandEffect::ItalicsOff
        };
        map.insert(hex_word(0x11, low), effect);
    }

    // Style PACs carrying the italics attribute, one pair per row.
    for (high, low_base) in ROW_PAC_BASES {
        map.insert(hex_word(high, low_base + 0x0e), CommandEffect::ItalicsOn);
        map.insert(hex_word(high, low_base + 0x0f), CommandEffect::ItalicsOn);
    }

    map
}

fn build_characters() -> HashMap<String, String> {
    let mut map: HashMap<String, String> = (0x20..=0x7f)
        .map(|b| (hex_byte(b), basic_character(b).to_string()))
        .collect();
    // The null byte decodes to nothing; it pads odd-length text.
    map.insert("80".to_string(), String::new());
    map
}

fn build_special_chars() -> HashMap<String, String> {
    SPECIAL_SET
        .iter()
        .enumerate()
        .map(|(i, c)| (hex_word(0x11, 0x30 + i as u8), c.to_string()))
        .collect()
}

fn build_extended_chars() -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (i, c) in EXTENDED_SET_12.iter().enumerate() {
        map.insert(hex_word(0x12, 0x20 + i as u8), c.to_string());
    }
    for (i, c) in EXTENDED_SET_13.iter().enumerate() {
        map.insert(hex_word(0x13, 0x20 + i as u8), c.to_string());
    }
    map
}

fn build_pac_map() -> HashMap<String, HashMap<String, Position>> {
    let mut map: HashMap<String, HashMap<String, Position>> = HashMap::new();
    for (i, (high, low_base)) in ROW_PAC_BASES.iter().enumerate() {
        let row = i as u8 + 1;
        let lows = map.entry(hex_byte(*high)).or_default();
        for off in 0x00..=0x1f {
            // 0x00..=0x0f are color/style codes at column 0; 0x10..=0x1f
            // are indent codes in steps of four columns, with and without
            // underline.
            let col = if off < 0x10 { 0 } else { ((off - 0x10) / 2) * 4 };
            lows.insert(hex_byte(low_base + off), Position::new(row, col));
        }
    }
    map
}

lazy_static! {
    /// Recognized control codewords and their effect on the caption model.
    pub static ref COMMANDS: HashMap<String, CommandEffect> = build_commands();

    /// Single parity-applied byte to basic character. `80` decodes to
    /// an empty string.
    pub static ref CHARACTERS: HashMap<String, String> = build_characters();

    /// Special-character codewords (`91..` range).
    pub static ref SPECIAL_CHARS: HashMap<String, String> = build_special_chars();

    /// Extended western-European codewords (`92..`/`13..` ranges).
    pub static ref EXTENDED_CHARS: HashMap<String, String> = build_extended_chars();

    /// Preamble Address Codes: high byte, then low byte, to (row, column).
    pub static ref PAC_BYTES_TO_POSITIONING_MAP: HashMap<String, HashMap<String, Position>> =
        build_pac_map();

    /// Encoder inverse of [`CHARACTERS`].
    pub static ref CHARACTER_TO_CODE: HashMap<char, String> = (0x20..=0x7f)
        .map(|b| (basic_character(b), hex_byte(b)))
        .collect();

    /// Encoder inverse of the special and extended tables. On duplicates
    /// the special-character code wins.
    pub static ref SPECIAL_OR_EXTENDED_CHAR_TO_CODE: HashMap<char, String> = {
        let mut map = HashMap::new();
        for (word, text) in EXTENDED_CHARS.iter().chain(SPECIAL_CHARS.iter()) {
            if let Some(c) = text.chars().next() {
                map.insert(c, word.clone());
            }
        }
        map
    };

    /// Column-0, no-style PAC bytes per row, indexed 1..=15 (index 0 is
    /// a placeholder).
    pub static ref PAC_HIGH_BYTE_BY_ROW: Vec<String> = {
        let mut v = vec![String::new()];
        v.extend(ROW_PAC_BASES.iter().map(|(high, _)| hex_byte(*high)));
        v
    };

    /// Companion low bytes for [`PAC_HIGH_BYTE_BY_ROW`].
    pub static ref PAC_LOW_BYTE_BY_ROW_RESTRICTED: Vec<String> = {
        let mut v = vec![String::new()];
        v.extend(ROW_PAC_BASES.iter().map(|(_, low_base)| hex_byte(low_base + 0x10)));
        v
    };
}

pub fn is_command(word: &str) -> bool {
    COMMANDS.contains_key(word)
}

pub fn command_effect(word: &str) -> CommandEffect {
    COMMANDS
        .get(word)
        .copied()
        .unwrap_or(CommandEffect::Other)
}

/// Whether the word is a Preamble Address Code.
pub fn is_pac_command(word: &str) -> bool {
    pac_positioning(word).is_some()
}

/// The (row, column) a PAC addresses, if the word is one.
pub fn pac_positioning(word: &str) -> Option<Position> {
    if word.len() != 4 || !word.is_ascii() {
        return None;
    }
    let (high, low) = word.split_at(2);
    PAC_BYTES_TO_POSITIONING_MAP
        .get(high)
        .and_then(|lows| lows.get(low))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parity_matches_documents() {
        // Words taken from broadcast SCC material.
        assert_eq!(hex_word(0x14, 0x20), "9420");
        assert_eq!(hex_word(0x14, 0x2c), "942c");
        assert_eq!(hex_word(0x14, 0x2f), "942f");
        assert_eq!(hex_word(0x11, 0x2e), "91ae");
        assert_eq!(hex_byte(0x48), "c8"); // 'H'
        assert_eq!(hex_byte(0x65), "e5"); // 'e'
    }

    #[test]
    fn test_pac_positioning() {
        assert_eq!(pac_positioning("9470"), Some(Position::new(15, 0)));
        assert_eq!(pac_positioning("94d0"), Some(Position::new(14, 0)));
        assert_eq!(pac_positioning("1370"), Some(Position::new(13, 0)));
        // Indent 28 on row 15: low base 0x60 + 0x1e.
        assert_eq!(pac_positioning("94fe"), Some(Position::new(15, 28)));
        assert_eq!(pac_positioning("9420"), None);
        assert_eq!(pac_positioning("c8e5"), None);
    }

    #[test]
    fn test_characters() {
        assert_eq!(CHARACTERS.get("c8").map(String::as_str), Some("H"));
        assert_eq!(CHARACTERS.get("80").map(String::as_str), Some(""));
        assert_eq!(CHARACTERS.get("2a").map(String::as_str), Some("á"));
        assert_eq!(SPECIAL_CHARS.get("91b6").map(String::as_str), Some("£"));
        assert_eq!(EXTENDED_CHARS.get("9220").map(String::as_str), Some("Á"));
    }

    #[test]
    fn test_command_effects() {
        assert_eq!(command_effect("91ae"), CommandEffect::ItalicsOn);
        assert_eq!(command_effect("912f"), CommandEffect::ItalicsOn);
        assert_eq!(command_effect("9120"), CommandEffect::ItalicsOff);
        assert_eq!(command_effect("9420"), CommandEffect::Other);
        assert!(is_command("94a7"));
        assert!(!is_command("c8e5"));
    }

    #[test]
    fn test_encoder_tables() {
        assert_eq!(CHARACTER_TO_CODE.get(&'H').map(String::as_str), Some("c8"));
        assert_eq!(
            SPECIAL_OR_EXTENDED_CHAR_TO_CODE.get(&'£').map(String::as_str),
            Some("91b6")
        );
        assert_eq!(PAC_HIGH_BYTE_BY_ROW[15], "94");
        assert_eq!(PAC_LOW_BYTE_BY_ROW_RESTRICTED[15], "70");
        assert_eq!(PAC_HIGH_BYTE_BY_ROW[13], "13");
        assert_eq!(PAC_LOW_BYTE_BY_ROW_RESTRICTED[13], "70");
    }
}
