//! Lexical layer for SCC documents: timecodes and the
//! `timecode <tab> codewords` shape of a caption line.
//!
//! Codeword interpretation lives in the reader; this module only carves
//! lines into their parts.

use std::io;

use nom::character::complete::{char, one_of, space0};
use nom::combinator::{map, map_res, rest};
use nom::sequence::{terminated, tuple};
use nom::IResult;
use thiserror::Error;

use crate::time::Timecode;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("empty caption file")]
    NoCaptions,
    #[error("no Preamble Address Code [PAC] was provided")]
    MissingPac,
}

fn two_digits(input: &str) -> IResult<&str, u8> {
    map_res(
        nom::bytes::complete::take_while_m_n(2, 2, |c: char| c.is_ascii_digit()),
        str::parse,
    )(input)
}

/// `HH:MM:SS:FF` or, with a `;` before the frames, the drop-frame variant.
pub fn timecode(input: &str) -> IResult<&str, Timecode> {
    map(
        tuple((
            terminated(two_digits, char(':')),
            terminated(two_digits, char(':')),
            two_digits,
            one_of(":;"),
            two_digits,
        )),
        |(hours, minutes, seconds, separator, frames)| {
            Timecode::new(hours, minutes, seconds, frames, separator == ';')
        },
    )(input)
}

/// Splits a caption line into its timecode and the codeword section.
/// The codewords are returned raw; the reader decides what each one is.
pub fn caption_line(input: &str) -> IResult<&str, (Timecode, &str)> {
    map(tuple((timecode, space0, rest)), |(timecode, _, words)| {
        (timecode, words)
    })(input)
}
