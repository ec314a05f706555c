//! Compact serialization of a code table.
//!
//! Only lengths are stored; values are recomputed on load, so the result is
//! canonical by construction. Layout:
//!
//! ```text
//! byte 0     11vvvvvv   magic (top two bits) and format version
//! byte 1..   one run of identical lengths per byte:
//!            RRRRRRR0   length 0,      repeat 1..=128
//!            RRLLLL01   length 1..=16, repeat 1..=4
//!            RRRRLL11   length 17..=20, repeat 1..=16
//! ```
//!
//! `R` and `L` are stored minus their minimum (1, and 1 or 17). A run longer
//! than one byte can hold continues in the next byte.

use crate::code::{self, BitCode, Code, MAX_SYMBOLS};
use crate::error::{FormatError, Result};

/// Current format version.
const VERSION: u8 = 0;
const MAGIC: u8 = 0b11 << 6 | VERSION;

/// How one run of equal lengths is packed.
struct RunFormat {
    /// Bits available for the repeat count
    repeat_bits: u32,
    /// Low bits: the tag and, where it fits, the length
    bottom: u8,
}

impl RunFormat {
    fn for_len(len: u8) -> Self {
        match len {
            0 => Self {
                repeat_bits: 7,
                bottom: 0,
            },
            1..=16 => Self {
                repeat_bits: 2,
                bottom: (len - 1) << 2 | 0b01,
            },
            17..=20 => Self {
                repeat_bits: 4,
                bottom: (len - 17) << 2 | 0b11,
            },
            _ => unreachable!("code length {len} outside 0..=20"),
        }
    }

    fn push(&self, buf: &mut Vec<u8>, mut repeat: usize) {
        let shift = 8 - self.repeat_bits;
        let max = 1usize << self.repeat_bits;
        while repeat > 0 {
            let n = repeat.min(max);
            buf.push(((n - 1) as u8) << shift | self.bottom);
            repeat -= n;
        }
    }
}

/// Split one body byte into (length, repeat).
fn parse_run(b: u8) -> (u8, usize) {
    if b & 1 == 0 {
        (0, usize::from(b >> 1) + 1)
    } else if b & 0b11 == 0b01 {
        ((b >> 2 & 0b1111) + 1, usize::from(b >> 6) + 1)
    } else {
        ((b >> 2 & 0b11) + 17, usize::from(b >> 4) + 1)
    }
}

/// Serialize a length table.
///
/// Any table of lengths in 0..=20 round-trips through
/// [`unmarshal_lengths`], whether or not it forms a usable code.
///
/// # Errors
/// - `CodeError::TooManySymbols` if there are more than 2^20 lengths
/// - `CodeError::InvalidLength` if a length exceeds 20
pub fn marshal_lengths(lengths: &[u8]) -> Result<Vec<u8>> {
    code::check_lengths(lengths)?;
    Ok(write_lengths(lengths))
}

/// Parse a length table written by [`marshal_lengths`] or [`Code::marshal`].
///
/// # Errors
/// - `FormatError::EmptyInput` if `data` is empty
/// - `FormatError::BadMagic` if the first byte is not a known version
/// - `FormatError::Malformed` if the table has more than 2^20 symbols
pub fn unmarshal_lengths(data: &[u8]) -> Result<Vec<u8>> {
    let (&magic, body) = data.split_first().ok_or(FormatError::EmptyInput)?;
    if magic != MAGIC {
        return Err(FormatError::BadMagic { found: magic }.into());
    }

    let mut lengths = Vec::new();
    for &b in body {
        let (len, repeat) = parse_run(b);
        if lengths.len() + repeat > MAX_SYMBOLS {
            return Err(FormatError::Malformed(format!("more than {MAX_SYMBOLS} symbols")).into());
        }
        lengths.resize(lengths.len() + repeat, len);
    }
    Ok(lengths)
}

// Lengths must already be in 0..=20.
fn write_lengths(lengths: &[u8]) -> Vec<u8> {
    let mut buf = vec![MAGIC];
    for run in lengths.chunk_by(|a, b| a == b) {
        RunFormat::for_len(run[0]).push(&mut buf, run.len());
    }
    buf
}

impl Code {
    /// Serialize the code lengths.
    ///
    /// Equal codes always produce identical bytes.
    pub fn marshal(&self) -> Vec<u8> {
        let lengths: Vec<u8> = self.lengths().collect();
        write_lengths(&lengths)
    }

    /// Rebuild a code from bytes produced by [`marshal`](Code::marshal).
    ///
    /// # Errors
    /// As for [`unmarshal_lengths`], plus `FormatError::Malformed` if the
    /// lengths are oversubscribed and so form no prefix code.
    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let lengths = unmarshal_lengths(data)?;
        if !code::kraft_holds(&lengths) {
            return Err(FormatError::Malformed("code lengths are oversubscribed".into()).into());
        }

        let mut codes: Vec<BitCode> = lengths.iter().map(|&len| BitCode::new(0, len)).collect();
        code::assign_values(&mut codes);
        let code = Code::from_bit_codes(codes);
        log::debug!(
            "unmarshalled code: {} bytes, {} symbols, max length {}",
            data.len(),
            code.len(),
            code.max_len()
        );
        Ok(code)
    }
}
