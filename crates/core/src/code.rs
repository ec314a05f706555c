//! The code table: a canonical prefix code indexed by symbol.
//!
//! A [`Code`] maps every symbol of the alphabet to a [`BitCode`]. Lengths are
//! the only free parameter; values are always derived from them with the
//! canonical assignment of RFC 1951 section 3.2.2, so two codes with the same
//! lengths are identical. Codes are immutable once built and can be shared by
//! any number of encoders and decoders.

use crate::error::{CodeError, Result};

/// A symbol of the alphabet.
///
/// It may stand for a byte, a Unicode code point, or an index into a table
/// of strings; the engine does not care.
pub type Symbol = u32;

/// Longest code length the engine (and the marshal format) supports.
pub const MAX_CODE_LEN: u8 = 20;

/// Largest supported alphabet.
pub const MAX_SYMBOLS: usize = 1 << MAX_CODE_LEN;

/// The bit string for one symbol.
///
/// `value` occupies the low `len` bits and is read most significant bit
/// first. A length of 0 means the symbol has no code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BitCode {
    value: u32,
    len: u8,
}

impl BitCode {
    pub(crate) const fn new(value: u32, len: u8) -> Self {
        Self { value, len }
    }

    /// The code bits, in the low `len()` bits.
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Length of the code in bits; 0 if the symbol is unused.
    pub fn len(&self) -> u8 {
        self.len
    }

    /// True if the symbol has no code.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if `self` is a proper bit-prefix of `other`.
    pub fn is_prefix_of(&self, other: &BitCode) -> bool {
        !self.is_empty() && self.len < other.len && other.value >> (other.len - self.len) == self.value
    }
}

/// A canonical prefix code over symbols `0..len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Code {
    codes: Vec<BitCode>,
}

impl Code {
    /// Build a canonical code from one length per symbol.
    ///
    /// # Errors
    /// - `CodeError::TooManySymbols` if there are more than 2^20 lengths
    /// - `CodeError::InvalidLength` if a length exceeds 20
    /// - `CodeError::Oversubscribed` if the lengths violate the Kraft inequality
    pub fn from_lengths(lengths: &[u8]) -> Result<Self> {
        check_lengths(lengths)?;
        if !kraft_holds(lengths) {
            return Err(CodeError::Oversubscribed.into());
        }

        let mut codes: Vec<BitCode> = lengths.iter().map(|&len| BitCode::new(0, len)).collect();
        assign_values(&mut codes);
        Ok(Self { codes })
    }

    /// Wrap already-assigned bit codes. Callers guarantee lengths are valid
    /// and values canonical.
    pub(crate) fn from_bit_codes(codes: Vec<BitCode>) -> Self {
        Self { codes }
    }

    /// Number of symbols in the alphabet (including unused ones).
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// True if the alphabet is empty.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// The code for `symbol`, or `None` if it is out of range or unused.
    pub fn get(&self, symbol: Symbol) -> Option<BitCode> {
        self.codes
            .get(symbol as usize)
            .copied()
            .filter(|code| !code.is_empty())
    }

    /// All bit codes, indexed by symbol.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &BitCode> + '_ {
        self.codes.iter()
    }

    /// Code lengths, indexed by symbol.
    pub fn lengths(&self) -> impl ExactSizeIterator<Item = u8> + '_ {
        self.codes.iter().map(BitCode::len)
    }

    /// Longest code length, or 0 for a code with no used symbols.
    pub fn max_len(&self) -> u8 {
        self.lengths().max().unwrap_or(0)
    }

    /// Number of symbols that have a code.
    pub fn live_symbols(&self) -> usize {
        self.codes.iter().filter(|code| !code.is_empty()).count()
    }

    pub(crate) fn bit_codes(&self) -> &[BitCode] {
        &self.codes
    }
}

/// Check the table size and that every length is in 0..=20.
pub(crate) fn check_lengths(lengths: &[u8]) -> Result<()> {
    if lengths.len() > MAX_SYMBOLS {
        return Err(CodeError::TooManySymbols {
            count: lengths.len(),
            max: MAX_SYMBOLS,
        }
        .into());
    }
    if let Some((symbol, &len)) = lengths
        .iter()
        .enumerate()
        .find(|&(_, &len)| len > MAX_CODE_LEN)
    {
        return Err(CodeError::InvalidLength {
            symbol: symbol as Symbol,
            len,
        }
        .into());
    }
    Ok(())
}

/// Check the Kraft inequality, sum of 2^-len <= 1 over non-zero lengths.
pub(crate) fn kraft_holds(lengths: &[u8]) -> bool {
    let max = u32::from(MAX_CODE_LEN);
    let sum: u64 = lengths
        .iter()
        .filter(|&&len| len > 0)
        .map(|&len| 1u64 << (max - u32::from(len)))
        .sum();
    sum <= 1u64 << max
}

/// Assign canonical values to codes whose lengths are already set.
///
/// Codes of one length get consecutive values in symbol order, and the first
/// code of each length follows the last code of the previous length, shifted
/// left by one.
pub(crate) fn assign_values(codes: &mut [BitCode]) {
    let mut counts = [0u32; MAX_CODE_LEN as usize + 1];
    for code in codes.iter() {
        counts[code.len as usize] += 1;
    }
    counts[0] = 0;

    let mut next = [0u32; MAX_CODE_LEN as usize + 1];
    let mut value = 0u32;
    for len in 1..=MAX_CODE_LEN as usize {
        value = (value + counts[len - 1]) << 1;
        next[len] = value;
    }
    log::trace!("canonical code counts per length: {:?}", &counts[1..]);

    for code in codes.iter_mut().filter(|code| code.len > 0) {
        code.value = next[code.len as usize];
        next[code.len as usize] += 1;
    }
}
