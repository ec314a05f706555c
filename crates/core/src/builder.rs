//! Building canonical codes from symbol frequencies.
//!
//! Construction happens in three steps:
//! 1. Count how many symbols get each code length, using a greedy merge of
//!    the two lightest nodes that is carried out level by level so that no
//!    code exceeds the length bound (the boundary merge used by DEFLATE
//!    encoders). The result is an optimal length-limited code.
//! 2. Hand out those lengths: symbols are ordered by (frequency, symbol)
//!    ascending, the longest lengths go to the front of that order.
//! 3. Assign canonical values from the lengths alone.
//!
//! Every step is a pure function of the frequency table, so identical
//! frequencies always produce identical codes.

use std::io;

use crate::code::{BitCode, Code, Symbol, MAX_CODE_LEN, MAX_SYMBOLS};
use crate::error::{CodeError, Result};
use crate::split::SymbolSplitter;

/// Options for code construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeConfig {
    /// Longest code length to produce, 1..=20
    pub max_code_len: u8,
}

impl CodeConfig {
    /// Length bound used when none is given.
    pub const DEFAULT_MAX_CODE_LEN: u8 = 15;

    /// Create a configuration with the given length bound.
    pub fn with_max_code_len(max_code_len: u8) -> Self {
        Self { max_code_len }
    }

    /// The default bound, widened just enough to address `live` symbols.
    fn for_live_symbols(live: usize) -> Self {
        Self::with_max_code_len(Self::DEFAULT_MAX_CODE_LEN.max(bits_for(live)))
    }

    fn validate(&self, live: usize) -> Result<()> {
        if self.max_code_len == 0 || self.max_code_len > MAX_CODE_LEN {
            return Err(CodeError::InvalidMaxLength {
                max_len: self.max_code_len,
            }
            .into());
        }
        if live > 1usize << self.max_code_len {
            return Err(CodeError::MaxLengthTooSmall {
                max_len: self.max_code_len,
                symbols: live,
            }
            .into());
        }
        Ok(())
    }
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self::with_max_code_len(Self::DEFAULT_MAX_CODE_LEN)
    }
}

impl Code {
    /// Construct a code for symbols with the given frequencies.
    ///
    /// `frequencies[i]` is the frequency of symbol `i`. Symbols with frequency
    /// 0 get no code and must not be given to an encoder. Codes are limited
    /// to 15 bits unless the number of live symbols needs more (up to 20).
    ///
    /// # Errors
    /// - `CodeError::TooManySymbols` if there are more than 2^20 frequencies
    /// - `CodeError::InvalidFrequency` if a frequency is negative
    pub fn from_frequencies(frequencies: &[i64]) -> Result<Self> {
        check_frequencies(frequencies)?;
        let live = frequencies.iter().filter(|&&f| f > 0).count();
        build(frequencies, CodeConfig::for_live_symbols(live), live)
    }

    /// Construct a code with an explicit configuration.
    ///
    /// Unlike [`from_frequencies`](Code::from_frequencies) the length bound
    /// is never widened.
    ///
    /// # Errors
    /// As for `from_frequencies`, plus:
    /// - `CodeError::InvalidMaxLength` if the bound is outside 1..=20
    /// - `CodeError::MaxLengthTooSmall` if the bound cannot address every
    ///   live symbol
    pub fn with_config(frequencies: &[i64], config: &CodeConfig) -> Result<Self> {
        check_frequencies(frequencies)?;
        let live = frequencies.iter().filter(|&&f| f > 0).count();
        build(frequencies, *config, live)
    }
}

// Fail fast, before any construction work.
fn check_frequencies(frequencies: &[i64]) -> Result<()> {
    if frequencies.len() > MAX_SYMBOLS {
        return Err(CodeError::TooManySymbols {
            count: frequencies.len(),
            max: MAX_SYMBOLS,
        }
        .into());
    }
    if let Some((symbol, &frequency)) = frequencies.iter().enumerate().find(|&(_, &f)| f < 0) {
        return Err(CodeError::InvalidFrequency {
            symbol: symbol as Symbol,
            frequency,
        }
        .into());
    }
    Ok(())
}

fn build(frequencies: &[i64], config: CodeConfig, live: usize) -> Result<Code> {
    config.validate(live)?;
    let lengths = code_lengths(frequencies, config.max_code_len);
    let mut codes: Vec<BitCode> = lengths.iter().map(|&len| BitCode::new(0, len)).collect();
    crate::code::assign_values(&mut codes);
    let code = Code::from_bit_codes(codes);
    log::debug!(
        "built code: {} symbols, {} live, max length {} (bound {})",
        code.len(),
        live,
        code.max_len(),
        config.max_code_len
    );
    Ok(code)
}

/// Smallest number of bits that gives every one of `n` symbols its own code.
fn bits_for(n: usize) -> u8 {
    match n {
        0 | 1 => 1,
        n => (usize::BITS - (n - 1).leading_zeros()) as u8,
    }
}

/// Compute a length for every symbol, none longer than `max_len`.
///
/// Frequencies must be non-negative and `max_len` large enough for the
/// number of live symbols.
fn code_lengths(frequencies: &[i64], max_len: u8) -> Vec<u8> {
    let mut lengths = vec![0u8; frequencies.len()];
    let mut list: Vec<(u128, Symbol)> = frequencies
        .iter()
        .enumerate()
        .filter(|&(_, &f)| f > 0)
        .map(|(symbol, &f)| (f as u128, symbol as Symbol))
        .collect();

    if list.len() <= 2 {
        for &(_, symbol) in &list {
            lengths[symbol as usize] = 1;
        }
        return lengths;
    }

    // (frequency, symbol) pairs are unique, so the order is total
    list.sort_unstable();

    // Shortest codes go to the back of the list.
    let counts = bit_counts(&list, max_len);
    let mut rest = &list[..];
    for (len, &count) in counts.iter().enumerate().skip(1) {
        let (head, chunk) = rest.split_at(rest.len() - count);
        for &(_, symbol) in chunk {
            lengths[symbol as usize] = len as u8;
        }
        rest = head;
    }
    debug_assert!(rest.is_empty());
    lengths
}

#[derive(Debug, Clone, Copy, Default)]
struct Level {
    /// Weight of the last node chosen at this level
    last_freq: u128,
    /// Weight of the next unused leaf at this level
    next_char_freq: u128,
    /// Weight of the next pair offered by the level below
    next_pair_freq: u128,
    /// Nodes this level still has to produce
    needed: i64,
}

/// Return how many symbols receive each code length.
///
/// `list` is sorted by frequency and holds at least three entries. Entry `i`
/// of the result is the number of codes of length `i`.
fn bit_counts(list: &[(u128, Symbol)], max_len: u8) -> Vec<usize> {
    const NONE: u128 = u128::MAX;
    let n = list.len();
    let freq = |i: usize| list.get(i).map_or(NONE, |&(f, _)| f);
    let max_bits = usize::from(max_len).min(n - 1);

    let mut levels = vec![Level::default(); max_bits + 2];
    // leaf_counts[level][j]: leaves used at depth j by the chain ending at `level`
    let mut leaf_counts = vec![vec![0usize; max_bits + 1]; max_bits + 1];
    for level in 1..=max_bits {
        levels[level] = Level {
            last_freq: freq(1),
            next_char_freq: freq(2),
            next_pair_freq: if level == 1 { NONE } else { freq(0) + freq(1) },
            needed: 0,
        };
        leaf_counts[level][level] = 2;
    }
    // a full binary tree with n leaves has 2n - 2 non-root nodes, the two
    // lightest leaves are already placed
    levels[max_bits].needed = 2 * n as i64 - 4;

    let mut level = max_bits;
    loop {
        if levels[level].next_pair_freq == NONE && levels[level].next_char_freq == NONE {
            // nothing left to take at this level
            levels[level].needed = 0;
            levels[level + 1].next_pair_freq = NONE;
            level += 1;
            continue;
        }

        let prev_freq = levels[level].last_freq;
        if levels[level].next_char_freq < levels[level].next_pair_freq {
            // take a leaf
            let used = leaf_counts[level][level] + 1;
            levels[level].last_freq = levels[level].next_char_freq;
            leaf_counts[level][level] = used;
            levels[level].next_char_freq = freq(used);
        } else {
            // take a pair from the level below and inherit its leaf counts
            levels[level].last_freq = levels[level].next_pair_freq;
            let (lower, upper) = leaf_counts.split_at_mut(level);
            upper[0][..level].copy_from_slice(&lower[level - 1][..level]);
            levels[level - 1].needed = 2;
        }

        levels[level].needed -= 1;
        if levels[level].needed == 0 {
            if level == max_bits {
                break;
            }
            levels[level + 1].next_pair_freq = prev_freq + levels[level].last_freq;
            level += 1;
        } else {
            while levels[level - 1].needed > 0 {
                level -= 1;
            }
        }
    }
    debug_assert_eq!(leaf_counts[max_bits][max_bits], n);

    let counts = &leaf_counts[max_bits];
    let mut bit_count = vec![0usize; max_bits + 1];
    for (bits, level) in (1..=max_bits).zip((1..=max_bits).rev()) {
        bit_count[bits] = counts[level] - counts[level - 1];
    }
    bit_count
}

/// Accumulates symbol frequencies from a byte stream.
///
/// Feed it data with [`feed`](CodeBuilder::feed) (or through
/// [`io::Write`]) and call [`code`](CodeBuilder::code) once to get the
/// finished [`Code`]. Without a splitter every byte is one symbol.
pub struct CodeBuilder<'a> {
    splitter: Option<Box<dyn SymbolSplitter + 'a>>,
    frequencies: Vec<i64>,
    /// Largest out-of-range symbol seen, reported when the code is built
    overflow: Option<Symbol>,
}

impl<'a> CodeBuilder<'a> {
    /// Create a builder that treats each byte as a symbol.
    pub fn new() -> Self {
        Self {
            splitter: None,
            frequencies: Vec::new(),
            overflow: None,
        }
    }

    /// Create a builder that maps bytes to symbols with `splitter`.
    pub fn with_splitter<S>(splitter: S) -> Self
    where
        S: SymbolSplitter + 'a,
    {
        Self {
            splitter: Some(Box::new(splitter)),
            ..Self::new()
        }
    }

    /// Count the symbols in `data`.
    pub fn feed(&mut self, data: &[u8]) {
        match self.splitter.as_mut() {
            Some(splitter) => {
                let symbols = splitter.split(data);
                self.add_symbols(&symbols);
            }
            None => {
                for &b in data {
                    self.add_symbol(Symbol::from(b));
                }
            }
        }
    }

    /// Count one occurrence of `symbol`.
    pub fn add_symbol(&mut self, symbol: Symbol) {
        let index = symbol as usize;
        if index >= MAX_SYMBOLS {
            self.overflow = self.overflow.max(Some(symbol));
            return;
        }
        if index >= self.frequencies.len() {
            self.frequencies.resize(index + 1, 0);
        }
        self.frequencies[index] += 1;
    }

    /// Count every symbol in `symbols`.
    pub fn add_symbols(&mut self, symbols: &[Symbol]) {
        for &symbol in symbols {
            self.add_symbol(symbol);
        }
    }

    /// Frequencies counted so far, indexed by symbol.
    pub fn frequencies(&self) -> &[i64] {
        &self.frequencies
    }

    /// Build the code for everything counted so far.
    pub fn code(self) -> Result<Code> {
        self.check_overflow()?;
        Code::from_frequencies(&self.frequencies)
    }

    /// Build the code with an explicit configuration.
    pub fn code_with_config(self, config: &CodeConfig) -> Result<Code> {
        self.check_overflow()?;
        Code::with_config(&self.frequencies, config)
    }

    fn check_overflow(&self) -> Result<()> {
        match self.overflow {
            Some(symbol) => Err(CodeError::TooManySymbols {
                count: symbol as usize + 1,
                max: MAX_SYMBOLS,
            }
            .into()),
            None => Ok(()),
        }
    }
}

impl Default for CodeBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CodeBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeBuilder")
            .field("splitter", &self.splitter.is_some())
            .field("symbols", &self.frequencies.len())
            .field("overflow", &self.overflow)
            .finish()
    }
}

/// Always consumes the whole buffer.
impl io::Write for CodeBuilder<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.feed(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn lengths_of(code: &Code) -> Vec<u8> {
        code.lengths().collect()
    }

    fn byte_frequencies(data: &[u8]) -> Vec<i64> {
        let mut freqs = vec![0i64; 256];
        for &b in data {
            freqs[b as usize] += 1;
        }
        freqs
    }

    fn kraft_sum(code: &Code) -> f64 {
        code.lengths()
            .filter(|&len| len > 0)
            .map(|len| 2f64.powi(-i32::from(len)))
            .sum()
    }

    fn fibonacci(n: usize) -> Vec<i64> {
        let mut fib = vec![1i64, 1];
        while fib.len() < n {
            let next = fib[fib.len() - 1] + fib[fib.len() - 2];
            fib.push(next);
        }
        fib
    }

    #[test]
    fn test_textbook_frequencies() {
        let code = Code::from_frequencies(&[5, 9, 12, 13, 16, 45]).unwrap();
        assert_eq!(lengths_of(&code), vec![4, 4, 3, 3, 3, 1]);
    }

    #[test]
    fn test_panama() {
        let code = Code::from_frequencies(&byte_frequencies(b"a man a plan a canal panama")).unwrap();
        let expect = [
            (b'a', 0, 1),
            (b' ', 0b100, 3),
            (b'n', 0b101, 3),
            (b'c', 0b1100, 4),
            (b'l', 0b1101, 4),
            (b'm', 0b1110, 4),
            (b'p', 0b1111, 4),
        ];
        for (symbol, value, len) in expect {
            assert_eq!(
                code.get(Symbol::from(symbol)),
                Some(BitCode::new(value, len)),
                "symbol {:?}",
                symbol as char
            );
        }
        assert_eq!(code.live_symbols(), 7);
    }

    #[test]
    fn test_ties_follow_symbol_order() {
        let code = Code::from_frequencies(&[3, 3, 3]).unwrap();
        assert_eq!(lengths_of(&code), vec![2, 2, 1]);
        let code = Code::from_frequencies(&[1, 1, 1, 1]).unwrap();
        assert_eq!(lengths_of(&code), vec![2, 2, 2, 2]);
    }

    #[test]
    fn test_zero_frequencies_get_no_code() {
        let code = Code::from_frequencies(&[0, 7, 0, 7, 7, 0]).unwrap();
        assert_eq!(lengths_of(&code), vec![0, 2, 0, 2, 1, 0]);
        assert_eq!(code.get(0), None);
    }

    #[test]
    fn test_one_and_two_symbols() {
        let code = Code::from_frequencies(&[0, 0, 42]).unwrap();
        assert_eq!(lengths_of(&code), vec![0, 0, 1]);
        assert_eq!(code.get(2), Some(BitCode::new(0, 1)));

        let code = Code::from_frequencies(&[1, 1000]).unwrap();
        assert_eq!(lengths_of(&code), vec![1, 1]);
    }

    #[test]
    fn test_no_symbols() {
        let code = Code::from_frequencies(&[0, 0, 0]).unwrap();
        assert_eq!(lengths_of(&code), vec![0, 0, 0]);
        let code = Code::from_frequencies(&[]).unwrap();
        assert!(code.is_empty());
    }

    #[test]
    fn test_length_limit() {
        // unbounded huffman would need 39 bits here
        let code = Code::from_frequencies(&fibonacci(40)).unwrap();
        let mut want = vec![15u8; 16];
        want.extend([14, 14, 13, 12, 11, 11, 10, 10, 9, 9, 8, 8, 7, 7, 6, 6, 5, 5, 4, 4, 3, 3, 2, 2]);
        assert_eq!(lengths_of(&code), want);
        assert_eq!(kraft_sum(&code), 1.0);
    }

    #[test]
    fn test_explicit_bound() {
        let config = CodeConfig::with_max_code_len(8);
        let code = Code::with_config(&fibonacci(20), &config).unwrap();
        let mut want = vec![8u8; 10];
        want.extend([7, 6, 5, 5, 4, 4, 3, 3, 2, 2]);
        assert_eq!(lengths_of(&code), want);

        let code = Code::with_config(&fibonacci(40), &CodeConfig::with_max_code_len(20)).unwrap();
        assert_eq!(code.max_len(), 20);
        assert_eq!(kraft_sum(&code), 1.0);
    }

    #[test]
    fn test_bound_too_small() {
        let freqs = vec![1i64; 300];
        let result = Code::with_config(&freqs, &CodeConfig::with_max_code_len(8));
        assert!(matches!(
            result,
            Err(Error::Code(CodeError::MaxLengthTooSmall {
                max_len: 8,
                symbols: 300
            }))
        ));
        let code = Code::with_config(&freqs, &CodeConfig::with_max_code_len(9)).unwrap();
        assert_eq!(code.max_len(), 9);
    }

    #[test]
    fn test_invalid_bound() {
        for max_len in [0, 21] {
            let result = Code::with_config(&[1, 2, 3], &CodeConfig::with_max_code_len(max_len));
            assert!(matches!(
                result,
                Err(Error::Code(CodeError::InvalidMaxLength { .. }))
            ));
        }
    }

    #[test]
    fn test_default_bound_widens_for_large_alphabets() {
        let freqs: Vec<i64> = (0..40_000).map(|i| 1 + (i % 7)).collect();
        let code = Code::from_frequencies(&freqs).unwrap();
        assert_eq!(code.max_len(), 16);
        assert_eq!(code.live_symbols(), 40_000);
        assert!(kraft_sum(&code) <= 1.0);
    }

    #[test]
    fn test_too_many_symbols() {
        let freqs = vec![0i64; MAX_SYMBOLS + 1];
        let result = Code::from_frequencies(&freqs);
        assert!(matches!(
            result,
            Err(Error::Code(CodeError::TooManySymbols { count, .. })) if count == MAX_SYMBOLS + 1
        ));
    }

    #[test]
    fn test_negative_frequency() {
        let result = Code::from_frequencies(&[4, 0, -1, 3]);
        assert!(matches!(
            result,
            Err(Error::Code(CodeError::InvalidFrequency {
                symbol: 2,
                frequency: -1
            }))
        ));
    }

    #[test]
    fn test_deterministic() {
        let freqs: Vec<i64> = (0..1000).map(|i| (i * 7919) % 113).collect();
        let a = Code::from_frequencies(&freqs).unwrap();
        let b = Code::from_frequencies(&freqs).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bits_for() {
        assert_eq!(bits_for(0), 1);
        assert_eq!(bits_for(2), 1);
        assert_eq!(bits_for(3), 2);
        assert_eq!(bits_for(32_768), 15);
        assert_eq!(bits_for(32_769), 16);
        assert_eq!(bits_for(MAX_SYMBOLS), 20);
    }

    #[test]
    fn test_builder_counts_bytes() {
        let mut builder = CodeBuilder::new();
        builder.feed(b"a man a plan ");
        builder.feed(b"a canal panama");
        assert_eq!(builder.frequencies()[b'a' as usize], 10);
        let code = builder.code().unwrap();
        let direct = Code::from_frequencies(&byte_frequencies(b"a man a plan a canal panama")).unwrap();
        // the builder's table stops at the largest byte seen
        assert_eq!(code.len(), usize::from(b'p') + 1);
        assert!(code.iter().zip(direct.iter()).all(|(a, b)| a == b));
    }

    #[test]
    fn test_builder_io_write() {
        use std::io::Write;
        let mut builder = CodeBuilder::new();
        assert_eq!(builder.write(b"abcab").unwrap(), 5);
        builder.write_all(b"a").unwrap();
        assert_eq!(&builder.frequencies()[b'a' as usize..], &[3, 2, 1]);
    }

    #[test]
    fn test_builder_with_splitter() {
        let words = |data: &[u8]| -> Vec<Symbol> {
            data.split(|&b| b == b' ')
                .map(|w| w.len() as Symbol * 1000)
                .collect()
        };
        let mut builder = CodeBuilder::with_splitter(words);
        builder.feed(b"aa bb c");
        assert_eq!(builder.frequencies().len(), 2001);
        assert_eq!(builder.frequencies()[2000], 2);
        assert_eq!(builder.frequencies()[1000], 1);
        let code = builder.code().unwrap();
        assert_eq!(code.live_symbols(), 2);
    }

    #[test]
    fn test_builder_symbol_out_of_range() {
        let mut builder = CodeBuilder::new();
        builder.add_symbols(&[1, 2, MAX_SYMBOLS as Symbol]);
        assert_eq!(builder.frequencies().len(), 3);
        assert!(matches!(
            builder.code(),
            Err(Error::Code(CodeError::TooManySymbols { .. }))
        ));
    }
}
