//! Table-driven decoding.
//!
//! A [`DecodeTable`] resolves up to 8 bits per lookup. Each of its 256 slots
//! either names a symbol (with the number of bits its code really uses) or
//! chains to another 256-slot table covering the next 8 bits. Codes of up
//! to 20 bits need at most three lookups.
//!
//! Codewords are read most significant bit first, so the 8-bit lookahead is
//! bit-reversed before indexing: the code's first bit lands in the index's
//! high bit, and a code of length `len` owns every slot whose high `len`
//! bits equal its value.

use std::io::{self, Read};

use crate::bitio::BitReader;
use crate::code::{Code, Symbol};
use crate::error::{BitIoError, DecodeError, Error, Result};

/// Bits resolved by one table lookup.
const LOOKUP_BITS: u8 = 8;
const TABLE_SIZE: usize = 1 << LOOKUP_BITS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Action {
    /// No code starts with these bits
    #[default]
    Invalid,
    /// Emit `symbol`, consuming `len` (1..=8) bits
    Symbol { symbol: Symbol, len: u8 },
    /// Consume 8 bits and continue in another table
    Chain(u32),
}

/// Lookup tables for decoding one [`Code`].
///
/// Built once, then shared read-only by any number of [`Decoder`]s.
#[derive(Clone)]
pub struct DecodeTable {
    /// Index 0 is the root; chained tables follow in creation order
    tables: Vec<[Action; TABLE_SIZE]>,
}

impl DecodeTable {
    /// Build the tables for `code`.
    pub fn new(code: &Code) -> Self {
        let mut table = Self {
            tables: vec![[Action::Invalid; TABLE_SIZE]],
        };
        for (symbol, bit_code) in code.bit_codes().iter().enumerate() {
            if !bit_code.is_empty() {
                table.insert(0, symbol as Symbol, bit_code.value(), bit_code.len());
            }
        }
        log::debug!(
            "built decode table: {} live symbols, {} tables",
            code.live_symbols(),
            table.tables.len()
        );
        table
    }

    /// Number of 256-slot tables, the root included.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    fn insert(&mut self, index: usize, symbol: Symbol, value: u32, len: u8) {
        if len <= LOOKUP_BITS {
            let pad = LOOKUP_BITS - len;
            let first = (value as usize) << pad;
            let slots = &mut self.tables[index][first..first + (1 << pad)];
            slots.fill(Action::Symbol { symbol, len });
            return;
        }

        let rest = len - LOOKUP_BITS;
        let slot = (value >> rest) as usize;
        let next = match self.tables[index][slot] {
            Action::Chain(next) => next as usize,
            Action::Invalid => {
                let next = self.tables.len();
                self.tables.push([Action::Invalid; TABLE_SIZE]);
                self.tables[index][slot] = Action::Chain(next as u32);
                next
            }
            Action::Symbol { .. } => unreachable!("code for symbol {symbol} is not prefix-free"),
        };
        self.insert(next, symbol, value & ((1 << rest) - 1), rest);
    }
}

impl std::fmt::Debug for DecodeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeTable")
            .field("tables", &self.tables.len())
            .finish()
    }
}

impl From<&Code> for DecodeTable {
    fn from(code: &Code) -> Self {
        Self::new(code)
    }
}

/// Decodes symbols from a bit region of known length.
///
/// The region ends cleanly only when its last code ends exactly on the bit
/// budget. A failure after some symbols were produced by
/// [`decode_symbols`](Decoder::decode_symbols) or [`Read::read`] is held back
/// and returned by the next call, so no decoded output is lost. A symbol a
/// byte read cannot return stays queued: every later read fails on it again
/// until [`decode_symbol`](Decoder::decode_symbol) takes it.
///
/// # Example
/// ```
/// use huffcode_core::{Code, DecodeTable, Decoder};
///
/// let code = Code::from_lengths(&[1, 2, 2]).unwrap();
/// let table = DecodeTable::new(&code);
/// let encoded = [0b01110u8];
/// let mut decoder = Decoder::new(&table, &encoded[..], 5);
/// let mut symbols = [0; 8];
/// assert_eq!(decoder.decode_symbols(&mut symbols).unwrap(), 3);
/// assert_eq!(symbols[..3], [0, 2, 1]);
/// assert!(decoder.is_finished());
/// ```
pub struct Decoder<'t, R> {
    table: &'t DecodeTable,
    reader: BitReader<R>,
    pending: Option<Error>,
    /// Decoded symbol not yet handed to the caller
    held: Option<Symbol>,
}

impl<'t, R: Read> Decoder<'t, R> {
    /// Create a decoder for `bit_len` bits of encoded data in `source`.
    pub fn new(table: &'t DecodeTable, source: R, bit_len: u64) -> Self {
        Self {
            table,
            reader: BitReader::new(source, bit_len),
            pending: None,
            held: None,
        }
    }

    /// Decode the next symbol, or `None` at the end of the region.
    ///
    /// # Errors
    /// - `BitIoError::UnexpectedEof` if the region ends inside a code
    /// - `DecodeError::InvalidCode` if the bits match no code
    /// - `Error::Io` if the source fails
    pub fn decode_symbol(&mut self) -> Result<Option<Symbol>> {
        if let Some(err) = self.pending.take() {
            return Err(err);
        }
        if let Some(symbol) = self.held.take() {
            return Ok(Some(symbol));
        }
        let start = self.reader.position();
        let mut index = 0;
        loop {
            let Some(peek) = self.reader.peek()? else {
                if index == 0 {
                    return Ok(None);
                }
                return Err(BitIoError::UnexpectedEof.into());
            };
            let short = self.reader.remaining() < u64::from(LOOKUP_BITS);
            match self.table.tables[index][peek.reverse_bits() as usize] {
                Action::Symbol { symbol, len } => {
                    if u64::from(len) > self.reader.remaining() {
                        return Err(BitIoError::UnexpectedEof.into());
                    }
                    self.reader.read_bits(u32::from(len))?;
                    return Ok(Some(symbol));
                }
                Action::Chain(_) | Action::Invalid if short => {
                    return Err(BitIoError::UnexpectedEof.into());
                }
                Action::Chain(next) => {
                    self.reader.read_bits(u32::from(LOOKUP_BITS))?;
                    index = next as usize;
                }
                Action::Invalid => {
                    return Err(DecodeError::InvalidCode { position: start }.into());
                }
            }
        }
    }

    /// Decode symbols into `out` until it is full or the region ends.
    ///
    /// Returns the number of symbols written. Fewer than `out.len()` means
    /// the region ended or a failure is held for the next call.
    pub fn decode_symbols(&mut self, out: &mut [Symbol]) -> Result<usize> {
        self.fill(out, Ok)
    }

    /// Budget bits not yet decoded.
    pub fn remaining_bits(&self) -> u64 {
        self.reader.remaining()
    }

    /// True once the whole region has been decoded.
    pub fn is_finished(&self) -> bool {
        self.pending.is_none() && self.held.is_none() && self.reader.is_empty()
    }

    /// Unwrap the underlying source.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    // Decode into `out`, converting each symbol. A decode failure after the
    // first item is deferred to the next call; a symbol that fails to convert
    // is held, so the next call reports it again.
    fn fill<T>(&mut self, out: &mut [T], convert: impl Fn(Symbol) -> Result<T>) -> Result<usize> {
        for (n, slot) in out.iter_mut().enumerate() {
            let err = match self.decode_symbol() {
                Ok(Some(symbol)) => match convert(symbol) {
                    Ok(item) => {
                        *slot = item;
                        continue;
                    }
                    Err(err) => {
                        self.held = Some(symbol);
                        if n > 0 {
                            return Ok(n);
                        }
                        err
                    }
                },
                Ok(None) => return Ok(n),
                Err(err) => err,
            };
            if n == 0 {
                return Err(err);
            }
            self.pending = Some(err);
            return Ok(n);
        }
        Ok(out.len())
    }
}

/// Byte alphabets only: a decoded symbol above 255 is `InvalidData`.
impl<R: Read> Read for Decoder<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.fill(buf, |symbol| {
            u8::try_from(symbol).map_err(|_| DecodeError::SymbolNotByte { symbol }.into())
        })?;
        Ok(n)
    }
}

impl<R> std::fmt::Debug for Decoder<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("table", self.table)
            .field("pending", &self.pending)
            .field("held", &self.held)
            .finish_non_exhaustive()
    }
}
