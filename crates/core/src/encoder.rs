//! Encoding symbols into a bit stream.
//!
//! Each codeword goes out most significant bit first, so a decoder reading
//! the stream one bit at a time walks the code tree from the root.

use std::io::{self, Write};

use crate::bitio::BitWriter;
use crate::code::{Code, Symbol};
use crate::error::{EncodeError, Result};
use crate::split::SymbolSplitter;

/// Largest code usable without a splitter: one entry per byte value.
const BYTE_ALPHABET: usize = 256;

/// Encodes data with a [`Code`] into a byte sink.
///
/// Sink errors are latched by the underlying [`BitWriter`] and reported by
/// [`close`](Encoder::close). A symbol the code cannot encode fails the call
/// that carries it; symbols before it in the same call are already written.
///
/// # Example
/// ```
/// use huffcode_core::{Code, Encoder};
///
/// let code = Code::from_lengths(&[1, 2, 2]).unwrap();
/// let mut encoder = Encoder::new(&code, Vec::new()).unwrap();
/// encoder.write_symbols(&[0, 2, 1]).unwrap();
/// assert_eq!(encoder.close().unwrap(), 5);
/// assert_eq!(encoder.into_inner(), vec![0b01110]);
/// ```
pub struct Encoder<'a, W: Write> {
    code: &'a Code,
    writer: BitWriter<W>,
    splitter: Option<Box<dyn SymbolSplitter + 'a>>,
}

impl<'a, W: Write> Encoder<'a, W> {
    /// Create an encoder that treats each input byte as a symbol.
    ///
    /// # Errors
    /// - `EncodeError::AlphabetTooLarge` if `code` has more than 256 entries
    pub fn new(code: &'a Code, sink: W) -> Result<Self> {
        if code.len() > BYTE_ALPHABET {
            return Err(EncodeError::AlphabetTooLarge {
                symbols: code.len(),
            }
            .into());
        }
        Ok(Self {
            code,
            writer: BitWriter::new(sink),
            splitter: None,
        })
    }

    /// Create an encoder that maps input bytes to symbols with `splitter`.
    pub fn with_splitter<S>(code: &'a Code, sink: W, splitter: S) -> Self
    where
        S: SymbolSplitter + 'a,
    {
        Self {
            code,
            writer: BitWriter::new(sink),
            splitter: Some(Box::new(splitter)),
        }
    }

    /// Encode `data`, through the splitter if one is configured.
    pub fn encode(&mut self, data: &[u8]) -> Result<()> {
        match self.splitter.as_mut() {
            Some(splitter) => {
                let symbols = splitter.split(data);
                self.write_symbols(&symbols)
            }
            None => self.write_bytes(data),
        }
    }

    /// Encode each byte of `data` as one symbol, bypassing any splitter.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        data.iter()
            .try_for_each(|&b| self.write_symbol(Symbol::from(b)))
    }

    /// Encode one symbol.
    ///
    /// # Errors
    /// - `EncodeError::NoCodeForSymbol` if the symbol is outside the code or
    ///   has no code
    pub fn write_symbol(&mut self, symbol: Symbol) -> Result<()> {
        let code = self
            .code
            .get(symbol)
            .ok_or(EncodeError::NoCodeForSymbol { symbol })?;
        let len = u32::from(code.len());
        self.writer
            .write_bits(code.value().reverse_bits() >> (32 - len), len);
        Ok(())
    }

    /// Encode a sequence of symbols.
    pub fn write_symbols(&mut self, symbols: &[Symbol]) -> Result<()> {
        symbols.iter().try_for_each(|&s| self.write_symbol(s))
    }

    /// Number of payload bits written so far.
    pub fn bit_len(&self) -> u64 {
        self.writer.bit_len()
    }

    /// Flush the final partial byte and report the first sink error.
    ///
    /// Returns the payload length in bits, which is the budget a
    /// [`Decoder`](crate::Decoder) needs.
    pub fn close(&mut self) -> Result<u64> {
        if let Err(err) = self.writer.close() {
            log::warn!(
                "encoder sink failed after {} bits: {}",
                self.writer.bit_len(),
                err
            );
            return Err(err);
        }
        Ok(self.writer.bit_len())
    }

    /// Get a reference to the underlying sink.
    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    /// Unwrap the underlying sink. Call [`close`](Encoder::close) first or
    /// the last partial bytes are lost.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

/// Each call encodes the whole buffer.
impl<W: Write> Write for Encoder<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.encode(buf)?;
        Ok(buf.len())
    }

    /// Only whole 32-bit groups reach the sink before [`Encoder::close`].
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: Write> std::fmt::Debug for Encoder<'_, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("symbols", &self.code.len())
            .field("splitter", &self.splitter.is_some())
            .field("bit_len", &self.writer.bit_len())
            .finish()
    }
}
