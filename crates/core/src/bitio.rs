//! Bit-level I/O over byte sinks and sources.
//!
//! [`BitWriter`] and [`BitReader`] pack and unpack values of up to 32 bits in
//! LSB-first order: within one value bit 0 goes out first, and each value is
//! placed above the bits already buffered. Bytes are therefore filled from
//! their least significant bit upward.
//!
//! # Padding Rules
//! - BitWriter: the final partial byte is padded with zeros in its high bits
//! - BitReader: reads are bounded by an explicit bit budget, so padding bits
//!   (and whatever follows the region in the source) are never consumed
//!
//! # Example
//! ```
//! use huffcode_core::bitio::{BitReader, BitWriter};
//!
//! let mut out = Vec::new();
//! let mut writer = BitWriter::new(&mut out);
//! writer.write_bits(0b101, 3);
//! writer.write_bits(0b11, 2);
//! writer.close().unwrap();
//! assert_eq!(out, vec![0b000_11_101]);
//!
//! let mut reader = BitReader::new(&out[..], 5);
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits(2).unwrap(), 0b11);
//! assert!(reader.read_bits(1).is_err());
//! ```

use std::io::{self, Read, Write};

use crate::error::{BitIoError, Result};

/// Writes bits LSB-first to a byte sink.
///
/// Up to 64 bits are buffered; whenever more than 32 are pending the low four
/// bytes go to the sink in one write. The first sink error is latched: every
/// later write becomes a no-op and the error is reported by [`close`].
///
/// [`close`]: BitWriter::close
///
/// # Invariants
/// - `nbits <= 32` between calls
/// - bits above `nbits` in `bits` are zero
#[derive(Debug)]
pub struct BitWriter<W> {
    inner: W,
    /// Pending bits, oldest in the low positions
    bits: u64,
    /// Number of pending bits
    nbits: u32,
    /// Total bits accepted so far
    written: u64,
    err: Option<io::Error>,
}

impl<W: Write> BitWriter<W> {
    /// Create a new BitWriter around `inner`.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            bits: 0,
            nbits: 0,
            written: 0,
            err: None,
        }
    }

    /// Append the low `count` bits of `value`.
    ///
    /// `count` must be in 1..=32 and `value` must fit in `count` bits. Other
    /// counts are ignored; stray high bits of `value` are dropped.
    pub fn write_bits(&mut self, value: u32, count: u32) {
        debug_assert!((1..=32).contains(&count), "bit count {count} outside 1..=32");
        if self.err.is_some() || count == 0 || count > 32 {
            return;
        }
        let value = u64::from(value) & ((1u64 << count) - 1);
        self.bits |= value << self.nbits;
        self.nbits += count;
        self.written += u64::from(count);
        if self.nbits > 32 {
            let buf = (self.bits as u32).to_le_bytes();
            self.bits >>= 32;
            self.nbits -= 32;
            self.write(&buf);
        }
    }

    /// Flush the pending bits as whole bytes and report the latched error.
    ///
    /// The last byte is zero-padded if the total is not a multiple of 8.
    pub fn close(&mut self) -> Result<()> {
        let nbytes = self.nbits.div_ceil(8) as usize;
        let buf = self.bits.to_le_bytes();
        self.bits = 0;
        self.nbits = 0;
        self.write(&buf[..nbytes]);
        if self.err.is_none() {
            if let Err(err) = self.inner.flush() {
                self.err = Some(err);
            }
        }
        match self.err.take() {
            Some(err) => {
                // keep the writer poisoned for any later call
                self.err = Some(io::Error::from(err.kind()));
                Err(err.into())
            }
            None => Ok(()),
        }
    }

    /// The latched sink error, if any.
    pub fn error(&self) -> Option<&io::Error> {
        self.err.as_ref()
    }

    /// Return the total number of bits written (excluding padding).
    pub fn bit_len(&self) -> u64 {
        self.written
    }

    /// Get a reference to the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the underlying sink. Pending bits are discarded; call
    /// [`close`](BitWriter::close) first.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn write(&mut self, buf: &[u8]) {
        if self.err.is_some() || buf.is_empty() {
            return;
        }
        if let Err(err) = self.inner.write_all(buf) {
            self.err = Some(err);
        }
    }
}

/// Reads bits LSB-first from a byte source, bounded by a bit budget.
///
/// The budget is the exact number of meaningful bits in the region. Reads past
/// it fail with [`BitIoError::UnexpectedEof`] even if the source has more
/// bytes, and no more than `ceil(budget / 8)` bytes are ever pulled from the
/// source. The source is refilled in chunks of up to four bytes.
#[derive(Debug)]
pub struct BitReader<R> {
    inner: R,
    /// Loaded but unconsumed bits, next bit in position 0
    bits: u64,
    /// Number of loaded bits (may include padding past the budget)
    nbits: u32,
    /// Budget bits not yet consumed
    remaining: u64,
    /// Bits consumed so far
    consumed: u64,
    /// Bytes of the region not yet pulled from the source
    unread: u64,
    /// The source reported end of data
    eof: bool,
}

impl<R: Read> BitReader<R> {
    /// Create a reader over `inner` holding exactly `bit_len` meaningful bits.
    pub fn new(inner: R, bit_len: u64) -> Self {
        Self {
            inner,
            bits: 0,
            nbits: 0,
            remaining: bit_len,
            consumed: 0,
            unread: bit_len.div_ceil(8),
            eof: false,
        }
    }

    /// Read `count` bits (1..=8), the first bit read landing in bit 0.
    ///
    /// # Errors
    /// - `BitIoError::UnexpectedEof` if fewer than `count` budget bits remain,
    ///   or the source ends before the budget does
    /// - `Error::Io` if the source fails
    pub fn read_bits(&mut self, count: u32) -> Result<u8> {
        debug_assert!((1..=8).contains(&count), "bit count {count} outside 1..=8");
        if u64::from(count) > self.remaining {
            return Err(BitIoError::UnexpectedEof.into());
        }
        self.fill(count)?;
        let value = (self.bits & ((1u64 << count) - 1)) as u8;
        self.consume(count);
        Ok(value)
    }

    /// Look at the next (up to) 8 bits without consuming them.
    ///
    /// Returns `None` once the budget is exhausted. If fewer than 8 budget bits
    /// remain, the missing high bits of the result are zero.
    pub fn peek(&mut self) -> Result<Option<u8>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let avail = self.remaining.min(8) as u32;
        self.fill(avail)?;
        Ok(Some((self.bits & ((1u64 << avail) - 1)) as u8))
    }

    /// Return the number of budget bits not yet consumed.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Return the number of bits consumed so far.
    pub fn position(&self) -> u64 {
        self.consumed
    }

    /// Check if the whole budget has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// Unwrap the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    // Drop `count` loaded bits; `fill(count)` must have succeeded.
    fn consume(&mut self, count: u32) {
        self.bits >>= count;
        self.nbits -= count;
        self.remaining -= u64::from(count);
        self.consumed += u64::from(count);
    }

    // Make sure at least `need` (<= 8) bits are loaded.
    fn fill(&mut self, need: u32) -> Result<()> {
        while self.nbits < need && self.unread > 0 && !self.eof {
            let want = self.unread.min(4) as usize;
            let mut buf = [0u8; 4];
            let n = loop {
                match self.inner.read(&mut buf[..want]) {
                    Ok(n) => break n,
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => return Err(err.into()),
                }
            };
            if n == 0 {
                self.eof = true;
                break;
            }
            self.bits |= u64::from(u32::from_le_bytes(buf)) << self.nbits;
            self.nbits += 8 * n as u32;
            self.unread -= n as u64;
        }
        if self.nbits < need {
            return Err(BitIoError::UnexpectedEof.into());
        }
        Ok(())
    }
}
