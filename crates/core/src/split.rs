//! Symbol splitting: turning raw bytes into symbols.
//!
//! Without a splitter every byte is its own symbol. A [`SymbolSplitter`]
//! lets callers map bytes onto a larger alphabet (code points, dictionary
//! indices, ...). The policy belongs to the caller; the engine only needs
//! it to be deterministic and to consume all of its input on every call.
//!
//! Any `FnMut(&[u8]) -> Vec<Symbol>` closure is a splitter:
//!
//! ```
//! use huffcode_core::{CodeBuilder, Symbol};
//!
//! // little-endian 16-bit symbols
//! let pairs = |data: &[u8]| -> Vec<Symbol> {
//!     data.chunks(2)
//!         .map(|c| Symbol::from(c[0]) | Symbol::from(*c.get(1).unwrap_or(&0)) << 8)
//!         .collect()
//! };
//! let mut builder = CodeBuilder::with_splitter(pairs);
//! builder.feed(&[0x00, 0x01, 0x00, 0x01, 0x02, 0x00]);
//! assert_eq!(builder.frequencies()[0x100], 2);
//! ```

use crate::code::Symbol;

/// Splits a byte buffer into symbols.
pub trait SymbolSplitter {
    /// Convert all of `data` into symbols.
    fn split(&mut self, data: &[u8]) -> Vec<Symbol>;
}

impl<F> SymbolSplitter for F
where
    F: FnMut(&[u8]) -> Vec<Symbol>,
{
    fn split(&mut self, data: &[u8]) -> Vec<Symbol> {
        self(data)
    }
}
