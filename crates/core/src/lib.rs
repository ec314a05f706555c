//! huffcode-core: canonical, length-limited Huffman coding for large alphabets
//!
//! This library builds prefix codes over alphabets of up to 2^20 symbols and
//! uses them to encode and decode bit streams:
//! - Derives optimal code lengths from symbol frequencies under a length bound
//! - Assigns canonical values, so a code is fully described by its lengths
//! - Serializes code tables in a compact run-length format
//! - Decodes through chained 256-entry lookup tables
//!
//! # Architecture
//!
//! - `bitio`: LSB-first bit reading/writing
//! - `code`: The code table and canonical value assignment
//! - `builder`: Frequency counting and length-limited code construction
//! - `marshal`: Code and length table serialization
//! - `split`: Mapping raw bytes to symbols
//! - `encoder`: Symbol stream to bits
//! - `decoder`: Lookup tables and bits back to symbols
//!
//! # Example
//!
//! ```
//! use std::io::{Read, Write};
//! use huffcode_core::{Code, CodeBuilder, DecodeTable, Decoder, Encoder};
//!
//! let text = b"a man a plan a canal panama";
//! let mut builder = CodeBuilder::new();
//! builder.write_all(text).unwrap();
//! let code = builder.code().unwrap();
//!
//! let mut encoder = Encoder::new(&code, Vec::new()).unwrap();
//! encoder.write_all(text).unwrap();
//! let bits = encoder.close().unwrap();
//! let encoded = encoder.into_inner();
//!
//! // only the lengths travel with the data
//! let code = Code::unmarshal(&code.marshal()).unwrap();
//! let table = DecodeTable::new(&code);
//! let mut decoded = Vec::new();
//! Decoder::new(&table, &encoded[..], bits)
//!     .read_to_end(&mut decoded)
//!     .unwrap();
//! assert_eq!(decoded, text);
//! ```
//!
//! # Design Principles
//!
//! - **No panics**: All errors are structured and recoverable
//! - **Deterministic**: Identical frequencies always give identical codes
//! - **Shareable**: A `Code` and its `DecodeTable` are immutable once built

pub mod bitio;
pub mod builder;
pub mod code;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod marshal;
pub mod split;

// Re-export commonly used types
pub use builder::{CodeBuilder, CodeConfig};
pub use code::{BitCode, Code, Symbol, MAX_CODE_LEN, MAX_SYMBOLS};
pub use decoder::{DecodeTable, Decoder};
pub use encoder::Encoder;
pub use error::{Error, Result};
pub use marshal::{marshal_lengths, unmarshal_lengths};
pub use split::SymbolSplitter;
