//! Error types for the huffcode engine.
//!
//! All operations return structured errors rather than panicking. Sink and
//! source failures are carried as [`std::io::Error`]; everything else maps to
//! one failure domain below.

use thiserror::Error;

use crate::code::Symbol;

/// Top-level error type for all operations in the crate.
///
/// Each variant corresponds to a specific failure domain:
/// - Bit I/O: reading past the declared bit budget
/// - Code: building a [`Code`](crate::Code) from frequencies or lengths
/// - Format: unmarshalling a serialized code table
/// - Encode: symbols with no code, misconfigured encoders
/// - Decode: bit patterns that resolve to no symbol
/// - I/O: the underlying byte sink or source
#[derive(Debug, Error)]
pub enum Error {
    /// Bit I/O operation failed (e.g., reading past the bit budget)
    #[error("bit I/O error: {0}")]
    BitIo(#[from] BitIoError),

    /// Code construction failed
    #[error("code construction error: {0}")]
    Code(#[from] CodeError),

    /// Serialized code table could not be parsed
    #[error("code table format error: {0}")]
    Format(#[from] FormatError),

    /// Encoding failed
    #[error("encoding error: {0}")]
    Encode(#[from] EncodeError),

    /// Decoding failed
    #[error("decoding error: {0}")]
    Decode(#[from] DecodeError),

    /// Byte sink or source error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bit-level I/O errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BitIoError {
    /// The bit budget (or the source) ran out before the request was satisfied
    #[error("unexpected end of bit stream")]
    UnexpectedEof,
}

/// Errors building a code from frequencies or lengths.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodeError {
    /// The alphabet is larger than the engine supports
    #[error("too many symbols: {count} (max {max})")]
    TooManySymbols { count: usize, max: usize },

    /// A frequency was negative
    #[error("invalid frequency {frequency} for symbol {symbol}")]
    InvalidFrequency { symbol: Symbol, frequency: i64 },

    /// The configured maximum code length is outside 1..=20
    #[error("maximum code length {max_len} outside 1..=20")]
    InvalidMaxLength { max_len: u8 },

    /// The configured maximum code length cannot address every live symbol
    #[error("{symbols} symbols do not fit in codes of at most {max_len} bits")]
    MaxLengthTooSmall { max_len: u8, symbols: usize },

    /// A code length was outside 0..=20
    #[error("code length {len} for symbol {symbol} outside 0..=20")]
    InvalidLength { symbol: Symbol, len: u8 },

    /// The lengths violate the Kraft inequality
    #[error("code lengths are oversubscribed")]
    Oversubscribed,
}

/// Errors parsing a marshalled code table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// No bytes at all
    #[error("empty code table")]
    EmptyInput,

    /// The first byte is not the expected magic/version marker
    #[error("bad magic/version byte {found:#010b}")]
    BadMagic { found: u8 },

    /// The body describes an impossible table
    #[error("malformed code table: {0}")]
    Malformed(String),
}

/// Encoding errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The symbol is outside the code or was absent when the code was built
    #[error("no code for symbol {symbol}")]
    NoCodeForSymbol { symbol: Symbol },

    /// Without a splitter every symbol is a byte, so the code may have at most 256 entries
    #[error("code has {symbols} entries but no splitter is configured (max 256)")]
    AlphabetTooLarge { symbols: usize },
}

/// Decoding errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The bits at this position match no code
    #[error("invalid huffman code at bit position {position}")]
    InvalidCode { position: u64 },

    /// A byte-oriented read produced a symbol that is not a byte
    #[error("symbol {symbol} does not fit in a byte")]
    SymbolNotByte { symbol: Symbol },
}

impl Error {
    /// True if this error means the bit budget or source ended too early.
    pub fn is_unexpected_eof(&self) -> bool {
        match self {
            Error::BitIo(BitIoError::UnexpectedEof) => true,
            Error::Io(err) => err.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;
        match err {
            Error::Io(err) => err,
            Error::BitIo(BitIoError::UnexpectedEof) => {
                std::io::Error::new(ErrorKind::UnexpectedEof, err)
            }
            Error::Encode(_) => std::io::Error::new(ErrorKind::InvalidInput, err),
            _ => std::io::Error::new(ErrorKind::InvalidData, err),
        }
    }
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_eof_detection() {
        assert!(Error::from(BitIoError::UnexpectedEof).is_unexpected_eof());
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short");
        assert!(Error::from(io).is_unexpected_eof());
        assert!(!Error::from(FormatError::EmptyInput).is_unexpected_eof());
    }

    #[test]
    fn test_io_error_kinds() {
        let err: std::io::Error = Error::from(BitIoError::UnexpectedEof).into();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);

        let err: std::io::Error = Error::from(EncodeError::NoCodeForSymbol { symbol: 7 }).into();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);

        let err: std::io::Error = Error::from(DecodeError::InvalidCode { position: 3 }).into();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_display() {
        let err = Error::from(CodeError::TooManySymbols {
            count: 5,
            max: 4,
        });
        assert_eq!(
            err.to_string(),
            "code construction error: too many symbols: 5 (max 4)"
        );
        let err = FormatError::BadMagic { found: 0x40 };
        assert_eq!(err.to_string(), "bad magic/version byte 0b01000000");
    }
}
