//! Decoder for the binary snapshot format loaded at start-up and received
//! from a master during full resynchronization.
//!
//! Only plain string values are understood. Parsing walks a cursor over the
//! whole payload; every helper returns what it decoded together with the
//! number of bytes it consumed.

mod encoding;
mod get_slice;
mod opcode;
mod rdb_file_operations;
mod rdb_parser;

use thiserror::Error;

pub use rdb_file_operations::read_rdb_file;
pub use rdb_parser::{RdbEntry, RdbSnapshot};

#[derive(Error, Debug, PartialEq)]
pub enum RdbError {
    #[error("missing REDIS magic string and version")]
    BadMagic,
    #[error("snapshot truncated at byte {offset}")]
    Truncated { offset: usize },
    #[error("invalid length encoding 0x{byte:02X} at byte {offset}")]
    InvalidLength { offset: usize, byte: u8 },
    #[error("unsupported encoding at byte {offset}: {encoding}")]
    UnsupportedEncoding { offset: usize, encoding: String },
    #[error("unsupported value type 0x{value_type:02X} at byte {offset}")]
    UnsupportedValueType { offset: usize, value_type: u8 },
    #[error("invalid UTF-8 string at byte {offset}")]
    InvalidUtf8 { offset: usize },
    #[error("expiration out of range at byte {offset}")]
    InvalidExpiration { offset: usize },
}
