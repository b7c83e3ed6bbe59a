//! RESP framing.
//!
//! Values are encoded to text with [`RespValue::encode`] and decoded from a
//! byte buffer with [`RespValue::decode`] or [`RespValue::parse`]. Decoding is
//! incremental: a frame that has not fully arrived yet is reported as `None`
//! and left in the buffer so the next read can complete it.
//!
//! Bulk strings are carried as `String`, so a payload that is not valid UTF-8
//! is refused with [`RespError::InvalidUtf8`] and the command never runs.
//! Arrays may nest at most [`MAX_NESTING_DEPTH`] levels deep.

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;

const CRLF: &[u8] = b"\r\n";

/// Largest bulk string accepted from the wire (512 MiB).
pub const MAX_BULK_LENGTH: i64 = 512 * 1024 * 1024;
/// Largest array accepted from the wire.
pub const MAX_ARRAY_LENGTH: i64 = 1024 * 1024;
/// Deepest array nesting accepted from the wire.
pub const MAX_NESTING_DEPTH: usize = 32;

#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    #[error("invalid type marker '{0}'")]
    UnknownTypeMarker(char),
    #[error("invalid length")]
    InvalidLength,
    #[error("invalid integer")]
    InvalidInteger,
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("length {0} exceeds limit")]
    LengthTooLarge(i64),
    #[error("missing line terminator")]
    MissingTerminator,
    #[error("arrays nested too deeply")]
    NestingTooDeep,
}

impl RespError {
    pub fn as_resp(&self) -> RespValue {
        RespValue::Error(format!("ERR Protocol error: {}", self))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(String),
    NullBulkString,
    Array(Vec<RespValue>),
    NullArray,
}

impl RespValue {
    pub fn encode(&self) -> String {
        match self {
            RespValue::SimpleString(s) => format!("+{}\r\n", s),
            RespValue::Error(e) => format!("-{}\r\n", e),
            RespValue::Integer(i) => format!(":{}\r\n", i),
            RespValue::BulkString(s) => format!("${}\r\n{}\r\n", s.len(), s),
            RespValue::NullBulkString => "$-1\r\n".to_string(),
            RespValue::Array(items) => {
                let mut encoded = format!("*{}\r\n", items.len());

                for item in items {
                    encoded.push_str(&item.encode());
                }

                encoded
            }
            RespValue::NullArray => "*-1\r\n".to_string(),
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(self.encode())
    }

    /// Array of bulk strings, the shape every command and most list replies take.
    pub fn bulk_string_array<I, S>(items: I) -> RespValue
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RespValue::Array(
            items
                .into_iter()
                .map(|item| RespValue::BulkString(item.into()))
                .collect(),
        )
    }

    pub fn ok() -> RespValue {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }

    /// Decodes one value from the start of `input`.
    ///
    /// Returns the value together with the number of bytes it occupied, or
    /// `None` when the frame is still incomplete.
    pub fn decode(input: &[u8]) -> Result<Option<(RespValue, usize)>, RespError> {
        decode_at(input, 0, 0)
    }

    /// Takes the next complete frame off the front of `buffer`.
    ///
    /// The value is paired with its exact wire length. A partial frame stays
    /// in the buffer and yields `None`; pipelined frames are returned one per
    /// call.
    pub fn parse(buffer: &mut BytesMut) -> Result<Option<(RespValue, usize)>, RespError> {
        let frame = RespValue::decode(buffer)?;

        if let Some((_, length)) = &frame {
            buffer.advance(*length);
        }

        Ok(frame)
    }
}

/// Decodes the frame starting at `start`; `depth` counts the arrays around it.
fn decode_at(
    input: &[u8],
    start: usize,
    depth: usize,
) -> Result<Option<(RespValue, usize)>, RespError> {
    let Some(&marker) = input.get(start) else {
        return Ok(None);
    };

    if !matches!(marker, b'+' | b'-' | b':' | b'$' | b'*') {
        return Err(RespError::UnknownTypeMarker(marker as char));
    }

    let Some(line_end) = find_crlf(input, start + 1) else {
        return Ok(None);
    };
    let line = &input[start + 1..line_end];
    let next = line_end + CRLF.len();

    match marker {
        b'+' => Ok(Some((RespValue::SimpleString(to_utf8(line)?), next - start))),
        b'-' => Ok(Some((RespValue::Error(to_utf8(line)?), next - start))),
        b':' => Ok(Some((RespValue::Integer(parse_integer(line)?), next - start))),
        b'$' => {
            let length = parse_integer(line)?;

            if length == -1 {
                return Ok(Some((RespValue::NullBulkString, next - start)));
            }
            if length < 0 {
                return Err(RespError::InvalidLength);
            }
            if length > MAX_BULK_LENGTH {
                return Err(RespError::LengthTooLarge(length));
            }

            let end = next + length as usize;

            if input.len() < end + CRLF.len() {
                return Ok(None);
            }
            if &input[end..end + CRLF.len()] != CRLF {
                return Err(RespError::MissingTerminator);
            }

            let content = to_utf8(&input[next..end])?;
            Ok(Some((RespValue::BulkString(content), end + CRLF.len() - start)))
        }
        _ => {
            let length = parse_integer(line)?;

            if length == -1 {
                return Ok(Some((RespValue::NullArray, next - start)));
            }
            if length < 0 {
                return Err(RespError::InvalidLength);
            }
            if length > MAX_ARRAY_LENGTH {
                return Err(RespError::LengthTooLarge(length));
            }
            if depth >= MAX_NESTING_DEPTH {
                return Err(RespError::NestingTooDeep);
            }

            // every element takes at least one buffered byte
            let mut items = Vec::with_capacity((length as usize).min(input.len() - next));
            let mut cursor = next;

            for _ in 0..length {
                match decode_at(input, cursor, depth + 1)? {
                    Some((item, consumed)) => {
                        items.push(item);
                        cursor += consumed;
                    }
                    None => return Ok(None),
                }
            }

            Ok(Some((RespValue::Array(items), cursor - start)))
        }
    }
}

fn find_crlf(input: &[u8], from: usize) -> Option<usize> {
    input
        .get(from..)?
        .windows(CRLF.len())
        .position(|window| window == CRLF)
        .map(|position| from + position)
}

fn to_utf8(bytes: &[u8]) -> Result<String, RespError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| RespError::InvalidUtf8)
}

fn parse_integer(bytes: &[u8]) -> Result<i64, RespError> {
    std::str::from_utf8(bytes)
        .map_err(|_| RespError::InvalidUtf8)?
        .parse::<i64>()
        .map_err(|_| RespError::InvalidInteger)
}
