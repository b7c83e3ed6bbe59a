use crate::rdb::{
    get_slice::{get_buffer_array, get_buffer_slice},
    RdbError,
};

/// What the leading byte(s) of a length-encoded field announce.
#[derive(Debug, PartialEq)]
pub enum ValueEncoding {
    /// A plain length, or a byte run of that length when read as a string.
    Length(usize),
    Int8,
    Int16,
    Int32,
    LzfCompressedString,
}

pub fn parse_length_encoding(bytes: &[u8], cursor: usize) -> Result<(ValueEncoding, usize), RdbError> {
    let mut temp_cursor = cursor;
    let [byte] = get_buffer_array::<1>(bytes, temp_cursor)?;
    temp_cursor += 1;

    // The two most significant bits select the mode
    let value_encoding = match byte >> 6 {
        0b00 => ValueEncoding::Length((byte & 0b0011_1111) as usize),
        0b01 => {
            let [lower_8_bits] = get_buffer_array::<1>(bytes, temp_cursor)?;
            temp_cursor += 1;

            // 6 high bits from the first byte, 8 low bits from the second
            let high_6_bits = ((byte & 0b0011_1111) as usize) << 8;

            ValueEncoding::Length(high_6_bits | lower_8_bits as usize)
        }
        0b10 => match byte {
            0x80 => {
                let length = u32::from_be_bytes(get_buffer_array(bytes, temp_cursor)?);
                temp_cursor += 4;

                ValueEncoding::Length(length as usize)
            }
            0x81 => {
                let length = u64::from_be_bytes(get_buffer_array(bytes, temp_cursor)?);
                temp_cursor += 8;

                let length = usize::try_from(length).map_err(|_| RdbError::InvalidLength {
                    offset: cursor,
                    byte,
                })?;

                ValueEncoding::Length(length)
            }
            _ => {
                return Err(RdbError::InvalidLength {
                    offset: cursor,
                    byte,
                })
            }
        },
        _ => match byte & 0b0011_1111 {
            0 => ValueEncoding::Int8,
            1 => ValueEncoding::Int16,
            2 => ValueEncoding::Int32,
            3 => ValueEncoding::LzfCompressedString,
            _ => {
                return Err(RdbError::InvalidLength {
                    offset: cursor,
                    byte,
                })
            }
        },
    };

    Ok((value_encoding, temp_cursor - cursor))
}

/// A length field that must be a plain number (database index, resize hints).
pub fn parse_length_encoded_integer(bytes: &[u8], cursor: usize) -> Result<(usize, usize), RdbError> {
    match parse_length_encoding(bytes, cursor)? {
        (ValueEncoding::Length(value), bytes_read) => Ok((value, bytes_read)),
        (encoding, _) => Err(RdbError::UnsupportedEncoding {
            offset: cursor,
            encoding: format!("{:?} where a length was expected", encoding),
        }),
    }
}

/// A string field. Integers stored in place of a string come back as their
/// decimal text.
pub fn parse_value(bytes: &[u8], cursor: usize) -> Result<(String, usize), RdbError> {
    let mut temp_cursor = cursor;
    let (value_encoding, length_cursor) = parse_length_encoding(bytes, temp_cursor)?;
    temp_cursor += length_cursor;

    let value = match value_encoding {
        ValueEncoding::Length(length) => {
            let byte_slice = get_buffer_slice(bytes, temp_cursor, length)?;

            let value = String::from_utf8(byte_slice.to_vec())
                .map_err(|_| RdbError::InvalidUtf8 { offset: temp_cursor })?;
            temp_cursor += length;

            value
        }
        ValueEncoding::Int8 => {
            let value = i8::from_le_bytes(get_buffer_array(bytes, temp_cursor)?);
            temp_cursor += 1;

            value.to_string()
        }
        ValueEncoding::Int16 => {
            let value = i16::from_le_bytes(get_buffer_array(bytes, temp_cursor)?);
            temp_cursor += 2;

            value.to_string()
        }
        ValueEncoding::Int32 => {
            let value = i32::from_le_bytes(get_buffer_array(bytes, temp_cursor)?);
            temp_cursor += 4;

            value.to_string()
        }
        ValueEncoding::LzfCompressedString => {
            return Err(RdbError::UnsupportedEncoding {
                offset: cursor,
                encoding: "LZF compressed string".to_string(),
            })
        }
    };

    Ok((value, temp_cursor - cursor))
}
