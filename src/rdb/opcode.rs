use jiff::Timestamp;

use crate::rdb::{
    encoding::{parse_length_encoded_integer, parse_value},
    get_slice::{get_buffer_array, get_buffer_slice},
    RdbError,
};

const MAGIC_STRING: &[u8; 5] = b"REDIS";
const METADATA_OPCODE: u8 = 0xFA;
const RESIZE_DB_OPCODE: u8 = 0xFB;
const DATABASE_OPCODE: u8 = 0xFE;
const EXPIRATION_SECONDS_OPCODE: u8 = 0xFD;
const EXPIRATION_MILLISECONDS_OPCODE: u8 = 0xFC;
const END_OF_FILE_OPCODE: u8 = 0xFF;
const STRING_VALUE_TYPE: u8 = 0x00;

#[derive(Debug, PartialEq)]
pub enum OpCodeResponse {
    Metadata {
        key: String,
        value: String,
    },
    ResizeDb {
        db_hash_table_size: usize,
        expiry_hash_table_size: usize,
    },
    Database {
        database_number: usize,
    },
    KeyValuePair {
        key: String,
        value: String,
        expiration: Option<Timestamp>,
    },
    EndOfFile,
}

/// Reads `REDIS` followed by the four version digits, returning the version.
pub fn parse_magic_string(bytes: &[u8]) -> Result<(String, usize), RdbError> {
    let magic = get_buffer_slice(bytes, 0, MAGIC_STRING.len()).map_err(|_| RdbError::BadMagic)?;

    if magic != MAGIC_STRING {
        return Err(RdbError::BadMagic);
    }

    let version = get_buffer_slice(bytes, MAGIC_STRING.len(), 4).map_err(|_| RdbError::BadMagic)?;

    if !version.iter().all(u8::is_ascii_digit) {
        return Err(RdbError::BadMagic);
    }

    Ok((
        String::from_utf8_lossy(version).into_owned(),
        MAGIC_STRING.len() + 4,
    ))
}

pub fn parse_opcode(bytes: &[u8], cursor: usize) -> Result<(OpCodeResponse, usize), RdbError> {
    let mut temp_cursor = cursor;
    let [opcode] = get_buffer_array::<1>(bytes, temp_cursor)?;
    temp_cursor += 1;

    let response = match opcode {
        METADATA_OPCODE => {
            let (key, key_cursor) = parse_value(bytes, temp_cursor)?;
            temp_cursor += key_cursor;
            let (value, value_cursor) = parse_value(bytes, temp_cursor)?;
            temp_cursor += value_cursor;

            OpCodeResponse::Metadata { key, value }
        }
        RESIZE_DB_OPCODE => {
            let (db_hash_table_size, db_hash_table_size_cursor) =
                parse_length_encoded_integer(bytes, temp_cursor)?;
            temp_cursor += db_hash_table_size_cursor;

            let (expiry_hash_table_size, expiry_hash_table_size_cursor) =
                parse_length_encoded_integer(bytes, temp_cursor)?;
            temp_cursor += expiry_hash_table_size_cursor;

            OpCodeResponse::ResizeDb {
                db_hash_table_size,
                expiry_hash_table_size,
            }
        }
        DATABASE_OPCODE => {
            let (database_number, database_number_cursor) =
                parse_length_encoded_integer(bytes, temp_cursor)?;
            temp_cursor += database_number_cursor;

            OpCodeResponse::Database { database_number }
        }
        EXPIRATION_SECONDS_OPCODE => {
            let seconds = u32::from_le_bytes(get_buffer_array(bytes, temp_cursor)?);
            let expiration = Timestamp::from_second(seconds as i64)
                .map_err(|_| RdbError::InvalidExpiration { offset: temp_cursor })?;
            temp_cursor += 4;

            let (key, value, pair_cursor) = parse_key_value_pair(bytes, temp_cursor)?;
            temp_cursor += pair_cursor;

            OpCodeResponse::KeyValuePair {
                key,
                value,
                expiration: Some(expiration),
            }
        }
        EXPIRATION_MILLISECONDS_OPCODE => {
            let milliseconds = u64::from_le_bytes(get_buffer_array(bytes, temp_cursor)?);
            let expiration = i64::try_from(milliseconds)
                .ok()
                .and_then(|milliseconds| Timestamp::from_millisecond(milliseconds).ok())
                .ok_or(RdbError::InvalidExpiration { offset: temp_cursor })?;
            temp_cursor += 8;

            let (key, value, pair_cursor) = parse_key_value_pair(bytes, temp_cursor)?;
            temp_cursor += pair_cursor;

            OpCodeResponse::KeyValuePair {
                key,
                value,
                expiration: Some(expiration),
            }
        }
        // The checksum that follows is not verified
        END_OF_FILE_OPCODE => OpCodeResponse::EndOfFile,
        _ => {
            let (key, value, pair_cursor) = parse_key_value_pair(bytes, cursor)?;
            temp_cursor = cursor + pair_cursor;

            OpCodeResponse::KeyValuePair {
                key,
                value,
                expiration: None,
            }
        }
    };

    Ok((response, temp_cursor - cursor))
}

/// A value-type tag followed by the key and its value.
fn parse_key_value_pair(bytes: &[u8], cursor: usize) -> Result<(String, String, usize), RdbError> {
    let mut temp_cursor = cursor;
    let [value_type] = get_buffer_array::<1>(bytes, temp_cursor)?;
    temp_cursor += 1;

    if value_type != STRING_VALUE_TYPE {
        return Err(RdbError::UnsupportedValueType {
            offset: cursor,
            value_type,
        });
    }

    let (key, key_cursor) = parse_value(bytes, temp_cursor)?;
    temp_cursor += key_cursor;
    let (value, value_cursor) = parse_value(bytes, temp_cursor)?;
    temp_cursor += value_cursor;

    Ok((key, value, temp_cursor - cursor))
}
