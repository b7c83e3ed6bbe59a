use std::{collections::BTreeMap, time::Duration};

use jiff::Timestamp;
use tokio::time::Instant;
use tracing::warn;

use crate::{
    key_value_store::{DataType, KeyValueStore, Value},
    rdb::{
        opcode::{parse_magic_string, parse_opcode, OpCodeResponse},
        RdbError,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct RdbEntry {
    pub key: String,
    pub value: String,
    pub expiration: Option<Timestamp>,
}

/// Everything decoded from one snapshot payload.
#[derive(Debug, Default, PartialEq)]
pub struct RdbSnapshot {
    pub version: String,
    pub metadata: BTreeMap<String, String>,
    pub database_number: Option<usize>,
    pub hash_table_size: Option<usize>,
    pub expiry_hash_table_size: Option<usize>,
    pub entries: Vec<RdbEntry>,
    /// Set when decoding stopped early at a value type it cannot skip.
    pub unsupported_value_type: Option<u8>,
}

impl RdbSnapshot {
    pub fn parse(bytes: &[u8]) -> Result<Self, RdbError> {
        let (version, mut cursor) = parse_magic_string(bytes)?;
        let mut snapshot = RdbSnapshot {
            version,
            ..RdbSnapshot::default()
        };

        while cursor < bytes.len() {
            let (response, bytes_read) = match parse_opcode(bytes, cursor) {
                Ok(response) => response,
                Err(RdbError::UnsupportedValueType { offset, value_type }) => {
                    warn!(
                        offset,
                        value_type,
                        loaded = snapshot.entries.len(),
                        "unsupported value type in snapshot, ignoring the rest"
                    );
                    snapshot.unsupported_value_type = Some(value_type);
                    break;
                }
                Err(error) => return Err(error),
            };
            cursor += bytes_read;

            match response {
                OpCodeResponse::Metadata { key, value } => {
                    snapshot.metadata.insert(key, value);
                }
                OpCodeResponse::ResizeDb {
                    db_hash_table_size,
                    expiry_hash_table_size,
                } => {
                    snapshot.hash_table_size = Some(db_hash_table_size);
                    snapshot.expiry_hash_table_size = Some(expiry_hash_table_size);
                }
                OpCodeResponse::Database { database_number } => {
                    snapshot.database_number = Some(database_number);
                }
                OpCodeResponse::KeyValuePair {
                    key,
                    value,
                    expiration,
                } => snapshot.entries.push(RdbEntry {
                    key,
                    value,
                    expiration,
                }),
                OpCodeResponse::EndOfFile => break,
            }
        }

        Ok(snapshot)
    }

    /// Inserts every entry as a string key, converting absolute expirations
    /// into deadlines relative to `now`. Entries already expired are skipped.
    ///
    /// Returns how many keys were written.
    pub fn load_into(&self, store: &mut KeyValueStore, now: Timestamp) -> usize {
        let mut loaded = 0;

        for entry in &self.entries {
            let expiration = match entry.expiration {
                Some(expiration) => {
                    let remaining = expiration.as_millisecond() - now.as_millisecond();

                    if remaining <= 0 {
                        continue;
                    }

                    // too far out for the clock to represent means never
                    Instant::now().checked_add(Duration::from_millis(remaining as u64))
                }
                None => None,
            };

            store.insert(
                entry.key.clone(),
                Value::with_expiration(DataType::String(entry.value.clone()), expiration),
            );
            loaded += 1;
        }

        loaded
    }
}
