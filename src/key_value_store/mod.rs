//! Typed in-memory key space.
//!
//! Every key maps to one [`Value`]; the [`DataType`] it carries decides which
//! commands may touch it. Expired keys are evicted lazily on access.

mod sorted_set;
mod stream;

use std::collections::{HashMap, VecDeque};

use tokio::time::Instant;

use crate::commands::CommandError;

pub use sorted_set::SortedSet;
pub use stream::{Stream, StreamFields, StreamId};

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    String(String),
    List(VecDeque<String>),
    Stream(Stream),
    SortedSet(SortedSet),
}

impl DataType {
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::String(_) => "string",
            DataType::List(_) => "list",
            DataType::Stream(_) => "stream",
            DataType::SortedSet(_) => "zset",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub data: DataType,
    pub expiration: Option<Instant>,
}

impl Value {
    pub fn new(data: DataType) -> Self {
        Self {
            data,
            expiration: None,
        }
    }

    pub fn with_expiration(data: DataType, expiration: Option<Instant>) -> Self {
        Self { data, expiration }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expiration.is_some_and(|expiration| now >= expiration)
    }
}

#[derive(Debug, Default)]
pub struct KeyValueStore {
    entries: HashMap<String, Value>,
}

macro_rules! typed_accessors {
    ($get:ident, $get_or_default:ident, $variant:ident, $inner:ty) => {
        pub fn $get(&mut self, key: &str) -> Result<Option<&mut $inner>, CommandError> {
            match self.get_mut(key) {
                Some(Value {
                    data: DataType::$variant(inner),
                    ..
                }) => Ok(Some(inner)),
                Some(_) => Err(CommandError::WrongType),
                None => Ok(None),
            }
        }

        pub fn $get_or_default(&mut self, key: &str) -> Result<&mut $inner, CommandError> {
            self.evict_if_expired(key);

            let value = self
                .entries
                .entry(key.to_string())
                .or_insert_with(|| Value::new(DataType::$variant(Default::default())));

            match &mut value.data {
                DataType::$variant(inner) => Ok(inner),
                _ => Err(CommandError::WrongType),
            }
        }
    };
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, key: &str) -> Option<&Value> {
        self.evict_if_expired(key);
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.evict_if_expired(key);
        self.entries.get_mut(key)
    }

    pub fn insert(&mut self, key: String, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.evict_if_expired(key);
        self.entries.remove(key).is_some()
    }

    /// Live keys, in no particular order.
    pub fn keys(&mut self) -> Vec<String> {
        let now = Instant::now();
        self.entries.retain(|_, value| !value.is_expired(now));
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_string(&mut self, key: &str) -> Result<Option<&String>, CommandError> {
        match self.get(key) {
            Some(Value {
                data: DataType::String(value),
                ..
            }) => Ok(Some(value)),
            Some(_) => Err(CommandError::WrongType),
            None => Ok(None),
        }
    }

    typed_accessors!(get_list, get_list_or_default, List, VecDeque<String>);
    typed_accessors!(get_stream, get_stream_or_default, Stream, Stream);
    typed_accessors!(get_sorted_set, get_sorted_set_or_default, SortedSet, SortedSet);

    /// Drops `key` if it holds an empty list or sorted set.
    pub fn remove_if_empty(&mut self, key: &str) {
        let is_empty = match self.entries.get(key).map(|value| &value.data) {
            Some(DataType::List(list)) => list.is_empty(),
            Some(DataType::SortedSet(set)) => set.is_empty(),
            _ => false,
        };

        if is_empty {
            self.entries.remove(key);
        }
    }

    fn evict_if_expired(&mut self, key: &str) {
        let now = Instant::now();

        if self
            .entries
            .get(key)
            .is_some_and(|value| value.is_expired(now))
        {
            self.entries.remove(key);
        }
    }
}
