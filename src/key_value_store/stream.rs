use std::{
    collections::BTreeMap,
    fmt,
    ops::Bound::{Excluded, Included, Unbounded},
    str::FromStr,
};

use crate::commands::CommandError;

/// `<milliseconds>-<sequence>` identifier of a stream entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StreamId {
    pub milliseconds: u64,
    pub sequence: u64,
}

impl StreamId {
    pub const MIN: StreamId = StreamId::new(0, 0);
    pub const MAX: StreamId = StreamId::new(u64::MAX, u64::MAX);

    pub const fn new(milliseconds: u64, sequence: u64) -> Self {
        Self {
            milliseconds,
            sequence,
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.milliseconds, self.sequence)
    }
}

impl FromStr for StreamId {
    type Err = CommandError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (milliseconds, sequence) = input.split_once('-').ok_or(CommandError::InvalidStreamId)?;

        Ok(StreamId::new(
            milliseconds
                .parse()
                .map_err(|_| CommandError::InvalidStreamId)?,
            sequence.parse().map_err(|_| CommandError::InvalidStreamId)?,
        ))
    }
}

pub type StreamFields = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stream {
    entries: BTreeMap<StreamId, StreamFields>,
}

impl Stream {
    pub fn last_id(&self) -> StreamId {
        self.entries
            .last_key_value()
            .map(|(id, _)| *id)
            .unwrap_or(StreamId::MIN)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves an XADD id argument (`*`, `<ms>-*` or explicit) against the
    /// current top of the stream. `now_ms` is used for `*`.
    pub fn resolve_id(&self, requested: &str, now_ms: u64) -> Result<StreamId, CommandError> {
        let last = self.last_id();

        if requested == "*" {
            return Ok(self.next_in_millisecond(now_ms.max(last.milliseconds)));
        }

        if let Some(milliseconds) = requested.strip_suffix("-*") {
            let milliseconds = milliseconds
                .parse::<u64>()
                .map_err(|_| CommandError::InvalidStreamId)?;
            return Ok(self.next_in_millisecond(milliseconds));
        }

        requested.parse()
    }

    fn next_in_millisecond(&self, milliseconds: u64) -> StreamId {
        let last = self.last_id();

        if !self.is_empty() && last.milliseconds == milliseconds {
            StreamId::new(milliseconds, last.sequence.saturating_add(1))
        } else if milliseconds == 0 {
            StreamId::new(0, 1)
        } else {
            StreamId::new(milliseconds, 0)
        }
    }

    pub fn append(&mut self, id: StreamId, fields: StreamFields) -> Result<StreamId, CommandError> {
        if id == StreamId::MIN {
            return Err(CommandError::StreamIdZero);
        }

        if id <= self.last_id() {
            return Err(CommandError::StreamIdTooSmall);
        }

        self.entries.insert(id, fields);
        Ok(id)
    }

    /// Entries with `start <= id <= end`.
    pub fn range(&self, start: StreamId, end: StreamId) -> Vec<(StreamId, &StreamFields)> {
        if start > end {
            return Vec::new();
        }

        self.entries
            .range((Included(start), Included(end)))
            .map(|(id, fields)| (*id, fields))
            .collect()
    }

    /// Entries strictly newer than `after`.
    pub fn read_after(&self, after: StreamId) -> Vec<(StreamId, &StreamFields)> {
        self.entries
            .range((Excluded(after), Unbounded))
            .map(|(id, fields)| (*id, fields))
            .collect()
    }
}
