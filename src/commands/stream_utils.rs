use crate::{
    commands::CommandError,
    key_value_store::{StreamFields, StreamId},
    resp::RespValue,
};

/// Parses an XRANGE/XREAD bound. `-` and `+` are the extremes; an id without
/// a sequence part takes `default_sequence`.
pub fn parse_range_id(input: &str, default_sequence: u64) -> Result<StreamId, CommandError> {
    match input {
        "-" => Ok(StreamId::MIN),
        "+" => Ok(StreamId::MAX),
        _ if input.contains('-') => input.parse(),
        _ => input
            .parse::<u64>()
            .map(|milliseconds| StreamId::new(milliseconds, default_sequence))
            .map_err(|_| CommandError::InvalidStreamId),
    }
}

/// `[[id, [field, value, ...]], ...]`
pub fn entries_to_resp(entries: Vec<(StreamId, &StreamFields)>) -> RespValue {
    RespValue::Array(
        entries
            .into_iter()
            .map(|(id, fields)| {
                RespValue::Array(vec![
                    RespValue::BulkString(id.to_string()),
                    RespValue::bulk_string_array(
                        fields
                            .iter()
                            .flat_map(|(field, value)| [field.clone(), value.clone()]),
                    ),
                ])
            })
            .collect(),
    )
}
