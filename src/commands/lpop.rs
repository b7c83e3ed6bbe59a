use crate::{
    commands::{
        command_utils::{check_arity, parse_integer},
        CommandError,
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct LpopArguments {
    key: String,
    count: Option<usize>,
}

impl LpopArguments {
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("LPOP", arguments, 1, Some(2))?;

        let count = arguments
            .get(1)
            .map(|count| parse_integer::<usize>(count))
            .transpose()?;

        Ok(Self {
            key: arguments[0].clone(),
            count,
        })
    }
}

/// Handles the Redis LPOP command.
///
/// Without a count, replies with the head element as a bulk string. With a
/// count, replies with an array of up to that many elements taken from the
/// head. A missing key yields a null bulk string either way. The key is
/// removed once its list is empty.
pub fn lpop(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    let lpop_arguments = LpopArguments::parse(arguments)?;

    let Some(list) = store.get_list(&lpop_arguments.key)? else {
        return Ok(RespValue::NullBulkString);
    };

    let reply = match lpop_arguments.count {
        None => list
            .pop_front()
            .map_or(RespValue::NullBulkString, RespValue::BulkString),
        Some(count) => {
            let count = count.min(list.len());
            RespValue::bulk_string_array(list.drain(..count))
        }
    };

    store.remove_if_empty(&lpop_arguments.key);

    Ok(reply)
}

/// Pops the head of the first non-empty list among `keys`, replying
/// `[key, element]`.
pub fn pop_first_available(
    store: &mut KeyValueStore,
    keys: &[String],
) -> Result<Option<RespValue>, CommandError> {
    for key in keys {
        let Some(element) = store.get_list(key)?.and_then(|list| list.pop_front()) else {
            continue;
        };

        store.remove_if_empty(key);
        return Ok(Some(RespValue::bulk_string_array([key.clone(), element])));
    }

    Ok(None)
}
