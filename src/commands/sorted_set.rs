//! ZADD, ZRANK, ZRANGE, ZCARD, ZSCORE and ZREM.

use crate::{
    commands::{
        command_utils::{check_arity, parse_float, parse_integer},
        CommandError,
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct ZaddArguments {
    key: String,
    members: Vec<(f64, String)>,
}

impl ZaddArguments {
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("ZADD", arguments, 3, None)?;

        let pairs = &arguments[1..];

        if pairs.len() % 2 != 0 {
            return Err(CommandError::SyntaxError);
        }

        let members = pairs
            .chunks_exact(2)
            .map(|pair| -> Result<(f64, String), CommandError> {
                Ok((parse_float(&pair[0])?, pair[1].clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            key: arguments[0].clone(),
            members,
        })
    }
}

/// Handles the Redis ZADD command.
///
/// # Arguments
///
/// * `store` - The key space
/// * `arguments` - The key followed by one or more `score member` pairs
///
/// # Returns
///
/// * `Ok(RespValue::Integer)` - The number of members that were not present
///   before; scores of existing members are updated
/// * `Err(CommandError::NotAFloat)` - If a score is not a number
/// * `Err(CommandError::WrongType)` - If the key holds something other than a sorted set
///
/// # Examples
///
/// ```ignore
/// let result = zadd(&mut store, &["racers".into(), "1.5".into(), "ada".into()]);
/// // Returns: Ok(RespValue::Integer(1))
/// ```
pub fn zadd(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    let zadd_arguments = ZaddArguments::parse(arguments)?;
    let sorted_set = store.get_sorted_set_or_default(&zadd_arguments.key)?;

    let added = zadd_arguments
        .members
        .iter()
        .filter(|(score, member)| sorted_set.insert(member, *score))
        .count();

    Ok(RespValue::Integer(added as i64))
}

/// Handles the Redis ZRANK command.
///
/// # Returns
///
/// * `Ok(RespValue::Integer)` - The zero-based position of the member, ordered by score then member
/// * `Ok(RespValue::NullBulkString)` - If the key or the member is missing
pub fn zrank(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    check_arity("ZRANK", arguments, 2, Some(2))?;

    let rank = store
        .get_sorted_set(&arguments[0])?
        .and_then(|sorted_set| sorted_set.rank(&arguments[1]));

    Ok(rank.map_or(RespValue::NullBulkString, |rank| {
        RespValue::Integer(rank as i64)
    }))
}

/// Handles the Redis ZRANGE command.
///
/// # Arguments
///
/// * `store` - The key space
/// * `arguments` - `[key, start, stop]`, an inclusive range of ranks where
///   negative indexes count from the end
///
/// # Returns
///
/// * `Ok(RespValue::Array)` - The members in that range, lowest score first
/// * `Err(CommandError::NotAnInteger)` - If `start` or `stop` is not an integer
pub fn zrange(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    check_arity("ZRANGE", arguments, 3, Some(3))?;

    let start = parse_integer::<i64>(&arguments[1])?;
    let stop = parse_integer::<i64>(&arguments[2])?;

    let members = store
        .get_sorted_set(&arguments[0])?
        .map(|sorted_set| {
            sorted_set
                .range(start, stop)
                .into_iter()
                .map(|(member, _)| member.to_string())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Ok(RespValue::bulk_string_array(members))
}

/// Handles the Redis ZCARD command: the member count, `0` for a missing key.
pub fn zcard(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    check_arity("ZCARD", arguments, 1, Some(1))?;

    let length = store
        .get_sorted_set(&arguments[0])?
        .map_or(0, |sorted_set| sorted_set.len());

    Ok(RespValue::Integer(length as i64))
}

/// Handles the Redis ZSCORE command.
///
/// # Returns
///
/// * `Ok(RespValue::BulkString)` - The member's score
/// * `Ok(RespValue::NullBulkString)` - If the key or the member is missing
pub fn zscore(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    check_arity("ZSCORE", arguments, 2, Some(2))?;

    let score = store
        .get_sorted_set(&arguments[0])?
        .and_then(|sorted_set| sorted_set.score(&arguments[1]));

    Ok(score.map_or(RespValue::NullBulkString, |score| {
        RespValue::BulkString(score.to_string())
    }))
}

/// Handles the Redis ZREM command.
///
/// # Arguments
///
/// * `store` - The key space
/// * `arguments` - The key followed by one or more members
///
/// # Returns
///
/// * `Ok(RespValue::Integer)` - How many of the members were removed
/// * `Err(CommandError::WrongType)` - If the key holds something other than a sorted set
pub fn zrem(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    check_arity("ZREM", arguments, 2, None)?;

    let Some(sorted_set) = store.get_sorted_set(&arguments[0])? else {
        return Ok(RespValue::Integer(0));
    };

    let removed = arguments[1..]
        .iter()
        .filter(|member| sorted_set.remove(member))
        .count();

    store.remove_if_empty(&arguments[0]);

    Ok(RespValue::Integer(removed as i64))
}
