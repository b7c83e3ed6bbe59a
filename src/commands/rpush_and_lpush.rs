use crate::{
    commands::{command_utils::check_arity, CommandError},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PushSide {
    Left,
    Right,
}

pub struct PushArguments {
    key: String,
    elements: Vec<String>,
}

impl PushArguments {
    pub fn parse(command: &str, arguments: &[String]) -> Result<Self, CommandError> {
        check_arity(command, arguments, 2, None)?;

        Ok(Self {
            key: arguments[0].clone(),
            elements: arguments[1..].to_vec(),
        })
    }
}

/// Handles the Redis RPUSH command.
///
/// Appends the elements to the tail of the list, creating it when missing.
///
/// # Arguments
///
/// * `store` - The key space
/// * `arguments` - The list key followed by one or more elements
///
/// # Returns
///
/// * `Ok(RespValue::Integer)` - The length of the list after the push
/// * `Err(CommandError::WrongType)` - If the key holds something other than a list
///
/// # Examples
///
/// ```ignore
/// let result = rpush(&mut store, &["fruits".into(), "apple".into(), "pear".into()]);
/// // Returns: Ok(RespValue::Integer(2))
/// ```
pub fn rpush(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    push(store, PushArguments::parse("RPUSH", arguments)?, PushSide::Right)
}

/// Handles the Redis LPUSH command.
///
/// Elements are inserted one after the other, so `LPUSH key a b c` leaves
/// `c` at the head. Replies like [`rpush`].
pub fn lpush(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    push(store, PushArguments::parse("LPUSH", arguments)?, PushSide::Left)
}

fn push(
    store: &mut KeyValueStore,
    push_arguments: PushArguments,
    side: PushSide,
) -> Result<RespValue, CommandError> {
    let list = store.get_list_or_default(&push_arguments.key)?;

    for element in push_arguments.elements {
        match side {
            PushSide::Left => list.push_front(element),
            PushSide::Right => list.push_back(element),
        }
    }

    Ok(RespValue::Integer(list.len() as i64))
}
