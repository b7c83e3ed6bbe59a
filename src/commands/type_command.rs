use crate::{
    commands::{command_utils::check_arity, CommandError},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct TypeArguments {
    key: String,
}

impl TypeArguments {
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("TYPE", arguments, 1, Some(1))?;

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

/// Handles the Redis TYPE command.
///
/// # Arguments
///
/// * `store` - The key space
/// * `arguments` - Exactly one string, the key to inspect
///
/// # Returns
///
/// * `Ok(RespValue::SimpleString)` - One of `string`, `list`, `stream`, `zset` or `none`
/// * `Err(CommandError::WrongNumberOfArguments)` - If there is not exactly one argument
pub fn type_command(
    store: &mut KeyValueStore,
    arguments: &[String],
) -> Result<RespValue, CommandError> {
    let type_arguments = TypeArguments::parse(arguments)?;

    let type_name = store
        .get(&type_arguments.key)
        .map_or("none", |value| value.data.type_name());

    Ok(RespValue::SimpleString(type_name.to_string()))
}
