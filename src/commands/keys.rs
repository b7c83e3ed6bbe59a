use globset::Glob;

use crate::{
    commands::{command_utils::check_arity, CommandError},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct KeysArguments {
    pattern: String,
}

impl KeysArguments {
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("KEYS", arguments, 1, Some(1))?;

        Ok(Self {
            pattern: arguments[0].clone(),
        })
    }
}

/// Handles the Redis KEYS command.
///
/// # Arguments
///
/// * `store` - The key space
/// * `arguments` - Exactly one glob pattern, such as `*` or `user:?`
///
/// # Returns
///
/// * `Ok(RespValue::Array)` - Live keys matching the pattern, sorted
/// * `Err(CommandError::InvalidPattern)` - If the pattern is not a valid glob
///
/// # Examples
///
/// ```ignore
/// let result = keys(&mut store, &["gr*".into()]);
/// // Returns: Ok(RespValue::Array(["grape", "grapefruit"]))
/// ```
pub fn keys(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    let keys_arguments = KeysArguments::parse(arguments)?;

    let matcher = Glob::new(&keys_arguments.pattern)
        .map_err(|error| CommandError::InvalidPattern(error.to_string()))?
        .compile_matcher();

    let mut matching = store
        .keys()
        .into_iter()
        .filter(|key| matcher.is_match(key))
        .collect::<Vec<_>>();
    matching.sort();

    Ok(RespValue::bulk_string_array(matching))
}
