use crate::{
    commands::{command_utils::check_arity, CommandError},
    config::Config,
    resp::RespValue,
};

/// Handles the Redis CONFIG GET command.
///
/// # Arguments
///
/// * `config` - The flags the server was started with
/// * `arguments` - `GET` followed by one or more of `dir` and `dbfilename`
///
/// # Returns
///
/// * `Ok(RespValue::Array)` - A flat `[name, value, ...]` array
/// * `Err(CommandError::UnsupportedConfigParameter)` - For any other parameter
/// * `Err(CommandError::SyntaxError)` - If the subcommand is not `GET`
///
/// # Examples
///
/// ```ignore
/// let result = config_get(&config, &["GET".into(), "dir".into()]);
/// // Returns: Ok(RespValue::Array(["dir", "/tmp/redis-files"]))
/// ```
pub fn config_get(config: &Config, arguments: &[String]) -> Result<RespValue, CommandError> {
    check_arity("CONFIG", arguments, 2, None)?;

    if !arguments[0].eq_ignore_ascii_case("GET") {
        return Err(CommandError::SyntaxError);
    }

    let mut pairs = Vec::new();

    for parameter in &arguments[1..] {
        let value = match parameter.to_lowercase().as_str() {
            "dir" => config.dir.clone(),
            "dbfilename" => config.dbfilename.clone(),
            _ => return Err(CommandError::UnsupportedConfigParameter(parameter.clone())),
        };

        pairs.push(parameter.to_lowercase());
        pairs.push(value);
    }

    Ok(RespValue::bulk_string_array(pairs))
}
