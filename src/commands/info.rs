use crate::{
    commands::{command_utils::check_arity, CommandError},
    replication::ReplicationState,
    resp::RespValue,
};

/// Handles the Redis INFO command.
///
/// Only the `replication` section exists. `INFO` without a section returns
/// it as well; any other section is empty.
///
/// # Arguments
///
/// * `replication` - The replication state to report on
/// * `arguments` - An optional section name
///
/// # Returns
///
/// * `Ok(RespValue::BulkString)` - `role`, `master_replid` and `master_repl_offset` lines
pub fn info(replication: &ReplicationState, arguments: &[String]) -> Result<RespValue, CommandError> {
    check_arity("INFO", arguments, 0, Some(1))?;

    let body = match arguments.first().map(|section| section.to_lowercase()) {
        None => replication.info(),
        Some(section) if section == "replication" || section == "all" => replication.info(),
        Some(_) => String::new(),
    };

    Ok(RespValue::BulkString(body))
}
