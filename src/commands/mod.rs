mod blpop;
mod command_error;
mod command_handler;
mod command_utils;
mod config_get;
mod del;
mod echo;
mod geo;
mod get;
mod incr;
mod info;
mod keys;
mod llen;
mod lpop;
mod lrange;
mod ping;
pub mod pub_sub;
pub mod replication;
mod rpush_and_lpush;
mod set;
mod sorted_set;
mod stream_utils;
pub mod transactions;
mod type_command;
mod xadd;
mod xrange;
mod xread;

use crate::{key_value_store::KeyValueStore, resp::RespValue};

pub use blpop::BlpopArguments;
pub use command_error::CommandError;
pub use command_handler::{Command, CommandResult, WRITE_COMMANDS};
pub use config_get::config_get;
pub use echo::echo;
pub use info::info;
pub use lpop::pop_first_available;
pub use ping::ping;
pub use xread::{read_streams, resolve_start_ids, XreadArguments};

/// A command that only needs the key space.
pub type StoreHandler = fn(&mut KeyValueStore, &[String]) -> Result<RespValue, CommandError>;

/// Commands the router answers itself because they need the session, the
/// replication state, the configuration or the blocking coordinator.
pub const ROUTED_COMMANDS: [&str; 15] = [
    "PING", "ECHO", "INFO", "CONFIG", "PUBLISH", "REPLCONF", "BLPOP", "XREAD", "SUBSCRIBE",
    "UNSUBSCRIBE", "MULTI", "EXEC", "DISCARD", "PSYNC", "WAIT",
];

pub fn store_handler(name: &str) -> Option<StoreHandler> {
    let handler: StoreHandler = match name {
        "GET" => get::get,
        "SET" => set::set,
        "INCR" => incr::incr,
        "DEL" => del::del,
        "TYPE" => type_command::type_command,
        "KEYS" => keys::keys,
        "RPUSH" => rpush_and_lpush::rpush,
        "LPUSH" => rpush_and_lpush::lpush,
        "LRANGE" => lrange::lrange,
        "LLEN" => llen::llen,
        "LPOP" => lpop::lpop,
        "XADD" => xadd::xadd,
        "XRANGE" => xrange::xrange,
        "ZADD" => sorted_set::zadd,
        "ZRANK" => sorted_set::zrank,
        "ZRANGE" => sorted_set::zrange,
        "ZCARD" => sorted_set::zcard,
        "ZSCORE" => sorted_set::zscore,
        "ZREM" => sorted_set::zrem,
        "GEOADD" => geo::geoadd,
        "GEOPOS" => geo::geopos,
        "GEODIST" => geo::geodist,
        "GEOSEARCH" => geo::geosearch,
        _ => return None,
    };

    Some(handler)
}

pub fn is_known(name: &str) -> bool {
    ROUTED_COMMANDS.contains(&name) || store_handler(name).is_some()
}
