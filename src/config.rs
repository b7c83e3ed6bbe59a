use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::replication::Role;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("--replicaof expects \"<host> <port>\", got \"{0}\"")]
    InvalidReplicaOf(String),
}

/// Command-line flags of the server
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "redis-lite", version, about = "In-memory Redis-compatible server", long_about = None)]
pub struct Config {
    /// Port to listen on
    #[arg(long, default_value_t = 6379)]
    pub port: u16,

    /// Master to replicate from, as "<host> <port>"
    #[arg(long)]
    pub replicaof: Option<String>,

    /// Directory holding the snapshot file
    #[arg(long, default_value = ".")]
    pub dir: String,

    /// Snapshot file name
    #[arg(long, default_value = "dump.rdb")]
    pub dbfilename: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 6379,
            replicaof: None,
            dir: ".".to_string(),
            dbfilename: "dump.rdb".to_string(),
        }
    }
}

impl Config {
    pub fn role(&self) -> Result<Role, ConfigError> {
        let Some(replicaof) = &self.replicaof else {
            return Ok(Role::Master);
        };

        let invalid = || ConfigError::InvalidReplicaOf(replicaof.clone());

        match replicaof.split_whitespace().collect::<Vec<_>>().as_slice() {
            [host, port] => Ok(Role::Replica {
                host: host.to_string(),
                port: port.parse().map_err(|_| invalid())?,
            }),
            _ => Err(invalid()),
        }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        PathBuf::from(&self.dir).join(&self.dbfilename)
    }
}
