//! An in-memory Redis-compatible server.
//!
//! Clients speak RESP over TCP. Besides strings, lists, streams, sorted sets
//! and geo indexes, the server supports transactions, publish/subscribe,
//! blocking reads and master/replica replication with a write quorum (WAIT).
//! A snapshot file in the binary RDB format seeds the key space at start-up.

pub mod blocking;
pub mod commands;
pub mod config;
pub mod connection;
pub mod geo;
pub mod key_value_store;
pub mod pub_sub;
pub mod rdb;
pub mod replication;
pub mod resp;
pub mod router;
pub mod server;
pub mod session;
