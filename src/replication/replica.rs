//! Replica side of the link: handshake, then apply the master's stream.

use std::sync::Arc;

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
};
use tracing::{debug, info, warn};

use crate::{
    replication::is_valid_repl_id,
    resp::{RespError, RespValue},
    router::Router,
};

#[derive(Error, Debug)]
pub enum ReplicationError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("connection closed by master")]
    ConnectionClosed,
    #[error("unexpected reply from master: {0}")]
    UnexpectedReply(String),
    #[error("protocol error: {0}")]
    Protocol(#[from] RespError),
}

/// What the master announced when accepting the full resynchronization.
#[derive(Debug, Clone, PartialEq)]
pub struct FullResync {
    pub repl_id: String,
    pub offset: u64,
    pub snapshot: Bytes,
}

/// Connects to the master, completes the handshake, loads the snapshot and
/// then applies the propagated command stream until the link drops.
pub async fn connect_to_master(
    router: Arc<Router>,
    host: &str,
    port: u16,
    listening_port: u16,
) -> Result<(), ReplicationError> {
    let mut stream = TcpStream::connect((host, port)).await?;
    let mut buffer = BytesMut::with_capacity(4096);

    info!(host, port, "connected to master");

    let resync = handshake(&mut stream, &mut buffer, listening_port).await?;
    info!(
        repl_id = %resync.repl_id,
        offset = resync.offset,
        snapshot_bytes = resync.snapshot.len(),
        "full resynchronization accepted"
    );

    router.replication().lock().await.set_repl_id(&resync.repl_id);

    if let Err(error) = router.load_snapshot(&resync.snapshot).await {
        warn!(%error, "could not decode snapshot received from master");
    }

    follow_master(&router, stream, buffer).await
}

/// PING, REPLCONF listening-port, REPLCONF capa, PSYNC ? -1; each step waits
/// for the previous reply.
pub async fn handshake<S>(
    stream: &mut S,
    buffer: &mut BytesMut,
    listening_port: u16,
) -> Result<FullResync, ReplicationError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let steps = [
        (vec!["PING".to_string()], "PONG"),
        (
            vec![
                "REPLCONF".to_string(),
                "listening-port".to_string(),
                listening_port.to_string(),
            ],
            "OK",
        ),
        (
            vec![
                "REPLCONF".to_string(),
                "capa".to_string(),
                "psync2".to_string(),
            ],
            "OK",
        ),
    ];

    for (command, expected) in steps {
        let reply = send_and_read_reply(stream, buffer, command).await?;

        if reply != RespValue::SimpleString(expected.to_string()) {
            return Err(ReplicationError::UnexpectedReply(reply.encode()));
        }

        debug!(expected, "handshake step acknowledged");
    }

    let reply = send_and_read_reply(
        stream,
        buffer,
        vec!["PSYNC".to_string(), "?".to_string(), "-1".to_string()],
    )
    .await?;

    let (repl_id, offset) = parse_full_resync(&reply)?;
    let snapshot = read_snapshot(stream, buffer).await?;

    Ok(FullResync {
        repl_id,
        offset,
        snapshot,
    })
}

/// Applies every command the master sends, counting its exact byte length
/// into the replica offset. `REPLCONF GETACK` is answered with the offset
/// as it stood before the GETACK itself.
pub async fn follow_master<S>(
    router: &Router,
    mut stream: S,
    mut buffer: BytesMut,
) -> Result<(), ReplicationError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        match RespValue::parse(&mut buffer) {
            Ok(Some((value, length))) => {
                if let Some(reply) = router.apply_replicated(value).await {
                    stream.write_all(reply.encode().as_bytes()).await?;
                    stream.flush().await?;
                }

                router
                    .replication()
                    .lock()
                    .await
                    .advance_replica_offset(length);
                continue;
            }
            Ok(None) => {}
            Err(error) => {
                debug!(%error, discarded = buffer.len(), "discarding undecodable bytes from master");
                buffer.clear();
            }
        }

        match read_more(&mut stream, &mut buffer).await {
            Ok(()) => {}
            Err(ReplicationError::ConnectionClosed) => return Ok(()),
            Err(error) => return Err(error),
        }
    }
}

async fn send_and_read_reply<S>(
    stream: &mut S,
    buffer: &mut BytesMut,
    command: Vec<String>,
) -> Result<RespValue, ReplicationError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream
        .write_all(RespValue::bulk_string_array(command).encode().as_bytes())
        .await?;
    stream.flush().await?;

    loop {
        if let Some((reply, _)) = RespValue::parse(buffer)? {
            return Ok(reply);
        }

        read_more(stream, buffer).await?;
    }
}

fn parse_full_resync(reply: &RespValue) -> Result<(String, u64), ReplicationError> {
    let unexpected = || ReplicationError::UnexpectedReply(reply.encode());

    let RespValue::SimpleString(line) = reply else {
        return Err(unexpected());
    };

    let parts = line.split_whitespace().collect::<Vec<_>>();

    match parts.as_slice() {
        ["FULLRESYNC", repl_id, offset] if is_valid_repl_id(repl_id) => {
            let offset = offset.parse::<u64>().map_err(|_| unexpected())?;
            Ok((repl_id.to_string(), offset))
        }
        _ => Err(unexpected()),
    }
}

/// Reads `$<len>\r\n` and exactly `len` raw bytes, with no trailing CRLF.
async fn read_snapshot<S>(stream: &mut S, buffer: &mut BytesMut) -> Result<Bytes, ReplicationError>
where
    S: AsyncRead + Unpin,
{
    let (header_length, snapshot_length) = loop {
        if let Some(position) = buffer.windows(2).position(|window| window == b"\r\n") {
            let header = std::str::from_utf8(&buffer[..position])
                .map_err(|_| ReplicationError::UnexpectedReply("invalid snapshot header".into()))?;

            let length = header
                .strip_prefix('$')
                .and_then(|length| length.parse::<usize>().ok())
                .ok_or_else(|| ReplicationError::UnexpectedReply(header.to_string()))?;

            break (position + 2, length);
        }

        read_more(stream, buffer).await?;
    };

    while buffer.len() < header_length + snapshot_length {
        read_more(stream, buffer).await?;
    }

    buffer.advance(header_length);
    Ok(buffer.split_to(snapshot_length).freeze())
}

async fn read_more<S>(stream: &mut S, buffer: &mut BytesMut) -> Result<(), ReplicationError>
where
    S: AsyncRead + Unpin,
{
    if stream.read_buf(buffer).await? == 0 {
        return Err(ReplicationError::ConnectionClosed);
    }

    Ok(())
}
