//! One task per client connection.
//!
//! The reader side decodes frames and runs them through the router one at a
//! time. Every byte going out (direct replies, pub/sub pushes, propagated
//! writes for replica links) is queued on the session's outbox and written by
//! a separate writer task, so no lock is ever held across a socket write.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::mpsc::{self, UnboundedReceiver},
};
use tracing::{debug, info, warn};

use crate::{
    blocking::PendingReply,
    commands::{Command, CommandResult},
    resp::RespValue,
    router::Router,
    session::{ClientId, Session},
};

pub async fn handle_connection<S>(stream: S, router: Arc<Router>, peer: String)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut reader, writer) = tokio::io::split(stream);
    let (outbox, inbox) = mpsc::unbounded_channel();
    let mut session = router.new_session(outbox);
    let client = session.id();

    info!(%client, %peer, "connection accepted");

    let writer_task = tokio::spawn(write_outbox(writer, inbox, client));
    let mut buffer = BytesMut::with_capacity(4096);

    'connection: loop {
        loop {
            let value = match RespValue::parse(&mut buffer) {
                Ok(Some((value, _))) => value,
                Ok(None) => break,
                Err(error) => {
                    warn!(%client, %error, "protocol error, discarding buffered input");
                    session.send(&error.as_resp());
                    buffer.clear();
                    break;
                }
            };

            let result = match Command::new(value) {
                Ok(command) => router.execute(&mut session, command).await,
                Err(error) => CommandResult::Response(error.as_resp()),
            };

            if !deliver(&router, &session, result, &mut reader, &mut buffer).await {
                break 'connection;
            }
        }

        match reader.read_buf(&mut buffer).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(error) => {
                debug!(%client, %error, "read failed");
                break;
            }
        }
    }

    router.disconnect(&session).await;
    drop(session);

    if writer_task.await.is_err() {
        warn!(%client, "writer task panicked");
    }

    info!(%client, "connection closed");
}

/// Queues the outcome of a command. Returns `false` once the connection is
/// gone.
async fn deliver<R>(
    router: &Router,
    session: &Session,
    result: CommandResult,
    reader: &mut R,
    buffer: &mut BytesMut,
) -> bool
where
    R: AsyncRead + Unpin,
{
    match result {
        CommandResult::NoResponse => true,
        CommandResult::Response(reply) => session.send(&reply),
        CommandResult::Responses(replies) => replies.iter().all(|reply| session.send(reply)),
        CommandResult::Pending(mut pending) => {
            match wait_for_reply(&mut pending, reader, buffer).await {
                Some(Some(reply)) => session.send(&reply),
                Some(None) => true,
                None => {
                    // deregister while the reply can still be received, so
                    // nothing is consumed on behalf of a closed connection
                    router.cancel_blocked(session).await;
                    false
                }
            }
        }
    }
}

/// Waits for a suspended reply while still watching the socket, so a client
/// that hangs up while blocked is noticed. Bytes that arrive in the meantime
/// stay buffered until the reply is out.
///
/// Returns `None` when the connection closed first.
async fn wait_for_reply<R>(
    pending: &mut PendingReply,
    reader: &mut R,
    buffer: &mut BytesMut,
) -> Option<Option<RespValue>>
where
    R: AsyncRead + Unpin,
{
    loop {
        tokio::select! {
            reply = pending.recv() => return Some(reply),
            read = reader.read_buf(buffer) => match read {
                Ok(0) | Err(_) => return None,
                Ok(_) => continue,
            },
        }
    }
}

async fn write_outbox<W>(mut writer: W, mut inbox: UnboundedReceiver<Bytes>, client: ClientId)
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = inbox.recv().await {
        if let Err(error) = writer.write_all(&frame).await {
            warn!(%client, %error, "write failed");
            return;
        }
    }

    let _ = writer.shutdown().await;
}
