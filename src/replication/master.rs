use std::{sync::Arc, time::Duration};

use bytes::{BufMut, Bytes, BytesMut};
use tokio::{
    sync::Mutex,
    time::{self, Instant},
};
use tracing::debug;

use crate::{replication::ReplicationState, resp::RespValue};

pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// `+FULLRESYNC <replid> <offset>` followed by the snapshot framed as
/// `$<len>\r\n<bytes>` (no trailing line terminator).
pub fn full_resync_payload(repl_id: &str, offset: u64, snapshot: &[u8]) -> (RespValue, Bytes) {
    let reply = RespValue::SimpleString(format!("FULLRESYNC {} {}", repl_id, offset));

    let mut frame = BytesMut::with_capacity(snapshot.len() + 16);
    frame.put_slice(format!("${}\r\n", snapshot.len()).as_bytes());
    frame.put_slice(snapshot);

    (reply, frame.freeze())
}

/// Waits until `required` replicas acknowledged the current master offset or
/// `timeout` runs out, and returns how many are synced at that point.
pub async fn wait_for_replicas(
    replication: Arc<Mutex<ReplicationState>>,
    required: usize,
    timeout: Duration,
) -> usize {
    // `None` when the timeout reaches past what the clock can represent
    let deadline = Instant::now().checked_add(timeout);

    {
        let state = replication.lock().await;

        if state.replica_count() == 0 || required == 0 || state.master_offset() == 0 {
            return state.replica_count();
        }

        debug!(
            required,
            master_offset = state.master_offset(),
            "requesting replica acknowledgements"
        );
        state.request_acks();
    }

    loop {
        let synced = replication.lock().await.synced_replica_count();
        let now = Instant::now();

        if synced >= required || deadline.is_some_and(|deadline| now >= deadline) {
            return synced;
        }

        let remaining = deadline.map_or(WAIT_POLL_INTERVAL, |deadline| deadline - now);
        time::sleep(WAIT_POLL_INTERVAL.min(remaining)).await;
    }
}
