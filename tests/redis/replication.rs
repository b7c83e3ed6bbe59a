use std::time::Duration;

use redis_lite::{
    commands::{CommandError, CommandResult},
    config::Config,
    replication::EMPTY_RDB,
    resp::RespValue,
};
use tokio::time::{timeout, Instant};

use crate::test_utils::{TestClient, TestEnv, TestUtils};

/// Turns a fresh client into a replica link and drains the resync frames
async fn attach_replica(env: &TestEnv) -> TestClient {
    let mut replica = env.client();

    assert!(matches!(
        env.exec_command(&mut replica, &["PSYNC", "?", "-1"]).await,
        CommandResult::NoResponse
    ));

    let repl_id = env.router.replication().lock().await.repl_id().to_string();
    assert_eq!(
        replica.next_push().await,
        RespValue::SimpleString(format!("FULLRESYNC {} 0", repl_id))
    );

    let snapshot = replica.next_bytes().await;
    assert!(snapshot.starts_with(b"$88\r\n"));
    assert!(snapshot.ends_with(&EMPTY_RDB));

    replica
}

#[tokio::test]
async fn test_replica_handshake_commands() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    env.exec_command_immediate_success_response(
        &mut client,
        &["REPLCONF", "listening-port", "6380"],
        TestUtils::ok(),
    )
    .await;
    env.exec_command_immediate_success_response(
        &mut client,
        &["REPLCONF", "capa", "psync2"],
        TestUtils::ok(),
    )
    .await;

    let mut replica = attach_replica(&env).await;

    // a replica link never gets ordinary replies
    assert!(matches!(
        env.exec_command(&mut replica, &["PING"]).await,
        CommandResult::NoResponse
    ));
    assert!(matches!(
        env.exec_command(&mut replica, &["GET", "grape"]).await,
        CommandResult::NoResponse
    ));
}

#[tokio::test]
async fn test_writes_are_propagated_verbatim() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();
    let mut replica = attach_replica(&env).await;

    env.exec_command(&mut client, &["SET", "grape", "mango"]).await;
    env.exec_command(&mut client, &["GET", "grape"]).await;
    env.exec_command(&mut client, &["RPUSH", "list", "a", "b"]).await;

    let set = TestUtils::encode_command(&["SET", "grape", "mango"]);
    let rpush = TestUtils::encode_command(&["RPUSH", "list", "a", "b"]);

    assert_eq!(replica.next_bytes().await, set);
    assert_eq!(replica.next_bytes().await, rpush);
    assert!(!replica.has_pending_push());

    let offset = (set.len() + rpush.len()) as u64;
    assert_eq!(env.router.replication().lock().await.master_offset(), offset);
}

#[tokio::test]
async fn test_wait_counts_acknowledged_replicas() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();
    let mut first = attach_replica(&env).await;
    let mut second = attach_replica(&env).await;

    // nothing written yet: every replica counts
    env.exec_command_pending_response(&mut client, &["WAIT", "1", "500"], RespValue::Integer(2))
        .await;

    env.exec_command(&mut client, &["SET", "grape", "mango"]).await;
    let offset = env.router.replication().lock().await.master_offset().to_string();
    first.next_bytes().await;
    second.next_bytes().await;

    let waiting = env.spawn_command(env.client(), &["WAIT", "2", "500"]);

    assert_eq!(
        first.next_push().await,
        TestUtils::array(&["REPLCONF", "GETACK", "*"])
    );
    assert!(matches!(
        env.exec_command(&mut first, &["REPLCONF", "ACK", offset.as_str()]).await,
        CommandResult::NoResponse
    ));

    // only one of two acknowledged before the timeout
    let reply = timeout(Duration::from_secs(2), waiting).await.unwrap().unwrap();
    assert_eq!(reply, RespValue::Integer(1));

    env.exec_command(&mut second, &["REPLCONF", "ACK", offset.as_str()]).await;
    env.exec_command_pending_response(&mut client, &["WAIT", "2", "500"], RespValue::Integer(2))
        .await;
}

#[tokio::test]
async fn test_disconnected_replica_is_forgotten() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();
    let replica = attach_replica(&env).await;

    env.router.disconnect(&replica.session).await;

    env.exec_command(&mut client, &["SET", "grape", "mango"]).await;
    env.exec_command_pending_response(&mut client, &["WAIT", "1", "100"], RespValue::Integer(0))
        .await;
    assert_eq!(env.router.replication().lock().await.replica_count(), 0);
}

#[tokio::test]
async fn test_replica_applies_master_stream() {
    let env = TestEnv::new_replica_server();
    let mut client = env.client();

    env.exec_command_immediate_error_response(
        &mut client,
        &["SET", "grape", "mango"],
        CommandError::ReadOnlyReplica,
    )
    .await;
    env.exec_command_immediate_error_response(
        &mut client,
        &["PSYNC", "?", "-1"],
        CommandError::PsyncOnReplica,
    )
    .await;
    env.exec_command_immediate_success_response(&mut client, &["WAIT", "1", "100"], RespValue::Integer(0))
        .await;

    assert_eq!(
        env.router
            .apply_replicated(TestUtils::array(&["SET", "grape", "mango"]))
            .await,
        None
    );
    env.exec_command_immediate_success_response(&mut client, &["GET", "grape"], TestUtils::bulk("mango"))
        .await;

    env.router.replication().lock().await.advance_replica_offset(31);
    assert_eq!(
        env.router
            .apply_replicated(TestUtils::array(&["REPLCONF", "GETACK", "*"]))
            .await,
        Some(TestUtils::array(&["REPLCONF", "ACK", "31"]))
    );
}

#[tokio::test]
async fn test_master_and_replica_over_tcp() {
    let master_directory = tempfile::tempdir().unwrap();
    let replica_directory = tempfile::tempdir().unwrap();

    let (_, master_port) = TestUtils::start_server(Config {
        port: 0,
        dir: master_directory.path().display().to_string(),
        ..Config::default()
    })
    .await;

    let (replica_router, replica_port) = TestUtils::start_server(Config {
        port: 0,
        replicaof: Some(format!("127.0.0.1 {}", master_port)),
        dir: replica_directory.path().display().to_string(),
        ..Config::default()
    })
    .await;

    let mut master = TestUtils::connect(master_port).await;

    // the replica registers once its handshake is done
    timeout(Duration::from_secs(5), async {
        loop {
            let reply = TestUtils::send_command(&mut master, &["WAIT", "1", "0"]).await;

            if reply == RespValue::Integer(1) {
                break;
            }

            TestUtils::sleep_ms(20).await;
        }
    })
    .await
    .expect("replica attached in time");

    assert_eq!(
        TestUtils::send_command(&mut master, &["SET", "grape", "mango"]).await,
        TestUtils::ok()
    );
    assert_eq!(
        TestUtils::send_command(&mut master, &["INCR", "counter"]).await,
        RespValue::Integer(1)
    );
    assert_eq!(
        TestUtils::send_command(&mut master, &["WAIT", "1", "2000"]).await,
        RespValue::Integer(1)
    );

    let mut replica = TestUtils::connect(replica_port).await;

    assert_eq!(
        TestUtils::send_command(&mut replica, &["GET", "grape"]).await,
        TestUtils::bulk("mango")
    );
    assert_eq!(
        TestUtils::send_command(&mut replica, &["SET", "grape", "kiwi"]).await,
        CommandError::ReadOnlyReplica.as_resp()
    );

    let RespValue::BulkString(info) =
        TestUtils::send_command(&mut replica, &["INFO", "replication"]).await
    else {
        panic!("INFO replies with a bulk string");
    };
    assert!(info.contains("role:slave"));

    // both writes and the GETACK were counted on the replica
    let set = TestUtils::encode_command(&["SET", "grape", "mango"]).len();
    let incr = TestUtils::encode_command(&["INCR", "counter"]).len();
    let getack = TestUtils::encode_command(&["REPLCONF", "GETACK", "*"]).len();

    let expected = (set + incr + getack) as u64;

    timeout(Duration::from_secs(2), async {
        while replica_router.replication().lock().await.replica_offset() != expected {
            TestUtils::sleep_ms(10).await;
        }
    })
    .await
    .expect("replica offset counts every byte from the master");
}

#[tokio::test]
async fn test_wait_for_zero_replicas_answers_immediately() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();
    let mut first = attach_replica(&env).await;
    let mut second = attach_replica(&env).await;

    env.exec_command(&mut client, &["SET", "grape", "mango"]).await;
    first.next_bytes().await;
    second.next_bytes().await;

    // neither replica acknowledged the write
    let started = Instant::now();
    env.exec_command_pending_response(&mut client, &["WAIT", "0", "0"], RespValue::Integer(2))
        .await;
    assert!(started.elapsed() < Duration::from_millis(100));
    assert!(!first.has_pending_push(), "no GETACK for a zero quorum");
}

#[tokio::test]
async fn test_wait_with_huge_timeout_still_answers() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();
    let mut replica = attach_replica(&env).await;

    env.exec_command(&mut client, &["SET", "grape", "mango"]).await;
    let offset = env.router.replication().lock().await.master_offset().to_string();
    replica.next_bytes().await;

    let waiting = env.spawn_command(env.client(), &["WAIT", "1", "9223372036854775807"]);

    assert_eq!(
        replica.next_push().await,
        TestUtils::array(&["REPLCONF", "GETACK", "*"])
    );
    env.exec_command(&mut replica, &["REPLCONF", "ACK", offset.as_str()]).await;

    let reply = timeout(Duration::from_secs(2), waiting).await.unwrap().unwrap();
    assert_eq!(reply, RespValue::Integer(1));
}
