use std::time::Duration;

use redis_lite::{commands::CommandError, resp::RespValue};
use tokio::time::{timeout, Instant};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_push_range_and_pop() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    env.exec_command_immediate_success_response(
        &mut client,
        &["RPUSH", "grape", "mango", "raspberry"],
        RespValue::Integer(2),
    )
    .await;
    env.exec_command_immediate_success_response(&mut client, &["LPUSH", "grape", "apple"], RespValue::Integer(3))
        .await;
    env.exec_command_immediate_success_response(
        &mut client,
        &["LRANGE", "grape", "0", "-1"],
        TestUtils::array(&["apple", "mango", "raspberry"]),
    )
    .await;
    env.exec_command_immediate_success_response(&mut client, &["LLEN", "grape"], RespValue::Integer(3))
        .await;
    env.exec_command_immediate_success_response(&mut client, &["LPOP", "grape"], TestUtils::bulk("apple"))
        .await;
    env.exec_command_immediate_success_response(
        &mut client,
        &["LPOP", "grape", "5"],
        TestUtils::array(&["mango", "raspberry"]),
    )
    .await;
    env.exec_command_immediate_success_response(&mut client, &["LLEN", "grape"], RespValue::Integer(0))
        .await;
}

#[tokio::test]
async fn test_blpop_direct_response() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    env.exec_command_immediate_success_response(
        &mut client,
        &["RPUSH", "grape", "mango", "raspberry"],
        RespValue::Integer(2),
    )
    .await;
    env.exec_command_immediate_success_response(
        &mut client,
        &["BLPOP", "pear", "grape", "0"],
        TestUtils::array(&["grape", "mango"]),
    )
    .await;
}

#[tokio::test]
async fn test_blpop_blocks_until_push() {
    let env = TestEnv::new_master_server();
    let mut pusher = env.client();

    let blocked = env.spawn_command(env.client(), &["BLPOP", "queue", "0"]);
    env.wait_for_blocked_clients("queue", 1).await;

    env.exec_command_immediate_success_response(&mut pusher, &["LPUSH", "queue", "item"], RespValue::Integer(1))
        .await;

    let reply = timeout(Duration::from_secs(2), blocked).await.unwrap().unwrap();
    assert_eq!(reply, TestUtils::array(&["queue", "item"]));

    env.exec_command_immediate_success_response(&mut pusher, &["LLEN", "queue"], RespValue::Integer(0))
        .await;
}

#[tokio::test]
async fn test_blpop_serves_clients_in_arrival_order() {
    let env = TestEnv::new_master_server();
    let mut pusher = env.client();
    let mut tasks = Vec::new();

    for count in 1..=3 {
        tasks.push(env.spawn_command(env.client(), &["BLPOP", "queue", "2"]));
        env.wait_for_blocked_clients("queue", count).await;
    }

    // a newcomer does not jump the queue even though an element is there
    env.exec_command_immediate_success_response(
        &mut pusher,
        &["RPUSH", "queue", "first", "second"],
        RespValue::Integer(2),
    )
    .await;

    let first = timeout(Duration::from_secs(2), tasks.remove(0)).await.unwrap().unwrap();
    let second = timeout(Duration::from_secs(2), tasks.remove(0)).await.unwrap().unwrap();

    assert_eq!(first, TestUtils::array(&["queue", "first"]));
    assert_eq!(second, TestUtils::array(&["queue", "second"]));

    let third = timeout(Duration::from_secs(3), tasks.remove(0)).await.unwrap().unwrap();
    assert_eq!(third, RespValue::NullArray);
}

#[tokio::test]
async fn test_blpop_times_out() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    let started = Instant::now();
    let reply = env.exec_command_reply(&mut client, &["BLPOP", "queue", "0.2"]).await;

    assert_eq!(reply, RespValue::NullArray);
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(env.router.blocking().queued_clients("queue").await.is_empty());
}

#[tokio::test]
async fn test_disconnect_releases_blocked_client() {
    let env = TestEnv::new_master_server();
    let mut blocked = env.client();
    let mut pusher = env.client();

    let _pending = env.exec_command(&mut blocked, &["BLPOP", "queue", "0"]).await;
    env.wait_for_blocked_clients("queue", 1).await;

    env.router.disconnect(&blocked.session).await;
    assert!(env.router.blocking().queued_clients("queue").await.is_empty());

    // nothing is consumed on behalf of the gone client
    env.exec_command_immediate_success_response(&mut pusher, &["RPUSH", "queue", "item"], RespValue::Integer(1))
        .await;
    TestUtils::sleep_ms(150).await;
    env.exec_command_immediate_success_response(&mut pusher, &["LLEN", "queue"], RespValue::Integer(1))
        .await;
}

#[tokio::test]
async fn test_abandoned_blpop_does_not_consume_pushed_element() {
    let env = TestEnv::new_master_server();
    let mut blocked = env.client();
    let mut pusher = env.client();

    let pending = env.exec_command(&mut blocked, &["BLPOP", "queue", "0"]).await;
    env.wait_for_blocked_clients("queue", 1).await;

    // the connection stopped listening before its disconnect was processed
    drop(pending);

    env.exec_command_immediate_success_response(&mut pusher, &["RPUSH", "queue", "item"], RespValue::Integer(1))
        .await;
    TestUtils::sleep_ms(150).await;
    env.exec_command_immediate_success_response(&mut pusher, &["LLEN", "queue"], RespValue::Integer(1))
        .await;
    assert!(env.router.blocking().queued_clients("queue").await.is_empty());
}

#[tokio::test]
async fn test_blpop_rejects_out_of_range_timeout() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    env.exec_command_immediate_error_response(&mut client, &["BLPOP", "queue", "1e300"], CommandError::InvalidTimeout)
        .await;
    assert!(env.router.blocking().queued_clients("queue").await.is_empty());
}
