use std::time::Duration;

use redis_lite::{commands::CommandError, resp::RespValue};
use tokio::time::timeout;

use crate::test_utils::{TestEnv, TestUtils};

fn entry(id: &str, fields: &[&str]) -> RespValue {
    RespValue::Array(vec![TestUtils::bulk(id), TestUtils::array(fields)])
}

fn stream_reply(key: &str, entries: Vec<RespValue>) -> RespValue {
    RespValue::Array(vec![RespValue::Array(vec![
        TestUtils::bulk(key),
        RespValue::Array(entries),
    ])])
}

#[tokio::test]
async fn test_xadd_and_xrange() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    env.exec_command_immediate_success_response(
        &mut client,
        &["XADD", "weather", "1-1", "temperature", "21"],
        TestUtils::bulk("1-1"),
    )
    .await;
    env.exec_command_immediate_success_response(
        &mut client,
        &["XADD", "weather", "1-*", "temperature", "22"],
        TestUtils::bulk("1-2"),
    )
    .await;
    env.exec_command_immediate_error_response(
        &mut client,
        &["XADD", "weather", "1-2", "temperature", "23"],
        CommandError::StreamIdTooSmall,
    )
    .await;
    env.exec_command_immediate_success_response(
        &mut client,
        &["XRANGE", "weather", "-", "+"],
        RespValue::Array(vec![
            entry("1-1", &["temperature", "21"]),
            entry("1-2", &["temperature", "22"]),
        ]),
    )
    .await;
    env.exec_command_immediate_success_response(
        &mut client,
        &["TYPE", "weather"],
        RespValue::SimpleString("stream".to_string()),
    )
    .await;
}

#[tokio::test]
async fn test_xread_returns_newer_entries() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    env.exec_command(&mut client, &["XADD", "weather", "1-1", "temperature", "21"]).await;
    env.exec_command(&mut client, &["XADD", "weather", "2-1", "temperature", "22"]).await;

    env.exec_command_immediate_success_response(
        &mut client,
        &["XREAD", "STREAMS", "weather", "1-1"],
        stream_reply("weather", vec![entry("2-1", &["temperature", "22"])]),
    )
    .await;
    env.exec_command_immediate_success_response(
        &mut client,
        &["XREAD", "STREAMS", "weather", "2-1"],
        RespValue::NullArray,
    )
    .await;
}

#[tokio::test]
async fn test_xread_block_wakes_on_new_entry() {
    let env = TestEnv::new_master_server();
    let mut writer = env.client();

    env.exec_command(&mut writer, &["XADD", "weather", "1-1", "temperature", "21"]).await;

    let blocked = env.spawn_command(env.client(), &["XREAD", "BLOCK", "0", "STREAMS", "weather", "$"]);
    env.wait_for_blocked_clients("weather", 1).await;

    env.exec_command_immediate_success_response(
        &mut writer,
        &["XADD", "weather", "5-1", "temperature", "25"],
        TestUtils::bulk("5-1"),
    )
    .await;

    let reply = timeout(Duration::from_secs(2), blocked).await.unwrap().unwrap();
    assert_eq!(
        reply,
        stream_reply("weather", vec![entry("5-1", &["temperature", "25"])])
    );
}

#[tokio::test]
async fn test_xread_block_times_out() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    let reply = env
        .exec_command_reply(&mut client, &["XREAD", "BLOCK", "100", "STREAMS", "weather", "0-0"])
        .await;

    assert_eq!(reply, RespValue::NullArray);
}

#[tokio::test]
async fn test_xread_block_with_huge_timeout_still_wakes() {
    let env = TestEnv::new_master_server();
    let mut writer = env.client();

    let blocked = env.spawn_command(
        env.client(),
        &["XREAD", "BLOCK", "9223372036854775807", "STREAMS", "weather", "$"],
    );
    env.wait_for_blocked_clients("weather", 1).await;

    env.exec_command(&mut writer, &["XADD", "weather", "1-1", "temperature", "21"]).await;

    let reply = timeout(Duration::from_secs(2), blocked).await.unwrap().unwrap();
    assert_eq!(
        reply,
        stream_reply("weather", vec![entry("1-1", &["temperature", "21"])])
    );
}
