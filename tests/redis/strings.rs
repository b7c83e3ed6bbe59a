use redis_lite::{commands::CommandError, resp::RespValue};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_set_and_get() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    env.exec_command_immediate_success_response(&mut client, &["SET", "grape", "mango"], TestUtils::ok())
        .await;
    env.exec_command_immediate_success_response(&mut client, &["get", "grape"], TestUtils::bulk("mango"))
        .await;
    env.exec_command_immediate_success_response(
        &mut client,
        &["GET", "pineapple"],
        RespValue::NullBulkString,
    )
    .await;
}

#[tokio::test]
async fn test_set_with_expiration() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    env.exec_command_immediate_success_response(
        &mut client,
        &["SET", "grape", "mango", "PX", "100"],
        TestUtils::ok(),
    )
    .await;
    env.exec_command_immediate_success_response(&mut client, &["GET", "grape"], TestUtils::bulk("mango"))
        .await;

    TestUtils::sleep_ms(150).await;

    env.exec_command_immediate_success_response(&mut client, &["GET", "grape"], RespValue::NullBulkString)
        .await;
    env.exec_command_immediate_error_response(
        &mut client,
        &["SET", "grape", "mango", "EX", "0"],
        CommandError::InvalidExpireTime("set".to_string()),
    )
    .await;
}

#[tokio::test]
async fn test_incr_del_type_and_keys() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    env.exec_command_immediate_success_response(&mut client, &["INCR", "counter"], RespValue::Integer(1))
        .await;
    env.exec_command_immediate_success_response(&mut client, &["INCR", "counter"], RespValue::Integer(2))
        .await;
    env.exec_command_immediate_success_response(&mut client, &["RPUSH", "list", "a"], RespValue::Integer(1))
        .await;
    env.exec_command_immediate_error_response(&mut client, &["INCR", "list"], CommandError::WrongType)
        .await;

    let test_cases = vec![
        ("counter", "string"),
        ("list", "list"),
        ("missing", "none"),
    ];

    for (key, expected) in test_cases {
        env.exec_command_immediate_success_response(
            &mut client,
            &["TYPE", key],
            RespValue::SimpleString(expected.to_string()),
        )
        .await;
    }

    env.exec_command_immediate_success_response(
        &mut client,
        &["KEYS", "*"],
        TestUtils::array(&["counter", "list"]),
    )
    .await;
    env.exec_command_immediate_success_response(
        &mut client,
        &["DEL", "counter", "list", "missing"],
        RespValue::Integer(2),
    )
    .await;
    env.exec_command_immediate_success_response(&mut client, &["KEYS", "*"], RespValue::Array(vec![]))
        .await;
}

#[tokio::test]
async fn test_server_commands() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    env.exec_command_immediate_success_response(
        &mut client,
        &["PING"],
        RespValue::SimpleString("PONG".to_string()),
    )
    .await;
    env.exec_command_immediate_success_response(&mut client, &["ECHO", "hey"], TestUtils::bulk("hey"))
        .await;
    env.exec_command_immediate_success_response(
        &mut client,
        &["CONFIG", "GET", "dbfilename"],
        TestUtils::array(&["dbfilename", "dump.rdb"]),
    )
    .await;
    env.exec_command_immediate_error_response(
        &mut client,
        &["FLUSHALL"],
        CommandError::UnknownCommand("FLUSHALL".to_string()),
    )
    .await;
    env.exec_command_immediate_error_response(
        &mut client,
        &["GET"],
        CommandError::wrong_arguments("get"),
    )
    .await;

    let RespValue::BulkString(info) = env.exec_command_reply(&mut client, &["INFO", "replication"]).await
    else {
        panic!("INFO replies with a bulk string");
    };

    assert!(info.contains("role:master"));
    assert!(info.contains("master_repl_offset:0"));
}

#[tokio::test]
async fn test_set_with_unrepresentable_expiration() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    env.exec_command_immediate_error_response(
        &mut client,
        &["SET", "grape", "mango", "EX", "9223372036854775807"],
        CommandError::InvalidExpireTime("set".to_string()),
    )
    .await;
    env.exec_command_immediate_success_response(&mut client, &["GET", "grape"], RespValue::NullBulkString)
        .await;
}
