use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use redis_lite::{commands::CommandError, resp::RespValue};

use crate::test_utils::{TestEnv, TestUtils};

fn queued() -> RespValue {
    RespValue::SimpleString("QUEUED".to_string())
}

#[tokio::test]
async fn test_multi_exec_runs_queued_commands() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();
    let mut other = env.client();

    env.exec_command_immediate_success_response(&mut client, &["MULTI"], TestUtils::ok())
        .await;
    env.exec_command_immediate_success_response(&mut client, &["SET", "counter", "41"], queued())
        .await;
    env.exec_command_immediate_success_response(&mut client, &["INCR", "counter"], queued())
        .await;
    env.exec_command_immediate_success_response(&mut client, &["RPUSH", "counter", "x"], queued())
        .await;

    // nothing ran yet
    env.exec_command_immediate_success_response(&mut other, &["GET", "counter"], RespValue::NullBulkString)
        .await;

    env.exec_command_immediate_success_response(
        &mut client,
        &["EXEC"],
        RespValue::Array(vec![
            TestUtils::ok(),
            RespValue::Integer(42),
            CommandError::WrongType.as_resp(),
        ]),
    )
    .await;
    env.exec_command_immediate_success_response(&mut other, &["GET", "counter"], TestUtils::bulk("42"))
        .await;
}

#[tokio::test]
async fn test_transaction_errors() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    env.exec_command_immediate_error_response(&mut client, &["EXEC"], CommandError::ExecWithoutMulti)
        .await;
    env.exec_command_immediate_error_response(&mut client, &["DISCARD"], CommandError::DiscardWithoutMulti)
        .await;

    env.exec_command_immediate_success_response(&mut client, &["MULTI"], TestUtils::ok())
        .await;
    env.exec_command_immediate_error_response(&mut client, &["MULTI"], CommandError::NestedMulti)
        .await;
    env.exec_command_immediate_error_response(
        &mut client,
        &["FLUSHALL"],
        CommandError::UnknownCommand("FLUSHALL".to_string()),
    )
    .await;
    env.exec_command_immediate_success_response(&mut client, &["SET", "grape", "mango"], queued())
        .await;
    env.exec_command_immediate_success_response(&mut client, &["DISCARD"], TestUtils::ok())
        .await;

    env.exec_command_immediate_success_response(&mut client, &["GET", "grape"], RespValue::NullBulkString)
        .await;
    env.exec_command_immediate_success_response(&mut client, &["MULTI"], TestUtils::ok())
        .await;
    env.exec_command_immediate_success_response(&mut client, &["EXEC"], RespValue::Array(vec![]))
        .await;
}

#[tokio::test]
async fn test_blocking_commands_inside_exec_do_not_block() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();

    env.exec_command_immediate_success_response(&mut client, &["MULTI"], TestUtils::ok())
        .await;
    env.exec_command_immediate_success_response(&mut client, &["BLPOP", "queue", "0"], queued())
        .await;
    env.exec_command_immediate_success_response(
        &mut client,
        &["XREAD", "BLOCK", "0", "STREAMS", "weather", "$"],
        queued(),
    )
    .await;
    env.exec_command_immediate_success_response(
        &mut client,
        &["EXEC"],
        RespValue::Array(vec![RespValue::NullArray, RespValue::NullArray]),
    )
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_exec_is_not_interleaved_with_other_clients() {
    let env = TestEnv::new_master_server();
    let mut client = env.client();
    let stop = Arc::new(AtomicBool::new(false));

    let writer = {
        let env = env.clone();
        let stop = Arc::clone(&stop);

        tokio::spawn(async move {
            let mut other = env.client();

            while !stop.load(Ordering::Relaxed) {
                env.exec_command(&mut other, &["SET", "counter", "100"]).await;
                tokio::task::yield_now().await;
            }
        })
    };

    for _ in 0..500 {
        env.exec_command(&mut client, &["MULTI"]).await;
        env.exec_command(&mut client, &["SET", "counter", "1"]).await;
        env.exec_command(&mut client, &["INCR", "counter"]).await;
        env.exec_command_immediate_success_response(
            &mut client,
            &["EXEC"],
            RespValue::Array(vec![TestUtils::ok(), RespValue::Integer(2)]),
        )
        .await;
    }

    stop.store(true, Ordering::Relaxed);
    writer.await.unwrap();
}
