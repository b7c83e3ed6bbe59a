use redis_lite::{commands::CommandError, resp::RespValue};

use crate::test_utils::{TestEnv, TestUtils};

fn confirmation(kind: &str, channel: &str, count: i64) -> RespValue {
    RespValue::Array(vec![
        TestUtils::bulk(kind),
        TestUtils::bulk(channel),
        RespValue::Integer(count),
    ])
}

#[tokio::test]
async fn test_subscribe_and_publish() {
    let env = TestEnv::new_master_server();
    let mut subscriber = env.client();
    let mut publisher = env.client();

    let reply = env
        .exec_command_reply(&mut subscriber, &["SUBSCRIBE", "news", "sports"])
        .await;
    assert_eq!(
        reply,
        RespValue::Array(vec![
            confirmation("subscribe", "news", 1),
            confirmation("subscribe", "sports", 2),
        ])
    );

    env.exec_command_immediate_success_response(
        &mut publisher,
        &["PUBLISH", "news", "hello"],
        RespValue::Integer(1),
    )
    .await;
    env.exec_command_immediate_success_response(
        &mut publisher,
        &["PUBLISH", "weather", "rain"],
        RespValue::Integer(0),
    )
    .await;

    assert_eq!(
        subscriber.next_push().await,
        TestUtils::array(&["message", "news", "hello"])
    );
    assert!(!subscriber.has_pending_push());
}

#[tokio::test]
async fn test_subscribed_mode_restricts_commands() {
    let env = TestEnv::new_master_server();
    let mut subscriber = env.client();

    env.exec_command_reply(&mut subscriber, &["SUBSCRIBE", "news"]).await;

    env.exec_command_immediate_error_response(
        &mut subscriber,
        &["SET", "grape", "mango"],
        CommandError::NotAllowedInSubscribedMode("set".to_string()),
    )
    .await;
    env.exec_command_immediate_success_response(
        &mut subscriber,
        &["PING"],
        TestUtils::array(&["pong", ""]),
    )
    .await;

    let reply = env.exec_command_reply(&mut subscriber, &["UNSUBSCRIBE"]).await;
    assert_eq!(reply, RespValue::Array(vec![confirmation("unsubscribe", "news", 0)]));

    // back to normal once every channel is left
    env.exec_command_immediate_success_response(
        &mut subscriber,
        &["PING"],
        RespValue::SimpleString("PONG".to_string()),
    )
    .await;
}

#[tokio::test]
async fn test_disconnect_drops_subscriptions() {
    let env = TestEnv::new_master_server();
    let mut subscriber = env.client();
    let mut publisher = env.client();

    env.exec_command_reply(&mut subscriber, &["SUBSCRIBE", "news"]).await;
    env.router.disconnect(&subscriber.session).await;

    env.exec_command_immediate_success_response(
        &mut publisher,
        &["PUBLISH", "news", "hello"],
        RespValue::Integer(0),
    )
    .await;
}
