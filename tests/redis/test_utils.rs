use std::{sync::Arc, time::Duration};

use bytes::{Bytes, BytesMut};
use redis_lite::{
    commands::{Command, CommandError, CommandResult},
    config::Config,
    resp::RespValue,
    router::Router,
    server::RedisServer,
    session::Session,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::mpsc::{self, UnboundedReceiver},
    task::JoinHandle,
    time::timeout,
};

/// Test utilities for building commands and expected replies
pub struct TestUtils;

/// An isolated router, as one server process would own it
pub struct TestEnv {
    pub router: Arc<Router>,
}

/// A connected client: its session plus the receiving end of its outbox
pub struct TestClient {
    pub session: Session,
    inbox: UnboundedReceiver<Bytes>,
}

impl TestEnv {
    pub fn new_master_server() -> Self {
        Self::with_config(Config::default())
    }

    pub fn new_replica_server() -> Self {
        Self::with_config(Config {
            replicaof: Some("127.0.0.1 6379".to_string()),
            ..Config::default()
        })
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            router: Arc::new(Router::new(config).unwrap()),
        }
    }

    pub fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
        }
    }

    pub fn client(&self) -> TestClient {
        let (outbox, inbox) = mpsc::unbounded_channel();

        TestClient {
            session: self.router.new_session(outbox),
            inbox,
        }
    }

    pub async fn exec_command(&self, client: &mut TestClient, command: &[&str]) -> CommandResult {
        let command = Command::from_parts(command).unwrap();
        self.router.execute(&mut client.session, command).await
    }

    /// Runs a command and resolves its reply, waiting for suspended ones
    pub async fn exec_command_reply(&self, client: &mut TestClient, command: &[&str]) -> RespValue {
        match self.exec_command(client, command).await {
            CommandResult::Response(reply) => reply,
            CommandResult::Responses(replies) => RespValue::Array(replies),
            CommandResult::Pending(pending) => timeout(Duration::from_secs(5), pending.resolve())
                .await
                .expect("suspended reply resolves in time")
                .expect("suspended reply was not cancelled"),
            CommandResult::NoResponse => panic!("Expected a reply to {:?}", command),
        }
    }

    pub async fn exec_command_immediate_success_response(
        &self,
        client: &mut TestClient,
        command: &[&str],
        expected_response: RespValue,
    ) {
        match self.exec_command(client, command).await {
            CommandResult::Response(reply) => assert_eq!(reply, expected_response, "{:?}", command),
            other => panic!("Expected an immediate response to {:?}, got {:?}", command, other),
        }
    }

    pub async fn exec_command_immediate_error_response(
        &self,
        client: &mut TestClient,
        command: &[&str],
        expected_error: CommandError,
    ) {
        self.exec_command_immediate_success_response(client, command, expected_error.as_resp())
            .await;
    }

    pub async fn exec_command_pending_response(
        &self,
        client: &mut TestClient,
        command: &[&str],
        expected_response: RespValue,
    ) {
        match self.exec_command(client, command).await {
            CommandResult::Pending(pending) => {
                let reply = timeout(Duration::from_secs(5), pending.resolve())
                    .await
                    .expect("suspended reply resolves in time");
                assert_eq!(reply, Some(expected_response), "{:?}", command);
            }
            other => panic!("Expected a suspended reply to {:?}, got {:?}", command, other),
        }
    }

    /// Runs a command on its own task, as a blocked client would be served
    pub fn spawn_command(&self, mut client: TestClient, command: &[&str]) -> JoinHandle<RespValue> {
        let env = self.clone();
        let command = command.iter().map(|part| part.to_string()).collect::<Vec<_>>();

        tokio::spawn(async move {
            let parts = command.iter().map(String::as_str).collect::<Vec<_>>();
            env.exec_command_reply(&mut client, &parts).await
        })
    }

    /// Waits until `count` clients are queued on `key`
    pub async fn wait_for_blocked_clients(&self, key: &str, count: usize) {
        timeout(Duration::from_secs(2), async {
            while self.router.blocking().queued_clients(key).await.len() < count {
                TestUtils::sleep_ms(5).await;
            }
        })
        .await
        .expect("clients blocked in time");
    }
}

impl TestClient {
    /// Next frame pushed to this client, decoded
    pub async fn next_push(&mut self) -> RespValue {
        let bytes = self.next_bytes().await;

        match RespValue::decode(&bytes) {
            Ok(Some((value, length))) if length == bytes.len() => value,
            other => panic!("Expected one whole frame, got {:?}", other),
        }
    }

    /// Next raw chunk pushed to this client
    pub async fn next_bytes(&mut self) -> Bytes {
        timeout(Duration::from_secs(2), self.inbox.recv())
            .await
            .expect("push arrives in time")
            .expect("outbox still open")
    }

    pub fn has_pending_push(&self) -> bool {
        !self.inbox.is_empty()
    }
}

impl TestUtils {
    pub async fn sleep_ms(milliseconds: u64) {
        tokio::time::sleep(Duration::from_millis(milliseconds)).await;
    }

    pub fn ok() -> RespValue {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn bulk(value: &str) -> RespValue {
        RespValue::BulkString(value.to_string())
    }

    pub fn array(values: &[&str]) -> RespValue {
        RespValue::bulk_string_array(values.iter().copied())
    }

    pub fn encode_command(command: &[&str]) -> Vec<u8> {
        Self::array(command).encode().into_bytes()
    }

    /// Starts a server on an ephemeral port and returns it with its port
    pub async fn start_server(config: Config) -> (Arc<Router>, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = RedisServer::new(config).unwrap();
        let router = Arc::clone(server.router());

        tokio::spawn(async move {
            if let Err(error) = server.serve(listener).await {
                panic!("server stopped: {:#}", error);
            }
        });

        (router, port)
    }

    pub async fn connect(port: u16) -> TcpStream {
        TcpStream::connect(("127.0.0.1", port)).await.unwrap()
    }

    /// Writes one command and reads exactly one reply frame
    pub async fn send_command(stream: &mut TcpStream, command: &[&str]) -> RespValue {
        stream.write_all(&Self::encode_command(command)).await.unwrap();

        let mut buffer = BytesMut::new();

        loop {
            if let Some((value, _)) = RespValue::parse(&mut buffer).unwrap() {
                return value;
            }

            let read = timeout(Duration::from_secs(5), stream.read_buf(&mut buffer))
                .await
                .expect("reply arrives in time")
                .unwrap();
            assert!(read > 0, "connection closed before replying to {:?}", command);
        }
    }
}
