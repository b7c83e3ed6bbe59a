use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::{
    config::{Config, ConfigError},
    connection::handle_connection,
    rdb::read_rdb_file,
    replication::{connect_to_master, Role},
    router::Router,
};

#[derive(Debug)]
pub struct RedisServer {
    router: Arc<Router>,
}

impl RedisServer {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        Ok(Self {
            router: Arc::new(Router::new(config)?),
        })
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let port = self.router.config().port;
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;

        self.serve(listener).await
    }

    /// Loads the snapshot, links up with the master when this node is a
    /// replica, then accepts connections until the listener fails.
    pub async fn serve(&self, listener: TcpListener) -> anyhow::Result<()> {
        self.load_snapshot_file().await?;

        let address = listener.local_addr()?;

        if let Role::Replica { host, port } = self.router.role().clone() {
            let router = Arc::clone(&self.router);

            tokio::spawn(async move {
                match connect_to_master(router, &host, port, address.port()).await {
                    Ok(()) => info!(%host, port, "master closed the replication link"),
                    Err(error) => error!(%host, port, %error, "replication link failed"),
                }
            });
        }

        info!(%address, role = self.router.role().name(), "listening");

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(error) => {
                    warn!(%error, "failed to accept connection");
                    continue;
                }
            };

            tokio::spawn(handle_connection(
                stream,
                Arc::clone(&self.router),
                peer.to_string(),
            ));
        }
    }

    async fn load_snapshot_file(&self) -> anyhow::Result<()> {
        let path = self.router.config().snapshot_path();

        let Some(bytes) = read_rdb_file(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?
        else {
            info!(path = %path.display(), "no snapshot file, starting empty");
            return Ok(());
        };

        self.router
            .load_snapshot(&bytes)
            .await
            .with_context(|| format!("failed to decode {}", path.display()))?;

        Ok(())
    }
}
