use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Config;
use crate::http::connection::Connection;
use crate::routes::Router;

/// The accept loop. Each connection is served on its own task.
pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
    max_request_bytes: usize,
}

impl Server {
    /// Binds the configured address with the default route table.
    pub async fn bind(cfg: &Config) -> anyhow::Result<Self> {
        let router = Router::with_default_routes(cfg.files.directory.clone());
        Self::bind_with_router(cfg, router).await
    }

    pub async fn bind_with_router(cfg: &Config, router: Router) -> anyhow::Result<Self> {
        let addr = cfg.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;

        Ok(Self {
            listener,
            router: Arc::new(router),
            max_request_bytes: cfg.server.max_request_bytes,
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until the task is dropped. Accept failures are
    /// logged and do not stop the loop.
    pub async fn serve(self) -> anyhow::Result<()> {
        info!("Listening on {}", self.local_addr()?);

        loop {
            let (socket, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                    continue;
                }
            };
            info!("Accepted connection from {}", peer);

            let router = Arc::clone(&self.router);
            let max_request_bytes = self.max_request_bytes;
            tokio::spawn(async move {
                let mut conn = Connection::new(socket, router, max_request_bytes);
                if let Err(e) = conn.run().await {
                    error!("Connection error from {}: {}", peer, e);
                }
            });
        }
    }
}

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    Server::bind(cfg).await?.serve().await
}
