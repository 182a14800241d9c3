//! Server network layer accepting TCP clients and handing them to sessions

use crate::config::ServerConfig;
use crate::directory::SessionDirectory;
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

/// Listening socket plus the directory every accepted client is routed through
pub struct Server {
    listener: TcpListener,
    directory: Arc<SessionDirectory>,
}

impl Server {
    pub async fn bind(config: &ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(config.bind_address()).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            directory: SessionDirectory::new(config.connection_settings()),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn directory(&self) -> Arc<SessionDirectory> {
        Arc::clone(&self.directory)
    }

    /// Accepts clients forever. A failed accept is logged and retried, it
    /// never takes the server down.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let directory = Arc::clone(&self.directory);
                    tokio::spawn(async move {
                        admit(directory, stream, addr).await;
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

async fn admit(directory: Arc<SessionDirectory>, stream: TcpStream, addr: SocketAddr) {
    debug!("Accepted connection from {}", addr);

    if let Err(e) = stream.set_nodelay(true) {
        warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
    }

    let (session_id, slot) = directory.assign(stream).await;
    info!("{} joined session {} as {}", addr, session_id, slot);
}
