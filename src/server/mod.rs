pub mod websocket;

use crate::agent::SessionController;
use log::{ error, info };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;

pub struct Server {
    listener: TcpListener,
    controller: Arc<SessionController>,
}

impl Server {
    pub async fn bind(
        addr: &str,
        controller: Arc<SessionController>
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let listener = TcpListener::bind(addr).await.map_err(|e|
            format!("Failed to bind WebSocket server to '{}': {}", addr, e)
        )?;
        Ok(Self { listener, controller })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Box<dyn Error + Send + Sync>> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        info!("WS server listening on: {}", self.local_addr()?);

        loop {
            let (stream, peer) = self.listener.accept().await?;
            info!("Incoming connection from: {}", peer);
            let controller = Arc::clone(&self.controller);

            tokio::spawn(async move {
                match accept_async(stream).await {
                    Ok(ws) => websocket::handle_connection(peer, ws, controller).await,
                    Err(e) => error!("Handshake failed for {}: {}", peer, e),
                }
            });
        }
    }
}
