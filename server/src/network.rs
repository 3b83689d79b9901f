//! WebSocket gateway: accepts connections and shuttles frames between
//! sockets and the simulation loop.

use crate::client_manager::ConnectionId;
use crate::config::ServerConfig;
use crate::error::{CommandError, ServerError};
use crate::game::PlayerCommand;
use crate::simulation::{NetworkEvent, SimulationLoop};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// Frames a slow client may have queued before new ones are dropped.
pub const OUTBOX_CAPACITY: usize = 32;

/// Listening server. [`Server::run`] starts the simulation loop and then
/// accepts connections until the future is dropped.
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
}

impl Server {
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let addr = config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!("Server listening on {}", listener.local_addr()?);
        Ok(Server { listener, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> Result<(), ServerError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let simulation = SimulationLoop::new(&self.config, event_rx);
        let mut simulation_handle = tokio::spawn(simulation.run());

        let mut next_conn = 0u64;
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        next_conn += 1;
                        let conn = ConnectionId(next_conn);
                        tokio::spawn(handle_connection(stream, addr, conn, event_tx.clone()));
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                },
                result = &mut simulation_handle => {
                    if let Err(e) = result {
                        error!("Simulation loop stopped: {}", e);
                    }
                    return Ok(());
                }
            }
        }
    }
}

/// Reader side of one connection. Spawns the writer, then forwards every
/// parsed command to the loop until the socket closes.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    conn: ConnectionId,
    events: mpsc::UnboundedSender<NetworkEvent>,
) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(source) => {
            warn!("{}", ServerError::Handshake { addr, source });
            return;
        }
    };
    info!("Connection {} opened from {}", conn, addr);

    let (mut sink, mut source) = ws.split();
    let (outbox, mut outbox_rx) = mpsc::channel::<String>(OUTBOX_CAPACITY);
    if events
        .send(NetworkEvent::Connected { conn, addr, outbox })
        .is_err()
    {
        return;
    }

    tokio::spawn(async move {
        while let Some(frame) = outbox_rx.recv().await {
            if let Err(e) = sink.send(Message::Text(frame)).await {
                debug!("Write to connection {} failed: {}", conn, e);
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(message) = source.next().await {
        match message {
            Ok(Message::Text(text)) => match PlayerCommand::parse(&text) {
                Ok(command) => {
                    if events
                        .send(NetworkEvent::Command { conn, command })
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) => debug!("Ignoring message from connection {}: {}", conn, e),
            },
            Ok(Message::Binary(_)) => {
                debug!("Ignoring message from connection {}: {}", conn, CommandError::Binary)
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Read from connection {} failed: {}", conn, e);
                break;
            }
        }
    }

    info!("Connection {} from {} disconnected", conn, addr);
    let _ = events.send(NetworkEvent::Disconnected { conn });
}
