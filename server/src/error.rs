use shared::{PetalId, INVENTORY_CAP, MAX_TIER};
use std::net::SocketAddr;
use thiserror::Error;

/// Fatal errors of the server process itself.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("websocket handshake with {addr} failed: {source}")]
    Handshake {
        addr: SocketAddr,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A client message that could not be turned into a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("non-finite coordinates")]
    NonFinite,
    #[error("binary frames are not supported")]
    Binary,
}

/// A rejected inventory action. These never reach the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("inventory already holds {} petals", INVENTORY_CAP)]
    Full,
    #[error("no inventory entry at index {0}")]
    NoSuchIndex(usize),
    #[error("no hotbar slot {0}")]
    NoSuchSlot(usize),
    #[error("hotbar slot {0} is empty")]
    EmptySlot(usize),
    #[error("combine needs exactly three petals, got {0}")]
    CombineCount(usize),
    #[error("combine indices must be distinct")]
    DuplicateIndex,
    #[error("combine petals differ in type or tier")]
    Mismatch,
    #[error("petals are already at tier {}", MAX_TIER)]
    MaxTier,
    #[error("petal {0} is not owned by this player")]
    NotOwned(PetalId),
    #[error("layout does not match the petals owned by this player")]
    LayoutMismatch,
    #[error("player is dead")]
    Dead,
    #[error("item is out of reach")]
    OutOfReach,
}
