//! Loop-side bookkeeping of connected clients.
//!
//! This module tracks every live connection as a [`Session`]:
//! - which player the connection controls
//! - the bounded outbox its writer task drains into the socket
//! - how many frames were dropped because that outbox was full
//!
//! Only the simulation loop touches the manager, so connect, disconnect and
//! broadcast never race each other.

use log::{debug, info};
use shared::PlayerId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Identity of one transport connection, assigned by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of queueing one frame for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// The outbox was full; this frame is lost for this client only.
    Dropped,
    /// The writer task is gone; the session should be removed.
    Closed,
}

/// A connected client and the player it controls
#[derive(Debug)]
pub struct Session {
    pub id: ConnectionId,
    pub player_id: PlayerId,
    /// Peer address, for logging
    pub addr: SocketAddr,
    /// Frames lost to a full outbox since the session started
    pub dropped_frames: u64,
    pub connected_at: Instant,
    outbox: mpsc::Sender<String>,
}

impl Session {
    pub fn new(
        id: ConnectionId,
        player_id: PlayerId,
        addr: SocketAddr,
        outbox: mpsc::Sender<String>,
    ) -> Self {
        Self {
            id,
            player_id,
            addr,
            dropped_frames: 0,
            connected_at: Instant::now(),
            outbox,
        }
    }

    /// Queues a frame without waiting.
    pub fn send(&mut self, frame: String) -> SendOutcome {
        match self.outbox.try_send(frame) {
            Ok(()) => SendOutcome::Sent,
            Err(TrySendError::Full(_)) => {
                self.dropped_frames += 1;
                debug!(
                    "Outbox of connection {} full, dropped frame ({} so far)",
                    self.id, self.dropped_frames
                );
                SendOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => SendOutcome::Closed,
        }
    }
}

/// Manages all sessions and enforces the connection limit.
pub struct ClientManager {
    sessions: HashMap<ConnectionId, Session>,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            max_clients,
        }
    }

    pub fn is_full(&self) -> bool {
        self.sessions.len() >= self.max_clients
    }

    /// Registers a session. Returns false if the server is at capacity or
    /// the connection is already known.
    pub fn add_client(&mut self, session: Session) -> bool {
        if self.is_full() || self.sessions.contains_key(&session.id) {
            return false;
        }
        info!(
            "Connection {} from {} controls player {}",
            session.id, session.addr, session.player_id
        );
        self.sessions.insert(session.id, session);
        true
    }

    /// Removes a session. Removing one that is already gone returns None.
    pub fn remove_client(&mut self, id: &ConnectionId) -> Option<Session> {
        let session = self.sessions.remove(id)?;
        info!(
            "Connection {} closed after {:.1}s ({} frames dropped)",
            session.id,
            session.connected_at.elapsed().as_secs_f32(),
            session.dropped_frames
        );
        Some(session)
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn player_of(&self, id: &ConnectionId) -> Option<PlayerId> {
        self.sessions.get(id).map(|s| s.player_id)
    }

    /// Queues a frame for one connection. Unknown connections count as closed.
    pub fn send_to(&mut self, id: &ConnectionId, frame: String) -> SendOutcome {
        match self.sessions.get_mut(id) {
            Some(session) => session.send(frame),
            None => SendOutcome::Closed,
        }
    }

    /// Queues the same frame for every session. Returns the connections whose
    /// outbox turned out to be closed.
    pub fn broadcast(&mut self, frame: &str) -> Vec<ConnectionId> {
        let mut closed = Vec::new();
        for session in self.sessions.values_mut() {
            if session.send(frame.to_string()) == SendOutcome::Closed {
                closed.push(session.id);
            }
        }
        closed.sort_unstable();
        closed
    }

    /// Connection ids in ascending order.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self.sessions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn session(id: u64, capacity: usize) -> (Session, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Session::new(ConnectionId(id), PlayerId(id), test_addr(), tx),
            rx,
        )
    }

    #[test]
    fn test_client_manager_creation() {
        let manager = ClientManager::new(5);
        assert_eq!(manager.max_clients, 5);
        assert!(manager.is_empty());
        assert_eq!(manager.len(), 0);
    }

    #[test]
    fn test_add_client_max_capacity() {
        let mut manager = ClientManager::new(1);
        let (first, _rx1) = session(1, 4);
        let (second, _rx2) = session(2, 4);

        assert!(manager.add_client(first));
        assert!(manager.is_full());
        assert!(!manager.add_client(second));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_duplicate_connection_rejected() {
        let mut manager = ClientManager::new(4);
        let (first, _rx1) = session(1, 4);
        let (again, _rx2) = session(1, 4);
        assert!(manager.add_client(first));
        assert!(!manager.add_client(again));
    }

    #[test]
    fn test_remove_client_is_idempotent() {
        let mut manager = ClientManager::new(2);
        let (s, _rx) = session(1, 4);
        manager.add_client(s);

        let removed = manager.remove_client(&ConnectionId(1)).unwrap();
        assert_eq!(removed.player_id, PlayerId(1));
        assert!(manager.remove_client(&ConnectionId(1)).is_none());
        assert!(manager.remove_client(&ConnectionId(999)).is_none());
        assert!(manager.is_empty());
    }

    #[test]
    fn test_player_lookup() {
        let mut manager = ClientManager::new(2);
        let (s, _rx) = session(3, 4);
        manager.add_client(s);
        assert_eq!(manager.player_of(&ConnectionId(3)), Some(PlayerId(3)));
        assert_eq!(manager.player_of(&ConnectionId(4)), None);
        assert!(manager.get(&ConnectionId(3)).is_some());
    }

    #[test]
    fn test_full_outbox_drops_and_counts() {
        let mut manager = ClientManager::new(2);
        let (s, mut rx) = session(1, 1);
        manager.add_client(s);

        assert_eq!(manager.send_to(&ConnectionId(1), "a".into()), SendOutcome::Sent);
        assert_eq!(manager.send_to(&ConnectionId(1), "b".into()), SendOutcome::Dropped);
        assert_eq!(manager.get(&ConnectionId(1)).unwrap().dropped_frames, 1);

        assert_eq!(rx.try_recv().unwrap(), "a");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_broadcast_reports_closed_outboxes() {
        let mut manager = ClientManager::new(4);
        let (alive, mut alive_rx) = session(1, 4);
        let (gone, gone_rx) = session(2, 4);
        manager.add_client(alive);
        manager.add_client(gone);
        drop(gone_rx);

        let closed = manager.broadcast("state");
        assert_eq!(closed, vec![ConnectionId(2)]);
        assert_eq!(alive_rx.try_recv().unwrap(), "state");
        assert_eq!(manager.send_to(&ConnectionId(99), "x".into()), SendOutcome::Closed);
    }

    #[test]
    fn test_connection_ids_sorted() {
        let mut manager = ClientManager::new(16);
        let mut receivers = Vec::new();
        for id in [5, 1, 9, 3] {
            let (s, rx) = session(id, 1);
            manager.add_client(s);
            receivers.push(rx);
        }
        assert_eq!(
            manager.connection_ids(),
            vec![ConnectionId(1), ConnectionId(3), ConnectionId(5), ConnectionId(9)]
        );
    }
}
