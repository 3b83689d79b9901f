//! The fixed-rate driver that owns the world.
//!
//! Each tick drains the event queue filled by the gateway, advances the world
//! by a fixed step, then serializes one snapshot and hands it to every
//! session's outbox without waiting on any socket.

use crate::client_manager::{ClientManager, ConnectionId, SendOutcome, Session};
use crate::config::ServerConfig;
use crate::game::{GameState, PlayerCommand, TickReport};
use log::{debug, error, info, warn};
use shared::ServerMessage;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};

/// Messages sent from connection tasks to the simulation loop
#[derive(Debug)]
pub enum NetworkEvent {
    Connected {
        conn: ConnectionId,
        addr: SocketAddr,
        outbox: mpsc::Sender<String>,
    },
    Command {
        conn: ConnectionId,
        command: PlayerCommand,
    },
    Disconnected {
        conn: ConnectionId,
    },
}

pub struct SimulationLoop {
    game: GameState,
    clients: ClientManager,
    events: mpsc::UnboundedReceiver<NetworkEvent>,
    dt: f32,
    tick_duration: Duration,
}

impl SimulationLoop {
    pub fn new(config: &ServerConfig, events: mpsc::UnboundedReceiver<NetworkEvent>) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        info!("World seed {}", seed);
        Self {
            game: GameState::new(config.game.clone(), seed),
            clients: ClientManager::new(config.max_clients),
            events,
            dt: config.tick_dt(),
            tick_duration: config.tick_duration(),
        }
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut GameState {
        &mut self.game
    }

    pub fn clients(&self) -> &ClientManager {
        &self.clients
    }

    /// One full tick: input, world advance, publish.
    pub fn tick(&mut self) -> TickReport {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }

        let report = self.game.advance(self.dt);
        self.publish();
        report
    }

    pub fn handle_event(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::Connected { conn, addr, outbox } => self.connect(conn, addr, outbox),
            NetworkEvent::Command { conn, command } => match self.clients.player_of(&conn) {
                Some(player) => self.game.apply_command(player, command),
                None => debug!("Dropping command from unknown connection {}", conn),
            },
            NetworkEvent::Disconnected { conn } => self.disconnect(conn),
        }
    }

    fn connect(&mut self, conn: ConnectionId, addr: SocketAddr, outbox: mpsc::Sender<String>) {
        if self.clients.is_full() {
            info!("Rejecting connection {} from {}: server full", conn, addr);
            let message = ServerMessage::Disconnected {
                reason: "Server full".to_string(),
            };
            if let Ok(frame) = serde_json::to_string(&message) {
                if let Err(e) = outbox.try_send(frame) {
                    debug!("Could not tell connection {} the server is full: {}", conn, e);
                }
            }
            // Dropping the outbox lets the writer task close the socket.
            return;
        }

        let player = self.game.add_player();
        let mut session = Session::new(conn, player, addr, outbox);
        match serde_json::to_string(&ServerMessage::Init { id: player }) {
            Ok(frame) => {
                session.send(frame);
            }
            Err(e) => error!("Failed to serialize init message: {}", e),
        }

        if !self.clients.add_client(session) {
            self.game.remove_player(player);
        }
    }

    fn disconnect(&mut self, conn: ConnectionId) {
        if let Some(session) = self.clients.remove_client(&conn) {
            self.game.remove_player(session.player_id);
        }
    }

    /// Broadcasts the snapshot and any pending private inventory views.
    fn publish(&mut self) {
        if self.clients.is_empty() {
            return;
        }

        let frame = match serde_json::to_string(&ServerMessage::State(self.game.snapshot())) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to serialize snapshot: {}", e);
                return;
            }
        };
        let mut closed = self.clients.broadcast(&frame);

        for conn in self.clients.connection_ids() {
            let Some(player) = self.clients.player_of(&conn) else {
                continue;
            };
            let Some(view) = self.game.pending_inventory(player) else {
                continue;
            };
            let frame = match serde_json::to_string(&ServerMessage::Inventory(view)) {
                Ok(frame) => frame,
                Err(e) => {
                    error!("Failed to serialize inventory of player {}: {}", player, e);
                    continue;
                }
            };
            match self.clients.send_to(&conn, frame) {
                SendOutcome::Sent => self.game.mark_inventory_sent(player),
                // Still dirty, so it goes out again next tick.
                SendOutcome::Dropped => {}
                SendOutcome::Closed => closed.push(conn),
            }
        }

        closed.sort_unstable();
        closed.dedup();
        for conn in closed {
            self.disconnect(conn);
        }
    }

    /// Runs the loop at the configured tick rate until the task is dropped.
    pub async fn run(mut self) {
        let mut interval_timer = interval(self.tick_duration);
        interval_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Skip the first tick since it fires immediately
        interval_timer.tick().await;

        loop {
            interval_timer.tick().await;

            let started = Instant::now();
            let report = self.tick();
            let elapsed = started.elapsed();

            if elapsed > self.tick_duration {
                warn!(
                    "Tick {} took {:.1}ms, over the {:.1}ms budget",
                    self.game.tick(),
                    elapsed.as_secs_f64() * 1000.0,
                    self.tick_duration.as_secs_f64() * 1000.0
                );
            }

            if self.game.tick() % 100 == 0 {
                let store = self.game.store();
                debug!(
                    "Tick {}: {} sessions, {} players, {} enemies, {} ground items, {} combat events",
                    self.game.tick(),
                    self.clients.len(),
                    store.player_count(),
                    store.live_enemy_count(),
                    store.ground_item_count(),
                    report.events.len()
                );
            }
        }
    }
}
