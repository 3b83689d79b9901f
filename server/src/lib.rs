//! # Petal Arena Server Library
//!
//! This library provides the authoritative server for a real-time multiplayer
//! arena. Players steer a flower whose equipped petals orbit around it; hostile
//! mobs roam the map, chase players and drop new petals when they die. The
//! server owns every piece of game state and clients only send intent.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Movement, mob behavior, combat, death and respawn are all decided here on a
//! fixed tick. Clients render whatever the latest snapshot says.
//!
//! ### Client Management
//! Handles the lifecycle of client connections:
//! - Connection establishment and player assignment
//! - Command parsing and validation
//! - Disconnection handling and cleanup
//! - Capacity limits and per-client backpressure
//!
//! ### State Broadcasting
//! After every tick one snapshot is serialized and queued for every client.
//! A client that falls behind loses frames; nobody else waits for it.
//!
//! ## Architecture Design
//!
//! ### Single-Owner Event Loop
//! One task owns the world and the session table. Connection tasks never touch
//! game state; they push [`simulation::NetworkEvent`]s into a queue that the
//! loop drains at the start of each tick. No locks guard game state.
//!
//! ### WebSocket Transport
//! Clients connect over WebSocket and exchange JSON text frames. The message
//! types live in the `shared` crate.
//!
//! ### Deterministic Ticks
//! Every tick advances the world by the same fixed step in the same order,
//! and all randomness comes from one seeded RNG. Two worlds with the same seed
//! and the same commands produce the same snapshots.
//!
//! ## Module Organization
//!
//! ### Simulation (`game`, `simulation`)
//! - [`game::GameState`] applies commands and advances the world
//! - [`simulation::SimulationLoop`] drives ticks and publishes snapshots
//!
//! ### World Rules (`behavior`, `combat`, `inventory`, `spawn`)
//! - Mob motion and attack decisions
//! - Damage, death, drops and rewards
//! - Inventory validation: add, drop, combine, equip and pickup
//! - Mob population and cleanup
//!
//! ### Data (`entity`, `store`, `physics`)
//! - Server-side players, mobs, petals and ground items
//! - Id allocation and ownership of every entity
//! - 2D vector math
//!
//! ### Networking (`network`, `client_manager`)
//! - WebSocket accept loop and per-connection reader and writer tasks
//! - Loop-side session table with bounded outboxes
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         port: 8080,
//!         seed: Some(42),
//!         ..ServerConfig::default()
//!     };
//!
//!     // Binds the listener, starts the 20Hz simulation loop and accepts
//!     // clients until the future is dropped.
//!     Server::bind(config).await?.run().await?;
//!     Ok(())
//! }
//! ```

pub mod behavior;
pub mod client_manager;
pub mod combat;
pub mod config;
pub mod entity;
pub mod error;
pub mod game;
pub mod inventory;
pub mod network;
pub mod physics;
pub mod simulation;
pub mod spawn;
pub mod store;
pub mod utils;
