//! Authoritative world state and the fixed-order world advance.

use crate::behavior::{self, Target};
use crate::combat::{CombatEvent, CombatResolver};
use crate::config::GameConfig;
use crate::error::{CommandError, InventoryError};
use crate::inventory;
use crate::physics::Vector2;
use crate::spawn::{Purge, SpawnDirector};
use crate::store::EntityStore;
use crate::utils::{clamp_unit, random_map_position};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{
    in_safe_zone, sanitize_name, ClientMessage, EnemyId, InventoryAction, InventoryView, ItemId,
    PetalId, PlayerId, WorldSnapshot,
};
use std::f32::consts::TAU;

/// A validated client intent, ready to be applied to the sender's player.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    SetName(String),
    /// Direct placement, clamped to the map.
    MoveTo(Vector2),
    /// Movement intent clamped to unit length, and/or an inventory action.
    Input {
        intent: Option<Vector2>,
        action: Option<InventoryAction>,
    },
    Rearrange {
        hotbar: Vec<Option<PetalId>>,
        inventory: Vec<PetalId>,
    },
    Equip {
        slot: usize,
        petal: PetalId,
    },
    Unequip {
        slot: usize,
    },
    Pickup(ItemId),
    /// Petal attack on one enemy, or on everything in reach.
    Attack(Option<EnemyId>),
}

impl PlayerCommand {
    /// Parses one JSON text frame.
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let message: ClientMessage = serde_json::from_str(text)?;
        Self::try_from(message)
    }
}

impl TryFrom<ClientMessage> for PlayerCommand {
    type Error = CommandError;

    fn try_from(message: ClientMessage) -> Result<Self, Self::Error> {
        let command = match message {
            ClientMessage::Join { username } => PlayerCommand::SetName(username),
            ClientMessage::SetName { name } => PlayerCommand::SetName(name),
            ClientMessage::Move { x, y } => {
                if !x.is_finite() || !y.is_finite() {
                    return Err(CommandError::NonFinite);
                }
                PlayerCommand::MoveTo(Vector2::new(x, y).clamp_to_map())
            }
            ClientMessage::Input {
                vx,
                vy,
                action,
                payload,
            } => {
                let intent = if vx.is_some() || vy.is_some() {
                    let (x, y) = (vx.unwrap_or(0.0), vy.unwrap_or(0.0));
                    if !x.is_finite() || !y.is_finite() {
                        return Err(CommandError::NonFinite);
                    }
                    Some(clamp_unit(x, y))
                } else {
                    None
                };
                let action = action
                    .map(|name| InventoryAction::from_parts(&name, payload))
                    .transpose()?;
                PlayerCommand::Input { intent, action }
            }
            ClientMessage::UpdateInventory { hotbar, inventory } => PlayerCommand::Rearrange {
                hotbar: hotbar.iter().map(|slot| slot.map(|p| p.id)).collect(),
                inventory: inventory.iter().map(|p| p.id).collect(),
            },
            ClientMessage::Equip { slot, petal_id } => PlayerCommand::Equip {
                slot,
                petal: petal_id,
            },
            ClientMessage::Unequip { slot } => PlayerCommand::Unequip { slot },
            ClientMessage::Pickup { item_id } => PlayerCommand::Pickup(item_id),
            ClientMessage::AttackMob { mob_id, .. } => PlayerCommand::Attack(Some(mob_id)),
            ClientMessage::AttackTick => PlayerCommand::Attack(None),
        };
        Ok(command)
    }
}

/// What happened during one world advance.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickReport {
    pub spawned: Vec<EnemyId>,
    pub events: Vec<CombatEvent>,
    pub respawned: Vec<PlayerId>,
    pub purge: Option<Purge>,
}

pub struct GameState {
    store: EntityStore,
    config: GameConfig,
    rng: StdRng,
    spawner: SpawnDirector,
    combat: CombatResolver,
    /// Simulated seconds since the world was created.
    time: f64,
    tick: u64,
}

impl GameState {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            store: EntityStore::new(),
            config,
            rng: StdRng::seed_from_u64(seed),
            spawner: SpawnDirector::new(),
            combat: CombatResolver::new(),
            time: 0.0,
            tick: 0,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    /// Creates a player at a random position with the default loadout.
    pub fn add_player(&mut self) -> PlayerId {
        let position = random_map_position(&mut self.rng);
        let id = self.store.create_player(position);
        info!(
            "Added player {} at ({:.0}, {:.0})",
            id, position.x, position.y
        );
        id
    }

    /// Removes a player. Removing one that is already gone does nothing.
    pub fn remove_player(&mut self, id: PlayerId) -> bool {
        match self.store.remove_player(id) {
            Some(player) => {
                info!("Removed player {} ({})", id, player.name);
                true
            }
            None => false,
        }
    }

    /// Applies a command on behalf of `id`. Commands for unknown players and
    /// rejected actions are no-ops.
    pub fn apply_command(&mut self, id: PlayerId, command: PlayerCommand) {
        if self.store.player(id).is_none() {
            debug!("Dropping command for vanished player {}", id);
            return;
        }

        match command {
            PlayerCommand::SetName(raw) => {
                if let Some(player) = self.store.player_mut(id) {
                    player.name = sanitize_name(&raw);
                }
            }
            PlayerCommand::MoveTo(position) => {
                if let Some(player) = self.store.player_mut(id).filter(|p| p.is_alive()) {
                    player.set_position(position.clamp_to_map());
                }
            }
            PlayerCommand::Input { intent, action } => {
                if let Some(intent) = intent {
                    if let Some(player) = self.store.player_mut(id).filter(|p| p.is_alive()) {
                        player.velocity = intent.clamp_length(1.0).scale(player.speed);
                    }
                }
                if let Some(action) = action {
                    if let Err(e) = self.apply_inventory_action(id, action) {
                        debug!("Rejected inventory action from player {}: {}", id, e);
                    }
                }
            }
            PlayerCommand::Rearrange { hotbar, inventory } => {
                if let Some(player) = self.store.player_mut(id) {
                    if let Err(e) = inventory::rearrange(player, &hotbar, &inventory) {
                        warn!("Rejected inventory layout from player {}: {}", id, e);
                    }
                }
            }
            PlayerCommand::Equip { slot, petal } => {
                if let Some(player) = self.store.player_mut(id) {
                    match inventory::equip(player, slot, petal) {
                        Ok(()) => {}
                        Err(e @ InventoryError::NotOwned(_)) => {
                            warn!("Rejected equip from player {}: {}", id, e)
                        }
                        Err(e) => debug!("Rejected equip from player {}: {}", id, e),
                    }
                }
            }
            PlayerCommand::Unequip { slot } => {
                if let Some(player) = self.store.player_mut(id) {
                    if let Err(e) = inventory::unequip(player, slot) {
                        debug!("Rejected unequip from player {}: {}", id, e);
                    }
                }
            }
            PlayerCommand::Pickup(item) => {
                if let Err(e) = self.pickup(id, item) {
                    debug!("Rejected pickup of item {} by player {}: {}", item, id, e);
                }
            }
            PlayerCommand::Attack(target) => {
                let events = self.combat.attack(&mut self.store, id, target, self.time);
                log_events(&events);
            }
        }
    }

    fn apply_inventory_action(
        &mut self,
        id: PlayerId,
        action: InventoryAction,
    ) -> Result<(), InventoryError> {
        match action {
            InventoryAction::Add { kind } => {
                let petal = self.store.new_petal(kind, 1);
                if let Some(player) = self.store.player_mut(id) {
                    inventory::add(player, petal)?;
                }
            }
            InventoryAction::Drop { index } => {
                if let Some(player) = self.store.player_mut(id) {
                    inventory::drop(player, index)?;
                }
            }
            InventoryAction::Combine { indices } => {
                let new_id = self.store.allocate_petal_id();
                if let Some(player) = self.store.player_mut(id) {
                    inventory::combine(player, &indices, new_id)?;
                }
            }
        }
        Ok(())
    }

    fn pickup(&mut self, id: PlayerId, item_id: ItemId) -> Result<(), InventoryError> {
        let (Some(player), Some(item)) = (self.store.player(id), self.store.ground_item(item_id))
        else {
            return Ok(());
        };
        inventory::check_pickup(player, item)?;

        if let Some(item) = self.store.remove_ground_item(item_id) {
            if let Some(player) = self.store.player_mut(id) {
                inventory::add(player, item.petal)?;
            }
        }
        Ok(())
    }

    /// Advances the world by one fixed step of `dt` seconds.
    pub fn advance(&mut self, dt: f32) -> TickReport {
        let mut report = TickReport::default();

        self.time += dt as f64;
        self.tick += 1;
        let now = self.time;

        for player in self.store.players_mut() {
            if player.is_alive() {
                player.position = player
                    .position
                    .add(&player.velocity.scale(dt))
                    .clamp_to_map();
                player.orbit_angle = (player.orbit_angle + player.orbit_speed * dt) % TAU;
            }
            player.in_safe_zone = in_safe_zone(player.position.x, player.position.y);
        }

        report.spawned = self
            .spawner
            .spawn_due(&mut self.store, &self.config, &mut self.rng, dt);

        let targets: Vec<Target> = self
            .store
            .player_ids()
            .into_iter()
            .filter_map(|id| self.store.player(id))
            .filter(|p| p.is_alive())
            .map(|p| Target {
                id: p.id,
                position: p.position,
            })
            .collect();

        let mut strikes = Vec::new();
        for enemy_id in self.store.enemy_ids() {
            let Some(enemy) = self.store.enemy_mut(enemy_id) else {
                continue;
            };
            if !enemy.is_alive() {
                continue;
            }
            let decision = behavior::advance(enemy, &targets, now, dt, &mut self.rng);
            if let Some(strike) = decision.apply(enemy) {
                strikes.push(strike);
            }
        }

        for strike in &strikes {
            let events = self
                .combat
                .apply_strike(&mut self.store, strike, &mut self.rng);
            report.events.extend(events);
        }
        report
            .events
            .extend(self.combat.contact_pass(&mut self.store, now));
        report
            .events
            .extend(self.combat.player_sweep(&mut self.store, now));

        self.combat.tick_petal_cooldowns(&mut self.store, dt);

        for id in self.store.player_ids() {
            let due = match self.store.player_mut(id) {
                Some(player) if player.dead => {
                    player.respawn_timer -= dt;
                    player.respawn_timer <= 0.0
                }
                _ => false,
            };
            if due {
                let position = random_map_position(&mut self.rng);
                if let Some(player) = self.store.player_mut(id) {
                    player.respawn(position);
                    info!(
                        "Player {} respawned at ({:.0}, {:.0})",
                        id, position.x, position.y
                    );
                    report.respawned.push(id);
                }
            }
        }

        if let Some(purge) = self
            .spawner
            .purge_due(&mut self.store, &self.config, now, dt)
        {
            self.combat.prune(&purge.dead_enemies, now);
            report.purge = Some(purge);
        }

        log_events(&report.events);
        report
    }

    /// The public view of the world. Dead enemies are left out.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            players: self
                .store
                .player_ids()
                .into_iter()
                .filter_map(|id| self.store.player(id))
                .map(|p| p.view())
                .collect(),
            enemies: self
                .store
                .enemy_ids()
                .into_iter()
                .filter_map(|id| self.store.enemy(id))
                .filter(|e| e.is_alive())
                .map(|e| e.view())
                .collect(),
            petals_on_ground: self
                .store
                .ground_items()
                .map(|item| (item.id, item.view()))
                .collect(),
        }
    }

    /// The private inventory view of `id`, if it changed since it was last sent.
    pub fn pending_inventory(&self, id: PlayerId) -> Option<InventoryView> {
        self.store
            .player(id)
            .filter(|p| p.inventory_dirty)
            .map(|p| p.inventory_view())
    }

    pub fn mark_inventory_sent(&mut self, id: PlayerId) {
        if let Some(player) = self.store.player_mut(id) {
            player.inventory_dirty = false;
        }
    }
}

fn log_events(events: &[CombatEvent]) {
    for event in events {
        if let CombatEvent::EnemyKilled { enemy, by, drop } = event {
            debug!("Enemy {} dropped item {} for player {}", enemy, drop, by);
        }
    }
}
