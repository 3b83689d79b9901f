//! Damage, death and drops.
//!
//! Every attack path funnels into the same few rules: the safe zone blocks
//! damage in both directions, hp never drops below zero, a petal hit costs
//! the petal the enemy's body damage, and each (enemy, petal) pair can only
//! connect once per [`PETAL_HIT_COOLDOWN`] seconds.

use crate::behavior::Strike;
use crate::entity::Player;
use crate::physics::{circles_overlap, Vector2};
use crate::store::EntityStore;
use log::{debug, info};
use rand::Rng;
use shared::{
    EnemyId, ItemId, PetalId, PlayerId, HOTBAR_SLOTS, MINIBOSS_BREAK_SECONDS, PETAL_HIT_COOLDOWN,
    PETAL_RADIUS, PLAYER_RADIUS,
};
use std::collections::HashMap;

/// Something the resolver did that the rest of the server may care about.
#[derive(Debug, Clone, PartialEq)]
pub enum CombatEvent {
    PlayerDamaged {
        player: PlayerId,
        by: EnemyId,
        amount: f32,
    },
    PlayerKilled {
        player: PlayerId,
        by: EnemyId,
    },
    PetalBroken {
        player: PlayerId,
        petal: PetalId,
    },
    EnemyDamaged {
        enemy: EnemyId,
        by: PlayerId,
        amount: f32,
    },
    EnemyKilled {
        enemy: EnemyId,
        by: PlayerId,
        drop: ItemId,
    },
}

#[derive(Debug, Default)]
pub struct CombatResolver {
    /// Simulation time at which each (enemy, petal) pair may connect again.
    hit_cooldowns: HashMap<(EnemyId, PetalId), f64>,
}

impl CombatResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a strike decided by the behavior engine.
    pub fn apply_strike<R: Rng + ?Sized>(
        &mut self,
        store: &mut EntityStore,
        strike: &Strike,
        rng: &mut R,
    ) -> Vec<CombatEvent> {
        let mut events = Vec::new();

        if !store.enemy(strike.enemy).is_some_and(|e| e.is_alive()) {
            return events;
        }
        let Some(player) = store.player_mut(strike.target) else {
            return events;
        };
        if !player.is_alive() || player.is_protected() {
            return events;
        }

        damage_player(player, strike.enemy, strike.damage, &mut events);

        if strike.breaks_petal {
            let candidates: Vec<usize> = (0..HOTBAR_SLOTS)
                .filter(|&slot| player.hotbar[slot].as_ref().is_some_and(|p| p.is_active()))
                .collect();
            if !candidates.is_empty() {
                let slot = candidates[rng.gen_range(0..candidates.len())];
                if let Some(petal) = player.hotbar[slot].as_mut() {
                    petal.break_for(MINIBOSS_BREAK_SECONDS);
                    player.inventory_dirty = true;
                    events.push(CombatEvent::PetalBroken {
                        player: player.id,
                        petal: petal.id,
                    });
                }
            }
        }

        events
    }

    /// Contact damage from enemies that hurt by touch. An enemy whose
    /// cooldown has elapsed hits the first overlapping live player in id order.
    pub fn contact_pass(&mut self, store: &mut EntityStore, now: f64) -> Vec<CombatEvent> {
        let mut events = Vec::new();
        let player_ids = store.player_ids();

        for enemy_id in store.enemy_ids() {
            let Some(enemy) = store.enemy(enemy_id) else {
                continue;
            };
            let stats = enemy.stats();
            if !enemy.is_alive() || stats.contact_damage <= 0.0 || !enemy.attack_ready(now) {
                continue;
            }
            let (position, size) = (enemy.position, enemy.size);

            let victim = player_ids.iter().copied().find(|&id| {
                store.player(id).is_some_and(|p| {
                    p.is_alive()
                        && !p.is_protected()
                        && circles_overlap(&position, size, &p.position, PLAYER_RADIUS)
                })
            });

            if let Some(player) = victim.and_then(|id| store.player_mut(id)) {
                damage_player(player, enemy_id, stats.contact_damage, &mut events);
                if let Some(enemy) = store.enemy_mut(enemy_id) {
                    enemy.next_attack_at = now + stats.attack_cooldown as f64;
                }
            }
        }

        events
    }

    /// Every equipped, unbroken petal of every live player outside the safe
    /// zone hits whatever live enemy it overlaps at its orbit position.
    pub fn player_sweep(&mut self, store: &mut EntityStore, now: f64) -> Vec<CombatEvent> {
        let mut events = Vec::new();
        let enemies: Vec<(EnemyId, Vector2, f32)> = store
            .enemy_ids()
            .into_iter()
            .filter_map(|id| store.enemy(id))
            .filter(|e| e.is_alive())
            .map(|e| (e.id, e.position, e.size))
            .collect();
        if enemies.is_empty() {
            return events;
        }

        for player_id in store.player_ids() {
            for slot in 0..HOTBAR_SLOTS {
                let Some(petal_position) = store
                    .player(player_id)
                    .filter(|p| p.is_alive() && !p.is_protected())
                    .filter(|p| p.hotbar[slot].as_ref().is_some_and(|petal| petal.is_active()))
                    .map(|p| p.petal_position(slot))
                else {
                    continue;
                };

                for (enemy_id, position, size) in &enemies {
                    if circles_overlap(&petal_position, PETAL_RADIUS, position, *size) {
                        self.petal_hit(store, player_id, slot, *enemy_id, now, &mut events);
                    }
                }
            }
        }

        events
    }

    /// A player-initiated attack. With a target, only that enemy is hit;
    /// without one, every live enemy in reach is. Reach is the orbit radius
    /// plus the petal and enemy radii.
    pub fn attack(
        &mut self,
        store: &mut EntityStore,
        player_id: PlayerId,
        target: Option<EnemyId>,
        now: f64,
    ) -> Vec<CombatEvent> {
        let mut events = Vec::new();
        let Some(player) = store.player(player_id) else {
            return events;
        };
        if !player.is_alive() || player.is_protected() {
            return events;
        }
        let (origin, orbit_radius) = (player.position, player.orbit_radius);

        let in_reach: Vec<EnemyId> = store
            .enemy_ids()
            .into_iter()
            .filter(|id| target.map_or(true, |t| t == *id))
            .filter(|id| {
                store.enemy(*id).is_some_and(|e| {
                    e.is_alive()
                        && origin.distance(&e.position) <= orbit_radius + PETAL_RADIUS + e.size
                })
            })
            .collect();

        for enemy_id in in_reach {
            for slot in 0..HOTBAR_SLOTS {
                self.petal_hit(store, player_id, slot, enemy_id, now, &mut events);
            }
        }

        events
    }

    /// One petal connecting with one enemy, gated by the pair cooldown.
    fn petal_hit(
        &mut self,
        store: &mut EntityStore,
        player_id: PlayerId,
        slot: usize,
        enemy_id: EnemyId,
        now: f64,
        events: &mut Vec<CombatEvent>,
    ) {
        let Some(player) = store.player(player_id) else {
            return;
        };
        if !player.is_alive() || player.is_protected() {
            return;
        }
        let Some(petal) = player.hotbar.get(slot).and_then(Option::as_ref) else {
            return;
        };
        if !petal.is_active() {
            return;
        }
        let key = (enemy_id, petal.id);
        if self.hit_cooldowns.get(&key).is_some_and(|&ready_at| now < ready_at) {
            return;
        }
        let damage = petal.damage();

        let Some(enemy) = store.enemy_mut(enemy_id) else {
            return;
        };
        if !enemy.is_alive() {
            return;
        }
        let stats = enemy.stats();
        let killed = enemy.take_damage(damage);
        let (kind, last_position) = (enemy.kind, enemy.position);
        self.hit_cooldowns.insert(key, now + PETAL_HIT_COOLDOWN as f64);
        events.push(CombatEvent::EnemyDamaged {
            enemy: enemy_id,
            by: player_id,
            amount: damage,
        });

        if let Some(player) = store.player_mut(player_id) {
            if let Some(petal) = player.hotbar[slot].as_mut() {
                if petal.take_damage(stats.body_damage) {
                    let petal = petal.id;
                    player.inventory_dirty = true;
                    events.push(CombatEvent::PetalBroken {
                        player: player_id,
                        petal,
                    });
                }
            }
        }

        if killed {
            let (drop_kind, drop_tier) = kind.drop();
            let petal = store.new_petal(drop_kind, drop_tier);
            let drop = store.create_ground_item(petal, last_position, now);

            if let Some(player) = store.player_mut(player_id) {
                let gained = player.grant_rewards(stats.xp_reward, stats.currency_reward);
                if gained > 0 {
                    info!("Player {} reached level {}", player_id, player.level);
                }
            }
            debug!("Enemy {} ({:?}) killed by player {}", enemy_id, kind, player_id);
            events.push(CombatEvent::EnemyKilled {
                enemy: enemy_id,
                by: player_id,
                drop,
            });
        }
    }

    /// Counts down every broken petal, equipped or not.
    pub fn tick_petal_cooldowns(&mut self, store: &mut EntityStore, dt: f32) {
        for player in store.players_mut() {
            let mut restored = false;
            for petal in player.hotbar.iter_mut().flatten() {
                restored |= petal.tick_cooldown(dt);
            }
            for petal in player.inventory.iter_mut() {
                restored |= petal.tick_cooldown(dt);
            }
            if restored {
                player.inventory_dirty = true;
            }
        }
    }

    /// Forgets cooldowns that involve purged enemies or have already elapsed.
    pub fn prune(&mut self, purged: &[EnemyId], now: f64) {
        self.hit_cooldowns
            .retain(|(enemy, _), ready_at| *ready_at > now && !purged.contains(enemy));
    }

    pub fn tracked_cooldowns(&self) -> usize {
        self.hit_cooldowns.len()
    }
}

fn damage_player(
    player: &mut Player,
    by: EnemyId,
    amount: f32,
    events: &mut Vec<CombatEvent>,
) {
    let died = player.take_damage(amount);
    events.push(CombatEvent::PlayerDamaged {
        player: player.id,
        by,
        amount,
    });
    if died {
        info!("Player {} was killed by enemy {}", player.id, by);
        events.push(CombatEvent::PlayerKilled {
            player: player.id,
            by,
        });
    }
}
