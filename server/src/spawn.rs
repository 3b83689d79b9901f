//! Population control for hostile entities.
//!
//! The director keeps two accumulators of simulated time: one for the spawn
//! cycle and one for the purge sweep. Both fire on their own period, however
//! the tick rate divides into it.

use crate::config::GameConfig;
use crate::store::EntityStore;
use crate::utils::random_map_position;
use log::{debug, info};
use rand::Rng;
use shared::{EnemyId, EnemyKind};

/// What a purge sweep removed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Purge {
    pub dead_enemies: Vec<EnemyId>,
    pub expired_items: usize,
}

#[derive(Debug, Default)]
pub struct SpawnDirector {
    spawn_elapsed: f32,
    purge_elapsed: f32,
}

impl SpawnDirector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the spawn clock and runs every spawn cycle that came due.
    /// Returns the ids of enemies created.
    pub fn spawn_due<R: Rng + ?Sized>(
        &mut self,
        store: &mut EntityStore,
        config: &GameConfig,
        rng: &mut R,
        dt: f32,
    ) -> Vec<EnemyId> {
        let mut spawned = Vec::new();
        if config.spawn_interval <= 0.0 {
            return spawned;
        }

        self.spawn_elapsed += dt;
        while self.spawn_elapsed >= config.spawn_interval {
            self.spawn_elapsed -= config.spawn_interval;
            spawned.extend(self.spawn_cycle(store, config, rng));
        }
        spawned
    }

    /// One spawn cycle: a regular enemy if below the cap, plus a rare miniboss
    /// that ignores the cap.
    pub fn spawn_cycle<R: Rng + ?Sized>(
        &mut self,
        store: &mut EntityStore,
        config: &GameConfig,
        rng: &mut R,
    ) -> Vec<EnemyId> {
        let mut spawned = Vec::new();

        if store.live_enemy_count() < config.enemy_cap {
            let kind = EnemyKind::STANDARD[rng.gen_range(0..EnemyKind::STANDARD.len())];
            let position = random_map_position(rng);
            let id = store.create_enemy(kind, position);
            debug!("Spawned {:?} {} at ({:.0}, {:.0})", kind, id, position.x, position.y);
            spawned.push(id);
        }

        if config.miniboss_chance > 0.0 && rng.gen_bool(config.miniboss_chance.min(1.0)) {
            let position = random_map_position(rng);
            let id = store.create_enemy(EnemyKind::Miniboss, position);
            info!("Miniboss {} spawned at ({:.0}, {:.0})", id, position.x, position.y);
            spawned.push(id);
        }

        spawned
    }

    /// Advances the purge clock. When the sweep comes due, removes dead
    /// enemies and expires ground items older than the configured lifetime.
    pub fn purge_due(
        &mut self,
        store: &mut EntityStore,
        config: &GameConfig,
        now: f64,
        dt: f32,
    ) -> Option<Purge> {
        self.purge_elapsed += dt;
        if self.purge_elapsed < config.purge_interval {
            return None;
        }
        self.purge_elapsed = 0.0;

        let purge = Purge {
            dead_enemies: store.purge_dead_enemies(),
            expired_items: store.expire_ground_items(now - config.ground_item_lifetime),
        };
        if !purge.dead_enemies.is_empty() || purge.expired_items > 0 {
            debug!(
                "Purged {} dead enemies and {} expired items",
                purge.dead_enemies.len(),
                purge.expired_items
            );
        }
        Some(purge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::Vector2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::{PetalKind, MAP_SIZE};

    const DT: f32 = 0.05;

    fn no_boss() -> GameConfig {
        GameConfig {
            miniboss_chance: 0.0,
            ..GameConfig::default()
        }
    }

    #[test]
    fn test_spawns_once_per_interval() {
        let mut store = EntityStore::new();
        let mut director = SpawnDirector::new();
        let mut rng = StdRng::seed_from_u64(1);
        let config = no_boss();

        let mut total = 0;
        // 2.5 seconds of ticks
        for _ in 0..50 {
            total += director.spawn_due(&mut store, &config, &mut rng, DT).len();
        }
        assert_eq!(total, 2);
        assert_eq!(store.enemy_count(), 2);
    }

    #[test]
    fn test_regular_spawns_respect_cap() {
        let mut store = EntityStore::new();
        let mut director = SpawnDirector::new();
        let mut rng = StdRng::seed_from_u64(2);
        let config = GameConfig {
            enemy_cap: 3,
            ..no_boss()
        };

        for _ in 0..10 {
            director.spawn_cycle(&mut store, &config, &mut rng);
        }
        assert_eq!(store.live_enemy_count(), 3);
        assert!(store
            .enemies()
            .all(|e| EnemyKind::STANDARD.contains(&e.kind)));
    }

    #[test]
    fn test_dead_enemies_free_cap_room() {
        let mut store = EntityStore::new();
        let mut director = SpawnDirector::new();
        let mut rng = StdRng::seed_from_u64(3);
        let config = GameConfig {
            enemy_cap: 1,
            ..no_boss()
        };

        let first = director.spawn_cycle(&mut store, &config, &mut rng);
        assert_eq!(first.len(), 1);
        assert!(director.spawn_cycle(&mut store, &config, &mut rng).is_empty());

        store.enemy_mut(first[0]).unwrap().take_damage(10_000.0);
        assert_eq!(director.spawn_cycle(&mut store, &config, &mut rng).len(), 1);
    }

    #[test]
    fn test_miniboss_ignores_cap() {
        let mut store = EntityStore::new();
        let mut director = SpawnDirector::new();
        let mut rng = StdRng::seed_from_u64(4);
        let config = GameConfig {
            enemy_cap: 0,
            miniboss_chance: 1.0,
            ..GameConfig::default()
        };

        let spawned = director.spawn_cycle(&mut store, &config, &mut rng);
        assert_eq!(spawned.len(), 1);
        assert_eq!(store.enemy(spawned[0]).unwrap().kind, EnemyKind::Miniboss);
    }

    #[test]
    fn test_spawn_positions_on_map() {
        let mut store = EntityStore::new();
        let mut director = SpawnDirector::new();
        let mut rng = StdRng::seed_from_u64(5);
        let config = GameConfig {
            enemy_cap: 200,
            miniboss_chance: 0.5,
            ..GameConfig::default()
        };

        for _ in 0..100 {
            director.spawn_cycle(&mut store, &config, &mut rng);
        }
        for enemy in store.enemies() {
            assert!((0.0..=MAP_SIZE).contains(&enemy.position.x));
            assert!((0.0..=MAP_SIZE).contains(&enemy.position.y));
        }
    }

    #[test]
    fn test_purge_runs_on_its_own_cadence() {
        let mut store = EntityStore::new();
        let mut director = SpawnDirector::new();
        let config = GameConfig::without_spawning();

        let doomed = store.create_enemy(EnemyKind::Wanderer, Vector2::new(10.0, 10.0));
        store.enemy_mut(doomed).unwrap().take_damage(10_000.0);

        let mut now = 0.0;
        let mut purges = Vec::new();
        // 5.5 seconds: exactly one sweep
        for _ in 0..110 {
            now += DT as f64;
            if let Some(purge) = director.purge_due(&mut store, &config, now, DT) {
                purges.push(purge);
            }
        }
        assert_eq!(purges.len(), 1);
        assert_eq!(purges[0].dead_enemies, vec![doomed]);
        assert!(store.enemy(doomed).is_none());
    }

    #[test]
    fn test_purge_expires_old_ground_items() {
        let mut store = EntityStore::new();
        let mut director = SpawnDirector::new();
        let config = GameConfig {
            purge_interval: 0.0,
            ..GameConfig::without_spawning()
        };

        let old = store.new_petal(PetalKind::Basic, 1);
        let old_id = store.create_ground_item(old, Vector2::ZERO, 0.0);
        let fresh = store.new_petal(PetalKind::Basic, 1);
        let fresh_id = store.create_ground_item(fresh, Vector2::ZERO, 30.0);

        let purge = director.purge_due(&mut store, &config, 61.0, DT).unwrap();
        assert_eq!(purge.expired_items, 1);
        assert!(store.ground_item(old_id).is_none());
        assert!(store.ground_item(fresh_id).is_some());
    }

    #[test]
    fn test_same_seed_same_population() {
        let run = || {
            let mut store = EntityStore::new();
            let mut director = SpawnDirector::new();
            let mut rng = StdRng::seed_from_u64(99);
            let config = GameConfig {
                miniboss_chance: 0.3,
                ..GameConfig::default()
            };
            for _ in 0..20 {
                director.spawn_cycle(&mut store, &config, &mut rng);
            }
            store
                .enemy_ids()
                .into_iter()
                .filter_map(|id| store.enemy(id).map(|e| (e.kind, e.position)))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
