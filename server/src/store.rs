//! Canonical ownership of every live entity.
//!
//! Players, enemies, ground items and petals each draw ids from their own
//! monotonically increasing counter, so an id is never handed out twice.
//! Lookups are keyed by id; removing an id that is already gone is a no-op.

use crate::entity::{Enemy, GroundItem, Hotbar, Petal, Player};
use crate::physics::Vector2;
use shared::{EnemyId, EnemyKind, ItemId, PetalId, PetalKind, PlayerId};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct EntityStore {
    players: HashMap<PlayerId, Player>,
    enemies: HashMap<EnemyId, Enemy>,
    items: HashMap<ItemId, GroundItem>,
    next_player_id: u64,
    next_enemy_id: u64,
    next_item_id: u64,
    next_petal_id: u64,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate_petal_id(&mut self) -> PetalId {
        self.next_petal_id += 1;
        PetalId(self.next_petal_id)
    }

    pub fn new_petal(&mut self, kind: PetalKind, tier: u8) -> Petal {
        let id = self.allocate_petal_id();
        Petal::new(id, kind, tier)
    }

    /// Creates a player with the default loadout: every hotbar slot holds a
    /// tier-1 basic petal.
    pub fn create_player(&mut self, position: Vector2) -> PlayerId {
        self.next_player_id += 1;
        let id = PlayerId(self.next_player_id);

        let hotbar: Hotbar = std::array::from_fn(|_| Some(self.new_petal(PetalKind::Basic, 1)));

        self.players.insert(id, Player::new(id, position, hotbar));
        id
    }

    pub fn create_enemy(&mut self, kind: EnemyKind, position: Vector2) -> EnemyId {
        self.next_enemy_id += 1;
        let id = EnemyId(self.next_enemy_id);
        self.enemies.insert(id, Enemy::new(id, kind, position));
        id
    }

    pub fn create_ground_item(&mut self, petal: Petal, position: Vector2, now: f64) -> ItemId {
        self.next_item_id += 1;
        let id = ItemId(self.next_item_id);
        self.items.insert(
            id,
            GroundItem {
                id,
                petal,
                position,
                dropped_at: now,
            },
        );
        id
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        self.players.remove(&id)
    }

    pub fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(&id)
    }

    pub fn enemy_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.enemies.get_mut(&id)
    }

    pub fn remove_enemy(&mut self, id: EnemyId) -> Option<Enemy> {
        self.enemies.remove(&id)
    }

    pub fn ground_item(&self, id: ItemId) -> Option<&GroundItem> {
        self.items.get(&id)
    }

    pub fn remove_ground_item(&mut self, id: ItemId) -> Option<GroundItem> {
        self.items.remove(&id)
    }

    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    pub fn enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.values()
    }

    pub fn ground_items(&self) -> impl Iterator<Item = &GroundItem> {
        self.items.values()
    }

    /// Player ids in ascending (arrival) order.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self.players.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Enemy ids in ascending (spawn) order.
    pub fn enemy_ids(&self) -> Vec<EnemyId> {
        let mut ids: Vec<EnemyId> = self.enemies.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn live_enemy_count(&self) -> usize {
        self.enemies.values().filter(|e| e.is_alive()).count()
    }

    /// Removes every enemy flagged dead and returns their ids.
    pub fn purge_dead_enemies(&mut self) -> Vec<EnemyId> {
        let dead: Vec<EnemyId> = self
            .enemies
            .values()
            .filter(|e| e.dead)
            .map(|e| e.id)
            .collect();
        for id in &dead {
            self.enemies.remove(id);
        }
        dead
    }

    /// Removes ground items dropped at or before `cutoff`.
    pub fn expire_ground_items(&mut self, cutoff: f64) -> usize {
        let before = self.items.len();
        self.items.retain(|_, item| item.dropped_at > cutoff);
        before - self.items.len()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    pub fn ground_item_count(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::HOTBAR_SLOTS;

    #[test]
    fn test_ids_are_monotonic_per_collection() {
        let mut store = EntityStore::new();
        let p1 = store.create_player(Vector2::ZERO);
        let p2 = store.create_player(Vector2::ZERO);
        let e1 = store.create_enemy(EnemyKind::Chaser, Vector2::ZERO);

        assert_eq!(p1, PlayerId(1));
        assert_eq!(p2, PlayerId(2));
        assert_eq!(e1, EnemyId(1));
        assert_eq!(store.player_count(), 2);
        assert_eq!(store.enemy_count(), 1);
    }

    #[test]
    fn test_ids_not_reused_after_removal() {
        let mut store = EntityStore::new();
        let p1 = store.create_player(Vector2::ZERO);
        assert!(store.remove_player(p1).is_some());
        let p2 = store.create_player(Vector2::ZERO);
        assert_ne!(p1, p2);

        let e1 = store.create_enemy(EnemyKind::Wanderer, Vector2::ZERO);
        store.remove_enemy(e1);
        let e2 = store.create_enemy(EnemyKind::Wanderer, Vector2::ZERO);
        assert_ne!(e1, e2);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut store = EntityStore::new();
        let keep = store.create_player(Vector2::new(10.0, 10.0));
        assert!(store.remove_player(PlayerId(999)).is_none());
        assert!(store.remove_enemy(EnemyId(999)).is_none());
        assert!(store.remove_ground_item(ItemId(999)).is_none());

        let p = store.create_player(Vector2::ZERO);
        assert!(store.remove_player(p).is_some());
        assert!(store.remove_player(p).is_none());
        assert!(store.player(keep).is_some());
    }

    #[test]
    fn test_default_loadout() {
        let mut store = EntityStore::new();
        let id = store.create_player(Vector2::ZERO);
        let player = store.player(id).unwrap();

        assert!(player.hotbar.iter().all(|slot| slot
            .as_ref()
            .is_some_and(|p| p.kind == PetalKind::Basic && p.tier == 1)));
        assert!(player.inventory.is_empty());

        // Every petal gets a distinct id.
        let mut ids: Vec<PetalId> = player.hotbar.iter().flatten().map(|p| p.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), HOTBAR_SLOTS);
    }

    #[test]
    fn test_sorted_id_listing() {
        let mut store = EntityStore::new();
        for _ in 0..20 {
            store.create_player(Vector2::ZERO);
            store.create_enemy(EnemyKind::Spinner, Vector2::ZERO);
        }
        let players = store.player_ids();
        assert!(players.windows(2).all(|w| w[0] < w[1]));
        let enemies = store.enemy_ids();
        assert!(enemies.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_purge_dead_enemies() {
        let mut store = EntityStore::new();
        let alive = store.create_enemy(EnemyKind::Wanderer, Vector2::ZERO);
        let doomed = store.create_enemy(EnemyKind::Wanderer, Vector2::ZERO);
        store.enemy_mut(doomed).unwrap().take_damage(1000.0);

        assert_eq!(store.live_enemy_count(), 1);
        assert_eq!(store.purge_dead_enemies(), vec![doomed]);
        assert!(store.enemy(doomed).is_none());
        assert!(store.enemy(alive).is_some());
        assert!(store.purge_dead_enemies().is_empty());
    }

    #[test]
    fn test_expire_ground_items() {
        let mut store = EntityStore::new();
        let old_petal = store.new_petal(PetalKind::Basic, 1);
        let new_petal = store.new_petal(PetalKind::Rock, 1);
        let old = store.create_ground_item(old_petal, Vector2::ZERO, 1.0);
        let fresh = store.create_ground_item(new_petal, Vector2::ZERO, 10.0);

        assert_eq!(store.expire_ground_items(5.0), 1);
        assert!(store.ground_item(old).is_none());
        assert!(store.ground_item(fresh).is_some());
    }
}
