//! Server-side entity representations.
//!
//! These structs carry everything the simulation needs, including timers and
//! bookkeeping that never leave the server. Clients only ever see the trimmed
//! `*View` types produced by the `view` methods.

use crate::physics::Vector2;
use shared::{
    in_safe_zone, player_max_hp, xp_to_next_level, EnemyId, EnemyKind, EnemyStats, EnemyView,
    GroundItemView, InventoryView, ItemId, PetalId, PetalKind, PetalView, PlayerId, PlayerView,
    DEFAULT_NAME, HOTBAR_SLOTS, ORBIT_RADIUS, ORBIT_SPEED, PETAL_REGEN_SECONDS, PLAYER_SPEED,
    RESPAWN_SECONDS,
};
use std::f32::consts::TAU;

pub type Hotbar = [Option<Petal>; HOTBAR_SLOTS];

/// One combat-capable inventory unit.
///
/// Follows a two-state cycle: Active, then Broken once its hp is gone or a
/// break effect lands, then Active again at full hp once `cooldown` has
/// counted down to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Petal {
    pub id: PetalId,
    pub kind: PetalKind,
    pub tier: u8,
    pub hp: f32,
    pub max_hp: f32,
    pub broken: bool,
    /// Seconds left until a broken petal is restored.
    pub cooldown: f32,
}

impl Petal {
    pub fn new(id: PetalId, kind: PetalKind, tier: u8) -> Self {
        let max_hp = kind.max_hp(tier);
        Self {
            id,
            kind,
            tier,
            hp: max_hp,
            max_hp,
            broken: false,
            cooldown: 0.0,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.broken
    }

    pub fn damage(&self) -> f32 {
        self.kind.damage(self.tier)
    }

    /// Applies damage to the petal. Returns true if this hit broke it.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.broken {
            return false;
        }
        self.hp = (self.hp - amount).max(0.0);
        if self.hp <= 0.0 {
            self.break_for(PETAL_REGEN_SECONDS);
            return true;
        }
        false
    }

    pub fn break_for(&mut self, seconds: f32) {
        self.broken = true;
        self.hp = 0.0;
        self.cooldown = seconds;
    }

    /// Counts down a broken petal. Returns true on the tick it is restored.
    pub fn tick_cooldown(&mut self, dt: f32) -> bool {
        if !self.broken {
            return false;
        }
        self.cooldown -= dt;
        if self.cooldown <= 0.0 {
            self.cooldown = 0.0;
            self.broken = false;
            self.hp = self.max_hp;
            return true;
        }
        false
    }

    pub fn view(&self) -> PetalView {
        PetalView {
            id: self.id,
            kind: self.kind,
            tier: self.tier,
            hp: self.hp,
            max_hp: self.max_hp,
            broken: self.broken,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Vector2,
    pub velocity: Vector2,
    pub speed: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub level: u32,
    pub xp: u32,
    pub currency: u32,
    pub dead: bool,
    /// Seconds until respawn, meaningful only while `dead`.
    pub respawn_timer: f32,
    pub hotbar: Hotbar,
    pub inventory: Vec<Petal>,
    pub orbit_radius: f32,
    /// Radians per second.
    pub orbit_speed: f32,
    pub orbit_angle: f32,
    pub in_safe_zone: bool,
    /// Set whenever the private inventory view changes and must be re-sent.
    pub inventory_dirty: bool,
}

impl Player {
    pub fn new(id: PlayerId, position: Vector2, hotbar: Hotbar) -> Self {
        let max_hp = player_max_hp(1);
        Self {
            id,
            name: DEFAULT_NAME.to_string(),
            position,
            velocity: Vector2::ZERO,
            speed: PLAYER_SPEED,
            hp: max_hp,
            max_hp,
            level: 1,
            xp: 0,
            currency: 0,
            dead: false,
            respawn_timer: 0.0,
            hotbar,
            inventory: Vec::new(),
            orbit_radius: ORBIT_RADIUS,
            orbit_speed: ORBIT_SPEED,
            orbit_angle: 0.0,
            in_safe_zone: in_safe_zone(position.x, position.y),
            inventory_dirty: true,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Applies damage and returns true if the player died from it.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.dead {
            return false;
        }
        self.hp = (self.hp - amount).max(0.0);
        if self.hp <= 0.0 {
            self.die();
            return true;
        }
        false
    }

    /// Marks the player dead. The spare inventory is lost; the hotbar is kept.
    pub fn die(&mut self) {
        self.dead = true;
        self.hp = 0.0;
        self.velocity = Vector2::ZERO;
        self.respawn_timer = RESPAWN_SECONDS;
        self.inventory.clear();
        self.inventory_dirty = true;
    }

    pub fn respawn(&mut self, position: Vector2) {
        self.dead = false;
        self.hp = self.max_hp;
        self.respawn_timer = 0.0;
        self.velocity = Vector2::ZERO;
        self.set_position(position);
    }

    /// Adds kill rewards and applies any level-ups. Returns the number of levels gained.
    pub fn grant_rewards(&mut self, xp: u32, currency: u32) -> u32 {
        self.xp = self.xp.saturating_add(xp);
        self.currency = self.currency.saturating_add(currency);
        self.inventory_dirty = true;

        let mut gained = 0;
        while self.xp >= xp_to_next_level(self.level) {
            self.xp -= xp_to_next_level(self.level);
            self.level += 1;
            gained += 1;
        }
        if gained > 0 {
            let new_max = player_max_hp(self.level);
            self.hp += new_max - self.max_hp;
            self.max_hp = new_max;
        }
        gained
    }

    /// World position of the petal orbiting in `slot`.
    pub fn petal_position(&self, slot: usize) -> Vector2 {
        let angle = self.orbit_angle + slot as f32 * TAU / HOTBAR_SLOTS as f32;
        self.position
            .add(&Vector2::from_angle(angle).scale(self.orbit_radius))
    }

    /// Safe-zone membership at the current position, never stale after a teleport.
    pub fn is_protected(&self) -> bool {
        in_safe_zone(self.position.x, self.position.y)
    }

    /// Moves the player and refreshes its safe-zone flag.
    pub fn set_position(&mut self, position: Vector2) {
        self.position = position;
        self.in_safe_zone = self.is_protected();
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            name: self.name.clone(),
            x: self.position.x,
            y: self.position.y,
            hp: self.hp,
            max_hp: self.max_hp,
            level: self.level,
            dead: self.dead,
            in_safe_zone: self.in_safe_zone,
            orbit_radius: self.orbit_radius,
            orbit_angle: self.orbit_angle,
            hotbar: self.hotbar.iter().map(|slot| slot.as_ref().map(Petal::view)).collect(),
        }
    }

    pub fn inventory_view(&self) -> InventoryView {
        InventoryView {
            hotbar: self.hotbar.iter().map(|slot| slot.as_ref().map(Petal::view)).collect(),
            inventory: self.inventory.iter().map(Petal::view).collect(),
            xp: self.xp,
            currency: self.currency,
            level: self.level,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EnemyId,
    pub kind: EnemyKind,
    pub position: Vector2,
    pub velocity: Vector2,
    pub hp: f32,
    pub max_hp: f32,
    pub size: f32,
    /// Simulation time at which the next strike or contact hit is allowed.
    pub next_attack_at: f64,
    pub dead: bool,
    /// Centre of the circular path, used by spinners.
    pub orbit_center: Vector2,
    pub orbit_angle: f32,
}

impl Enemy {
    pub fn new(id: EnemyId, kind: EnemyKind, position: Vector2) -> Self {
        let stats = kind.stats();
        Self {
            id,
            kind,
            position,
            velocity: Vector2::ZERO,
            hp: stats.max_hp,
            max_hp: stats.max_hp,
            size: stats.size,
            next_attack_at: 0.0,
            dead: false,
            orbit_center: position.sub(&Vector2::new(crate::behavior::SPINNER_ORBIT_RADIUS, 0.0)),
            orbit_angle: 0.0,
        }
    }

    pub fn stats(&self) -> EnemyStats {
        self.kind.stats()
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Applies damage and returns true if this hit killed the enemy.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.dead {
            return false;
        }
        self.hp = (self.hp - amount).max(0.0);
        if self.hp <= 0.0 {
            self.dead = true;
            self.velocity = Vector2::ZERO;
            return true;
        }
        false
    }

    pub fn attack_ready(&self, now: f64) -> bool {
        now >= self.next_attack_at
    }

    pub fn view(&self) -> EnemyView {
        EnemyView {
            id: self.id,
            kind: self.kind,
            x: self.position.x,
            y: self.position.y,
            hp: self.hp,
            max_hp: self.max_hp,
            size: self.size,
        }
    }
}

/// A petal lying on the ground where an enemy died.
#[derive(Debug, Clone)]
pub struct GroundItem {
    pub id: ItemId,
    pub petal: Petal,
    pub position: Vector2,
    pub dropped_at: f64,
}

impl GroundItem {
    pub fn view(&self) -> GroundItemView {
        GroundItemView {
            x: self.position.x,
            y: self.position.y,
            kind: self.petal.kind,
            tier: self.petal.tier,
        }
    }
}
