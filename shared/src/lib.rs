//! Types shared between the arena server and its clients: world constants,
//! petal and enemy kinds, and the JSON wire protocol.

pub mod kinds;
pub mod protocol;

pub use kinds::{EnemyKind, EnemyStats, PetalKind};
pub use protocol::{
    ClientMessage, EnemyView, GroundItemView, InventoryAction, InventoryView, PetalRef, PetalView,
    PlayerView, ServerMessage, WorldSnapshot,
};

use serde::{Deserialize, Serialize};

pub const MAP_SIZE: f32 = 4000.0;
pub const SAFE_ZONE_X: f32 = MAP_SIZE / 2.0;
pub const SAFE_ZONE_Y: f32 = MAP_SIZE / 2.0;
pub const SAFE_ZONE_RADIUS: f32 = 300.0;

pub const PLAYER_RADIUS: f32 = 20.0;
pub const PLAYER_MAX_HP: f32 = 100.0;
pub const HP_PER_LEVEL: f32 = 10.0;
/// Units per second at full input deflection.
pub const PLAYER_SPEED: f32 = 200.0;
pub const ORBIT_RADIUS: f32 = 60.0;
/// Radians per second.
pub const ORBIT_SPEED: f32 = 2.5;
pub const RESPAWN_SECONDS: f32 = 5.0;

pub const HOTBAR_SLOTS: usize = 5;
pub const INVENTORY_CAP: usize = 50;
pub const MAX_TIER: u8 = 3;
pub const PETAL_RADIUS: f32 = 10.0;
pub const PETAL_REGEN_SECONDS: f32 = 3.0;
pub const MINIBOSS_BREAK_SECONDS: f32 = 5.0;
/// Minimum time between two hits of the same petal on the same enemy.
pub const PETAL_HIT_COOLDOWN: f32 = 0.5;
pub const PICKUP_RANGE: f32 = PLAYER_RADIUS + 30.0;

pub const MAX_NAME_LEN: usize = 15;
pub const DEFAULT_NAME: &str = "Unknown";

macro_rules! id_type {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub u64);

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

id_type!(
    /// Server-assigned player identity, opaque to clients.
    PlayerId,
    EnemyId,
    ItemId,
    /// Identity of a single petal instance, stable across equip/unequip and pickup.
    PetalId,
);

/// Cleans a client-supplied display name.
///
/// Keeps ASCII letters, digits, spaces, `-` and `_`, truncates to
/// [`MAX_NAME_LEN`] characters and trims surrounding whitespace. A name with
/// nothing left falls back to [`DEFAULT_NAME`].
pub fn sanitize_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .take(MAX_NAME_LEN)
        .collect();

    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Returns true if the point lies inside the no-combat circle.
pub fn in_safe_zone(x: f32, y: f32) -> bool {
    let dx = x - SAFE_ZONE_X;
    let dy = y - SAFE_ZONE_Y;
    dx * dx + dy * dy <= SAFE_ZONE_RADIUS * SAFE_ZONE_RADIUS
}

/// Max hp of a player at the given level.
pub fn player_max_hp(level: u32) -> f32 {
    PLAYER_MAX_HP + HP_PER_LEVEL * level.saturating_sub(1) as f32
}

/// Experience needed to advance from `level` to `level + 1`.
pub fn xp_to_next_level(level: u32) -> u32 {
    100 * level.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_allowed_characters() {
        assert_eq!(sanitize_name("Ada"), "Ada");
        assert_eq!(sanitize_name("cool_guy-99"), "cool_guy-99");
        assert_eq!(sanitize_name("two words"), "two words");
    }

    #[test]
    fn test_sanitize_strips_markup() {
        assert_eq!(sanitize_name("<b>Eve</b>"), "bEveb");
        assert_eq!(sanitize_name("héllo!"), "hllo");
    }

    #[test]
    fn test_sanitize_truncates() {
        let name = sanitize_name("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(name.len(), MAX_NAME_LEN);
        assert_eq!(name, "abcdefghijklmno");
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(sanitize_name(""), DEFAULT_NAME);
        assert_eq!(sanitize_name("   "), DEFAULT_NAME);
        assert_eq!(sanitize_name("!!!"), DEFAULT_NAME);
    }

    #[test]
    fn test_safe_zone_membership() {
        assert!(in_safe_zone(SAFE_ZONE_X, SAFE_ZONE_Y));
        assert!(in_safe_zone(SAFE_ZONE_X + SAFE_ZONE_RADIUS, SAFE_ZONE_Y));
        assert!(!in_safe_zone(SAFE_ZONE_X + SAFE_ZONE_RADIUS + 1.0, SAFE_ZONE_Y));
        assert!(!in_safe_zone(0.0, 0.0));
    }

    #[test]
    fn test_level_curve() {
        assert_eq!(player_max_hp(1), PLAYER_MAX_HP);
        assert_eq!(player_max_hp(3), PLAYER_MAX_HP + 2.0 * HP_PER_LEVEL);
        assert_eq!(xp_to_next_level(1), 100);
        assert_eq!(xp_to_next_level(4), 400);
    }

    #[test]
    fn test_id_serializes_as_number() {
        let json = serde_json::to_string(&PlayerId(7)).unwrap();
        assert_eq!(json, "7");
        let id: EnemyId = serde_json::from_str("12").unwrap();
        assert_eq!(id, EnemyId(12));
    }
}
