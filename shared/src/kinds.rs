use serde::{Deserialize, Serialize};

/// The type of a petal. Every kind scales its hp and damage linearly with tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetalKind {
    Basic,
    Rock,
    Stinger,
    Light,
}

impl PetalKind {
    pub const ALL: [PetalKind; 4] = [
        PetalKind::Basic,
        PetalKind::Rock,
        PetalKind::Stinger,
        PetalKind::Light,
    ];

    pub fn base_hp(self) -> f32 {
        match self {
            PetalKind::Basic => 10.0,
            PetalKind::Rock => 25.0,
            PetalKind::Stinger => 5.0,
            PetalKind::Light => 8.0,
        }
    }

    pub fn base_damage(self) -> f32 {
        match self {
            PetalKind::Basic => 10.0,
            PetalKind::Rock => 6.0,
            PetalKind::Stinger => 25.0,
            PetalKind::Light => 7.0,
        }
    }

    pub fn max_hp(self, tier: u8) -> f32 {
        self.base_hp() * tier as f32
    }

    pub fn damage(self, tier: u8) -> f32 {
        self.base_damage() * tier as f32
    }
}

/// Behavior tag of a hostile entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    Wanderer,
    Chaser,
    Spinner,
    Miniboss,
}

/// Fixed per-kind tuning values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub max_hp: f32,
    /// Collision radius.
    pub size: f32,
    /// Damage of a direct strike.
    pub damage: f32,
    /// Damage dealt by touching a player, zero for kinds without contact damage.
    pub contact_damage: f32,
    /// Units per second.
    pub speed: f32,
    pub strike_radius: f32,
    /// Seconds between two strikes or contact hits.
    pub attack_cooldown: f32,
    /// Damage a petal takes when it hits this enemy.
    pub body_damage: f32,
    pub xp_reward: u32,
    pub currency_reward: u32,
}

impl EnemyKind {
    /// Kinds the spawner picks from on a regular spawn cycle.
    pub const STANDARD: [EnemyKind; 3] = [EnemyKind::Wanderer, EnemyKind::Chaser, EnemyKind::Spinner];

    pub fn stats(self) -> EnemyStats {
        match self {
            EnemyKind::Wanderer => EnemyStats {
                max_hp: 50.0,
                size: 20.0,
                damage: 0.0,
                contact_damage: 0.0,
                speed: 0.0,
                strike_radius: 0.0,
                attack_cooldown: 0.0,
                body_damage: 2.0,
                xp_reward: 10,
                currency_reward: 1,
            },
            EnemyKind::Chaser => EnemyStats {
                max_hp: 80.0,
                size: 18.0,
                damage: 15.0,
                contact_damage: 0.0,
                speed: 120.0,
                strike_radius: 30.0,
                attack_cooldown: 1.0,
                body_damage: 4.0,
                xp_reward: 20,
                currency_reward: 3,
            },
            EnemyKind::Spinner => EnemyStats {
                max_hp: 60.0,
                size: 22.0,
                damage: 0.0,
                contact_damage: 5.0,
                speed: 0.0,
                strike_radius: 0.0,
                attack_cooldown: 1.0,
                body_damage: 6.0,
                xp_reward: 15,
                currency_reward: 2,
            },
            EnemyKind::Miniboss => EnemyStats {
                max_hp: 600.0,
                size: 45.0,
                damage: 20.0,
                contact_damage: 0.0,
                speed: 60.0,
                strike_radius: 50.0,
                attack_cooldown: 2.0,
                body_damage: 10.0,
                xp_reward: 200,
                currency_reward: 50,
            },
        }
    }

    /// The petal left on the ground when an enemy of this kind dies.
    pub fn drop(self) -> (PetalKind, u8) {
        match self {
            EnemyKind::Wanderer => (PetalKind::Basic, 1),
            EnemyKind::Chaser => (PetalKind::Stinger, 1),
            EnemyKind::Spinner => (PetalKind::Rock, 1),
            EnemyKind::Miniboss => (PetalKind::Light, 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_petal_scales_with_tier() {
        for kind in PetalKind::ALL {
            assert_eq!(kind.max_hp(1), kind.base_hp());
            assert_eq!(kind.max_hp(3), kind.base_hp() * 3.0);
            assert_eq!(kind.damage(2), kind.base_damage() * 2.0);
        }
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(serde_json::to_string(&PetalKind::Stinger).unwrap(), "\"stinger\"");
        assert_eq!(serde_json::to_string(&EnemyKind::Miniboss).unwrap(), "\"miniboss\"");
        let kind: EnemyKind = serde_json::from_str("\"chaser\"").unwrap();
        assert_eq!(kind, EnemyKind::Chaser);
    }

    #[test]
    fn test_only_spinner_has_contact_damage() {
        for kind in [EnemyKind::Wanderer, EnemyKind::Chaser, EnemyKind::Spinner, EnemyKind::Miniboss] {
            let stats = kind.stats();
            assert_eq!(stats.contact_damage > 0.0, kind == EnemyKind::Spinner);
            assert!(stats.max_hp > 0.0);
            assert!(stats.size > 0.0);
        }
    }

    #[test]
    fn test_miniboss_is_the_stronger_chaser() {
        let chaser = EnemyKind::Chaser.stats();
        let boss = EnemyKind::Miniboss.stats();
        assert!(boss.speed < chaser.speed);
        assert!(boss.strike_radius > chaser.strike_radius);
        assert!(boss.attack_cooldown > chaser.attack_cooldown);
    }
}
