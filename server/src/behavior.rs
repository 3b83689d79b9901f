//! Per-tick motion and attack decisions for hostile entities.
//!
//! [`advance`] is a pure function of the enemy, the live players and the
//! clock. The only randomness is the wanderer's jitter, drawn from the
//! caller's RNG, so a seeded world replays identically.

use crate::entity::Enemy;
use crate::physics::Vector2;
use rand::Rng;
use shared::{EnemyId, EnemyKind, EnemyStats, PlayerId};

/// Max random velocity change per axis per tick, units per second.
pub const WANDER_JITTER: f32 = 20.0;
/// Velocity multiplier applied to wanderers every tick.
pub const WANDER_FRICTION: f32 = 0.9;
pub const SPINNER_ORBIT_RADIUS: f32 = 100.0;
/// Radians per second.
pub const SPINNER_ANGULAR_SPEED: f32 = 1.0;

/// A live player an enemy may target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub id: PlayerId,
    pub position: Vector2,
}

/// A direct attack from an enemy on a player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike {
    pub enemy: EnemyId,
    pub target: PlayerId,
    pub damage: f32,
    /// Also break one of the target's equipped petals.
    pub breaks_petal: bool,
}

/// The outcome of one tick of behavior for one enemy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub velocity: Vector2,
    pub position: Vector2,
    pub orbit_angle: f32,
    pub next_attack_at: f64,
    pub strike: Option<Strike>,
}

impl Decision {
    fn hold(enemy: &Enemy) -> Self {
        Decision {
            velocity: Vector2::ZERO,
            position: enemy.position,
            orbit_angle: enemy.orbit_angle,
            next_attack_at: enemy.next_attack_at,
            strike: None,
        }
    }

    /// Writes the motion back into the enemy and hands out the strike, if any.
    pub fn apply(self, enemy: &mut Enemy) -> Option<Strike> {
        enemy.velocity = self.velocity;
        enemy.position = self.position;
        enemy.orbit_angle = self.orbit_angle;
        enemy.next_attack_at = self.next_attack_at;
        self.strike
    }
}

/// Computes the next motion and attack of a live enemy.
///
/// `targets` must contain only live players, in ascending id order.
pub fn advance<R: Rng + ?Sized>(
    enemy: &Enemy,
    targets: &[Target],
    now: f64,
    dt: f32,
    rng: &mut R,
) -> Decision {
    if enemy.dead {
        return Decision::hold(enemy);
    }

    let stats = enemy.stats();
    match enemy.kind {
        EnemyKind::Wanderer => wander(enemy, dt, rng),
        EnemyKind::Spinner => spin(enemy, dt),
        EnemyKind::Chaser => chase(enemy, &stats, targets, now, dt, false),
        EnemyKind::Miniboss => chase(enemy, &stats, targets, now, dt, true),
    }
}

/// Finds the strictly nearest target. On a tie the earlier entry wins.
pub fn nearest_target(from: &Vector2, targets: &[Target]) -> Option<(Target, f32)> {
    let mut best: Option<(Target, f32)> = None;
    for target in targets {
        let distance = from.distance(&target.position);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((*target, distance)),
        }
    }
    best
}

fn wander<R: Rng + ?Sized>(enemy: &Enemy, dt: f32, rng: &mut R) -> Decision {
    let jitter = Vector2::new(
        rng.gen_range(-WANDER_JITTER..=WANDER_JITTER),
        rng.gen_range(-WANDER_JITTER..=WANDER_JITTER),
    );
    let velocity = enemy.velocity.add(&jitter).scale(WANDER_FRICTION);
    Decision {
        velocity,
        position: enemy.position.add(&velocity.scale(dt)).clamp_to_map(),
        ..Decision::hold(enemy)
    }
}

fn spin(enemy: &Enemy, dt: f32) -> Decision {
    let orbit_angle = enemy.orbit_angle + SPINNER_ANGULAR_SPEED * dt;
    let position = enemy
        .orbit_center
        .add(&Vector2::from_angle(orbit_angle).scale(SPINNER_ORBIT_RADIUS))
        .clamp_to_map();
    let velocity = if dt > 0.0 {
        position.sub(&enemy.position).scale(1.0 / dt)
    } else {
        Vector2::ZERO
    };
    Decision {
        velocity,
        position,
        orbit_angle,
        ..Decision::hold(enemy)
    }
}

fn chase(
    enemy: &Enemy,
    stats: &EnemyStats,
    targets: &[Target],
    now: f64,
    dt: f32,
    breaks_petal: bool,
) -> Decision {
    let Some((target, distance)) = nearest_target(&enemy.position, targets) else {
        return Decision::hold(enemy);
    };

    let mut decision = Decision::hold(enemy);

    // Strike decisions use the distance at the start of the tick.
    if distance <= stats.strike_radius && enemy.attack_ready(now) {
        decision.strike = Some(Strike {
            enemy: enemy.id,
            target: target.id,
            damage: stats.damage,
            breaks_petal,
        });
        decision.next_attack_at = now + stats.attack_cooldown as f64;
    }

    // Close in, but stop inside the strike radius instead of stacking on the target.
    let direction = target.position.sub(&enemy.position).normalize();
    let step = (stats.speed * dt).min((distance - stats.strike_radius * 0.5).max(0.0));
    decision.velocity = direction.scale(stats.speed);
    decision.position = enemy.position.add(&direction.scale(step)).clamp_to_map();
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f32 = 0.05;

    fn enemy(kind: EnemyKind, x: f32, y: f32) -> Enemy {
        Enemy::new(EnemyId(1), kind, Vector2::new(x, y))
    }

    fn target(id: u64, x: f32, y: f32) -> Target {
        Target {
            id: PlayerId(id),
            position: Vector2::new(x, y),
        }
    }

    #[test]
    fn test_nearest_target_prefers_earlier_on_tie() {
        let origin = Vector2::new(0.0, 0.0);
        let targets = [target(1, 10.0, 0.0), target(2, 0.0, 10.0), target(3, 5.0, 0.0)];
        let (nearest, distance) = nearest_target(&origin, &targets).unwrap();
        assert_eq!(nearest.id, PlayerId(3));
        assert_approx_eq!(distance, 5.0);

        let tied = [target(4, 10.0, 0.0), target(5, -10.0, 0.0)];
        assert_eq!(nearest_target(&origin, &tied).unwrap().0.id, PlayerId(4));
        assert!(nearest_target(&origin, &[]).is_none());
    }

    #[test]
    fn test_chaser_strikes_within_radius() {
        let mut rng = StdRng::seed_from_u64(1);
        let chaser = enemy(EnemyKind::Chaser, 525.0, 500.0);
        let decision = advance(&chaser, &[target(1, 500.0, 500.0)], 10.0, DT, &mut rng);

        let strike = decision.strike.expect("chaser should strike");
        assert_eq!(strike.target, PlayerId(1));
        assert_eq!(strike.damage, 15.0);
        assert!(!strike.breaks_petal);
        assert_eq!(decision.next_attack_at, 11.0);
    }

    #[test]
    fn test_chaser_respects_cooldown() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut chaser = enemy(EnemyKind::Chaser, 520.0, 500.0);
        chaser.next_attack_at = 10.5;
        let decision = advance(&chaser, &[target(1, 500.0, 500.0)], 10.0, DT, &mut rng);
        assert!(decision.strike.is_none());
        assert_eq!(decision.next_attack_at, 10.5);
    }

    #[test]
    fn test_chaser_moves_toward_nearest() {
        let mut rng = StdRng::seed_from_u64(1);
        let chaser = enemy(EnemyKind::Chaser, 1000.0, 1000.0);
        let targets = [target(1, 1000.0, 1500.0), target(2, 1200.0, 1000.0)];
        let decision = advance(&chaser, &targets, 0.0, DT, &mut rng);

        assert!(decision.strike.is_none());
        assert_approx_eq!(decision.position.x, 1000.0 + 120.0 * DT, 1e-3);
        assert_approx_eq!(decision.position.y, 1000.0, 1e-3);
        assert_approx_eq!(decision.velocity.magnitude(), 120.0, 1e-3);
    }

    #[test]
    fn test_chaser_idles_without_targets() {
        let mut rng = StdRng::seed_from_u64(1);
        let chaser = enemy(EnemyKind::Chaser, 100.0, 100.0);
        let decision = advance(&chaser, &[], 0.0, DT, &mut rng);
        assert_eq!(decision.position, chaser.position);
        assert_eq!(decision.velocity, Vector2::ZERO);
        assert!(decision.strike.is_none());
    }

    #[test]
    fn test_miniboss_strike_breaks_petal() {
        let mut rng = StdRng::seed_from_u64(1);
        let boss = enemy(EnemyKind::Miniboss, 540.0, 500.0);
        let decision = advance(&boss, &[target(7, 500.0, 500.0)], 3.0, DT, &mut rng);

        let strike = decision.strike.expect("miniboss should strike at 40 units");
        assert!(strike.breaks_petal);
        assert_eq!(strike.target, PlayerId(7));
        assert_eq!(decision.next_attack_at, 5.0);
    }

    #[test]
    fn test_spinner_orbits_and_never_strikes() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut spinner = enemy(EnemyKind::Spinner, 1000.0, 1000.0);
        let center = spinner.orbit_center;
        let mut last_angle = spinner.orbit_angle;

        for _ in 0..50 {
            let decision = advance(&spinner, &[target(1, 1000.0, 1000.0)], 0.0, DT, &mut rng);
            assert!(decision.strike.is_none());
            assert!(decision.orbit_angle > last_angle);
            last_angle = decision.orbit_angle;
            decision.apply(&mut spinner);
            assert_approx_eq!(spinner.position.distance(&center), SPINNER_ORBIT_RADIUS, 1e-2);
        }
    }

    #[test]
    fn test_wanderer_is_reproducible_with_same_seed() {
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut wanderer = enemy(EnemyKind::Wanderer, 2000.0, 2000.0);
            for _ in 0..100 {
                let decision = advance(&wanderer, &[], 0.0, DT, &mut rng);
                assert!(decision.strike.is_none());
                decision.apply(&mut wanderer);
            }
            wanderer.position
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_wanderer_velocity_is_damped() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut wanderer = enemy(EnemyKind::Wanderer, 2000.0, 2000.0);
        wanderer.velocity = Vector2::new(1000.0, 0.0);
        let decision = advance(&wanderer, &[], 0.0, DT, &mut rng);
        assert!(decision.velocity.x <= (1000.0 + WANDER_JITTER) * WANDER_FRICTION);
        assert!(decision.velocity.x >= (1000.0 - WANDER_JITTER) * WANDER_FRICTION);
    }

    #[test]
    fn test_positions_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut wanderer = enemy(EnemyKind::Wanderer, 0.0, 0.0);
        wanderer.velocity = Vector2::new(-500.0, -500.0);
        let decision = advance(&wanderer, &[], 0.0, DT, &mut rng);
        assert!(decision.position.x >= 0.0 && decision.position.y >= 0.0);
    }
}
