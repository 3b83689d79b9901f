use crate::physics::Vector2;
use rand::Rng;
use shared::MAP_SIZE;

/// Uniformly random point on the map
pub fn random_map_position<R: Rng + ?Sized>(rng: &mut R) -> Vector2 {
    Vector2::new(rng.gen_range(0.0..=MAP_SIZE), rng.gen_range(0.0..=MAP_SIZE))
}

/// Clamps a movement intent to unit length. Non-finite input yields zero.
pub fn clamp_unit(x: f32, y: f32) -> Vector2 {
    let intent = Vector2::new(x, y);
    if !intent.is_finite() {
        return Vector2::ZERO;
    }
    intent.clamp_length(1.0)
}
