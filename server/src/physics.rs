use shared::MAP_SIZE;

///Represents a vector in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    ///Value along the x-axis.
    pub x: f32,
    ///Value along the y-axis.
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Vector2 { x, y }
    }

    ///Returns the unit vector at the given angle in radians.
    pub fn from_angle(angle: f32) -> Self {
        Vector2 {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    ///Returns the magnitude of the vector.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    ///Returns the normalized vector.
    pub fn normalize(&self) -> Vector2 {
        let mag = self.magnitude();
        if mag == 0.0 {
            Vector2::ZERO
        } else {
            Vector2 {
                x: self.x / mag,
                y: self.y / mag,
            }
        }
    }

    ///Returns the scaled vector.
    pub fn scale(&self, scalar: f32) -> Vector2 {
        Vector2 {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    ///Returns the sum of two vectors.
    pub fn add(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    ///Returns the difference `self - other`.
    pub fn sub(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    pub fn distance(&self, other: &Vector2) -> f32 {
        self.sub(other).magnitude()
    }

    ///Shortens the vector to at most `max` length, keeping its direction.
    pub fn clamp_length(&self, max: f32) -> Vector2 {
        let mag = self.magnitude();
        if mag > max {
            self.normalize().scale(max)
        } else {
            *self
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    ///Clamps the point into the map square.
    pub fn clamp_to_map(&self) -> Vector2 {
        Vector2 {
            x: self.x.clamp(0.0, MAP_SIZE),
            y: self.y.clamp(0.0, MAP_SIZE),
        }
    }
}

///Returns true if two circles overlap.
pub fn circles_overlap(a: &Vector2, radius_a: f32, b: &Vector2, radius_b: f32) -> bool {
    let reach = radius_a + radius_b;
    let d = a.sub(b);
    d.x * d.x + d.y * d.y < reach * reach
}
