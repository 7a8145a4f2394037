//! Trail particles emitted along a carrier's path (spec.md §3
//! `TrailParticle`, §4.3 "Trail particle lifecycle").

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::util::Vector3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrailParticle {
    pub position: Vector3,
    pub velocity: Vector3,
    pub age: f32,
    pub life_time: f32,
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
    pub alpha: f32,
    pub size: f32,
    pub is_dead: bool,
}

const GRAVITY_ACCEL: f32 = -30.0;
const DAMPING_PER_SECOND: f32 = 0.98;

impl TrailParticle {
    /// Spawns a trail particle biased opposite the carrier's direction of
    /// travel, plus a random spread (spec.md §4.3).
    pub fn spawn(
        position: Vector3,
        carrier_velocity: Vector3,
        life_time: f32,
        hue: f32,
        saturation: f32,
        lightness: f32,
        size: f32,
        rng: &mut impl Rng,
    ) -> Self {
        let backward = if carrier_velocity.length_squared() > f32::EPSILON {
            -carrier_velocity.normalize() * (carrier_velocity.length() * 0.3)
        } else {
            Vector3::ZERO
        };
        let spread = Vector3::new(
            rng.random_range(-3.0..3.0),
            rng.random_range(-3.0..3.0),
            rng.random_range(-3.0..3.0),
        );
        Self {
            position,
            velocity: backward + spread,
            age: 0.0,
            life_time,
            hue,
            saturation,
            lightness,
            alpha: 1.0,
            size,
            is_dead: false,
        }
    }

    pub fn update(&mut self, dt: f32) {
        if self.is_dead {
            return;
        }
        self.velocity.y += GRAVITY_ACCEL * dt;
        let damping = DAMPING_PER_SECOND.powf(dt);
        self.velocity *= damping;
        self.position += self.velocity * dt;
        self.age += dt;
        self.alpha = (1.0 - self.age / self.life_time.max(f32::EPSILON)).max(0.0);
        self.lightness = (self.lightness - 0.3 * dt / self.life_time.max(f32::EPSILON)).max(0.0);
        self.is_dead = self.age > self.life_time || self.alpha <= 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn alpha_decays_to_zero_at_end_of_life() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = TrailParticle::spawn(Vector3::ZERO, Vector3::new(0.0, 10.0, 0.0), 1.0, 30.0, 0.8, 0.6, 2.0, &mut rng);
        for _ in 0..200 {
            p.update(1.0 / 60.0);
        }
        assert!(p.is_dead);
        assert!(p.alpha <= 0.0);
    }
}
