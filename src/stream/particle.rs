//! The per-particle data owned exclusively by a particle stream (spec.md §3
//! `StreamParticle`).

use crate::util::Vector3;

#[derive(Debug, Clone, Copy)]
pub struct StreamParticle {
    pub id: u64,
    pub position: Vector3,
    pub velocity: Vector3,
    pub acceleration: Vector3,
    pub mass: f32,
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
    pub alpha: f32,
    pub size: f32,
    pub temperature: f32,
    pub age: f32,
    pub life_time: f32,
    pub stage_age: f32,
    pub is_dead: bool,
    pub target_position: Vector3,
    pub origin_position: Vector3,
    pub morph_progress: f32,
    pub is_morphing: bool,
    /// Opaque host payload (spec.md §3); unused by the engine itself.
    pub user_data: u64,
}

impl Default for StreamParticle {
    fn default() -> Self {
        Self {
            id: 0,
            position: Vector3::ZERO,
            velocity: Vector3::ZERO,
            acceleration: Vector3::ZERO,
            mass: 1.0,
            hue: 0.0,
            saturation: 0.0,
            lightness: 1.0,
            alpha: 0.0,
            size: 1.0,
            temperature: 0.0,
            age: 0.0,
            life_time: 1.0,
            stage_age: 0.0,
            is_dead: true,
            target_position: Vector3::ZERO,
            origin_position: Vector3::ZERO,
            morph_progress: 0.0,
            is_morphing: false,
            user_data: 0,
        }
    }
}
