//! The downstream renderer interface (spec.md §6 "Downstream renderer
//! interface"): flat, `bytemuck`-castable snapshots of the mutable fields a
//! GPU renderer is allowed to read each frame.
//!
//! Grounded in the teacher's `Cargo.toml` (`bytemuck = { features =
//! ["derive"] }`), used there to cast particle buffers straight to GPU
//! upload bytes without a copy loop. `StreamParticle`/`TrailParticle`
//! themselves stay plain Rust structs (spec.md §3 fixes their field lists
//! exactly, and they carry fields like `is_dead`/`user_data` a renderer has
//! no business touching); this module is the narrow, read-only slice spec.md
//! §6 actually hands across the boundary.

use bytemuck::{Pod, Zeroable};

use crate::carrier::{CarrierInstance, TrailParticle};
use crate::stream::StreamParticle;

/// `{position(x,y,z), hue, saturation, lightness, alpha, size}` for one live
/// main or trail particle (spec.md §6).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RenderParticle {
    pub position: [f32; 3],
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
    pub alpha: f32,
    pub size: f32,
}

impl From<&StreamParticle> for RenderParticle {
    fn from(p: &StreamParticle) -> Self {
        Self {
            position: p.position.to_array(),
            hue: p.hue,
            saturation: p.saturation,
            lightness: p.lightness,
            alpha: p.alpha,
            size: p.size,
        }
    }
}

impl From<&TrailParticle> for RenderParticle {
    fn from(p: &TrailParticle) -> Self {
        Self {
            position: p.position.to_array(),
            hue: p.hue,
            saturation: p.saturation,
            lightness: p.lightness,
            alpha: p.alpha,
            size: p.size,
        }
    }
}

/// `{position, hue, shape_points?}` for one active carrier (spec.md §6).
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCarrier {
    pub position: [f32; 3],
    pub hue: f32,
    pub shape_points: Option<Vec<[f32; 3]>>,
}

impl From<&CarrierInstance> for RenderCarrier {
    fn from(c: &CarrierInstance) -> Self {
        Self {
            position: c.state.position.to_array(),
            hue: c.hue,
            shape_points: c.shape_points.as_ref().map(|pts| pts.iter().map(|p| p.to_array()).collect()),
        }
    }
}

/// Casts a slice of [`RenderParticle`] to raw bytes ready for a GPU upload
/// call, with no copy loop (the `bytemuck` pattern the teacher's stack is
/// built around).
pub fn particles_as_bytes(particles: &[RenderParticle]) -> &[u8] {
    bytemuck::cast_slice(particles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_particle_round_trips_through_bytes() {
        let particles = vec![
            RenderParticle { position: [1.0, 2.0, 3.0], hue: 30.0, saturation: 0.8, lightness: 0.6, alpha: 1.0, size: 2.5 },
            RenderParticle { position: [-1.0, 0.0, 5.0], hue: 200.0, saturation: 0.5, lightness: 0.4, alpha: 0.2, size: 1.0 },
        ];
        let bytes = particles_as_bytes(&particles);
        assert_eq!(bytes.len(), particles.len() * std::mem::size_of::<RenderParticle>());
        let back: &[RenderParticle] = bytemuck::cast_slice(bytes);
        assert_eq!(back, particles.as_slice());
    }
}
