use serde::{Deserialize, Serialize};

use crate::util::{Curve, Vector3};

use super::noise::Perlin;

/// A single force field, tagged by kind (spec.md §3 `ForceField`).
///
/// Each variant carries only the fields its formula actually uses; `enabled`
/// is shared by every variant the way spec.md describes it, and a disabled
/// field always contributes zero (spec.md §4.1 "Failure semantics").
///
/// `#[serde(tag = "type", rename_all = "snake_case")]` makes this the same
/// flat, lowercase-tagged shape as `manifest.rs`'s other tagged enums
/// (`TransitionMode`, `PathType`, …) and the one spec.md §6 calls
/// authoritative: `{"type": "gravity", "strength": …, "direction": …}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ForceFieldKind {
    Gravity { strength: f32, direction: Vector3 },
    Wind { strength: f32, direction: Vector3 },
    Drag { strength: f32 },
    Attraction { strength: f32, center: Vector3, radius: f32, falloff: Option<Curve> },
    Repulsion { strength: f32, center: Vector3, radius: f32, falloff: Option<Curve> },
    Vortex { strength: f32, center: Vector3, radius: Option<f32> },
    Turbulence { strength: f32, noise_frequency: f32, noise_amplitude: f32 },
    CurlNoise { strength: f32, noise_frequency: f32, noise_amplitude: f32 },
    Breathe { strength: f32, center: Vector3, noise_frequency: f32, noise_amplitude: f32 },
    WingFlap { strength: f32, center: Vector3, noise_frequency: f32, noise_amplitude: f32 },
    Noise { strength: f32, noise_frequency: f32, noise_amplitude: f32 },
}

/// `kind` is `#[serde(flatten)]`ed so the `type` tag and its sibling fields
/// sit alongside `enabled` at the top level, matching the flat manifest
/// shape spec.md §3/§6 describe — not nested under a `kind` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceField {
    #[serde(flatten)]
    pub kind: ForceFieldKind,
    pub enabled: bool,
}

impl ForceField {
    pub fn gravity(strength: f32, direction: Vector3) -> Self {
        Self { kind: ForceFieldKind::Gravity { strength, direction }, enabled: true }
    }

    pub fn drag(strength: f32) -> Self {
        Self { kind: ForceFieldKind::Drag { strength }, enabled: true }
    }

    pub fn attraction(strength: f32, center: Vector3, radius: f32) -> Self {
        Self { kind: ForceFieldKind::Attraction { strength, center, radius, falloff: None }, enabled: true }
    }

    pub fn turbulence(strength: f32) -> Self {
        Self {
            kind: ForceFieldKind::Turbulence { strength, noise_frequency: 0.05, noise_amplitude: 1.0 },
            enabled: true,
        }
    }
}

/// A vectorized catalogue of force fields plus a monotonically increasing
/// global clock. Owned per particle stream (spec.md §4.1).
#[derive(Debug, Clone)]
pub struct ForceFieldSystem {
    fields: Vec<ForceField>,
    global_time: f32,
    noise: Perlin,
}

impl ForceFieldSystem {
    pub fn new(perlin_seed: u64) -> Self {
        Self { fields: Vec::new(), global_time: 0.0, noise: Perlin::new(perlin_seed) }
    }

    pub fn set_force_fields(&mut self, fields: Vec<ForceField>) {
        self.fields = fields;
    }

    pub fn add(&mut self, field: ForceField) {
        self.fields.push(field);
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn update_time(&mut self, dt: f32) {
        self.global_time += dt;
    }

    pub fn global_time(&self) -> f32 {
        self.global_time
    }

    pub fn fields(&self) -> &[ForceField] {
        &self.fields
    }

    /// Sum of every enabled field's force at `position/velocity/mass`.
    pub fn total_force(&self, position: Vector3, velocity: Vector3, mass: f32) -> Vector3 {
        self.fields
            .iter()
            .filter(|f| f.enabled)
            .map(|f| self.field_force(f, position, velocity, mass))
            .sum()
    }

    /// `total_force / mass`.
    pub fn acceleration(&self, position: Vector3, velocity: Vector3, mass: f32) -> Vector3 {
        let safe_mass = if mass.abs() < f32::EPSILON { 1.0 } else { mass };
        self.total_force(position, velocity, safe_mass) / safe_mass
    }

    fn field_force(&self, field: &ForceField, position: Vector3, velocity: Vector3, mass: f32) -> Vector3 {
        let t = self.global_time;
        match &field.kind {
            ForceFieldKind::Gravity { strength, direction } => mass * strength * safe_normalize(*direction, Vector3::new(0.0, -1.0, 0.0)),
            ForceFieldKind::Wind { strength, direction } => {
                strength * safe_normalize(*direction, Vector3::X) * (1.0 + 0.3 * (2.0 * t).sin())
            }
            ForceFieldKind::Drag { strength } => {
                let speed = velocity.length();
                if speed < f32::EPSILON {
                    Vector3::ZERO
                } else {
                    -strength * speed * speed * (velocity / speed)
                }
            }
            ForceFieldKind::Attraction { strength, center, radius, falloff } => {
                attraction_force(position, *center, *strength, *radius, falloff.as_ref())
            }
            ForceFieldKind::Repulsion { strength, center, radius, falloff } => {
                -attraction_force(position, *center, *strength, *radius, falloff.as_ref())
            }
            ForceFieldKind::Vortex { strength, center, radius } => {
                vortex_force(position, *center, *strength, *radius)
            }
            ForceFieldKind::Turbulence { strength, noise_frequency, noise_amplitude } => {
                let sample = position * *noise_frequency + Vector3::splat(t);
                self.noise.fbm4(sample) * *noise_amplitude * *strength * Vector3::ONE
            }
            ForceFieldKind::CurlNoise { strength, noise_frequency, noise_amplitude } => {
                let sample = position * *noise_frequency + Vector3::splat(t);
                self.noise.curl3(sample) * *noise_amplitude * *strength
            }
            ForceFieldKind::Breathe { strength, center, noise_frequency, noise_amplitude } => {
                breathe_force(position, *center, *strength, *noise_frequency, *noise_amplitude, t)
            }
            ForceFieldKind::WingFlap { strength, center, noise_frequency, noise_amplitude } => {
                wing_flap_force(position, *center, *strength, *noise_frequency, *noise_amplitude, t)
            }
            ForceFieldKind::Noise { strength, noise_frequency, noise_amplitude } => {
                let sample = position * *noise_frequency + Vector3::splat(t);
                self.noise.noise3_vec(sample) * *noise_amplitude * *strength
            }
        }
    }
}

#[inline]
fn safe_normalize(v: Vector3, fallback: Vector3) -> Vector3 {
    if v.length_squared() < f32::EPSILON {
        fallback
    } else {
        v.normalize()
    }
}

fn attraction_force(position: Vector3, center: Vector3, strength: f32, radius: f32, falloff: Option<&Curve>) -> Vector3 {
    let delta = center - position;
    let r = delta.length();
    if radius <= 0.0 || r > radius {
        return Vector3::ZERO;
    }
    let dir = if r < f32::EPSILON { Vector3::ZERO } else { delta / r };
    let t = (r / radius).clamp(0.0, 1.0);
    let falloff_value = falloff.map(|c| c.eval(t)).unwrap_or(1.0 - t);
    let magnitude = strength * falloff_value / r.max(1.0).powi(2);
    dir * magnitude
}

fn vortex_force(position: Vector3, center: Vector3, strength: f32, radius: Option<f32>) -> Vector3 {
    let dx = position.x - center.x;
    let dz = position.z - center.z;
    let r = (dx * dx + dz * dz).sqrt();
    if r < f32::EPSILON {
        return Vector3::ZERO;
    }
    // Tangential direction in the XZ plane.
    let tangent_x = -dz / r;
    let tangent_z = dx / r;
    let decay = match radius {
        Some(radius) if radius > 0.0 => (1.0 - r / radius).max(0.0),
        _ => 1.0 / (1.0 + 0.1 * r),
    };
    let magnitude = strength * decay;
    Vector3::new(tangent_x * magnitude, 0.0, tangent_z * magnitude)
}

fn breathe_force(
    position: Vector3,
    center: Vector3,
    strength: f32,
    noise_frequency: f32,
    amplitude: f32,
    t: f32,
) -> Vector3 {
    let delta = position - center;
    let r = delta.length();
    let dir = if r < f32::EPSILON { Vector3::ZERO } else { delta / r };
    let pulse = (2.0 * std::f32::consts::PI * noise_frequency * t).sin() * amplitude * (r / 50.0).min(1.0) * strength;
    let mut force = dir * pulse;
    force.y *= 0.5;
    force
}

fn wing_flap_force(
    position: Vector3,
    center: Vector3,
    strength: f32,
    noise_frequency: f32,
    amplitude: f32,
    t: f32,
) -> Vector3 {
    let dx = position.x - center.x;
    let sign = if dx >= 0.0 { 1.0 } else { -1.0 };
    let y = sign
        * (2.0 * std::f32::consts::PI * noise_frequency * t).sin()
        * amplitude
        * (dx.abs() / 30.0)
        * strength;
    Vector3::new(0.0, y, 0.0)
}
