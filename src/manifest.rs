//! The declarative manifest format: carrier + ordered payload stages
//! (spec.md §3, §6 "Manifest format").
//!
//! Every type here derives `serde::{Serialize, Deserialize}` so a host can
//! load manifests from TOML, JSON, or any other serde-compatible format; the
//! manifest-loader / preset UI translation layer itself stays out of scope
//! (spec.md §1 Non-goals).

use serde::{Deserialize, Serialize};

use crate::forces::ForceField;
use crate::util::{Curve, Gradient, Vector3};

/// How a stage's particles come to be (spec.md GLOSSARY "Transition mode").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionMode {
    Explode,
    Morph,
    Accumulate,
    Scatter,
    Maintain,
}

/// How a spawned particle's initial velocity is seeded (spec.md §3
/// `DynamicsConfig.initial_velocity.mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialVelocityMode {
    Radial,
    Directional,
    Random,
    TargetSeeking,
    StructurePreserve,
}

/// A scalar or a `[low, high]` range, used for `initial_velocity.speed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarOrRange {
    Scalar(f32),
    Range(f32, f32),
}

impl ScalarOrRange {
    /// Samples a concrete speed, drawing uniformly within the range.
    pub fn sample(&self, rng: &mut impl rand::Rng) -> f32 {
        match *self {
            ScalarOrRange::Scalar(v) => v,
            ScalarOrRange::Range(lo, hi) => {
                if hi <= lo {
                    lo
                } else {
                    rng.random_range(lo..hi)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialVelocityConfig {
    pub mode: InitialVelocityMode,
    pub speed: ScalarOrRange,
    pub direction: Option<Vector3>,
}

impl Default for InitialVelocityConfig {
    fn default() -> Self {
        Self { mode: InitialVelocityMode::Radial, speed: ScalarOrRange::Scalar(20.0), direction: None }
    }
}

/// Blend mode passed through to the downstream renderer, untouched by the
/// engine itself (spec.md §3 `RenderingConfig`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blending {
    Additive,
    Normal,
    Screen,
}

/// Input to the shape generator (spec.md §3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    pub source: String,
    pub resolution: usize,
    pub scale: f32,
    #[serde(default)]
    pub offset: Vector3,
    #[serde(default)]
    pub rotation: Option<Vector3>,
}

/// Forces and initial velocities applied to a stage's particles (spec.md §3
/// `DynamicsConfig`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicsConfig {
    pub transition_mode: TransitionMode,
    #[serde(default)]
    pub initial_velocity: InitialVelocityConfig,
    #[serde(default)]
    pub force_fields: Vec<ForceField>,
    #[serde(default = "Curve::linear")]
    pub velocity_profile: Curve,
    pub morph_attraction_strength: Option<f32>,
    pub morph_damping: Option<f32>,
}

/// How particles look over a stage (spec.md §3 `RenderingConfig`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderingConfig {
    pub color_map: Gradient,
    pub base_size: f32,
    #[serde(default = "Curve::linear")]
    pub size_curve: Curve,
    pub blending: Blending,
    #[serde(default)]
    pub use_blackbody: bool,
    pub initial_temperature: Option<f32>,
    pub cooling_rate: Option<f32>,
    pub glow_intensity: Option<f32>,
    #[serde(default = "default_enable_bloom")]
    pub enable_bloom: bool,
    #[serde(default = "default_bloom_duration")]
    pub bloom_duration: f32,
    #[serde(default = "default_grow_duration")]
    pub grow_duration: f32,
}

fn default_enable_bloom() -> bool {
    true
}
fn default_bloom_duration() -> f32 {
    0.6
}
fn default_grow_duration() -> f32 {
    0.4
}

/// One segment of a firework's payload (spec.md §3 `PayloadStage`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadStage {
    pub id: String,
    /// Measured from the moment the carrier arrives (spec.md §3).
    pub time_offset: f32,
    pub duration: f32,
    pub topology: TopologyConfig,
    pub dynamics: DynamicsConfig,
    pub rendering: RenderingConfig,
    #[serde(default)]
    pub reuse_particles: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payload {
    pub stages: Vec<PayloadStage>,
}

/// Which parametric path a carrier follows (spec.md §3 `PathConfig`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathType {
    Linear,
    Bezier3d,
    Spiral,
    Helix,
    Arc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    #[serde(rename = "type")]
    pub kind: PathType,
    #[serde(default)]
    pub control_points: Vec<Vector3>,
    #[serde(default = "Curve::linear")]
    pub speed_curve: Curve,
    pub spiral_radius: Option<f32>,
    pub spiral_frequency: Option<f32>,
}

/// Whether a carrier is rendered at all; `invisible` carriers only drive the
/// timing of the on-arrive callback (spec.md §4.5 `launch`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarrierType {
    Rocket,
    Invisible,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailConfig {
    pub emission_rate: f32,
    pub life_time: f32,
    pub color_gradient: Gradient,
    pub size: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierConfig {
    #[serde(rename = "type")]
    pub kind: CarrierType,
    pub path: PathConfig,
    pub duration: f32,
    pub trail: Option<TrailConfig>,
    pub shape: Option<String>,
}

/// A complete firework: carrier + ordered payload stages (spec.md §3
/// `FireworkManifest`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireworkManifest {
    pub id: String,
    pub name: String,
    pub duration: f32,
    pub carrier: CarrierConfig,
    pub payload: Payload,
}
