//! The particle stream: per-firework particle pool, spawn/morph/fade state
//! machine, per-particle physics integration and appearance evolution
//! (spec.md §4.4).
//!
//! Grounded in the teacher's `rocket.rs` (per-tick `update` driving
//! movement, trail spawn, and explosion trigger from one call site) and
//! `particles_pools::ParticlesPool` (free-list pool). The cross-fade state
//! the spec names `current_rendering`/`target_rendering` is kept at the
//! stream level alongside small per-particle color snapshot maps rather
//! than as extra `StreamParticle` fields, since spec.md §3 fixes that
//! struct's field list exactly.

mod particle;
mod pool;

pub use particle::StreamParticle;
pub use pool::Pool;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::forces::{ForceField, ForceFieldSystem};
use crate::manifest::{DynamicsConfig, InitialVelocityMode, RenderingConfig, TopologyConfig};
use crate::morph::{MorphConfig, MorphSession};
use crate::shapes;
use crate::util::{blackbody_hsl, hue_lerp_shortarc, lerp_f32, lerp_vec3, Vector3};

static STREAM_PARTICLE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A particle's life span when a manifest does not otherwise bound it;
/// death is still governed by the other criteria in spec.md §4.4.4 step 8
/// (escaping the simulation volume, going dark, or falling through the
/// floor), so this mostly matters for `maintain`/`scatter` stages that spawn
/// far fewer force fields to kill a particle with.
const DEFAULT_PARTICLE_LIFE_TIME: f32 = 4.0;
const APPEARANCE_CROSSFADE_SECONDS: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Spawning,
    Active,
    Fading,
    Extinct,
}

/// How a stream's particles are killed off once its payload stages end
/// (spec.md §4.4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtinctionMode {
    Fall,
    Float,
    Dissolve,
    Explode,
    Implode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtinctionConfig {
    pub mode: ExtinctionMode,
    pub gravity_strength: f32,
    pub wind: Option<ForceField>,
}

impl Default for ExtinctionConfig {
    fn default() -> Self {
        Self { mode: ExtinctionMode::Fall, gravity_strength: 15.0, wind: None }
    }
}

#[derive(Debug, Clone, Copy)]
struct ColorSnapshot {
    hue: f32,
    saturation: f32,
    lightness: f32,
    alpha: f32,
}

/// Owns a [`Pool`] plus active-index bookkeeping, the [`ForceFieldSystem`]
/// for the current stage, and an optional in-flight [`MorphSession`]
/// (spec.md §4.4).
pub struct ParticleStream {
    pool: Pool,
    active: Vec<usize>,
    force_fields: ForceFieldSystem,
    state: StreamState,
    spawn_center: Vector3,
    current_rendering: Option<RenderingConfig>,
    target_rendering: Option<RenderingConfig>,
    color_start: HashMap<usize, ColorSnapshot>,
    color_target: HashMap<usize, ColorSnapshot>,
    bloom_factor: f32,
    bloom_duration: f32,
    grow_duration: f32,
    base_size: f32,
    is_initial_stage: bool,
    morph: Option<MorphSession>,
    rng: StdRng,
}

impl ParticleStream {
    pub fn new(capacity: usize, spawn_center: Vector3, perlin_seed: u64, rng_seed: u64) -> Self {
        Self {
            pool: Pool::new(capacity),
            active: Vec::new(),
            force_fields: ForceFieldSystem::new(perlin_seed),
            state: StreamState::Idle,
            spawn_center,
            current_rendering: None,
            target_rendering: None,
            color_start: HashMap::new(),
            color_target: HashMap::new(),
            bloom_factor: 1.0,
            bloom_duration: 0.6,
            grow_duration: 0.4,
            base_size: 1.0,
            is_initial_stage: false,
            morph: None,
            rng: StdRng::seed_from_u64(rng_seed),
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_extinct(&self) -> bool {
        self.state == StreamState::Extinct
    }

    pub fn live_count(&self) -> usize {
        self.active.len()
    }

    pub fn live_particles(&self) -> impl Iterator<Item = &StreamParticle> {
        self.active.iter().map(move |&idx| self.pool.get(idx))
    }

    pub fn is_morphing(&self) -> bool {
        self.morph.is_some()
    }

    /// Builds the target point cloud for a topology, in world space
    /// (spec.md §4.4.1 step 1, §4.4.2 "translate by `spawn_center`").
    fn world_target_points(&self, topology: &TopologyConfig) -> Vec<Vector3> {
        let raw = shapes::generate(&topology.source, topology.resolution, topology.scale);
        let rotation = topology.rotation.map(|r| glam::Quat::from_euler(glam::EulerRot::XYZ, r.x, r.y, r.z));
        raw.into_iter()
            .map(|p| {
                let rotated = rotation.map(|q| q * p).unwrap_or(p);
                self.spawn_center + rotated + topology.offset
            })
            .collect()
    }

    /// Spawns up to `count` particles from `topology`, seeding velocity per
    /// `dynamics.initial_velocity` and appearance from `rendering.color_map`
    /// (spec.md §4.4.1).
    pub fn spawn(&mut self, count: usize, topology: &TopologyConfig, dynamics: &DynamicsConfig, rendering: &RenderingConfig) {
        self.state = StreamState::Spawning;
        let targets = self.world_target_points(topology);
        if targets.is_empty() {
            log::warn!("spawn requested with an empty target point cloud (unknown or zero-resolution shape)");
        }

        let room = self.pool.capacity() - self.pool.live_count();
        let actual_count = count.min(room);
        if actual_count < count {
            log::warn!("pool capacity exhausted: clamped spawn count {count} -> {actual_count}");
        }

        let structure_preserve = dynamics.initial_velocity.mode == InitialVelocityMode::StructurePreserve;

        for i in 0..actual_count {
            let Some(idx) = self.pool.acquire() else { break };
            let target_point = if targets.is_empty() { self.spawn_center } else { targets[i % targets.len()] };
            let t = if actual_count > 1 { i as f32 / actual_count as f32 } else { 0.0 };
            let (hue, saturation, lightness, alpha) = rendering.color_map.sample(t);

            let (position, velocity, target_position) = if structure_preserve {
                let jitter = Vector3::new(self.rng.random_range(-0.5..0.5), self.rng.random_range(-0.5..0.5), self.rng.random_range(-0.5..0.5));
                (target_point, jitter, target_point)
            } else {
                let speed = dynamics.initial_velocity.speed.sample(&mut self.rng);
                let velocity = self.seed_velocity(dynamics.initial_velocity.mode, dynamics.initial_velocity.direction, target_point - self.spawn_center, speed);
                (self.spawn_center, velocity, target_point)
            };

            let slot = self.pool.get_mut(idx);
            *slot = StreamParticle {
                id: STREAM_PARTICLE_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
                position,
                velocity,
                acceleration: Vector3::ZERO,
                mass: 1.0,
                hue,
                saturation,
                lightness,
                alpha,
                size: if rendering.enable_bloom { 0.1 } else { rendering.base_size },
                temperature: if rendering.use_blackbody { rendering.initial_temperature.unwrap_or(6000.0) } else { 0.0 },
                age: 0.0,
                life_time: DEFAULT_PARTICLE_LIFE_TIME,
                stage_age: 0.0,
                is_dead: false,
                target_position,
                origin_position: position,
                morph_progress: 0.0,
                is_morphing: false,
                user_data: 0,
            };
            self.active.push(idx);
        }

        self.force_fields.set_force_fields(dynamics.force_fields.clone());
        self.bloom_factor = if rendering.enable_bloom { 0.0 } else { 1.0 };
        self.bloom_duration = rendering.bloom_duration.max(f32::EPSILON);
        self.grow_duration = rendering.grow_duration.max(f32::EPSILON);
        self.base_size = rendering.base_size;
        self.is_initial_stage = true;
        self.current_rendering = Some(rendering.clone());
        self.target_rendering = None;
        self.color_start.clear();
        self.color_target.clear();
        self.state = StreamState::Active;
    }

    fn seed_velocity(&mut self, mode: InitialVelocityMode, direction: Option<Vector3>, to_target: Vector3, speed: f32) -> Vector3 {
        match mode {
            InitialVelocityMode::Radial => random_unit_vector(&mut self.rng) * speed,
            InitialVelocityMode::Directional => {
                let dir = direction.unwrap_or(Vector3::Y);
                let dir = if dir.length_squared() < f32::EPSILON { Vector3::Y } else { dir.normalize() };
                dir * speed
            }
            InitialVelocityMode::Random => Vector3::new(
                self.rng.random_range(-speed..speed),
                self.rng.random_range(-speed..speed),
                self.rng.random_range(-speed..speed),
            ),
            InitialVelocityMode::TargetSeeking => {
                if to_target.length_squared() < f32::EPSILON {
                    Vector3::ZERO
                } else {
                    to_target.normalize() * speed
                }
            }
            InitialVelocityMode::StructurePreserve => Vector3::ZERO,
        }
    }

    /// Re-targets the live particle set to a new topology via the morphing
    /// engine (spec.md §4.4.2).
    pub fn start_morph(&mut self, target_topology: &TopologyConfig, target_rendering: Option<RenderingConfig>, morph_config: Option<MorphConfig>) {
        let targets = self.world_target_points(target_topology);
        let origins: Vec<(usize, Vector3, Vector3)> = self
            .active
            .iter()
            .map(|&idx| {
                let p = self.pool.get(idx);
                (idx, p.position, p.velocity)
            })
            .collect();

        let count = origins.len();
        self.color_start.clear();
        self.color_target.clear();
        if let Some(target_render) = &target_rendering {
            for (i, &(idx, ..)) in origins.iter().enumerate() {
                let p = self.pool.get(idx);
                self.color_start.insert(idx, ColorSnapshot { hue: p.hue, saturation: p.saturation, lightness: p.lightness, alpha: p.alpha });
                let t = if count > 1 { i as f32 / count as f32 } else { 0.0 };
                let (hue, saturation, lightness, alpha) = target_render.color_map.sample(t);
                self.color_target.insert(idx, ColorSnapshot { hue, saturation, lightness, alpha });
            }
        }

        self.morph = Some(MorphSession::new(&origins, &targets, morph_config.unwrap_or_default()));

        for &idx in &self.active {
            self.pool.get_mut(idx).stage_age = 0.0;
        }
        self.bloom_factor = 1.0;
        self.is_initial_stage = false;

        if let Some(prev_target) = self.target_rendering.take() {
            self.current_rendering = Some(prev_target);
        }
        self.target_rendering = target_rendering;
    }

    /// Swaps in a new force-field set without touching particle data or
    /// rendering, used by the `maintain` transition mode (spec.md §4.4,
    /// GLOSSARY "Transition mode").
    pub fn set_force_fields_only(&mut self, dynamics: &DynamicsConfig) {
        self.force_fields.set_force_fields(dynamics.force_fields.clone());
    }

    /// Swaps in the configured extinction force fields (spec.md §4.4.3).
    pub fn start_extinction(&mut self, config: &ExtinctionConfig) {
        self.force_fields.clear();
        match config.mode {
            ExtinctionMode::Fall => {
                self.force_fields.add(ForceField::gravity(config.gravity_strength, Vector3::new(0.0, -1.0, 0.0)));
                self.force_fields.add(ForceField::drag(0.02));
                if let Some(wind) = &config.wind {
                    self.force_fields.add(wind.clone());
                }
            }
            ExtinctionMode::Float => {
                self.force_fields.add(ForceField::drag(0.1));
                self.force_fields.add(ForceField::turbulence(2.0));
            }
            ExtinctionMode::Dissolve => {
                self.force_fields.add(ForceField::drag(0.5));
            }
            ExtinctionMode::Explode => {
                for &idx in &self.active {
                    let speed = self.rng.random_range(20.0..50.0);
                    let dir = random_unit_vector(&mut self.rng);
                    self.pool.get_mut(idx).velocity = dir * speed;
                }
                self.force_fields.add(ForceField::drag(0.05));
            }
            ExtinctionMode::Implode => {
                self.force_fields.add(ForceField::attraction(30.0, self.spawn_center, 200.0));
            }
        }
        self.state = StreamState::Fading;
    }

    /// Advances the stream one tick (spec.md §4.4.4). A non-positive `dt` is
    /// a no-op (spec.md §7).
    pub fn update(&mut self, dt: f32) {
        if dt <= 0.0 || self.state == StreamState::Extinct {
            return;
        }
        self.force_fields.update_time(dt);

        let morphing_indices: std::collections::HashSet<usize> = match &self.morph {
            Some(session) => {
                for mp in session.particles() {
                    let slot = self.pool.get_mut(mp.pool_index);
                    slot.position = mp.position;
                    slot.velocity = mp.velocity;
                    slot.morph_progress = mp.morph_progress;
                    slot.is_morphing = mp.is_morphing;
                }
                session.particles().iter().map(|p| p.pool_index).collect()
            }
            None => Default::default(),
        };

        if let Some(session) = &mut self.morph {
            if session.tick(dt, &mut self.rng) {
                self.morph = None;
            }
        }

        let is_fading = self.state == StreamState::Fading;
        if self.is_initial_stage && self.bloom_factor < 1.0 {
            self.bloom_factor = (self.bloom_factor + dt / self.bloom_duration).min(1.0);
        }
        let bloom_ease_t = if self.is_initial_stage { 1.0 - (1.0 - self.bloom_factor).powi(3) } else { 1.0 };

        for &idx in &self.active {
            let is_morphing_now = morphing_indices.contains(&idx);
            let (target_position, spawn_center) = (self.pool.get(idx).target_position, self.spawn_center);
            let particle = self.pool.get_mut(idx);
            particle.age += dt;
            particle.stage_age += dt;

            if !is_morphing_now {
                particle.acceleration = self.force_fields.acceleration(particle.position, particle.velocity, particle.mass);

                if self.is_initial_stage && self.bloom_factor < 1.0 {
                    let virtual_target = lerp_vec3(spawn_center, target_position, bloom_ease_t);
                    let weight = (1.0 - bloom_ease_t) * 5.0 * dt;
                    particle.velocity += (virtual_target - particle.position) * weight;
                }

                particle.velocity += particle.acceleration * dt;
                particle.position += particle.velocity * dt;
            }

            update_appearance(particle, idx, dt, &self.current_rendering, &self.color_start, &self.color_target, is_fading);
            update_size(particle, self.is_initial_stage, self.base_size, self.grow_duration);

            particle.is_dead =
                particle.age > particle.life_time || particle.alpha <= 0.0 || particle.position.y < -200.0 || particle.position.length() > 50_000.0;
        }

        for i in (0..self.active.len()).rev() {
            let idx = self.active[i];
            if self.pool.get(idx).is_dead {
                self.pool.release(idx);
                self.active.remove(i);
                self.color_start.remove(&idx);
                self.color_target.remove(&idx);
            }
        }

        if is_fading && self.active.is_empty() {
            self.state = StreamState::Extinct;
        }
    }
}

fn random_unit_vector(rng: &mut impl Rng) -> Vector3 {
    loop {
        let v = Vector3::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0));
        let len_sq = v.length_squared();
        if len_sq > 1e-6 {
            return v / len_sq.sqrt();
        }
    }
}

fn update_appearance(
    particle: &mut StreamParticle,
    idx: usize,
    dt: f32,
    current: &Option<RenderingConfig>,
    color_start: &HashMap<usize, ColorSnapshot>,
    color_target: &HashMap<usize, ColorSnapshot>,
    is_fading: bool,
) {
    if let (Some(start), Some(target)) = (color_start.get(&idx), color_target.get(&idx)) {
        let t = (particle.stage_age / APPEARANCE_CROSSFADE_SECONDS).min(1.0);
        particle.hue = hue_lerp_shortarc(start.hue, target.hue, t);
        particle.saturation = lerp_f32(start.saturation, target.saturation, t);
        particle.lightness = lerp_f32(start.lightness, target.lightness, t);
        particle.alpha = lerp_f32(start.alpha, target.alpha, t);
    }

    particle.alpha = (particle.alpha * (1.0 - 0.5 * particle.age / particle.life_time.max(f32::EPSILON))).max(0.0);

    if is_fading {
        particle.alpha = (particle.alpha * (1.0 - 2.0 * dt).max(0.0)).max(0.0);
    }

    if let Some(rendering) = current {
        if rendering.use_blackbody {
            let cooling_rate = rendering.cooling_rate.unwrap_or(500.0);
            particle.temperature = (particle.temperature - cooling_rate * dt).max(500.0);
            let (hue, saturation, lightness) = blackbody_hsl(particle.temperature);
            particle.hue = hue;
            particle.saturation = saturation;
            particle.lightness = lightness;
        }
    }
}

fn update_size(particle: &mut StreamParticle, is_initial_stage: bool, base_size: f32, grow_duration: f32) {
    if is_initial_stage {
        let g = (particle.stage_age / grow_duration).min(1.0);
        particle.size = lerp_f32(0.1, base_size, g);
    } else {
        particle.size = base_size;
    }

    if particle.life_time > f32::EPSILON && particle.age / particle.life_time > 0.8 {
        particle.size *= 0.98;
    }
}
