//! The director: global clock, manifest registry, instance lifecycle, stage
//! sequencing (spec.md §4.5).
//!
//! Grounded in the teacher's `physic_engine_generational_arena.rs`: an
//! owning map of live instances keyed by a stable ID, a `reload_config` that
//! swaps tuning without rebuilding live state, and a
//! `#[cfg(any(test, feature = "test_helpers"))]` escape hatch
//! (`PhysicEngineTestHelpers`) instead of making internals `pub`. That
//! teacher file backs its map with `generational_arena::Arena` for
//! generation-checked slot reuse; this director uses a `HashMap<u64, _>`
//! plus an atomic counter instead, since firework/carrier ids are
//! long-lived handles exposed across the whole `update` cycle rather than
//! short-lived slot references reused within a single frame (see
//! DESIGN.md).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::carrier::{CarrierInstance, CarrierSubsystem, TrailParticle};
use crate::config::EngineConfig;
use crate::manifest::{CarrierType, FireworkManifest, PayloadStage, TransitionMode};
use crate::morph::MorphConfig;
use crate::stream::{ExtinctionConfig, ParticleStream, StreamParticle, StreamState};
use crate::util::Vector3;

static FIREWORK_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireworkState {
    Carrier,
    Payload,
    Extinct,
}

/// A launched firework, owned by the [`Director`] (spec.md §3
/// `FireworkInstance`).
pub struct FireworkInstance {
    pub id: u64,
    pub manifest: Arc<FireworkManifest>,
    pub launch: Vector3,
    pub target: Vector3,
    pub carrier_id: Option<u64>,
    pub particle_stream: Option<ParticleStream>,
    pub current_stage_index: usize,
    pub stage_start_time: f32,
    pub elapsed: f32,
    pub state: FireworkState,
    pub hue_override: f32,
}

/// Renderer-facing aggregate counters (spec.md §4.5 `get_stats`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Stats {
    pub active_fireworks: usize,
    pub total_particles: usize,
    pub trail_particles: usize,
    pub total_launched: u64,
    pub total_extinct: u64,
    pub peak_particles: usize,
}

/// One-shot timer entry for an `invisible` carrier's on-arrive event
/// (spec.md §9 "Coroutine-free scheduling").
struct PendingArrival {
    fire_at: f32,
    firework_id: u64,
}

/// Builds the [`MorphConfig`] a `morph` stage hands to
/// [`ParticleStream::start_morph`], carrying over the stage's
/// `morph_attraction_strength`/`morph_damping` overrides and falling back to
/// [`MorphConfig::default`] for anything the stage leaves unset (spec.md §3
/// `DynamicsConfig`).
fn morph_config_for_stage(stage: &PayloadStage) -> MorphConfig {
    let mut config = MorphConfig::default();
    if let Some(strength) = stage.dynamics.morph_attraction_strength {
        config.attraction_strength = strength;
    }
    if let Some(damping) = stage.dynamics.morph_damping {
        config.damping = damping;
    }
    config
}

/// Owns every other subsystem and drives them from a single `update(dt)`
/// entry point (spec.md §5 "single entry point").
pub struct Director {
    manifests: HashMap<String, Arc<FireworkManifest>>,
    fireworks: HashMap<u64, FireworkInstance>,
    carriers: CarrierSubsystem,
    pending_arrivals: Vec<PendingArrival>,
    global_time: f32,
    time_scale: f32,
    paused: bool,
    config: EngineConfig,
    rng: StdRng,
    stats: Stats,
}

impl Director {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            manifests: HashMap::new(),
            fireworks: HashMap::new(),
            carriers: CarrierSubsystem::new(config.max_trail_particles_per_carrier),
            pending_arrivals: Vec::new(),
            global_time: 0.0,
            time_scale: 1.0,
            paused: false,
            rng: StdRng::seed_from_u64(config.perlin_seed),
            config,
            stats: Stats::default(),
        }
    }

    /// Registers a manifest for later `launch` calls. Write-once from the
    /// hot path's perspective (spec.md §5 "The manifest registry is
    /// write-once at registration").
    pub fn register_manifest(&mut self, manifest: FireworkManifest) {
        self.manifests.insert(manifest.id.clone(), Arc::new(manifest));
    }

    pub fn reload_config(&mut self, config: &EngineConfig) {
        self.carriers.set_max_trail_particles(config.max_trail_particles_per_carrier);
        self.config = config.clone();
    }

    /// Launches a registered manifest. Returns `None` (and logs a warning)
    /// if the manifest id is unknown (spec.md §7 "Unknown manifest").
    pub fn launch(&mut self, manifest_id: &str, launch_pos: Vector3, target_pos: Vector3, hue: Option<f32>) -> Option<u64> {
        let Some(manifest) = self.manifests.get(manifest_id).cloned() else {
            log::warn!("launch failed: unknown manifest '{manifest_id}'");
            return None;
        };

        let id = FIREWORK_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let hue_override = hue.unwrap_or_else(|| self.rng.random_range(0.0..360.0));

        let carrier_id = if manifest.carrier.kind == CarrierType::Invisible {
            self.pending_arrivals.push(PendingArrival { fire_at: self.global_time + manifest.carrier.duration, firework_id: id });
            None
        } else {
            Some(self.carriers.create_carrier(manifest.carrier.clone(), launch_pos, target_pos, hue_override))
        };

        self.fireworks.insert(
            id,
            FireworkInstance {
                id,
                manifest,
                launch: launch_pos,
                target: target_pos,
                carrier_id,
                particle_stream: None,
                current_stage_index: 0,
                stage_start_time: 0.0,
                elapsed: 0.0,
                state: FireworkState::Carrier,
                hue_override,
            },
        );
        self.stats.total_launched += 1;
        log::info!("launched firework {id} from manifest '{manifest_id}'");
        Some(id)
    }

    fn on_carrier_arrive(&mut self, firework_id: u64) {
        let Some(firework) = self.fireworks.get_mut(&firework_id) else { return };
        let capacity = self.config.default_pool_capacity;
        let perlin_seed = self.config.perlin_seed;
        let rng_seed = self.rng.random::<u64>();
        firework.particle_stream = Some(ParticleStream::new(capacity, firework.target, perlin_seed, rng_seed));
        firework.state = FireworkState::Payload;
        firework.stage_start_time = self.global_time;
        log::debug!("firework {firework_id} carrier arrived, entering payload");
        self.start_stage(firework_id, 0);
    }

    /// Dispatches a stage by its `transition_mode` (spec.md §4.5
    /// `start_stage`).
    fn start_stage(&mut self, firework_id: u64, stage_index: usize) {
        let Some(firework) = self.fireworks.get_mut(&firework_id) else { return };
        let Some(stage) = firework.manifest.payload.stages.get(stage_index).cloned() else { return };
        let Some(stream) = firework.particle_stream.as_mut() else { return };

        match stage.dynamics.transition_mode {
            TransitionMode::Explode | TransitionMode::Accumulate | TransitionMode::Scatter => {
                let count = stage.topology.resolution;
                stream.spawn(count, &stage.topology, &stage.dynamics, &stage.rendering);
            }
            TransitionMode::Morph => {
                if stream.live_count() > 0 {
                    stream.start_morph(&stage.topology, Some(stage.rendering.clone()), Some(morph_config_for_stage(&stage)));
                } else {
                    // A manifest that opens a stage with `morph` has nothing
                    // to re-target yet; spawn now and defer the morph to the
                    // next dispatch (spec.md §9 Open Question).
                    stream.spawn(stage.topology.resolution, &stage.topology, &stage.dynamics, &stage.rendering);
                }
            }
            TransitionMode::Maintain => {
                stream.set_force_fields_only(&stage.dynamics);
            }
        }
        firework.current_stage_index = stage_index;
        firework.stage_start_time = self.global_time;
    }

    fn start_extinction(&mut self, firework_id: u64) {
        let Some(firework) = self.fireworks.get_mut(&firework_id) else { return };
        if let Some(stream) = firework.particle_stream.as_mut() {
            stream.start_extinction(&ExtinctionConfig::default());
        }
    }

    /// The frame entry point (spec.md §4.5 `update`).
    pub fn update(&mut self, dt: f32) {
        if self.paused || dt <= 0.0 {
            return;
        }
        let scaled = dt * self.time_scale;
        self.global_time += scaled;

        let carrier_outcome = self.carriers.update(scaled, &mut self.rng);

        let mut due = Vec::new();
        self.pending_arrivals.retain(|entry| {
            if entry.fire_at <= self.global_time {
                due.push(entry.firework_id);
                false
            } else {
                true
            }
        });

        for firework_id in carrier_outcome.arrived.into_iter().chain(due) {
            self.on_carrier_arrive(firework_id);
        }

        let ids: Vec<u64> = self.fireworks.keys().copied().collect();
        for firework_id in ids {
            let mut advance_to: Option<usize> = None;
            let mut extinguish = false;
            let mut release = false;

            if let Some(firework) = self.fireworks.get_mut(&firework_id) {
                firework.elapsed += scaled;

                if firework.state == FireworkState::Payload {
                    if let Some(stream) = firework.particle_stream.as_mut() {
                        stream.update(scaled);

                        let stage_duration = firework.manifest.payload.stages.get(firework.current_stage_index).map(|s| s.duration).unwrap_or(0.0);
                        if self.global_time - firework.stage_start_time >= stage_duration - self.config.stage_tick_epsilon {
                            let next_index = firework.current_stage_index + 1;
                            if next_index < firework.manifest.payload.stages.len() {
                                advance_to = Some(next_index);
                            } else {
                                extinguish = true;
                            }
                        }

                        if stream.is_extinct() {
                            firework.state = FireworkState::Extinct;
                            release = true;
                        }
                    }
                }
            }

            if let Some(next_index) = advance_to {
                self.start_stage(firework_id, next_index);
            }
            if extinguish {
                self.start_extinction(firework_id);
            }
            if release {
                self.fireworks.remove(&firework_id);
                self.stats.total_extinct += 1;
            }
        }

        self.refresh_stats();
    }

    fn refresh_stats(&mut self) {
        let total_particles: usize = self.fireworks.values().filter_map(|f| f.particle_stream.as_ref()).map(|s| s.live_count()).sum();
        self.stats.active_fireworks = self.fireworks.len();
        self.stats.total_particles = total_particles;
        self.stats.trail_particles = self.carriers.get_all_trail_particles().count();
        self.stats.peak_particles = self.stats.peak_particles.max(total_particles);
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Clamped to `[EngineConfig.min_time_scale, EngineConfig.max_time_scale]`
    /// (spec.md §7 "Invalid time scale").
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.clamp(self.config.min_time_scale, self.config.max_time_scale);
    }

    pub fn get_global_time(&self) -> f32 {
        self.global_time
    }

    pub fn reset(&mut self) {
        self.fireworks.clear();
        self.carriers = CarrierSubsystem::new(self.config.max_trail_particles_per_carrier);
        self.pending_arrivals.clear();
        self.global_time = 0.0;
        self.time_scale = 1.0;
        self.paused = false;
        self.stats = Stats::default();
    }

    pub fn get_all_particles(&self) -> impl Iterator<Item = &StreamParticle> {
        self.fireworks.values().filter_map(|f| f.particle_stream.as_ref()).flat_map(|s| s.live_particles())
    }

    pub fn get_all_trail_particles(&self) -> impl Iterator<Item = &TrailParticle> {
        self.carriers.get_all_trail_particles()
    }

    pub fn get_all_carriers(&self) -> impl Iterator<Item = &CarrierInstance> {
        self.carriers.get_all_carriers()
    }

    pub fn get_stats(&self) -> Stats {
        self.stats
    }
}

#[cfg(any(test, feature = "test_helpers"))]
pub trait DirectorTestHelpers {
    fn active_firework_count(&self) -> usize;
    fn force_stage_advance(&mut self, firework_id: u64);
}

#[cfg(any(test, feature = "test_helpers"))]
impl DirectorTestHelpers for Director {
    fn active_firework_count(&self) -> usize {
        self.fireworks.len()
    }

    fn force_stage_advance(&mut self, firework_id: u64) {
        if let Some(firework) = self.fireworks.get_mut(&firework_id) {
            firework.stage_start_time = self.global_time - 1_000_000.0;
        }
    }
}
