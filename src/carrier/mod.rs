//! The carrier subsystem: parametric 3D path evaluation + trail emission
//! (spec.md §4.3).
//!
//! Grounded in the teacher's `rocket.rs` (a rising projectile that emits
//! trail particles and is driven by a single `update` call per tick) and
//! `physic_engine_generational_arena.rs` (an owning map keyed by an atomic
//! ID counter, with active/free index bookkeeping). The spec's
//! `on_arrive_callback` field is implemented as a returned list of arrived
//! carrier IDs from [`CarrierSubsystem::update`] rather than a stored
//! closure: `CarrierInstance` lives inside a subsystem-owned map, and a
//! polled outcome composes more simply than a callback captured at
//! construction while still satisfying "arrival triggers an external
//! callback" (see DESIGN.md).

mod path;
mod trail;

pub use trail::TrailParticle;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use crate::manifest::CarrierConfig;
use crate::shapes;
use crate::util::Vector3;

static CARRIER_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Per-carrier mutable state (spec.md §3 `CarrierInstance.state`).
#[derive(Debug, Clone, Copy, Default)]
pub struct CarrierState {
    pub position: Vector3,
    pub velocity: Vector3,
    pub progress: f32,
    pub elapsed: f32,
    pub arrived: bool,
    pub active: bool,
}

/// A carrier in flight, owned by [`CarrierSubsystem`] (spec.md §3
/// `CarrierInstance`).
#[derive(Debug, Clone)]
pub struct CarrierInstance {
    pub id: u64,
    pub config: CarrierConfig,
    pub state: CarrierState,
    pub start: Vector3,
    pub target: Vector3,
    pub trail: Vec<TrailParticle>,
    pub hue: f32,
    emission_accumulator: f32,
    pub shape_points: Option<Vec<Vector3>>,
    time_since_purge: f32,
    max_trail_particles: usize,
}

const PURGE_INTERVAL: f32 = 1.0;
/// 400-point point cloud at a fixed 1.5 scale, generated once at creation
/// when `config.shape` is set (spec.md §4.3).
const SHAPE_CLOUD_RESOLUTION: usize = 400;
const SHAPE_CLOUD_SCALE: f32 = 1.5;

impl CarrierInstance {
    fn new(id: u64, config: CarrierConfig, start: Vector3, target: Vector3, hue: f32, max_trail_particles: usize) -> Self {
        let shape_points = config.shape.as_deref().map(|name| shapes::generate(name, SHAPE_CLOUD_RESOLUTION, SHAPE_CLOUD_SCALE));
        Self {
            id,
            config,
            state: CarrierState { position: start, velocity: Vector3::ZERO, progress: 0.0, elapsed: 0.0, arrived: false, active: true },
            start,
            target,
            trail: Vec::new(),
            hue,
            emission_accumulator: 0.0,
            shape_points,
            time_since_purge: 0.0,
            max_trail_particles,
        }
    }

    /// Returns `true` exactly on the tick arrival happens (spec.md §8
    /// property 4).
    fn tick(&mut self, dt: f32, rng: &mut impl Rng) -> bool {
        if self.state.arrived {
            self.update_trail(dt, rng);
            return false;
        }

        let old_position = self.state.position;
        self.state.elapsed += dt;
        let raw_progress = (self.state.elapsed / self.config.duration.max(f32::EPSILON)).clamp(0.0, 1.0);
        self.state.progress = self.config.path.speed_curve.eval(raw_progress);

        let new_position = path::evaluate(&self.config.path, self.start, self.target, self.state.progress);
        self.state.velocity = if dt > 0.0 { (new_position - old_position) / dt } else { Vector3::ZERO };
        self.state.position = new_position;

        self.update_trail(dt, rng);

        let just_arrived = self.state.elapsed / self.config.duration.max(f32::EPSILON) >= 1.0;
        if just_arrived {
            self.state.position = self.target;
            self.state.arrived = true;
        }
        just_arrived
    }

    fn update_trail(&mut self, dt: f32, rng: &mut impl Rng) {
        let Some(trail_cfg) = &self.config.trail else { return };
        if !self.state.arrived {
            self.emission_accumulator += trail_cfg.emission_rate * dt;
            let to_emit = self.emission_accumulator.floor().max(0.0) as usize;
            let room = self.max_trail_particles.saturating_sub(self.trail.len());
            let emit_count = to_emit.min(room);
            self.emission_accumulator -= to_emit as f32;
            for i in 0..emit_count {
                let t = if trail_cfg.emission_rate > 0.0 { i as f32 / trail_cfg.emission_rate } else { 0.0 };
                let (hue, saturation, lightness, _) = trail_cfg.color_gradient.sample(t);
                self.trail.push(TrailParticle::spawn(
                    self.state.position,
                    self.state.velocity,
                    trail_cfg.life_time,
                    hue,
                    saturation,
                    lightness,
                    trail_cfg.size,
                    rng,
                ));
            }
        }

        for p in &mut self.trail {
            p.update(dt);
        }

        self.time_since_purge += dt;
        if self.time_since_purge >= PURGE_INTERVAL {
            self.time_since_purge = 0.0;
            self.trail.retain(|p| !p.is_dead);
        }
    }

    fn is_removable(&self) -> bool {
        self.state.arrived && self.trail.iter().all(|p| p.is_dead)
    }

    pub fn live_trail(&self) -> impl Iterator<Item = &TrailParticle> {
        self.trail.iter().filter(|p| !p.is_dead)
    }
}

/// Outcome of one [`CarrierSubsystem::update`] tick.
#[derive(Debug, Default)]
pub struct CarrierTickOutcome {
    /// Carrier IDs whose `arrived` transitioned false -> true this tick.
    pub arrived: Vec<u64>,
}

/// Owns every in-flight carrier, keyed by ID (spec.md §4.3, §5 "The carrier
/// map is owned by the carrier subsystem; external callers only read").
#[derive(Debug)]
pub struct CarrierSubsystem {
    carriers: HashMap<u64, CarrierInstance>,
    max_trail_particles: usize,
}

impl Default for CarrierSubsystem {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl CarrierSubsystem {
    /// `max_trail_particles` caps each carrier's own live trail (spec.md §4.3,
    /// `EngineConfig::max_trail_particles_per_carrier`).
    pub fn new(max_trail_particles: usize) -> Self {
        Self { carriers: HashMap::new(), max_trail_particles }
    }

    /// Applies a new trail cap to every carrier already in flight, matching
    /// [`crate::director::Director::reload_config`]'s "swap tuning without
    /// rebuilding live state" contract.
    pub fn set_max_trail_particles(&mut self, max_trail_particles: usize) {
        self.max_trail_particles = max_trail_particles;
        for carrier in self.carriers.values_mut() {
            carrier.max_trail_particles = max_trail_particles;
        }
    }

    pub fn create_carrier(&mut self, config: CarrierConfig, start: Vector3, target: Vector3, hue: f32) -> u64 {
        let id = CARRIER_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.carriers.insert(id, CarrierInstance::new(id, config, start, target, hue, self.max_trail_particles));
        id
    }

    pub fn get(&self, id: u64) -> Option<&CarrierInstance> {
        self.carriers.get(&id)
    }

    /// Advances every live carrier one tick, purging carriers that have
    /// arrived and drained their trail (spec.md §4.5 step 4).
    pub fn update(&mut self, dt: f32, rng: &mut impl Rng) -> CarrierTickOutcome {
        let mut outcome = CarrierTickOutcome::default();
        for carrier in self.carriers.values_mut() {
            if carrier.tick(dt, rng) {
                outcome.arrived.push(carrier.id);
            }
        }
        self.carriers.retain(|_, c| !c.is_removable());
        outcome
    }

    pub fn get_all_carriers(&self) -> impl Iterator<Item = &CarrierInstance> {
        self.carriers.values()
    }

    pub fn get_all_trail_particles(&self) -> impl Iterator<Item = &TrailParticle> {
        self.carriers.values().flat_map(|c| c.live_trail())
    }

    pub fn active_count(&self) -> usize {
        self.carriers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{CarrierType, PathConfig, PathType};
    use crate::util::Curve;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn linear_config(duration: f32) -> CarrierConfig {
        CarrierConfig {
            kind: CarrierType::Rocket,
            path: PathConfig { kind: PathType::Linear, control_points: vec![], speed_curve: Curve::linear(), spiral_radius: None, spiral_frequency: None },
            duration,
            trail: None,
            shape: None,
        }
    }

    #[test]
    fn arrival_is_monotonic_and_snaps_to_target() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sub = CarrierSubsystem::new(1000);
        let target = Vector3::new(0.0, 100.0, 0.0);
        let id = sub.create_carrier(linear_config(0.5), Vector3::ZERO, target, 30.0);

        let mut arrivals = 0;
        for _ in 0..100 {
            let outcome = sub.update(0.016, &mut rng);
            if outcome.arrived.contains(&id) {
                arrivals += 1;
            }
        }
        assert_eq!(arrivals, 1);
    }

    #[test]
    fn carrier_with_no_trail_removes_immediately_after_arrival() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sub = CarrierSubsystem::new(1000);
        sub.create_carrier(linear_config(0.05), Vector3::ZERO, Vector3::new(10.0, 0.0, 0.0), 0.0);
        for _ in 0..20 {
            sub.update(0.016, &mut rng);
        }
        assert_eq!(sub.active_count(), 0);
    }

    #[test]
    fn trail_emission_respects_the_configured_cap() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sub = CarrierSubsystem::new(5);
        let mut config = linear_config(10.0);
        config.trail = Some(crate::manifest::TrailConfig {
            emission_rate: 1000.0,
            life_time: 1000.0,
            color_gradient: crate::util::Gradient::solid(0.0, 1.0, 0.5),
            size: 1.0,
        });
        let id = sub.create_carrier(config, Vector3::ZERO, Vector3::new(0.0, 100.0, 0.0), 0.0);
        for _ in 0..120 {
            sub.update(1.0 / 60.0, &mut rng);
        }
        assert_eq!(sub.get(id).unwrap().trail.len(), 5);
    }

    #[test]
    fn set_max_trail_particles_applies_to_in_flight_carriers() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sub = CarrierSubsystem::new(1000);
        let mut config = linear_config(10.0);
        config.trail = Some(crate::manifest::TrailConfig {
            emission_rate: 1000.0,
            life_time: 1000.0,
            color_gradient: crate::util::Gradient::solid(0.0, 1.0, 0.5),
            size: 1.0,
        });
        let id = sub.create_carrier(config, Vector3::ZERO, Vector3::new(0.0, 100.0, 0.0), 0.0);
        sub.set_max_trail_particles(3);
        for _ in 0..120 {
            sub.update(1.0 / 60.0, &mut rng);
        }
        assert_eq!(sub.get(id).unwrap().trail.len(), 3);
    }
}
