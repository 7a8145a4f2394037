//! The morphing engine: particle-to-target assignment and
//! interpolation/physical convergence (spec.md §4.2).
//!
//! Grounded in the teacher's `explosion_shape.rs` (weighted/sampled
//! selection among candidate target sets) generalized to per-particle
//! nearest-target assignment, and in `rocket.rs`'s `update(&mut self, rng:
//! &mut impl Rng, ..)` seam for injectable randomness (excess-particle
//! drift).

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::util::{clamp01_or_one, lerp_vec3, Curve, Vector3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MorphMode {
    Smooth,
    Snap,
    Physics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MorphConfig {
    pub duration: f32,
    pub easing: Curve,
    pub mode: MorphMode,
    pub attraction_strength: f32,
    pub damping: f32,
    pub max_speed: f32,
    pub arrival_threshold: f32,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            duration: 1.5,
            easing: Curve::ease_in_out(),
            mode: MorphMode::Physics,
            attraction_strength: 6000.0,
            damping: 0.95,
            max_speed: 8000.0,
            arrival_threshold: 1.0,
        }
    }
}

/// One particle under the morphing engine's control, mirroring a single
/// particle-stream slot by `pool_index` (spec.md §3, §9 "Pooling": indices,
/// not pointers, stored by the morphing engine's mirror array).
#[derive(Debug, Clone)]
pub struct MorphParticle {
    pub pool_index: usize,
    pub position: Vector3,
    pub velocity: Vector3,
    pub target: Vector3,
    pub origin: Vector3,
    pub morph_progress: f32,
    pub is_morphing: bool,
    pub is_excess: bool,
}

/// Greedy nearest-distance matching below the `10^6` pair budget, else
/// index-order fallback (spec.md §4.2 "Assignment").
const GREEDY_PAIR_BUDGET: u64 = 1_000_000;

fn greedy_match(candidates: &[(usize, Vector3)], targets: &[Vector3]) -> Vec<(usize, usize)> {
    let mut pairs: Vec<(f32, usize, usize)> = Vec::with_capacity(candidates.len() * targets.len());
    for (ci, &(_, p)) in candidates.iter().enumerate() {
        for (ti, t) in targets.iter().enumerate() {
            pairs.push(((p - *t).length_squared(), ci, ti));
        }
    }
    // Tie-break falls back to encounter order in the sorted list (spec.md §6).
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut assigned_particle = vec![false; candidates.len()];
    let mut assigned_target = vec![false; targets.len()];
    let mut result = Vec::with_capacity(candidates.len().min(targets.len()));
    for (_, ci, ti) in pairs {
        if !assigned_particle[ci] && !assigned_target[ti] {
            assigned_particle[ci] = true;
            assigned_target[ti] = true;
            result.push((candidates[ci].0, ti));
        }
    }
    result
}

/// Returns, for each input position, `Some(target_index)` or `None` if the
/// particle is excess (spec.md §4.2 "Assignment (policy by count)").
fn assign(positions: &[Vector3], targets: &[Vector3]) -> Vec<Option<usize>> {
    let n = positions.len();
    let m = targets.len();
    if m == 0 || n == 0 {
        return vec![None; n];
    }

    if n <= m {
        if (n as u64) * (m as u64) <= GREEDY_PAIR_BUDGET {
            let candidates: Vec<(usize, Vector3)> = positions.iter().copied().enumerate().collect();
            let pairs = greedy_match(&candidates, targets);
            let mut out = vec![None; n];
            for (pi, ti) in pairs {
                out[pi] = Some(ti);
            }
            out
        } else {
            (0..n).map(|i| Some(i % m)).collect()
        }
    } else {
        let centroid = positions.iter().fold(Vector3::ZERO, |acc, &p| acc + p) / n as f32;
        let mut by_distance: Vec<(usize, f32)> = positions.iter().enumerate().map(|(i, &p)| (i, (p - centroid).length_squared())).collect();
        by_distance.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let excess_count = n - m;
        let excess: std::collections::HashSet<usize> = by_distance[..excess_count].iter().map(|&(i, _)| i).collect();

        let remainder: Vec<(usize, Vector3)> = positions.iter().copied().enumerate().filter(|(i, _)| !excess.contains(i)).collect();
        let pairs = if (remainder.len() as u64) * (m as u64) <= GREEDY_PAIR_BUDGET {
            greedy_match(&remainder, targets)
        } else {
            remainder.iter().enumerate().map(|(k, &(pi, _))| (pi, k % m)).collect()
        };

        let mut out = vec![None; n];
        for (pi, ti) in pairs {
            out[pi] = Some(ti);
        }
        out
    }
}

/// A single in-flight morph: owns the assigned particle mirror and the
/// shared progress timer (spec.md §4.2).
#[derive(Debug, Clone)]
pub struct MorphSession {
    pub config: MorphConfig,
    elapsed: f32,
    particles: Vec<MorphParticle>,
}

impl MorphSession {
    /// `origins`: `(pool_index, position, velocity)` for every particle
    /// entering the morph. `targets`: the new topology's points.
    pub fn new(origins: &[(usize, Vector3, Vector3)], targets: &[Vector3], config: MorphConfig) -> Self {
        let positions: Vec<Vector3> = origins.iter().map(|&(_, p, _)| p).collect();
        let assignment = assign(&positions, targets);

        let particles = origins
            .iter()
            .zip(assignment)
            .map(|(&(pool_index, position, velocity), target_idx)| {
                let is_excess = target_idx.is_none();
                let target = target_idx.map(|ti| targets[ti]).unwrap_or(position);
                MorphParticle { pool_index, position, velocity, target, origin: position, morph_progress: 0.0, is_morphing: !is_excess, is_excess }
            })
            .collect();

        Self { config, elapsed: 0.0, particles }
    }

    pub fn particles(&self) -> &[MorphParticle] {
        &self.particles
    }

    /// Advances the session one tick. Returns `true` once the shared timer
    /// reaches the configured duration (spec.md §4.2 "Completion").
    pub fn tick(&mut self, dt: f32, rng: &mut impl Rng) -> bool {
        self.elapsed += dt;
        let progress = clamp01_or_one(self.elapsed / self.config.duration.max(f32::EPSILON));

        for particle in &mut self.particles {
            if particle.is_excess {
                drift_excess(particle, dt, rng);
                continue;
            }
            match self.config.mode {
                MorphMode::Smooth => smooth_step(particle, &self.config, progress),
                MorphMode::Snap => snap_step(particle, progress),
                MorphMode::Physics => physics_step(particle, &self.config, dt),
            }
        }

        let completed = progress >= 1.0;
        if completed {
            for particle in &mut self.particles {
                if !particle.is_excess {
                    particle.is_morphing = false;
                    particle.morph_progress = 1.0;
                }
            }
        }
        completed
    }
}

fn smooth_step(particle: &mut MorphParticle, config: &MorphConfig, progress: f32) {
    let eased = clamp01_or_one(config.easing.eval(progress));
    particle.position = lerp_vec3(particle.origin, particle.target, eased);
    particle.morph_progress = progress;
    particle.is_morphing = progress < 1.0;
}

fn snap_step(particle: &mut MorphParticle, progress: f32) {
    if progress >= 0.5 {
        particle.position = particle.target;
        particle.morph_progress = 1.0;
        particle.is_morphing = false;
    } else {
        particle.morph_progress = 0.0;
        particle.is_morphing = true;
    }
}

fn physics_step(particle: &mut MorphParticle, config: &MorphConfig, dt: f32) {
    let delta = particle.target - particle.position;
    let dist_sq = delta.length_squared();

    if dist_sq < config.arrival_threshold {
        particle.position = particle.target;
        particle.velocity *= 0.1;
        particle.morph_progress = 1.0;
        particle.is_morphing = false;
        return;
    }

    let dist = dist_sq.sqrt();
    let dir = delta / dist;
    particle.velocity += dir * config.attraction_strength * dt;
    particle.velocity *= config.damping;
    let speed = particle.velocity.length();
    if speed > config.max_speed {
        particle.velocity = particle.velocity / speed * config.max_speed;
    }
    particle.position += particle.velocity * dt;

    let origin_dist = (particle.target - particle.origin).length();
    particle.morph_progress = clamp01_or_one(1.0 - dist / origin_dist.max(1e-6));
    particle.is_morphing = true;
}

const EXCESS_DRIFT_STD_DEV: f32 = 5.0;
const EXCESS_DAMPING: f32 = 0.98;

fn drift_excess(particle: &mut MorphParticle, dt: f32, rng: &mut impl Rng) {
    let impulse = Vector3::new(
        rng.random_range(-EXCESS_DRIFT_STD_DEV..EXCESS_DRIFT_STD_DEV),
        rng.random_range(-EXCESS_DRIFT_STD_DEV..EXCESS_DRIFT_STD_DEV),
        rng.random_range(-EXCESS_DRIFT_STD_DEV..EXCESS_DRIFT_STD_DEV),
    );
    particle.velocity = particle.velocity * EXCESS_DAMPING.powf(dt) + impulse * dt;
    particle.position += particle.velocity * dt;
    particle.morph_progress = 1.0;
    particle.is_morphing = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn equal_counts_assign_every_target_once() {
        let positions = vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(10.0, 0.0, 0.0)];
        let targets = vec![Vector3::new(9.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0)];
        let assignment = assign(&positions, &targets);
        assert_eq!(assignment, vec![Some(1), Some(0)]);
    }

    #[test]
    fn excess_particles_are_marked_and_none_reuse_a_target() {
        let positions: Vec<Vector3> = (0..3000).map(|i| Vector3::new(i as f32, 0.0, 0.0)).collect();
        let targets: Vec<Vector3> = (0..1000).map(|i| Vector3::new(i as f32, 100.0, 0.0)).collect();
        let assignment = assign(&positions, &targets);
        let excess = assignment.iter().filter(|a| a.is_none()).count();
        assert_eq!(excess, 2000);
        let mut used = std::collections::HashSet::new();
        for a in assignment.into_iter().flatten() {
            assert!(used.insert(a), "target {a} reused");
        }
    }

    #[test]
    fn smooth_mode_converges_to_target_within_duration() {
        let origins: Vec<(usize, Vector3, Vector3)> = (0..50).map(|i| (i, Vector3::new(i as f32, 0.0, 0.0), Vector3::ZERO)).collect();
        let targets: Vec<Vector3> = (0..50).map(|i| Vector3::new(i as f32, 50.0, 0.0)).collect();
        let config = MorphConfig { mode: MorphMode::Smooth, duration: 1.5, ..Default::default() };
        let mut session = MorphSession::new(&origins, &targets, config);
        let mut rng = StdRng::seed_from_u64(1);
        let mut completed = false;
        for _ in 0..200 {
            completed = session.tick(1.0 / 60.0, &mut rng) || completed;
        }
        assert!(completed);
        for p in session.particles() {
            assert!((p.position - p.target).length() < 1e-3);
            assert!(!p.is_morphing);
        }
    }

    #[test]
    fn physics_mode_eventually_arrives() {
        let origins = vec![(0usize, Vector3::ZERO, Vector3::ZERO)];
        let targets = vec![Vector3::new(30.0, 0.0, 0.0)];
        let config = MorphConfig { mode: MorphMode::Physics, ..Default::default() };
        let mut session = MorphSession::new(&origins, &targets, config);
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..600 {
            session.tick(1.0 / 60.0, &mut rng);
        }
        let p = &session.particles()[0];
        assert!((p.position - p.target).length() < 5.0);
    }
}
