use serde::{Deserialize, Serialize};

/// Global, rarely-changed engine tuning — distinct from a per-firework
/// [`crate::director::FireworkManifest`]. Grounded in the teacher's
/// `physic_engine::config::PhysicConfig` (serde + TOML, `Default` impl with
/// the same constants the spec names).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default fixed capacity for a particle stream's pool (spec.md §4.4).
    pub default_pool_capacity: usize,
    /// Per-carrier live trail particle cap (spec.md §4.3).
    pub max_trail_particles_per_carrier: usize,
    /// Slack added to `elapsed >= stage_duration` when the director checks
    /// whether a stage has run its course, so a stage duration that's an
    /// exact multiple of the tick rate doesn't flicker a tick late on
    /// float rounding (spec.md §A.3).
    pub stage_tick_epsilon: f32,
    /// Seed for the force-field system's Perlin permutation table, fixed at
    /// construction for determinism (spec.md §4.1).
    pub perlin_seed: u64,
    /// Minimum allowed `time_scale` (spec.md §4.5).
    pub min_time_scale: f32,
    /// Maximum allowed `time_scale` (spec.md §4.5).
    pub max_time_scale: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_pool_capacity: 5000,
            max_trail_particles_per_carrier: 1000,
            stage_tick_epsilon: 1e-4,
            perlin_seed: 1337,
            min_time_scale: 0.1,
            max_time_scale: 5.0,
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_toml() {
        let config = EngineConfig { default_pool_capacity: 42, max_trail_particles_per_carrier: 7, stage_tick_epsilon: 0.002, perlin_seed: 9, min_time_scale: 0.2, max_time_scale: 3.0 };
        let text = toml::to_string(&config).unwrap();
        let back: EngineConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.default_pool_capacity, 42);
        assert_eq!(back.max_trail_particles_per_carrier, 7);
        assert_eq!(back.stage_tick_epsilon, 0.002);
        assert_eq!(back.perlin_seed, 9);
    }
}
