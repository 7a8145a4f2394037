//! Headless demonstration of the simulation core: one rocket-carried
//! firework that bursts into a sphere, morphs into a heart, then falls dark.
//! Rendering and audio are out of scope for this crate (spec.md §1
//! Non-goals); this binary only drives the clock and logs aggregate stats,
//! the way the teacher's `main.rs` drove its physic engine ahead of wiring
//! up a renderer.

use log::info;

use pyrostream::director::Director;
use pyrostream::forces::ForceField;
use pyrostream::manifest::{
    Blending, CarrierConfig, CarrierType, DynamicsConfig, FireworkManifest, InitialVelocityConfig, InitialVelocityMode, PathConfig, PathType, Payload,
    PayloadStage, RenderingConfig, ScalarOrRange, TopologyConfig, TrailConfig, TransitionMode,
};
use pyrostream::util::{Curve, Gradient, GradientStop, Vector3};
use pyrostream::EngineConfig;

fn gold_gradient() -> Gradient {
    Gradient::new(vec![
        GradientStop { position: 0.0, hue: 45.0, saturation: 0.9, lightness: 0.6, alpha: 1.0 },
        GradientStop { position: 1.0, hue: 15.0, saturation: 0.8, lightness: 0.5, alpha: 0.0 },
    ])
}

fn trail_gradient() -> Gradient {
    Gradient::new(vec![GradientStop { position: 0.0, hue: 40.0, saturation: 1.0, lightness: 0.7, alpha: 1.0 }])
}

fn sample_manifest() -> FireworkManifest {
    let burst = PayloadStage {
        id: "burst".into(),
        time_offset: 0.0,
        duration: 1.2,
        topology: TopologyConfig { source: "sphere".into(), resolution: 1500, scale: 35.0, offset: Vector3::ZERO, rotation: None },
        dynamics: DynamicsConfig {
            transition_mode: TransitionMode::Explode,
            initial_velocity: InitialVelocityConfig { mode: InitialVelocityMode::Radial, speed: ScalarOrRange::Range(30.0, 60.0), direction: None },
            force_fields: vec![ForceField::gravity(9.8, Vector3::new(0.0, -1.0, 0.0)), ForceField::drag(0.08)],
            velocity_profile: Curve::ease_in_out(),
            morph_attraction_strength: None,
            morph_damping: None,
        },
        rendering: RenderingConfig {
            color_map: gold_gradient(),
            base_size: 2.5,
            size_curve: Curve::linear(),
            blending: Blending::Additive,
            use_blackbody: true,
            initial_temperature: Some(6500.0),
            cooling_rate: Some(600.0),
            glow_intensity: Some(1.0),
            enable_bloom: true,
            bloom_duration: 0.4,
            grow_duration: 0.3,
        },
        reuse_particles: false,
    };

    let morph = PayloadStage {
        id: "heart".into(),
        time_offset: 1.2,
        duration: 2.0,
        topology: TopologyConfig { source: "heart_3d".into(), resolution: 1500, scale: 30.0, offset: Vector3::ZERO, rotation: None },
        dynamics: DynamicsConfig {
            transition_mode: TransitionMode::Morph,
            initial_velocity: InitialVelocityConfig::default(),
            force_fields: vec![ForceField::drag(0.1)],
            velocity_profile: Curve::linear(),
            morph_attraction_strength: Some(4000.0),
            morph_damping: Some(0.95),
        },
        rendering: RenderingConfig {
            color_map: gold_gradient(),
            base_size: 2.5,
            size_curve: Curve::linear(),
            blending: Blending::Additive,
            use_blackbody: false,
            initial_temperature: None,
            cooling_rate: None,
            glow_intensity: Some(0.6),
            enable_bloom: false,
            bloom_duration: 0.4,
            grow_duration: 0.3,
        },
        reuse_particles: true,
    };

    FireworkManifest {
        id: "gold-heart".into(),
        name: "Gold Heart".into(),
        duration: 6.0,
        carrier: CarrierConfig {
            kind: CarrierType::Rocket,
            path: PathConfig { kind: PathType::Arc, control_points: vec![], speed_curve: Curve::ease_in_out(), spiral_radius: None, spiral_frequency: None },
            duration: 1.4,
            trail: Some(TrailConfig { emission_rate: 80.0, life_time: 0.6, color_gradient: trail_gradient(), size: 0.8 }),
            shape: None,
        },
        payload: Payload { stages: vec![burst, morph] },
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    info!("starting pyrostream demo");

    let config = EngineConfig::from_file("assets/config/engine.toml").unwrap_or_default();
    info!("engine config loaded:\n{config:#?}");

    let mut director = Director::new(config);
    director.register_manifest(sample_manifest());
    director.launch("gold-heart", Vector3::ZERO, Vector3::new(0.0, 90.0, 0.0), Some(45.0));

    let dt = 1.0 / 60.0;
    for tick in 0..600 {
        director.update(dt);
        if tick % 60 == 0 {
            let stats = director.get_stats();
            info!(
                "t={:.2}s active_fireworks={} particles={} trail={}",
                director.get_global_time(),
                stats.active_fireworks,
                stats.total_particles,
                stats.trail_particles,
            );
        }
    }

    info!("demo finished, peak particle count {}", director.get_stats().peak_particles);
    Ok(())
}
