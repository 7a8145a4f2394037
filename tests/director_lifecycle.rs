//! End-to-end scenarios driving the [`Director`] the way a host application
//! would: register a manifest, launch it, and advance the clock.

use pyrostream::director::Director;
use pyrostream::forces::ForceField;
use pyrostream::manifest::{
    Blending, CarrierConfig, CarrierType, DynamicsConfig, FireworkManifest, InitialVelocityConfig, InitialVelocityMode, PathConfig, PathType, Payload,
    PayloadStage, RenderingConfig, ScalarOrRange, TopologyConfig, TrailConfig, TransitionMode,
};
use pyrostream::util::{Curve, Gradient, GradientStop, Vector3};
use pyrostream::EngineConfig;

fn gradient() -> Gradient {
    Gradient::new(vec![GradientStop { position: 0.0, hue: 200.0, saturation: 0.8, lightness: 0.6, alpha: 1.0 }])
}

fn rendering() -> RenderingConfig {
    RenderingConfig {
        color_map: gradient(),
        base_size: 2.0,
        size_curve: Curve::linear(),
        blending: Blending::Additive,
        use_blackbody: false,
        initial_temperature: None,
        cooling_rate: None,
        glow_intensity: None,
        enable_bloom: true,
        bloom_duration: 0.3,
        grow_duration: 0.2,
    }
}

fn burst_stage(duration: f32) -> PayloadStage {
    PayloadStage {
        id: "burst".into(),
        time_offset: 0.0,
        duration,
        topology: TopologyConfig { source: "sphere".into(), resolution: 400, scale: 25.0, offset: Vector3::ZERO, rotation: None },
        dynamics: DynamicsConfig {
            transition_mode: TransitionMode::Explode,
            initial_velocity: InitialVelocityConfig { mode: InitialVelocityMode::Radial, speed: ScalarOrRange::Scalar(40.0), direction: None },
            force_fields: vec![ForceField::gravity(10.0, Vector3::new(0.0, -1.0, 0.0)), ForceField::drag(0.05)],
            velocity_profile: Curve::linear(),
            morph_attraction_strength: None,
            morph_damping: None,
        },
        rendering: rendering(),
        reuse_particles: false,
    }
}

fn manifest_with_carrier(id: &str, kind: CarrierType, carrier_duration: f32, stage_duration: f32) -> FireworkManifest {
    FireworkManifest {
        id: id.into(),
        name: id.into(),
        duration: 10.0,
        carrier: CarrierConfig {
            kind,
            path: PathConfig { kind: PathType::Linear, control_points: vec![], speed_curve: Curve::linear(), spiral_radius: None, spiral_frequency: None },
            duration: carrier_duration,
            trail: Some(TrailConfig { emission_rate: 50.0, life_time: 0.4, color_gradient: gradient(), size: 0.6 }),
            shape: None,
        },
        payload: Payload { stages: vec![burst_stage(stage_duration)] },
    }
}

#[test]
fn rocket_carrier_launches_climbs_and_bursts() {
    let mut director = Director::new(EngineConfig::default());
    director.register_manifest(manifest_with_carrier("rocket-burst", CarrierType::Rocket, 0.4, 1.0));
    director.launch("rocket-burst", Vector3::ZERO, Vector3::new(0.0, 90.0, 0.0), Some(210.0)).unwrap();

    let mut saw_particles = false;
    for _ in 0..180 {
        director.update(1.0 / 60.0);
        if director.get_stats().total_particles > 0 {
            saw_particles = true;
        }
    }
    assert!(saw_particles, "burst should have spawned particles after the carrier arrived");
}

#[test]
fn firework_is_removed_once_extinct() {
    let mut director = Director::new(EngineConfig::default());
    director.register_manifest(manifest_with_carrier("short-lived", CarrierType::Rocket, 0.05, 0.2));
    director.launch("short-lived", Vector3::ZERO, Vector3::new(0.0, 50.0, 0.0), Some(30.0));

    let mut t = 0.0;
    while t < 12.0 && director.get_stats().active_fireworks > 0 {
        director.update(1.0 / 60.0);
        t += 1.0 / 60.0;
    }
    assert_eq!(director.get_stats().active_fireworks, 0, "firework should have fully extinguished and been removed by t={t}");
}

#[test]
fn reset_drops_all_in_flight_state() {
    let mut director = Director::new(EngineConfig::default());
    director.register_manifest(manifest_with_carrier("to-reset", CarrierType::Rocket, 0.2, 1.0));
    director.launch("to-reset", Vector3::ZERO, Vector3::new(0.0, 60.0, 0.0), Some(90.0));
    for _ in 0..30 {
        director.update(1.0 / 60.0);
    }
    assert!(director.get_stats().active_fireworks > 0);

    director.reset();
    assert_eq!(director.get_stats().active_fireworks, 0);
    assert_eq!(director.get_global_time(), 0.0);
    assert_eq!(director.get_all_particles().count(), 0);
    assert_eq!(director.get_all_carriers().count(), 0);
}

#[test]
fn time_scale_below_minimum_clamps_and_slows_the_clock() {
    let config = EngineConfig::default();
    let min_scale = config.min_time_scale;
    let mut director = Director::new(config);
    director.register_manifest(manifest_with_carrier("slow", CarrierType::Rocket, 0.2, 1.0));
    director.launch("slow", Vector3::ZERO, Vector3::new(0.0, 60.0, 0.0), Some(90.0));
    director.set_time_scale(0.0);

    for _ in 0..60 {
        director.update(1.0 / 60.0);
    }
    let expected = 1.0 * min_scale;
    assert!((director.get_global_time() - expected).abs() < 1e-3, "global_time = {}, expected ~{expected}", director.get_global_time());
}
