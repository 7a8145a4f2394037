use criterion::{criterion_group, criterion_main, Criterion};

use pyrostream::forces::ForceField;
use pyrostream::manifest::{
    Blending, DynamicsConfig, InitialVelocityConfig, InitialVelocityMode, RenderingConfig, ScalarOrRange, TopologyConfig, TransitionMode,
};
use pyrostream::stream::ParticleStream;
use pyrostream::util::{Curve, Gradient, GradientStop, Vector3};

fn rendering() -> RenderingConfig {
    RenderingConfig {
        color_map: Gradient::new(vec![GradientStop { position: 0.0, hue: 30.0, saturation: 0.8, lightness: 0.6, alpha: 1.0 }]),
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

fn dynamics() -> DynamicsConfig {
    DynamicsConfig {
        transition_mode: TransitionMode::Explode,
        initial_velocity: InitialVelocityConfig { mode: InitialVelocityMode::Radial, speed: ScalarOrRange::Scalar(40.0), direction: None },
        force_fields: vec![ForceField::gravity(10.0, Vector3::new(0.0, -1.0, 0.0)), ForceField::drag(0.05)],
        velocity_profile: Curve::linear(),
        morph_attraction_strength: None,
        morph_damping: None,
    }
}

fn topology() -> TopologyConfig {
    TopologyConfig { source: "sphere".into(), resolution: 5000, scale: 25.0, offset: Vector3::ZERO, rotation: None }
}

/// The cost a renderer-bound host actually pays every frame: the spawn
/// burst for a large stage, then a run of physics ticks at a 60Hz step.
fn spawn_and_update(c: &mut Criterion) {
    c.bench_function("particle_stream_spawn_5000", |b| {
        b.iter(|| {
            let mut stream = ParticleStream::new(5000, Vector3::ZERO, 1337, 1);
            stream.spawn(5000, &topology(), &dynamics(), &rendering());
        })
    });

    c.bench_function("particle_stream_update_5000_particles_60_ticks", |b| {
        b.iter_batched(
            || {
                let mut stream = ParticleStream::new(5000, Vector3::ZERO, 1337, 1);
                stream.spawn(5000, &topology(), &dynamics(), &rendering());
                stream
            },
            |mut stream| {
                for _ in 0..60 {
                    stream.update(1.0 / 60.0);
                }
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, spawn_and_update);
criterion_main!(benches);
