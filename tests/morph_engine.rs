//! Exercises [`MorphSession`] directly: assignment policy and per-mode
//! convergence, independent of [`pyrostream::stream::ParticleStream`].

use pyrostream::morph::{MorphConfig, MorphMode, MorphSession};
use pyrostream::util::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn excess_particles_drift_instead_of_reusing_a_target() {
    let origins: Vec<(usize, Vector3, Vector3)> = (0..20).map(|i| (i, Vector3::new(i as f32, 0.0, 0.0), Vector3::ZERO)).collect();
    let targets: Vec<Vector3> = (0..5).map(|i| Vector3::new(i as f32, 50.0, 0.0)).collect();
    let config = MorphConfig { mode: MorphMode::Smooth, duration: 1.0, ..Default::default() };
    let mut session = MorphSession::new(&origins, &targets, config);
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..120 {
        session.tick(1.0 / 60.0, &mut rng);
    }

    let arrived_at_a_target = session.particles().iter().filter(|p| !p.is_excess && targets.iter().any(|t| (p.position - *t).length() < 1e-2)).count();
    assert_eq!(arrived_at_a_target, 5, "exactly one particle should land on each of the 5 targets");
    assert_eq!(session.particles().iter().filter(|p| p.is_excess).count(), 15);
}

#[test]
fn snap_mode_jumps_at_the_midpoint_not_gradually() {
    let origins = vec![(0usize, Vector3::ZERO, Vector3::ZERO)];
    let targets = vec![Vector3::new(100.0, 0.0, 0.0)];
    let config = MorphConfig { mode: MorphMode::Snap, duration: 1.0, ..Default::default() };
    let mut session = MorphSession::new(&origins, &targets, config);
    let mut rng = StdRng::seed_from_u64(3);

    session.tick(0.2, &mut rng);
    assert_eq!(session.particles()[0].position, Vector3::ZERO, "should not have moved before the midpoint");

    session.tick(0.4, &mut rng);
    assert_eq!(session.particles()[0].position, targets[0], "should have snapped exactly at/after the midpoint");
}

#[test]
fn physics_mode_slows_down_on_approach() {
    let origins = vec![(0usize, Vector3::ZERO, Vector3::ZERO)];
    let targets = vec![Vector3::new(50.0, 0.0, 0.0)];
    let config = MorphConfig { mode: MorphMode::Physics, ..Default::default() };
    let mut session = MorphSession::new(&origins, &targets, config);
    let mut rng = StdRng::seed_from_u64(4);

    for _ in 0..600 {
        session.tick(1.0 / 60.0, &mut rng);
    }
    let p = &session.particles()[0];
    assert!((p.position - p.target).length() < 5.0, "should have converged close to the target");
    assert!(!p.is_morphing);
}
