//! Exercises [`ForceFieldSystem`] from outside the crate, as a host would
//! when composing force fields for a stage without going through a manifest.

use pyrostream::forces::{ForceField, ForceFieldKind, ForceFieldSystem};
use pyrostream::util::Vector3;

#[test]
fn gravity_and_drag_reach_a_terminal_velocity() {
    let mut system = ForceFieldSystem::new(1);
    system.add(ForceField::gravity(20.0, Vector3::new(0.0, -1.0, 0.0)));
    system.add(ForceField::drag(0.02));

    let mut position = Vector3::ZERO;
    let mut velocity = Vector3::ZERO;
    let mass = 1.0;
    let dt = 1.0 / 60.0;
    for _ in 0..600 {
        let accel = system.acceleration(position, velocity, mass);
        velocity += accel * dt;
        position += velocity * dt;
        system.update_time(dt);
    }
    assert!(velocity.y < 0.0, "should be falling");
    let accel_now = system.acceleration(position, velocity, mass).y;
    assert!(accel_now.abs() < 1.0, "acceleration should have settled near zero at terminal velocity, got {accel_now}");
}

#[test]
fn disabled_fields_contribute_nothing() {
    let mut system = ForceFieldSystem::new(1);
    system.add(ForceField { kind: ForceFieldKind::Wind { strength: 50.0, direction: Vector3::X }, enabled: false });
    let f = system.total_force(Vector3::ZERO, Vector3::ZERO, 1.0);
    assert_eq!(f, Vector3::ZERO);
}

#[test]
fn clearing_fields_removes_every_contribution() {
    let mut system = ForceFieldSystem::new(1);
    system.add(ForceField::gravity(10.0, Vector3::new(0.0, -1.0, 0.0)));
    system.add(ForceField::drag(0.1));
    assert_eq!(system.fields().len(), 2);
    system.clear();
    assert!(system.fields().is_empty());
    assert_eq!(system.total_force(Vector3::ZERO, Vector3::new(1.0, 0.0, 0.0), 1.0), Vector3::ZERO);
}
