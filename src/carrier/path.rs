//! Parametric 3D path evaluation for the carrier subsystem (spec.md §4.3
//! step 2).

use crate::manifest::{PathConfig, PathType};
use crate::util::{lerp_vec3, Vector3};

/// Evaluates `path` at normalized progress `t` (already passed through the
/// path's speed curve by the caller).
pub fn evaluate(path: &PathConfig, start: Vector3, target: Vector3, t: f32) -> Vector3 {
    match path.kind {
        PathType::Linear => lerp_vec3(start, target, t),
        PathType::Bezier3d => bezier(path, start, target, t),
        PathType::Spiral => spiral(path, start, target, t),
        PathType::Helix => helix(path, start, target, t),
        PathType::Arc => arc(start, target, t),
    }
}

fn bezier(path: &PathConfig, start: Vector3, target: Vector3, t: f32) -> Vector3 {
    match path.control_points.as_slice() {
        [p0, p1] => cubic_bezier(start, *p0, *p1, target, t),
        [p0] => quadratic_bezier(start, *p0, target, t),
        _ => {
            // No control points supplied: auto-generate a midpoint control,
            // lifted +20 in Y (spec.md §4.3 "bezier_3d").
            let mid = lerp_vec3(start, target, 0.5) + Vector3::new(0.0, 20.0, 0.0);
            quadratic_bezier(start, mid, target, t)
        }
    }
}

fn quadratic_bezier(p0: Vector3, p1: Vector3, p2: Vector3, t: f32) -> Vector3 {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

fn cubic_bezier(p0: Vector3, p1: Vector3, p2: Vector3, p3: Vector3, t: f32) -> Vector3 {
    let u = 1.0 - t;
    p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
}

/// Linear base + radial offset in the XZ plane, spindle-shaped (spec.md §4.3
/// "spiral").
fn spiral(path: &PathConfig, start: Vector3, target: Vector3, t: f32) -> Vector3 {
    let base = lerp_vec3(start, target, t);
    let radius = path.spiral_radius.unwrap_or(10.0);
    let frequency = path.spiral_frequency.unwrap_or(3.0);
    let radial = (std::f32::consts::PI * t).sin() * radius;
    let angle = t * frequency * 2.0 * std::f32::consts::PI;
    base + Vector3::new(angle.cos() * radial, 0.0, angle.sin() * radial)
}

/// Linear base + sinusoidal lateral offset, dominant X sine, minor Z
/// cosine·0.3 (spec.md §4.3 "helix").
fn helix(path: &PathConfig, start: Vector3, target: Vector3, t: f32) -> Vector3 {
    let base = lerp_vec3(start, target, t);
    let amplitude = path.spiral_radius.unwrap_or(10.0);
    let frequency = path.spiral_frequency.unwrap_or(3.0);
    let angle = t * frequency * 2.0 * std::f32::consts::PI;
    base + Vector3::new(angle.sin() * amplitude, 0.0, angle.cos() * 0.3 * amplitude)
}

/// Linear base + parabolic +Y arc of height 30 (spec.md §4.3 "arc").
fn arc(start: Vector3, target: Vector3, t: f32) -> Vector3 {
    const ARC_HEIGHT: f32 = 30.0;
    let base = lerp_vec3(start, target, t);
    base + Vector3::new(0.0, ARC_HEIGHT * 4.0 * t * (1.0 - t), 0.0)
}
