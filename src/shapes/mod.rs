//! The shape generator: a pure function mapping a shape name + resolution +
//! scale to a point cloud (spec.md §1, §6).
//!
//! The real shape library (hard-coded generators for dozens of named shapes)
//! is an external collaborator per spec.md's Non-goals. This module supplies
//! the *contract* — `generate(name, resolution, scale) -> Vec<Vector3>` — and
//! a small built-in registry good enough to drive the engine's own tests and
//! demo binary. A host swaps in its own generators by calling
//! [`generate_with`] with a different lookup function; nothing downstream
//! cares which one produced the points.

use crate::util::Vector3;

/// Generate `resolution` points for `shape_name` at `scale`. Unknown shape
/// names yield an empty point cloud (spec.md §6, §7) rather than an error —
/// the director logs a warning and the stream spawns zero particles for that
/// stage.
pub fn generate(shape_name: &str, resolution: usize, scale: f32) -> Vec<Vector3> {
    generate_with(shape_name, resolution, scale, |name, _, _| {
        log::warn!("unknown shape '{name}': generating an empty point cloud");
        Vec::new()
    })
}

/// [`generate`], but a name outside the built-in registry (`sphere`, `ring`,
/// `point`, `line`, `heart_3d`) is handed to `fallback` instead of becoming
/// an empty point cloud. A host library with its own shape catalog calls
/// this with a closure over its own lookup; [`generate`] is just this with a
/// fallback that logs and returns nothing.
pub fn generate_with(shape_name: &str, resolution: usize, scale: f32, fallback: impl FnOnce(&str, usize, f32) -> Vec<Vector3>) -> Vec<Vector3> {
    match shape_name {
        "sphere" => sphere(resolution, scale),
        "ring" => ring(resolution, scale),
        "point" => vec![Vector3::ZERO; resolution],
        "line" => line(resolution, scale),
        "heart_3d" => heart_3d(resolution, scale),
        other => fallback(other, resolution, scale),
    }
}

/// Uniform points on a sphere surface of the given radius, via the golden
/// angle spiral method (deterministic, no RNG dependency).
fn sphere(resolution: usize, scale: f32) -> Vec<Vector3> {
    if resolution == 0 {
        return Vec::new();
    }
    let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
    (0..resolution)
        .map(|i| {
            let y = 1.0 - (i as f32 / (resolution.max(2) - 1) as f32) * 2.0;
            let radius_at_y = (1.0 - y * y).max(0.0).sqrt();
            let theta = golden_angle * i as f32;
            Vector3::new(theta.cos() * radius_at_y, y, theta.sin() * radius_at_y) * scale
        })
        .collect()
}

fn ring(resolution: usize, scale: f32) -> Vec<Vector3> {
    if resolution == 0 {
        return Vec::new();
    }
    (0..resolution)
        .map(|i| {
            let angle = 2.0 * std::f32::consts::PI * i as f32 / resolution as f32;
            Vector3::new(angle.cos(), 0.0, angle.sin()) * scale
        })
        .collect()
}

fn line(resolution: usize, scale: f32) -> Vec<Vector3> {
    if resolution <= 1 {
        return vec![Vector3::ZERO; resolution];
    }
    (0..resolution)
        .map(|i| {
            let t = i as f32 / (resolution - 1) as f32;
            Vector3::new((t - 0.5) * 2.0 * scale, 0.0, 0.0)
        })
        .collect()
}

/// A parametric 3D heart curve, extruded slightly in depth so a morph target
/// reads as a volume rather than a flat outline.
fn heart_3d(resolution: usize, scale: f32) -> Vec<Vector3> {
    if resolution == 0 {
        return Vec::new();
    }
    (0..resolution)
        .map(|i| {
            let t = 2.0 * std::f32::consts::PI * i as f32 / resolution as f32;
            let x = 16.0 * t.sin().powi(3);
            let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
            let z = (t * 3.0).sin() * 2.0;
            Vector3::new(x, y, z) * (scale / 16.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_shape_is_empty() {
        assert!(generate("does_not_exist", 10, 1.0).is_empty());
    }

    #[test]
    fn sphere_has_requested_count_and_radius() {
        let points = generate("sphere", 500, 10.0);
        assert_eq!(points.len(), 500);
        for p in &points {
            assert!((p.length() - 10.0).abs() < 1e-2);
        }
    }

    #[test]
    fn zero_resolution_is_empty() {
        assert!(generate("sphere", 0, 1.0).is_empty());
    }

    #[test]
    fn generate_with_falls_back_for_unknown_names() {
        let points = generate_with("star_5", 7, 2.0, |name, resolution, _| {
            assert_eq!(name, "star_5");
            vec![Vector3::ZERO; resolution]
        });
        assert_eq!(points.len(), 7);
    }

    #[test]
    fn generate_with_still_uses_the_built_in_registry() {
        let points = generate_with("ring", 16, 1.0, |_, _, _| panic!("fallback should not run for a known shape"));
        assert_eq!(points.len(), 16);
    }
}
