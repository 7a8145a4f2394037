//! HSL interpolation and black-body color mapping.

/// Interpolate two hues (degrees, any range) along the shorter arc modulo
/// 360, per spec.md §3.
pub fn hue_lerp_shortarc(h0: f32, h1: f32, t: f32) -> f32 {
    let h0 = h0.rem_euclid(360.0);
    let h1 = h1.rem_euclid(360.0);
    let mut delta = h1 - h0;
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta < -180.0 {
        delta += 360.0;
    }
    (h0 + delta * t).rem_euclid(360.0)
}

/// Piecewise temperature -> HSL map used when `RenderingConfig::use_blackbody`
/// is enabled (spec.md §4.4.4). Temperature is in Kelvin.
pub fn blackbody_hsl(temperature_k: f32) -> (f32, f32, f32) {
    let t = temperature_k.max(500.0);
    if t >= 7000.0 {
        (210.0, 0.15, 0.95) // blue-white
    } else if t >= 5500.0 {
        (48.0, 0.9, 0.65) // yellow
    } else if t >= 4000.0 {
        (30.0, 0.95, 0.55) // orange
    } else if t >= 2500.0 {
        (8.0, 0.9, 0.45) // red
    } else {
        (0.0, 0.85, 0.25) // dark red
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_arc_crosses_zero_not_one_eighty() {
        // 350 -> 10 should pass through 0, never through 180.
        let mid = hue_lerp_shortarc(350.0, 10.0, 0.5);
        assert!((mid - 0.0).abs() < 1e-3 || (mid - 360.0).abs() < 1e-3);
    }

    #[test]
    fn short_arc_endpoints_are_exact() {
        assert!((hue_lerp_shortarc(350.0, 10.0, 0.0) - 350.0).abs() < 1e-3);
        assert!((hue_lerp_shortarc(350.0, 10.0, 1.0) - 10.0).abs() < 1e-3);
    }

    #[test]
    fn blackbody_floor_is_clamped() {
        let (_, _, l) = blackbody_hsl(0.0);
        assert!(l > 0.0);
    }

    #[test]
    fn blackbody_buckets_are_ordered() {
        let hot = blackbody_hsl(8000.0);
        let cold = blackbody_hsl(1000.0);
        assert_ne!(hot, cold);
    }
}
