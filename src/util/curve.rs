use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// An ordered sequence of `(x, y)` control points in `[0, 1]^2`, evaluated as
/// piecewise-linear interpolation clamped at the endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    points: Vec<(f32, f32)>,
}

impl Curve {
    /// Builds a curve from control points. Points are sorted by `x`.
    pub fn new(mut points: Vec<(f32, f32)>) -> Self {
        points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        if points.is_empty() {
            points.push((0.0, 0.0));
            points.push((1.0, 1.0));
        }
        Self { points }
    }

    /// The identity curve `y = x`, used as a default `velocity_profile` /
    /// `size_curve` / `speed_curve` when a manifest omits one.
    pub fn linear() -> Self {
        Self::new(vec![(0.0, 0.0), (1.0, 1.0)])
    }

    pub fn constant(y: f32) -> Self {
        Self::new(vec![(0.0, y), (1.0, y)])
    }

    /// Evaluate the curve at `x`, clamping `x` to the curve's domain.
    pub fn eval(&self, x: f32) -> f32 {
        let points = &self.points;
        if x <= points[0].0 {
            return points[0].1;
        }
        let last = points.len() - 1;
        if x >= points[last].0 {
            return points[last].1;
        }
        for ((x0, y0), (x1, y1)) in points.iter().copied().tuple_windows() {
            if x >= x0 && x <= x1 {
                let span = x1 - x0;
                let t = if span.abs() < f32::EPSILON { 0.0 } else { (x - x0) / span };
                return y0 + (y1 - y0) * t;
            }
        }
        points[last].1
    }

    /// Standard cubic ease-in-out, used as the morphing engine's default
    /// easing curve (spec.md §4.2).
    pub fn ease_in_out() -> Self {
        Self::new(vec![
            (0.0, 0.0),
            (0.25, 0.0625),
            (0.5, 0.5),
            (0.75, 0.9375),
            (1.0, 1.0),
        ])
    }
}

impl Default for Curve {
    fn default() -> Self {
        Self::linear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_curve_is_identity() {
        let c = Curve::linear();
        for x in [0.0, 0.1, 0.5, 0.9, 1.0] {
            assert!((c.eval(x) - x).abs() < 1e-6);
        }
    }

    #[test]
    fn clamps_outside_domain() {
        let c = Curve::new(vec![(0.2, 1.0), (0.8, 3.0)]);
        assert_eq!(c.eval(-5.0), 1.0);
        assert_eq!(c.eval(5.0), 3.0);
    }

    #[test]
    fn piecewise_interpolates_between_segments() {
        let c = Curve::new(vec![(0.0, 0.0), (0.5, 10.0), (1.0, 0.0)]);
        assert!((c.eval(0.25) - 5.0).abs() < 1e-6);
        assert!((c.eval(0.75) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn empty_points_fall_back_to_linear() {
        let c = Curve::new(vec![]);
        assert_eq!(c.eval(0.0), 0.0);
        assert_eq!(c.eval(1.0), 1.0);
    }
}
