use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::color::hue_lerp_shortarc;

/// One stop in a color [`Gradient`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub position: f32,
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
    pub alpha: f32,
}

/// An ordered sequence of color stops, interpolated in HSL-alpha space.
/// Hue interpolates along the shorter arc modulo 360 (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    stops: Vec<GradientStop>,
}

impl Gradient {
    pub fn new(mut stops: Vec<GradientStop>) -> Self {
        stops.sort_by(|a, b| a.position.partial_cmp(&b.position).unwrap_or(std::cmp::Ordering::Equal));
        if stops.is_empty() {
            stops.push(GradientStop {
                position: 0.0,
                hue: 0.0,
                saturation: 0.0,
                lightness: 1.0,
                alpha: 1.0,
            });
        }
        Self { stops }
    }

    pub fn solid(hue: f32, saturation: f32, lightness: f32) -> Self {
        Self::new(vec![GradientStop {
            position: 0.0,
            hue,
            saturation,
            lightness,
            alpha: 1.0,
        }])
    }

    /// Sample `{hue, saturation, lightness, alpha}` at `t`, clamped to
    /// `[0, 1]`.
    pub fn sample(&self, t: f32) -> (f32, f32, f32, f32) {
        let stops = &self.stops;
        let t = t.clamp(0.0, 1.0);
        if stops.len() == 1 || t <= stops[0].position {
            let s = &stops[0];
            return (s.hue, s.saturation, s.lightness, s.alpha);
        }
        let last = stops.len() - 1;
        if t >= stops[last].position {
            let s = &stops[last];
            return (s.hue, s.saturation, s.lightness, s.alpha);
        }
        for (a, b) in stops.iter().tuple_windows() {
            if t >= a.position && t <= b.position {
                let span = b.position - a.position;
                let local_t = if span.abs() < f32::EPSILON {
                    0.0
                } else {
                    (t - a.position) / span
                };
                let hue = hue_lerp_shortarc(a.hue, b.hue, local_t);
                let saturation = a.saturation + (b.saturation - a.saturation) * local_t;
                let lightness = a.lightness + (b.lightness - a.lightness) * local_t;
                let alpha = a.alpha + (b.alpha - a.alpha) * local_t;
                return (hue, saturation, lightness, alpha);
            }
        }
        let s = &stops[last];
        (s.hue, s.saturation, s.lightness, s.alpha)
    }
}
