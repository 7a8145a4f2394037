//! Seeded 3D Perlin noise, fractal (turbulence) octaves, and curl noise.
//!
//! The permutation table is shuffled once from a fixed seed at construction
//! so that every `ForceFieldSystem` built with the same seed behaves
//! identically across platforms (spec.md §4.1, §6 "Bit-exact requirements").

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

const GRAD3: [[f32; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn grad3(hash: i32, x: f32, y: f32, z: f32) -> f32 {
    let g = &GRAD3[(hash.rem_euclid(12)) as usize];
    g[0] * x + g[1] * y + g[2] * z
}

/// A standard seeded permutation-table Perlin noise generator.
#[derive(Debug, Clone)]
pub struct Perlin {
    perm: [u8; 512],
}

impl Perlin {
    pub fn new(seed: u64) -> Self {
        let mut table: [u8; 256] = [0; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }
        let mut rng = StdRng::seed_from_u64(seed);
        for i in (1..256).rev() {
            let j = rng.random_range(0..=i);
            table.swap(i, j);
        }
        let mut perm = [0u8; 512];
        for i in 0..512 {
            perm[i] = table[i & 255];
        }
        Self { perm }
    }

    #[inline]
    fn perm(&self, i: i32) -> i32 {
        self.perm[(i & 511) as usize] as i32
    }

    /// 3D Perlin noise, returns a value in `[-1, 1]`.
    pub fn noise3(&self, p: Vec3) -> f32 {
        let xi = p.x.floor() as i32;
        let yi = p.y.floor() as i32;
        let zi = p.z.floor() as i32;

        let xf = p.x - xi as f32;
        let yf = p.y - yi as f32;
        let zf = p.z - zi as f32;

        let u = fade(xf);
        let v = fade(yf);
        let w = fade(zf);

        let aaa = self.perm(self.perm(self.perm(xi) + yi) + zi);
        let aba = self.perm(self.perm(self.perm(xi) + yi + 1) + zi);
        let aab = self.perm(self.perm(self.perm(xi) + yi) + zi + 1);
        let abb = self.perm(self.perm(self.perm(xi) + yi + 1) + zi + 1);
        let baa = self.perm(self.perm(self.perm(xi + 1) + yi) + zi);
        let bba = self.perm(self.perm(self.perm(xi + 1) + yi + 1) + zi);
        let bab = self.perm(self.perm(self.perm(xi + 1) + yi) + zi + 1);
        let bbb = self.perm(self.perm(self.perm(xi + 1) + yi + 1) + zi + 1);

        let x1 = lerp(grad3(aaa, xf, yf, zf), grad3(baa, xf - 1.0, yf, zf), u);
        let x2 = lerp(grad3(aba, xf, yf - 1.0, zf), grad3(bba, xf - 1.0, yf - 1.0, zf), u);
        let y1 = lerp(x1, x2, v);

        let x1 = lerp(grad3(aab, xf, yf, zf - 1.0), grad3(bab, xf - 1.0, yf, zf - 1.0), u);
        let x2 = lerp(grad3(abb, xf, yf - 1.0, zf - 1.0), grad3(bbb, xf - 1.0, yf - 1.0, zf - 1.0), u);
        let y2 = lerp(x1, x2, v);

        lerp(y1, y2, w)
    }

    /// 4-octave fractal Brownian motion, amplitude halving and frequency
    /// doubling per octave, per spec.md §4.1 `turbulence`.
    pub fn fbm4(&self, p: Vec3) -> f32 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut norm = 0.0;
        for _ in 0..4 {
            total += self.noise3(p * frequency) * amplitude;
            norm += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        total / norm
    }

    /// A single vector-valued noise sample, one octave per axis offset by a
    /// fixed vector, for spec.md §4.1 `noise`.
    pub fn noise3_vec(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            self.noise3(p),
            self.noise3(p + Vec3::new(31.3, 7.1, 0.0)),
            self.noise3(p + Vec3::new(0.0, 47.2, 19.7)),
        )
    }

    /// Numerical curl of the 3-channel noise field sampled at offset
    /// origins, epsilon 0.01, per spec.md §4.1 `curl_noise`.
    pub fn curl3(&self, p: Vec3) -> Vec3 {
        const EPS: f32 = 0.01;
        let offset_x = Vec3::new(123.4, 0.0, 0.0);
        let offset_y = Vec3::new(0.0, 231.7, 0.0);
        let offset_z = Vec3::new(0.0, 0.0, 312.9);

        let dx = |q: Vec3, off: Vec3| {
            (self.noise3(q + off + Vec3::new(EPS, 0.0, 0.0))
                - self.noise3(q + off - Vec3::new(EPS, 0.0, 0.0)))
                / (2.0 * EPS)
        };
        let dy = |q: Vec3, off: Vec3| {
            (self.noise3(q + off + Vec3::new(0.0, EPS, 0.0))
                - self.noise3(q + off - Vec3::new(0.0, EPS, 0.0)))
                / (2.0 * EPS)
        };
        let dz = |q: Vec3, off: Vec3| {
            (self.noise3(q + off + Vec3::new(0.0, 0.0, EPS))
                - self.noise3(q + off - Vec3::new(0.0, 0.0, EPS)))
                / (2.0 * EPS)
        };

        // curl(F) where F_x = noise(p+offset_x), F_y = noise(p+offset_y), F_z = noise(p+offset_z)
        let curl_x = dy(p, offset_z) - dz(p, offset_y);
        let curl_y = dz(p, offset_x) - dx(p, offset_z);
        let curl_z = dx(p, offset_y) - dy(p, offset_x);
        Vec3::new(curl_x, curl_y, curl_z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_is_deterministic() {
        let a = Perlin::new(42);
        let b = Perlin::new(42);
        let p = Vec3::new(1.23, -4.5, 6.7);
        assert_eq!(a.noise3(p), b.noise3(p));
    }

    #[test]
    fn different_seeds_usually_differ() {
        let a = Perlin::new(1);
        let b = Perlin::new(2);
        let p = Vec3::new(1.23, -4.5, 6.7);
        assert_ne!(a.noise3(p), b.noise3(p));
    }

    #[test]
    fn noise_is_bounded() {
        let n = Perlin::new(7);
        for i in 0..100 {
            let p = Vec3::new(i as f32 * 0.37, i as f32 * 1.11, -i as f32 * 0.6);
            let v = n.noise3(p);
            assert!((-1.01..=1.01).contains(&v));
        }
    }
}
