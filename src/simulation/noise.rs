//! Seeded 2D gradient noise
//!
//! Used as a deterministic tie-breaking and weighting source during road-grid
//! generation. A shuffled 256-entry permutation table hashes each lattice
//! corner to a pseudo-gradient, and values are blended with a quintic easing
//! curve so nearby inputs produce similar outputs.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Permutation-table gradient noise sampler
///
/// Construction consumes the episode RNG once to shuffle the table; sampling
/// afterwards is pure, so the same seed always yields the same field.
#[derive(Debug, Clone)]
pub struct PerlinNoise {
    // 256 shuffled indices, doubled so corner lookups never wrap
    perm: Vec<usize>,
}

impl PerlinNoise {
    pub fn new(rng: &mut StdRng) -> Self {
        let mut table: Vec<usize> = (0..256).collect();
        table.shuffle(rng);
        let mut perm = table.clone();
        perm.extend_from_slice(&table);
        Self { perm }
    }

    /// Quintic easing curve, zero first and second derivatives at 0 and 1
    fn fade(t: f64) -> f64 {
        t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
    }

    fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + t * (b - a)
    }

    /// Dot product of a hashed corner gradient with the offset vector
    fn grad(hash: usize, x: f64, y: f64) -> f64 {
        match hash & 3 {
            0 => x + y,
            1 => -x + y,
            2 => x - y,
            _ => -x - y,
        }
    }

    /// Sample the field at `(x, y)`; output is roughly in `[-1, 1]`
    pub fn noise(&self, x: f64, y: f64) -> f64 {
        let xi = (x.floor() as i64 & 255) as usize;
        let yi = (y.floor() as i64 & 255) as usize;
        let xf = x - x.floor();
        let yf = y - y.floor();

        let u = Self::fade(xf);
        let v = Self::fade(yf);

        let aa = self.perm[self.perm[xi] + yi];
        let ab = self.perm[self.perm[xi] + yi + 1];
        let ba = self.perm[self.perm[xi + 1] + yi];
        let bb = self.perm[self.perm[xi + 1] + yi + 1];

        let x1 = Self::lerp(Self::grad(aa, xf, yf), Self::grad(ba, xf - 1.0, yf), u);
        let x2 = Self::lerp(
            Self::grad(ab, xf, yf - 1.0),
            Self::grad(bb, xf - 1.0, yf - 1.0),
            u,
        );
        Self::lerp(x1, x2, v)
    }
}
