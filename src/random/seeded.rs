//! Deterministic pseudo-random source for all stochastic visual placement.
//!
//! Every random decision made while rendering (particle positions, shard directions, drift
//! angles) routes through [`SeededRng`], so a frame can be recomputed bit-identically on any
//! platform from the same seed. Identifiers (line ids, comment ids) are turned into seeds with
//! [`hash_seed`], which removes the need to persist positions.

use crate::foundation::math::fnv1a32;

/// Derive a stable 32-bit seed from an identifier string.
pub fn hash_seed(key: &str) -> u32 {
    fnv1a32(key.as_bytes())
}

/// Restartable mulberry32 stream producing floats in `[0, 1)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeededRng {
    seed: u32,
    state: u32,
}

impl SeededRng {
    /// Create a stream from a numeric seed.
    pub fn new(seed: u32) -> Self {
        Self { seed, state: seed }
    }

    /// Create a stream from an identifier via [`hash_seed`].
    pub fn from_key(key: &str) -> Self {
        Self::new(hash_seed(key))
    }

    /// Seed this stream was constructed with.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Restart the sequence from the construction seed.
    pub fn reset(&mut self) {
        self.state = self.seed;
    }

    /// Next raw 32-bit output.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Next float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Uniform float in `[lo, hi)`.
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Uniform integer in `[0, n)`; returns 0 when `n == 0`.
    pub fn index(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        ((self.next_f64() * n as f64) as usize).min(n - 1)
    }

    /// `true` with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick one element, or `None` for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let i = self.index(items.len());
        items.get(i)
    }

    /// Uniform point inside the unit disc scaled by `radius`.
    pub fn in_disc(&mut self, radius: f64) -> kurbo::Vec2 {
        let angle = self.range(0.0, std::f64::consts::TAU);
        let r = radius * self.next_f64().sqrt();
        kurbo::Vec2::new(r * angle.cos(), r * angle.sin())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/random/seeded.rs"]
mod tests;
