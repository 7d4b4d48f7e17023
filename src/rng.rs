//! Random source and distribution helpers
//!
//! The simulation never touches a global generator: every draw goes through a
//! [`RandomSource`], so tests can swap in a seeded or scripted source.

use glam::Vec2;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::{CreatureKind, PerKind};

/// Source of uniform samples in `[0, 1)`
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

impl<R: rand::RngCore> RandomSource for R {
    #[inline]
    fn next_unit(&mut self) -> f64 {
        self.random::<f64>()
    }
}

/// Default generator for a run
pub fn seeded(seed: u64) -> Pcg32 {
    Pcg32::seed_from_u64(seed)
}

/// Draw a creature kind proportionally to `weights`.
///
/// Kinds are walked in declaration order and the first whose cumulative
/// weight exceeds the draw wins. A draw at or past the total (only possible
/// through float rounding or a misbehaving source) resolves to the last kind
/// with positive weight. A zero total falls back to a uniform pick; validated
/// configs never produce one.
pub fn weighted_kind<R: RandomSource + ?Sized>(rng: &mut R, weights: &PerKind<f32>) -> CreatureKind {
    let total: f32 = weights.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 || !total.is_finite() {
        let idx = (rng.next_unit() * CreatureKind::ALL.len() as f64) as usize;
        return CreatureKind::ALL[idx.min(CreatureKind::ALL.len() - 1)];
    }

    let r = rng.next_unit() as f32 * total;
    let mut cumulative = 0.0;
    let mut last_positive = CreatureKind::Common;
    for (kind, weight) in weights.iter() {
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        last_positive = kind;
        if r < cumulative {
            return kind;
        }
    }
    last_positive
}

/// Uniform angle in `[0, 2π)`
pub fn uniform_angle<R: RandomSource + ?Sized>(rng: &mut R) -> f32 {
    let theta = (rng.next_unit() * std::f64::consts::TAU) as f32;
    if theta >= std::f32::consts::TAU { 0.0 } else { theta }
}

/// Uniform value in `[min, max)` (returns `min` when the range is empty)
#[inline]
pub fn uniform_in_range<R: RandomSource + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + (rng.next_unit() as f32) * (max - min)
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}
