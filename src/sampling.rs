//! Caller-owned random sources and row pre-sampling.
//!
//! Every random draw in the crate goes through a [`UnitSource`] that the
//! caller owns and passes by `&mut`. Two reductions with independent
//! sources never interfere, and a test can pin the exact sequence.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A stream of uniform values in `[0, 1)`.
pub trait UnitSource {
    fn next_unit(&mut self) -> f64;
}

/// Sine seeds must stay below this so every counter value is an exact `f64`.
pub const MAX_SINE_SEED: u64 = 1 << 53;

/// The sine-hash generator used by the reference widget:
/// `x = sin(seed) * 10000; seed += 1; x - floor(x)`.
///
/// Cheap and fully reproducible across platforms that share `sin`, which
/// is what lets reductions be compared against recorded reference output.
/// The counter wraps modulo [`MAX_SINE_SEED`].
#[derive(Debug, Clone, PartialEq)]
pub struct SineSequence {
    seed: u64,
}

impl SineSequence {
    pub fn new(seed: u64) -> Self {
        SineSequence {
            seed: seed % MAX_SINE_SEED,
        }
    }

    /// The counter the next draw will use.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for SineSequence {
    fn default() -> Self {
        Self::new(1)
    }
}

impl UnitSource for SineSequence {
    fn next_unit(&mut self) -> f64 {
        let x = (self.seed as f64).sin() * 10000.0;
        self.seed = (self.seed + 1) % MAX_SINE_SEED;
        x - x.floor()
    }
}

/// ChaCha8-backed source for callers that want statistically sound draws.
#[derive(Debug, Clone)]
pub struct ChaChaSource {
    rng: ChaCha8Rng,
}

impl ChaChaSource {
    pub fn new(seed: u64) -> Self {
        ChaChaSource {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl UnitSource for ChaChaSource {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SamplerKind {
    /// Sine-hash sequence (reference-compatible)
    #[default]
    Sine,
    /// ChaCha8 stream cipher RNG
    Chacha,
}

impl SamplerKind {
    pub fn build(self, seed: u64) -> Box<dyn UnitSource + Send> {
        match self {
            SamplerKind::Sine => Box::new(SineSequence::new(seed)),
            SamplerKind::Chacha => Box::new(ChaChaSource::new(seed)),
        }
    }
}

/// How to pick the rows fed into projection and reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowSelection {
    /// The first `sample_size` rows.
    #[default]
    Head,
    /// `sample_size` uniform draws with replacement.
    Random,
}

/// Choose up to `sample_size` row indices out of `total`.
pub fn select_rows<S: UnitSource + ?Sized>(
    total: usize,
    sample_size: usize,
    selection: RowSelection,
    rng: &mut S,
) -> Vec<usize> {
    if total == 0 {
        return vec![];
    }
    match selection {
        RowSelection::Head => (0..total.min(sample_size)).collect(),
        RowSelection::Random => (0..sample_size)
            .map(|_| unit_index(rng.next_unit(), total))
            .collect(),
    }
}

/// Map a unit draw to an index in `0..len`.
pub(crate) fn unit_index(u: f64, len: usize) -> usize {
    ((u * len as f64).floor() as usize).min(len - 1)
}
