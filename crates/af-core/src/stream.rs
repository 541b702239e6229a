//! Seeded, reproducible uniform draws.
//!
//! Every synthesized value in a run is a pure function of the rule table, previously
//! derived values, and draws from one [`DeterministicStream`]. There is no process-wide
//! RNG: a run constructs its own stream from the geometry [`Seed`] and passes it by
//! `&mut` into each synthesis step.
//!
//! Draw-order contract for one run (numbered so refactors cannot reorder it silently):
//!
//! 1. D1: design parameters, one draw per rule in table order.
//! 2. D2: aero coefficients, four draws (Cd band, Cl band, drag split, balance).
//! 3. D3: four forks via [`DeterministicStream::fork`], in [`Lane::ALL`] order.
//!    Each consumer then draws only from its own child stream, so the consumers can
//!    run in parallel and tier-dependent sample counts never shift D1 or D2.

use serde::{Deserialize, Serialize};

/// Park–Miller modulus, 2^31 - 1.
pub const MODULUS: u64 = 2_147_483_647;
/// Park–Miller minimal-standard multiplier.
pub const MULTIPLIER: u64 = 16_807;

const FORK_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Geometry-derived seed for one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(pub u64);

impl Seed {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for Seed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Independent consumers that each receive a forked child stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lane {
    Convergence,
    FlowField,
    Race,
    Narrative,
}

impl Lane {
    /// Fork order. Changing it changes every downstream artifact.
    pub const ALL: [Lane; 4] = [Lane::Convergence, Lane::FlowField, Lane::Race, Lane::Narrative];

    fn salt(self) -> u64 {
        match self {
            Lane::Convergence => 0x11,
            Lane::FlowField => 0x23,
            Lane::Race => 0x37,
            Lane::Narrative => 0x4B,
        }
    }
}

/// Linear congruential generator producing values in `[0, 1)`.
///
/// Two streams built from the same [`Seed`] produce identical sequences element for
/// element, for as long as they are drawn the same number of times.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeterministicStream {
    state: u64,
    draws: u64,
}

impl DeterministicStream {
    pub fn new(seed: Seed) -> Self {
        let mut state = seed.0 % MODULUS;
        if state == 0 {
            state = MODULUS - 1;
        }
        Self { state, draws: 0 }
    }

    fn next_state(&mut self) -> u64 {
        // state < 2^31 and MULTIPLIER < 2^15, so the product fits in u64
        self.state = (self.state * MULTIPLIER) % MODULUS;
        self.draws += 1;
        self.state
    }

    /// Next uniform value in `[0, 1)`.
    pub fn draw(&mut self) -> f64 {
        let s = self.next_state();
        (s - 1) as f64 / (MODULUS - 1) as f64
    }

    /// Uniform value in `[lo, hi)`.
    pub fn draw_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.draw()
    }

    /// Uniform value in `[-spread, spread)`.
    pub fn draw_centered(&mut self, spread: f64) -> f64 {
        spread * (2.0 * self.draw() - 1.0)
    }

    /// Uniform index in `0..len`. Consumes one draw even when `len` is 0.
    pub fn draw_index(&mut self, len: usize) -> usize {
        let u = self.draw();
        if len == 0 {
            return 0;
        }
        ((u * len as f64) as usize).min(len - 1)
    }

    /// Consume one draw and derive an independent child stream for `lane`.
    pub fn fork(&mut self, lane: Lane) -> DeterministicStream {
        let raw = self.next_state();
        let child = raw.wrapping_mul(FORK_MIX).wrapping_add(lane.salt());
        DeterministicStream::new(Seed(child))
    }

    /// Number of draws taken so far (forks count as one).
    pub fn draws_taken(&self) -> u64 {
        self.draws
    }
}

impl Iterator for DeterministicStream {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.draw())
    }
}
