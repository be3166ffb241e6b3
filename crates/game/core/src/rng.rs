//! Seeded random source for the simulation.
//!
//! Every replica seeds its world with the same value and draws from it in the
//! same order, so the sequence is part of the synchronized state and is folded
//! into the sync hash.

/// PCG random number generator (PCG-XSH-RR, 64-bit state, 32-bit output).
///
/// Unlike a stateless oracle this generator advances on every draw; the draw
/// order is fixed by the deterministic dispatch order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        let mut rng = Self {
            state: mix_seed(seed),
        };
        rng.step();
        rng
    }

    /// Current internal state, included in sync hashes.
    pub fn state(&self) -> u64 {
        self.state
    }

    #[inline]
    fn step(&mut self) {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
    }

    pub fn next_u32(&mut self) -> u32 {
        let old = self.state;
        self.step();
        let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Uniform-ish value in `[low, high)`. Returns `low` for empty ranges.
    pub fn next_range(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        let span = (high as i64 - low as i64) as u64;
        low + (self.next_u32() as u64 % span) as i32
    }

    /// Roll a d100 (1-100 inclusive).
    pub fn roll_d100(&mut self) -> u32 {
        (self.next_u32() % 100) + 1
    }
}

/// SplitMix-style avalanche so that nearby seeds produce unrelated streams.
fn mix_seed(seed: u64) -> u64 {
    let mut hash = seed ^ 0x9e3779b97f4a7c15;
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash
}
