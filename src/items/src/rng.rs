//src/items/src/rng.rs
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// Source of randomness shared by every progression engine.
///
/// Engines never reach for a global generator; they take one of these so a
/// test can force a success, failure or destruction branch deterministically.
pub trait RandomSource {
    /// Uniform value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Raw random bits, used for identifiers.
    fn next_u64(&mut self) -> u64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn next_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "next_index on an empty range");
        ((self.next_f64() * len as f64) as usize).min(len.saturating_sub(1))
    }

    /// Uniform integer in `low..=high`.
    fn next_in_range(&mut self, low: u32, high: u32) -> u32 {
        debug_assert!(low <= high);
        low + self.next_index((high - low + 1) as usize) as u32
    }
}

/// PCG-backed generator, reproducible from a seed.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: Pcg64,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    /// Seed from the thread generator (non-reproducible play sessions)
    pub fn from_entropy() -> Self {
        Self {
            rng: Pcg64::from_rng(&mut rand::rng()),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.random::<u64>()
    }

    fn next_index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

/// Replays a fixed list of rolls, cycling when it runs out.
///
/// Identifier bits come from an internal counter, so items minted from a
/// script still get distinct ids.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    rolls: Vec<f64>,
    cursor: usize,
    counter: u64,
}

impl ScriptedRandom {
    pub fn new(rolls: impl Into<Vec<f64>>) -> Self {
        let mut rolls = rolls.into();
        if rolls.is_empty() {
            rolls.push(0.0);
        }
        Self {
            rolls,
            cursor: 0,
            counter: 0,
        }
    }

    /// Every roll returns `roll`
    pub fn constant(roll: f64) -> Self {
        Self::new(vec![roll])
    }

    /// Number of rolls consumed so far
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        let roll = self.rolls[self.cursor % self.rolls.len()];
        self.cursor += 1;
        roll
    }

    fn next_u64(&mut self) -> u64 {
        // splitmix64
        self.counter = self.counter.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.counter;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}
