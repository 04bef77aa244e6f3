use rand::{rngs::StdRng, RngCore, SeedableRng};

/// Source of randomness for rolls, chaotic dice sets and rainbow effects.
///
/// Everything random in the engine goes through this trait so tests can
/// inject a scripted sequence.
pub trait RandomSource {
    fn next_u64(&mut self) -> u64;

    fn pick_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next_u64() % len as u64) as usize
    }
}

#[derive(Debug, Clone)]
pub struct RngState {
    seed: u64,
    rng: StdRng,
}

impl RngState {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for RngState {
    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }
}

/// Replays a fixed sequence of raw values, wrapping around at the end.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRng {
    values: Vec<u64>,
    cursor: usize,
}

impl ScriptedRng {
    pub fn new(values: Vec<u64>) -> Self {
        Self { values, cursor: 0 }
    }

    /// Script that makes each standard die land on the given face, assuming
    /// faces are `1..=6` in order.
    pub fn faces(faces: &[i32]) -> Self {
        Self::new(
            faces
                .iter()
                .map(|face| (*face as i64 - 1).max(0) as u64)
                .collect(),
        )
    }

    pub fn push(&mut self, value: u64) {
        self.values.push(value);
    }
}

impl RandomSource for ScriptedRng {
    fn next_u64(&mut self) -> u64 {
        if self.values.is_empty() {
            return 0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = self.cursor.saturating_add(1);
        value
    }
}
