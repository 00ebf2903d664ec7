//! 同一最早时间、同一优先级的候选绑定之间的裁决策略。
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::sim::binding::Binding;

/// Picks one binding among candidates that tie on time and priority.
///
/// `candidates` is never empty and is given in event declaration order,
/// then enumeration order within an event.
pub trait TieBreak {
    fn choose(&mut self, candidates: &[&Binding]) -> usize;
}

/// Always the first candidate encountered.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstEncountered;

impl TieBreak for FirstEncountered {
    fn choose(&mut self, _candidates: &[&Binding]) -> usize {
        0
    }
}

/// Uniform choice from an explicitly seeded generator.
pub struct SeededRandom {
    seed: u64,
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl fmt::Debug for SeededRandom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeededRandom").field("seed", &self.seed).finish()
    }
}

impl TieBreak for SeededRandom {
    fn choose(&mut self, candidates: &[&Binding]) -> usize {
        if candidates.len() <= 1 {
            return 0;
        }
        self.rng.random_range(0..candidates.len())
    }
}
