//! Multiplication facts and the generators that draw them

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// A single multiplication fact `a × b`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fact {
    /// Table the fact was drawn from
    pub a: u32,
    /// Operand in `1..=max_operand`
    pub b: u32,
}

impl Fact {
    pub const fn new(a: u32, b: u32) -> Self {
        Self { a, b }
    }

    /// The product the player has to type
    pub fn answer(&self) -> u64 {
        u64::from(self.a) * u64::from(self.b)
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}", self.a, self.b)
    }
}

/// Source of new facts for spawned enemies.
///
/// Returns `None` when `tables` is empty or `max_operand` is zero; callers
/// guard against both before starting a run.
pub trait TaskSource: Send {
    fn generate(&mut self, tables: &[u32], max_operand: u32) -> Option<Fact>;
}

/// Uniform sampler: `a` from the table set, `b` from `1..=max_operand`
#[derive(Debug, Clone)]
pub struct RandomTasks {
    rng: Pcg32,
}

impl RandomTasks {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl TaskSource for RandomTasks {
    fn generate(&mut self, tables: &[u32], max_operand: u32) -> Option<Fact> {
        if tables.is_empty() || max_operand == 0 {
            return None;
        }
        let a = tables[self.rng.random_range(0..tables.len())];
        let b = self.rng.random_range(1..=max_operand);
        Some(Fact::new(a, b))
    }
}

/// Replays a fixed list of facts, repeating the last one once exhausted
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct ScriptedTasks {
    facts: Vec<Fact>,
    next: usize,
}

#[cfg(test)]
impl ScriptedTasks {
    pub(crate) fn new(facts: Vec<Fact>) -> Self {
        Self { facts, next: 0 }
    }
}

#[cfg(test)]
impl TaskSource for ScriptedTasks {
    fn generate(&mut self, tables: &[u32], _max_operand: u32) -> Option<Fact> {
        if tables.is_empty() || self.facts.is_empty() {
            return None;
        }
        let fact = self.facts[self.next.min(self.facts.len() - 1)];
        self.next += 1;
        Some(fact)
    }
}

/// Parse a free-text answer. Surrounding whitespace is ignored; empty,
/// non-numeric and non-finite input yields `None`.
pub fn parse_answer(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
