//! Answer resolution and targeting
//!
//! A correct answer destroys the most urgent enemy carrying the active fact.
//! If that enemy is gone (it breached after the task was chosen) the most
//! urgent enemy overall is destroyed instead. A wrong answer destroys
//! nothing.

use serde::Serialize;

use super::effects;
use super::scoring;
use super::state::GameState;
use super::task::{Fact, parse_answer};
use crate::consts::*;

/// Result of one submitted answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Correct {
        fact: Fact,
        /// Enemy destroyed by the hit, if any were left
        destroyed: Option<u32>,
        points: u64,
    },
    Incorrect {
        fact: Fact,
        lives_left: u8,
    },
    /// No active task or unparseable input; nothing changed
    Ignored,
}

impl Outcome {
    pub fn is_correct(&self) -> bool {
        matches!(self, Outcome::Correct { .. })
    }
}

/// Enemy a correct answer to `fact` should destroy
pub fn select_target(state: &GameState, fact: Fact) -> Option<u32> {
    state
        .entities
        .most_urgent_matching(fact)
        .or_else(|| state.entities.most_urgent())
        .map(|e| e.id)
}

/// Resolve `raw` against the active task at host time `now_ms`
pub fn resolve(state: &mut GameState, raw: &str, now_ms: f64) -> Outcome {
    let Some(fact) = state.active_task else {
        return Outcome::Ignored;
    };
    let Some(value) = parse_answer(raw) else {
        return Outcome::Ignored;
    };

    state.clock_ms = now_ms;
    let correct = value == fact.answer() as f64;
    state.performance = state.performance.record(now_ms, correct);

    if !correct {
        scoring::break_streak(state);
        let lives_left = scoring::lose_life(state);
        log::debug!("Wrong answer {} for {}, {} lives left", value, fact, lives_left);
        return Outcome::Incorrect { fact, lives_left };
    }

    let destroyed = select_target(state, fact).and_then(|id| state.entities.remove_enemy(id));
    if let Some(enemy) = &destroyed {
        effects::fire_laser(state, enemy.pos.x, enemy.pos.y);
        effects::explode(state, enemy.pos, HIT_BLAST);
    }

    let points = scoring::award_hit(state);
    state.choose_next_task();
    log::debug!(
        "Hit {} (enemy {:?}) for {} points, streak {}",
        fact,
        destroyed.as_ref().map(|e| e.id),
        points,
        state.streak
    );

    Outcome::Correct {
        fact,
        destroyed: destroyed.map(|e| e.id),
        points,
    }
}
