//! Score, streak and lives bookkeeping

use super::difficulty::DifficultyParams;
use super::state::GameState;

/// Base points for a hit before the speed bonus
pub const BASE_POINTS: f64 = 90.0;
/// Streak bonus per consecutive hit, and its cap
pub const STREAK_POINTS: u64 = 8;
pub const STREAK_BONUS_CAP: u64 = 160;

/// Points for a correct answer given the updated smoothed response time and
/// the streak including this hit
pub fn score_delta(avg_response_ms: f64, streak: u32) -> u64 {
    let ratio = 2600.0 / avg_response_ms;
    let speed_bonus = if ratio.is_nan() { 0.8 } else { ratio.clamp(0.8, 2.2) };
    let base = (BASE_POINTS * speed_bonus).floor() as u64;
    base + (u64::from(streak) * STREAK_POINTS).min(STREAK_BONUS_CAP)
}

/// Credit a correct answer: extend the streak, retune, add points.
/// Returns the points awarded.
pub fn award_hit(state: &mut GameState) -> u64 {
    state.streak += 1;
    state.difficulty = DifficultyParams::from_performance(&state.performance, state.streak);
    let delta = score_delta(state.performance.avg_response_ms, state.streak);
    state.score += delta;
    delta
}

/// Break the streak after a miss or a breach and retune at streak 0
pub fn break_streak(state: &mut GameState) {
    state.streak = 0;
    state.difficulty = DifficultyParams::from_performance(&state.performance, 0);
}

/// Take one life (saturating at zero) and return what is left
pub fn lose_life(state: &mut GameState) -> u8 {
    state.lives = state.lives.saturating_sub(1);
    state.lives
}
