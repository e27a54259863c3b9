//! Adaptive difficulty
//!
//! Difficulty is recomputed from scratch on every scoring event: a composite
//! skill estimate is derived from response speed, streak and accuracy, and
//! each parameter is mapped from it and clamped independently.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::performance::PerformanceWindow;

/// Seconds between spawn attempts
pub const SPAWN_INTERVAL_RANGE: RangeInclusive<f32> = 1.6..=3.6;
/// Base descent speed (field heights per second)
pub const ENEMY_SPEED_RANGE: RangeInclusive<f32> = 0.026..=0.085;
/// Concurrent enemy cap
pub const MAX_ENEMIES_RANGE: RangeInclusive<usize> = 2..=5;

/// Accuracy assumed before the first answer
pub const NEUTRAL_ACCURACY: f64 = 0.6;

/// Tunable parameters driven by the skill estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyParams {
    /// Seconds between spawn attempts
    pub spawn_interval: f32,
    /// Base descent speed
    pub enemy_speed: f32,
    /// Maximum live enemies
    pub max_enemies: usize,
}

impl Default for DifficultyParams {
    fn default() -> Self {
        Self::GENTLE
    }
}

impl DifficultyParams {
    /// Opening values: slowest spawns, slowest descent, smallest cap.
    /// The first scoring event replaces them.
    pub const GENTLE: Self = Self {
        spawn_interval: 3.6,
        enemy_speed: 0.026,
        max_enemies: 2,
    };

    /// Recompute from the performance window and the streak at the event
    pub fn from_performance(perf: &PerformanceWindow, streak: u32) -> Self {
        let skill = skill(perf, streak);
        Self {
            spawn_interval: (3.6 / skill) as f32,
            enemy_speed: (0.030 * (0.95 + skill * 0.35)) as f32,
            max_enemies: (2.0 + skill * 0.65).floor() as usize,
        }
        .clamped()
    }

    /// Force every parameter into its declared range
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            spawn_interval: clamp_f32(self.spawn_interval, &SPAWN_INTERVAL_RANGE),
            enemy_speed: clamp_f32(self.enemy_speed, &ENEMY_SPEED_RANGE),
            max_enemies: self
                .max_enemies
                .clamp(*MAX_ENEMIES_RANGE.start(), *MAX_ENEMIES_RANGE.end()),
        }
    }
}

/// Composite skill in `0.75..=2.4`
pub fn skill(perf: &PerformanceWindow, streak: u32) -> f64 {
    let accuracy = perf.accuracy().unwrap_or(NEUTRAL_ACCURACY);
    let speed_factor = clamp_f64(2400.0 / perf.avg_response_ms, 0.7, 1.9);
    let streak_factor = (1.0 + f64::from(streak) / 16.0).clamp(1.0, 2.0);
    let acc_factor = (0.8 + accuracy).clamp(0.8, 1.65);
    clamp_f64(speed_factor * streak_factor * acc_factor / 1.25, 0.75, 2.4)
}

// NaN maps to the low end so a corrupt window yields the easiest settings
fn clamp_f64(v: f64, lo: f64, hi: f64) -> f64 {
    if v.is_nan() { lo } else { v.clamp(lo, hi) }
}

fn clamp_f32(v: f32, range: &RangeInclusive<f32>) -> f32 {
    if v.is_nan() {
        *range.start()
    } else {
        v.clamp(*range.start(), *range.end())
    }
}
