//! Smoothed answer statistics feeding the difficulty controller

use serde::{Deserialize, Serialize};

/// Smoothed response time assumed before the first answer
pub const INITIAL_AVG_RESPONSE_MS: f64 = 2000.0;
/// Weight kept by the running average on each new sample
pub const AVG_KEEP: f64 = 0.85;
/// Weight given to the new sample
pub const AVG_SAMPLE: f64 = 0.15;

/// Running answer statistics. Transitions return a new window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceWindow {
    pub correct: u32,
    pub wrong: u32,
    /// Exponentially smoothed response time (ms)
    pub avg_response_ms: f64,
    /// Host timestamp (ms) at which the active task was presented
    pub task_started_ms: f64,
}

impl Default for PerformanceWindow {
    fn default() -> Self {
        Self {
            correct: 0,
            wrong: 0,
            avg_response_ms: INITIAL_AVG_RESPONSE_MS,
            task_started_ms: 0.0,
        }
    }
}

impl PerformanceWindow {
    /// Fraction of correct answers, `None` before the first attempt
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.correct + self.wrong;
        (total > 0).then(|| f64::from(self.correct) / f64::from(total))
    }

    /// Restart the response stopwatch
    #[must_use]
    pub fn task_started(self, now_ms: f64) -> Self {
        Self {
            task_started_ms: now_ms,
            ..self
        }
    }

    /// Fold one answer in: smooth the response time and bump a counter
    #[must_use]
    pub fn record(self, now_ms: f64, correct: bool) -> Self {
        // NaN or a clock that went backwards counts as an instant answer
        let elapsed = (now_ms - self.task_started_ms).max(0.0);
        let avg_response_ms = self.avg_response_ms * AVG_KEEP + elapsed * AVG_SAMPLE;
        if correct {
            Self {
                correct: self.correct + 1,
                avg_response_ms,
                ..self
            }
        } else {
            Self {
                wrong: self.wrong + 1,
                avg_response_ms,
                ..self
            }
        }
    }
}
