//! Best score tracking
//!
//! The best score survives across sessions through a [`ScoreStore`]. It is
//! read once when a session is created and written whenever a run ends.

use crate::persistence::ScoreStore;

/// Storage key, shared with the browser build
pub const BEST_SCORE_KEY: &str = "invaders_best";

/// Highest score reached across sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BestScore {
    value: u64,
}

impl BestScore {
    pub fn new(value: u64) -> Self {
        Self { value }
    }

    /// Read the stored best; missing or unreadable data counts as 0
    pub fn load(store: &dyn ScoreStore) -> Self {
        match store.load(BEST_SCORE_KEY) {
            Ok(Some(value)) => {
                log::info!("Loaded best score {}", value);
                Self { value }
            }
            Ok(None) => Self::default(),
            Err(err) => {
                log::warn!("Could not read best score: {}", err);
                Self::default()
            }
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    /// Fold in a finished run. Returns true on a new best.
    pub fn record(&mut self, score: u64) -> bool {
        if score > self.value {
            self.value = score;
            true
        } else {
            false
        }
    }

    /// Persist; failures are logged and otherwise ignored
    pub fn save(&self, store: &mut dyn ScoreStore) {
        match store.save(BEST_SCORE_KEY, self.value) {
            Ok(()) => log::info!("Best score saved ({})", self.value),
            Err(err) => log::warn!("Could not save best score: {}", err),
        }
    }
}
