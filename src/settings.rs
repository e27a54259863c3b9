//! Game settings
//!
//! Loaded from a JSON file on native, from LocalStorage in the browser.
//! Missing fields take their defaults; invalid files fall back to defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::MAX_FRAME_DT;
use crate::sim::DifficultyParams;

/// Tables offered for selection
pub const ALL_TABLES: [u32; 8] = [2, 3, 4, 5, 6, 7, 8, 9];

/// Settings failures
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Tunable game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Multiplication tables in play
    pub tables: Vec<u32>,
    /// Largest second operand (`b` is drawn from `1..=max_operand`)
    pub max_operand: u32,
    pub starting_lives: u8,
    /// Pause between the last life lost and the game-over screen
    pub game_over_delay_ms: f64,
    /// First enemy of a run arrives this long after start
    pub first_spawn_delay_ms: f64,
    /// Per-frame elapsed time clamp (seconds)
    pub max_frame_dt: f32,
    /// Difficulty at the start of every run
    pub initial_difficulty: DifficultyParams,
    /// Fixed RNG seed; a clock-derived seed is used when absent
    pub seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            tables: ALL_TABLES.to_vec(),
            max_operand: 10,
            starting_lives: 3,
            game_over_delay_ms: 120.0,
            first_spawn_delay_ms: 250.0,
            max_frame_dt: MAX_FRAME_DT,
            initial_difficulty: DifficultyParams::GENTLE,
            seed: None,
        }
    }
}

impl GameSettings {
    /// Upper bound for `starting_lives`
    pub const MAX_LIVES: u8 = 9;

    /// Check ranges. The initial difficulty is clamped rather than rejected.
    pub fn validate(mut self) -> Result<Self, SettingsError> {
        if self.tables.iter().any(|t| *t == 0) {
            return Err(SettingsError::Invalid("tables must be positive".into()));
        }
        if self.max_operand == 0 {
            return Err(SettingsError::Invalid("max_operand must be at least 1".into()));
        }
        if !(1..=Self::MAX_LIVES).contains(&self.starting_lives) {
            return Err(SettingsError::Invalid(format!(
                "starting_lives must be between 1 and {}",
                Self::MAX_LIVES
            )));
        }
        if !(self.game_over_delay_ms >= 0.0 && self.first_spawn_delay_ms >= 0.0) {
            return Err(SettingsError::Invalid("delays must be non-negative".into()));
        }
        if !(self.max_frame_dt > 0.0 && self.max_frame_dt <= 1.0) {
            return Err(SettingsError::Invalid(
                "max_frame_dt must be in (0, 1] seconds".into(),
            ));
        }
        self.initial_difficulty = self.initial_difficulty.clamped();
        Ok(self)
    }

    /// Parse and validate JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        serde_json::from_str::<Self>(json)?.validate()
    }

    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load from `path`, falling back to defaults on any failure
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load_from_path(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {:?}", path);
                settings
            }
            Err(err) => {
                log::warn!("Using default settings ({})", err);
                Self::default()
            }
        }
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "invaders_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(err) => log::warn!("Ignoring stored settings: {}", err),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }
}
