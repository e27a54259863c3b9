//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through `step(dt)` and host timestamps
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod difficulty;
pub mod effects;
pub mod performance;
pub mod resolve;
pub mod scoring;
pub mod spawn;
pub mod state;
pub mod task;
pub mod tick;

pub use difficulty::DifficultyParams;
pub use performance::PerformanceWindow;
pub use resolve::{Outcome, resolve, select_target};
pub use spawn::Spawner;
pub use state::{Enemy, EnemyKind, EntityStore, GameState, Laser, Particle};
pub use task::{Fact, RandomTasks, TaskSource, parse_answer};
pub use tick::{TickEvent, step};
