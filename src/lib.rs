//! Times Invaders - arcade multiplication practice
//!
//! Enemies descend carrying multiplication facts; answering a fact fires at
//! the most urgent matching enemy before it reaches the baseline. Difficulty
//! follows the player's measured speed, accuracy and streak.
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, spawning, targeting, scoring, difficulty)
//! - `session`: Menu/playing/over state machine driven by host frames and answers
//! - `settings`: Data-driven game configuration
//! - `highscores`: Best score tracking
//! - `persistence`: Key-value score storage (memory, JSON file, LocalStorage)
//! - `platform`: Browser/native clock and seed abstraction

pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use highscores::BestScore;
pub use session::{FrameSnapshot, Mode, SharedSession, Session, StartError, Status};
pub use settings::GameSettings;

/// Playfield constants, all in normalized field coordinates (0..1 on both axes,
/// y = 0 at the spawn edge) and seconds
pub mod consts {
    /// Enemies at or below this line breach the defence
    pub const BREACH_Y: f32 = 0.92;
    /// Safety net: anything this far down is discarded without a breach
    pub const DESPAWN_Y: f32 = 1.2;
    /// Vertical spawn position (top edge)
    pub const SPAWN_Y: f32 = 0.0;
    /// Horizontal spawn band
    pub const SPAWN_X_MIN: f32 = 0.12;
    pub const SPAWN_X_MAX: f32 = 0.88;
    /// Maximum initial sideways drift (either direction)
    pub const SPAWN_DRIFT: f32 = 0.03;
    /// Descent speed multiplier range applied to the base speed at spawn
    pub const SPAWN_SPEED_MIN: f32 = 0.85;
    pub const SPAWN_SPEED_MAX: f32 = 1.2;
    /// Cosmetic enemy size range (render units)
    pub const ENEMY_SIZE_MIN: f32 = 40.0;
    pub const ENEMY_SIZE_MAX: f32 = 56.0;

    /// Soft side walls
    pub const WALL_X_MIN: f32 = 0.081;
    pub const WALL_X_MAX: f32 = 0.919;
    /// Velocity kept after bouncing off a side wall
    pub const WALL_BOUNCE_DAMPING: f32 = 0.9;
    /// Lateral sway amplitude (field units per second)
    pub const SWAY_AMPLITUDE: f32 = 0.025;
    /// Sway phase advance (radians per second)
    pub const SWAY_RATE: f32 = 2.2;
    /// Extra descent as a fraction of the current base speed
    pub const DESCENT_BIAS: f32 = 0.25;

    /// Ship line the lasers are fired from
    pub const SHIP_Y: f32 = 0.90;
    /// Laser lifetime
    pub const LASER_LIFE: f32 = 0.14;

    /// Particles spawned per unit of explosion power
    pub const PARTICLES_PER_BLAST: f32 = 18.0;
    /// Explosion power for a destroyed enemy and for a breach
    pub const HIT_BLAST: f32 = 1.25;
    pub const BREACH_BLAST: f32 = 1.6;
    /// Per-step particle velocity retention
    pub const PARTICLE_DRAG: f32 = 0.98;
    /// Downward particle pull (field units per second squared)
    pub const PARTICLE_GRAVITY: f32 = 0.08;
    /// Maximum live particles
    pub const MAX_PARTICLES: usize = 256;

    /// Screen shake fades out over this long
    pub const SHAKE_DURATION: f32 = 0.14;

    /// Default frame delta clamp
    pub const MAX_FRAME_DT: f32 = 0.033;
}
