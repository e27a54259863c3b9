//! Game state and core simulation types
//!
//! Everything a run needs lives in [`GameState`]. Entity collections are
//! kept in spawn order (ascending id), so "oldest" and "most urgent" are
//! explicit comparisons rather than side effects of array position.

use std::cmp::Ordering;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::DifficultyParams;
use super::performance::PerformanceWindow;
use super::task::Fact;

/// Enemy silhouettes (rendering only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Classic invader
    Invader,
    /// Diamond drone
    Drone,
    /// Rounded saucer
    Saucer,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Invader, EnemyKind::Drone, EnemyKind::Saucer];
}

/// A descending enemy carrying one fact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub fact: Fact,
    pub kind: EnemyKind,
    pub size: f32,
    /// Lateral sway phase (radians)
    pub phase: f32,
}

impl Enemy {
    /// Ordering by threat: lower on the field is more urgent, and of two
    /// enemies at the same height the older one (lower id) wins.
    pub fn cmp_urgency(&self, other: &Enemy) -> Ordering {
        self.pos
            .y
            .total_cmp(&other.pos.y)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Cosmetic laser beam from the ship line to a destroyed enemy
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Laser {
    pub x: f32,
    pub y0: f32,
    pub y1: f32,
    /// Seconds remaining
    pub life: f32,
}

/// A particle for visual effects
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds remaining
    pub life: f32,
}

/// Owned entity collections in insertion order
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    /// Live enemies, oldest first
    pub enemies: Vec<Enemy>,
    pub lasers: Vec<Laser>,
    pub particles: Vec<Particle>,
    next_id: u32,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Append a freshly spawned enemy (ids are allocated in spawn order)
    pub fn insert_enemy(&mut self, enemy: Enemy) {
        debug_assert!(self.enemies.last().is_none_or(|e| e.id < enemy.id));
        self.enemies.push(enemy);
    }

    /// Drop the oldest enemies until at most `max` remain.
    /// Returns the ids that were dropped.
    pub fn enforce_cap(&mut self, max: usize) -> Vec<u32> {
        if self.enemies.len() <= max {
            return Vec::new();
        }
        let excess = self.enemies.len() - max;
        self.enemies.drain(..excess).map(|e| e.id).collect()
    }

    pub fn remove_enemy(&mut self, id: u32) -> Option<Enemy> {
        let idx = self.enemies.iter().position(|e| e.id == id)?;
        Some(self.enemies.remove(idx))
    }

    /// The enemy closest to breaching
    pub fn most_urgent(&self) -> Option<&Enemy> {
        self.enemies.iter().max_by(|a, b| a.cmp_urgency(b))
    }

    /// The most urgent enemy carrying exactly `fact`
    pub fn most_urgent_matching(&self, fact: Fact) -> Option<&Enemy> {
        self.enemies
            .iter()
            .filter(|e| e.fact == fact)
            .max_by(|a, b| a.cmp_urgency(b))
    }

    pub fn clear(&mut self) {
        self.enemies.clear();
        self.lasers.clear();
        self.particles.clear();
    }
}

/// Complete state of one run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub score: u64,
    pub lives: u8,
    pub streak: u32,
    /// Fact currently presented to the player
    pub active_task: Option<Fact>,
    pub performance: PerformanceWindow,
    pub difficulty: DifficultyParams,
    /// Seconds accumulated toward the next spawn attempt
    pub spawn_accumulator: f32,
    /// Host timestamp (ms) of the latest frame or submission
    pub clock_ms: f64,
    /// Shake intensity 0..1 (cosmetic)
    pub screen_shake: f32,
    pub entities: EntityStore,
    pub(crate) rng: Pcg32,
}

impl GameState {
    /// Create a fresh run. The spawn accumulator is primed so the first
    /// enemy appears `first_spawn_delay` seconds after the first frame.
    pub fn new(seed: u64, lives: u8, difficulty: DifficultyParams, first_spawn_delay: f32) -> Self {
        Self {
            seed,
            score: 0,
            lives,
            streak: 0,
            active_task: None,
            performance: PerformanceWindow::default(),
            difficulty,
            spawn_accumulator: (difficulty.spawn_interval - first_spawn_delay).max(0.0),
            clock_ms: 0.0,
            screen_shake: 0.0,
            entities: EntityStore::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Present `fact` as the active task and start its response timer
    pub fn present_task(&mut self, fact: Fact) {
        self.active_task = Some(fact);
        self.performance = self.performance.task_started(self.clock_ms);
    }

    /// Re-target on the most urgent live enemy (or clear the task)
    pub fn choose_next_task(&mut self) {
        match self.entities.most_urgent().map(|e| e.fact) {
            Some(fact) => self.present_task(fact),
            None => self.active_task = None,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_enemy(id: u32, y: f32, fact: Fact) -> Enemy {
    Enemy {
        id,
        pos: Vec2::new(0.5, y),
        vel: Vec2::ZERO,
        fact,
        kind: EnemyKind::Invader,
        size: 48.0,
        phase: 0.0,
    }
}
