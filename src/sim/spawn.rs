//! Enemy spawning

use glam::Vec2;
use rand::Rng;

use super::state::{Enemy, EnemyKind, GameState};
use super::task::{Fact, TaskSource};
use crate::consts::*;

/// Table selection plus the fact generator used for new enemies
pub struct Spawner {
    tables: Vec<u32>,
    max_operand: u32,
    tasks: Box<dyn TaskSource>,
}

impl std::fmt::Debug for Spawner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spawner")
            .field("tables", &self.tables)
            .field("max_operand", &self.max_operand)
            .finish_non_exhaustive()
    }
}

impl Spawner {
    pub fn new(tables: Vec<u32>, max_operand: u32, tasks: Box<dyn TaskSource>) -> Self {
        let mut spawner = Self {
            tables: Vec::new(),
            max_operand,
            tasks,
        };
        spawner.set_tables(tables);
        spawner
    }

    /// Selected tables, sorted and deduplicated
    pub fn tables(&self) -> &[u32] {
        &self.tables
    }

    pub fn max_operand(&self) -> u32 {
        self.max_operand
    }

    /// Replace the selection; zero entries are dropped
    pub fn set_tables(&mut self, mut tables: Vec<u32>) {
        tables.retain(|t| *t > 0);
        tables.sort_unstable();
        tables.dedup();
        self.tables = tables;
    }

    /// Add `table` if absent, remove it if present
    pub fn toggle_table(&mut self, table: u32) {
        match self.tables.binary_search(&table) {
            Ok(idx) => {
                self.tables.remove(idx);
            }
            Err(idx) if table > 0 => self.tables.insert(idx, table),
            Err(_) => {}
        }
    }

    pub fn has_tables(&self) -> bool {
        !self.tables.is_empty()
    }

    fn next_fact(&mut self) -> Option<Fact> {
        self.tasks.generate(&self.tables, self.max_operand)
    }

    /// Spawn one enemy at the top edge. Presents its fact if no task is
    /// active. Returns the new enemy's id, or `None` with no tables selected.
    pub fn spawn(&mut self, state: &mut GameState) -> Option<u32> {
        let fact = self.next_fact()?;
        let rng = &mut state.rng;
        let enemy_speed = state.difficulty.enemy_speed;
        let pos = Vec2::new(rng.random_range(SPAWN_X_MIN..=SPAWN_X_MAX), SPAWN_Y);
        let vel = Vec2::new(
            rng.random_range(-SPAWN_DRIFT..=SPAWN_DRIFT),
            enemy_speed * rng.random_range(SPAWN_SPEED_MIN..=SPAWN_SPEED_MAX),
        );
        let kind = EnemyKind::ALL[rng.random_range(0..EnemyKind::ALL.len())];
        let size = rng.random_range(ENEMY_SIZE_MIN..=ENEMY_SIZE_MAX);
        let phase = rng.random_range(0.0..std::f32::consts::TAU);

        let id = state.entities.next_entity_id();
        state.entities.insert_enemy(Enemy {
            id,
            pos,
            vel,
            fact,
            kind,
            size,
            phase,
        });
        log::debug!("Spawned enemy {} carrying {}", id, fact);

        if state.active_task.is_none() {
            state.present_task(fact);
        }
        Some(id)
    }
}
