//! Simulation step
//!
//! Advances one run by an elapsed-time delta: spawning, enemy motion,
//! breaches, effect expiry and the enemy cap.

use super::effects;
use super::scoring;
use super::spawn::Spawner;
use super::state::GameState;
use super::task::Fact;
use crate::consts::*;

/// Gameplay-relevant things that happened during a step
#[derive(Debug, Clone, PartialEq)]
pub enum TickEvent {
    Spawned { id: u32, fact: Fact },
    /// An enemy reached the baseline and cost a life
    Breached { id: u32, fact: Fact, lives_left: u8 },
    /// Enemies removed without a breach (over the cap, or lost off-field)
    Culled { ids: Vec<u32> },
    /// The active task changed at the end of the step
    TaskChanged(Option<Fact>),
}

/// Advance the run by `dt` seconds
pub fn step(state: &mut GameState, spawner: &mut Spawner, dt: f32) -> Vec<TickEvent> {
    let mut events = Vec::new();
    let task_before = state.active_task;

    // Spawn: one attempt per interval, skipped while at the cap
    state.spawn_accumulator += dt;
    if state.spawn_accumulator >= state.difficulty.spawn_interval {
        state.spawn_accumulator = 0.0;
        if state.entities.enemies.len() < state.difficulty.max_enemies {
            if let Some(id) = spawner.spawn(state) {
                if let Some(e) = state.entities.enemies.last() {
                    events.push(TickEvent::Spawned { id, fact: e.fact });
                }
            }
        }
    }

    move_enemies(state, dt);

    // Breaches, oldest first
    let breached: Vec<_> = state
        .entities
        .enemies
        .iter()
        .filter(|e| e.pos.y >= BREACH_Y)
        .map(|e| (e.id, e.fact, e.pos.x))
        .collect();
    for (id, fact, x) in breached {
        state.entities.remove_enemy(id);
        effects::explode(state, glam::Vec2::new(x, BREACH_Y), BREACH_BLAST);
        scoring::break_streak(state);
        let lives_left = scoring::lose_life(state);
        log::debug!("Enemy {} ({}) breached, {} lives left", id, fact, lives_left);
        events.push(TickEvent::Breached {
            id,
            fact,
            lives_left,
        });
    }

    let mut culled: Vec<u32> = Vec::new();
    state.entities.enemies.retain(|e| {
        // Non-finite positions fail both tests and end up here
        let keep = e.pos.y < DESPAWN_Y;
        if !keep {
            culled.push(e.id);
        }
        keep
    });

    effects::advance(state, dt);

    culled.extend(state.entities.enforce_cap(state.difficulty.max_enemies));
    if !culled.is_empty() {
        events.push(TickEvent::Culled { ids: culled });
    }

    if state.active_task.is_none() && !state.entities.enemies.is_empty() {
        state.choose_next_task();
    }
    if state.active_task != task_before {
        events.push(TickEvent::TaskChanged(state.active_task));
    }

    events
}

/// Integrate enemy motion: sway, soft side walls and descent
fn move_enemies(state: &mut GameState, dt: f32) {
    let base_speed = state.difficulty.enemy_speed;
    for e in &mut state.entities.enemies {
        e.phase += SWAY_RATE * dt;
        let sway = e.phase.sin() * SWAY_AMPLITUDE;
        let x = e.pos.x + (e.vel.x + sway) * dt;
        let clamped = x.clamp(WALL_X_MIN, WALL_X_MAX);
        if clamped != x {
            e.vel.x = -e.vel.x * WALL_BOUNCE_DAMPING;
        }
        e.pos.x = clamped;
        e.pos.y += (e.vel.y + base_speed * DESCENT_BIAS) * dt;
    }
}
