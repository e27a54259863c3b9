//! Cosmetic effects: lasers, explosion particles and screen shake.
//! Nothing here feeds back into gameplay.

use glam::Vec2;
use rand::Rng;

use super::state::{GameState, Laser, Particle};
use crate::consts::*;

/// Burst of `floor(18 × power)` particles at `at`
pub fn explode(state: &mut GameState, at: Vec2, power: f32) {
    let count = (PARTICLES_PER_BLAST * power).floor() as usize;
    let rng = &mut state.rng;
    state.entities.particles.extend((0..count).map(|_| Particle {
        pos: at,
        vel: Vec2::new(
            rng.random_range(-0.28..=0.28) * power,
            rng.random_range(-0.35..=0.15) * power,
        ),
        life: rng.random_range(0.25..=0.7),
    }));

    let particles = &mut state.entities.particles;
    if particles.len() > MAX_PARTICLES {
        let excess = particles.len() - MAX_PARTICLES;
        particles.drain(..excess);
    }
    state.screen_shake = 1.0;
}

/// Laser from the ship line up to `(x, y)`
pub fn fire_laser(state: &mut GameState, x: f32, y: f32) {
    state.entities.lasers.push(Laser {
        x,
        y0: SHIP_Y,
        y1: y,
        life: LASER_LIFE,
    });
}

/// Age lasers and particles, decay shake
pub fn advance(state: &mut GameState, dt: f32) {
    for laser in &mut state.entities.lasers {
        laser.life -= dt;
    }
    state.entities.lasers.retain(|l| l.life > 0.0);

    for p in &mut state.entities.particles {
        p.pos += p.vel * dt;
        p.vel.x *= PARTICLE_DRAG;
        p.vel.y = p.vel.y * PARTICLE_DRAG + PARTICLE_GRAVITY * dt;
        p.life -= dt;
    }
    state.entities.particles.retain(|p| p.life > 0.0);

    state.screen_shake = (state.screen_shake - dt / SHAKE_DURATION).max(0.0);
}
