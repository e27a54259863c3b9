//! Session state machine
//!
//! A [`Session`] owns one [`GameState`] and gates it behind the top-level
//! mode: `Menu` (idle, table selection open), `Playing` (frames advance the
//! simulation, answers are accepted) and `Over` (halted until restarted).
//!
//! The host drives it with two entry points, both stamped with the same
//! monotonic clock: [`Session::frame`] once per rendered frame and
//! [`Session::submit`] whenever the player commits an answer. Each call runs
//! to completion; threaded hosts share a session through [`SharedSession`].

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;
use thiserror::Error;

use crate::highscores::BestScore;
use crate::persistence::ScoreStore;
use crate::settings::GameSettings;
use crate::sim::{
    Enemy, Fact, GameState, Laser, Outcome, Particle, RandomTasks, Spawner, TaskSource, TickEvent,
    resolve, step,
};

/// Top-level mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Menu,
    Playing,
    Over,
}

/// Hint line shown to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Status {
    PressStart,
    Ready,
    Shoot { fact: Fact },
    Wrong { fact: Fact },
    TooClose,
    Paused,
    GameOver { new_best: bool },
    SelectTable,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::PressStart => write!(f, "Press start"),
            Status::Ready => write!(f, "Ready! Answer to shoot the invaders"),
            Status::Shoot { fact } => write!(f, "Shoot: {}", fact),
            Status::Wrong { fact } => write!(f, "Wrong: {} = {}", fact, fact.answer()),
            Status::TooClose => write!(f, "Too close! -1 life"),
            Status::Paused => write!(f, "Paused"),
            Status::GameOver { new_best: true } => write!(f, "Game over - new best!"),
            Status::GameOver { new_best: false } => write!(f, "Game over"),
            Status::SelectTable => write!(f, "Select at least one table before starting"),
        }
    }
}

/// Rejected mode or selection changes
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
    #[error("select at least one table before starting")]
    NoTablesSelected,
    #[error("a run is already in progress")]
    AlreadyPlaying,
    #[error("there is no paused run to resume")]
    NothingToResume,
    #[error("tables can only be changed outside a run")]
    NotInMenu,
}

/// Pending delayed transition into `Over`. Only honoured while its
/// generation matches the session's, so a restart invalidates it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameOverTimer {
    pub due_ms: f64,
    generation: u64,
}

/// Read-only view handed to the renderer once per frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot<'a> {
    pub mode: Mode,
    pub enemies: &'a [Enemy],
    pub lasers: &'a [Laser],
    pub particles: &'a [Particle],
    pub score: u64,
    pub best: u64,
    pub lives: u8,
    pub streak: u32,
    pub active_task: Option<Fact>,
    pub status: Status,
    pub screen_shake: f32,
}

/// One player's game: mode, current run, best score and storage
pub struct Session {
    settings: GameSettings,
    mode: Mode,
    state: GameState,
    spawner: Spawner,
    store: Box<dyn ScoreStore>,
    best: BestScore,
    status: Status,
    game_over: Option<GameOverTimer>,
    /// Bumped on every run reset
    generation: u64,
    last_frame_ms: Option<f64>,
    /// A run is suspended in the menu
    paused: bool,
    seeds: Pcg32,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode)
            .field("score", &self.state.score)
            .field("lives", &self.state.lives)
            .field("best", &self.best)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session with uniformly random facts
    pub fn new(settings: GameSettings, store: Box<dyn ScoreStore>) -> Self {
        let seed = settings.seed.unwrap_or_else(crate::platform::default_seed);
        let tasks = Box::new(RandomTasks::new(seed.rotate_left(32)));
        Self::with_task_source(settings, store, tasks)
    }

    /// Create a session drawing facts from `tasks`. Reads the stored best.
    pub fn with_task_source(
        settings: GameSettings,
        store: Box<dyn ScoreStore>,
        tasks: Box<dyn TaskSource>,
    ) -> Self {
        let seed = settings.seed.unwrap_or_else(crate::platform::default_seed);
        let mut seeds = Pcg32::seed_from_u64(seed);
        let best = BestScore::load(store.as_ref());
        let spawner = Spawner::new(settings.tables.clone(), settings.max_operand, tasks);
        let state = Self::fresh_state(&settings, seeds.next_u64());
        Self {
            settings,
            mode: Mode::Menu,
            state,
            spawner,
            store,
            best,
            status: Status::PressStart,
            game_over: None,
            generation: 0,
            last_frame_ms: None,
            paused: false,
            seeds,
        }
    }

    fn fresh_state(settings: &GameSettings, seed: u64) -> GameState {
        GameState::new(
            seed,
            settings.starting_lives,
            settings.initial_difficulty,
            (settings.first_spawn_delay_ms / 1000.0) as f32,
        )
    }

    // --- Queries ---

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    pub fn best(&self) -> u64 {
        self.best.value()
    }

    pub fn lives(&self) -> u8 {
        self.state.lives
    }

    pub fn streak(&self) -> u32 {
        self.state.streak
    }

    pub fn active_task(&self) -> Option<Fact> {
        self.state.active_task
    }

    pub fn tables(&self) -> &[u32] {
        self.spawner.tables()
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// The current run (read-only)
    pub fn game(&self) -> &GameState {
        &self.state
    }

    pub fn pending_game_over(&self) -> Option<GameOverTimer> {
        self.game_over
    }

    pub fn snapshot(&self) -> FrameSnapshot<'_> {
        FrameSnapshot {
            mode: self.mode,
            enemies: &self.state.entities.enemies,
            lasers: &self.state.entities.lasers,
            particles: &self.state.entities.particles,
            score: self.state.score,
            best: self.best.value(),
            lives: self.state.lives,
            streak: self.state.streak,
            active_task: self.state.active_task,
            status: self.status,
            screen_shake: self.state.screen_shake,
        }
    }

    // --- Table selection (menu and game over only) ---

    fn ensure_not_playing(&self) -> Result<(), StartError> {
        if self.mode == Mode::Playing {
            Err(StartError::NotInMenu)
        } else {
            Ok(())
        }
    }

    pub fn set_tables(&mut self, tables: Vec<u32>) -> Result<(), StartError> {
        self.ensure_not_playing()?;
        self.spawner.set_tables(tables);
        Ok(())
    }

    pub fn toggle_table(&mut self, table: u32) -> Result<(), StartError> {
        self.ensure_not_playing()?;
        self.spawner.toggle_table(table);
        Ok(())
    }

    pub fn select_all_tables(&mut self) -> Result<(), StartError> {
        self.set_tables(crate::settings::ALL_TABLES.to_vec())
    }

    pub fn clear_tables(&mut self) -> Result<(), StartError> {
        self.set_tables(Vec::new())
    }

    // --- Transitions ---

    /// Begin a fresh run (menu/over -> playing)
    pub fn start(&mut self) -> Result<(), StartError> {
        if self.mode == Mode::Playing {
            return Err(StartError::AlreadyPlaying);
        }
        self.begin_run()
    }

    /// Abandon whatever is going on and begin a fresh run. Any pending
    /// game-over transition is invalidated.
    pub fn restart(&mut self) -> Result<(), StartError> {
        self.begin_run()
    }

    fn begin_run(&mut self) -> Result<(), StartError> {
        if !self.spawner.has_tables() {
            log::warn!("Start rejected: no tables selected");
            self.status = Status::SelectTable;
            return Err(StartError::NoTablesSelected);
        }
        self.reset_run();
        self.mode = Mode::Playing;
        self.status = Status::Ready;
        log::info!(
            "Run started (tables {:?}, seed {})",
            self.spawner.tables(),
            self.state.seed
        );
        Ok(())
    }

    /// Suspend the run (playing -> menu), keeping every entity and timer.
    /// Returns false if nothing was playing.
    pub fn pause(&mut self) -> bool {
        if self.mode != Mode::Playing {
            return false;
        }
        self.mode = Mode::Menu;
        self.paused = true;
        self.last_frame_ms = None;
        self.status = Status::Paused;
        log::info!("Paused at score {}", self.state.score);
        true
    }

    /// Continue a paused run (menu -> playing)
    pub fn resume(&mut self) -> Result<(), StartError> {
        match self.mode {
            Mode::Playing => return Err(StartError::AlreadyPlaying),
            Mode::Over => return Err(StartError::NothingToResume),
            Mode::Menu if !self.paused => return Err(StartError::NothingToResume),
            Mode::Menu => {}
        }
        if !self.spawner.has_tables() {
            self.status = Status::SelectTable;
            return Err(StartError::NoTablesSelected);
        }
        self.mode = Mode::Playing;
        self.paused = false;
        self.status = self.shoot_status();
        log::info!("Resumed");
        Ok(())
    }

    /// Wipe the run and return to the menu
    pub fn reset(&mut self) {
        self.reset_run();
        self.mode = Mode::Menu;
        self.status = Status::PressStart;
        log::info!("Reset");
    }

    fn reset_run(&mut self) {
        self.state = Self::fresh_state(&self.settings, self.seeds.next_u64());
        self.generation += 1;
        self.game_over = None;
        self.last_frame_ms = None;
        self.paused = false;
    }

    fn shoot_status(&self) -> Status {
        match self.state.active_task {
            Some(fact) => Status::Shoot { fact },
            None => Status::Ready,
        }
    }

    // --- Frame and answer entry points ---

    /// Advance one rendered frame at host time `now_ms`, then hand the
    /// snapshot to `render`. Only `Playing` advances the simulation; the
    /// elapsed time is clamped to `max_frame_dt` and is zero on the first
    /// frame after a start or resume.
    pub fn frame<F>(&mut self, now_ms: f64, render: F) -> Vec<TickEvent>
    where
        F: FnOnce(&FrameSnapshot<'_>),
    {
        let events = if self.mode == Mode::Playing {
            let dt = match self.last_frame_ms {
                Some(last) => (((now_ms - last) / 1000.0) as f32)
                    .max(0.0)
                    .min(self.settings.max_frame_dt),
                None => 0.0,
            };
            self.last_frame_ms = Some(now_ms);
            self.advance(now_ms, dt)
        } else {
            Vec::new()
        };
        render(&self.snapshot());
        events
    }

    /// Advance by `dt` seconds of simulation time without a host clock.
    /// The session clock moves forward by the same amount.
    pub fn step(&mut self, dt: f32) -> Vec<TickEvent> {
        if self.mode != Mode::Playing {
            return Vec::new();
        }
        let now_ms = self.state.clock_ms + f64::from(dt.max(0.0)) * 1000.0;
        self.advance(now_ms, dt.max(0.0))
    }

    fn advance(&mut self, now_ms: f64, dt: f32) -> Vec<TickEvent> {
        self.state.clock_ms = now_ms;
        let events = step(&mut self.state, &mut self.spawner, dt);
        for event in &events {
            match event {
                TickEvent::Breached { lives_left, .. } => {
                    self.status = Status::TooClose;
                    if *lives_left == 0 {
                        self.schedule_game_over(now_ms);
                    }
                }
                TickEvent::TaskChanged(Some(fact)) => self.status = Status::Shoot { fact: *fact },
                _ => {}
            }
        }
        self.poll_game_over(now_ms);
        events
    }

    /// Resolve an answer typed at host time `now_ms`.
    /// Anything outside `Playing` is ignored.
    pub fn submit(&mut self, raw: &str, now_ms: f64) -> Outcome {
        if self.mode != Mode::Playing {
            return Outcome::Ignored;
        }
        let outcome = resolve(&mut self.state, raw, now_ms);
        match outcome {
            Outcome::Correct { .. } => self.status = self.shoot_status(),
            Outcome::Incorrect { fact, lives_left } => {
                self.status = Status::Wrong { fact };
                if lives_left == 0 {
                    self.schedule_game_over(now_ms);
                }
            }
            Outcome::Ignored => {}
        }
        outcome
    }

    fn schedule_game_over(&mut self, now_ms: f64) {
        if self.game_over.is_some() {
            return;
        }
        let timer = GameOverTimer {
            due_ms: now_ms + self.settings.game_over_delay_ms,
            generation: self.generation,
        };
        log::debug!("Game over scheduled at {:.0} ms", timer.due_ms);
        self.game_over = Some(timer);
    }

    fn poll_game_over(&mut self, now_ms: f64) {
        let Some(timer) = self.game_over else {
            return;
        };
        if timer.generation != self.generation {
            self.game_over = None;
        } else if now_ms >= timer.due_ms {
            self.enter_over();
        }
    }

    fn enter_over(&mut self) {
        self.mode = Mode::Over;
        self.game_over = None;
        self.last_frame_ms = None;
        self.paused = false;
        let new_best = self.best.record(self.state.score);
        self.best.save(self.store.as_mut());
        self.status = Status::GameOver { new_best };
        log::info!(
            "Game over: score {}, best {}{}",
            self.state.score,
            self.best.value(),
            if new_best { " (new best)" } else { "" }
        );
    }
}

/// A session behind a mutex, for hosts that tick and accept input on
/// different threads
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Run `f` with exclusive access. A panic on another thread does not
    /// lock the session out.
    pub fn with<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn frame<F>(&self, now_ms: f64, render: F) -> Vec<TickEvent>
    where
        F: FnOnce(&FrameSnapshot<'_>),
    {
        self.with(|s| s.frame(now_ms, render))
    }

    pub fn submit(&self, raw: &str, now_ms: f64) -> Outcome {
        self.with(|s| s.submit(raw, now_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::BEST_SCORE_KEY;
    use crate::persistence::{BrokenStore, MemoryStore};
    use crate::sim::state::test_enemy;
    use crate::sim::task::ScriptedTasks;
    use proptest::prelude::*;

    fn settings(tables: Vec<u32>, lives: u8) -> GameSettings {
        GameSettings {
            tables,
            starting_lives: lives,
            first_spawn_delay_ms: 0.0,
            seed: Some(31337),
            ..GameSettings::default()
        }
    }

    fn scripted(settings: GameSettings, facts: Vec<Fact>, best: u64) -> Session {
        let mut store = MemoryStore::new();
        if best > 0 {
            store.save(BEST_SCORE_KEY, best).unwrap();
        }
        Session::with_task_source(settings, Box::new(store), Box::new(ScriptedTasks::new(facts)))
    }

    fn place_enemy(session: &mut Session, y: f32, fact: Fact) -> u32 {
        let id = session.state.entities.next_entity_id();
        session.state.entities.insert_enemy(test_enemy(id, y, fact));
        id
    }

    #[test]
    fn test_spawned_fact_answered_for_exact_points() {
        let mut session = scripted(settings(vec![3], 3), vec![Fact::new(3, 4)], 0);
        session.start().unwrap();
        session.frame(0.0, |_| {});
        assert_eq!(session.game().entities.enemies.len(), 1);
        assert_eq!(session.active_task(), Some(Fact::new(3, 4)));
        assert_eq!(session.status(), Status::Shoot { fact: Fact::new(3, 4) });

        let outcome = session.submit("12", 2000.0);
        assert_eq!(
            outcome,
            Outcome::Correct {
                fact: Fact::new(3, 4),
                destroyed: Some(1),
                points: 125,
            }
        );
        assert!(session.game().entities.enemies.is_empty());
        assert_eq!(session.score(), 125);
        assert_eq!(session.streak(), 1);
    }

    #[test]
    fn test_second_answer_to_cleared_task_is_ignored() {
        let mut session = scripted(settings(vec![3], 3), vec![Fact::new(3, 4)], 0);
        session.start().unwrap();
        session.frame(0.0, |_| {});
        assert!(session.submit("12", 500.0).is_correct());
        assert_eq!(session.submit("12", 501.0), Outcome::Ignored);
        assert_eq!(session.streak(), 1);
    }

    #[test]
    fn test_breach_on_last_life_ends_after_delay() {
        let mut session = scripted(
            GameSettings {
                first_spawn_delay_ms: 250.0,
                ..settings(vec![6], 1)
            },
            vec![Fact::new(6, 6)],
            100,
        );
        session.start().unwrap();
        session.state.score = 300;
        place_enemy(&mut session, 0.95, Fact::new(6, 7));

        session.frame(1000.0, |_| {});
        assert_eq!(session.lives(), 0);
        assert_eq!(session.mode(), Mode::Playing);
        assert_eq!(session.pending_game_over().map(|t| t.due_ms), Some(1120.0));

        session.frame(1060.0, |_| {});
        assert_eq!(session.mode(), Mode::Playing);

        session.frame(1130.0, |_| {});
        assert_eq!(session.mode(), Mode::Over);
        assert_eq!(session.best(), 300);
        assert_eq!(session.status(), Status::GameOver { new_best: true });
        assert_eq!(session.store.load(BEST_SCORE_KEY).unwrap(), Some(300));
    }

    #[test]
    fn test_lower_score_keeps_best() {
        let mut session = scripted(settings(vec![6], 1), vec![Fact::new(6, 6)], 1000);
        assert_eq!(session.best(), 1000);
        session.start().unwrap();
        session.frame(0.0, |_| {});
        assert!(matches!(
            session.submit("35", 10.0),
            Outcome::Incorrect { lives_left: 0, .. }
        ));
        session.frame(500.0, |_| {});
        assert_eq!(session.mode(), Mode::Over);
        assert_eq!(session.best(), 1000);
        assert_eq!(session.status(), Status::GameOver { new_best: false });
    }

    #[test]
    fn test_empty_tables_reject_start() {
        let mut session = scripted(settings(vec![], 3), vec![Fact::new(2, 2)], 0);
        assert_eq!(session.start(), Err(StartError::NoTablesSelected));
        assert_eq!(session.mode(), Mode::Menu);
        assert_eq!(session.status(), Status::SelectTable);
        assert_eq!(session.lives(), 3);
        assert_eq!(session.pending_game_over(), None);
        session.frame(0.0, |_| {});
        session.frame(5000.0, |_| {});
        assert!(session.game().entities.enemies.is_empty());
        assert_eq!(
            StartError::NoTablesSelected.to_string(),
            "select at least one table before starting"
        );
    }

    #[test]
    fn test_submit_outside_playing_is_ignored() {
        let mut session = scripted(settings(vec![3], 3), vec![Fact::new(3, 4)], 0);
        assert_eq!(session.submit("12", 0.0), Outcome::Ignored);
        session.start().unwrap();
        session.frame(0.0, |_| {});
        session.pause();
        assert_eq!(session.submit("12", 100.0), Outcome::Ignored);
        assert_eq!(session.game().entities.enemies.len(), 1);
    }

    #[test]
    fn test_pause_keeps_run_and_resume_continues() {
        let mut session = scripted(settings(vec![3], 3), vec![Fact::new(3, 4)], 0);
        session.start().unwrap();
        session.frame(0.0, |_| {});
        session.frame(33.0, |_| {});
        let y_before = session.game().entities.enemies[0].pos.y;

        assert!(session.pause());
        assert_eq!(session.mode(), Mode::Menu);
        assert_eq!(session.status(), Status::Paused);
        // Frames in the menu do nothing, however long the pause
        session.frame(60_000.0, |_| {});
        assert_eq!(session.game().entities.enemies[0].pos.y, y_before);

        session.resume().unwrap();
        // First frame after resuming has no elapsed time
        session.frame(90_000.0, |_| {});
        assert_eq!(session.game().entities.enemies[0].pos.y, y_before);
        session.frame(90_016.0, |_| {});
        assert!(session.game().entities.enemies[0].pos.y > y_before);
        assert_eq!(session.active_task(), Some(Fact::new(3, 4)));
    }

    #[test]
    fn test_resume_requires_paused_run() {
        let mut session = scripted(settings(vec![3], 3), vec![Fact::new(3, 4)], 0);
        assert_eq!(session.resume(), Err(StartError::NothingToResume));
        session.start().unwrap();
        assert_eq!(session.resume(), Err(StartError::AlreadyPlaying));
        assert_eq!(session.start(), Err(StartError::AlreadyPlaying));
        session.pause();
        session.reset();
        assert_eq!(session.resume(), Err(StartError::NothingToResume));
    }

    #[test]
    fn test_restart_cancels_pending_game_over() {
        let mut session = scripted(settings(vec![3], 1), vec![Fact::new(3, 4)], 0);
        session.start().unwrap();
        session.frame(0.0, |_| {});
        session.submit("11", 10.0);
        assert!(session.pending_game_over().is_some());

        session.restart().unwrap();
        assert!(session.pending_game_over().is_none());
        assert_eq!(session.lives(), 1);
        assert_eq!(session.score(), 0);
        session.frame(1000.0, |_| {});
        session.frame(1016.0, |_| {});
        assert_eq!(session.mode(), Mode::Playing);
    }

    #[test]
    fn test_stale_timer_from_earlier_run_is_dropped() {
        let mut session = scripted(settings(vec![3], 1), vec![Fact::new(3, 4)], 0);
        session.start().unwrap();
        session.game_over = Some(GameOverTimer {
            due_ms: 0.0,
            generation: session.generation - 1,
        });
        session.frame(50.0, |_| {});
        assert_eq!(session.mode(), Mode::Playing);
        assert!(session.pending_game_over().is_none());
    }

    #[test]
    fn test_restart_from_over_resets_everything() {
        let mut session = scripted(settings(vec![3], 1), vec![Fact::new(3, 4)], 0);
        session.start().unwrap();
        session.frame(0.0, |_| {});
        session.submit("12", 100.0);
        place_enemy(&mut session, 0.3, Fact::new(3, 5));
        session.frame(116.0, |_| {});
        assert!(matches!(session.submit("1", 200.0), Outcome::Incorrect { .. }));
        session.frame(400.0, |_| {});
        assert_eq!(session.mode(), Mode::Over);
        let best = session.best();
        assert!(best > 0);

        session.start().unwrap();
        assert_eq!(session.mode(), Mode::Playing);
        assert_eq!(session.score(), 0);
        assert_eq!(session.streak(), 0);
        assert_eq!(session.lives(), 1);
        assert_eq!(session.game().performance, Default::default());
        assert_eq!(
            session.game().difficulty,
            session.settings().initial_difficulty
        );
        assert!(session.game().entities.enemies.is_empty());
        assert_eq!(session.best(), best);
    }

    #[test]
    fn test_tables_locked_while_playing() {
        let mut session = scripted(settings(vec![3], 3), vec![Fact::new(3, 4)], 0);
        session.toggle_table(5).unwrap();
        assert_eq!(session.tables(), &[3, 5]);
        session.start().unwrap();
        assert_eq!(session.clear_tables(), Err(StartError::NotInMenu));
        session.pause();
        session.clear_tables().unwrap();
        assert_eq!(session.resume(), Err(StartError::NoTablesSelected));
        assert_eq!(session.status(), Status::SelectTable);
        session.select_all_tables().unwrap();
        assert_eq!(session.tables(), &crate::settings::ALL_TABLES);
    }

    #[test]
    fn test_frame_dt_is_clamped() {
        let mut session = scripted(settings(vec![3], 3), vec![Fact::new(3, 4)], 0);
        session.start().unwrap();
        session.frame(0.0, |_| {});
        let y0 = session.game().entities.enemies[0].pos.y;
        session.frame(10_000.0, |_| {});
        let e = &session.game().entities.enemies[0];
        let max_dy = (e.vel.y + session.game().difficulty.enemy_speed) * 0.033 + 1e-6;
        assert!(e.pos.y - y0 <= max_dy);
    }

    #[test]
    fn test_render_sees_snapshot_every_frame() {
        let mut session = scripted(settings(vec![3], 3), vec![Fact::new(3, 4)], 0);
        let mut seen = Vec::new();
        session.frame(0.0, |snap| seen.push((snap.mode, snap.enemies.len())));
        session.start().unwrap();
        session.frame(1.0, |snap| seen.push((snap.mode, snap.enemies.len())));
        assert_eq!(seen, vec![(Mode::Menu, 0), (Mode::Playing, 1)]);

        let json = serde_json::to_string(&session.snapshot()).unwrap();
        assert!(json.contains("\"mode\":\"playing\""));
        assert!(json.contains("\"kind\":\"shoot\""));
    }

    #[test]
    fn test_step_without_host_clock() {
        let mut session = scripted(settings(vec![3], 3), vec![Fact::new(3, 4)], 0);
        assert!(session.step(0.1).is_empty());
        session.start().unwrap();
        let events = session.step(0.0);
        assert!(events.iter().any(|e| matches!(e, TickEvent::Spawned { .. })));
        session.step(0.5);
        assert!((session.game().clock_ms - 500.0).abs() < 1e-6);
    }

    #[test]
    fn test_unclamped_step_cannot_skip_breach() {
        let mut session = scripted(
            GameSettings {
                first_spawn_delay_ms: 250.0,
                ..settings(vec![3], 3)
            },
            vec![Fact::new(3, 4)],
            0,
        );
        session.start().unwrap();
        let id = place_enemy(&mut session, 0.9, Fact::new(3, 6));
        session.state.entities.enemies[0].vel.y = 0.5;

        let events = session.step(12.0);
        assert!(events.iter().any(|e| matches!(e, TickEvent::Breached { id: hit, .. } if *hit == id)));
        assert_eq!(session.lives(), 2);
        assert!(session.game().entities.enemies.iter().all(|e| e.id != id));
    }

    #[test]
    fn test_broken_storage_does_not_stop_play() {
        let mut session = Session::with_task_source(
            settings(vec![3], 1),
            Box::new(BrokenStore),
            Box::new(ScriptedTasks::new(vec![Fact::new(3, 4)])),
        );
        assert_eq!(session.best(), 0);
        session.start().unwrap();
        session.frame(0.0, |_| {});
        session.submit("12", 100.0);
        place_enemy(&mut session, 0.3, Fact::new(3, 5));
        session.frame(116.0, |_| {});
        assert!(matches!(session.submit("0", 200.0), Outcome::Incorrect { .. }));
        session.frame(1000.0, |_| {});
        assert_eq!(session.mode(), Mode::Over);
        assert_eq!(session.best(), session.score());
    }

    #[test]
    fn test_shared_session_serializes_access() {
        let shared = SharedSession::new(scripted(settings(vec![3], 3), vec![Fact::new(3, 4)], 0));
        shared.with(|s| s.start()).unwrap();
        shared.frame(0.0, |_| {});

        let submitter = {
            let shared = shared.clone();
            std::thread::spawn(move || shared.submit("12", 250.0))
        };
        for i in 1..20 {
            shared.frame(f64::from(i) * 16.0, |_| {});
        }
        let outcome = submitter.join().unwrap();
        assert!(outcome.is_correct());
        assert!(shared.with(|s| s.score()) > 0);
    }

    #[derive(Debug, Clone)]
    enum Action {
        Frame(u16),
        Correct,
        Wrong,
        Garbage,
    }

    fn action() -> impl Strategy<Value = Action> {
        prop_oneof![
            (0u16..200).prop_map(Action::Frame),
            Just(Action::Correct),
            Just(Action::Wrong),
            Just(Action::Garbage),
        ]
    }

    proptest! {
        #[test]
        fn prop_score_monotonic_and_best_is_max(
            seed in any::<u64>(),
            prior_best in 0u64..2000,
            actions in proptest::collection::vec(action(), 1..120),
        ) {
            let mut store = MemoryStore::new();
            store.save(BEST_SCORE_KEY, prior_best).unwrap();
            let mut session = Session::new(
                GameSettings { seed: Some(seed), first_spawn_delay_ms: 0.0, ..GameSettings::default() },
                Box::new(store),
            );
            session.start().unwrap();

            let mut now = 0.0;
            let mut last_score = 0;
            let mut max_score = 0;
            let mut last_streak = 0;
            for action in actions {
                if session.mode() != Mode::Playing {
                    break;
                }
                match action {
                    Action::Frame(ms) => {
                        now += f64::from(ms);
                        session.frame(now, |_| {});
                    }
                    Action::Correct => {
                        if let Some(fact) = session.active_task() {
                            let outcome = session.submit(&fact.answer().to_string(), now);
                            prop_assert!(outcome.is_correct());
                            prop_assert_eq!(session.streak(), last_streak + 1);
                        }
                    }
                    Action::Wrong => {
                        if let Some(fact) = session.active_task() {
                            let outcome = session.submit(&(fact.answer() + 1).to_string(), now);
                            let wrong = matches!(outcome, Outcome::Incorrect { .. });
                            prop_assert!(wrong);
                            prop_assert_eq!(session.streak(), 0);
                        }
                    }
                    Action::Garbage => {
                        prop_assert_eq!(session.submit("x", now), Outcome::Ignored);
                        prop_assert_eq!(session.streak(), last_streak);
                    }
                }
                prop_assert!(session.score() >= last_score);
                last_score = session.score();
                max_score = max_score.max(last_score);
                last_streak = session.streak();
                prop_assert!(session.lives() <= 3);
            }

            // Let any pending game over fire
            now += 1000.0;
            session.frame(now, |_| {});
            if session.mode() == Mode::Over {
                prop_assert_eq!(session.best(), prior_best.max(max_score));
            } else {
                prop_assert_eq!(session.best(), prior_best);
            }
        }
    }
}
