//! Times Invaders entry point
//!
//! Native builds get a terminal driver. By default a bot plays on a virtual
//! clock, which is handy for checking difficulty tuning; `--interactive`
//! runs in real time and reads answers from stdin. The browser build is
//! driven through `times_invaders::web` instead.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::io::BufRead;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use anyhow::{Context, Result, ensure};
    use clap::Parser;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use times_invaders::persistence::{JsonFileStore, MemoryStore, ScoreStore};
    use times_invaders::sim::{Fact, Outcome};
    use times_invaders::{FrameSnapshot, GameSettings, Mode, Session, SharedSession, platform};

    const FRAME_MS: f64 = 1000.0 / 60.0;

    #[derive(Debug, Parser)]
    #[command(name = "times-invaders", about = "Arcade multiplication practice")]
    struct Args {
        /// Play from the terminal instead of watching the bot
        #[arg(long)]
        interactive: bool,
        /// Settings file (JSON)
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Score file (JSON). The best score only lives in memory without it.
        #[arg(long)]
        scores: Option<PathBuf>,
        /// Tables to practise, e.g. `--tables 3,4,7`
        #[arg(long, value_delimiter = ',')]
        tables: Vec<u32>,
        #[arg(long)]
        seed: Option<u64>,
        /// Bot: chance of answering correctly
        #[arg(long, default_value_t = 0.85)]
        accuracy: f64,
        /// Bot: mean delay between a task appearing and the answer (ms)
        #[arg(long, default_value_t = 1800.0)]
        reaction_ms: f64,
        /// Bot: give up after this much simulated time (seconds)
        #[arg(long, default_value_t = 300.0)]
        max_seconds: f64,
    }

    pub fn run() -> Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let args = Args::parse();

        let mut settings = match &args.settings {
            Some(path) => GameSettings::load_from_path(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => GameSettings::default(),
        };
        if args.seed.is_some() {
            settings.seed = args.seed;
        }

        let store: Box<dyn ScoreStore> = match &args.scores {
            Some(path) => Box::new(JsonFileStore::new(path)),
            None => Box::new(MemoryStore::new()),
        };
        let mut session = Session::new(settings, store);
        if !args.tables.is_empty() {
            session.set_tables(args.tables.clone())?;
        }

        if args.interactive {
            interactive(session)
        } else {
            autoplay(session, &args)
        }
    }

    /// Bot player on a virtual 60 Hz clock
    fn autoplay(mut session: Session, args: &Args) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&args.accuracy),
            "--accuracy must be between 0 and 1"
        );
        ensure!(args.reaction_ms >= 0.0, "--reaction-ms must be non-negative");

        let seed = args.seed.unwrap_or_else(platform::default_seed);
        let mut rng = Pcg32::seed_from_u64(seed.wrapping_add(0xB07));
        session.start()?;
        log::info!(
            "Autoplay: accuracy {:.2}, reaction {:.0} ms",
            args.accuracy,
            args.reaction_ms
        );

        let limit_ms = args.max_seconds * 1000.0;
        let mut now = 0.0;
        let mut planned: Option<(Fact, f64)> = None;
        while session.mode() == Mode::Playing && now < limit_ms {
            session.frame(now, |_| {});

            planned = match (session.active_task(), planned) {
                (Some(task), Some((fact, due))) if task == fact => Some((fact, due)),
                (Some(task), _) => {
                    let jitter = rng.random_range(0.6..1.4);
                    Some((task, now + args.reaction_ms * jitter))
                }
                (None, _) => None,
            };

            if let Some((fact, due)) = planned
                && now >= due
            {
                let answer = if rng.random_bool(args.accuracy) {
                    fact.answer()
                } else {
                    fact.answer() + rng.random_range(1..=3)
                };
                let outcome = session.submit(&answer.to_string(), now);
                log::debug!("{} -> {}: {:?}", fact, answer, outcome);
                planned = None;
            }

            now += FRAME_MS;
        }

        // Let a scheduled game over land
        if session.mode() == Mode::Playing && session.lives() == 0 {
            now += session.settings().game_over_delay_ms;
            session.frame(now, |_| {});
        }

        let perf = session.game().performance;
        println!(
            "score {} | best {} | lives {} | {:.0} s | correct {} wrong {} | avg response {:.0} ms",
            session.score(),
            session.best(),
            session.lives(),
            now / 1000.0,
            perf.correct,
            perf.wrong,
            perf.avg_response_ms
        );
        println!(
            "final difficulty: spawn every {:.2} s, speed {:.3}, at most {} enemies",
            session.game().difficulty.spawn_interval,
            session.game().difficulty.enemy_speed,
            session.game().difficulty.max_enemies
        );
        Ok(())
    }

    enum Flow {
        Continue,
        Quit,
    }

    /// Real-time play: the main thread renders, a reader thread feeds input
    fn interactive(session: Session) -> Result<()> {
        let shared = SharedSession::new(session);
        shared.with(|s| s.start())?;
        print_help();

        let quit = Arc::new(AtomicBool::new(false));
        let reader = {
            let shared = shared.clone();
            let quit = Arc::clone(&quit);
            std::thread::spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    let flow = shared.with(|s| handle_line(s, line.trim(), platform::now_ms()));
                    if matches!(flow, Flow::Quit) {
                        break;
                    }
                }
                quit.store(true, Ordering::Relaxed);
            })
        };

        let mut last_hud = String::new();
        while !quit.load(Ordering::Relaxed) {
            shared.frame(platform::now_ms(), |snap| {
                let hud = hud_line(snap);
                if hud != last_hud {
                    println!("{}", hud);
                    last_hud = hud;
                }
            });
            std::thread::sleep(Duration::from_millis(16));
        }

        if reader.join().is_err() {
            log::warn!("Input thread panicked");
        }
        shared.with(|s| println!("best score: {}", s.best()));
        Ok(())
    }

    fn handle_line(session: &mut Session, line: &str, now_ms: f64) -> Flow {
        let result = match line {
            "" => Ok(()),
            "q" | "quit" => return Flow::Quit,
            "h" | "help" => {
                print_help();
                Ok(())
            }
            "p" | "pause" => {
                session.pause();
                Ok(())
            }
            "r" | "resume" => session.resume(),
            "n" | "new" => session.restart(),
            "m" | "menu" => {
                session.reset();
                Ok(())
            }
            "a" | "all" => session.select_all_tables(),
            "c" | "clear" => session.clear_tables(),
            _ => match line.strip_prefix("t ").map(|t| t.trim().parse::<u32>()) {
                Some(Ok(table)) => session
                    .toggle_table(table)
                    .map(|()| println!("tables: {:?}", session.tables())),
                Some(Err(_)) => {
                    println!("usage: t <table>");
                    Ok(())
                }
                None => {
                    match session.submit(line, now_ms) {
                        Outcome::Correct { points, .. } => println!("+{} points", points),
                        Outcome::Incorrect { fact, .. } => {
                            println!("{} = {}", fact, fact.answer())
                        }
                        Outcome::Ignored => {}
                    }
                    Ok(())
                }
            },
        };
        if let Err(err) = result {
            println!("{}", err);
        }
        Flow::Continue
    }

    fn hud_line(snap: &FrameSnapshot<'_>) -> String {
        let hearts: String = (0..snap.lives).map(|_| '♥').collect();
        let closest = snap
            .enemies
            .iter()
            .map(|e| e.pos.y)
            .fold(0.0_f32, f32::max);
        format!(
            "[{:?}] score {} | best {} | {} | streak {} | {} enemies, closest {:>3.0}% | {}",
            snap.mode,
            snap.score,
            snap.best,
            hearts,
            snap.streak,
            snap.enemies.len(),
            // Coarse buckets keep the HUD from redrawing every frame
            (closest * 10.0).floor() * 10.0,
            snap.status
        )
    }

    fn print_help() {
        println!("Type an answer and press enter to fire.");
        println!("Commands: p pause, r resume, n new game, m menu, t <n> toggle table,");
        println!("          a all tables, c clear tables, h help, q quit");
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is times_invaders::web::start, this is just to satisfy the compiler
}
