/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::{execute, terminal};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::entity::FrameInput;
use sim::level;
use sim::run::{Phase, RunOutcome, RunState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::{summary_lines, Banner, Renderer};

const FRAME_SLEEP: Duration = Duration::from_millis(2);
const LOG_FILE: &str = "tilehop.log";

fn main() {
    init_tracing();

    let config = GameConfig::load();
    let source = level::source_from_config(&config);
    let mut run = RunState::new(source, config.physics.clone(), &config.timing, config.first_level);

    let mut renderer = Renderer::new();
    let started = start_or_restore(&mut renderer, |r| r.init(), |r| r.cleanup());
    if let Err(e) = started {
        error!("terminal init failed: {e}");
        eprintln!("Terminal init failed: {e}");
        return;
    }
    let enhanced = enable_key_release();

    let result = game_loop(&mut run, &mut renderer, &config, enhanced);

    if enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!("game loop aborted: {e}");
        eprintln!("Game error: {e}");
    }

    report(&run);
}

/// Run `start`; if it fails part-way (raw mode may already be on), run
/// `restore` before handing back the original error.
fn start_or_restore<T>(
    target: &mut T,
    start: impl FnOnce(&mut T) -> io::Result<()>,
    restore: impl FnOnce(&mut T) -> io::Result<()>,
) -> io::Result<()> {
    start(target).inspect_err(|_| {
        let _ = restore(target);
    })
}

/// Logs go to a file; the terminal belongs to the renderer.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .compact();
    let _ = match File::create(LOG_FILE) {
        Ok(file) => builder.with_writer(Mutex::new(file)).try_init(),
        Err(_) => builder.with_writer(io::sink).try_init(),
    };
}

/// Ask the terminal for key Release events. Without them, held keys are
/// detected by repeat timeout.
fn enable_key_release() -> bool {
    if !terminal::supports_keyboard_enhancement().unwrap_or(false) {
        info!("keyboard enhancement unavailable, using hold timeout");
        return false;
    }
    let pushed = execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    );
    match pushed {
        Ok(()) => true,
        Err(e) => {
            warn!("keyboard enhancement rejected: {e}");
            false
        }
    }
}

fn game_loop(
    run: &mut RunState,
    renderer: &mut Renderer,
    config: &GameConfig,
    enhanced: bool,
) -> io::Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = enhanced;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        info!("gamepad detected");
    }

    let tick_rate = Duration::from_secs_f64(1.0 / config.timing.tick_rate_hz.max(1) as f64);
    let banner_time = Duration::from_millis(config.timing.banner_ms);
    let mut banner: Option<(Banner, Instant)> = None;
    let mut last_tick = Instant::now();

    while run.phase() != Phase::Exhausted {
        kb.drain_events();
        gp.update();

        if kb.quit_pressed() || gp.quit_pressed() {
            info!(level = run.level_index(), "quit requested");
            return Ok(());
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();

            if banner.as_ref().is_some_and(|(_, shown)| shown.elapsed() >= banner_time) {
                banner = None;
            }
            let held = banner.as_ref().is_some_and(|(b, _)| b.pauses());
            if !held {
                let input = merge_input(kb.frame_input(), gp.frame_input());
                for event in run.tick(input) {
                    if let Some(b) = Banner::from_event(&event) {
                        banner = Some((b, Instant::now()));
                    }
                }
            }

            renderer.render(&run.view(), banner.as_ref().map(|(b, _)| b))?;
        }

        std::thread::sleep(FRAME_SLEEP);
    }

    if let Some(RunOutcome::Summary(stats)) = run.outcome() {
        renderer.render_summary(stats)?;
        loop {
            kb.drain_events();
            gp.update();
            if kb.any_key_pressed() || gp.any_pressed() {
                break;
            }
            std::thread::sleep(Duration::from_millis(16));
        }
    }
    Ok(())
}

/// Keyboard and gamepad are OR-ed together.
fn merge_input(a: FrameInput, b: FrameInput) -> FrameInput {
    FrameInput {
        left: a.left || b.left,
        right: a.right || b.right,
        jump: a.jump || b.jump,
    }
}

fn report(run: &RunState) {
    println!();
    match run.outcome() {
        Some(RunOutcome::Summary(stats)) => {
            for line in summary_lines(stats) {
                println!("{line}");
            }
            if let Some(e) = run.ended_by().filter(|e| !e.is_exhaustion()) {
                eprintln!("Run stopped early: {e}");
            }
        }
        Some(RunOutcome::Failed(e)) => {
            error!("run failed: {e}");
            eprintln!("Could not start: {e}");
            std::process::exit(1);
        }
        None => {
            println!("Run abandoned on level {}.", run.level_index());
            if !run.stats().is_empty() {
                for line in summary_lines(run.stats()) {
                    println!("{line}");
                }
            }
        }
    }
}
