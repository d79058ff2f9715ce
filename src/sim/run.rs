/// RunState: level progression across one run.
///
/// ## Phases
///
///   Loading ──ok──▶ Playing ──dead / fell──▶ PlayerFailed ──▶ Loading (same index)
///      │               └────exit reached───▶ LevelCleared ──▶ Loading (index + 1)
///      └──error──▶ Exhausted (terminal)
///
/// `Loading` never lasts a whole tick: the same `tick()` call that loads a
/// level also runs its first physics step. `LevelCleared` and `PlayerFailed`
/// last exactly one tick so the front-end can show the final frame.
///
/// ## Timer
///
/// `clock` counts physics steps. Each load (new level or retry) restarts the
/// attempt timer at the current clock, so a recorded time covers only the
/// successful attempt. Seconds are `steps / tick_rate_hz`.

use tracing::{debug, error, info};

use crate::config::{PhysicsConfig, TimingConfig};
use crate::domain::entity::{FrameInput, MobileHazard, Player};
use crate::domain::geom::Rect;
use crate::domain::tile::Tile;
use super::event::GameEvent;
use super::level::{self, LevelError, LevelSource};
use super::stats::{RunRecord, StatsTracker};
use super::step::{self, Attempt, AttemptStatus};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Loading,
    Playing,
    LevelCleared,
    PlayerFailed,
    Exhausted,
}

/// How a finished run should be reported.
#[derive(Debug)]
pub enum RunOutcome<'a> {
    /// At least one level was cleared.
    Summary(&'a StatsTracker),
    /// Nothing was cleared; the error that ended the run.
    Failed(&'a LevelError),
}

/// Read-only snapshot handed to the presentation layer once per tick.
pub struct FrameView<'a> {
    pub phase: Phase,
    pub level_index: usize,
    pub attempt: u32,
    pub elapsed_secs: f64,
    pub walls: &'a [Rect],
    pub exit: Option<Rect>,
    pub fixed_hazards: &'a [Rect],
    pub hazards: &'a [MobileHazard],
    pub player: Option<&'a Player>,
    pub tiles: &'a [Vec<Tile>],
    pub columns: usize,
    pub rows: usize,
    pub tile_size: i32,
}

pub struct RunState {
    source: Box<dyn LevelSource>,
    physics: PhysicsConfig,
    tick_rate_hz: u32,
    phase: Phase,
    level_index: usize,
    previous_index: Option<usize>,
    attempts: u32,
    clock: u64,
    attempt_start: u64,
    attempt: Option<Attempt>,
    stats: StatsTracker,
    ended_by: Option<LevelError>,
}

impl RunState {
    pub fn new(
        source: Box<dyn LevelSource>,
        physics: PhysicsConfig,
        timing: &TimingConfig,
        first_level: usize,
    ) -> Self {
        info!(source = %source.describe(), first_level, "starting run");
        RunState {
            source,
            physics,
            tick_rate_hz: timing.tick_rate_hz.max(1),
            phase: Phase::Loading,
            level_index: first_level,
            previous_index: None,
            attempts: 0,
            clock: 0,
            attempt_start: 0,
            attempt: None,
            stats: StatsTracker::new(),
            ended_by: None,
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Tick
    // ══════════════════════════════════════════════════════════════

    /// Advance the run by one tick with the input held during it.
    pub fn tick(&mut self, input: FrameInput) -> Vec<GameEvent> {
        let mut events = Vec::new();

        match self.phase {
            Phase::Exhausted => return events,
            Phase::LevelCleared => {
                self.attempt = None;
                self.level_index += 1;
                self.phase = Phase::Loading;
            }
            Phase::PlayerFailed => {
                self.attempt = None;
                self.phase = Phase::Loading;
            }
            Phase::Loading | Phase::Playing => {}
        }

        if self.phase == Phase::Loading {
            self.load(&mut events);
        }
        if self.phase == Phase::Playing {
            self.play(input, &mut events);
        }

        events
    }

    fn load(&mut self, events: &mut Vec<GameEvent>) {
        let index = self.level_index;
        let loaded = self.source.load(index)
            .and_then(|text| level::parse_level(&text, self.physics.tile_size, self.physics.hazard_speed));

        let model = match loaded {
            Ok(model) => model,
            Err(e) => {
                if e.is_exhaustion() {
                    info!(index, "no more levels");
                } else {
                    error!(index, "level failed to load: {e}");
                }
                self.ended_by = Some(e);
                self.phase = Phase::Exhausted;
                events.push(GameEvent::RunExhausted);
                return;
            }
        };

        if self.previous_index == Some(index) {
            self.attempts += 1;
        } else {
            self.attempts = 1;
            self.previous_index = Some(index);
        }
        self.attempt_start = self.clock;
        self.attempt = Some(Attempt::new(model));
        self.phase = Phase::Playing;

        info!(index, attempt = self.attempts, "level loaded");
        events.push(GameEvent::LevelLoaded { index, attempt: self.attempts });
    }

    fn play(&mut self, input: FrameInput, events: &mut Vec<GameEvent>) {
        let Some(attempt) = self.attempt.as_mut() else {
            self.phase = Phase::Loading;
            return;
        };

        self.clock += 1;
        match step::step(attempt, input, &self.physics, events) {
            AttemptStatus::Running => {}
            AttemptStatus::Failed(cause) => {
                info!(index = self.level_index, attempt = self.attempts, ?cause, "attempt failed");
                self.phase = Phase::PlayerFailed;
                events.push(GameEvent::PlayerFailed { cause });
            }
            AttemptStatus::Cleared => {
                let record = RunRecord {
                    level: self.level_index,
                    elapsed_secs: self.elapsed_secs(),
                    attempts: self.attempts,
                };
                info!(
                    index = record.level,
                    attempts = record.attempts,
                    secs = record.elapsed_secs,
                    "level cleared",
                );
                self.stats.record(record.clone());
                self.phase = Phase::LevelCleared;
                events.push(GameEvent::LevelCleared { record });
            }
        }

        for e in events.iter() {
            if matches!(e, GameEvent::PlayerJumped | GameEvent::PlayerLanded | GameEvent::HazardsRemoved { .. }) {
                debug!(tick = self.clock, event = ?e);
            }
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Queries
    // ══════════════════════════════════════════════════════════════

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    /// Seconds since the current attempt was loaded. Frozen once the
    /// attempt ends, since the clock only moves while playing.
    pub fn elapsed_secs(&self) -> f64 {
        (self.clock - self.attempt_start) as f64 / self.tick_rate_hz as f64
    }

    /// The error that ended the run, if any (including running out of levels).
    pub fn ended_by(&self) -> Option<&LevelError> {
        self.ended_by.as_ref()
    }

    /// `None` until the run is exhausted.
    pub fn outcome(&self) -> Option<RunOutcome<'_>> {
        if self.phase != Phase::Exhausted {
            return None;
        }
        if !self.stats.is_empty() {
            return Some(RunOutcome::Summary(&self.stats));
        }
        self.ended_by.as_ref().map(RunOutcome::Failed)
    }

    pub fn view(&self) -> FrameView<'_> {
        let base = FrameView {
            phase: self.phase,
            level_index: self.level_index,
            attempt: self.attempts,
            elapsed_secs: self.elapsed_secs(),
            walls: &[],
            exit: None,
            fixed_hazards: &[],
            hazards: &[],
            player: None,
            tiles: &[],
            columns: 0,
            rows: 0,
            tile_size: self.physics.tile_size,
        };
        match &self.attempt {
            None => base,
            Some(a) => FrameView {
                walls: &a.level.walls,
                exit: Some(a.level.exit),
                fixed_hazards: &a.level.fixed_hazards,
                hazards: &a.hazards,
                player: Some(&a.player),
                tiles: &a.level.tiles,
                columns: a.level.columns,
                rows: a.level.rows,
                tile_size: a.level.tile_size,
                ..base
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::event::FailureCause;
    use crate::sim::level::BuiltinSource;

    /// Walking left clears it in 9 steps; walking right hits the hazard.
    const LEFT_EXIT: &str = "E.P.M\n#####";

    fn run_with(levels: &[&str]) -> RunState {
        let source = BuiltinSource::new(levels.iter().map(|s| s.to_string()).collect());
        RunState::new(Box::new(source), PhysicsConfig::default(), &TimingConfig::default(), 1)
    }

    /// Tick with `input` until an event matching `pred` appears.
    fn tick_until(
        run: &mut RunState,
        input: FrameInput,
        pred: impl Fn(&GameEvent) -> bool,
    ) -> Vec<GameEvent> {
        for _ in 0..1000 {
            let events = run.tick(input);
            if events.iter().any(&pred) {
                return events;
            }
        }
        panic!("event never happened");
    }

    fn is_failed(e: &GameEvent) -> bool {
        matches!(e, GameEvent::PlayerFailed { .. })
    }

    fn is_cleared(e: &GameEvent) -> bool {
        matches!(e, GameEvent::LevelCleared { .. })
    }

    #[test]
    fn first_tick_loads_and_plays() {
        let mut run = run_with(&[LEFT_EXIT]);
        assert_eq!(run.phase(), Phase::Loading);
        let events = run.tick(FrameInput::IDLE);
        assert_eq!(events[0], GameEvent::LevelLoaded { index: 1, attempt: 1 });
        assert_eq!(run.phase(), Phase::Playing);
        assert!(run.view().player.is_some());
    }

    #[test]
    fn two_failures_then_clear_records_third_attempt() {
        let mut run = run_with(&[LEFT_EXIT]);

        let events = tick_until(&mut run, FrameInput::right(), is_failed);
        assert!(events.contains(&GameEvent::PlayerFailed { cause: FailureCause::HazardContact }));
        assert_eq!(run.phase(), Phase::PlayerFailed);

        let events = run.tick(FrameInput::right());
        assert_eq!(events[0], GameEvent::LevelLoaded { index: 1, attempt: 2 });
        tick_until(&mut run, FrameInput::right(), is_failed);

        // Third load happens on the next tick; that tick is also step 1 of 9
        let events = tick_until(&mut run, FrameInput::left(), is_cleared);
        let record = run.stats().records()[0].clone();
        assert!(events.contains(&GameEvent::LevelCleared { record: record.clone() }));
        assert_eq!(record.level, 1);
        assert_eq!(record.attempts, 3);
        assert!((record.elapsed_secs - 9.0 / 60.0).abs() < 1e-9, "got {}", record.elapsed_secs);
        assert_eq!(run.phase(), Phase::LevelCleared);
    }

    #[test]
    fn clear_then_out_of_levels_gives_summary() {
        let mut run = run_with(&[LEFT_EXIT]);
        tick_until(&mut run, FrameInput::left(), is_cleared);
        assert!(run.outcome().is_none());

        let events = run.tick(FrameInput::IDLE);
        assert_eq!(events, vec![GameEvent::RunExhausted]);
        assert_eq!(run.phase(), Phase::Exhausted);
        assert_eq!(run.level_index(), 2);
        assert!(run.ended_by().is_some_and(|e| e.is_exhaustion()));
        match run.outcome() {
            Some(RunOutcome::Summary(stats)) => {
                let agg = stats.aggregate();
                assert_eq!((agg.levels_cleared, agg.total_attempts), (1, 1));
            }
            other => panic!("expected summary, got {other:?}"),
        }

        // Terminal
        assert!(run.tick(FrameInput::IDLE).is_empty());
        assert_eq!(run.phase(), Phase::Exhausted);
    }

    #[test]
    fn new_level_resets_attempts() {
        let mut run = run_with(&[LEFT_EXIT, LEFT_EXIT]);
        tick_until(&mut run, FrameInput::right(), is_failed);
        tick_until(&mut run, FrameInput::left(), is_cleared);
        assert_eq!(run.attempts(), 2);

        let events = run.tick(FrameInput::left());
        assert_eq!(events[0], GameEvent::LevelLoaded { index: 2, attempt: 1 });
        assert_eq!(run.elapsed_secs(), 1.0 / 60.0);
    }

    #[test]
    fn view_before_first_load_is_empty() {
        let run = run_with(&[LEFT_EXIT]);
        let view = run.view();
        assert!(view.walls.is_empty() && view.fixed_hazards.is_empty());
        assert_eq!(view.exit, None);
        assert!(view.player.is_none());
    }

    #[test]
    fn missing_first_level_fails_the_run() {
        let mut run = run_with(&[]);
        assert_eq!(run.tick(FrameInput::IDLE), vec![GameEvent::RunExhausted]);
        match run.outcome() {
            Some(RunOutcome::Failed(LevelError::ContentNotFound { index: 1 })) => {}
            other => panic!("expected ContentNotFound, got {other:?}"),
        }
    }

    #[test]
    fn malformed_level_is_fatal() {
        let mut run = run_with(&["P.Z\n###"]);
        run.tick(FrameInput::IDLE);
        assert_eq!(run.phase(), Phase::Exhausted);
        match run.outcome() {
            Some(RunOutcome::Failed(e)) => {
                assert!(matches!(e, LevelError::InvalidCharacter { ch: 'Z', row: 0, column: 2 }));
                assert!(!e.is_exhaustion());
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn fatal_error_after_a_clear_still_summarises() {
        let mut run = run_with(&[LEFT_EXIT, "P..\n###"]);
        tick_until(&mut run, FrameInput::left(), is_cleared);
        run.tick(FrameInput::IDLE);
        assert!(matches!(run.outcome(), Some(RunOutcome::Summary(_))));
        assert!(matches!(run.ended_by(), Some(LevelError::ExitCount { count: 0 })));
    }

    #[test]
    fn retry_restores_fresh_entities() {
        let mut run = run_with(&["X.P.E\n#####"]);
        tick_until(&mut run, FrameInput::IDLE, is_failed);
        run.tick(FrameInput::IDLE);

        let view = run.view();
        assert_eq!(view.attempt, 2);
        // One physics step after reload
        assert_eq!(view.hazards[0].rect.x, 2);
        assert_eq!(view.player.map(|p| p.rect.x), Some(80));
    }

    #[test]
    fn view_freezes_timer_after_clear() {
        let mut run = run_with(&[LEFT_EXIT]);
        tick_until(&mut run, FrameInput::left(), is_cleared);
        let view = run.view();
        assert_eq!(view.phase, Phase::LevelCleared);
        assert_eq!(view.elapsed_secs, 9.0 / 60.0);
        assert_eq!((view.columns, view.rows, view.tile_size), (5, 2, 40));
        assert_eq!(view.tiles[0][0], Tile::Exit);
        assert_eq!(view.exit, Some(Rect::new(0, 0, 40, 40)));
        assert_eq!(view.walls.len(), 5);
        assert_eq!(view.fixed_hazards, &[Rect::new(160, 0, 40, 40)][..]);
    }
}
