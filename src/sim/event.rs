/// Events emitted during a simulation tick.
/// The presentation layer consumes these for banners; the run loop logs them.

use super::stats::RunRecord;

/// Why an attempt ended without reaching the exit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureCause {
    HazardContact,
    FellOutOfWorld,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    LevelLoaded { index: usize, attempt: u32 },
    PlayerJumped,
    PlayerLanded,
    HazardsRemoved { count: usize },
    PlayerFailed { cause: FailureCause },
    LevelCleared { record: RunRecord },
    RunExhausted,
}
