/// The step function: advances one attempt by one tick.
///
/// Processing order:
///   1. Patrolling hazards (move, bounce, fall, removal)
///   2. Player physics (input → velocity → x → y → hazard contact)
///   3. Outcome: death, void fall, exit
///
/// Hazards move first, so the player is tested against where the hazards
/// are at the end of this tick. Death is checked before the exit: touching
/// a hazard and the exit on the same tick is a failure.

use tracing::trace;

use crate::config::PhysicsConfig;
use crate::domain::entity::{FrameInput, MobileHazard, Player};
use crate::domain::{patrol, physics};
use super::event::{FailureCause, GameEvent};
use super::level::LevelModel;

/// Everything owned by one try at one level. Built fresh on every load.
#[derive(Clone, Debug)]
pub struct Attempt {
    pub level: LevelModel,
    pub player: Player,
    pub hazards: Vec<MobileHazard>,
}

impl Attempt {
    pub fn new(level: LevelModel) -> Self {
        let (x, y) = level.spawn;
        let player = Player::spawn_at(x, y, level.tile_size);
        let hazards = level.hazards.clone();
        Attempt { level, player, hazards }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptStatus {
    Running,
    Failed(FailureCause),
    Cleared,
}

pub fn step(
    attempt: &mut Attempt,
    input: FrameInput,
    cfg: &PhysicsConfig,
    events: &mut Vec<GameEvent>,
) -> AttemptStatus {
    let removed = patrol::step_hazards(&mut attempt.hazards, &attempt.level.walls, cfg);
    if removed > 0 {
        events.push(GameEvent::HazardsRemoved { count: removed });
    }

    let report = physics::step_player(
        &mut attempt.player,
        input,
        &attempt.level.walls,
        &attempt.level.fixed_hazards,
        &attempt.hazards,
        cfg,
    );
    if report.bumped_wall || report.touched_hazard {
        trace!(wall = report.bumped_wall, hazard = report.touched_hazard, "player contact");
    }
    if report.jumped {
        events.push(GameEvent::PlayerJumped);
    }
    // A resting player re-lands every other tick at gravity speed; only real falls count
    if report.landed && report.impact_speed > cfg.gravity {
        events.push(GameEvent::PlayerLanded);
    }

    evaluate(attempt, cfg)
}

fn evaluate(attempt: &Attempt, cfg: &PhysicsConfig) -> AttemptStatus {
    let player = &attempt.player;
    if !player.alive {
        return AttemptStatus::Failed(FailureCause::HazardContact);
    }
    if physics::fell_out_of_world(&player.rect, cfg.world_height) {
        return AttemptStatus::Failed(FailureCause::FellOutOfWorld);
    }
    if player.rect.intersects(&attempt.level.exit) {
        return AttemptStatus::Cleared;
    }
    AttemptStatus::Running
}
