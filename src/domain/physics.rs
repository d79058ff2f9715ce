/// Player physics — one tick of input → velocity → motion → contacts.
///
/// ## Tick order
///
///   1. Horizontal velocity is SET from input (no acceleration, no friction,
///      same control in the air as on the ground).
///   2. Gravity when airborne, clamped to the terminal fall speed.
///   3. Jump when the jump input is held AND the player is grounded.
///      Level-triggered: holding jump re-fires on the tick the player lands.
///   4. Move on x, resolve x.
///   5. Assume falling, move on y, resolve y (a landing re-grounds).
///   6. Hazard contact against shrunken hazard hitboxes.
///
/// Hazard contact only clears `alive`; the tick is not cut short and the
/// run state machine decides what happens next.

use crate::config::PhysicsConfig;
use super::collision::{self, Contact};
use super::entity::{Facing, FrameInput, MobileHazard, Player};
use super::geom::Rect;

/// What happened to the player during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerStep {
    pub jumped: bool,
    pub landed: bool,
    /// Downward speed at the moment of landing (0 if no landing).
    pub impact_speed: i32,
    pub bumped_wall: bool,
    pub touched_hazard: bool,
}

/// Set velocities from input and gravity (steps 1–3).
pub fn apply_input(player: &mut Player, input: FrameInput, cfg: &PhysicsConfig) -> bool {
    player.vx = 0;
    if input.left {
        player.vx = -cfg.max_run_speed;
        player.facing = Facing::Left;
    }
    if input.right {
        player.vx = cfg.max_run_speed;
        player.facing = Facing::Right;
    }

    if !player.grounded {
        player.vy = (player.vy + cfg.gravity).min(cfg.max_fall_speed);
    }

    if input.jump && player.grounded {
        player.vy = -cfg.jump_impulse;
        player.grounded = false;
        return true;
    }
    false
}

/// Advance the player by one tick against the level's walls and hazards.
pub fn step_player(
    player: &mut Player,
    input: FrameInput,
    walls: &[Rect],
    fixed_hazards: &[Rect],
    mobile_hazards: &[MobileHazard],
    cfg: &PhysicsConfig,
) -> PlayerStep {
    let mut report = PlayerStep::default();
    report.jumped = apply_input(player, input, cfg);

    player.rect.translate(player.vx, 0);
    report.bumped_wall = collision::resolve_horizontal(
        &mut player.rect, &mut player.vx, walls, Contact::Hold,
    );

    player.rect.translate(0, player.vy);
    player.grounded = false;
    let falling_at = player.vy;
    if collision::resolve_vertical(&mut player.rect, &mut player.vy, walls) {
        player.grounded = true;
        report.landed = true;
        report.impact_speed = falling_at;
    }

    if touches_hazard(&player.rect, fixed_hazards, mobile_hazards, cfg.hazard_hitbox_shrink) {
        player.alive = false;
        report.touched_hazard = true;
    }

    report
}

/// Forgiving hitbox test: each hazard is shrunk by `shrink` pixels in width
/// and height (half per side) before the overlap test.
pub fn touches_hazard(body: &Rect, fixed: &[Rect], mobile: &[MobileHazard], shrink: i32) -> bool {
    let hit = |r: &Rect| body.intersects(&r.inflate(-shrink, -shrink));
    fixed.iter().any(hit) || mobile.iter().any(|m| hit(&m.rect))
}

/// Has the body dropped below the bottom of the world?
#[inline]
pub fn fell_out_of_world(body: &Rect, world_height: i32) -> bool {
    body.top() > world_height
}
