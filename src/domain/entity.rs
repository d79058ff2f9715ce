/// Entities: Player and MobileHazard.
/// Both are plain owned values; each attempt builds fresh ones from the level.

use super::geom::Rect;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

/// Held-input snapshot for one tick.
/// Everything is level-triggered: a key counts for as long as it is held.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl FrameInput {
    pub const IDLE: FrameInput = FrameInput { left: false, right: false, jump: false };

    pub fn left() -> Self {
        FrameInput { left: true, ..Self::IDLE }
    }

    pub fn right() -> Self {
        FrameInput { right: true, ..Self::IDLE }
    }

    pub fn jump() -> Self {
        FrameInput { jump: true, ..Self::IDLE }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub rect: Rect,
    pub vx: i32,
    pub vy: i32,
    pub grounded: bool,
    pub facing: Facing,
    pub alive: bool,
}

impl Player {
    /// Fresh player standing at a spawn point: airborne until the first
    /// vertical resolution proves otherwise.
    pub fn spawn_at(x: i32, y: i32, size: i32) -> Self {
        Player {
            rect: Rect::new(x, y, size, size),
            vx: 0,
            vy: 0,
            grounded: false,
            facing: Facing::Right,
            alive: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MobileHazard {
    pub rect: Rect,
    pub vx: i32,
    pub vy: i32,
}

impl MobileHazard {
    pub fn new(rect: Rect, speed: i32) -> Self {
        MobileHazard { rect, vx: speed, vy: 0 }
    }

    /// Patrol direction, for sprite flipping.
    pub fn facing(&self) -> Facing {
        if self.vx > 0 { Facing::Right } else { Facing::Left }
    }
}
