/// Patrolling hazards — walk, bounce, fall.
///
/// Each hazard is updated independently every tick:
///   1. Gravity, clamped to the terminal fall speed.
///   2. Move on x. World edges force the direction inward.
///   3. Wall contact snaps the hazard out and reverses it.
///   4. Move on y. Landing stops the fall, nothing else.
///   5. A hazard whose top edge has dropped below the world is gone for good.
///
/// Hazards never interact with each other, and do not turn at ledges:
/// walking off a platform is how they leave the level.

use crate::config::PhysicsConfig;
use super::collision::{self, Contact};
use super::entity::MobileHazard;
use super::geom::Rect;

/// Advance every hazard by one tick. Returns how many were removed.
pub fn step_hazards(hazards: &mut Vec<MobileHazard>, walls: &[Rect], cfg: &PhysicsConfig) -> usize {
    let mut gone: Vec<usize> = Vec::new();

    for (i, h) in hazards.iter_mut().enumerate() {
        step_one(h, walls, cfg);
        if h.rect.top() > cfg.world_height {
            gone.push(i);
        }
    }

    if gone.is_empty() { return 0; }

    let mut idx = 0;
    hazards.retain(|_| {
        let keep = !gone.contains(&idx);
        idx += 1;
        keep
    });
    gone.len()
}

fn step_one(h: &mut MobileHazard, walls: &[Rect], cfg: &PhysicsConfig) {
    h.vy = (h.vy + cfg.gravity).min(cfg.max_fall_speed);

    h.rect.translate(h.vx, 0);
    if h.rect.left() <= 0 {
        h.vx = h.vx.abs();
    } else if h.rect.right() >= cfg.world_width {
        h.vx = -h.vx.abs();
    }
    collision::resolve_horizontal(&mut h.rect, &mut h.vx, walls, Contact::Reverse);

    h.rect.translate(0, h.vy);
    collision::resolve_vertical(&mut h.rect, &mut h.vy, walls);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const T: i32 = 40;

    fn cfg() -> PhysicsConfig {
        PhysicsConfig::default()
    }

    fn floor(cols: usize, row: usize) -> Vec<Rect> {
        (0..cols).map(|c| Rect::cell(c, row, T)).collect()
    }

    #[test]
    fn hazard_walks_on_floor() {
        let walls = floor(10, 1);
        let mut hs = vec![MobileHazard::new(Rect::cell(2, 0, T), 2)];
        for _ in 0..5 {
            assert_eq!(step_hazards(&mut hs, &walls, &cfg()), 0);
        }
        assert_eq!(hs[0].rect.x, 80 + 5 * 2);
        assert_eq!(hs[0].rect.bottom(), 40, "stays on the floor");
    }

    #[test]
    fn wall_contact_reverses_direction() {
        let mut walls = floor(10, 1);
        walls.push(Rect::cell(4, 0, T));
        let mut hs = vec![MobileHazard::new(Rect::new(119, 0, T, T), 2)];
        step_hazards(&mut hs, &walls, &cfg());
        assert_eq!(hs[0].rect.right(), 160);
        assert_eq!(hs[0].vx, -2);

        step_hazards(&mut hs, &walls, &cfg());
        assert_eq!(hs[0].rect.x, 118);
    }

    #[test]
    fn world_edges_turn_hazard_inward() {
        let walls = floor(20, 1);
        let mut left = MobileHazard::new(Rect::new(1, 0, T, T), 2);
        left.vx = -2;
        let mut right = MobileHazard::new(Rect::new(800 - T - 1, 0, T, T), 2);

        let mut hs = vec![left, right.clone()];
        step_hazards(&mut hs, &walls, &cfg());
        assert_eq!(hs[0].vx, 2);
        assert_eq!(hs[1].vx, -2);

        right.vx = -2;
        let mut hs = vec![right];
        step_hazards(&mut hs, &walls, &cfg());
        assert_eq!(hs[0].vx, -2, "already heading inward");
    }

    #[test]
    fn hazard_walks_off_ledges() {
        // Floor under columns 0..=2 only
        let walls = floor(3, 1);
        let mut hs = vec![MobileHazard::new(Rect::cell(2, 0, T), 2)];
        for _ in 0..25 {
            step_hazards(&mut hs, &walls, &cfg());
        }
        assert!(hs[0].rect.top() > 0, "no ledge turning");
        assert_eq!(hs[0].vx, 2);
    }

    #[test]
    fn falling_hazard_is_removed_after_update_pass() {
        let walls = floor(2, 14);
        let mut hs = vec![
            MobileHazard::new(Rect::new(400, 600, T, T), 2),
            MobileHazard::new(Rect::cell(0, 13, T), 2),
            MobileHazard::new(Rect::new(600, 600, T, T), 2),
        ];
        let removed = step_hazards(&mut hs, &walls, &cfg());
        assert_eq!(removed, 2);
        assert_eq!(hs.len(), 1);
        assert_eq!(hs[0].rect.x, 2, "survivor was still updated");
    }

    #[test]
    fn top_exactly_at_world_bottom_is_kept() {
        let mut hs = vec![MobileHazard::new(Rect::new(100, 600, T, T), 2)];
        hs[0].vy = -cfg().gravity;
        assert_eq!(step_hazards(&mut hs, &[], &cfg()), 0);
        assert_eq!(hs[0].rect.top(), 600);
    }

    proptest! {
        /// Once a hazard leaves the world it never comes back, and the
        /// population only shrinks.
        #[test]
        fn removal_is_permanent(
            xs in proptest::collection::vec(0i32..760, 1..8),
            ticks in 1usize..120,
        ) {
            let walls = floor(5, 14);
            let mut hs: Vec<MobileHazard> = xs.iter()
                .map(|&x| MobileHazard::new(Rect::new(x, 0, T, T), 2))
                .collect();
            let mut total_removed = 0;
            let start = hs.len();

            for _ in 0..ticks {
                let before = hs.len();
                let removed = step_hazards(&mut hs, &walls, &cfg());
                total_removed += removed;
                prop_assert_eq!(hs.len(), before - removed);
                prop_assert!(hs.iter().all(|h| h.rect.top() <= cfg().world_height));
            }
            prop_assert_eq!(hs.len() + total_removed, start);
        }
    }
}
