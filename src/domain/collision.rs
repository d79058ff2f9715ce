/// Axis-separated collision resolution against a fixed set of solid tiles.
///
/// Callers move a body along ONE axis, then resolve that axis:
///
///   1. `x += vx`  →  `resolve_horizontal`
///   2. `y += vy`  →  `resolve_vertical`
///
/// Horizontal is fully resolved before the vertical displacement is applied,
/// so a body sliding along a floor never snags on a wall corner and a body
/// falling past a wall edge is never pushed sideways.
///
/// Snapping is always onto the boundary of the tile just hit, chosen by the
/// direction of travel on the axis being resolved. A body with zero velocity
/// on that axis is left where it is.

use super::geom::Rect;

/// What happens to horizontal velocity on a wall contact.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Contact {
    /// Stop in position only; velocity is kept (player).
    Hold,
    /// Flip the velocity sign (patrolling hazards).
    Reverse,
}

/// Resolve overlap on the x axis. Returns true if any tile was hit.
pub fn resolve_horizontal(body: &mut Rect, vx: &mut i32, solids: &[Rect], contact: Contact) -> bool {
    let mut hit = false;
    for tile in solids {
        if !body.intersects(tile) { continue; }
        if *vx > 0 {
            body.set_right(tile.left());
        } else if *vx < 0 {
            body.set_left(tile.right());
        } else {
            continue;
        }
        hit = true;
        if contact == Contact::Reverse {
            *vx = -*vx;
        }
    }
    hit
}

/// Resolve overlap on the y axis. Returns true if the body landed
/// (was moving down and hit a tile top).
pub fn resolve_vertical(body: &mut Rect, vy: &mut i32, solids: &[Rect]) -> bool {
    let mut landed = false;
    for tile in solids {
        if !body.intersects(tile) { continue; }
        if *vy > 0 {
            body.set_bottom(tile.top());
            *vy = 0;
            landed = true;
        } else if *vy < 0 {
            body.set_top(tile.bottom());
            *vy = 0;
        }
    }
    landed
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const T: i32 = 40;

    fn wall(col: i32, row: i32) -> Rect {
        Rect::new(col * T, row * T, T, T)
    }

    // ── Horizontal ──

    #[test]
    fn moving_right_snaps_to_tile_left() {
        let solids = [wall(2, 0)];
        let mut body = Rect::new(45, 0, T, T); // right edge at 85, inside tile at 80
        let mut vx = 5;
        assert!(resolve_horizontal(&mut body, &mut vx, &solids, Contact::Hold));
        assert_eq!(body.right(), 80);
        assert_eq!(vx, 5, "player keeps its velocity");
    }

    #[test]
    fn moving_left_snaps_to_tile_right() {
        let solids = [wall(0, 0)];
        let mut body = Rect::new(37, 0, T, T);
        let mut vx = -5;
        assert!(resolve_horizontal(&mut body, &mut vx, &solids, Contact::Hold));
        assert_eq!(body.left(), 40);
    }

    #[test]
    fn reverse_contact_flips_velocity() {
        let solids = [wall(2, 0)];
        let mut body = Rect::new(42, 0, T, T);
        let mut vx = 2;
        assert!(resolve_horizontal(&mut body, &mut vx, &solids, Contact::Reverse));
        assert_eq!(vx, -2);
        assert!(!body.intersects(&solids[0]));
    }

    #[test]
    fn zero_velocity_does_not_move_body() {
        let solids = [wall(1, 0)];
        let mut body = Rect::new(45, 0, T, T);
        let mut vx = 0;
        assert!(!resolve_horizontal(&mut body, &mut vx, &solids, Contact::Hold));
        assert_eq!(body.x, 45);
    }

    #[test]
    fn touching_tile_is_not_a_contact() {
        let solids = [wall(1, 0)];
        let mut body = Rect::new(0, 0, T, T);
        let mut vx = 5;
        assert!(!resolve_horizontal(&mut body, &mut vx, &solids, Contact::Hold));
    }

    // ── Vertical ──

    #[test]
    fn falling_lands_on_tile_top() {
        let solids = [wall(0, 1)];
        let mut body = Rect::new(0, 7, T, T);
        let mut vy = 7;
        assert!(resolve_vertical(&mut body, &mut vy, &solids));
        assert_eq!(body.bottom(), 40);
        assert_eq!(vy, 0);
    }

    #[test]
    fn rising_bumps_head_on_tile_bottom() {
        let solids = [wall(0, 0)];
        let mut body = Rect::new(0, 30, T, T);
        let mut vy = -15;
        assert!(!resolve_vertical(&mut body, &mut vy, &solids), "head bump is not a landing");
        assert_eq!(body.top(), 40);
        assert_eq!(vy, 0);
    }

    #[test]
    fn floor_slide_does_not_snag_on_seams() {
        // Body resting on a floor made of two tiles, walking right across the seam.
        let solids = [wall(0, 1), wall(1, 1)];
        let mut body = Rect::new(20, 0, T, T);
        let mut vx = 5;
        body.translate(vx, 0);
        assert!(!resolve_horizontal(&mut body, &mut vx, &solids, Contact::Hold));
        assert_eq!(body.x, 25);
    }

    #[test]
    fn corner_is_resolved_per_axis() {
        // Diagonal move into a corner: wall to the right and floor below.
        let solids = [wall(1, 0), wall(0, 1)];
        let mut body = Rect::new(0, 0, T, T);
        let (mut vx, mut vy) = (5, 5);

        body.translate(vx, 0);
        resolve_horizontal(&mut body, &mut vx, &solids, Contact::Hold);
        assert_eq!(body.x, 0);

        body.translate(0, vy);
        let landed = resolve_vertical(&mut body, &mut vy, &solids);
        assert!(landed);
        assert_eq!(body, Rect::new(0, 0, T, T));
        assert!(solids.iter().all(|s| !body.intersects(s)));
    }

    proptest! {
        /// After each axis pass the body is clear of every tile it was
        /// resolved against on that axis, for displacements below one tile.
        #[test]
        fn no_overlap_after_resolution(
            cells in proptest::collection::vec((0i32..6, 0i32..6), 1..12),
            start_col in 0i32..6,
            start_row in 0i32..6,
            moves in proptest::collection::vec((-15i32..=15, -15i32..=15), 1..40),
        ) {
            let solids: Vec<Rect> = cells.iter()
                .filter(|&&(c, r)| (c, r) != (start_col, start_row))
                .map(|&(c, r)| wall(c, r))
                .collect();
            let mut body = wall(start_col, start_row);

            for (dx, dy) in moves {
                let (mut vx, mut vy) = (dx, dy);
                body.translate(vx, 0);
                resolve_horizontal(&mut body, &mut vx, &solids, Contact::Hold);
                if vx != 0 {
                    prop_assert!(solids.iter().all(|s| !body.intersects(s)));
                }
                body.translate(0, vy);
                resolve_vertical(&mut body, &mut vy, &solids);
                if dy != 0 {
                    prop_assert!(solids.iter().all(|s| !body.intersects(s)));
                }
            }
        }
    }
}
