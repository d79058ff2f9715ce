/// Integer pixel rectangles.
///
/// `(x, y)` is the top-left corner, y grows downward.
/// Overlap is strict: rectangles that only share an edge do not overlap,
/// and a rectangle with zero width or height never overlaps anything.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Rect { x, y, w, h }
    }

    /// The square covering grid cell `(column, row)`.
    pub fn cell(column: usize, row: usize, tile_size: i32) -> Self {
        Rect::new(column as i32 * tile_size, row as i32 * tile_size, tile_size, tile_size)
    }

    #[inline] pub fn left(&self) -> i32 { self.x }
    #[inline] pub fn right(&self) -> i32 { self.x + self.w }
    #[inline] pub fn top(&self) -> i32 { self.y }
    #[inline] pub fn bottom(&self) -> i32 { self.y + self.h }

    #[inline] pub fn set_left(&mut self, v: i32) { self.x = v; }
    #[inline] pub fn set_right(&mut self, v: i32) { self.x = v - self.w; }
    #[inline] pub fn set_top(&mut self, v: i32) { self.y = v; }
    #[inline] pub fn set_bottom(&mut self, v: i32) { self.y = v - self.h; }

    #[inline]
    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.x += dx;
        self.y += dy;
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        if self.w <= 0 || self.h <= 0 || other.w <= 0 || other.h <= 0 {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Grow (positive) or shrink (negative) around the centre.
    /// `dw` / `dh` are total changes in width / height, half per side.
    pub fn inflate(&self, dw: i32, dh: i32) -> Rect {
        let w = (self.w + dw).max(0);
        let h = (self.h + dh).max(0);
        Rect::new(self.x - dw / 2, self.y - dh / 2, w, h)
    }
}
