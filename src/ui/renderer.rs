/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The simulation works in pixels; the terminal shows one tile per
/// `CELL_W` columns. Moving entities are drawn in the tile under their centre.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::Facing;
use crate::domain::geom::Rect;
use crate::domain::tile::Tile;
use crate::sim::event::{FailureCause, GameEvent};
use crate::sim::run::{FrameView, Phase};
use crate::sim::stats::StatsTracker;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool,    // occupies 2 terminal columns
    cont: bool,    // right half of a wide char (skip render)
}

impl Cell {
    /// Explicit background for every cell, also used for `Clear`, so row
    /// gaps match cell colour on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 20, b: 32 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 4],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Never equal to a real cell; filling `back` with it forces a repaint.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn from_char_wide(c: char, bg: Color) -> Self {
        let mut cell = Self::from_char(c, Color::Reset, bg);
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or("?")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::from_char(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', Color::White, bg));
        }
    }

    /// One tile = two terminal columns.
    fn set_tile(&mut self, col: usize, row: usize, glyph: Glyph) {
        match glyph {
            Glyph::Pair(c0, c1, fg, bg) => {
                self.set(col, row, Cell::from_char(c0, fg, bg));
                self.set(col + 1, row, Cell::from_char(c1, fg, bg));
            }
            Glyph::Wide(c, bg) => {
                self.set(col, row, Cell::from_char_wide(c, bg));
                self.set(col + 1, row, Cell::WIDE_CONT);
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Glyph {
    Pair(char, char, Color, Color),
    Wide(char, Color),
}

fn tile_glyph(tile: Tile) -> Glyph {
    match tile {
        Tile::Wall        => Glyph::Pair('█', '█', Color::Rgb { r: 120, g: 90, b: 60 }, Color::Rgb { r: 80, g: 55, b: 35 }),
        Tile::Exit        => Glyph::Wide('🚪', Color::Rgb { r: 20, g: 60, b: 30 }),
        Tile::FixedHazard => Glyph::Wide('🔥', Color::Reset),
        // Faint marker where retries restart
        Tile::PlayerSpawn => Glyph::Pair('·', ' ', Color::DarkGrey, Color::Reset),
        Tile::Empty | Tile::MobileHazardSpawn => Glyph::Pair(' ', ' ', Color::Reset, Color::Reset),
    }
}

/// Grid cell under the centre of `rect`, if it lies on the grid.
pub fn cell_of(rect: &Rect, tile_size: i32, columns: usize, rows: usize) -> Option<(usize, usize)> {
    if tile_size <= 0 { return None; }
    let cx = rect.x + rect.w / 2;
    let cy = rect.y + rect.h / 2;
    if cx < 0 || cy < 0 { return None; }
    let (col, row) = ((cx / tile_size) as usize, (cy / tile_size) as usize);
    (col < columns && row < rows).then_some((col, row))
}

// ── Banners ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tone {
    Info,
    Success,
    Failure,
}

/// Transient message shown between attempts.
#[derive(Clone, Debug, PartialEq)]
pub struct Banner {
    pub title: String,
    pub detail: String,
    pub tone: Tone,
}

impl Banner {
    /// Banner for events that pause play; `None` for the rest.
    pub fn from_event(event: &GameEvent) -> Option<Banner> {
        match event {
            GameEvent::LevelLoaded { index, attempt } => Some(Banner {
                title: format!("Level {index}"),
                detail: format!("Attempt {attempt}"),
                tone: Tone::Info,
            }),
            GameEvent::PlayerFailed { cause } => {
                let why = match cause {
                    FailureCause::HazardContact => "Hit!",
                    FailureCause::FellOutOfWorld => "Fell!",
                };
                Some(Banner {
                    title: "FAILED".into(),
                    detail: why.into(),
                    tone: Tone::Failure,
                })
            }
            GameEvent::LevelCleared { record } => Some(Banner {
                title: "LEVEL CLEARED!".into(),
                detail: format!("Time: {:.1}s | Attempts: {}", record.elapsed_secs, record.attempts),
                tone: Tone::Success,
            }),
            _ => None,
        }
    }

    /// Outcome banners hold the simulation; the level-loaded one does not.
    pub fn pauses(&self) -> bool {
        self.tone != Tone::Info
    }

    fn colors(&self) -> (Color, Color) {
        match self.tone {
            Tone::Info    => (Color::Black, Color::Rgb { r: 200, g: 180, b: 50 }),
            Tone::Success => (Color::Black, Color::Rgb { r: 50, g: 220, b: 90 }),
            Tone::Failure => (Color::White, Color::Rgb { r: 200, g: 40, b: 40 }),
        }
    }
}

// ── Renderer ──

const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };

#[derive(Clone, Copy, PartialEq, Eq)]
enum Screen {
    Game(Phase),
    Summary,
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<Screen>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        self.sync_size(true)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Draw one frame of play, with an optional banner over the message bar.
    pub fn render(&mut self, view: &FrameView<'_>, banner: Option<&Banner>) -> io::Result<()> {
        self.begin(Screen::Game(view.phase))?;
        self.compose_hud(view);
        let map_rows = self.compose_map(view);
        self.compose_message(MAP_ROW + map_rows + 1, banner);
        let help_row = MAP_ROW + map_rows + 3;
        self.front.put_str(
            0, help_row,
            " ←→/AD: Run   Space/↑/W: Jump   Esc/Q: Quit",
            Color::DarkGrey, Color::Reset,
        );
        self.finish()
    }

    /// End-of-run statistics table.
    pub fn render_summary(&mut self, stats: &StatsTracker) -> io::Result<()> {
        self.begin(Screen::Summary)?;
        let lines = summary_lines(stats);
        for (row, line) in lines.iter().enumerate() {
            let fg = if row == 0 { Color::Rgb { r: 255, g: 220, b: 50 } } else { Color::White };
            self.front.put_str(4, 2 + row, line, fg, Color::Reset);
        }
        let footer = 2 + lines.len() + 1;
        self.front.put_str(4, footer, "Press any key to exit", Color::DarkGrey, Color::Reset);
        self.finish()
    }

    // ── Frame bookkeeping ──

    fn sync_size(&mut self, force: bool) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if force || tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }
        Ok(())
    }

    fn begin(&mut self, screen: Screen) -> io::Result<()> {
        self.sync_size(false)?;
        if self.last_screen != Some(screen) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_screen = Some(screen);
        }
        self.front.clear();
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colours; ResetColor would fall back to the terminal default
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell.cont {
                    if cell != prev { need_move = true; }
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, view: &FrameView<'_>) {
        let hud = hud_text(view);
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    /// Returns the number of terminal rows used by the map.
    fn compose_map(&mut self, view: &FrameView<'_>) -> usize {
        let ts = view.tile_size;
        let (cols, rows) = (view.columns, view.rows);

        // Background from the tile grid, then solids and hazards from their rects
        for (gy, line) in view.tiles.iter().enumerate() {
            for (gx, &tile) in line.iter().enumerate() {
                self.front.set_tile(gx * CELL_W, MAP_ROW + gy, tile_glyph(tile));
            }
        }
        let statics = view.walls.iter().map(|r| (r, Tile::Wall))
            .chain(view.fixed_hazards.iter().map(|r| (r, Tile::FixedHazard)))
            .chain(view.exit.iter().map(|r| (r, Tile::Exit)));
        for (rect, tile) in statics {
            if let Some((gx, gy)) = cell_of(rect, ts, cols, rows) {
                self.front.set_tile(gx * CELL_W, MAP_ROW + gy, tile_glyph(tile));
            }
        }

        for h in view.hazards {
            if let Some((gx, gy)) = cell_of(&h.rect, ts, cols, rows) {
                let c = match h.facing() {
                    Facing::Left => '👾',
                    Facing::Right => '👹',
                };
                self.front.set_tile(gx * CELL_W, MAP_ROW + gy, Glyph::Wide(c, Color::Reset));
            }
        }

        if let Some(p) = view.player {
            if let Some((gx, gy)) = cell_of(&p.rect, ts, cols, rows) {
                let c = match (view.phase, p.alive) {
                    (Phase::PlayerFailed, _) | (_, false) => '💀',
                    (Phase::LevelCleared, _) => '🎉',
                    _ if p.vx != 0 && p.facing == Facing::Left => '🏃',
                    _ => '🧍',
                };
                self.front.set_tile(gx * CELL_W, MAP_ROW + gy, Glyph::Wide(c, Color::Reset));
            }
        }

        rows
    }

    fn compose_message(&mut self, row: usize, banner: Option<&Banner>) {
        let Some(b) = banner else { return };
        let (fg, bg) = b.colors();
        let text = format!(" ◈ {}   {} ", b.title, b.detail);
        self.front.fill_row(row, bg);
        self.front.put_str(0, row, &text, fg, bg);
    }
}

fn hud_text(view: &FrameView<'_>) -> String {
    format!(
        " Level {:<3}  Attempt {:<3}  Time {:>6.1}s ",
        view.level_index, view.attempt, view.elapsed_secs,
    )
}

/// Plain-text summary: header, one line per cleared level, totals.
/// Shared by the summary screen and the post-exit stdout report.
pub fn summary_lines(stats: &StatsTracker) -> Vec<String> {
    let mut lines = vec![
        "RUN COMPLETE".to_string(),
        String::new(),
        format!("{:<8}{:>10}{:>10}", "Level", "Time", "Attempts"),
    ];
    for r in stats.records() {
        lines.push(format!("{:<8}{:>9.1}s{:>10}", r.level, r.elapsed_secs, r.attempts));
    }
    let agg = stats.aggregate();
    lines.push(String::new());
    lines.push(format!("Levels cleared: {}", agg.levels_cleared));
    lines.push(format!("Total time:     {:.1}s", agg.total_secs));
    lines.push(format!("Total attempts: {}", agg.total_attempts));
    lines.push(format!("Average time:   {:.1}s", agg.average_secs()));
    lines
}
