/// Level loading: text → validated `LevelModel`.
///
/// ## Text format
///
/// One character per grid cell, one line per row:
///   '#' = Wall               'P' = Player spawn (exactly one)
///   'E' = Exit (exactly one) '.' = Empty
///   'M' = Fixed hazard       'X' = Patrolling hazard spawn
///
/// The whole text is trimmed, then each row is trimmed. Rows may differ in
/// length. Any other character is an error; there is no comment syntax.
///
/// ## Sources
///
/// A `LevelSource` maps a 1-based level index to text:
///   1. `levels/` directory (`level_<n>.txt`)
///   2. Built-in embedded levels
///
/// A missing index is `ContentNotFound`, which ends the run normally.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::domain::entity::MobileHazard;
use crate::domain::geom::Rect;
use crate::domain::tile::Tile;

// ══════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level {index} not found")]
    ContentNotFound { index: usize },

    #[error("invalid character {ch:?} at row {}, column {}", .row + 1, .column + 1)]
    InvalidCharacter { ch: char, row: usize, column: usize },

    #[error("level must contain exactly one player start, found {count}")]
    PlayerCount { count: usize },

    #[error("level must contain exactly one exit, found {count}")]
    ExitCount { count: usize },

    #[error("could not read {}: {source}", .path.display())]
    Unreadable { path: PathBuf, source: io::Error },
}

impl LevelError {
    /// Running out of levels is the normal end of a run, not a failure.
    pub fn is_exhaustion(&self) -> bool {
        matches!(self, LevelError::ContentNotFound { .. })
    }
}

// ══════════════════════════════════════════════════════════════
// Level model
// ══════════════════════════════════════════════════════════════

/// A parsed, validated level. Never mutated after construction; each
/// attempt copies the hazard spawns out of it.
#[derive(Clone, Debug)]
pub struct LevelModel {
    pub walls: Vec<Rect>,
    pub exit: Rect,
    pub spawn: (i32, i32),
    pub fixed_hazards: Vec<Rect>,
    pub hazards: Vec<MobileHazard>,
    /// Tile grid, rows padded with `Empty` to `columns`.
    pub tiles: Vec<Vec<Tile>>,
    pub columns: usize,
    pub rows: usize,
    pub tile_size: i32,
}

/// Parse level text. All-or-nothing: any error discards the partial level.
pub fn parse_level(text: &str, tile_size: i32, hazard_speed: i32) -> Result<LevelModel, LevelError> {
    let mut walls = vec![];
    let mut fixed_hazards = vec![];
    let mut hazards = vec![];
    let mut exits = vec![];
    let mut spawns = vec![];
    let mut tiles: Vec<Vec<Tile>> = vec![];

    for (y, line) in text.trim().split('\n').enumerate() {
        let mut row = vec![];
        for (x, ch) in line.trim().chars().enumerate() {
            let tile = Tile::from_symbol(ch)
                .ok_or(LevelError::InvalidCharacter { ch, row: y, column: x })?;
            let rect = Rect::cell(x, y, tile_size);
            match tile {
                Tile::Wall => walls.push(rect),
                Tile::Exit => exits.push(rect),
                Tile::PlayerSpawn => spawns.push((rect.x, rect.y)),
                Tile::FixedHazard => fixed_hazards.push(rect),
                Tile::MobileHazardSpawn => hazards.push(MobileHazard::new(rect, hazard_speed)),
                Tile::Empty => {}
            }
            row.push(tile);
        }
        tiles.push(row);
    }

    // Spawn count is reported before exit count
    let &[spawn] = spawns.as_slice() else {
        return Err(LevelError::PlayerCount { count: spawns.len() });
    };
    let &[exit] = exits.as_slice() else {
        return Err(LevelError::ExitCount { count: exits.len() });
    };

    let columns = tiles.iter().map(|r| r.len()).max().unwrap_or(0);
    for row in &mut tiles {
        row.resize(columns, Tile::Empty);
    }

    Ok(LevelModel {
        walls,
        exit,
        spawn,
        fixed_hazards,
        hazards,
        rows: tiles.len(),
        tiles,
        columns,
        tile_size,
    })
}

// ══════════════════════════════════════════════════════════════
// Sources
// ══════════════════════════════════════════════════════════════

/// Where level text comes from. Indices start at 1.
pub trait LevelSource {
    fn load(&self, index: usize) -> Result<String, LevelError>;

    /// Short human-readable origin, for logs.
    fn describe(&self) -> String;
}

pub fn level_file_name(index: usize) -> String {
    format!("level_{index}.txt")
}

/// Individual `level_<n>.txt` files in one directory.
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectorySource { dir: dir.into() }
    }
}

impl LevelSource for DirectorySource {
    fn load(&self, index: usize) -> Result<String, LevelError> {
        let path = self.dir.join(level_file_name(index));
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                debug!(path = %path.display(), "read level file");
                Ok(text)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(LevelError::ContentNotFound { index })
            }
            Err(source) => Err(LevelError::Unreadable { path, source }),
        }
    }

    fn describe(&self) -> String {
        format!("{}/", self.dir.display())
    }
}

/// Levels held in memory; the embedded set ships with the binary.
pub struct BuiltinSource {
    levels: Vec<String>,
}

impl BuiltinSource {
    pub fn new(levels: Vec<String>) -> Self {
        BuiltinSource { levels }
    }

    pub fn embedded() -> Self {
        BuiltinSource::new(EMBEDDED.iter().map(|rows| rows.join("\n")).collect())
    }
}

impl LevelSource for BuiltinSource {
    fn load(&self, index: usize) -> Result<String, LevelError> {
        index.checked_sub(1)
            .and_then(|i| self.levels.get(i))
            .cloned()
            .ok_or(LevelError::ContentNotFound { index })
    }

    fn describe(&self) -> String {
        format!("built-in ({} levels)", self.levels.len())
    }
}

/// Use the configured levels directory if it holds the first level,
/// otherwise fall back to the embedded levels.
pub fn source_from_config(config: &GameConfig) -> Box<dyn LevelSource> {
    let first = config.levels_dir.join(level_file_name(config.first_level));
    if first.is_file() {
        info!(dir = %config.levels_dir.display(), "using level directory");
        Box::new(DirectorySource::new(config.levels_dir.clone()))
    } else {
        info!(missing = %first.display(), "no level files found, using built-in levels");
        Box::new(BuiltinSource::embedded())
    }
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

const EMBEDDED: &[&[&str]] = &[
    &[
        "####################",
        "#..................#",
        "#..................#",
        "#..................#",
        "#..................#",
        "#..................#",
        "#..................#",
        "#..................#",
        "#..................#",
        "#..................#",
        "#..................#",
        "#..................#",
        "#P.....#.......M..E#",
        "####################",
        "####################",
    ],
    &[
        "####################",
        "#..................#",
        "#..................#",
        "#..................#",
        "#..................#",
        "#..................#",
        "#..................#",
        "#..................#",
        "#..................#",
        "#..................#",
        "#.............E....#",
        "#...........#####..#",
        "#P.X...............#",
        "#######..###########",
        "#######..###########",
    ],
    &[
        "####################",
        "#..................#",
        "#..................#",
        "#..................#",
        "#..................#",
        "#..................#",
        "#.................E#",
        "#...............####",
        "#..................#",
        "#...........###....#",
        "#..................#",
        "#.......###........#",
        "#P..#...X....#.MM..#",
        "####################",
        "####################",
    ],
];
