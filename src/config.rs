/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, warn};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub timing: TimingConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    pub first_level: usize,
}

/// Everything the simulation core reads. All values are pixels or
/// pixels per tick.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    pub tile_size: i32,
    pub gravity: i32,
    pub jump_impulse: i32,
    pub max_run_speed: i32,
    pub max_fall_speed: i32,
    pub hazard_speed: i32,
    pub hazard_hitbox_shrink: i32, // total, half taken off each side
    pub world_width: i32,
    pub world_height: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimingConfig {
    pub tick_rate_hz: u32,
    pub banner_ms: u64,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    world: TomlWorld,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_tile_size")]
    tile_size: i32,
    #[serde(default = "default_gravity")]
    gravity: i32,
    #[serde(default = "default_jump_impulse")]
    jump_impulse: i32,
    #[serde(default = "default_max_run_speed")]
    max_run_speed: i32,
    #[serde(default = "default_max_fall_speed")]
    max_fall_speed: i32,
    #[serde(default = "default_hazard_speed")]
    hazard_speed: i32,
    #[serde(default = "default_hitbox_shrink")]
    hazard_hitbox_shrink: i32,
}

#[derive(Deserialize, Debug)]
struct TomlWorld {
    #[serde(default = "default_world_width")]
    width: i32,
    #[serde(default = "default_world_height")]
    height: i32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_hz: u32,
    #[serde(default = "default_banner_ms")]
    banner_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_jump_buttons")]
    jump: Vec<String>,
    #[serde(default = "default_quit_buttons")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_first_level")]
    first_level: usize,
}

// ── Defaults ──

fn default_tile_size() -> i32 { 40 }
fn default_gravity() -> i32 { 1 }
fn default_jump_impulse() -> i32 { 15 }
fn default_max_run_speed() -> i32 { 5 }
fn default_max_fall_speed() -> i32 { 15 }
fn default_hazard_speed() -> i32 { 2 }
fn default_hitbox_shrink() -> i32 { 10 }   // 5 px per side
fn default_world_width() -> i32 { 800 }    // 20 tiles
fn default_world_height() -> i32 { 600 }   // 15 tiles
fn default_tick_rate() -> u32 { 60 }
fn default_banner_ms() -> u64 { 1500 }

fn default_jump_buttons() -> Vec<String> { vec!["A".into()] }
fn default_quit_buttons() -> Vec<String> { vec!["Select".into()] }
fn default_levels_dir() -> String { "levels".into() }
fn default_first_level() -> usize { 1 }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            tile_size: default_tile_size(),
            gravity: default_gravity(),
            jump_impulse: default_jump_impulse(),
            max_run_speed: default_max_run_speed(),
            max_fall_speed: default_max_fall_speed(),
            hazard_speed: default_hazard_speed(),
            hazard_hitbox_shrink: default_hitbox_shrink(),
        }
    }
}

impl Default for TomlWorld {
    fn default() -> Self {
        TomlWorld {
            width: default_world_width(),
            height: default_world_height(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_hz: default_tick_rate(),
            banner_ms: default_banner_ms(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_jump_buttons(),
            quit: default_quit_buttons(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            first_level: default_first_level(),
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        physics_from(&TomlPhysics::default(), &TomlWorld::default())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        let t = TomlTiming::default();
        TimingConfig { tick_rate_hz: t.tick_rate_hz, banner_ms: t.banner_ms }
    }
}

fn physics_from(p: &TomlPhysics, w: &TomlWorld) -> PhysicsConfig {
    PhysicsConfig {
        tile_size: p.tile_size,
        gravity: p.gravity,
        jump_impulse: p.jump_impulse,
        max_run_speed: p.max_run_speed,
        max_fall_speed: p.max_fall_speed,
        hazard_speed: p.hazard_speed,
        hazard_hitbox_shrink: p.hazard_hitbox_shrink,
        world_width: w.width,
        world_height: w.height,
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        // A zero rate would divide by zero in the timer
        let tick_rate_hz = toml_cfg.timing.tick_rate_hz.max(1);

        GameConfig {
            physics: physics_from(&toml_cfg.physics, &toml_cfg.world),
            timing: TimingConfig {
                tick_rate_hz,
                banner_ms: toml_cfg.timing.banner_ms,
            },
            gamepad: GamepadConfig {
                jump: toml_cfg.gamepad.jump,
                quit: toml_cfg.gamepad.quit,
            },
            levels_dir,
            first_level: toml_cfg.general.first_level,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/tilehop)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/tilehop");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => {
                        info!(path = %path.display(), "loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        warn!(path = %path.display(), "config.toml parse error, using defaults: {e}");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> GameConfig {
        let t: TomlConfig = toml::from_str(text).unwrap();
        GameConfig::from_toml(t, &[])
    }

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse("");
        assert_eq!(cfg.physics, PhysicsConfig::default());
        assert_eq!(cfg.physics.tile_size, 40);
        assert_eq!(cfg.physics.jump_impulse, 15);
        assert_eq!((cfg.physics.world_width, cfg.physics.world_height), (800, 600));
        assert_eq!(cfg.timing, TimingConfig::default());
        assert_eq!(cfg.timing.tick_rate_hz, 60);
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
        assert_eq!(cfg.first_level, 1);
        assert_eq!(cfg.gamepad.jump, vec!["A".to_string()]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = parse(
            "[physics]\ngravity = 2\n\n[world]\nheight = 480\n\n[general]\nfirst_level = 3\n",
        );
        assert_eq!(cfg.physics.gravity, 2);
        assert_eq!(cfg.physics.max_fall_speed, 15);
        assert_eq!(cfg.physics.world_height, 480);
        assert_eq!(cfg.physics.world_width, 800);
        assert_eq!(cfg.first_level, 3);
    }

    #[test]
    fn zero_tick_rate_is_clamped() {
        let cfg = parse("[timing]\ntick_rate_hz = 0\n");
        assert_eq!(cfg.timing.tick_rate_hz, 1);
    }

    #[test]
    fn malformed_toml_is_rejected_by_parser() {
        assert!(toml::from_str::<TomlConfig>("[physics\ngravity = ").is_err());
    }
}
