/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// ```toml
/// [session]
/// duration_secs = 2700
/// hint_penalty_secs = 60
///
/// [movement]
/// move_speed = 2.0
/// turn_speed = 2.2
/// collision_radius = 0.3
///
/// [display]
/// frame_ms = 16
/// fov_degrees = 66
/// show_minimap = true
///
/// [gamepad]
/// confirm = ["A", "Start"]
///
/// [logging]
/// file = "gatemaze.log"
/// filter = "info"
/// ```

use serde::Deserialize;
use std::ops::RangeBounds;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub session: SessionConfig,
    pub movement: MovementConfig,
    pub display: DisplayConfig,
    pub gamepad: GamepadConfig,
    pub logging: LoggingConfig,
    /// Problems found while loading. Reported once logging is up.
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub duration: Duration,
    pub hint_penalty: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MovementConfig {
    pub move_speed: f32,       // grid units per second
    pub turn_speed: f32,       // radians per second
    pub collision_radius: f32, // half-size of the player square
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisplayConfig {
    pub frame: Duration,
    pub fov: f32, // radians
    pub show_minimap: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub hint: Vec<String>,
    pub turn_left: Vec<String>,
    pub turn_right: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub file: PathBuf,
    pub filter: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    session: TomlSession,
    #[serde(default)]
    movement: TomlMovement,
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    logging: TomlLogging,
}

#[derive(Deserialize, Debug)]
struct TomlSession {
    #[serde(default = "default_duration")]
    duration_secs: u64,
    #[serde(default = "default_hint_penalty")]
    hint_penalty_secs: u64,
}

#[derive(Deserialize, Debug)]
struct TomlMovement {
    #[serde(default = "default_move_speed")]
    move_speed: f32,
    #[serde(default = "default_turn_speed")]
    turn_speed: f32,
    #[serde(default = "default_collision_radius")]
    collision_radius: f32,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_fov")]
    fov_degrees: f32,
    #[serde(default = "default_true")]
    show_minimap: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_hint")]
    hint: Vec<String>,
    #[serde(default = "default_turn_left")]
    turn_left: Vec<String>,
    #[serde(default = "default_turn_right")]
    turn_right: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlLogging {
    #[serde(default = "default_log_file")]
    file: String,
    #[serde(default = "default_log_filter")]
    filter: String,
}

// ── Defaults ──

fn default_duration() -> u64 { 45 * 60 }
fn default_hint_penalty() -> u64 { 60 }

fn default_move_speed() -> f32 { 2.0 }
fn default_turn_speed() -> f32 { 2.2 }
fn default_collision_radius() -> f32 { 0.3 }

fn default_frame_ms() -> u64 { 16 }
fn default_fov() -> f32 { 66.0 }
fn default_true() -> bool { true }

fn default_confirm() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into(), "Select".into()] }
fn default_hint() -> Vec<String> { vec!["Y".into()] }
fn default_turn_left() -> Vec<String> { vec!["L1".into(), "L2".into()] }
fn default_turn_right() -> Vec<String> { vec!["R1".into(), "R2".into()] }

fn default_log_file() -> String { "gatemaze.log".into() }
fn default_log_filter() -> String { "info".into() }

impl Default for TomlSession {
    fn default() -> Self {
        TomlSession {
            duration_secs: default_duration(),
            hint_penalty_secs: default_hint_penalty(),
        }
    }
}

impl Default for TomlMovement {
    fn default() -> Self {
        TomlMovement {
            move_speed: default_move_speed(),
            turn_speed: default_turn_speed(),
            collision_radius: default_collision_radius(),
        }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay {
            frame_ms: default_frame_ms(),
            fov_degrees: default_fov(),
            show_minimap: default_true(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            hint: default_hint(),
            turn_left: default_turn_left(),
            turn_right: default_turn_right(),
        }
    }
}

impl Default for TomlLogging {
    fn default() -> Self {
        TomlLogging {
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), vec![])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        Self::load_from(&candidate_dirs())
    }

    /// Load from the first `config.toml` found in `search_dirs`.
    pub fn load_from(search_dirs: &[PathBuf]) -> Self {
        let mut warnings = vec![];
        let toml_cfg = load_toml(search_dirs, &mut warnings);
        GameConfig::from_toml(toml_cfg, warnings)
    }

    fn from_toml(cfg: TomlConfig, mut warnings: Vec<String>) -> Self {
        let movement = MovementConfig {
            move_speed: checked(
                "movement.move_speed",
                cfg.movement.move_speed,
                0.1..=10.0,
                default_move_speed(),
                &mut warnings,
            ),
            turn_speed: checked(
                "movement.turn_speed",
                cfg.movement.turn_speed,
                0.1..=10.0,
                default_turn_speed(),
                &mut warnings,
            ),
            // A radius of half a cell or more could never fit a corridor.
            collision_radius: checked(
                "movement.collision_radius",
                cfg.movement.collision_radius,
                0.0..0.5,
                default_collision_radius(),
                &mut warnings,
            ),
        };

        let requested_fov = cfg.display.fov_degrees;
        let fov_degrees = if requested_fov.is_nan() {
            warnings.push(format!("display.fov_degrees is not a number, using {}", default_fov()));
            default_fov()
        } else {
            let clamped = requested_fov.clamp(30.0, 120.0);
            if clamped != requested_fov {
                warnings.push(format!("display.fov_degrees clamped to {clamped}"));
            }
            clamped
        };

        GameConfig {
            session: SessionConfig {
                duration: Duration::from_secs(cfg.session.duration_secs),
                hint_penalty: Duration::from_secs(cfg.session.hint_penalty_secs),
            },
            movement,
            display: DisplayConfig {
                frame: Duration::from_millis(cfg.display.frame_ms.max(1)),
                fov: fov_degrees.to_radians(),
                show_minimap: cfg.display.show_minimap,
            },
            gamepad: GamepadConfig {
                confirm: cfg.gamepad.confirm,
                cancel: cfg.gamepad.cancel,
                hint: cfg.gamepad.hint,
                turn_left: cfg.gamepad.turn_left,
                turn_right: cfg.gamepad.turn_right,
            },
            logging: LoggingConfig {
                file: PathBuf::from(cfg.logging.file),
                filter: cfg.logging.filter,
            },
            warnings,
        }
    }
}

/// `value` when it lies in `range`, otherwise `default` plus a warning.
/// NaN is never in range.
fn checked(
    name: &str,
    value: f32,
    range: impl RangeBounds<f32>,
    default: f32,
    warnings: &mut Vec<String>,
) -> f32 {
    if range.contains(&value) {
        value
    } else {
        warnings.push(format!("{name} {value} out of range, using {default}"));
        default
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
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

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return parse_toml(&text, &path, warnings),
                Err(e) => {
                    warnings.push(format!("could not read {}: {e}", path.display()));
                }
            }
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str, path: &Path, warnings: &mut Vec<String>) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warnings.push(format!("{} parse error, using defaults: {e}", path.display()));
            TomlConfig::default()
        }
    }
}
