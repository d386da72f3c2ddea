use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use grove_engine::LoopConfig;
use serde::Deserialize;
use thiserror::Error;

pub(crate) const CONFIG_ENV_VAR: &str = "GROVE_CONFIG";
pub(crate) const CONFIG_FILE_NAME: &str = "grove.json";

/// Smallest map that still fits the hand-placed layout in `world_gen`.
pub(crate) const MIN_MAP_WIDTH: u32 = 24;
pub(crate) const MIN_MAP_HEIGHT: u32 = 16;

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path} at '{json_path}': {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub tile_size: u32,
    pub map_width: u32,
    pub map_height: u32,
    pub player_max_hp: i32,
    pub player_step: i32,
    pub zombie_max_hp: i32,
    pub zombie_step: i32,
    pub zombie_move_interval_ms: u64,
    pub zombie_chase_radius: i32,
    pub zombie_contact_damage: i32,
    pub zombie_attack_cooldown_ms: u64,
    pub seed: u64,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta_ms: u64,
    pub max_ticks_per_frame: u32,
    pub camera_zoom: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tile_size: 16,
            map_width: 40,
            map_height: 30,
            player_max_hp: 100,
            player_step: 8,
            zombie_max_hp: 30,
            zombie_step: 4,
            zombie_move_interval_ms: 150,
            zombie_chase_radius: 80,
            zombie_contact_damage: 5,
            zombie_attack_cooldown_ms: 1_000,
            seed: 0x5eed,
            window_width: 960,
            window_height: 640,
            target_tps: 60,
            max_frame_delta_ms: 250,
            max_ticks_per_frame: 5,
            camera_zoom: 1.0,
        }
    }
}

impl GameConfig {
    pub(crate) fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            window_width: self.window_width,
            window_height: self.window_height,
            target_tps: self.target_tps,
            max_frame_delta: Duration::from_millis(self.max_frame_delta_ms),
            max_ticks_per_frame: self.max_ticks_per_frame,
            ..LoopConfig::default()
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.tile_size == 0 {
            return Err("tile_size must be positive".to_string());
        }
        if self.map_width < MIN_MAP_WIDTH || self.map_height < MIN_MAP_HEIGHT {
            return Err(format!(
                "map must be at least {MIN_MAP_WIDTH}x{MIN_MAP_HEIGHT} tiles, got {}x{}",
                self.map_width, self.map_height
            ));
        }
        if self.player_step <= 0 || self.zombie_step <= 0 {
            return Err("step sizes must be positive".to_string());
        }
        if self.player_max_hp <= 0 || self.zombie_max_hp <= 0 {
            return Err("max hp must be positive".to_string());
        }
        if !self.camera_zoom.is_finite() {
            return Err("camera_zoom must be finite".to_string());
        }
        Ok(())
    }
}

/// `GROVE_CONFIG` wins when set, even if the file is missing; otherwise
/// `grove.json` under the project root is used when it exists.
pub(crate) fn resolve_config_path(env_value: Option<OsString>, root: &Path) -> Option<PathBuf> {
    if let Some(value) = env_value.filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(value));
    }
    let candidate = root.join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

pub(crate) fn load_config(path: &Path) -> Result<GameConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&raw, path)
}

fn parse_config(raw: &str, path: &Path) -> Result<GameConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let config: GameConfig = serde_path_to_error::deserialize(&mut deserializer).map_err(
        |error| {
            let json_path = error.path().to_string();
            ConfigError::Parse {
                path: path.to_path_buf(),
                json_path,
                source: error.into_inner(),
            }
        },
    )?;
    config.validate().map_err(|reason| ConfigError::Invalid {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(config)
}
