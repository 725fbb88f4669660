//! Gameplay tunables, loaded from a JSON file with every field defaulted.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use arcade2d::{Color, Vec2};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "CRYSTAL_WORLD_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "crystal_world.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Crystal World".into(),
            width: 960,
            height: 540,
            vsync: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub gravity: f32,
    pub speed: f32,
    pub jump_force: f32,
    pub extra_jumps: u32,
    pub max_hearts: i32,
    pub body_size: [f32; 2],
    /// Hit box offset inside the sprite frame while facing right.
    pub offset_right: [f32; 2],
    pub offset_left: [f32; 2],
    pub frame_size: [f32; 2],
    pub invincibility_ms: u64,
    /// Horizontal push and upward lift applied when hit.
    pub knockback: [f32; 2],
    pub blink_interval_ms: u64,
    pub hit_tint: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            gravity: 500.0,
            speed: 150.0,
            jump_force: 300.0,
            extra_jumps: 2,
            max_hearts: 3,
            body_size: [20.0, 36.0],
            offset_right: [10.0, 25.0],
            offset_left: [2.0, 25.0],
            frame_size: [32.0, 64.0],
            invincibility_ms: 500,
            knockback: [200.0, 250.0],
            blink_interval_ms: 100,
            hit_tint: 0xff4040,
        }
    }
}

impl PlayerConfig {
    pub fn body_size(&self) -> Vec2 {
        Vec2::from(self.body_size)
    }

    pub fn offset_right(&self) -> Vec2 {
        Vec2::from(self.offset_right)
    }

    pub fn offset_left(&self) -> Vec2 {
        Vec2::from(self.offset_left)
    }

    pub fn frame_size(&self) -> Vec2 {
        Vec2::from(self.frame_size)
    }

    pub fn invincibility(&self) -> Duration {
        Duration::from_millis(self.invincibility_ms)
    }

    pub fn blink_interval(&self) -> Duration {
        Duration::from_millis(self.blink_interval_ms)
    }

    pub fn hit_tint(&self) -> Color {
        Color::from_hex(self.hit_tint)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParallaxLayerConfig {
    /// Fraction of the camera scroll applied to this layer.
    pub factor: f32,
    pub color: u32,
    /// Vertical band in screen pixels.
    pub top: f32,
    pub height: f32,
    /// Width of one repeated block and the gap after it, in screen pixels.
    pub block_width: f32,
    pub gap: f32,
}

impl Default for ParallaxLayerConfig {
    fn default() -> Self {
        Self {
            factor: 0.2,
            color: 0x2b2d5c,
            top: 200.0,
            height: 340.0,
            block_width: 180.0,
            gap: 120.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    pub death_fade_ms: u64,
    pub restart_delay_ms: u64,
    pub shake_ms: u64,
    pub shake_intensity: f32,
    pub sky_color: u32,
    pub parallax: Vec<ParallaxLayerConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            death_fade_ms: 400,
            restart_delay_ms: 1000,
            shake_ms: 250,
            shake_intensity: 0.01,
            sky_color: 0x14142b,
            parallax: vec![
                ParallaxLayerConfig::default(),
                ParallaxLayerConfig {
                    factor: 0.5,
                    color: 0x3d3f7a,
                    top: 320.0,
                    height: 220.0,
                    block_width: 120.0,
                    gap: 80.0,
                },
            ],
        }
    }
}

impl SceneConfig {
    pub fn death_fade(&self) -> Duration {
        Duration::from_millis(self.death_fade_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    pub fn shake(&self) -> Duration {
        Duration::from_millis(self.shake_ms)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub zoom_factor: f32,
    /// Used only when the map does not report its own size.
    pub map_width: f32,
    pub map_height: f32,
    /// How far below the map the world bounds extend, so the player can
    /// fall out of view before hitting the bottom edge.
    pub world_bounds_extra_depth: f32,
    /// Defaults to the `assets` directory shipped next to this crate.
    pub assets_dir: PathBuf,
    pub manifest: String,
    pub map_key: String,
    pub player: PlayerConfig,
    pub scene: SceneConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            zoom_factor: 2.0,
            map_width: 1600.0,
            map_height: 640.0,
            world_bounds_extra_depth: 200.0,
            assets_dir: Path::new(env!("CARGO_MANIFEST_DIR")).join("assets"),
            manifest: "manifest.json".into(),
            map_key: "crystal_world_map".into(),
            player: PlayerConfig::default(),
            scene: SceneConfig::default(),
        }
    }
}

impl GameConfig {
    /// Load from `$CRYSTAL_WORLD_CONFIG`, or `crystal_world.json` in the
    /// working directory. A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => {
                let config = Self::from_json_str(&text, path)?;
                log::info!("loaded config from {}", path.display());
                Ok(config)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_json_str(json: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.assets_dir.join(&self.manifest)
    }

    pub fn screen_size(&self) -> Vec2 {
        Vec2::new(self.window.width as f32, self.window.height as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = GameConfig::load_from(&dir.path().join("absent.json")).expect("defaults");
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.player.extra_jumps, 2);
        assert_eq!(config.scene.restart_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("crystal_world.json");
        fs::write(&path, r#"{ "zoom_factor": 3, "player": { "speed": 200 } }"#).expect("write");

        let config = GameConfig::load_from(&path).expect("config");
        assert_eq!(config.zoom_factor, 3.0);
        assert_eq!(config.player.speed, 200.0);
        assert_eq!(config.player.jump_force, 300.0);
        assert_eq!(config.window.width, 960);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("crystal_world.json");
        fs::write(&path, "{ zoom_factor: ").expect("write");
        assert!(matches!(
            GameConfig::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
