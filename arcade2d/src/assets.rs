use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::math::Color;
use crate::tilemap::{TiledMap, TilemapError};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read asset manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid asset manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to load tilemap `{key}`: {source}")]
    Tilemap {
        key: String,
        #[source]
        source: TilemapError,
    },
    #[error("no asset loaded under key `{0}`")]
    Missing(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TilemapEntry {
    pub key: String,
    /// Path relative to the manifest file.
    pub path: String,
}

/// Frame geometry of a spritesheet. Frames are drawn as placeholder boxes
/// in `color` until real textures are available.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SpritesheetEntry {
    pub key: String,
    pub frame_width: u32,
    pub frame_height: u32,
    #[serde(default)]
    pub spacing: u32,
    #[serde(default = "default_color")]
    pub color: u32,
}

fn default_color() -> u32 {
    0xff00ff
}

impl SpritesheetEntry {
    pub fn color(&self) -> Color {
        Color::from_hex(self.color)
    }
}

/// Declarative list of everything a scene needs before it can be built.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct AssetManifest {
    #[serde(default)]
    pub tilemaps: Vec<TilemapEntry>,
    #[serde(default)]
    pub spritesheets: Vec<SpritesheetEntry>,
}

impl AssetManifest {
    pub fn from_json_str(json: &str, path: &Path) -> Result<Self, AssetError> {
        serde_json::from_str(json).map_err(|source| AssetError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Caches loaded assets by key.
#[derive(Debug, Default)]
pub struct AssetManager {
    tilemaps: HashMap<String, TiledMap>,
    spritesheets: HashMap<String, SpritesheetEntry>,
}

impl AssetManager {
    /// Create a new asset manager with no cached assets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a manifest and load everything it lists. Paths inside the manifest
    /// are resolved against the manifest's directory.
    pub fn load_manifest(&mut self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = AssetManifest::from_json_str(&text, path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        for entry in &manifest.tilemaps {
            self.load_tilemap(&entry.key, base.join(&entry.path))?;
        }
        for sheet in manifest.spritesheets {
            self.spritesheets.insert(sheet.key.clone(), sheet);
        }
        log::info!(
            "loaded {} tilemap(s) and {} spritesheet(s) from {}",
            self.tilemaps.len(),
            self.spritesheets.len(),
            path.display()
        );
        Ok(())
    }

    /// Load a tilemap, caching it by key. A key that is already loaded is
    /// not read again.
    pub fn load_tilemap(&mut self, key: &str, path: impl AsRef<Path>) -> Result<&TiledMap, AssetError> {
        if !self.tilemaps.contains_key(key) {
            let map = TiledMap::load(path).map_err(|source| AssetError::Tilemap {
                key: key.to_string(),
                source,
            })?;
            self.tilemaps.insert(key.to_string(), map);
        }
        self.tilemap(key)
    }

    pub fn insert_tilemap(&mut self, key: impl Into<String>, map: TiledMap) {
        self.tilemaps.insert(key.into(), map);
    }

    pub fn insert_spritesheet(&mut self, sheet: SpritesheetEntry) {
        self.spritesheets.insert(sheet.key.clone(), sheet);
    }

    pub fn tilemap(&self, key: &str) -> Result<&TiledMap, AssetError> {
        self.tilemaps
            .get(key)
            .ok_or_else(|| AssetError::Missing(key.to_string()))
    }

    pub fn spritesheet(&self, key: &str) -> Option<&SpritesheetEntry> {
        self.spritesheets.get(key)
    }

    pub fn clear(&mut self) {
        self.tilemaps.clear();
        self.spritesheets.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const MAP: &str = r#"{ "width": 2, "height": 1, "tilewidth": 16, "tileheight": 16,
        "layers": [ { "type": "tilelayer", "name": "ground", "width": 2, "height": 1, "data": [0, 1] } ] }"#;

    #[test]
    fn manifest_paths_resolve_relative_to_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("maps")).expect("mkdir");
        fs::write(dir.path().join("maps/level.json"), MAP).expect("write map");
        let manifest_path = dir.path().join("manifest.json");
        let mut file = fs::File::create(&manifest_path).expect("create manifest");
        write!(
            file,
            r#"{{ "tilemaps": [ {{ "key": "map", "path": "maps/level.json" }} ],
                 "spritesheets": [ {{ "key": "player", "frame_width": 32, "frame_height": 64, "spacing": 32 }} ] }}"#
        )
        .expect("write manifest");

        let mut assets = AssetManager::new();
        assets.load_manifest(&manifest_path).expect("manifest loads");

        assert_eq!(assets.tilemap("map").map(|m| m.width).ok(), Some(2));
        let sheet = assets.spritesheet("player").expect("sheet");
        assert_eq!((sheet.frame_width, sheet.spacing), (32, 32));
        assert_eq!(sheet.color(), Color::from_hex(0xff00ff));
    }

    #[test]
    fn broken_tilemap_names_its_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest_path = dir.path().join("manifest.json");
        fs::write(
            &manifest_path,
            r#"{ "tilemaps": [ { "key": "map", "path": "missing.json" } ] }"#,
        )
        .expect("write manifest");

        let err = AssetManager::new()
            .load_manifest(&manifest_path)
            .expect_err("missing map must fail");
        assert!(matches!(err, AssetError::Tilemap { ref key, .. } if key == "map"));
    }

    #[test]
    fn unknown_key_is_missing() {
        let assets = AssetManager::new();
        assert!(matches!(assets.tilemap("nope"), Err(AssetError::Missing(_))));
    }
}
