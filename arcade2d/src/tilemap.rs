//! Orthogonal Tiled (JSON) maps: tile layers, object layers and tileset
//! properties, plus the solid-tile grid used by physics.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::math::{Rect, Vec2};

/// Tiled stores flip/rotation flags in the top bits of every gid.
const GID_MASK: u32 = 0x1FFF_FFFF;

pub type Properties = HashMap<String, Value>;

#[derive(Debug, Error)]
pub enum TilemapError {
    #[error("failed to read tilemap {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid tilemap json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tile layer `{layer}` uses an unsupported encoding (export as CSV/array)")]
    UnsupportedEncoding { layer: String },
    #[error("tile layer `{layer}` has {actual} tiles, expected {expected}")]
    TileCountMismatch {
        layer: String,
        expected: usize,
        actual: usize,
    },
    #[error("external tileset `{source_path}` is not supported, embed it in the map")]
    ExternalTileset { source_path: String },
    #[error("map has no tile layer named `{0}`")]
    MissingTileLayer(String),
    #[error("map has no object layer named `{0}`")]
    MissingObjectLayer(String),
}

#[derive(Deserialize)]
struct RawMap {
    width: u32,
    height: u32,
    #[serde(rename = "tilewidth")]
    tile_width: u32,
    #[serde(rename = "tileheight")]
    tile_height: u32,
    #[serde(default)]
    layers: Vec<RawLayer>,
    #[serde(default)]
    tilesets: Vec<RawTileset>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawLayer {
    TileLayer {
        name: String,
        width: u32,
        height: u32,
        #[serde(default)]
        data: Option<Value>,
        #[serde(default)]
        encoding: Option<String>,
        #[serde(default = "default_visible")]
        visible: bool,
    },
    ObjectGroup {
        name: String,
        #[serde(default)]
        objects: Vec<RawObject>,
    },
    #[serde(other)]
    Other,
}

fn default_visible() -> bool {
    true
}

#[derive(Deserialize)]
struct RawObject {
    #[serde(default)]
    id: u32,
    #[serde(default)]
    name: String,
    // Tiled 1.9 renamed `type` to `class`.
    #[serde(default, rename = "type", alias = "class")]
    kind: String,
    x: f32,
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(default)]
    properties: Vec<RawProperty>,
}

#[derive(Deserialize)]
struct RawProperty {
    name: String,
    value: Value,
}

#[derive(Deserialize)]
struct RawTileset {
    #[serde(rename = "firstgid")]
    first_gid: u32,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    tiles: Vec<RawTile>,
}

#[derive(Deserialize)]
struct RawTile {
    id: u32,
    #[serde(default)]
    properties: Vec<RawProperty>,
}

fn collect_properties(raw: Vec<RawProperty>) -> Properties {
    raw.into_iter().map(|p| (p.name, p.value)).collect()
}

/// A tileset embedded in the map.
#[derive(Clone, Debug)]
pub struct Tileset {
    pub name: String,
    pub first_gid: u32,
    pub image: Option<String>,
}

/// A named object placed in an object layer (spawn points, zones, ...).
#[derive(Clone, Debug, PartialEq)]
pub struct MapObject {
    pub id: u32,
    pub name: String,
    /// The object's `type` (or `class`) as authored in the editor.
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub properties: Properties,
}

impl MapObject {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Clone, Debug)]
pub struct ObjectLayer {
    pub name: String,
    pub objects: Vec<MapObject>,
}

impl ObjectLayer {
    pub fn find(&self, name: &str) -> Option<&MapObject> {
        self.objects.iter().find(|o| o.name == name)
    }
}

/// A grid of tile gids (0 = empty) with per-tile collision flags.
#[derive(Clone, Debug)]
pub struct TileLayer {
    pub name: String,
    pub visible: bool,
    width: u32,
    height: u32,
    tile_size: Vec2,
    tiles: Vec<u32>,
    colliding: Vec<bool>,
    tile_properties: HashMap<u32, Properties>,
}

impl TileLayer {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> Vec2 {
        self.tile_size
    }

    fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }

    /// Gid at `(x, y)`, or `None` for empty cells and out-of-range coordinates.
    pub fn tile_at(&self, x: u32, y: u32) -> Option<u32> {
        self.index_of(x, y)
            .map(|i| self.tiles[i])
            .filter(|&gid| gid != 0)
    }

    pub fn properties_of(&self, gid: u32) -> Option<&Properties> {
        self.tile_properties.get(&gid)
    }

    /// Mark every tile whose tileset property `name` equals `value` as colliding.
    /// Returns the number of colliding cells.
    pub fn set_collision_by_property(&mut self, name: &str, value: bool) -> usize {
        let mut count = 0;
        for (i, &gid) in self.tiles.iter().enumerate() {
            let matches = gid != 0
                && self
                    .tile_properties
                    .get(&gid)
                    .and_then(|props| props.get(name))
                    .and_then(Value::as_bool)
                    == Some(value);
            self.colliding[i] = matches;
            count += usize::from(matches);
        }
        count
    }

    pub fn is_colliding(&self, x: u32, y: u32) -> bool {
        self.index_of(x, y).is_some_and(|i| self.colliding[i])
    }

    /// Iterate over non-empty cells as `(x, y, gid)`.
    pub fn tiles(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, &gid)| gid != 0)
            .map(|(i, &gid)| (i as u32 % self.width, i as u32 / self.width, gid))
    }

    /// Snapshot of the colliding cells for the physics world.
    pub fn collision_layer(&self) -> CollisionLayer {
        CollisionLayer {
            width: self.width,
            height: self.height,
            tile_size: self.tile_size,
            solid: self.colliding.clone(),
        }
    }
}

/// Solid-tile grid that bodies can collide with and probes can be cast into.
#[derive(Clone, Debug)]
pub struct CollisionLayer {
    width: u32,
    height: u32,
    tile_size: Vec2,
    solid: Vec<bool>,
}

impl CollisionLayer {
    /// Build a grid directly from solid flags (row-major).
    pub fn from_solid(width: u32, height: u32, tile_size: Vec2, solid: Vec<bool>) -> Self {
        let mut solid = solid;
        solid.resize((width * height) as usize, false);
        Self {
            width,
            height,
            tile_size,
            solid,
        }
    }

    pub fn tile_size(&self) -> Vec2 {
        self.tile_size
    }

    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return false;
        }
        self.solid[(y as u32 * self.width + x as u32) as usize]
    }

    pub fn tile_rect(&self, x: i32, y: i32) -> Rect {
        Rect::new(
            x as f32 * self.tile_size.x,
            y as f32 * self.tile_size.y,
            self.tile_size.x,
            self.tile_size.y,
        )
    }

    /// Tile index range `(x0, y0, x1, y1)` (inclusive) covering `rect`.
    fn tile_range(&self, rect: &Rect) -> (i32, i32, i32, i32) {
        (
            (rect.left() / self.tile_size.x).floor() as i32,
            (rect.top() / self.tile_size.y).floor() as i32,
            (rect.right() / self.tile_size.x).ceil() as i32 - 1,
            (rect.bottom() / self.tile_size.y).ceil() as i32 - 1,
        )
    }

    /// Rectangles of solid tiles overlapping `rect`.
    pub fn solid_tiles_overlapping(&self, rect: &Rect) -> Vec<Rect> {
        let (x0, y0, x1, y1) = self.tile_range(rect);
        let mut hits = Vec::new();
        for ty in y0..=y1 {
            for tx in x0..=x1 {
                if self.is_solid(tx, ty) {
                    let tile = self.tile_rect(tx, ty);
                    if tile.intersects(rect) {
                        hits.push(tile);
                    }
                }
            }
        }
        hits
    }

    /// Solid tiles crossed by the segment `a -> b`, as tile coordinates.
    pub fn tiles_within_line(&self, a: Vec2, b: Vec2) -> Vec<(i32, i32)> {
        let bounds = Rect::new(
            a.x.min(b.x),
            a.y.min(b.y),
            (a.x - b.x).abs(),
            (a.y - b.y).abs(),
        );
        let (x0, y0, x1, y1) = self.tile_range(&bounds);
        let mut hits = Vec::new();
        for ty in y0..=y1.max(y0) {
            for tx in x0..=x1.max(x0) {
                if self.is_solid(tx, ty) && self.tile_rect(tx, ty).intersects_segment(a, b) {
                    hits.push((tx, ty));
                }
            }
        }
        hits
    }
}

/// A loaded orthogonal Tiled map.
#[derive(Clone, Debug)]
pub struct TiledMap {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tilesets: Vec<Tileset>,
    tile_layers: Vec<TileLayer>,
    object_layers: Vec<ObjectLayer>,
}

impl TiledMap {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TilemapError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| TilemapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(json: &str) -> Result<Self, TilemapError> {
        let raw: RawMap = serde_json::from_str(json)?;
        let tile_size = Vec2::new(raw.tile_width as f32, raw.tile_height as f32);

        let mut tilesets = Vec::with_capacity(raw.tilesets.len());
        let mut gid_properties: HashMap<u32, Properties> = HashMap::new();
        for tileset in raw.tilesets {
            if let Some(source_path) = tileset.source {
                return Err(TilemapError::ExternalTileset { source_path });
            }
            for tile in tileset.tiles {
                gid_properties.insert(
                    tileset.first_gid + tile.id,
                    collect_properties(tile.properties),
                );
            }
            tilesets.push(Tileset {
                name: tileset.name,
                first_gid: tileset.first_gid,
                image: tileset.image,
            });
        }

        let mut tile_layers = Vec::new();
        let mut object_layers = Vec::new();
        for layer in raw.layers {
            match layer {
                RawLayer::TileLayer {
                    name,
                    width,
                    height,
                    data,
                    encoding,
                    visible,
                } => {
                    if encoding.as_deref().is_some_and(|e| e != "csv") {
                        return Err(TilemapError::UnsupportedEncoding { layer: name });
                    }
                    let tiles: Vec<u32> = match data {
                        Some(value @ Value::Array(_)) => serde_json::from_value(value)?,
                        Some(_) => return Err(TilemapError::UnsupportedEncoding { layer: name }),
                        None => Vec::new(),
                    };
                    let expected = (width * height) as usize;
                    if tiles.len() != expected {
                        return Err(TilemapError::TileCountMismatch {
                            layer: name,
                            expected,
                            actual: tiles.len(),
                        });
                    }
                    let tiles: Vec<u32> = tiles.into_iter().map(|gid| gid & GID_MASK).collect();
                    let tile_properties = tiles
                        .iter()
                        .filter_map(|gid| gid_properties.get(gid).map(|p| (*gid, p.clone())))
                        .collect();
                    tile_layers.push(TileLayer {
                        name,
                        visible,
                        width,
                        height,
                        tile_size,
                        colliding: vec![false; tiles.len()],
                        tiles,
                        tile_properties,
                    });
                }
                RawLayer::ObjectGroup { name, objects } => {
                    let objects = objects
                        .into_iter()
                        .map(|o| MapObject {
                            id: o.id,
                            name: o.name,
                            kind: o.kind,
                            x: o.x,
                            y: o.y,
                            width: o.width,
                            height: o.height,
                            properties: collect_properties(o.properties),
                        })
                        .collect();
                    object_layers.push(ObjectLayer { name, objects });
                }
                RawLayer::Other => {}
            }
        }

        Ok(Self {
            width: raw.width,
            height: raw.height,
            tile_width: raw.tile_width,
            tile_height: raw.tile_height,
            tilesets,
            tile_layers,
            object_layers,
        })
    }

    pub fn width_in_pixels(&self) -> f32 {
        (self.width * self.tile_width) as f32
    }

    pub fn height_in_pixels(&self) -> f32 {
        (self.height * self.tile_height) as f32
    }

    pub fn tileset(&self, name: &str) -> Option<&Tileset> {
        self.tilesets.iter().find(|t| t.name == name)
    }

    pub fn tile_layer(&self, name: &str) -> Option<&TileLayer> {
        self.tile_layers.iter().find(|l| l.name == name)
    }

    /// Clone a tile layer out of the map so the caller can configure it.
    pub fn create_layer(&self, name: &str) -> Result<TileLayer, TilemapError> {
        self.tile_layer(name)
            .cloned()
            .ok_or_else(|| TilemapError::MissingTileLayer(name.to_string()))
    }

    pub fn object_layer(&self, name: &str) -> Result<&ObjectLayer, TilemapError> {
        self.object_layers
            .iter()
            .find(|l| l.name == name)
            .ok_or_else(|| TilemapError::MissingObjectLayer(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = r#"{
        "width": 4, "height": 3, "tilewidth": 16, "tileheight": 16,
        "layers": [
            { "type": "tilelayer", "name": "platforms_colliders", "width": 4, "height": 3,
              "data": [0,0,0,0, 0,0,0,0, 1,1,2,2147483649] },
            { "type": "objectgroup", "name": "player_spawns", "objects": [
                { "id": 1, "name": "sceneEntrance", "type": "", "x": 8, "y": 20 },
                { "id": 2, "name": "sceneExit", "class": "exit", "x": 60, "y": 30 }
            ]},
            { "type": "imagelayer", "name": "sky" }
        ],
        "tilesets": [
            { "firstgid": 1, "name": "crystal_tileset_lev1", "image": "tiles.png",
              "tiles": [ { "id": 0, "properties": [ { "name": "collides", "type": "bool", "value": true } ] } ] }
        ]
    }"#;

    #[test]
    fn parses_layers_and_objects() {
        let map = TiledMap::from_json_str(MAP).expect("map");
        assert_eq!(map.width_in_pixels(), 64.0);
        assert_eq!(map.height_in_pixels(), 48.0);
        assert!(map.tileset("crystal_tileset_lev1").is_some());

        let spawns = map.object_layer("player_spawns").expect("spawns");
        assert_eq!(spawns.find("sceneEntrance").map(|o| o.x), Some(8.0));
        assert_eq!(spawns.find("sceneExit").map(|o| o.kind.as_str()), Some("exit"));
        assert!(map.object_layer("enemy_spawns").is_err());
    }

    #[test]
    fn collision_by_property_only_marks_flagged_tiles() {
        let map = TiledMap::from_json_str(MAP).expect("map");
        let mut layer = map.create_layer("platforms_colliders").expect("layer");

        // gid 1 collides (twice, once with a flip flag), gid 2 has no property
        assert_eq!(layer.set_collision_by_property("collides", true), 3);
        assert!(layer.is_colliding(0, 2));
        assert!(!layer.is_colliding(2, 2));
        assert!(layer.is_colliding(3, 2));
    }

    #[test]
    fn wrong_tile_count_is_rejected() {
        let json = r#"{ "width": 2, "height": 1, "tilewidth": 16, "tileheight": 16,
            "layers": [ { "type": "tilelayer", "name": "l", "width": 2, "height": 1, "data": [1] } ] }"#;
        assert!(matches!(
            TiledMap::from_json_str(json),
            Err(TilemapError::TileCountMismatch { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn line_probe_finds_floor_ahead() {
        // floor on row 2, columns 0..=2, gap at column 3
        let solid = vec![
            false, false, false, false, //
            false, false, false, false, //
            true, true, true, false,
        ];
        let grid = CollisionLayer::from_solid(4, 3, Vec2::splat(16.0), solid);

        let over_floor = grid.tiles_within_line(Vec2::new(10.0, 20.0), Vec2::new(30.0, 40.0));
        assert!(!over_floor.is_empty());

        let over_gap = grid.tiles_within_line(Vec2::new(50.0, 20.0), Vec2::new(62.0, 44.0));
        assert!(over_gap.is_empty());
    }
}
