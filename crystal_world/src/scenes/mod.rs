mod play;
mod preload;

pub use play::{PlayScene, ScenePhase};
pub use preload::PreloadScene;

/// Tiled layer and object names the scenes rely on.
pub mod layers {
    pub const PLATFORMS_COLLIDERS: &str = "platforms_colliders";
    pub const ENVIRONMENT: &str = "environment";
    pub const PLATFORMS: &str = "platforms";
    pub const PLAYER_SPAWNS: &str = "player_spawns";
    pub const ENEMY_SPAWNS: &str = "enemy_spawns";
    /// Decoration only; nothing collides with it.
    pub const BACKGROUND_SPIKES: &str = "background-spikes";
    pub const SCENE_ENTRANCE: &str = "sceneEntrance";
    pub const SCENE_EXIT: &str = "sceneExit";
    /// Tileset property marking solid tiles.
    pub const COLLIDES: &str = "collides";
}
