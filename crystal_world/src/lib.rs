//! Crystal World: a side-scrolling platformer built on arcade2d.
//!
//! The player runs and multi-jumps through a Tiled level while plague
//! doctors patrol the platforms. Touching an enemy costs a heart; losing
//! the last one (or falling out of the map) fades the level out and
//! rebuilds it.

pub mod characters;
pub mod collidable;
pub mod config;
pub mod controls;
pub mod events;
pub mod hud;
pub mod scenes;

pub use crate::config::{ConfigError, GameConfig};
pub use crate::events::{GameEvent, GameEvents};
pub use crate::scenes::{PlayScene, PreloadScene, ScenePhase};
