//! arcade2d - a small 2D framework for tile-based arcade games.
//!
//! Windowing and keyboard input come from winit, frames are drawn in
//! software and presented through pixels. Physics is arcade style:
//! axis-aligned boxes against tile layers and each other.

pub mod assets;
pub mod camera;
pub mod engine;
pub mod events;
pub mod input;
pub mod math;
pub mod physics;
pub mod render;
pub mod state;
pub mod tilemap;
pub mod timer;
pub mod tween;

pub use crate::assets::{AssetError, AssetManager, AssetManifest};
pub use crate::camera::{update_camera_follow, CameraFollow};
pub use crate::engine::{Engine, EngineConfig, EngineContext, Game};
pub use crate::events::{EventBus, Subscription};
pub use crate::input::{ActionId, AxisBinding, InputMap, InputState};
pub use crate::math::{Camera2D, Color, Rect, Vec2};
pub use crate::physics::{
    Body, BodyId, ColliderTarget, Contact, ContactKind, Facing, LayerId, PhysicsWorld, Sides,
};
pub use crate::render::{Animation, AnimationPlayer, AnimationSet, Canvas};
pub use crate::state::{State, StateMachine, StateMachineLike};
pub use crate::tilemap::{CollisionLayer, MapObject, ObjectLayer, TileLayer, TiledMap, TilemapError};
pub use crate::timer::{TimerHandle, TimerQueue};
pub use crate::tween::{Blink, Ease, Timeline, Tween};
pub use winit::keyboard::KeyCode;
