use std::collections::HashMap;
use std::time::Duration;

use arcade2d::{AnimationSet, BodyId, Camera2D, Canvas, Color, LayerId, PhysicsWorld, Vec2};
use thiserror::Error;

use super::anims::{self, PLAGUE_DOCTOR_IDLE};
use super::enemy::Enemy;
use super::patrol::ProbeConfig;
use crate::collidable::Collidable;
use crate::events::GameEvents;

pub const PLAGUE_DOCTOR: &str = "PlagueDoctor";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpawnError {
    #[error("no enemy type registered as `{0}`")]
    UnknownEnemyType(String),
    #[error("spawn point `{name}` not found in object layer `{layer}`")]
    MissingSpawn { layer: String, name: String },
}

/// Everything that tells one kind of enemy apart from another.
#[derive(Clone, Debug)]
pub struct EnemyDescriptor {
    pub speed: f32,
    pub damage: i32,
    pub max_patrol_distance: f32,
    pub gravity: f32,
    pub body_size: Vec2,
    pub body_offset: Vec2,
    pub frame_size: Vec2,
    pub probe: ProbeConfig,
    pub animations: fn() -> AnimationSet,
    pub animation: &'static str,
    pub color: Color,
    /// Minimum time between two turns.
    pub turn_cooldown: Duration,
}

impl EnemyDescriptor {
    pub fn plague_doctor() -> Self {
        Self {
            speed: 50.0,
            damage: 1,
            max_patrol_distance: 600.0,
            gravity: 500.0,
            body_size: Vec2::new(20.0, 45.0),
            body_offset: Vec2::new(10.0, 20.0),
            frame_size: Vec2::new(40.0, 65.0),
            probe: ProbeConfig::default(),
            animations: anims::plague_doctor_animations,
            animation: PLAGUE_DOCTOR_IDLE,
            color: Color::from_hex(0x7b5ea7),
            turn_cooldown: Duration::from_millis(100),
        }
    }
}

/// Maps the `type` authored on a spawn point to the enemy it creates.
#[derive(Clone, Debug, Default)]
pub struct EnemyRegistry {
    types: HashMap<String, EnemyDescriptor>,
}

impl EnemyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PLAGUE_DOCTOR, EnemyDescriptor::plague_doctor());
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, descriptor: EnemyDescriptor) {
        self.types.insert(name.into(), descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&EnemyDescriptor> {
        self.types.get(name)
    }

    /// Registered type names, sorted.
    pub fn types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build an enemy of type `kind` with its feet centered on `spawn`.
    pub fn spawn(
        &self,
        kind: &str,
        physics: &mut PhysicsWorld,
        spawn: Vec2,
        platform_colliders: Option<LayerId>,
        events: &GameEvents,
    ) -> Result<Enemy, SpawnError> {
        let descriptor = self
            .get(kind)
            .ok_or_else(|| SpawnError::UnknownEnemyType(kind.to_string()))?;
        Ok(Enemy::spawn(
            physics,
            kind,
            descriptor.clone(),
            spawn,
            platform_colliders,
            events,
        ))
    }
}

/// All enemies of a scene.
#[derive(Debug, Default)]
pub struct Enemies {
    members: Vec<Enemy>,
}

impl Enemies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, enemy: Enemy) {
        self.members.push(enemy);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.members.iter()
    }

    pub fn by_body(&self, body: BodyId) -> Option<&Enemy> {
        self.members.iter().find(|enemy| enemy.body_id() == body)
    }

    pub fn update(&mut self, now: Duration, dt: Duration, physics: &mut PhysicsWorld) {
        for enemy in &mut self.members {
            enemy.update(now, dt, physics);
        }
    }

    pub fn handle_events(&mut self, physics: &mut PhysicsWorld) {
        for enemy in &mut self.members {
            enemy.handle_events(physics);
        }
    }

    pub fn draw(&self, canvas: &mut Canvas<'_>, camera: &Camera2D, physics: &PhysicsWorld) {
        for enemy in &self.members {
            enemy.draw(canvas, camera, physics);
        }
    }
}

impl Collidable for Enemies {
    fn bodies(&self) -> Vec<BodyId> {
        self.members.iter().map(Enemy::body_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_is_rejected() {
        let registry = EnemyRegistry::with_defaults();
        let mut physics = PhysicsWorld::new(Vec2::ZERO);
        let err = registry
            .spawn("Dragon", &mut physics, Vec2::ZERO, None, &GameEvents::new())
            .expect_err("unregistered type");
        assert_eq!(err, SpawnError::UnknownEnemyType("Dragon".into()));
        assert_eq!(physics.body_count(), 0);
    }

    #[test]
    fn group_wires_every_member() {
        let registry = EnemyRegistry::with_defaults();
        let mut physics = PhysicsWorld::new(Vec2::ZERO);
        let events = GameEvents::new();
        let mut enemies = Enemies::new();
        for x in [50.0, 150.0, 250.0] {
            let enemy = registry
                .spawn(PLAGUE_DOCTOR, &mut physics, Vec2::new(x, 100.0), None, &events)
                .expect("registered type");
            enemies.push(enemy);
        }
        let wall = physics.add_body(arcade2d::Body::new(Vec2::ZERO, Vec2::ONE));

        enemies.add_collider(&mut physics, wall).add_overlap(&mut physics, wall);
        assert_eq!(physics.collider_count(), 6);
        assert_eq!(events.subscriber_count(), 3);
        assert_eq!(registry.types(), vec![PLAGUE_DOCTOR]);

        let first = enemies.bodies()[0];
        assert_eq!(enemies.by_body(first).map(Enemy::kind), Some(PLAGUE_DOCTOR));
    }
}
