use std::time::Duration;

use arcade2d::{
    AnimationPlayer, Body, BodyId, Camera2D, Canvas, Color, Facing, LayerId, PhysicsWorld, Rect,
    Subscription, Vec2,
};

use super::enemies::EnemyDescriptor;
use super::patrol::{PatrolProbe, ProbeHit};
use crate::collidable::Collidable;
use crate::events::{GameEvent, GameEvents};

/// A patrolling enemy. Walks back and forth along its platform and turns at
/// ledges, at walls, or after covering its patrol distance.
#[derive(Debug)]
pub struct Enemy {
    body: BodyId,
    kind: String,
    descriptor: EnemyDescriptor,
    /// Signed; the sign is the walking direction.
    speed: f32,
    current_patrol_distance: f32,
    /// Hit box x at the previous update.
    last_x: Option<f32>,
    time_from_last_turn: Duration,
    platform_colliders: Option<LayerId>,
    probe: PatrolProbe,
    active: bool,
    flip_x: bool,
    anims: AnimationPlayer,
    events: Subscription<GameEvent>,
}

impl Enemy {
    pub fn spawn(
        physics: &mut PhysicsWorld,
        kind: &str,
        descriptor: EnemyDescriptor,
        spawn: Vec2,
        platform_colliders: Option<LayerId>,
        events: &GameEvents,
    ) -> Self {
        let frame = descriptor.frame_size;
        let sprite_origin = spawn - Vec2::new(frame.x * 0.5, frame.y);
        let mut body = Body::for_sprite(sprite_origin, descriptor.body_size, descriptor.body_offset);
        body.gravity = Vec2::new(0.0, descriptor.gravity);
        body.collide_world_bounds = true;
        body.immovable = true;
        body.velocity.x = descriptor.speed;
        let body = physics.add_body(body);

        let mut anims = AnimationPlayer::new((descriptor.animations)());
        anims.play(descriptor.animation, true);

        Self {
            body,
            kind: kind.to_string(),
            speed: descriptor.speed,
            current_patrol_distance: 0.0,
            last_x: None,
            time_from_last_turn: Duration::ZERO,
            platform_colliders,
            probe: PatrolProbe::new(descriptor.probe),
            active: true,
            flip_x: false,
            anims,
            events: events.subscribe(),
            descriptor,
        }
    }

    pub fn body_id(&self) -> BodyId {
        self.body
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn damage(&self) -> i32 {
        self.descriptor.damage
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn current_patrol_distance(&self) -> f32 {
        self.current_patrol_distance
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_flipped(&self) -> bool {
        self.flip_x
    }

    pub fn last_probe(&self) -> Option<ProbeHit> {
        self.probe.last()
    }

    /// Layer the ground probe runs against.
    pub fn set_platform_colliders(&mut self, layer: LayerId) {
        self.platform_colliders = Some(layer);
    }

    pub fn update(&mut self, now: Duration, dt: Duration, physics: &mut PhysicsWorld) {
        self.anims.update(dt);
        if !self.active {
            return;
        }
        if let Some(body) = physics.body_mut(self.body) {
            body.velocity.x = self.speed;
        }
        self.patrol(now, physics);
    }

    fn patrol(&mut self, now: Duration, physics: &mut PhysicsWorld) {
        let Some(&body) = physics.body(self.body) else {
            return;
        };
        // any number of physics steps may have run since the last update
        let moved = self
            .last_x
            .map_or(0.0, |last_x| (body.position.x - last_x).abs());
        self.last_x = Some(body.position.x);
        if !body.on_floor() {
            return;
        }

        self.current_patrol_distance += moved;
        let probe = self.probe.cast(physics, self.platform_colliders, &body, moved);
        let walled = match body.facing {
            Facing::Right => body.blocked.right,
            Facing::Left => body.blocked.left,
        };

        let wants_turn = !probe.has_hit
            || walled
            || self.current_patrol_distance >= self.descriptor.max_patrol_distance;
        let cooled_down = now.saturating_sub(self.time_from_last_turn) >= self.descriptor.turn_cooldown;
        if !(wants_turn && cooled_down) {
            return;
        }

        self.flip_x = !self.flip_x;
        self.speed = -self.speed;
        self.time_from_last_turn = now;
        self.current_patrol_distance = 0.0;
        self.probe.invalidate();
        if let Some(body) = physics.body_mut(self.body) {
            body.velocity.x = self.speed;
            body.facing = if self.speed < 0.0 { Facing::Left } else { Facing::Right };
        }
        log::debug!(
            "{} {:?} turned at x={:.1} (edge: {}, wall: {walled})",
            self.kind,
            self.body,
            body.position.x,
            !probe.has_hit
        );
    }

    /// React to bus events delivered since the last call.
    pub fn handle_events(&mut self, physics: &mut PhysicsWorld) {
        let player_dead = self.events.drain().any(|event| event == GameEvent::PlayerDead);
        if player_dead && self.active {
            self.active = false;
            if let Some(body) = physics.body_mut(self.body) {
                body.velocity = Vec2::ZERO;
                body.enabled = false;
            }
        }
    }

    pub fn draw(&self, canvas: &mut Canvas<'_>, camera: &Camera2D, physics: &PhysicsWorld) {
        let Some(body) = physics.body(self.body) else {
            return;
        };
        let color = if self.active {
            self.descriptor.color
        } else {
            self.descriptor.color.tinted(Color::rgb(0x80, 0x80, 0x80))
        };
        let frame = Rect::from_pos_size(body.sprite_origin(), self.descriptor.frame_size);
        canvas.fill_world_rect(camera, body.bounds(), color);
        canvas.stroke_world_rect(camera, frame, 1.0, color.with_alpha(0.4));
    }
}

impl Collidable for Enemy {
    fn bodies(&self) -> Vec<BodyId> {
        vec![self.body]
    }
}

#[cfg(test)]
mod tests {
    use arcade2d::CollisionLayer;

    use super::*;
    use crate::characters::enemies::{EnemyRegistry, PLAGUE_DOCTOR};

    const STEP: Duration = Duration::from_millis(16);

    /// A flat floor of 16 px tiles, `width` tiles wide, on row 9 of a 10 row map.
    fn floor_world(width: u32) -> (PhysicsWorld, LayerId) {
        let mut solid = vec![false; (width * 10) as usize];
        for x in 0..width {
            solid[(9 * width + x) as usize] = true;
        }
        let mut physics = PhysicsWorld::new(Vec2::ZERO);
        let layer = physics.add_layer(CollisionLayer::from_solid(
            width,
            10,
            Vec2::splat(16.0),
            solid,
        ));
        (physics, layer)
    }

    fn spawn_on_floor(physics: &mut PhysicsWorld, layer: LayerId, x: f32, events: &GameEvents) -> Enemy {
        let enemy = EnemyRegistry::with_defaults()
            .spawn(PLAGUE_DOCTOR, physics, Vec2::new(x, 144.0), Some(layer), events)
            .expect("registered");
        enemy.add_collider(physics, layer);
        enemy
    }

    /// Run update + physics step the way the scene does, `frames` times.
    fn run(enemy: &mut Enemy, physics: &mut PhysicsWorld, start: Duration, frames: u32) -> Duration {
        let mut now = start;
        for _ in 0..frames {
            now += STEP;
            enemy.update(now, STEP, physics);
            physics.step(STEP);
        }
        now
    }

    #[test]
    fn spawns_standing_on_its_spawn_point() {
        let (mut physics, layer) = floor_world(20);
        let enemy = spawn_on_floor(&mut physics, layer, 100.0, &GameEvents::new());
        let body = physics.body(enemy.body_id()).expect("body");
        assert_eq!(body.bounds().bottom(), 144.0);
        assert_eq!(body.sprite_origin(), Vec2::new(80.0, 79.0));
        assert!(body.immovable);
    }

    #[test]
    fn turns_after_patrol_distance() {
        // wide enough that no ledge is reached
        let (mut physics, layer) = floor_world(200);
        let mut enemy = spawn_on_floor(&mut physics, layer, 100.0, &GameEvents::new());
        physics.step(STEP);

        let mut now = Duration::from_secs(1);
        let mut turned_at = None;
        for frame in 0..1200 {
            now = run(&mut enemy, &mut physics, now, 1);
            if enemy.speed() < 0.0 {
                turned_at = Some(frame);
                break;
            }
        }
        // 50 px/s over 600 px is twelve seconds of walking
        let frames = turned_at.expect("enemy turns");
        assert!((740..=760).contains(&frames), "turned after {frames} frames");
        assert_eq!(enemy.current_patrol_distance(), 0.0);
        assert!(enemy.is_flipped());
    }

    #[test]
    fn turns_at_platform_edge() {
        let (mut physics, layer) = floor_world(10);
        let mut enemy = spawn_on_floor(&mut physics, layer, 100.0, &GameEvents::new());
        physics.step(STEP);

        let now = run(&mut enemy, &mut physics, Duration::from_secs(1), 120);
        assert!(enemy.speed() < 0.0, "turned at the ledge");
        let body = physics.body(enemy.body_id()).expect("body");
        assert!(body.bounds().right() <= 160.0);
        assert!(body.on_floor());

        // walking back keeps it on the platform
        run(&mut enemy, &mut physics, now, 240);
        let body = physics.body(enemy.body_id()).expect("body");
        assert!(body.bounds().left() >= 0.0 && body.bounds().right() <= 160.0);
        assert!(body.on_floor());
    }

    #[test]
    fn never_turns_twice_within_cooldown() {
        let (mut physics, layer) = floor_world(20);
        let mut enemy = spawn_on_floor(&mut physics, layer, 100.0, &GameEvents::new());
        physics.step(STEP);

        // a tiny patrol range wants a turn on every frame
        enemy.descriptor.max_patrol_distance = 0.0;
        let start = Duration::from_secs(1);
        let mut turns = Vec::new();
        let mut now = start;
        let mut last_speed = enemy.speed();
        for _ in 0..30 {
            now += Duration::from_millis(10);
            enemy.update(now, Duration::from_millis(10), &mut physics);
            physics.step(Duration::from_millis(10));
            if enemy.speed() != last_speed {
                turns.push(now);
                last_speed = enemy.speed();
            }
        }
        assert!(turns.len() >= 2);
        for pair in turns.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(100));
        }
    }

    #[test]
    fn patrol_distance_follows_movement_not_update_count() {
        let (mut physics, layer) = floor_world(200);
        let mut enemy = spawn_on_floor(&mut physics, layer, 100.0, &GameEvents::new());
        physics.step(STEP);
        let mut now = run(&mut enemy, &mut physics, Duration::from_secs(1), 1);
        now += STEP;
        enemy.update(now, STEP, &mut physics);

        let id = enemy.body_id();
        let x = |physics: &PhysicsWorld| physics.body(id).map_or(0.0, |b| b.position.x);
        let start = x(&physics);
        let before = enemy.current_patrol_distance();

        // updates with no physics step in between cover no ground
        for _ in 0..5 {
            now += STEP;
            enemy.update(now, STEP, &mut physics);
        }
        assert_eq!(enemy.current_patrol_distance(), before);

        // several steps between two updates all count
        for _ in 0..4 {
            physics.step(STEP);
        }
        now += STEP;
        enemy.update(now, STEP, &mut physics);
        let travelled = x(&physics) - start;
        assert!((enemy.current_patrol_distance() - before - travelled).abs() < 1e-3);
        assert!(travelled > 3.0);
    }

    #[test]
    fn airborne_enemy_does_not_patrol() {
        let (mut physics, layer) = floor_world(20);
        let mut enemy = spawn_on_floor(&mut physics, layer, 100.0, &GameEvents::new());
        enemy.descriptor.max_patrol_distance = 0.0;
        // no step yet, so the body has never touched the floor
        enemy.update(Duration::from_secs(1), STEP, &mut physics);
        assert!(enemy.speed() > 0.0);
    }

    #[test]
    fn stops_when_the_player_dies() {
        let (mut physics, layer) = floor_world(20);
        let events = GameEvents::new();
        let mut enemy = spawn_on_floor(&mut physics, layer, 100.0, &events);
        physics.step(STEP);

        events.emit(GameEvent::PlayerDead);
        enemy.handle_events(&mut physics);
        enemy.handle_events(&mut physics);
        assert!(!enemy.is_active());

        let before = physics.body(enemy.body_id()).copied().expect("body");
        run(&mut enemy, &mut physics, Duration::from_secs(1), 30);
        let after = physics.body(enemy.body_id()).copied().expect("body");
        assert_eq!(before.position, after.position);
        assert_eq!(after.velocity, Vec2::ZERO);
        assert!(!after.enabled);
    }

    #[test]
    fn dropped_enemy_leaves_the_bus() {
        let (mut physics, layer) = floor_world(20);
        let events = GameEvents::new();
        let enemy = spawn_on_floor(&mut physics, layer, 100.0, &events);
        drop(enemy);
        assert_eq!(events.emit(GameEvent::PlayerDead), 0);
    }
}
