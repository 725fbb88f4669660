use std::time::Duration;

use arcade2d::{
    AnimationPlayer, Blink, Body, BodyId, Camera2D, Canvas, Color, InputMap, InputState,
    PhysicsWorld, Rect, Sides, TimerQueue, Vec2,
};

use super::anims::{self, IDLE, JUMP_FIRST, JUMP_SECOND, RUN};
use crate::collidable::Collidable;
use crate::config::{PlayerConfig, SceneConfig};
use crate::controls;
use crate::events::{GameEvent, GameEvents};
use crate::hud::HealthUi;

const PLAYER_COLOR: Color = Color::rgb(0x8f, 0xd1, 0x9e);
const HUD_ORIGIN: Vec2 = Vec2::new(16.0, 16.0);

/// Everything the player reads or touches during one frame.
pub struct PlayerTick<'a> {
    pub now: Duration,
    pub dt: Duration,
    pub input: &'a InputState,
    pub bindings: &'a InputMap,
    pub physics: &'a mut PhysicsWorld,
    pub camera: &'a mut Camera2D,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PlayerTimer {
    /// End of the invincibility window.
    ClearHit,
    /// Upward half of a knockback, applied one tick after the hit.
    KnockbackLift,
}

pub struct Player {
    body: BodyId,
    settings: PlayerConfig,
    shake: (Duration, f32),
    map_height: f32,
    extra_jumps: u32,
    was_grounded: bool,
    is_hit: bool,
    is_dead: bool,
    health: i32,
    flip_x: bool,
    color: Color,
    anims: AnimationPlayer,
    timers: TimerQueue<PlayerTimer>,
    hit_effect: Option<Blink>,
    health_ui: HealthUi,
    events: GameEvents,
}

impl Player {
    /// Spawn the player with its feet centered on `spawn`.
    pub fn spawn(
        physics: &mut PhysicsWorld,
        spawn: Vec2,
        settings: &PlayerConfig,
        scene: &SceneConfig,
        map_height: f32,
        events: GameEvents,
    ) -> Self {
        let frame = settings.frame_size();
        let sprite_origin = spawn - Vec2::new(frame.x * 0.5, frame.y);
        let mut body = Body::for_sprite(sprite_origin, settings.body_size(), settings.offset_right());
        body.gravity = Vec2::new(0.0, settings.gravity);
        body.collide_world_bounds = true;
        let body = physics.add_body(body);

        let mut anims = AnimationPlayer::new(anims::player_animations());
        anims.play(IDLE, true);
        let hearts = settings.max_hearts.max(0) as u32;

        Self {
            body,
            settings: settings.clone(),
            shake: (scene.shake(), scene.shake_intensity),
            map_height,
            extra_jumps: settings.extra_jumps,
            was_grounded: false,
            is_hit: false,
            is_dead: false,
            health: settings.max_hearts,
            flip_x: false,
            color: PLAYER_COLOR,
            anims,
            timers: TimerQueue::new(),
            hit_effect: None,
            health_ui: HealthUi::new(hearts, HUD_ORIGIN),
            events,
        }
    }

    /// Placeholder color the player is drawn with.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn body_id(&self) -> BodyId {
        self.body
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn extra_jumps(&self) -> u32 {
        self.extra_jumps
    }

    pub fn is_hit(&self) -> bool {
        self.is_hit
    }

    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    pub fn is_flipped(&self) -> bool {
        self.flip_x
    }

    pub fn health_ui(&self) -> &HealthUi {
        &self.health_ui
    }

    pub fn current_animation(&self) -> Option<&str> {
        self.anims.current_key()
    }

    /// Center of the hit box, used by the camera.
    pub fn center(&self, physics: &PhysicsWorld) -> Option<Vec2> {
        physics.body(self.body).map(|b| b.bounds().center())
    }

    pub fn update(&mut self, tick: PlayerTick<'_>) {
        let PlayerTick {
            now,
            dt,
            input,
            bindings,
            physics,
            camera,
        } = tick;

        for timer in self.timers.drain_due(now) {
            match timer {
                PlayerTimer::ClearHit => {
                    self.is_hit = false;
                    self.hit_effect = None;
                }
                PlayerTimer::KnockbackLift => {
                    if let Some(body) = physics.body_mut(self.body) {
                        body.velocity.y = -self.settings.knockback[1];
                    }
                }
            }
        }
        self.health_ui.update(dt);
        self.anims.update(dt);
        if let Some(blink) = self.hit_effect.as_mut() {
            blink.update(dt);
        }

        let Some(body) = physics.body_mut(self.body) else {
            return;
        };

        // tracked even while hit or dead, so a landing during knockback still refunds
        let grounded = body.on_floor();
        if grounded && !self.was_grounded {
            self.extra_jumps = self.settings.extra_jumps;
        }
        self.was_grounded = grounded;

        if self.is_hit {
            return;
        }
        if self.is_dead {
            body.velocity.x = 0.0;
            self.anims.play(IDLE, true);
            return;
        }

        let direction = bindings.axis(input, &controls::MOVE.into());
        body.velocity.x = direction * self.settings.speed;
        if direction < 0.0 {
            self.flip_x = true;
            body.set_offset(self.settings.offset_left());
        } else if direction > 0.0 {
            self.flip_x = false;
            body.set_offset(self.settings.offset_right());
        }

        if bindings.action_pressed(input, &controls::JUMP.into()) && self.extra_jumps > 0 {
            body.velocity.y = -self.settings.jump_force;
            self.extra_jumps -= 1;
        }

        if grounded {
            let key = if body.velocity.x != 0.0 { RUN } else { IDLE };
            self.anims.play(key, true);
        } else if self.extra_jumps == 1 {
            self.anims.play(JUMP_FIRST, true);
        } else if self.extra_jumps == 0 {
            self.anims.play(JUMP_SECOND, true);
        }

        if body.bounds().top() > self.map_height {
            camera.shake(self.shake.0, self.shake.1);
            self.kill_player();
        }
    }

    /// React to touching something that deals `damage`. `touching` holds the
    /// sides of the player's box that made contact.
    pub fn collides_with(&mut self, damage: i32, touching: Sides, now: Duration, physics: &mut PhysicsWorld) {
        if self.is_hit {
            return;
        }
        let Some(body) = physics.body_mut(self.body) else {
            return;
        };

        self.health = (self.health - damage).max(0);
        log::debug!("player hit for {damage}, health {}", self.health);
        if self.health <= 0 {
            self.kill_player();
        }
        self.is_hit = true;

        let [push, _] = self.settings.knockback;
        body.velocity.x = if touching.right { -push } else { push };
        self.timers.schedule(now, Duration::ZERO, PlayerTimer::KnockbackLift);

        self.hit_effect = Some(Blink::new(
            self.settings.blink_interval(),
            Color::WHITE,
            self.settings.hit_tint(),
        ));
        self.timers
            .schedule(now, self.settings.invincibility(), PlayerTimer::ClearHit);
        self.health_ui.decrease_hearts(damage.max(0) as u32);
    }

    /// Mark the player dead and announce it. Only the first call does anything.
    pub fn kill_player(&mut self) {
        if self.is_dead {
            return;
        }
        self.is_dead = true;
        let listeners = self.events.emit(GameEvent::PlayerDead);
        log::info!("player died ({listeners} listener(s) notified)");
    }

    pub fn draw(&self, canvas: &mut Canvas<'_>, camera: &Camera2D, physics: &PhysicsWorld) {
        let Some(body) = physics.body(self.body) else {
            return;
        };
        let tint = self.hit_effect.map_or(Color::WHITE, |blink| blink.tint());
        let frame = Rect::from_pos_size(body.sprite_origin(), self.settings.frame_size());
        let color = self.color.tinted(tint);

        // placeholder art: the hit box filled, the sprite frame outlined
        canvas.fill_world_rect(camera, body.bounds(), color);
        canvas.stroke_world_rect(camera, frame, 1.0, color.with_alpha(0.4));

        let eye_x = if self.flip_x {
            body.bounds().left() + 2.0
        } else {
            body.bounds().right() - 6.0
        };
        canvas.fill_world_rect(
            camera,
            Rect::new(eye_x, body.bounds().top() + 6.0, 4.0, 4.0),
            Color::BLACK,
        );
    }
}

impl Collidable for Player {
    fn bodies(&self) -> Vec<BodyId> {
        vec![self.body]
    }
}

#[cfg(test)]
mod tests {
    use arcade2d::KeyCode;

    use super::*;

    const NOW: Duration = Duration::from_millis(1000);
    const DT: Duration = Duration::from_millis(16);

    struct Rig {
        physics: PhysicsWorld,
        camera: Camera2D,
        bindings: InputMap,
        input: InputState,
        bus: GameEvents,
        player: Player,
    }

    impl Rig {
        fn new() -> Self {
            let mut physics = PhysicsWorld::new(Vec2::ZERO);
            let bus = GameEvents::new();
            let player = Player::spawn(
                &mut physics,
                Vec2::new(100.0, 100.0),
                &PlayerConfig::default(),
                &SceneConfig::default(),
                640.0,
                bus.clone(),
            );
            Self {
                physics,
                camera: Camera2D::default(),
                bindings: controls::default_bindings(),
                input: InputState::new(),
                bus,
                player,
            }
        }

        fn tick(&mut self, now: Duration) {
            self.player.update(PlayerTick {
                now,
                dt: DT,
                input: &self.input,
                bindings: &self.bindings,
                physics: &mut self.physics,
                camera: &mut self.camera,
            });
            self.input.begin_frame();
        }

        fn body(&mut self) -> &mut Body {
            let id = self.player.body_id();
            self.physics.body_mut(id).expect("player body")
        }

        fn set_grounded(&mut self, grounded: bool) {
            self.body().blocked.down = grounded;
        }
    }

    #[test]
    fn spawn_places_feet_on_spawn_point() {
        let rig = Rig::new();
        let body = rig.physics.body(rig.player.body_id()).expect("body");
        assert_eq!(body.sprite_origin(), Vec2::new(84.0, 36.0));
        assert_eq!(body.position, Vec2::new(94.0, 61.0));
        assert_eq!(rig.player.health(), 3);
    }

    #[test]
    fn three_jump_edges_give_two_impulses() {
        let mut rig = Rig::new();
        rig.set_grounded(true);
        rig.tick(NOW);

        let mut impulses = 0;
        for i in 0..3 {
            rig.body().velocity.y = 0.0;
            rig.set_grounded(false);
            rig.input.press_key(KeyCode::Space);
            rig.tick(NOW + DT * (i + 1));
            if rig.body().velocity.y == -300.0 {
                impulses += 1;
            }
            rig.input.release_key(KeyCode::Space);
        }
        assert_eq!(impulses, 2);
        assert_eq!(rig.player.extra_jumps(), 0);
    }

    #[test]
    fn holding_jump_does_not_retrigger() {
        let mut rig = Rig::new();
        rig.input.press_key(KeyCode::ArrowUp);
        rig.tick(NOW);
        assert_eq!(rig.player.extra_jumps(), 1);

        for i in 1..10 {
            rig.tick(NOW + DT * i);
        }
        assert_eq!(rig.player.extra_jumps(), 1);

        // a different jump key still has its own edge
        rig.input.press_key(KeyCode::Space);
        rig.tick(NOW + DT * 10);
        assert_eq!(rig.player.extra_jumps(), 0);
    }

    #[test]
    fn extra_jumps_reset_once_per_landing() {
        let mut rig = Rig::new();
        rig.set_grounded(true);
        rig.tick(NOW);

        // jump from the ground; the body is still reported grounded this frame
        rig.input.press_key(KeyCode::Space);
        rig.tick(NOW + DT);
        assert_eq!(rig.player.extra_jumps(), 1);

        rig.set_grounded(false);
        rig.tick(NOW + DT * 2);
        assert_eq!(rig.player.current_animation(), Some(JUMP_FIRST));

        rig.set_grounded(true);
        rig.tick(NOW + DT * 3);
        assert_eq!(rig.player.extra_jumps(), 2);
        assert_eq!(rig.player.current_animation(), Some(IDLE));
    }

    #[test]
    fn landing_while_knocked_back_still_refunds_jumps() {
        let mut rig = Rig::new();
        rig.set_grounded(true);
        rig.tick(NOW);

        rig.input.press_key(KeyCode::Space);
        rig.tick(NOW + DT);
        rig.input.release_key(KeyCode::Space);
        assert_eq!(rig.player.extra_jumps(), 1);

        rig.player.collides_with(1, Sides::none(), NOW + DT, &mut rig.physics);
        rig.set_grounded(false);
        for i in 2..7 {
            rig.tick(NOW + DT * i);
        }
        rig.set_grounded(true);
        for i in 7..67 {
            rig.tick(NOW + DT * i);
        }

        assert!(!rig.player.is_hit());
        assert_eq!(rig.player.extra_jumps(), 2);
    }

    #[test]
    fn movement_flips_and_moves_hit_box() {
        let mut rig = Rig::new();
        rig.set_grounded(true);
        rig.input.press_key(KeyCode::KeyA);
        rig.tick(NOW);

        assert!(rig.player.is_flipped());
        assert_eq!(rig.body().velocity.x, -150.0);
        assert_eq!(rig.body().offset(), Vec2::new(2.0, 25.0));
        assert_eq!(rig.body().sprite_origin(), Vec2::new(84.0, 36.0));
        assert_eq!(rig.player.current_animation(), Some(RUN));

        rig.input.release_key(KeyCode::KeyA);
        rig.tick(NOW + DT);
        assert_eq!(rig.body().velocity.x, 0.0);
        assert!(rig.player.is_flipped());
    }

    #[test]
    fn hit_knocks_back_and_ignores_second_contact() {
        let mut rig = Rig::new();
        let touching_right = Sides {
            right: true,
            ..Sides::none()
        };
        rig.player.collides_with(1, touching_right, NOW, &mut rig.physics);
        assert_eq!(rig.player.health(), 2);
        assert!(rig.player.is_hit());
        assert_eq!(rig.body().velocity.x, -200.0);

        rig.player.collides_with(1, touching_right, NOW, &mut rig.physics);
        assert_eq!(rig.player.health(), 2);
        assert_eq!(rig.player.health_ui().hearts(), 2);

        // the upward lift lands on the next tick, input stays ignored
        rig.input.press_key(KeyCode::KeyD);
        rig.tick(NOW + DT);
        assert_eq!(rig.body().velocity, Vec2::new(-200.0, -250.0));

        rig.tick(NOW + Duration::from_millis(500));
        assert!(!rig.player.is_hit());
    }

    #[test]
    fn knockback_pushes_away_from_left_contact() {
        let mut rig = Rig::new();
        rig.player.collides_with(1, Sides::none(), NOW, &mut rig.physics);
        assert_eq!(rig.body().velocity.x, 200.0);
    }

    #[test]
    fn death_is_announced_once() {
        let mut rig = Rig::new();
        let mailbox = rig.bus.subscribe();
        rig.player.kill_player();
        rig.player.kill_player();
        assert_eq!(mailbox.drain().collect::<Vec<_>>(), vec![GameEvent::PlayerDead]);
        assert!(rig.player.is_dead());
    }

    #[test]
    fn dead_player_stands_still() {
        let mut rig = Rig::new();
        rig.player.kill_player();
        rig.input.press_key(KeyCode::KeyD);
        rig.tick(NOW);
        assert_eq!(rig.body().velocity.x, 0.0);
        assert_eq!(rig.player.current_animation(), Some(IDLE));
    }

    #[test]
    fn falling_below_the_map_kills_and_shakes() {
        let mut rig = Rig::new();
        let mailbox = rig.bus.subscribe();
        rig.body().position.y = 700.0;
        rig.tick(NOW);
        assert!(rig.player.is_dead());
        assert!(rig.camera.is_shaking());
        assert_eq!(mailbox.drain().count(), 1);
    }

    #[test]
    fn missing_body_freezes_the_player() {
        let mut rig = Rig::new();
        let id = rig.player.body_id();
        rig.physics.remove_body(id);
        rig.input.press_key(KeyCode::Space);
        rig.tick(NOW);
        rig.player.collides_with(1, Sides::none(), NOW, &mut rig.physics);
        assert_eq!(rig.player.extra_jumps(), 2);
        assert_eq!(rig.player.health(), 3);
    }
}
