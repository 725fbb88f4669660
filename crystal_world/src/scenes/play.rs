use std::time::Duration;

use anyhow::Result;
use arcade2d::{
    update_camera_follow, AssetManager, Body, BodyId, Camera2D, CameraFollow, Canvas, Color,
    Contact, ContactKind, EngineContext, InputMap, LayerId, PhysicsWorld, Rect, State,
    StateMachineLike, Subscription, TileLayer, TiledMap, TimerHandle, TimerQueue, Vec2,
};

use super::layers;
use crate::characters::{Enemies, EnemyRegistry, Player, PlayerTick, SpawnError};
use crate::collidable::Collidable;
use crate::config::{GameConfig, ParallaxLayerConfig};
use crate::controls;
use crate::events::{GameEvent, GameEvents};

const EXIT_ZONE_WIDTH: f32 = 5.0;
const PLAYER_SHEET: &str = "player";

const COLLIDER_TILE_COLOR: Color = Color::rgb(0x3f, 0x7f, 0x8c);
const ENVIRONMENT_TILE_COLOR: Color = Color::rgb(0x4a, 0x3b, 0x6b);
const PLATFORM_TILE_COLOR: Color = Color::rgb(0x6f, 0xc3, 0xd9);
const SPIKE_COLOR: Color = Color::rgb(0x2c, 0x25, 0x45);
const SPIKE_WIDTH: f32 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenePhase {
    /// Map, layers and entities are being built.
    Loading,
    Running,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SceneTimer {
    Restart,
}

/// Everything that is torn down and rebuilt on restart.
struct Level {
    physics: PhysicsWorld,
    tile_layers: Vec<(TileLayer, Color)>,
    spikes: Vec<Rect>,
    platform_colliders: LayerId,
    player: Player,
    enemies: Enemies,
    scene_exit: Option<BodyId>,
    exit_reached: bool,
    size: Vec2,
}

impl Level {
    fn build(
        map: &TiledMap,
        assets: &AssetManager,
        config: &GameConfig,
        registry: &EnemyRegistry,
        events: &GameEvents,
    ) -> Result<Self> {
        let size = map_size(map, config);
        let mut physics = PhysicsWorld::new(Vec2::ZERO);
        physics.set_bounds(Rect::new(
            0.0,
            0.0,
            size.x,
            size.y + config.world_bounds_extra_depth,
        ));

        // draw order: colliders behind environment, environment behind platforms
        let mut colliders = map.create_layer(layers::PLATFORMS_COLLIDERS)?;
        let solid = colliders.set_collision_by_property(layers::COLLIDES, true);
        let platform_colliders = physics.add_layer(colliders.collision_layer());
        log::debug!("{solid} solid tile(s) in `{}`", layers::PLATFORMS_COLLIDERS);

        let mut tile_layers = vec![(colliders, COLLIDER_TILE_COLOR)];
        for (name, color) in [
            (layers::ENVIRONMENT, ENVIRONMENT_TILE_COLOR),
            (layers::PLATFORMS, PLATFORM_TILE_COLOR),
        ] {
            match map.create_layer(name) {
                Ok(layer) => tile_layers.push((layer, color)),
                Err(err) => log::warn!("{err}"),
            }
        }

        let spikes = background_spikes(map);

        let player_spawns = map.object_layer(layers::PLAYER_SPAWNS)?;
        let entrance = player_spawns
            .find(layers::SCENE_ENTRANCE)
            .ok_or_else(|| SpawnError::MissingSpawn {
                layer: layers::PLAYER_SPAWNS.into(),
                name: layers::SCENE_ENTRANCE.into(),
            })?;
        let mut player = Player::spawn(
            &mut physics,
            entrance.position(),
            &config.player,
            &config.scene,
            size.y,
            events.clone(),
        );
        if let Some(sheet) = assets.spritesheet(PLAYER_SHEET) {
            player.set_color(sheet.color());
        }

        let mut enemies = Enemies::new();
        match map.object_layer(layers::ENEMY_SPAWNS) {
            Ok(spawns) => {
                for spawn in &spawns.objects {
                    match registry.spawn(
                        &spawn.kind,
                        &mut physics,
                        spawn.position(),
                        Some(platform_colliders),
                        events,
                    ) {
                        Ok(enemy) => enemies.push(enemy),
                        Err(err) => log::warn!("skipping enemy spawn {}: {err}", spawn.id),
                    }
                }
            }
            Err(err) => log::warn!("{err}"),
        }

        player.add_collider(&mut physics, platform_colliders);
        enemies
            .add_collider(&mut physics, platform_colliders)
            .add_collider(&mut physics, player.body_id());

        let scene_exit = match player_spawns.find(layers::SCENE_EXIT) {
            Some(exit) => {
                let height = config.window.height as f32 * 2.0;
                let mut zone = Body::new(
                    exit.position() - Vec2::new(EXIT_ZONE_WIDTH * 0.5, height),
                    Vec2::new(EXIT_ZONE_WIDTH, height),
                );
                zone.allow_gravity = false;
                zone.immovable = true;
                let zone = physics.add_body(zone);
                player.add_overlap(&mut physics, zone);
                Some(zone)
            }
            None => {
                log::warn!("no `{}` in `{}`", layers::SCENE_EXIT, layers::PLAYER_SPAWNS);
                None
            }
        };

        Ok(Self {
            physics,
            tile_layers,
            spikes,
            platform_colliders,
            player,
            enemies,
            scene_exit,
            exit_reached: false,
            size,
        })
    }

    /// Route body contacts from one physics step to the entities involved.
    fn dispatch(&mut self, contacts: &[Contact], now: Duration) {
        let player = self.player.body_id();
        for contact in contacts {
            let (other, touching) = if contact.a == player {
                (contact.b, contact.touching)
            } else if contact.b == player {
                (contact.a, contact.touching.mirrored())
            } else {
                continue;
            };

            match contact.kind {
                ContactKind::Collide => {
                    if let Some(enemy) = self.enemies.by_body(other) {
                        let damage = enemy.damage();
                        self.player
                            .collides_with(damage, touching, now, &mut self.physics);
                    }
                }
                ContactKind::Overlap => {
                    if Some(other) == self.scene_exit && !self.exit_reached {
                        self.exit_reached = true;
                        log::info!("player reached the scene exit");
                    }
                }
            }
        }
    }
}

/// Spike strips from the `background-spikes` object layer. Point objects
/// become one tile sitting on the point.
fn background_spikes(map: &TiledMap) -> Vec<Rect> {
    let Ok(layer) = map.object_layer(layers::BACKGROUND_SPIKES) else {
        log::debug!("no `{}` layer", layers::BACKGROUND_SPIKES);
        return Vec::new();
    };
    let tile = Vec2::new(map.tile_width as f32, map.tile_height as f32);
    layer
        .objects
        .iter()
        .map(|object| {
            if object.width > 0.0 && object.height > 0.0 {
                Rect::new(object.x, object.y, object.width, object.height)
            } else {
                Rect::new(object.x - tile.x * 0.5, object.y - tile.y, tile.x, tile.y)
            }
        })
        .collect()
}

fn map_size(map: &TiledMap, config: &GameConfig) -> Vec2 {
    let (w, h) = (map.width_in_pixels(), map.height_in_pixels());
    if w > 0.0 && h > 0.0 {
        Vec2::new(w, h)
    } else {
        Vec2::new(config.map_width, config.map_height)
    }
}

/// The level itself: map, player, enemies, camera and the restart loop.
pub struct PlayScene {
    config: GameConfig,
    assets: AssetManager,
    registry: EnemyRegistry,
    bindings: InputMap,
    events: GameEvents,
    mailbox: Option<Subscription<GameEvent>>,
    phase: ScenePhase,
    level: Option<Level>,
    camera: Camera2D,
    follow: CameraFollow,
    timers: TimerQueue<SceneTimer>,
    restart_pending: Option<TimerHandle>,
    restarts: u32,
}

impl PlayScene {
    pub fn new(config: GameConfig, assets: AssetManager) -> Self {
        let camera = Camera2D::new(config.screen_size()).with_zoom(config.zoom_factor);
        Self {
            config,
            assets,
            registry: EnemyRegistry::with_defaults(),
            bindings: controls::default_bindings(),
            events: GameEvents::new(),
            mailbox: None,
            phase: ScenePhase::Loading,
            level: None,
            camera,
            follow: CameraFollow::new(),
            timers: TimerQueue::new(),
            restart_pending: None,
            restarts: 0,
        }
    }

    /// Use a custom enemy registry instead of the built-in one.
    #[must_use]
    pub fn with_registry(mut self, registry: EnemyRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    pub fn events(&self) -> &GameEvents {
        &self.events
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn player(&self) -> Option<&Player> {
        self.level.as_ref().map(|level| &level.player)
    }

    pub fn enemies(&self) -> Option<&Enemies> {
        self.level.as_ref().map(|level| &level.enemies)
    }

    pub fn physics(&self) -> Option<&PhysicsWorld> {
        self.level.as_ref().map(|level| &level.physics)
    }

    pub fn physics_mut(&mut self) -> Option<&mut PhysicsWorld> {
        self.level.as_mut().map(|level| &mut level.physics)
    }

    pub fn platform_colliders(&self) -> Option<LayerId> {
        self.level.as_ref().map(|level| level.platform_colliders)
    }

    /// Decorative spike strips behind the tiles.
    pub fn background_spikes(&self) -> &[Rect] {
        self.level.as_ref().map_or(&[][..], |level| level.spikes.as_slice())
    }

    pub fn map_size(&self) -> Option<Vec2> {
        self.level.as_ref().map(|level| level.size)
    }

    pub fn exit_reached(&self) -> bool {
        self.level.as_ref().is_some_and(|level| level.exit_reached)
    }

    pub fn restart_pending(&self) -> bool {
        self.restart_pending.is_some()
    }

    /// Build the level. `restarted` skips the one-time event wiring so a
    /// rebuilt level never adds a second scene listener.
    pub fn create(&mut self, ctx: &EngineContext, restarted: bool) -> Result<()> {
        self.phase = ScenePhase::Loading;

        let map = self.assets.tilemap(&self.config.map_key)?;
        let level = Level::build(map, &self.assets, &self.config, &self.registry, &self.events)?;

        if !restarted {
            self.mailbox = Some(self.events.subscribe());
        }

        self.camera.viewport = ctx.screen_size();
        self.camera.set_zoom(self.config.zoom_factor);
        self.camera
            .set_bounds(Rect::from_pos_size(Vec2::ZERO, level.size));
        if let Some(center) = level.player.center(&level.physics) {
            self.camera.center_on(center);
        }

        log::info!(
            "level `{}` ready: {}x{} px, {} enemy(ies){}",
            self.config.map_key,
            level.size.x,
            level.size.y,
            level.enemies.len(),
            if restarted { " (restarted)" } else { "" }
        );
        self.level = Some(level);
        self.phase = ScenePhase::Running;
        Ok(())
    }

    /// Tear the level down and build it again from the map.
    fn restart(&mut self, ctx: &EngineContext) -> Result<()> {
        self.timers.cancel_all();
        self.restart_pending = None;
        // dropping the level drops its bodies, timers and bus subscriptions
        self.level = None;
        self.camera.reset_effects();
        self.restarts += 1;
        self.create(ctx, true)
    }

    fn on_player_dead(&mut self, now: Duration) {
        if self.restart_pending.is_some() {
            return;
        }
        self.camera
            .fade_out(self.config.scene.death_fade(), Color::BLACK);
        let delay = self.config.scene.restart_delay();
        self.restart_pending = Some(self.timers.schedule(now, delay, SceneTimer::Restart));
        log::info!("player dead, restarting in {delay:?}");
    }

    fn draw_parallax(&self, canvas: &mut Canvas<'_>) {
        for layer in &self.config.scene.parallax {
            draw_parallax_layer(canvas, layer, self.camera.position.x * self.camera.zoom);
        }
    }
}

fn draw_parallax_layer(canvas: &mut Canvas<'_>, layer: &ParallaxLayerConfig, scroll: f32) {
    let period = layer.block_width + layer.gap;
    if period <= 0.0 {
        return;
    }
    let color = Color::from_hex(layer.color);
    let mut x = -(scroll * layer.factor).rem_euclid(period);
    while x < canvas.width() as f32 {
        canvas.fill_rect(Rect::new(x, layer.top, layer.block_width, layer.height), color);
        x += period;
    }
}

/// A row of teeth, each a stack of narrowing slabs.
fn draw_spikes(canvas: &mut Canvas<'_>, camera: &Camera2D, strip: Rect) {
    let mut x = strip.left();
    while x < strip.right() {
        let width = SPIKE_WIDTH.min(strip.right() - x);
        let slab = strip.h / 4.0;
        for i in 0..4 {
            let inset = width * 0.125 * i as f32;
            let rect = Rect::new(
                x + inset,
                strip.bottom() - slab * (i + 1) as f32,
                width - inset * 2.0,
                slab,
            );
            canvas.fill_world_rect(camera, rect, SPIKE_COLOR);
        }
        x += SPIKE_WIDTH;
    }
}

fn draw_tile_layer(canvas: &mut Canvas<'_>, camera: &Camera2D, layer: &TileLayer, color: Color) {
    if !layer.visible {
        return;
    }
    let tile = layer.tile_size();
    let view = camera.world_view();
    let first_x = (view.left() / tile.x).floor().max(0.0) as u32;
    let first_y = (view.top() / tile.y).floor().max(0.0) as u32;
    let last_x = ((view.right() / tile.x).ceil().max(0.0) as u32).min(layer.width());
    let last_y = ((view.bottom() / tile.y).ceil().max(0.0) as u32).min(layer.height());

    for y in first_y..last_y {
        for x in first_x..last_x {
            if layer.tile_at(x, y).is_some() {
                let rect = Rect::new(x as f32 * tile.x, y as f32 * tile.y, tile.x, tile.y);
                canvas.fill_world_rect(camera, rect, color);
            }
        }
    }
}

impl State for PlayScene {
    fn on_enter(&mut self, ctx: &mut EngineContext) -> Result<()> {
        self.create(ctx, false)
    }

    fn update(&mut self, ctx: &mut EngineContext, _state_machine: &mut dyn StateMachineLike) -> Result<()> {
        let now = ctx.elapsed_time();
        let dt = ctx.delta_time();

        if self
            .bindings
            .action_pressed(ctx.input(), &controls::FULLSCREEN.into())
        {
            ctx.request_fullscreen_toggle();
        }

        for timer in self.timers.drain_due(now) {
            match timer {
                SceneTimer::Restart => self.restart(ctx)?,
            }
        }

        let Some(level) = self.level.as_mut() else {
            return Ok(());
        };

        level.player.update(PlayerTick {
            now,
            dt,
            input: ctx.input(),
            bindings: &self.bindings,
            physics: &mut level.physics,
            camera: &mut self.camera,
        });
        level.enemies.update(now, dt, &mut level.physics);

        let step = ctx.fixed_delta_time();
        while ctx.should_run_fixed_update() {
            let contacts = level.physics.step(step);
            level.dispatch(&contacts, now);
        }

        level.enemies.handle_events(&mut level.physics);

        let player_center = level.player.center(&level.physics);
        let player_dead = self
            .mailbox
            .as_ref()
            .is_some_and(|mailbox| mailbox.drain().any(|event| event == GameEvent::PlayerDead));
        if player_dead {
            self.on_player_dead(now);
        }

        match player_center {
            Some(target) => update_camera_follow(&mut self.camera, &self.follow, target, dt),
            None => self.camera.update(dt),
        }
        Ok(())
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>) -> Result<()> {
        canvas.clear(Color::from_hex(self.config.scene.sky_color));
        self.draw_parallax(canvas);

        let Some(level) = self.level.as_ref() else {
            return Ok(());
        };
        for strip in &level.spikes {
            draw_spikes(canvas, &self.camera, *strip);
        }
        for (layer, color) in &level.tile_layers {
            draw_tile_layer(canvas, &self.camera, layer, *color);
        }
        level.enemies.draw(canvas, &self.camera, &level.physics);
        level.player.draw(canvas, &self.camera, &level.physics);
        level.player.health_ui().draw(canvas);

        if let Some(fade) = self.camera.fade_overlay() {
            canvas.overlay(fade);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "play"
    }
}
