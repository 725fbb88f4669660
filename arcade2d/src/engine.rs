use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use pixels::{PixelsBuilder, SurfaceTexture};
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window},
};

use crate::{input::InputState, math::Vec2, render::Canvas};

/// Window and clock settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub title: String,
    /// Size of the frame buffer and the initial window, in logical pixels.
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub fixed_timestep: Duration,
    /// Upper bound on a single frame delta, so a stalled frame (window drag,
    /// breakpoint) does not fire a burst of catch-up steps.
    pub max_frame_delta: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "arcade2d".into(),
            width: 1280,
            height: 720,
            vsync: true,
            fixed_timestep: Duration::from_secs_f64(1.0 / 60.0),
            max_frame_delta: Duration::from_millis(250),
        }
    }
}

/// Owns the window settings; [`run`](Self::run) hands control to winit.
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    /// Override the frame buffer and initial window size in logical pixels.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self
    }

    /// Present with vsync (on by default).
    #[must_use]
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.config.vsync = vsync;
        self
    }

    #[must_use]
    pub fn with_fixed_timestep(mut self, step: Duration) -> Self {
        self.config.fixed_timestep = step;
        self
    }

    #[must_use]
    pub fn with_max_frame_delta(mut self, max: Duration) -> Self {
        self.config.max_frame_delta = max;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Open the window and drive `game` until it is closed, Escape is pressed
    /// or the game calls [`EngineContext::request_exit`].
    pub fn run<G: Game + 'static>(self, mut game: G) -> Result<()> {
        let config = self.config;

        let event_loop = EventLoop::new()?;
        let mut window_attributes = Window::default_attributes();
        window_attributes.title = config.title.clone();
        window_attributes.inner_size = Some(LogicalSize::new(config.width, config.height).into());
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let surface_size = window.inner_size();
        let surface = SurfaceTexture::new(surface_size.width, surface_size.height, Arc::clone(&window));
        let mut pixels = PixelsBuilder::new(config.width, config.height, surface)
            .enable_vsync(config.vsync)
            .build()?;

        let mut ctx = EngineContext::new(&config);
        game.init(&mut ctx)?;
        log::info!("engine started: {}x{}", config.width, config.height);

        let mut last_frame = Instant::now();
        event_loop.run(move |event, elwt| match event {
            Event::NewEvents(_) => {
                ctx.begin_frame();
            }
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if is_escape_pressed(&event) {
                        elwt.exit();
                    }
                    ctx.input.handle_key(&event);
                }
                WindowEvent::Resized(new_size) => {
                    if new_size.width == 0 || new_size.height == 0 {
                        return;
                    }
                    if let Err(err) = pixels.resize_surface(new_size.width, new_size.height) {
                        log::error!("failed to resize surface: {err}");
                        elwt.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let drawn = Canvas::new(pixels.frame_mut(), config.width, config.height)
                        .and_then(|mut canvas| game.draw(&ctx, &mut canvas));
                    if let Err(err) = drawn {
                        log::error!("encountered error during draw: {err:?}");
                        elwt.exit();
                        return;
                    }
                    if let Err(err) = pixels.render() {
                        log::error!("failed to present frame: {err}");
                        elwt.exit();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                let now = Instant::now();
                ctx.advance(now - last_frame);
                last_frame = now;

                if let Err(err) = game.update(&mut ctx) {
                    log::error!("encountered error during update: {err:?}");
                    elwt.exit();
                    return;
                }

                if ctx.exit_requested {
                    elwt.exit();
                    return;
                }
                if std::mem::take(&mut ctx.fullscreen_requested) {
                    toggle_fullscreen(&window);
                }

                window.request_redraw();
            }
            _ => {}
        })
        .map_err(|err| anyhow!("event loop terminated: {err}"))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn is_escape_pressed(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
        && matches!(event.physical_key, PhysicalKey::Code(KeyCode::Escape))
}

fn toggle_fullscreen(window: &Window) {
    if window.fullscreen().is_some() {
        window.set_fullscreen(None);
        return;
    }
    match window.current_monitor() {
        Some(monitor) => window.set_fullscreen(Some(Fullscreen::Borderless(Some(monitor)))),
        None => log::warn!("fullscreen unavailable: no monitor reported for the window"),
    }
}

/// Clock, input and requests handed to the game every frame.
#[derive(Debug)]
pub struct EngineContext {
    delta_time: Duration,
    elapsed_time: Duration,
    fixed_delta_time: Duration,
    fixed_time_accumulator: Duration,
    max_frame_delta: Duration,
    screen_size: Vec2,
    exit_requested: bool,
    fullscreen_requested: bool,
    input: InputState,
}

impl EngineContext {
    fn new(config: &EngineConfig) -> Self {
        Self {
            delta_time: Duration::ZERO,
            elapsed_time: Duration::ZERO,
            fixed_delta_time: config.fixed_timestep,
            fixed_time_accumulator: Duration::ZERO,
            max_frame_delta: config.max_frame_delta,
            screen_size: Vec2::new(config.width as f32, config.height as f32),
            exit_requested: false,
            fullscreen_requested: false,
            input: InputState::new(),
        }
    }

    /// A context with no window behind it, driven by [`advance`](Self::advance).
    pub fn headless(config: &EngineConfig) -> Self {
        Self::new(config)
    }

    /// Clear per-frame input edges. The window loop does this before
    /// delivering the frame's key events.
    pub fn begin_frame(&mut self) {
        self.input.begin_frame();
    }

    /// Advance the clock by one frame. The delta is clamped to the
    /// configured maximum.
    pub fn advance(&mut self, delta: Duration) {
        let delta = delta.min(self.max_frame_delta);
        self.delta_time = delta;
        self.elapsed_time += delta;
        self.fixed_time_accumulator += delta;
    }

    /// Time since the previous frame, after clamping.
    pub fn delta_time(&self) -> Duration {
        self.delta_time
    }

    /// Total simulated time since the engine started running.
    pub fn elapsed_time(&self) -> Duration {
        self.elapsed_time
    }

    /// Length of one fixed step.
    pub fn fixed_delta_time(&self) -> Duration {
        self.fixed_delta_time
    }

    /// Consume one fixed step from the accumulator, if a whole one is
    /// available. Loop on it to catch up after a long frame.
    pub fn should_run_fixed_update(&mut self) -> bool {
        if self.fixed_time_accumulator >= self.fixed_delta_time && !self.fixed_delta_time.is_zero() {
            self.fixed_time_accumulator -= self.fixed_delta_time;
            true
        } else {
            false
        }
    }

    /// Frame buffer size in pixels.
    pub fn screen_size(&self) -> Vec2 {
        self.screen_size
    }

    /// Keyboard state for this frame.
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Programmatic input, used by tests and replays.
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Close the window once this frame is done.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Ask the window to enter or leave fullscreen after this frame.
    /// Failures are logged by the engine and never reported back.
    pub fn request_fullscreen_toggle(&mut self) {
        self.fullscreen_requested = true;
    }

    pub fn fullscreen_toggle_pending(&self) -> bool {
        self.fullscreen_requested
    }
}

/// Hooks the engine calls into.
pub trait Game {
    /// Runs once, before the first update.
    fn init(&mut self, _ctx: &mut EngineContext) -> Result<()> {
        Ok(())
    }

    /// Runs once per frame.
    fn update(&mut self, ctx: &mut EngineContext) -> Result<()>;

    /// Renders into the frame buffer after `update`.
    fn draw(&mut self, ctx: &EngineContext, canvas: &mut Canvas<'_>) -> Result<()>;
}

/// Transitions requested during a frame are applied before the next update.
impl Game for crate::state::StateMachine {
    fn init(&mut self, ctx: &mut EngineContext) -> Result<()> {
        self.init_top_state(ctx)?;
        self.apply_transitions(ctx)?;
        Ok(())
    }

    fn update(&mut self, ctx: &mut EngineContext) -> Result<()> {
        self.apply_transitions(ctx)?;
        self.update_top(ctx)?;
        Ok(())
    }

    fn draw(&mut self, _ctx: &EngineContext, canvas: &mut Canvas<'_>) -> Result<()> {
        // bottom to top, so states below a pushed overlay stay visible
        self.draw_all(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_delta_is_clamped() {
        let mut ctx = EngineContext::headless(&EngineConfig::default());
        ctx.advance(Duration::from_secs(3));
        assert_eq!(ctx.delta_time(), Duration::from_millis(250));
        assert_eq!(ctx.elapsed_time(), Duration::from_millis(250));
    }

    #[test]
    fn fixed_updates_consume_accumulator() {
        let config = EngineConfig {
            fixed_timestep: Duration::from_millis(10),
            ..EngineConfig::default()
        };
        let mut ctx = EngineContext::headless(&config);
        ctx.advance(Duration::from_millis(35));

        let mut steps = 0;
        while ctx.should_run_fixed_update() {
            steps += 1;
        }
        assert_eq!(steps, 3);

        ctx.advance(Duration::from_millis(5));
        assert!(ctx.should_run_fixed_update());
    }

    #[test]
    fn fullscreen_request_is_a_flag() {
        let mut ctx = EngineContext::headless(&EngineConfig::default());
        assert!(!ctx.fullscreen_toggle_pending());
        ctx.request_fullscreen_toggle();
        assert!(ctx.fullscreen_toggle_pending());
    }
}
