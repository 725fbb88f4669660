//! Stack of scenes (preload, play, pause overlays, ...).

use anyhow::Result;

use crate::engine::EngineContext;
use crate::render::Canvas;

/// What a state may ask of the stack while it is updating.
pub trait StateMachineLike {
    fn push(&mut self, state: Box<dyn State>);
    fn pop(&mut self);
    /// Swap the running state for another one.
    fn replace(&mut self, state: Box<dyn State>);
}

/// A scene managed by a [`StateMachine`].
pub trait State {
    /// Called when this state becomes part of the stack.
    fn on_enter(&mut self, _ctx: &mut EngineContext) -> Result<()> {
        Ok(())
    }

    /// Called when this state leaves the stack.
    fn on_exit(&mut self, _ctx: &mut EngineContext) -> Result<()> {
        Ok(())
    }

    /// Called every frame while this state is on top.
    fn update(&mut self, ctx: &mut EngineContext, state_machine: &mut dyn StateMachineLike) -> Result<()>;

    /// Called every frame for every state on the stack, bottom first.
    fn draw(&mut self, canvas: &mut Canvas<'_>) -> Result<()>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "state"
    }
}

enum Transition {
    Push(Box<dyn State>),
    Pop,
    Replace(Box<dyn State>),
}

/// Transitions requested during an update, applied in request order at the
/// start of the next frame.
#[derive(Default)]
struct Transitions(Vec<Transition>);

impl StateMachineLike for Transitions {
    fn push(&mut self, state: Box<dyn State>) {
        self.0.push(Transition::Push(state));
    }

    fn pop(&mut self) {
        self.0.push(Transition::Pop);
    }

    fn replace(&mut self, state: Box<dyn State>) {
        self.0.push(Transition::Replace(state));
    }
}

/// Only the top state is updated; every state is drawn.
#[derive(Default)]
pub struct StateMachine {
    stack: Vec<Box<dyn State>>,
    pending: Transitions,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Its `on_enter` runs in `Game::init` (or [`init_top_state`](Self::init_top_state)).
    pub fn with_initial_state(initial: Box<dyn State>) -> Self {
        Self {
            stack: vec![initial],
            pending: Transitions::default(),
        }
    }

    pub fn push(&mut self, state: Box<dyn State>) {
        self.pending.push(state);
    }

    pub fn pop(&mut self) {
        self.pending.pop();
    }

    pub fn replace(&mut self, state: Box<dyn State>) {
        self.pending.replace(state);
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Name of the state currently receiving updates.
    pub fn top_name(&self) -> Option<&str> {
        self.stack.last().map(|s| s.name())
    }

    pub fn apply_transitions(&mut self, ctx: &mut EngineContext) -> Result<()> {
        for transition in std::mem::take(&mut self.pending.0) {
            match transition {
                Transition::Push(mut state) => {
                    state.on_enter(ctx)?;
                    log::debug!("state `{}` pushed", state.name());
                    self.stack.push(state);
                }
                Transition::Pop => {
                    if let Some(mut state) = self.stack.pop() {
                        state.on_exit(ctx)?;
                        log::debug!("state `{}` popped", state.name());
                    }
                }
                Transition::Replace(mut state) => {
                    if let Some(mut old) = self.stack.pop() {
                        old.on_exit(ctx)?;
                        log::debug!("state `{}` replaced by `{}`", old.name(), state.name());
                    }
                    state.on_enter(ctx)?;
                    self.stack.push(state);
                }
            }
        }
        Ok(())
    }

    pub fn update_top(&mut self, ctx: &mut EngineContext) -> Result<()> {
        match self.stack.last_mut() {
            Some(state) => state.update(ctx, &mut self.pending),
            None => Ok(()),
        }
    }

    pub fn draw_all(&mut self, canvas: &mut Canvas<'_>) -> Result<()> {
        self.stack.iter_mut().try_for_each(|state| state.draw(canvas))
    }

    pub fn init_top_state(&mut self, ctx: &mut EngineContext) -> Result<()> {
        match self.stack.last_mut() {
            Some(state) => state.on_enter(ctx),
            None => Ok(()),
        }
    }
}
