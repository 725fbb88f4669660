use arcade2d::EventBus;

/// Signals broadcast between the player, the enemies and the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameEvent {
    PlayerDead,
}

/// The session-scoped bus every entity of a play scene shares.
pub type GameEvents = EventBus<GameEvent>;
