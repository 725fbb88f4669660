use arcade2d::{AxisBinding, InputMap, KeyCode};

pub const MOVE: &str = "move";
pub const JUMP: &str = "jump";
pub const FULLSCREEN: &str = "fullscreen";

/// Arrow keys and WASD for movement, Space/Up/W to jump, F for fullscreen.
pub fn default_bindings() -> InputMap {
    let mut map = InputMap::new();
    map.set_axis(
        MOVE,
        AxisBinding::new(
            vec![KeyCode::ArrowLeft, KeyCode::KeyA],
            vec![KeyCode::ArrowRight, KeyCode::KeyD],
        ),
    );
    for key in [KeyCode::Space, KeyCode::ArrowUp, KeyCode::KeyW] {
        map.bind_key(JUMP, key);
    }
    map.bind_key(FULLSCREEN, KeyCode::KeyF);
    map
}
