use std::collections::{HashMap, HashSet};

use winit::{
    event::{ElementState, KeyEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// Tracks keyboard state across frames.
///
/// `pressed` and `released` are edges: they are only true during the frame in
/// which the key changed state. Holding a key keeps it `down` but never
/// re-reports it as pressed.
#[derive(Debug, Default)]
pub struct InputState {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget this frame's edges.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
    }

    /// Feed a winit key event.
    pub fn handle_key(&mut self, event: &KeyEvent) {
        if let PhysicalKey::Code(keycode) = event.physical_key {
            match event.state {
                ElementState::Pressed => self.press_key(keycode),
                ElementState::Released => self.release_key(keycode),
            }
        }
    }

    /// Record a key going down. OS key repeat does not produce a new edge.
    pub fn press_key(&mut self, key: KeyCode) {
        if self.keys_down.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    /// Record a key going up.
    pub fn release_key(&mut self, key: KeyCode) {
        if self.keys_down.remove(&key) {
            self.keys_released.insert(key);
        }
    }

    /// Held right now.
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Went down this frame.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Went up this frame.
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }
}

/// Named action such as `"jump"`, bound to any number of keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ActionId(pub String);

impl ActionId {
    pub fn new(name: impl Into<String>) -> Self {
        ActionId(name.into())
    }
}

impl From<&str> for ActionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Two key sets pulling a value toward -1 and +1.
#[derive(Clone, Debug)]
pub struct AxisBinding {
    /// Pull toward -1.
    pub negative: Vec<KeyCode>,
    /// Pull toward +1.
    pub positive: Vec<KeyCode>,
}

impl AxisBinding {
    pub fn new(negative: Vec<KeyCode>, positive: Vec<KeyCode>) -> Self {
        Self { negative, positive }
    }
}

/// Key bindings for actions and axes.
#[derive(Clone, Debug, Default)]
pub struct InputMap {
    actions: HashMap<ActionId, Vec<KeyCode>>,
    axes: HashMap<ActionId, AxisBinding>,
}

impl InputMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a key to an action. An action may have any number of keys.
    pub fn bind_key(&mut self, action: impl Into<ActionId>, key: KeyCode) {
        self.actions.entry(action.into()).or_default().push(key);
    }

    /// Define or replace an axis binding.
    pub fn set_axis(&mut self, axis: impl Into<ActionId>, binding: AxisBinding) {
        self.axes.insert(axis.into(), binding);
    }

    pub fn keys_for(&self, action: &ActionId) -> &[KeyCode] {
        self.actions.get(action).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if any bound key is held.
    pub fn action_down(&self, input: &InputState, action: &ActionId) -> bool {
        self.keys_for(action).iter().any(|&k| input.is_key_down(k))
    }

    /// True if any bound key had a rising edge this frame.
    ///
    /// Each key is edge-triggered on its own, so holding one bound key does
    /// not mask a fresh press of another.
    pub fn action_pressed(&self, input: &InputState, action: &ActionId) -> bool {
        self.keys_for(action).iter().any(|&k| input.is_key_pressed(k))
    }

    /// Value of an axis in `[-1.0, 1.0]`. Opposing keys cancel out.
    pub fn axis(&self, input: &InputState, axis: &ActionId) -> f32 {
        let Some(binding) = self.axes.get(axis) else {
            return 0.0;
        };
        let mut value = 0.0;
        if binding.negative.iter().any(|&k| input.is_key_down(k)) {
            value -= 1.0;
        }
        if binding.positive.iter().any(|&k| input.is_key_down(k)) {
            value += 1.0;
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_is_an_edge_not_a_level() {
        let mut input = InputState::new();
        input.press_key(KeyCode::Space);
        assert!(input.is_key_pressed(KeyCode::Space));

        input.begin_frame();
        input.press_key(KeyCode::Space); // key repeat while held
        assert!(input.is_key_down(KeyCode::Space));
        assert!(!input.is_key_pressed(KeyCode::Space));

        input.release_key(KeyCode::Space);
        assert!(input.is_key_released(KeyCode::Space));
    }

    #[test]
    fn held_key_does_not_block_other_binding() {
        let mut map = InputMap::new();
        let jump = ActionId::new("jump");
        map.bind_key(jump.clone(), KeyCode::Space);
        map.bind_key(jump.clone(), KeyCode::ArrowUp);

        let mut input = InputState::new();
        input.press_key(KeyCode::Space);
        assert!(map.action_pressed(&input, &jump));

        input.begin_frame();
        assert!(!map.action_pressed(&input, &jump));
        input.press_key(KeyCode::ArrowUp);
        assert!(map.action_pressed(&input, &jump));
    }

    #[test]
    fn axis_cancels_opposites() {
        let mut map = InputMap::new();
        map.set_axis(
            "horizontal",
            AxisBinding::new(vec![KeyCode::KeyA], vec![KeyCode::KeyD]),
        );
        let axis = ActionId::new("horizontal");

        let mut input = InputState::new();
        input.press_key(KeyCode::KeyA);
        assert_eq!(map.axis(&input, &axis), -1.0);
        input.press_key(KeyCode::KeyD);
        assert_eq!(map.axis(&input, &axis), 0.0);
    }
}
