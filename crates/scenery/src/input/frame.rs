use std::collections::HashSet;

use winit::keyboard::KeyCode;

use super::platform::key_code;
use super::types::MouseButton;

/// Transitions since the last redraw.
#[derive(Debug, Default)]
pub struct InputFrame {
    pub codes_pressed: HashSet<u32>,
    pub buttons_pressed: HashSet<MouseButton>,
    /// Wheel movement summed over the frame.
    pub wheel: (f32, f32),
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.codes_pressed.clear();
        self.buttons_pressed.clear();
        self.wheel = (0.0, 0.0);
    }

    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.codes_pressed.contains(&key_code(key))
    }
}
