use std::collections::HashSet;

use winit::keyboard::KeyCode;

use super::frame::InputFrame;
use super::platform::key_code;
use super::types::{InputEvent, MouseButton};

/// Held keys and buttons plus the last pointer position, for one window.
#[derive(Debug, Default)]
pub struct InputState {
    pub focused: bool,
    /// Logical pixels; `None` while the pointer is outside the window.
    pub pointer_pos: Option<(f32, f32)>,
    /// Codes of held keys.
    pub codes_down: HashSet<u32>,
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies `ev` and records transitions into `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match ev {
            InputEvent::Focused(f) => {
                self.focused = f;
                // Releases are lost while unfocused.
                if !f {
                    self.codes_down.clear();
                    self.buttons_down.clear();
                }
            }
            InputEvent::PointerMoved { x, y } => self.pointer_pos = Some((x, y)),
            InputEvent::PointerLeft => self.pointer_pos = None,
            InputEvent::Key { code, pressed: true } => {
                if self.codes_down.insert(code) {
                    frame.codes_pressed.insert(code);
                }
            }
            InputEvent::Key { code, pressed: false } => {
                self.codes_down.remove(&code);
            }
            InputEvent::Button { button, pressed: true } => {
                if self.buttons_down.insert(button) {
                    frame.buttons_pressed.insert(button);
                }
            }
            InputEvent::Button { button, pressed: false } => {
                self.buttons_down.remove(&button);
            }
            InputEvent::Wheel { x, y } => {
                frame.wheel.0 += x;
                frame.wheel.1 += y;
            }
        }
    }

    pub fn key_down(&self, key: KeyCode) -> bool {
        self.codes_down.contains(&key_code(key))
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }

    /// Shader button mask of everything held.
    pub fn button_mask(&self) -> u32 {
        self.buttons_down.iter().fold(0, |acc, b| acc | b.bit())
    }
}
