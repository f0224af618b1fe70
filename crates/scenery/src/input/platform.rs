use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::Window;

use super::types::{InputEvent, MouseButton};

/// Translates a winit window event. `None` for events the signal buffer
/// ignores, including keys winit cannot identify.
pub fn translate_window_event(window: &Window, event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::Focused(f) => Some(InputEvent::Focused(*f)),
        WindowEvent::CursorLeft { .. } => Some(InputEvent::PointerLeft),
        WindowEvent::CursorMoved { position, .. } => {
            let (x, y) = to_logical(window, *position);
            Some(InputEvent::PointerMoved { x, y })
        }
        WindowEvent::MouseInput { state, button, .. } => Some(InputEvent::Button {
            button: map_mouse_button(*button),
            pressed: *state == ElementState::Pressed,
        }),
        WindowEvent::MouseWheel { delta, .. } => {
            let (x, y) = match delta {
                MouseScrollDelta::LineDelta(x, y) => (*x, *y),
                MouseScrollDelta::PixelDelta(p) => to_logical(window, *p),
            };
            Some(InputEvent::Wheel { x, y })
        }
        WindowEvent::KeyboardInput { event, .. } => match event.physical_key {
            PhysicalKey::Code(code) => Some(InputEvent::Key {
                code: key_code(code),
                pressed: event.state == ElementState::Pressed,
            }),
            PhysicalKey::Unidentified(_) => None,
        },
        _ => None,
    }
}

/// Index of `key` in the shader key bitset: the winit `KeyCode`
/// discriminant, which stays below 256.
pub fn key_code(key: KeyCode) -> u32 {
    key as u32
}

fn to_logical(window: &Window, pos: PhysicalPosition<f64>) -> (f32, f32) {
    let logical = pos.to_logical::<f64>(window.scale_factor());
    (logical.x as f32, logical.y as f32)
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_fits_the_key_bitset() {
        for code in [KeyCode::KeyA, KeyCode::F35, KeyCode::Escape, KeyCode::NumpadEnter] {
            assert!(key_code(code) < 256, "{code:?} -> {}", key_code(code));
        }
    }

    #[test]
    fn distinct_keys_get_distinct_codes() {
        assert_ne!(key_code(KeyCode::ShiftLeft), key_code(KeyCode::ShiftRight));
        assert_ne!(key_code(KeyCode::Enter), key_code(KeyCode::NumpadEnter));
    }
}
