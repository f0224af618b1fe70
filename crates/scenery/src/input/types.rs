/// Mouse buttons the signal buffer tracks.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

impl MouseButton {
    /// Bit in the shader button mask; 0 for buttons without one.
    pub fn bit(self) -> u32 {
        match self {
            MouseButton::Left => 1,
            MouseButton::Right => 2,
            MouseButton::Middle => 4,
            MouseButton::Back => 8,
            MouseButton::Forward => 16,
            MouseButton::Other(_) => 0,
        }
    }
}

/// Window input, reduced to what the signal buffer records.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    /// `code` indexes the shader key bitset.
    Key { code: u32, pressed: bool },
    /// Logical pixels.
    PointerMoved { x: f32, y: f32 },
    PointerLeft,
    Button { button: MouseButton, pressed: bool },
    /// Lines for notched wheels, logical pixels for touchpads.
    Wheel { x: f32, y: f32 },
    Focused(bool),
}
