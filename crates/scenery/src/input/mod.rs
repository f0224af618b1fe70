//! Input capture.
//!
//! Window events are translated once into [`InputEvent`]s. [`InputState`]
//! tracks what is held; [`InputFrame`] collects what happened since the last
//! redraw. Both feed [`Signal::capture`](crate::control::Signal::capture).
//! Keys are identified by winit [`KeyCode`], the same index shaders see.

mod frame;
mod platform;
mod state;
mod types;

pub use frame::InputFrame;
pub use platform::{key_code, translate_window_event};
pub use state::InputState;
pub use types::{InputEvent, MouseButton};
pub use winit::keyboard::KeyCode;
