//! Frame timing. One [`FrameClock`] per loop; its [`FrameTime`] becomes the
//! tick block of the shader signal.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
