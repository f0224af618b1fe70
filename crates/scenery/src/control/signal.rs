use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::input::{InputFrame, InputState};
use crate::time::FrameTime;

use super::BindingSet;

/// Pointer state as seen by shaders. 36 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct MouseInfo {
    pub x: f32,
    pub y: f32,
    pub prev_x: f32,
    pub prev_y: f32,
    /// Held buttons: left 1, right 2, middle 4, back 8, forward 16.
    pub buttons: u32,
    /// Wheel movement accumulated over the frame.
    pub wheel_x: f32,
    pub wheel_y: f32,
    pub _reserved: [u32; 2],
}

/// Held keys as a 256-bit set indexed by platform key code.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct KeyInfo {
    pub bits: [u8; 32],
}

impl KeyInfo {
    pub const CAPACITY: u32 = 256;

    /// Codes at or above [`KeyInfo::CAPACITY`] are ignored.
    pub fn set(&mut self, code: u32, pressed: bool) {
        if code >= Self::CAPACITY {
            return;
        }
        let (byte, bit) = ((code / 8) as usize, code % 8);
        if pressed {
            self.bits[byte] |= 1 << bit;
        } else {
            self.bits[byte] &= !(1 << bit);
        }
    }

    pub fn is_set(&self, code: u32) -> bool {
        code < Self::CAPACITY && self.bits[(code / 8) as usize] & (1 << (code % 8)) != 0
    }

    pub fn clear(&mut self) {
        self.bits = [0; 32];
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct TickInfo {
    pub frame_count: u32,
    pub delta_time: f32,
}

/// The whole signal buffer, uploaded verbatim.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct SignalData {
    pub mouse: MouseInfo,
    pub keys: KeyInfo,
    pub tick: TickInfo,
}

const _: [(); 36] = [(); size_of::<MouseInfo>()];
const _: [(); 32] = [(); size_of::<KeyInfo>()];
const _: [(); 8] = [(); size_of::<TickInfo>()];
const _: [(); 76] = [(); size_of::<SignalData>()];

pub const MOUSE_OFFSET: usize = offset_of!(SignalData, mouse);
pub const KEY_OFFSET: usize = offset_of!(SignalData, keys);
pub const TICK_OFFSET: usize = offset_of!(SignalData, tick);

/// Per-frame input snapshot shared with shaders through bind group slot 0.
#[derive(Debug, Default)]
pub struct Signal {
    data: SignalData,
    bindings: Option<BindingSet>,
}

impl Signal {
    pub const SIZE: u64 = size_of::<SignalData>() as u64;

    pub fn new() -> Self {
        Self::default()
    }

    /// Refreshes the snapshot from the current input state and frame timing.
    pub fn capture(&mut self, input: &InputState, frame: &InputFrame, time: FrameTime) {
        let mouse = &mut self.data.mouse;
        mouse.prev_x = mouse.x;
        mouse.prev_y = mouse.y;
        if let Some((x, y)) = input.pointer_pos {
            mouse.x = x;
            mouse.y = y;
        }

        mouse.buttons = input.button_mask();
        (mouse.wheel_x, mouse.wheel_y) = frame.wheel;

        self.data.keys.clear();
        for code in &input.codes_down {
            self.data.keys.set(*code, true);
        }

        self.data.tick = TickInfo {
            frame_count: time.frame_index as u32,
            delta_time: time.dt,
        };
    }

    pub fn data(&self) -> &SignalData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut SignalData {
        &mut self.data
    }

    pub fn bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.data)
    }

    pub fn bindings(&self) -> Option<&BindingSet> {
        self.bindings.as_ref()
    }

    pub(crate) fn attach(&mut self, bindings: BindingSet) {
        self.bindings = Some(bindings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{key_code, InputEvent, KeyCode, MouseButton};
    use crate::time::FrameClock;

    fn f32_at(bytes: &[u8], offset: usize) -> f32 {
        bytemuck::pod_read_unaligned(&bytes[offset..offset + 4])
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        bytemuck::pod_read_unaligned(&bytes[offset..offset + 4])
    }

    #[test]
    fn offsets_match_buffer_contract() {
        assert_eq!((MOUSE_OFFSET, KEY_OFFSET, TICK_OFFSET), (0, 36, 68));
        assert_eq!(Signal::SIZE, 76);
        assert_eq!(offset_of!(MouseInfo, buttons), 16);
    }

    #[test]
    fn key_bits_are_little_endian_per_byte() {
        let mut keys = KeyInfo::default();
        keys.set(0, true);
        keys.set(9, true);
        keys.set(255, true);
        keys.set(256, true);
        assert_eq!(keys.bits[0], 0b1);
        assert_eq!(keys.bits[1], 0b10);
        assert_eq!(keys.bits[31], 0b1000_0000);
        assert!(keys.is_set(9));
        assert!(!keys.is_set(256));

        keys.set(9, false);
        assert!(!keys.is_set(9));
    }

    #[test]
    fn capture_packs_pointer_buttons_keys_and_tick() {
        let mut input = InputState::default();
        let mut frame = InputFrame::default();
        input.apply_event(&mut frame, InputEvent::PointerMoved { x: 10.0, y: 20.0 });

        let mut signal = Signal::new();
        let mut clock = FrameClock::new();
        signal.capture(&input, &frame, clock.tick());

        input.apply_event(&mut frame, InputEvent::PointerMoved { x: 30.0, y: 40.0 });
        input.apply_event(
            &mut frame,
            InputEvent::Button {
                button: MouseButton::Right,
                pressed: true,
            },
        );
        let code = key_code(KeyCode::KeyA);
        input.apply_event(&mut frame, InputEvent::Key { code, pressed: true });
        input.apply_event(&mut frame, InputEvent::Wheel { x: 0.0, y: -1.5 });
        let time = clock.tick();
        signal.capture(&input, &frame, time);

        let bytes = signal.bytes();
        assert_eq!(bytes.len(), 76);
        assert_eq!(f32_at(bytes, 0), 30.0);
        assert_eq!(f32_at(bytes, 4), 40.0);
        assert_eq!(f32_at(bytes, 8), 10.0);
        assert_eq!(f32_at(bytes, 12), 20.0);
        assert_eq!(u32_at(bytes, 16), 2);
        assert_eq!(f32_at(bytes, 24), -1.5);
        assert_eq!(bytes[KEY_OFFSET + code as usize / 8], 1u8 << (code % 8));
        assert_eq!(u32_at(bytes, TICK_OFFSET), 1);
        assert_eq!(f32_at(bytes, TICK_OFFSET + 4), time.dt);
    }
}
