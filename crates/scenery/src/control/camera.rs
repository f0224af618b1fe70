use std::mem::size_of;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use super::BindingSet;

/// Initial camera placement and projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view, in degrees.
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Camera buffer contents. 192 bytes, std140-compatible.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub position: [f32; 4],
    pub target: [f32; 4],
    pub up: [f32; 4],
    /// fov_y (radians), aspect, near, far.
    pub params: [f32; 4],
}

const _: [(); 192] = [(); size_of::<CameraUniform>()];

/// Look-at camera with a right-handed perspective projection (depth 0..1).
#[derive(Debug)]
pub struct Camera {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    bindings: Option<BindingSet>,
}

impl Camera {
    pub const SIZE: u64 = size_of::<CameraUniform>() as u64;

    pub fn new(config: CameraConfig) -> Self {
        Self {
            position: config.position,
            target: config.target,
            up: config.up,
            fov_y: config.fov_y_degrees.to_radians(),
            aspect: 1.0,
            near: config.near,
            far: config.far,
            bindings: None,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Zero-height viewports keep the previous aspect.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn set_perspective(&mut self, fov_y_degrees: f32, near: f32, far: f32) {
        self.fov_y = fov_y_degrees.to_radians();
        self.near = near;
        self.far = far;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view: self.view().to_cols_array_2d(),
            proj: self.projection().to_cols_array_2d(),
            position: self.position.extend(1.0).to_array(),
            target: self.target.extend(1.0).to_array(),
            up: self.up.extend(0.0).to_array(),
            params: [self.fov_y, self.aspect, self.near, self.far],
        }
    }

    pub fn bindings(&self) -> Option<&BindingSet> {
        self.bindings.as_ref()
    }

    pub(crate) fn attach(&mut self, bindings: BindingSet) {
        self.bindings = Some(bindings);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn uniform_layout_offsets() {
        let cam = Camera::default();
        let u = cam.uniform();
        let bytes = bytemuck::bytes_of(&u);
        assert_eq!(bytes.len(), 192);

        let position: [f32; 4] = bytemuck::pod_read_unaligned(&bytes[128..144]);
        let up: [f32; 4] = bytemuck::pod_read_unaligned(&bytes[160..176]);
        let params: [f32; 4] = bytemuck::pod_read_unaligned(&bytes[176..192]);
        assert_eq!(position, [0.0, 0.0, 5.0, 1.0]);
        assert_eq!(up, [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(params[1..], [1.0, 0.1, 1000.0]);
        assert!((params[0] - 45f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn view_moves_eye_to_origin() {
        let cam = Camera::default();
        let eye = cam.view() * Vec4::new(0.0, 0.0, 5.0, 1.0);
        assert!(eye.truncate().length() < 1e-5);
    }

    #[test]
    fn viewport_sets_aspect_and_ignores_zero() {
        let mut cam = Camera::default();
        cam.set_viewport(1600, 800);
        assert_eq!(cam.aspect(), 2.0);
        cam.set_viewport(0, 800);
        assert_eq!(cam.aspect(), 2.0);
    }
}
