//! Capability facade between running procedures and the object they animate.
//!
//! The scheduler never talks to a renderer. Hosts implement [`Animatable`] for
//! each concrete object variant (sprite, text, mesh, ...) and procedures reach
//! the object only through this trait. [`ObjectState`] is a headless
//! implementation for hosts without a render backend.

use serde::{Deserialize, Serialize};

/// (x, y, z)
pub type Vec3 = [f32; 3];
/// RGBA in 0..1
pub type Color = [f32; 4];

/// Transform/appearance accessors a procedure may use on its target.
pub trait Animatable {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);

    /// Euler angles in radians.
    fn rotation(&self) -> Vec3;
    fn set_rotation(&mut self, rotation: Vec3);

    fn size(&self) -> Vec3;
    fn set_size(&mut self, size: Vec3);

    fn color(&self) -> Color;
    fn set_color(&mut self, color: Color);

    /// 0 = opaque, 1 = fully transparent.
    fn transparency(&self) -> f32;
    fn set_transparency(&mut self, transparency: f32);

    fn is_visible(&self) -> bool;
    fn set_visible(&mut self, visible: bool);

    fn increment_position(&mut self, delta: Vec3) {
        let p = self.position();
        self.set_position(add3(p, delta));
    }

    fn increment_rotation(&mut self, delta: Vec3) {
        let r = self.rotation();
        self.set_rotation(add3(r, delta));
    }

    fn increment_size(&mut self, delta: Vec3) {
        let s = self.size();
        self.set_size(add3(s, delta));
    }

    fn increment_transparency(&mut self, delta: f32) {
        let t = self.transparency();
        self.set_transparency((t + delta).clamp(0.0, 1.0));
    }
}

#[inline]
pub(crate) fn add3(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub(crate) fn scale3(a: Vec3, s: f32) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub(crate) fn lerp4(a: Color, b: Color, t: f32) -> Color {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}

/// Plain in-memory object state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectState {
    pub position: Vec3,
    pub rotation: Vec3,
    pub size: Vec3,
    pub color: Color,
    pub transparency: f32,
    pub visible: bool,
}

impl Default for ObjectState {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            size: [1.0; 3],
            color: [1.0; 4],
            transparency: 0.0,
            visible: true,
        }
    }
}

impl Animatable for ObjectState {
    fn position(&self) -> Vec3 {
        self.position
    }
    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }
    fn rotation(&self) -> Vec3 {
        self.rotation
    }
    fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
    }
    fn size(&self) -> Vec3 {
        self.size
    }
    fn set_size(&mut self, size: Vec3) {
        self.size = size;
    }
    fn color(&self) -> Color {
        self.color
    }
    fn set_color(&mut self, color: Color) {
        self.color = color;
    }
    fn transparency(&self) -> f32 {
        self.transparency
    }
    fn set_transparency(&mut self, transparency: f32) {
        self.transparency = transparency;
    }
    fn is_visible(&self) -> bool {
        self.visible
    }
    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}
