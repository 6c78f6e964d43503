//! Transform effects: wait, move, rotate, scale and shake.

use serde::Deserialize;

use super::Effect;
use crate::facade::{add3, scale3, Animatable, Vec3};

fn one_tick() -> u32 {
    1
}

/// Does nothing for `ticks` ticks per pass (default 1).
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Wait {
    #[serde(default = "one_tick")]
    ticks: u32,
}

impl Effect for Wait {
    fn ticks(&self) -> u32 {
        self.ticks.max(1)
    }
    fn capture(&mut self, _target: &dyn Animatable) {}
    fn apply(&mut self, _target: &mut dyn Animatable, _tick: u32, _ticks: u32) {}
    fn reset(&mut self, _target: &mut dyn Animatable) {}
}

/// Generates a relative transform effect: every pass adds `delta`, spread
/// evenly over `ticks` ticks.
macro_rules! relative_effect {
    ($(#[$doc:meta])* $name:ident, $get:ident, $set:ident, $inc:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, Deserialize)]
        #[serde(deny_unknown_fields)]
        pub struct $name {
            delta: Vec3,
            #[serde(default = "one_tick")]
            ticks: u32,
            #[serde(skip)]
            start: Vec3,
        }

        impl Effect for $name {
            fn ticks(&self) -> u32 {
                self.ticks.max(1)
            }
            fn capture(&mut self, target: &dyn Animatable) {
                self.start = target.$get();
            }
            fn apply(&mut self, target: &mut dyn Animatable, _tick: u32, ticks: u32) {
                target.$inc(scale3(self.delta, 1.0 / ticks as f32));
            }
            fn reset(&mut self, target: &mut dyn Animatable) {
                target.$set(self.start);
            }
        }
    };
}

relative_effect!(
    /// `{ "delta": [x, y, z], "ticks": n }`: translate by `delta` per pass.
    MoveBy,
    position,
    set_position,
    increment_position
);
relative_effect!(
    /// `{ "delta": [x, y, z], "ticks": n }`: rotate by `delta` radians per pass.
    RotateBy,
    rotation,
    set_rotation,
    increment_rotation
);
relative_effect!(
    /// `{ "delta": [x, y, z], "ticks": n }`: grow by `delta` per pass.
    ScaleBy,
    size,
    set_size,
    increment_size
);

fn shake_ticks() -> u32 {
    8
}

fn shake_amplitude() -> Vec3 {
    [0.1, 0.1, 0.0]
}

/// `{ "amplitude": [x, y, z], "ticks": n }`: jitter around the captured
/// position with a decaying alternating offset, landing back on it at the end
/// of every pass. Defaults to a small 8-tick shake in the x/y plane.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Shake {
    #[serde(default = "shake_amplitude")]
    amplitude: Vec3,
    #[serde(default = "shake_ticks")]
    ticks: u32,
    #[serde(skip)]
    origin: Vec3,
}

impl Effect for Shake {
    fn ticks(&self) -> u32 {
        self.ticks.max(1)
    }

    fn capture(&mut self, target: &dyn Animatable) {
        self.origin = target.position();
    }

    fn apply(&mut self, target: &mut dyn Animatable, tick: u32, ticks: u32) {
        let decay = 1.0 - tick as f32 / ticks as f32;
        let sign = if tick % 2 == 1 { 1.0 } else { -1.0 };
        target.set_position(add3(self.origin, scale3(self.amplitude, sign * decay)));
    }

    fn reset(&mut self, target: &mut dyn Animatable) {
        target.set_position(self.origin);
    }
}
