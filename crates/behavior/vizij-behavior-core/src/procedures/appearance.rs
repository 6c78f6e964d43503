//! Appearance effects: fade, tint and blink.

use serde::Deserialize;

use super::Effect;
use crate::facade::{lerp4, Animatable, Color};

fn default_ticks() -> u32 {
    10
}

/// `{ "transparency": t, "ticks": n }`: ease transparency from its captured
/// value to `t`. Every later pass starts over from the captured value.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FadeTo {
    transparency: f32,
    #[serde(default = "default_ticks")]
    ticks: u32,
    #[serde(skip)]
    from: f32,
}

impl Effect for FadeTo {
    fn ticks(&self) -> u32 {
        self.ticks.max(1)
    }

    fn capture(&mut self, target: &dyn Animatable) {
        self.from = target.transparency();
    }

    fn begin_pass(&mut self, target: &mut dyn Animatable) {
        target.set_transparency(self.from);
    }

    fn apply(&mut self, target: &mut dyn Animatable, tick: u32, ticks: u32) {
        let t = tick as f32 / ticks as f32;
        let to = self.transparency.clamp(0.0, 1.0);
        target.set_transparency(self.from + (to - self.from) * t);
    }

    fn reset(&mut self, target: &mut dyn Animatable) {
        target.set_transparency(self.from);
    }
}

/// `{ "color": [r, g, b, a], "ticks": n }`: blend the color toward `color`.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TintTo {
    color: Color,
    #[serde(default = "default_ticks")]
    ticks: u32,
    #[serde(skip)]
    from: Color,
}

impl Effect for TintTo {
    fn ticks(&self) -> u32 {
        self.ticks.max(1)
    }

    fn capture(&mut self, target: &dyn Animatable) {
        self.from = target.color();
    }

    fn begin_pass(&mut self, target: &mut dyn Animatable) {
        target.set_color(self.from);
    }

    fn apply(&mut self, target: &mut dyn Animatable, tick: u32, ticks: u32) {
        target.set_color(lerp4(self.from, self.color, tick as f32 / ticks as f32));
    }

    fn reset(&mut self, target: &mut dyn Animatable) {
        target.set_color(self.from);
    }
}

fn default_period() -> u32 {
    5
}

/// `{ "period": p }`: flip visibility for `p` ticks, then restore it for `p`
/// ticks. One pass is `2 * p` ticks.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Blink {
    #[serde(default = "default_period")]
    period: u32,
    #[serde(skip)]
    visible: bool,
}

impl Effect for Blink {
    fn ticks(&self) -> u32 {
        self.period.max(1).saturating_mul(2)
    }

    fn capture(&mut self, target: &dyn Animatable) {
        self.visible = target.is_visible();
    }

    fn apply(&mut self, target: &mut dyn Animatable, tick: u32, ticks: u32) {
        let flipped = tick <= ticks / 2;
        target.set_visible(self.visible != flipped);
    }

    fn reset(&mut self, target: &mut dyn Animatable) {
        target.set_visible(self.visible);
    }
}
