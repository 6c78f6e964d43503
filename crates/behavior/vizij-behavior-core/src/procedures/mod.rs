//! Stock procedures.
//!
//! Every stock procedure is an [`Effect`] driven by [`Driven`], which owns the
//! pass/loop bookkeeping and the cooperative end handling:
//! - `Break`: end immediately, leaving the target where it is.
//! - `Finish`: complete the current pass, then end.
//! - `Reset`: restore the state captured at the first step, then end.
//!
//! Parameters come from the definition's `params` object; missing fields use
//! the defaults documented on each effect.

mod appearance;
mod motion;

use serde::de::DeserializeOwned;

use crate::data::StopType;
use crate::facade::Animatable;
use crate::procedure::{Procedure, ProcedureFault, ProcedureRegistry, ProcedureScope, Step};

pub use appearance::{Blink, FadeTo, TintTo};
pub use motion::{MoveBy, RotateBy, ScaleBy, Shake, Wait};

pub const WAIT: &str = "wait";
pub const MOVE_BY: &str = "move_by";
pub const ROTATE_BY: &str = "rotate_by";
pub const SCALE_BY: &str = "scale_by";
pub const FADE_TO: &str = "fade_to";
pub const TINT_TO: &str = "tint_to";
pub const BLINK: &str = "blink";
pub const SHAKE: &str = "shake";

/// Register every stock procedure under its id.
pub fn register_stock(reg: &mut ProcedureRegistry) {
    reg.register(WAIT, driven::<Wait>);
    reg.register(MOVE_BY, driven::<MoveBy>);
    reg.register(ROTATE_BY, driven::<RotateBy>);
    reg.register(SCALE_BY, driven::<ScaleBy>);
    reg.register(FADE_TO, driven::<FadeTo>);
    reg.register(TINT_TO, driven::<TintTo>);
    reg.register(BLINK, driven::<Blink>);
    reg.register(SHAKE, driven::<Shake>);
}

fn driven<E>(params: &serde_json::Value) -> Result<Box<dyn Procedure>, String>
where
    E: Effect + DeserializeOwned + 'static,
{
    let effect: E = parse_params(params)?;
    Ok(Box::new(Driven::new(effect)))
}

/// Deserialize procedure parameters; `null` reads as an empty object.
pub fn parse_params<T: DeserializeOwned>(params: &serde_json::Value) -> Result<T, String> {
    let value = if params.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        params.clone()
    };
    serde_json::from_value(value).map_err(|e| e.to_string())
}

/// One pass of a tick-based effect.
pub trait Effect {
    /// Ticks in one pass (at least 1).
    fn ticks(&self) -> u32;

    /// Snapshot what `reset` restores. Called once, on the first step.
    fn capture(&mut self, target: &dyn Animatable);

    /// Called before the first tick of every pass after the first.
    fn begin_pass(&mut self, _target: &mut dyn Animatable) {}

    /// Apply tick `tick` (1-based) of the current pass.
    fn apply(&mut self, target: &mut dyn Animatable, tick: u32, ticks: u32);

    fn reset(&mut self, target: &mut dyn Animatable);
}

/// Pass/tick counters shared by the stock procedures.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassClock {
    ticks_per_pass: u32,
    tick: u32,
    passes_done: u32,
}

impl PassClock {
    pub fn new(ticks_per_pass: u32) -> Self {
        Self {
            ticks_per_pass: ticks_per_pass.max(1),
            tick: 0,
            passes_done: 0,
        }
    }

    /// Advance one tick and return the 1-based tick within the pass.
    #[inline]
    pub fn advance(&mut self) -> u32 {
        self.tick += 1;
        self.tick
    }

    #[inline]
    pub fn ticks_per_pass(&self) -> u32 {
        self.ticks_per_pass
    }

    #[inline]
    pub fn pass_complete(&self) -> bool {
        self.tick >= self.ticks_per_pass
    }

    #[inline]
    pub fn at_pass_start(&self) -> bool {
        self.tick == 0
    }

    #[inline]
    pub fn next_pass(&mut self) {
        self.passes_done += 1;
        self.tick = 0;
    }

    #[inline]
    pub fn passes_done(&self) -> u32 {
        self.passes_done
    }
}

/// Runs an [`Effect`] pass by pass under the instance's loop count and end type.
pub struct Driven<E> {
    effect: E,
    clock: PassClock,
    captured: bool,
}

impl<E: Effect> Driven<E> {
    pub fn new(effect: E) -> Self {
        let clock = PassClock::new(effect.ticks());
        Self {
            effect,
            clock,
            captured: false,
        }
    }
}

impl<E: Effect> Procedure for Driven<E> {
    fn step(&mut self, scope: &mut ProcedureScope<'_>) -> Result<Step, ProcedureFault> {
        let end = scope.end_type();
        let passes = scope.passes();
        let target = scope.target();

        if !self.captured {
            self.effect.capture(&*target);
            self.captured = true;
        }

        match end {
            StopType::Break => {
                scope.finish();
                return Ok(Step::Done);
            }
            StopType::Reset => {
                self.effect.reset(target);
                scope.finish();
                return Ok(Step::Done);
            }
            _ => {}
        }

        if self.clock.at_pass_start() && self.clock.passes_done() > 0 {
            self.effect.begin_pass(target);
        }
        let tick = self.clock.advance();
        self.effect
            .apply(target, tick, self.clock.ticks_per_pass());

        if self.clock.pass_complete() {
            self.clock.next_pass();
            let more = passes.map_or(true, |n| self.clock.passes_done() < n);
            if !more || end == StopType::Finish {
                scope.finish();
                return Ok(Step::Done);
            }
        }
        Ok(Step::Yield)
    }
}
