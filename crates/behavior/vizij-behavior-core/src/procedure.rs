//! Resumable procedures and the registry that resolves them by id.
//!
//! A procedure is an explicit state machine: the pool calls
//! [`Procedure::step`] once per tick and the procedure either yields
//! ([`Step::Yield`], the cooperative `Suspend()` point) or returns
//! ([`Step::Done`]). Nothing interrupts a procedure mid-step.

use hashbrown::HashMap;

use crate::data::{passes_for, ProcedureRef, StopType};
use crate::error::BehaviorError;
use crate::facade::Animatable;

/// Result of one step of a procedure.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Step {
    /// Suspend until the next tick.
    Yield,
    /// The procedure returned.
    Done,
}

/// Internal failure reported by a procedure body.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct ProcedureFault(pub String);

impl ProcedureFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A resumable procedure bound into an execution context.
pub trait Procedure {
    /// Run until the next suspension point or completion.
    fn step(&mut self, scope: &mut ProcedureScope<'_>) -> Result<Step, ProcedureFault>;

    /// Called when a suspended context is forcibly terminated.
    fn on_abort(&mut self) {}
}

/// Adapter turning a closure into a [`Procedure`].
pub struct FnProcedure<F>(F);

impl<F> Procedure for FnProcedure<F>
where
    F: FnMut(&mut ProcedureScope<'_>) -> Result<Step, ProcedureFault>,
{
    fn step(&mut self, scope: &mut ProcedureScope<'_>) -> Result<Step, ProcedureFault> {
        (self.0)(scope)
    }
}

/// Box a closure as a procedure body.
pub fn procedure_fn<F>(f: F) -> Box<dyn Procedure>
where
    F: FnMut(&mut ProcedureScope<'_>) -> Result<Step, ProcedureFault> + 'static,
{
    Box::new(FnProcedure(f))
}

/// Everything a procedure may see or touch during one step.
pub struct ProcedureScope<'a> {
    animation: &'a str,
    procedure: &'a str,
    end_type: StopType,
    loop_count: i32,
    tick: u64,
    target: &'a mut dyn Animatable,
    finished: bool,
    spawns: Vec<ProcedureRef>,
}

impl<'a> ProcedureScope<'a> {
    pub fn new(
        animation: &'a str,
        procedure: &'a str,
        end_type: StopType,
        loop_count: i32,
        tick: u64,
        target: &'a mut dyn Animatable,
    ) -> Self {
        Self {
            animation,
            procedure,
            end_type,
            loop_count,
            tick,
            target,
            finished: false,
            spawns: Vec::new(),
        }
    }

    /// Name of the animation this context belongs to.
    #[inline]
    pub fn animation(&self) -> &str {
        self.animation
    }

    #[inline]
    pub fn procedure(&self) -> &str {
        self.procedure
    }

    /// End type currently requested for the owning instance (`Null` when none).
    #[inline]
    pub fn end_type(&self) -> StopType {
        self.end_type
    }

    /// True when a cooperative end (Break/Finish/Reset) has been requested.
    #[inline]
    pub fn is_ending(&self) -> bool {
        matches!(
            self.end_type,
            StopType::Break | StopType::Finish | StopType::Reset
        )
    }

    #[inline]
    pub fn loop_count(&self) -> i32 {
        self.loop_count
    }

    /// Pass count derived from the loop count; `None` repeats until ended.
    #[inline]
    pub fn passes(&self) -> Option<u32> {
        passes_for(self.loop_count)
    }

    /// Owning component's tick counter.
    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn target(&mut self) -> &mut dyn Animatable {
        &mut *self.target
    }

    /// Declare this procedure's work done; its context is returned after this step.
    #[inline]
    pub fn finish(&mut self) {
        self.finished = true;
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Launch another procedure under the same instance. It first runs next tick.
    pub fn spawn(&mut self, procedure: impl Into<String>) {
        self.spawns.push(ProcedureRef::new(procedure));
    }

    pub fn spawn_with(&mut self, procedure: impl Into<String>, params: serde_json::Value) {
        self.spawns.push(ProcedureRef::with_params(procedure, params));
    }

    pub(crate) fn take_spawns(&mut self) -> Vec<ProcedureRef> {
        std::mem::take(&mut self.spawns)
    }
}

/// Builds a procedure body from its bound parameters.
pub type ProcedureFactory =
    Box<dyn Fn(&serde_json::Value) -> Result<Box<dyn Procedure>, String>>;

/// Maps procedure ids to factories.
#[derive(Default)]
pub struct ProcedureRegistry {
    factories: HashMap<String, ProcedureFactory>,
}

impl std::fmt::Debug for ProcedureRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&str> = self.ids().collect();
        ids.sort_unstable();
        f.debug_struct("ProcedureRegistry")
            .field("procedures", &ids)
            .finish()
    }
}

impl ProcedureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the stock procedures (see [`crate::procedures`]).
    pub fn with_stock() -> Self {
        let mut reg = Self::new();
        crate::procedures::register_stock(&mut reg);
        reg
    }

    /// Register (or replace) a factory.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn(&serde_json::Value) -> Result<Box<dyn Procedure>, String> + 'static,
    {
        self.factories.insert(id.into(), Box::new(factory));
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build a fresh body for `id` bound to `params`.
    pub fn instantiate(
        &self,
        id: &str,
        params: &serde_json::Value,
    ) -> Result<Box<dyn Procedure>, BehaviorError> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| BehaviorError::ProcedureNotFound {
                procedure: id.to_string(),
            })?;
        factory(params).map_err(|reason| BehaviorError::InvalidProcedureArgs {
            procedure: id.to_string(),
            reason,
        })
    }
}
