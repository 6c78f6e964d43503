//! Execution context pool.
//!
//! Contexts are checked out to exactly one animation instance at a time and
//! come back through [`ContextPool::release`] (finished) or
//! [`ContextPool::abort`] (terminated while prepared/suspended). Returned
//! contexts stay on a free list and are rebound by the next acquire.

use log::trace;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::config::Config;
use crate::data::ProcedureRef;
use crate::error::BehaviorError;
use crate::ids::ContextHandle;
use crate::procedure::{Procedure, ProcedureRegistry, ProcedureScope, Step};

/// Lifecycle of one execution context.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ContextState {
    /// On the free list.
    Idle,
    /// Bound, not yet stepped.
    Prepared,
    /// Stepped at least once and yielded.
    Suspended,
    /// Returned or faulted; waiting to be released.
    Finished,
}

impl ContextState {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Prepared => "prepared",
            Self::Suspended => "suspended",
            Self::Finished => "finished",
        }
    }

    #[inline]
    fn is_live(&self) -> bool {
        matches!(self, Self::Prepared | Self::Suspended)
    }
}

/// Running totals kept by the pool.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    pub created: u64,
    pub reused: u64,
    pub released: u64,
    pub aborted: u64,
    pub faults: u64,
    /// Contexts dropped because the free list was at `max_idle_contexts`.
    pub dropped: u64,
}

struct ExecutionContext {
    state: ContextState,
    procedure: String,
    owner: String,
    body: Option<Box<dyn Procedure>>,
    steps: u64,
}

impl ExecutionContext {
    fn idle() -> Self {
        Self {
            state: ContextState::Idle,
            procedure: String::new(),
            owner: String::new(),
            body: None,
            steps: 0,
        }
    }

    fn bind(&mut self, procedure: &str, owner: &str, body: Box<dyn Procedure>) {
        self.procedure.clear();
        self.procedure.push_str(procedure);
        self.owner.clear();
        self.owner.push_str(owner);
        self.body = Some(body);
        self.steps = 0;
        self.state = ContextState::Prepared;
    }

    fn unbind(&mut self) {
        self.body = None;
        self.state = ContextState::Idle;
    }
}

/// Pool of reusable execution contexts plus the registry used to bind them.
pub struct ContextPool {
    registry: ProcedureRegistry,
    /// Checked-out contexts, keyed by the handle given to their owner.
    live: SlotMap<ContextHandle, ExecutionContext>,
    free: Vec<ExecutionContext>,
    max_idle: Option<usize>,
    stats: PoolStats,
}

impl std::fmt::Debug for ContextPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextPool")
            .field("registry", &self.registry)
            .field("in_use", &self.in_use_count())
            .field("reusable", &self.reusable_count())
            .field("stats", &self.stats)
            .finish()
    }
}

fn stale(handle: ContextHandle) -> BehaviorError {
    BehaviorError::StaleContext {
        handle: format!("{handle:?}"),
    }
}

impl ContextPool {
    pub fn new(registry: ProcedureRegistry) -> Self {
        Self::with_config(registry, &Config::default())
    }

    pub fn with_config(registry: ProcedureRegistry, cfg: &Config) -> Self {
        let mut pool = Self {
            registry,
            live: SlotMap::with_capacity_and_key(cfg.prewarm_contexts),
            free: Vec::with_capacity(cfg.prewarm_contexts),
            max_idle: cfg.max_idle_contexts,
            stats: PoolStats::default(),
        };
        pool.prewarm(cfg.prewarm_contexts);
        pool
    }

    /// Allocate `count` idle contexts ahead of time.
    pub fn prewarm(&mut self, count: usize) {
        self.free.extend((0..count).map(|_| ExecutionContext::idle()));
    }

    #[inline]
    pub fn registry(&self) -> &ProcedureRegistry {
        &self.registry
    }

    #[inline]
    pub fn registry_mut(&mut self) -> &mut ProcedureRegistry {
        &mut self.registry
    }

    #[inline]
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Contexts waiting on the free list.
    #[inline]
    pub fn reusable_count(&self) -> usize {
        self.free.len()
    }

    /// Contexts currently checked out.
    #[inline]
    pub fn in_use_count(&self) -> usize {
        self.live.len()
    }

    /// Contexts alive in the pool, idle or checked out.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.live.len() + self.free.len()
    }

    /// Check out a prepared context bound to `procedure`, reusing an idle one if possible.
    ///
    /// Fails with `ProcedureNotFound` when the registry cannot resolve the id,
    /// or `InvalidProcedureArgs` when its factory rejects the parameters.
    pub fn acquire(
        &mut self,
        procedure: &ProcedureRef,
        owner: &str,
    ) -> Result<ContextHandle, BehaviorError> {
        let body = self.registry.instantiate(&procedure.id, &procedure.params)?;

        let mut ctx = match self.free.pop() {
            Some(ctx) => {
                self.stats.reused += 1;
                ctx
            }
            None => {
                self.stats.created += 1;
                ExecutionContext::idle()
            }
        };
        ctx.bind(&procedure.id, owner, body);
        let handle = self.live.insert(ctx);
        trace!("context {:?} acquired for {}/{}", handle, owner, procedure.id);
        Ok(handle)
    }

    /// Run the bound procedure up to its next suspension point.
    ///
    /// A procedure fault leaves the context `Finished` and surfaces as
    /// `ExecutionFault`; the caller still owns the handle and must release it.
    pub fn step(
        &mut self,
        handle: ContextHandle,
        scope: &mut ProcedureScope<'_>,
    ) -> Result<Step, BehaviorError> {
        let ctx = self.live.get_mut(handle).ok_or_else(|| stale(handle))?;
        if !ctx.state.is_live() {
            return Err(BehaviorError::InvalidContextState {
                operation: "step".into(),
                state: ctx.state.name().into(),
            });
        }
        let Some(body) = ctx.body.as_mut() else {
            return Err(BehaviorError::InvalidContextState {
                operation: "step".into(),
                state: "unbound".into(),
            });
        };

        match body.step(scope) {
            Ok(Step::Yield) => {
                ctx.state = ContextState::Suspended;
                ctx.steps += 1;
                Ok(Step::Yield)
            }
            Ok(Step::Done) => {
                ctx.state = ContextState::Finished;
                ctx.steps += 1;
                Ok(Step::Done)
            }
            Err(fault) => {
                ctx.state = ContextState::Finished;
                self.stats.faults += 1;
                Err(BehaviorError::ExecutionFault {
                    procedure: ctx.procedure.clone(),
                    message: fault.0,
                })
            }
        }
    }

    /// Forcibly terminate a prepared or suspended context and return it to the pool.
    pub fn abort(&mut self, handle: ContextHandle) -> Result<(), BehaviorError> {
        let ctx = self.live.get_mut(handle).ok_or_else(|| stale(handle))?;
        match ctx.state {
            ContextState::Prepared | ContextState::Suspended => {
                if let Some(body) = ctx.body.as_mut() {
                    body.on_abort();
                }
                self.stats.aborted += 1;
            }
            // Already done; aborting degrades to a release.
            ContextState::Finished => self.stats.released += 1,
            ContextState::Idle => {
                return Err(BehaviorError::InvalidContextState {
                    operation: "abort".into(),
                    state: ContextState::Idle.name().into(),
                })
            }
        }
        trace!("context {:?} aborted", handle);
        self.recycle(handle);
        Ok(())
    }

    /// Return a finished context to the pool.
    pub fn release(&mut self, handle: ContextHandle) -> Result<(), BehaviorError> {
        let ctx = self.live.get(handle).ok_or_else(|| stale(handle))?;
        if ctx.state != ContextState::Finished {
            return Err(BehaviorError::InvalidContextState {
                operation: "release".into(),
                state: ctx.state.name().into(),
            });
        }
        self.stats.released += 1;
        trace!("context {:?} released", handle);
        self.recycle(handle);
        Ok(())
    }

    /// State of the context behind `handle`, or `None` if the handle is stale.
    pub fn state(&self, handle: ContextHandle) -> Option<ContextState> {
        self.live.get(handle).map(|c| c.state)
    }

    /// Procedure bound to `handle`, or `None` if the handle is stale.
    pub fn procedure(&self, handle: ContextHandle) -> Option<&str> {
        self.live.get(handle).map(|c| c.procedure.as_str())
    }

    /// Steps taken by the context behind `handle` since it was bound.
    pub fn steps(&self, handle: ContextHandle) -> Option<u64> {
        self.live.get(handle).map(|c| c.steps)
    }

    fn recycle(&mut self, handle: ContextHandle) {
        let Some(mut ctx) = self.live.remove(handle) else {
            return;
        };
        if self.max_idle.map_or(true, |cap| self.free.len() < cap) {
            ctx.unbind();
            self.free.push(ctx);
        } else {
            self.stats.dropped += 1;
        }
    }
}
