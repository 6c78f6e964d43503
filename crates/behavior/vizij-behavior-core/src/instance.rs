//! Runtime binding of one animation definition to one target object.
//!
//! State machine:
//! - Idle --play--> Playing
//! - Playing --stop(Stop)--> Idle (synchronous recycle)
//! - Playing --stop(Break|Finish|Reset)--> Playing with a requested end, then
//!   Idle once every procedure has finished
//! - Playing --stop(Pause)--> paused (contexts kept, not stepped) --stop(Null)/play--> Playing

use std::sync::Arc;

use log::{debug, warn};

use crate::data::{AnimationDefinition, ProcedureRef, StopType};
use crate::error::BehaviorError;
use crate::facade::Animatable;
use crate::ids::ContextHandle;
use crate::pool::ContextPool;
use crate::procedure::{ProcedureScope, Step};

/// A checked-out context and the procedure it runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedContext {
    pub procedure: String,
    pub handle: ContextHandle,
}

#[derive(Debug)]
pub struct AnimationInstance {
    def: Arc<AnimationDefinition>,
    contexts: Vec<TrackedContext>,
    playing: bool,
    /// `Null` while no stop has been requested.
    requested_end: StopType,
    conflict_group: usize,
}

impl AnimationInstance {
    pub fn new(def: Arc<AnimationDefinition>) -> Self {
        let conflict_group = def.conflict_group();
        Self {
            def,
            contexts: Vec::new(),
            playing: false,
            requested_end: StopType::Null,
            conflict_group,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.def.name()
    }

    #[inline]
    pub fn definition(&self) -> &AnimationDefinition {
        &self.def
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.playing && self.requested_end == StopType::Pause
    }

    /// Requested end type; `Null` while running normally.
    #[inline]
    pub fn end_type(&self) -> StopType {
        self.requested_end
    }

    #[inline]
    pub fn loop_count(&self) -> i32 {
        self.def.loop_count()
    }

    #[inline]
    pub fn conflict_group(&self) -> usize {
        self.conflict_group
    }

    #[inline]
    pub fn contexts(&self) -> &[TrackedContext] {
        &self.contexts
    }

    #[inline]
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Check out one context per procedure and start playing.
    ///
    /// A paused instance resumes instead. If any procedure fails to bind, the
    /// contexts acquired so far go back to the pool and the instance stays idle.
    pub fn play(&mut self, pool: &mut ContextPool) -> Result<(), BehaviorError> {
        if self.playing {
            if self.is_paused() {
                self.resume();
                return Ok(());
            }
            return Err(BehaviorError::AlreadyPlaying {
                name: self.name().to_string(),
            });
        }

        let mut acquired = Vec::with_capacity(self.def.procedure_list().len());
        for procedure in self.def.procedure_list() {
            match pool.acquire(procedure, self.def.name()) {
                Ok(handle) => acquired.push(TrackedContext {
                    procedure: procedure.id.clone(),
                    handle,
                }),
                Err(err) => {
                    for tracked in acquired {
                        if let Err(e) = pool.abort(tracked.handle) {
                            warn!("{}: failed to return context: {e}", self.name());
                        }
                    }
                    warn!("{}: play failed: {err}", self.name());
                    return Err(err);
                }
            }
        }

        self.contexts = acquired;
        self.playing = true;
        self.requested_end = StopType::Null;
        debug!(
            "{}: playing with {} context(s)",
            self.name(),
            self.contexts.len()
        );
        Ok(())
    }

    /// Ask the instance to stop.
    ///
    /// A request that resolves to `Stop` recycles synchronously. Break, Finish
    /// and Reset are only recorded; procedures observe them through
    /// [`ProcedureScope::end_type`] and finish on their own. `Pause` freezes the
    /// instance and `Null` on a paused instance resumes it.
    pub fn stop(&mut self, stop: StopType, pool: &mut ContextPool) -> Result<(), BehaviorError> {
        if !self.playing {
            return Err(BehaviorError::NotPlaying {
                name: self.name().to_string(),
            });
        }
        if stop == StopType::Null && self.is_paused() {
            self.resume();
            return Ok(());
        }

        match stop.resolve(self.def.default_end_type()) {
            StopType::Stop => self.recycle(pool),
            requested => {
                debug!("{}: end requested ({})", self.name(), requested.name());
                self.requested_end = requested;
            }
        }
        Ok(())
    }

    /// Abort every live context, hand all of them back to the pool and go idle.
    pub fn recycle(&mut self, pool: &mut ContextPool) {
        let returned = self.contexts.len();
        for tracked in self.contexts.drain(..) {
            if let Err(e) = pool.abort(tracked.handle) {
                warn!(
                    "{}: failed to return context for {}: {e}",
                    self.def.name(),
                    tracked.procedure
                );
            }
        }
        self.go_idle();
        debug!("{}: recycled ({returned} context(s))", self.name());
    }

    /// Declare `procedure` done: its contexts leave the tracked set and return
    /// to the pool. The instance goes idle once nothing is left.
    pub fn finish(&mut self, procedure: &str, pool: &mut ContextPool) -> usize {
        let mut removed = 0;
        let mut i = 0;
        while i < self.contexts.len() {
            if self.contexts[i].procedure == procedure {
                let tracked = self.contexts.remove(i);
                if let Err(e) = pool.abort(tracked.handle) {
                    warn!("{}: failed to return context: {e}", self.def.name());
                }
                removed += 1;
            } else {
                i += 1;
            }
        }
        if self.playing && self.contexts.is_empty() {
            self.go_idle();
            debug!("{}: finished", self.name());
        }
        removed
    }

    /// Step every context once. Paused or idle instances do nothing.
    ///
    /// Contexts whose procedure returns or calls `finish()` go back to the pool.
    /// Spawn requests are bound after the pass and first run next tick. On a
    /// fault the whole instance is recycled and the fault returned.
    pub fn advance(
        &mut self,
        pool: &mut ContextPool,
        target: &mut dyn Animatable,
        tick: u64,
    ) -> Result<(), BehaviorError> {
        if !self.playing || self.is_paused() {
            return Ok(());
        }

        let mut spawned: Vec<ProcedureRef> = Vec::new();
        let mut i = 0;
        while i < self.contexts.len() {
            let handle = self.contexts[i].handle;
            let (result, finished, spawns) = {
                let mut scope = ProcedureScope::new(
                    self.def.name(),
                    &self.contexts[i].procedure,
                    self.requested_end,
                    self.def.loop_count(),
                    tick,
                    &mut *target,
                );
                let result = pool.step(handle, &mut scope);
                (result, scope.is_finished(), scope.take_spawns())
            };

            match result {
                Err(err) => {
                    warn!("{}: {err}; recycling", self.name());
                    self.recycle(pool);
                    return Err(err);
                }
                Ok(step) => {
                    spawned.extend(spawns);
                    if step == Step::Done || finished {
                        let tracked = self.contexts.remove(i);
                        let returned = if step == Step::Done {
                            pool.release(tracked.handle)
                        } else {
                            pool.abort(tracked.handle)
                        };
                        if let Err(e) = returned {
                            warn!("{}: failed to return context: {e}", self.def.name());
                        }
                    } else {
                        i += 1;
                    }
                }
            }
        }

        for procedure in spawned {
            match pool.acquire(&procedure, self.def.name()) {
                Ok(handle) => self.contexts.push(TrackedContext {
                    procedure: procedure.id,
                    handle,
                }),
                Err(err) => {
                    warn!("{}: spawn failed: {err}; recycling", self.name());
                    self.recycle(pool);
                    return Err(err);
                }
            }
        }

        if self.contexts.is_empty() {
            self.go_idle();
            debug!("{}: all procedures finished", self.name());
        }
        Ok(())
    }

    fn resume(&mut self) {
        self.requested_end = StopType::Null;
        debug!("{}: resumed", self.name());
    }

    fn go_idle(&mut self) {
        self.playing = false;
        self.requested_end = StopType::Null;
    }
}
