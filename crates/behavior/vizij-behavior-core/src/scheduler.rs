//! Scheduler: owns the context pool and every animated object, and ticks them.
//!
//! Methods:
//! - new, spawn_object, despawn_object, clear, play, stop, stop_all, is_playing, update

use indexmap::IndexMap;
use log::{debug, warn};

use crate::component::{AnimationComponent, PlayOutcome};
use crate::config::Config;
use crate::data::{AnimationCatalog, StopType};
use crate::error::BehaviorError;
use crate::facade::Animatable;
use crate::ids::{IdAllocator, ObjectId};
use crate::inputs::{BehaviorCommand, Inputs};
use crate::outputs::{BehaviorEvent, ObjectEvent, Outputs};
use crate::pool::ContextPool;
use crate::procedure::ProcedureRegistry;

/// One object under animation: its component plus the target procedures drive.
struct AnimatedObject {
    component: AnimationComponent,
    target: Box<dyn Animatable>,
}

pub struct Scheduler {
    cfg: Config,
    ids: IdAllocator,
    pool: ContextPool,
    objects: IndexMap<ObjectId, AnimatedObject>,

    // Per-tick outputs
    outputs: Outputs,
    tick: u64,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("cfg", &self.cfg)
            .field("objects", &self.objects.len())
            .field("pool", &self.pool)
            .field("tick", &self.tick)
            .finish()
    }
}

impl Scheduler {
    /// Create a scheduler whose pool resolves procedures through `registry`.
    pub fn new(cfg: Config, registry: ProcedureRegistry) -> Self {
        Self {
            pool: ContextPool::with_config(registry, &cfg),
            cfg,
            ids: IdAllocator::new(),
            objects: IndexMap::new(),
            outputs: Outputs::default(),
            tick: 0,
        }
    }

    /// Scheduler with the stock procedures and default config.
    pub fn with_stock() -> Self {
        Self::new(Config::default(), ProcedureRegistry::with_stock())
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    #[inline]
    pub fn pool(&self) -> &ContextPool {
        &self.pool
    }

    /// Register additional procedures after construction.
    #[inline]
    pub fn registry_mut(&mut self) -> &mut ProcedureRegistry {
        self.pool.registry_mut()
    }

    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Attach a component built from `catalog` to a new object.
    pub fn spawn_object(
        &mut self,
        catalog: &AnimationCatalog,
        target: Box<dyn Animatable>,
    ) -> ObjectId {
        let id = self.ids.alloc_object();
        self.objects.insert(
            id,
            AnimatedObject {
                component: AnimationComponent::new(catalog),
                target,
            },
        );
        debug!(
            "object {}: spawned with {} animation(s) from '{}'",
            id.0,
            catalog.len(),
            catalog.name
        );
        id
    }

    /// Remove an object. Every instance is recycled first so all of its
    /// contexts go back to the pool; the target is handed back to the caller.
    pub fn despawn_object(&mut self, id: ObjectId) -> Result<Box<dyn Animatable>, BehaviorError> {
        let mut obj = self
            .objects
            .shift_remove(&id)
            .ok_or(BehaviorError::ObjectNotFound { id: id.0 })?;
        obj.component.recycle_all(&mut self.pool);
        debug!("object {}: despawned", id.0);
        Ok(obj.target)
    }

    /// Despawn every object and restart object ids from zero. All contexts go
    /// back to the pool.
    pub fn clear(&mut self) {
        let count = self.objects.len();
        for (_, mut obj) in self.objects.drain(..) {
            obj.component.recycle_all(&mut self.pool);
        }
        self.ids.reset();
        debug!("cleared {count} object(s)");
    }

    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    #[inline]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn component(&self, id: ObjectId) -> Option<&AnimationComponent> {
        self.objects.get(&id).map(|o| &o.component)
    }

    pub fn target(&self, id: ObjectId) -> Option<&dyn Animatable> {
        self.objects.get(&id).map(|o| o.target.as_ref())
    }

    pub fn target_mut(&mut self, id: ObjectId) -> Option<&mut (dyn Animatable + 'static)> {
        self.objects.get_mut(&id).map(|o| o.target.as_mut())
    }

    pub fn play(
        &mut self,
        id: ObjectId,
        animation: &str,
        stop: StopType,
    ) -> Result<PlayOutcome, BehaviorError> {
        let obj = self
            .objects
            .get_mut(&id)
            .ok_or(BehaviorError::ObjectNotFound { id: id.0 })?;
        obj.component.play(animation, stop, &mut self.pool)
    }

    pub fn stop(
        &mut self,
        id: ObjectId,
        animation: &str,
        stop: StopType,
    ) -> Result<bool, BehaviorError> {
        let obj = self
            .objects
            .get_mut(&id)
            .ok_or(BehaviorError::ObjectNotFound { id: id.0 })?;
        obj.component.stop(animation, stop, &mut self.pool)
    }

    pub fn stop_all(&mut self, id: ObjectId, stop: StopType) -> Result<usize, BehaviorError> {
        let obj = self
            .objects
            .get_mut(&id)
            .ok_or(BehaviorError::ObjectNotFound { id: id.0 })?;
        Ok(obj.component.stop_all(stop, &mut self.pool))
    }

    /// False for unknown objects.
    pub fn is_playing(&self, id: ObjectId, animation: Option<&str>, include_paused: bool) -> bool {
        self.objects
            .get(&id)
            .is_some_and(|o| o.component.is_playing(animation, include_paused))
    }

    /// Apply `inputs`, then advance every object by one tick.
    ///
    /// Commands that fail are reported as `Rejected` events; procedure faults
    /// as `Fault` events. Neither aborts the tick.
    pub fn update(&mut self, inputs: Inputs) -> &Outputs {
        self.outputs.clear();
        self.tick += 1;
        self.outputs.tick = self.tick;

        for cmd in inputs.commands {
            let object = cmd.object();
            let animation = match &cmd {
                BehaviorCommand::Play { animation, .. } | BehaviorCommand::Stop { animation, .. } => {
                    animation.clone()
                }
                BehaviorCommand::StopAll { .. } => String::new(),
            };
            if let Err(error) = self.apply_command(cmd) {
                warn!("object {}: command rejected: {error}", object.0);
                push_capped(
                    &mut self.outputs,
                    self.cfg.max_events_per_tick,
                    ObjectEvent {
                        object,
                        event: BehaviorEvent::Rejected { animation, error },
                    },
                );
            }
        }

        for (id, obj) in self.objects.iter_mut() {
            let events = obj.component.update(&mut self.pool, obj.target.as_mut());
            for event in events {
                push_capped(
                    &mut self.outputs,
                    self.cfg.max_events_per_tick,
                    ObjectEvent { object: *id, event },
                );
            }
        }

        &self.outputs
    }

    fn apply_command(&mut self, cmd: BehaviorCommand) -> Result<(), BehaviorError> {
        match cmd {
            BehaviorCommand::Play {
                object,
                animation,
                stop,
            } => self.play(object, &animation, stop).map(|_| ()),
            BehaviorCommand::Stop {
                object,
                animation,
                stop,
            } => self.stop(object, &animation, stop).map(|_| ()),
            BehaviorCommand::StopAll { object, stop } => self.stop_all(object, stop).map(|_| ()),
        }
    }
}

fn push_capped(outputs: &mut Outputs, cap: usize, event: ObjectEvent) {
    if outputs.events.len() < cap {
        outputs.push_event(event);
        return;
    }
    if outputs.dropped_events == 0 {
        warn!("tick {}: event cap of {cap} reached, dropping", outputs.tick);
    }
    outputs.dropped_events += 1;
}
