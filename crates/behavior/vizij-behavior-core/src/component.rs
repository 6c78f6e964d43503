//! Per-object animation component: catalog, conflict groups, pending queue
//! and active set, plus the play/stop policy that moves instances between
//! them.
//!
//! The component owns its instances but not the context pool; the pool is
//! passed in by whoever owns it (normally [`crate::Scheduler`]).

use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::data::{AnimationCatalog, StopType};
use crate::error::BehaviorError;
use crate::facade::Animatable;
use crate::instance::AnimationInstance;
use crate::outputs::BehaviorEvent;
use crate::pool::ContextPool;

/// Which branch of the play policy a request took.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PlayOutcome {
    /// Added to the pending queue; starts once its conflict group is clear.
    Queued,
    /// Already waiting in the pending queue; ignored.
    AlreadyQueued,
    /// A conflicting animation is active and the request used `Null`.
    Dropped,
    /// `Pause` toggled the running instance into its paused state.
    Paused,
    /// `Pause` toggled the paused instance back to running.
    Resumed,
}

#[derive(Debug, Default)]
pub struct AnimationComponent {
    catalog: IndexMap<String, AnimationInstance>,
    /// Instance names per conflict-group index.
    groups: IndexMap<usize, Vec<String>>,
    pending: IndexSet<String>,
    active: IndexSet<String>,
    /// Stop requests held for paused instances until they resume.
    deferred: IndexMap<String, StopType>,
    events: Vec<BehaviorEvent>,
    tick: u64,
}

impl AnimationComponent {
    /// One idle instance per definition, partitioned into conflict groups.
    pub fn new(catalog: &AnimationCatalog) -> Self {
        let mut component = Self::default();
        for def in catalog.definitions() {
            component
                .groups
                .entry(def.conflict_group())
                .or_default()
                .push(def.name().to_string());
            component
                .catalog
                .insert(def.name().to_string(), AnimationInstance::new(def.clone()));
        }
        component
    }

    #[inline]
    pub fn instance(&self, name: &str) -> Option<&AnimationInstance> {
        self.catalog.get(name)
    }

    pub fn instances(&self) -> impl Iterator<Item = &AnimationInstance> {
        self.catalog.values()
    }

    /// Names of the instances sharing conflict group `group`.
    pub fn group_members(&self, group: usize) -> &[String] {
        self.groups.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }

    pub fn active(&self) -> impl Iterator<Item = &str> {
        self.active.iter().map(String::as_str)
    }

    #[inline]
    pub fn is_pending(&self, name: &str) -> bool {
        self.pending.contains(name)
    }

    #[inline]
    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Request `name` to play, resolving conflicts in its group.
    ///
    /// Fails with `AnimationNotFound` for unknown names and `ProcedureNotFound`
    /// when a procedure of the definition is not registered; neither changes
    /// the pending queue or active set.
    pub fn play(
        &mut self,
        name: &str,
        stop: StopType,
        pool: &mut ContextPool,
    ) -> Result<PlayOutcome, BehaviorError> {
        let instance = self
            .catalog
            .get(name)
            .ok_or_else(|| BehaviorError::AnimationNotFound {
                name: name.to_string(),
            })?;
        if let Some(missing) = instance
            .definition()
            .procedure_list()
            .iter()
            .find(|p| !pool.registry().contains(&p.id))
        {
            return Err(BehaviorError::ProcedureNotFound {
                procedure: missing.id.clone(),
            });
        }

        if self.pending.contains(name) {
            debug!("{name}: already queued");
            return Ok(PlayOutcome::AlreadyQueued);
        }

        let group = instance.conflict_group();
        let paused_self = instance.is_paused() && self.active.contains(name);
        let conflict = match self.group_holder(group) {
            Some(holder) => holder.to_string(),
            // Nothing else runs in the group; the request is aimed at the
            // paused instance itself.
            None if paused_self => name.to_string(),
            None => {
                self.pending.insert(name.to_string());
                debug!("{name}: queued");
                return Ok(PlayOutcome::Queued);
            }
        };

        if stop == StopType::Null {
            debug!("{name}: dropped, {conflict} is in the way");
            return Ok(PlayOutcome::Dropped);
        }

        let Some(holder) = self.catalog.get_mut(&conflict) else {
            return Err(BehaviorError::AnimationNotFound { name: conflict });
        };

        if stop == StopType::Pause && conflict == name {
            return if holder.end_type() == StopType::Pause {
                holder.stop(StopType::Null, pool)?;
                self.events.push(BehaviorEvent::Resumed { animation: conflict });
                Ok(PlayOutcome::Resumed)
            } else {
                holder.stop(StopType::Pause, pool)?;
                self.events.push(BehaviorEvent::Paused { animation: conflict });
                Ok(PlayOutcome::Paused)
            };
        }

        holder.stop(stop, pool)?;
        self.events.push(stop_event(&conflict, stop));
        // A hard stop leaves the active set now, before `name` is queued.
        self.prune_idle();
        self.pending.insert(name.to_string());
        debug!("{name}: queued behind a stop request");
        Ok(PlayOutcome::Queued)
    }

    /// Forward a stop to `name` if it is active and playing. Returns whether
    /// anything was stopped.
    pub fn stop(
        &mut self,
        name: &str,
        stop: StopType,
        pool: &mut ContextPool,
    ) -> Result<bool, BehaviorError> {
        if !self.catalog.contains_key(name) {
            return Err(BehaviorError::AnimationNotFound {
                name: name.to_string(),
            });
        }
        if !self.active.contains(name) {
            return Ok(false);
        }
        let (group, paused, resolved) = match self.catalog.get(name) {
            Some(instance) if instance.is_playing() => (
                instance.conflict_group(),
                instance.is_paused(),
                stop.resolve(instance.definition().default_end_type()),
            ),
            _ => return Ok(false),
        };
        // A paused instance only wakes up once its group is clear. Anything
        // that would wake it earlier waits for the group instead.
        let wakes =
            stop == StopType::Null || !matches!(resolved, StopType::Stop | StopType::Pause);
        if paused && wakes && self.group_holder(group).is_some() {
            self.pending.insert(name.to_string());
            if stop == StopType::Null {
                debug!("{name}: resume queued");
                return Ok(false);
            }
            debug!("{name}: {} deferred until resumed", resolved.name());
            self.deferred.insert(name.to_string(), stop);
            return Ok(true);
        }
        match self.catalog.get_mut(name) {
            Some(instance) => {
                instance.stop(stop, pool)?;
                self.events.push(stop_event(name, stop));
                self.prune_idle();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Forward a stop to every active instance. Returns how many were stopped.
    pub fn stop_all(&mut self, stop: StopType, pool: &mut ContextPool) -> usize {
        let names: Vec<String> = self.active.iter().cloned().collect();
        let mut stopped = 0;
        for name in names {
            match self.stop(&name, stop, pool) {
                Ok(true) => stopped += 1,
                Ok(false) => {}
                Err(e) => warn!("{name}: stop failed: {e}"),
            }
        }
        stopped
    }

    /// True if `name` (or, with `None`, any animation) is active and playing.
    /// Paused instances only count when `include_paused` is set.
    pub fn is_playing(&self, name: Option<&str>, include_paused: bool) -> bool {
        let counts = |instance: &AnimationInstance| {
            instance.is_playing() && (include_paused || !instance.is_paused())
        };
        match name {
            Some(name) => {
                self.active.contains(name) && self.catalog.get(name).is_some_and(counts)
            }
            None => self
                .active
                .iter()
                .filter_map(|n| self.catalog.get(n))
                .any(counts),
        }
    }

    /// Advance one tick: promote pending entries whose group is clear, step
    /// every active instance, then drop instances that went idle.
    ///
    /// Returns the events produced since the previous update, including those
    /// from `play`/`stop` calls in between.
    pub fn update(
        &mut self,
        pool: &mut ContextPool,
        target: &mut dyn Animatable,
    ) -> Vec<BehaviorEvent> {
        self.tick += 1;
        let tick = self.tick;
        self.prune_idle();

        let queued: Vec<String> = self.pending.iter().cloned().collect();
        for name in queued {
            let Some(group) = self.catalog.get(&name).map(AnimationInstance::conflict_group)
            else {
                self.pending.shift_remove(&name);
                continue;
            };
            if self.group_holder(group).is_some() {
                continue;
            }
            self.pending.shift_remove(&name);
            let Some(instance) = self.catalog.get_mut(&name) else {
                continue;
            };
            let resuming = instance.is_paused();
            match instance.play(pool) {
                Ok(()) if resuming => {
                    self.events.push(BehaviorEvent::Resumed {
                        animation: name.clone(),
                    });
                    if let Some(stop) = self.deferred.shift_remove(&name) {
                        match instance.stop(stop, pool) {
                            Ok(()) => self.events.push(stop_event(&name, stop)),
                            Err(e) => warn!("{name}: deferred stop failed: {e}"),
                        }
                    }
                }
                Ok(()) => {
                    self.active.insert(name.clone());
                    self.events.push(BehaviorEvent::Started { animation: name });
                }
                Err(error) => {
                    warn!("{name}: failed to start: {error}");
                    self.events.push(BehaviorEvent::Fault {
                        animation: name,
                        error,
                    });
                }
            }
        }

        let active: Vec<String> = self.active.iter().cloned().collect();
        for name in active {
            let Some(instance) = self.catalog.get_mut(&name) else {
                continue;
            };
            if let Err(error) = instance.advance(pool, &mut *target, tick) {
                warn!("{name}: {error}");
                self.events.push(BehaviorEvent::Fault {
                    animation: name,
                    error,
                });
            }
        }

        self.prune_idle();
        std::mem::take(&mut self.events)
    }

    /// Recycle every instance and clear the queues; used when the owning
    /// object is destroyed.
    pub fn recycle_all(&mut self, pool: &mut ContextPool) {
        for instance in self.catalog.values_mut() {
            if instance.is_playing() {
                instance.recycle(pool);
            }
        }
        self.pending.clear();
        self.active.clear();
        self.deferred.clear();
        self.events.clear();
    }

    /// The active, running instance holding conflict group `group`, if any.
    /// Paused instances stay active but do not hold their group.
    fn group_holder(&self, group: usize) -> Option<&str> {
        self.active
            .iter()
            .filter_map(|n| self.catalog.get(n))
            .find(|i| i.conflict_group() == group && i.is_playing() && !i.is_paused())
            .map(AnimationInstance::name)
    }

    fn prune_idle(&mut self) {
        let catalog = &self.catalog;
        let events = &mut self.events;
        self.active.retain(|name| {
            let playing = catalog.get(name).is_some_and(AnimationInstance::is_playing);
            if !playing {
                events.push(BehaviorEvent::Ended {
                    animation: name.clone(),
                });
            }
            playing
        });
        self.deferred
            .retain(|name, _| catalog.get(name).is_some_and(AnimationInstance::is_playing));
    }
}

fn stop_event(name: &str, stop: StopType) -> BehaviorEvent {
    match stop {
        StopType::Pause => BehaviorEvent::Paused {
            animation: name.to_string(),
        },
        _ => BehaviorEvent::StopRequested {
            animation: name.to_string(),
            stop,
        },
    }
}
