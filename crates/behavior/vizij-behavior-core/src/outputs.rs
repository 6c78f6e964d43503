//! Output contracts from the scheduler.
//!
//! Each tick produces a list of discrete events. Faults never escape a tick as
//! errors; they are converted into `Fault`/`Rejected` events here.

use serde::{Deserialize, Serialize};

use crate::data::StopType;
use crate::error::BehaviorError;
use crate::ids::ObjectId;

/// Discrete signals emitted by an animation component.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[non_exhaustive]
pub enum BehaviorEvent {
    /// Promoted from the pending queue to the active set.
    Started { animation: String },
    /// A stop was forwarded to a playing instance.
    StopRequested { animation: String, stop: StopType },
    Paused { animation: String },
    Resumed { animation: String },
    /// Left the active set.
    Ended { animation: String },
    /// A running or starting instance failed and was returned to idle.
    Fault {
        animation: String,
        error: BehaviorError,
    },
    /// A queued command could not be applied.
    Rejected {
        animation: String,
        error: BehaviorError,
    },
}

impl BehaviorEvent {
    pub fn animation(&self) -> &str {
        match self {
            Self::Started { animation }
            | Self::StopRequested { animation, .. }
            | Self::Paused { animation }
            | Self::Resumed { animation }
            | Self::Ended { animation }
            | Self::Fault { animation, .. }
            | Self::Rejected { animation, .. } => animation,
        }
    }
}

/// An event tagged with the object it came from.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ObjectEvent {
    pub object: ObjectId,
    pub event: BehaviorEvent,
}

/// Outputs returned by Scheduler::update().
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    pub tick: u64,
    #[serde(default)]
    pub events: Vec<ObjectEvent>,
    /// Events discarded because the per-tick cap was reached.
    #[serde(default)]
    pub dropped_events: usize,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped_events = 0;
    }

    #[inline]
    pub fn push_event(&mut self, event: ObjectEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events for one object, in emission order.
    pub fn for_object(&self, object: ObjectId) -> impl Iterator<Item = &BehaviorEvent> {
        self.events
            .iter()
            .filter(move |e| e.object == object)
            .map(|e| &e.event)
    }

    /// Faults reported this tick.
    pub fn faults(&self) -> impl Iterator<Item = &ObjectEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e.event, BehaviorEvent::Fault { .. }))
    }
}
