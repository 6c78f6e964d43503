//! Input contracts for the scheduler.
//!
//! Hosts that drive the scheduler from outside Rust (scripts, network, replay
//! files) collect requests into [`Inputs`] and hand them to
//! `Scheduler::update()`; commands are applied in order before the tick runs.

use serde::{Deserialize, Serialize};

use crate::data::StopType;
use crate::ids::ObjectId;

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Inputs {
    #[serde(default)]
    pub commands: Vec<BehaviorCommand>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play(mut self, object: ObjectId, animation: impl Into<String>, stop: StopType) -> Self {
        self.commands.push(BehaviorCommand::Play {
            object,
            animation: animation.into(),
            stop,
        });
        self
    }

    pub fn stop(mut self, object: ObjectId, animation: impl Into<String>, stop: StopType) -> Self {
        self.commands.push(BehaviorCommand::Stop {
            object,
            animation: animation.into(),
            stop,
        });
        self
    }
}

fn hard_stop() -> StopType {
    StopType::Stop
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum BehaviorCommand {
    Play {
        object: ObjectId,
        animation: String,
        #[serde(default)]
        stop: StopType,
    },
    /// A missing `stop` means a hard `Stop`.
    Stop {
        object: ObjectId,
        animation: String,
        #[serde(default = "hard_stop")]
        stop: StopType,
    },
    StopAll {
        object: ObjectId,
        #[serde(default = "hard_stop")]
        stop: StopType,
    },
}

impl BehaviorCommand {
    pub fn object(&self) -> ObjectId {
        match self {
            Self::Play { object, .. } | Self::Stop { object, .. } | Self::StopAll { object, .. } => {
                *object
            }
        }
    }
}
