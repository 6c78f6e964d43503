//! Core configuration for vizij-behavior-core.

use serde::{Deserialize, Serialize};

use crate::error::BehaviorError;

/// Configuration for pool sizing and per-tick output limits.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Contexts allocated up front so the first plays do not grow the pool.
    pub prewarm_contexts: usize,

    /// Upper bound on contexts kept on the free list; `None` keeps them all.
    pub max_idle_contexts: Option<usize>,

    /// Maximum events to retain per tick; extra events are dropped with a warning.
    pub max_events_per_tick: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prewarm_contexts: 0,
            max_idle_contexts: None,
            max_events_per_tick: 1024,
        }
    }
}

impl Config {
    /// Parse a config from JSON; missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self, BehaviorError> {
        Ok(serde_json::from_str(s)?)
    }
}
