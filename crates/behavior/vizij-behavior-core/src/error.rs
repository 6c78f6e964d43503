//! Error types for the behavior scheduler

use serde::{Deserialize, Serialize};

/// Error type for catalog, pool, instance and component operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum BehaviorError {
    /// Animation name not present in the object's catalog
    #[error("Animation not found: {name}")]
    AnimationNotFound { name: String },

    /// Object id not owned by the scheduler
    #[error("Object not found: {id}")]
    ObjectNotFound { id: u32 },

    /// A definition references a procedure the registry cannot resolve
    #[error("Procedure not found: {procedure}")]
    ProcedureNotFound { procedure: String },

    /// The procedure factory rejected its bound parameters
    #[error("Invalid arguments for procedure {procedure}: {reason}")]
    InvalidProcedureArgs { procedure: String, reason: String },

    /// A running context reported an internal failure
    #[error("Execution fault in procedure {procedure}: {message}")]
    ExecutionFault { procedure: String, message: String },

    /// Play() on an instance that is already running
    #[error("Animation already playing: {name}")]
    AlreadyPlaying { name: String },

    /// Stop() on an instance that is idle
    #[error("Animation not playing: {name}")]
    NotPlaying { name: String },

    /// Handle refers to a context that has since been returned to the pool
    #[error("Stale context handle: {handle}")]
    StaleContext { handle: String },

    /// Context is in the wrong state for the requested pool operation
    #[error("Invalid context state for {operation}: {state}")]
    InvalidContextState { operation: String, state: String },

    /// Catalog data failed validation
    #[error("Invalid definition: {reason}")]
    InvalidDefinition { reason: String },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl BehaviorError {
    /// Faults that cost a single instance; the rest of the tick carries on.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ProcedureNotFound { .. }
                | Self::InvalidProcedureArgs { .. }
                | Self::ExecutionFault { .. }
                | Self::AlreadyPlaying { .. }
                | Self::NotPlaying { .. }
        )
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::AnimationNotFound { .. }
            | Self::ObjectNotFound { .. }
            | Self::InvalidDefinition { .. } => "data",
            Self::ProcedureNotFound { .. }
            | Self::InvalidProcedureArgs { .. }
            | Self::ExecutionFault { .. } => "procedure",
            Self::AlreadyPlaying { .. } | Self::NotPlaying { .. } => "state",
            Self::StaleContext { .. } | Self::InvalidContextState { .. } => "context",
            Self::SerializationError { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for BehaviorError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            reason: err.to_string(),
        }
    }
}
