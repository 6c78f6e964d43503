//! Vizij Behavior Core (engine-agnostic)
//!
//! Scripted animation scheduling for animated objects. Each object carries an
//! [`AnimationComponent`]: a catalog of named animations partitioned into
//! conflict groups, a pending queue and an active set. Animations run as sets
//! of resumable procedures stepped cooperatively once per tick, each inside an
//! execution context borrowed from a shared [`ContextPool`].
//!
//! Hosts either drive components directly or let a [`Scheduler`] own the pool
//! and objects and call [`Scheduler::update`] once per frame.

pub mod component;
pub mod config;
pub mod data;
pub mod error;
pub mod facade;
pub mod ids;
pub mod inputs;
pub mod instance;
pub mod outputs;
pub mod pool;
pub mod procedure;
pub mod procedures;
pub mod scheduler;
pub mod stored_catalog;

// Re-exports for consumers (adapters)
pub use component::{AnimationComponent, PlayOutcome};
pub use config::Config;
pub use data::{AnimationCatalog, AnimationDefinition, EndType, ProcedureRef, StopType};
pub use error::BehaviorError;
pub use facade::{Animatable, Color, ObjectState, Vec3};
pub use ids::{ContextHandle, ObjectId};
pub use inputs::{BehaviorCommand, Inputs};
pub use instance::AnimationInstance;
pub use outputs::{BehaviorEvent, ObjectEvent, Outputs};
pub use pool::{ContextPool, ContextState, PoolStats};
pub use procedure::{
    procedure_fn, Procedure, ProcedureFault, ProcedureRegistry, ProcedureScope, Step,
};
pub use scheduler::Scheduler;
pub use stored_catalog::parse_behavior_catalog_json;

/// Result alias used across the crate's public API.
pub type Result<T> = core::result::Result<T, BehaviorError>;
