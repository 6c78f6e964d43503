//! Static behavior data: animation definitions, end/stop policies and the
//! per-object catalog they are grouped into.
//!
//! Definitions are built once (in code or through
//! [`crate::parse_behavior_catalog_json`]) and then shared read-only, behind an
//! `Arc`, by every instance created from them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::BehaviorError;

/// How an animation winds down once asked to stop.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EndType {
    /// Hard stop: contexts are aborted synchronously.
    #[default]
    Stop,
    /// Procedures end where they stand.
    Break,
    /// Procedures complete the current pass, then end.
    Finish,
    /// Procedures restore their start state, then end.
    Reset,
}

/// Caller-supplied stop request. Covers every [`EndType`] plus the special
/// `Default`, `Null` and `Pause` values used by conflict resolution.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StopType {
    /// Use the definition's default end type.
    #[default]
    Default,
    /// "Not asked to stop". As a Play argument: only play if nothing is in the way.
    Null,
    Stop,
    Break,
    Finish,
    Reset,
    /// Freeze the instance without releasing its contexts.
    Pause,
}

impl From<EndType> for StopType {
    fn from(end: EndType) -> Self {
        match end {
            EndType::Stop => StopType::Stop,
            EndType::Break => StopType::Break,
            EndType::Finish => StopType::Finish,
            EndType::Reset => StopType::Reset,
        }
    }
}

impl StopType {
    /// Replace `Default`/`Null` with the given default end type.
    #[inline]
    pub fn resolve(self, default_end: EndType) -> StopType {
        match self {
            StopType::Default | StopType::Null => default_end.into(),
            other => other,
        }
    }

    /// True for the values that mean "no stop requested".
    #[inline]
    pub fn is_unset(self) -> bool {
        matches!(self, StopType::Default | StopType::Null)
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Null => "null",
            Self::Stop => "stop",
            Self::Break => "break",
            Self::Finish => "finish",
            Self::Reset => "reset",
            Self::Pause => "pause",
        }
    }
}

/// One procedure entry of a definition: registry id plus the parameters bound
/// into its context at acquire time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProcedureRef {
    pub id: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl ProcedureRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: serde_json::Value::Null,
        }
    }

    pub fn with_params(id: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            params,
        }
    }
}

/// Immutable description of one named animation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnimationDefinition {
    name: String,
    procedures: Vec<ProcedureRef>,
    /// 0 = single pass, n > 0 = n passes, negative = until asked to end.
    loop_count: i32,
    default_end: EndType,
    conflict_group: usize,
}

impl AnimationDefinition {
    pub fn new(name: impl Into<String>, conflict_group: usize) -> Self {
        Self {
            name: name.into(),
            procedures: Vec::new(),
            loop_count: 0,
            default_end: EndType::Stop,
            conflict_group,
        }
    }

    pub fn with_procedure(mut self, procedure: impl Into<String>) -> Self {
        self.procedures.push(ProcedureRef::new(procedure));
        self
    }

    pub fn with_procedure_ref(mut self, procedure: ProcedureRef) -> Self {
        self.procedures.push(procedure);
        self
    }

    pub fn with_loop_count(mut self, loop_count: i32) -> Self {
        self.loop_count = loop_count;
        self
    }

    pub fn with_default_end(mut self, end: EndType) -> Self {
        self.default_end = end;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn procedure_list(&self) -> &[ProcedureRef] {
        &self.procedures
    }

    #[inline]
    pub fn loop_count(&self) -> i32 {
        self.loop_count
    }

    #[inline]
    pub fn default_end_type(&self) -> EndType {
        self.default_end
    }

    #[inline]
    pub fn conflict_group(&self) -> usize {
        self.conflict_group
    }

    /// Number of passes the loop count asks for; `None` repeats until ended.
    #[inline]
    pub fn passes(&self) -> Option<u32> {
        passes_for(self.loop_count)
    }
}

/// Map a raw loop count onto a pass count (`None` = unbounded).
#[inline]
pub fn passes_for(loop_count: i32) -> Option<u32> {
    match loop_count {
        0 => Some(1),
        n if n > 0 => Some(n as u32),
        _ => None,
    }
}

/// Every animation available to one kind of object, plus the table of
/// conflict-group names their `conflict_group` indices point into.
#[derive(Clone, Debug, Default)]
pub struct AnimationCatalog {
    pub name: String,
    conflict_groups: Vec<String>,
    definitions: Vec<Arc<AnimationDefinition>>,
}

impl AnimationCatalog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            conflict_groups: Vec::new(),
            definitions: Vec::new(),
        }
    }

    /// Register a named conflict group and return its index.
    pub fn add_group(&mut self, name: impl Into<String>) -> usize {
        let name = name.into();
        if let Some(idx) = self.group_index(&name) {
            return idx;
        }
        self.conflict_groups.push(name);
        self.conflict_groups.len() - 1
    }

    /// Add a definition after checking it against the catalog.
    pub fn insert(&mut self, def: AnimationDefinition) -> Result<(), BehaviorError> {
        if def.name.is_empty() {
            return Err(BehaviorError::InvalidDefinition {
                reason: "animation name must not be empty".into(),
            });
        }
        if self.get(&def.name).is_some() {
            return Err(BehaviorError::InvalidDefinition {
                reason: format!("duplicate animation name '{}'", def.name),
            });
        }
        if def.procedures.is_empty() {
            return Err(BehaviorError::InvalidDefinition {
                reason: format!("animation '{}' has no procedures", def.name),
            });
        }
        // Groups registered by name bound the index; a catalog built purely
        // from indices grows its table implicitly.
        if !self.conflict_groups.is_empty() && def.conflict_group >= self.conflict_groups.len() {
            return Err(BehaviorError::InvalidDefinition {
                reason: format!(
                    "animation '{}' uses conflict group {} but only {} are declared",
                    def.name,
                    def.conflict_group,
                    self.conflict_groups.len()
                ),
            });
        }
        self.definitions.push(Arc::new(def));
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, def: AnimationDefinition) -> Result<Self, BehaviorError> {
        self.insert(def)?;
        Ok(self)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Arc<AnimationDefinition>> {
        self.definitions.iter().find(|d| d.name == name)
    }

    #[inline]
    pub fn definitions(&self) -> &[Arc<AnimationDefinition>] {
        &self.definitions
    }

    #[inline]
    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.conflict_groups.iter().position(|g| g == name)
    }

    #[inline]
    pub fn group_name(&self, idx: usize) -> Option<&str> {
        self.conflict_groups.get(idx).map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
