use std::{fmt::Display, hash::{Hash, Hasher}};

use serde::{Deserialize, Serialize};

use crate::{analyzer::{AnalysisError, Result}, planner::{AggMode, AggPhase}};

/// Distributed shape of one physical aggregate node.
///
/// Equality and hashing only look at `(phase, mode)`. The colocation hint is
/// a physical-enforcement detail and must not split otherwise equivalent
/// plans apart, so two descriptors that differ only in the hint compare equal.
///
/// Descriptors are immutable; the `with_*` methods return a modified copy.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct AggregateDescriptor {
    phase: AggPhase,
    mode: AggMode,
    #[serde(default)]
    needs_colocated_scan: bool,
}

impl AggregateDescriptor {
    pub fn new(phase: AggPhase, mode: AggMode) -> Self {
        Self::with_colocation(phase, mode, false)
    }

    pub fn with_colocation(phase: AggPhase, mode: AggMode, needs_colocated_scan: bool) -> Self {
        Self { phase, mode, needs_colocated_scan }
    }

    /// Build from optional parts, as handed over by a rule that has not
    /// decided every field yet. Both `phase` and `mode` are required.
    pub fn try_new(phase: Option<AggPhase>, mode: Option<AggMode>) -> Result<Self> {
        let phase = phase.ok_or(AnalysisError::MissingDescriptorField("phase"))?;
        let mode = mode.ok_or(AnalysisError::MissingDescriptorField("mode"))?;
        Ok(Self::new(phase, mode))
    }

    /// Single-phase local aggregation that may read from a colocated scan.
    pub fn local_result() -> Self {
        Self::with_colocation(AggPhase::Local, AggMode::InputToResult, true)
    }

    pub fn phase(&self) -> AggPhase {
        self.phase
    }

    pub fn mode(&self) -> AggMode {
        self.mode
    }

    pub fn needs_colocated_scan(&self) -> bool {
        self.needs_colocated_scan
    }

    pub fn with_phase(&self, phase: AggPhase) -> Self {
        Self { phase, ..*self }
    }

    pub fn with_mode(&self, mode: AggMode) -> Self {
        Self { mode, ..*self }
    }

    pub fn with_phase_and_mode(&self, phase: AggPhase, mode: AggMode) -> Self {
        Self { phase, mode, ..*self }
    }

    pub fn with_colocate_scan(&self, needs_colocated_scan: bool) -> Self {
        Self { needs_colocated_scan, ..*self }
    }
}

impl PartialEq for AggregateDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.phase == other.phase && self.mode == other.mode
    }
}

impl Eq for AggregateDescriptor {}

impl Hash for AggregateDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.phase.hash(state);
        self.mode.hash(state);
    }
}

impl Display for AggregateDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "AggregateDescriptor{{phase={}, mode={}, needs_colocated_scan={}}}",
            self.phase,
            self.mode,
            self.needs_colocated_scan
        )
    }
}
