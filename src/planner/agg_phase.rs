use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Stage of a distributed, possibly multi-round, aggregation.
///
/// - `Local`: aggregate each partition before any redistribution.
/// - `Global`: aggregate after rows of one group have been brought together.
/// - `DistinctLocal` / `DistinctGlobal`: the extra rounds used by
///   multi-round DISTINCT strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum AggPhase {
    Local,
    Global,
    DistinctLocal,
    DistinctGlobal,
}

impl AggPhase {
    pub fn is_global(&self) -> bool {
        matches!(self, AggPhase::Global | AggPhase::DistinctGlobal)
    }
}

impl Display for AggPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AggPhase::Local => "Local",
            AggPhase::Global => "Global",
            AggPhase::DistinctLocal => "DistinctLocal",
            AggPhase::DistinctGlobal => "DistinctGlobal",
        };
        f.write_str(name)
    }
}
