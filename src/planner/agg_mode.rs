use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Input/output shape of an aggregate node: raw rows or partial
/// accumulator buffers on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum AggMode {
    /// Raw rows in, final results out. Single-phase aggregation.
    InputToResult,
    /// Raw rows in, partial buffers out.
    InputToBuffer,
    /// Partial buffers in, final results out.
    BufferToResult,
    /// Partial buffers in, merged partial buffers out.
    BufferToBuffer,
}

impl AggMode {
    pub fn consumes_buffer(&self) -> bool {
        matches!(self, AggMode::BufferToResult | AggMode::BufferToBuffer)
    }

    pub fn produces_buffer(&self) -> bool {
        matches!(self, AggMode::InputToBuffer | AggMode::BufferToBuffer)
    }
}

impl Display for AggMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AggMode::InputToResult => "InputToResult",
            AggMode::InputToBuffer => "InputToBuffer",
            AggMode::BufferToResult => "BufferToResult",
            AggMode::BufferToBuffer => "BufferToBuffer",
        };
        f.write_str(name)
    }
}
