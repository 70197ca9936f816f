use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Identity of one registered CTE, stable for the scope's lifetime.
///
/// Plan nodes refer back to a CTE through its id instead of holding the scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct CteId(u32);

impl CteId {
    /// Id of a root scope, which defines no CTE.
    pub const DEFAULT: CteId = CteId(0);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl Default for CteId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Display for CteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cte#{}", self.0)
    }
}

/// Hands out the ids of one statement's CTEs: 1, 2, 3, ...
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CteIdGenerator {
    pub current: Option<CteId>,
}

impl CteIdGenerator {
    pub fn new() -> Self {
        Self { current: None }
    }
}

impl Iterator for CteIdGenerator {
    type Item = CteId;
    fn next(&mut self) -> Option<Self::Item> {
        let item = match self.current {
            Some(CteId(u32::MAX)) => return None,
            Some(CteId(id)) => CteId(id + 1),
            None => CteId(1),
        };

        self.current = Some(item);
        Some(item)
    }
}
