use std::sync::Arc;

use crate::planner::LogicalPlan;

/// An aliased subquery: `<alias> AS (<child>)`.
///
/// A WITH clause item is parsed into one of these; the alias is the CTE name.
#[derive(Debug, Clone, PartialEq)]
pub struct SubqueryAlias {
    alias: String,
    child: Arc<LogicalPlan>,
}

impl SubqueryAlias {
    pub fn new(alias: impl Into<String>, child: impl Into<Arc<LogicalPlan>>) -> Self {
        Self { alias: alias.into(), child: child.into() }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn child(&self) -> &Arc<LogicalPlan> {
        &self.child
    }
}
