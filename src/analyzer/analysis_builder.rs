use crate::{analyzer::BoxError, planner::LogicalPlan};

/// Deferred analysis of one CTE body.
///
/// Set once when the CTE is registered and invoked on demand, possibly many
/// times. Each call must produce a fresh plan; implementations do not cache.
pub trait AnalysisBuilder: Send + Sync {
    fn build(&self) -> Result<LogicalPlan, BoxError>;
}

impl<F> AnalysisBuilder for F
where
    F: Fn() -> Result<LogicalPlan, BoxError> + Send + Sync,
{
    fn build(&self) -> Result<LogicalPlan, BoxError> {
        self()
    }
}
