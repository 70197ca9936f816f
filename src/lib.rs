pub mod analyzer;
pub use analyzer::{
    AnalysisError, AnalyzerConfig, CteAnalyzer, CteChain, CteId, CteScopeRef, ReuseOutcome, ScopeId,
};

pub mod planner;
pub use planner::{AggMode, AggPhase, AggregateDescriptor, LogicalPlan, SubqueryAlias};
