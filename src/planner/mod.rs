pub mod logical_plan;
pub use logical_plan::*;

pub mod subquery_alias;
pub use subquery_alias::*;

pub mod aggregate_call;
pub use aggregate_call::*;

pub mod agg_phase;
pub use agg_phase::*;

pub mod agg_mode;
pub use agg_mode::*;

pub mod aggregate_descriptor;
pub use aggregate_descriptor::*;
