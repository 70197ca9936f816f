pub mod analyzer_error;
pub use analyzer_error::*;

pub mod analyzer_config;
pub use analyzer_config::*;

pub mod cte_id;
pub use cte_id::*;

pub mod analysis_builder;
pub use analysis_builder::*;

pub mod cte_scope;
pub use cte_scope::*;

pub mod catalog;
pub use catalog::*;

pub mod cte_analyzer;
pub use cte_analyzer::*;
