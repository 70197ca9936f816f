use thiserror::Error;

/// Any error a deferred CTE analysis may raise.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A scope was given a parsed plan without a predecessor, or the reverse.
    #[error("malformed CTE scope: {0}")]
    MalformedScope(String),

    #[error("aggregate descriptor requires `{0}`")]
    MissingDescriptorField(&'static str),

    #[error("failed to analyze CTE `{name}`")]
    CteAnalysis {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("CTE `{0}` has already been analyzed")]
    AlreadyAnalyzed(String),

    #[error("CTE `{0}` already has an analysis builder")]
    BuilderAlreadySet(String),

    #[error("CTE `{0}` has no analysis builder")]
    NoAnalysisBuilder(String),

    #[error("unknown relation `{0}`")]
    UnknownRelation(String),
}
