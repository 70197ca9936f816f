use serde::{Deserialize, Serialize};

/// How references to a CTE are materialized, from the main body and from
/// other CTE bodies alike.
///
/// - `Auto`: inline when the CTE is referenced at most `inline_threshold` times,
///   share one analyzed plan otherwise. References made through other CTEs
///   count too.
/// - `AlwaysReuse`: every reference reads the shared plan.
/// - `AlwaysInline`: every reference gets its own analyzed copy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum CteReuseMode {
    #[default]
    Auto,
    AlwaysReuse,
    AlwaysInline,
}

/// Analyzer configuration for CTE handling.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Reuse-vs-inline policy
    pub cte_reuse: CteReuseMode,
    /// Reference count up to which `Auto` inlines a CTE
    pub inline_threshold: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self { cte_reuse: Default::default(), inline_threshold: 1 }
    }
}

impl AnalyzerConfig {
    /// Create default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience: always share one analyzed plan per CTE.
    pub fn reuse() -> Self {
        Self { cte_reuse: CteReuseMode::AlwaysReuse, ..Self::default() }
    }

    /// Convenience: always analyze a fresh copy per reference.
    pub fn inline() -> Self {
        Self { cte_reuse: CteReuseMode::AlwaysInline, ..Self::default() }
    }

    pub fn auto(inline_threshold: usize) -> Self {
        Self { cte_reuse: CteReuseMode::Auto, inline_threshold }
    }

    /// Whether a CTE referenced `references` times should be inlined.
    pub fn should_inline(&self, references: usize) -> bool {
        match self.cte_reuse {
            CteReuseMode::Auto => references <= self.inline_threshold,
            CteReuseMode::AlwaysReuse => false,
            CteReuseMode::AlwaysInline => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_inlines_single_references_only() {
        let cfg = AnalyzerConfig::new();
        assert_eq!(cfg.cte_reuse, CteReuseMode::Auto);
        assert!(cfg.should_inline(1));
        assert!(!cfg.should_inline(2));
    }

    #[test]
    fn fixed_modes_ignore_reference_count() {
        assert!(!AnalyzerConfig::reuse().should_inline(1));
        assert!(AnalyzerConfig::inline().should_inline(10));
        assert!(AnalyzerConfig::auto(3).should_inline(3));
        assert!(!AnalyzerConfig::auto(3).should_inline(4));
    }

    #[test]
    fn deserializes_with_defaults() {
        let cfg: AnalyzerConfig = serde_json::from_str(r#"{"cte_reuse":"AlwaysInline"}"#).unwrap();
        assert_eq!(cfg, AnalyzerConfig::inline());

        let cfg: AnalyzerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, AnalyzerConfig::default());
    }
}
