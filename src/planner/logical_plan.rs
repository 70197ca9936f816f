use std::sync::Arc;

use crate::{
    analyzer::{CteId, Result},
    planner::{AggregateCall, AggregateDescriptor, SubqueryAlias}
};

#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    /// Reference to a relation by name. Before analysis this may still name a CTE.
    Scan {
        table: String,     // referenced relation name
        visible: String,   // visible name (alias or table)
    },

    SubqueryAlias(SubqueryAlias),

    /// Reads the output of a shared CTE producer.
    CteConsumer {
        cte_id: CteId,
        name: String,
    },

    Join {
        left: Arc<LogicalPlan>,
        right: Arc<LogicalPlan>,
        on: String,
    },

    Filter {
        input: Arc<LogicalPlan>,
        predicate: String,
    },

    Project {
        input: Arc<LogicalPlan>,
        exprs: Vec<String>,
    },

    /// Group-by aggregation, stamped with its distributed phase and mode.
    Aggregate {
        input: Arc<LogicalPlan>,
        group_keys: Vec<String>,
        aggs: Vec<AggregateCall>,
        descriptor: AggregateDescriptor,
    },
}

impl LogicalPlan {
    pub fn scan(table: &str) -> Self {
        LogicalPlan::Scan { table: table.to_string(), visible: table.to_string() }
    }

    pub fn scan_as(table: &str, visible: &str) -> Self {
        LogicalPlan::Scan { table: table.to_string(), visible: visible.to_string() }
    }

    pub fn children(&self) -> Vec<&Arc<LogicalPlan>> {
        match self {
            LogicalPlan::Scan { .. } | LogicalPlan::CteConsumer { .. } => vec![],
            LogicalPlan::SubqueryAlias(sa) => vec![sa.child()],
            LogicalPlan::Join { left, right, .. } => vec![left, right],
            LogicalPlan::Filter { input, .. }
            | LogicalPlan::Project { input, .. }
            | LogicalPlan::Aggregate { input, .. } => vec![input],
        }
    }

    /// Names of every `Scan` leaf, in left-to-right order, duplicates kept.
    pub fn scan_tables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_scan_tables(&mut out);
        out
    }

    fn collect_scan_tables<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let LogicalPlan::Scan { table, .. } = self {
            out.push(table);
        }
        for child in self.children() {
            child.collect_scan_tables(out);
        }
    }

    /// Rebuild the plan, replacing each `Scan` leaf by what `f` returns for it.
    /// `f` gets `(table, visible)`.
    pub fn transform_scans<F>(&self, f: &mut F) -> Result<LogicalPlan>
    where
        F: FnMut(&str, &str) -> Result<LogicalPlan>,
    {
        let plan = match self {
            LogicalPlan::Scan { table, visible } => f(table, visible)?,
            LogicalPlan::CteConsumer { .. } => self.clone(),
            LogicalPlan::SubqueryAlias(sa) => LogicalPlan::SubqueryAlias(
                SubqueryAlias::new(sa.alias(), sa.child().transform_scans(f)?)
            ),
            LogicalPlan::Join { left, right, on } => LogicalPlan::Join {
                left: Arc::new(left.transform_scans(f)?),
                right: Arc::new(right.transform_scans(f)?),
                on: on.clone(),
            },
            LogicalPlan::Filter { input, predicate } => LogicalPlan::Filter {
                input: Arc::new(input.transform_scans(f)?),
                predicate: predicate.clone(),
            },
            LogicalPlan::Project { input, exprs } => LogicalPlan::Project {
                input: Arc::new(input.transform_scans(f)?),
                exprs: exprs.clone(),
            },
            LogicalPlan::Aggregate { input, group_keys, aggs, descriptor } => {
                LogicalPlan::Aggregate {
                    input: Arc::new(input.transform_scans(f)?),
                    group_keys: group_keys.clone(),
                    aggs: aggs.clone(),
                    descriptor: *descriptor,
                }
            }
        };
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AnalysisError;

    // ---- helpers ----
    fn filter(input: LogicalPlan, predicate: &str) -> LogicalPlan {
        LogicalPlan::Filter { input: Arc::new(input), predicate: predicate.into() }
    }

    fn join(left: LogicalPlan, right: LogicalPlan) -> LogicalPlan {
        LogicalPlan::Join { left: Arc::new(left), right: Arc::new(right), on: "true".into() }
    }

    #[test]
    fn scan_tables_walks_left_to_right() {
        let joined = join(LogicalPlan::scan("a"), LogicalPlan::scan_as("b", "x"));
        let plan = filter(joined, "a.id = x.id");
        assert_eq!(plan.scan_tables(), vec!["a", "b"]);
    }

    #[test]
    fn scan_tables_descends_into_subquery_alias() {
        let inner = SubqueryAlias::new("s", LogicalPlan::scan("t"));
        let plan = join(LogicalPlan::SubqueryAlias(inner), LogicalPlan::scan("t"));
        assert_eq!(plan.scan_tables(), vec!["t", "t"]);
    }

    #[test]
    fn transform_scans_replaces_leaves_and_keeps_shape() {
        let plan = LogicalPlan::Aggregate {
            input: Arc::new(filter(LogicalPlan::scan("a"), "a.v > 1")),
            group_keys: vec!["a.k".into()],
            aggs: vec![AggregateCall::new("count", vec!["*".into()], false)],
            descriptor: AggregateDescriptor::local_result(),
        };

        let out = plan
            .transform_scans(&mut |table, visible| {
                Ok(LogicalPlan::scan_as(&format!("db.{table}"), visible))
            })
            .unwrap();

        let LogicalPlan::Aggregate { input, descriptor, .. } = &out else {
            panic!("expected aggregate")
        };
        assert_eq!(*descriptor, AggregateDescriptor::local_result());
        assert_eq!(input.scan_tables(), vec!["db.a"]);
    }

    #[test]
    fn transform_scans_propagates_errors() {
        let plan = join(LogicalPlan::scan("a"), LogicalPlan::scan("missing"));
        let err = plan
            .transform_scans(&mut |table, visible| {
                if table == "missing" {
                    Err(AnalysisError::UnknownRelation(table.to_string()))
                } else {
                    Ok(LogicalPlan::scan_as(table, visible))
                }
            })
            .unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownRelation(n) if n == "missing"));
    }
}
