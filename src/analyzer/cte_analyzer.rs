use std::{collections::{HashMap, HashSet}, sync::Arc};

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    analyzer::{
        AnalysisBuilder, AnalysisError, AnalyzerConfig, BoxError, Catalog, CteChain, CteId,
        CteIdGenerator, CteScopeRef, Result, ScopeId,
    },
    planner::{LogicalPlan, SubqueryAlias}
};

/// A parsed query block: its WITH list, in order, and the main body.
#[derive(Debug, Clone)]
pub struct Query {
    pub ctes: Vec<SubqueryAlias>,
    pub body: LogicalPlan,
}

#[derive(Debug, Clone)]
pub struct AnalyzedQuery {
    /// main body with every relation reference resolved
    pub plan: Arc<LogicalPlan>,
    /// shared CTE producers read by `CteConsumer` nodes, in WITH order
    pub shared_ctes: Vec<(CteId, Arc<LogicalPlan>)>,
}

/// How a reference to an earlier CTE is materialized inside a CTE body.
#[derive(Clone)]
enum CteRef {
    Shared(CteId),
    Inline(Arc<dyn AnalysisBuilder>),
}

/// Resolves the relation references of a query block against its WITH list,
/// choosing per CTE between one shared plan and per-reference copies.
pub struct CteAnalyzer {
    catalog: Arc<dyn Catalog + Send + Sync>,
    config: AnalyzerConfig,
}

impl CteAnalyzer {
    pub fn new(catalog: Arc<dyn Catalog + Send + Sync>, config: AnalyzerConfig) -> Self {
        Self { catalog, config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Build the scope chain of `ctes`, one link per CTE. References to a CTE
    /// in `inlined` get a fresh copy of its body; any other CTE reference
    /// inside a CTE body reads the shared producer.
    pub fn build_chain(
        &self,
        ctes: &[SubqueryAlias],
        inlined: &HashSet<CteId>,
    ) -> Result<(CteChain, ScopeId)> {
        let mut chain = CteChain::new();
        let mut ids = CteIdGenerator::new();
        let mut current = CteChain::ROOT;
        let mut visible: IndexMap<String, CteRef> = IndexMap::new();

        for parsed in ctes {
            let cte_id = ids
                .next()
                .ok_or_else(|| AnalysisError::MalformedScope("CTE ids exhausted".into()))?;
            let builder: Arc<dyn AnalysisBuilder> = Arc::new(cte_builder(
                Arc::clone(&self.catalog),
                parsed.clone(),
                visible.clone(),
            ));

            current = chain.register(parsed.clone(), current, cte_id)?;
            let registered = Arc::clone(&builder);
            chain.set_analysis_builder(current, move || registered.build())?;

            let cte_ref = if inlined.contains(&cte_id) {
                CteRef::Inline(builder)
            } else {
                CteRef::Shared(cte_id)
            };
            visible.insert(parsed.alias().to_string(), cte_ref);
        }

        Ok((chain, current))
    }

    pub fn analyze(&self, query: &Query) -> Result<AnalyzedQuery> {
        let references = count_references(query);
        let inlined: HashSet<CteId> = references
            .iter()
            .filter(|&(_, &count)| self.config.should_inline(count))
            .map(|(&id, _)| id)
            .collect();

        let (chain, last) = self.build_chain(&query.ctes, &inlined)?;
        let scope = chain
            .scope(last)
            .ok_or_else(|| AnalysisError::MalformedScope("lost the innermost CTE scope".into()))?;

        let plan = query.body.transform_scans(&mut |table, visible| {
            let Some(cte) = scope.find(table) else {
                return resolve_base_table(self.catalog.as_ref(), table, visible);
            };
            let cte_id = cte.cte_id();
            let inline = inlined.contains(&cte_id);
            debug!(
                cte = table,
                %cte_id,
                references = references.get(&cte_id).copied().unwrap_or_default(),
                inline,
                "materializing CTE reference"
            );

            if inline {
                let analyzed = scope
                    .get_for_inline(table)?
                    .ok_or_else(|| AnalysisError::UnknownRelation(table.to_string()))?;
                Ok(realias(Arc::unwrap_or_clone(analyzed), table, visible))
            } else {
                Ok(consumer(cte_id, table, visible))
            }
        })?;

        let mut shared = IndexMap::new();
        collect_shared(&plan, &chain, &mut shared)?;
        shared.sort_keys();

        Ok(AnalyzedQuery {
            plan: Arc::new(plan),
            shared_ctes: shared.into_iter().collect(),
        })
    }
}

/// References to each CTE from the main body and from the body of every CTE
/// the main body reaches, directly or through other CTEs. Each reached CTE
/// body is counted once.
fn count_references(query: &Query) -> HashMap<CteId, usize> {
    let mut visible: HashMap<&str, CteId> = HashMap::new();
    let mut reads: HashMap<CteId, Vec<CteId>> = HashMap::new();
    for (parsed, cte_id) in query.ctes.iter().zip(CteIdGenerator::new()) {
        let inner = parsed
            .child()
            .scan_tables()
            .into_iter()
            .filter_map(|table| visible.get(table).copied())
            .collect();
        reads.insert(cte_id, inner);
        visible.insert(parsed.alias(), cte_id);
    }

    let mut pending: Vec<CteId> = query
        .body
        .scan_tables()
        .into_iter()
        .filter_map(|table| visible.get(table).copied())
        .collect();
    let mut counts: HashMap<CteId, usize> = HashMap::new();
    let mut reached: HashSet<CteId> = HashSet::new();
    while let Some(cte_id) = pending.pop() {
        *counts.entry(cte_id).or_default() += 1;
        if !reached.insert(cte_id) {
            continue;
        }
        pending.extend(reads.get(&cte_id).into_iter().flatten().copied());
    }
    counts
}

/// Analysis of one CTE body against the CTEs defined before it; everything
/// else must be a base table.
fn cte_builder(
    catalog: Arc<dyn Catalog + Send + Sync>,
    parsed: SubqueryAlias,
    visible: IndexMap<String, CteRef>,
) -> impl AnalysisBuilder + 'static {
    move || -> std::result::Result<LogicalPlan, BoxError> {
        let child = parsed.child().transform_scans(&mut |table, visible_name| {
            match visible.get(table) {
                Some(CteRef::Shared(cte_id)) => Ok(consumer(*cte_id, table, visible_name)),
                Some(CteRef::Inline(builder)) => {
                    let plan = builder.build().map_err(|source| AnalysisError::CteAnalysis {
                        name: table.to_string(),
                        source,
                    })?;
                    Ok(realias(plan, table, visible_name))
                }
                None => resolve_base_table(catalog.as_ref(), table, visible_name),
            }
        })?;
        Ok(LogicalPlan::SubqueryAlias(SubqueryAlias::new(parsed.alias(), child)))
    }
}

fn resolve_base_table(catalog: &dyn Catalog, table: &str, visible: &str) -> Result<LogicalPlan> {
    if catalog.has_table(table) {
        Ok(LogicalPlan::scan_as(table, visible))
    } else {
        Err(AnalysisError::UnknownRelation(table.to_string()))
    }
}

fn consumer(cte_id: CteId, name: &str, visible: &str) -> LogicalPlan {
    let plan = LogicalPlan::CteConsumer { cte_id, name: name.to_string() };
    realias(plan, name, visible)
}

fn realias(plan: LogicalPlan, name: &str, visible: &str) -> LogicalPlan {
    if name == visible {
        plan
    } else {
        LogicalPlan::SubqueryAlias(SubqueryAlias::new(visible, plan))
    }
}

/// Analyze, once each, every CTE read through a `CteConsumer` under `plan`,
/// following producers that themselves read other CTEs.
fn collect_shared(
    plan: &LogicalPlan,
    chain: &CteChain,
    shared: &mut IndexMap<CteId, Arc<LogicalPlan>>,
) -> Result<()> {
    if let LogicalPlan::CteConsumer { cte_id, name } = plan {
        if !shared.contains_key(cte_id) {
            let producer = shared_plan(chain, *cte_id, name)?;
            shared.insert(*cte_id, producer.clone());
            collect_shared(&producer, chain, shared)?;
        }
    }
    for child in plan.children() {
        collect_shared(child, chain, shared)?;
    }
    Ok(())
}

fn shared_plan(chain: &CteChain, cte_id: CteId, name: &str) -> Result<Arc<LogicalPlan>> {
    let scope: CteScopeRef<'_> = chain
        .by_cte_id(cte_id)
        .ok_or_else(|| AnalysisError::UnknownRelation(name.to_string()))?;
    scope
        .get_or_analyze(name)?
        .ok_or_else(|| AnalysisError::UnknownRelation(name.to_string()))
}
