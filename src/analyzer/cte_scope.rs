use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::{
    analyzer::{AnalysisBuilder, AnalysisError, CteId, Result},
    planner::{LogicalPlan, SubqueryAlias}
};

/// Position of a scope inside its [`CteChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl ScopeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// One link of the WITH-clause chain: either a root, or the definition of a
/// single CTE together with everything visible at that point.
pub struct CteScope {
    name: Option<String>,
    parsed_plan: Option<SubqueryAlias>,
    /// Reuse-path cache. Written at most once.
    analyzed_plan: OnceCell<Arc<LogicalPlan>>,
    analysis_builder: OnceCell<Box<dyn AnalysisBuilder>>,
    cte_id: CteId,
    /// visible CTE name -> defining scope, including this scope itself
    visible: IndexMap<String, ScopeId>,
}

impl std::fmt::Debug for CteScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CteScope")
            .field("name", &self.name)
            .field("cte_id", &self.cte_id)
            .field("analyzed", &self.analyzed_plan.get().is_some())
            .field("has_builder", &self.analysis_builder.get().is_some())
            .field("visible", &self.visible)
            .finish()
    }
}

/// Outcome of a reuse-path lookup.
#[derive(Debug, Clone)]
pub enum ReuseOutcome {
    /// No CTE of that name is visible.
    Unresolved,
    /// The CTE exists but its shared plan has not been analyzed yet.
    NotAnalyzed(CteId),
    Analyzed(Arc<LogicalPlan>),
}

impl ReuseOutcome {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, ReuseOutcome::Unresolved)
    }

    pub fn plan(&self) -> Option<&Arc<LogicalPlan>> {
        match self {
            ReuseOutcome::Analyzed(plan) => Some(plan),
            _ => None,
        }
    }
}

/// Arena holding every scope built while analyzing one query block.
///
/// Scopes never move or change their visible set once pushed, so a
/// [`ScopeId`] stays valid for the chain's lifetime.
#[derive(Debug)]
pub struct CteChain {
    scopes: Vec<CteScope>,
}

impl Default for CteChain {
    fn default() -> Self {
        Self::new()
    }
}

impl CteChain {
    pub const ROOT: ScopeId = ScopeId(0);

    pub fn new() -> Self {
        Self { scopes: vec![CteScope::root(CteId::DEFAULT)] }
    }

    /// Number of scopes, root included. Never zero.
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Add a scope. `parsed_plan` and `predecessor` must both be present (a CTE
    /// definition) or both absent (a new root).
    pub fn push(
        &mut self,
        parsed_plan: Option<SubqueryAlias>,
        predecessor: Option<ScopeId>,
        cte_id: CteId,
    ) -> Result<ScopeId> {
        let id = ScopeId(self.scopes.len());
        let scope = match (parsed_plan, predecessor) {
            (None, None) => CteScope::root(cte_id),
            (Some(parsed_plan), Some(predecessor)) => {
                let previous = self.get(predecessor)?;
                let name = parsed_plan.alias().to_string();
                let mut visible = previous.visible.clone();
                visible.insert(name.clone(), id);
                CteScope {
                    name: Some(name),
                    parsed_plan: Some(parsed_plan),
                    analyzed_plan: OnceCell::new(),
                    analysis_builder: OnceCell::new(),
                    cte_id,
                    visible,
                }
            }
            (Some(parsed_plan), None) => {
                return Err(AnalysisError::MalformedScope(format!(
                    "CTE `{}` has no predecessor scope",
                    parsed_plan.alias()
                )));
            }
            (None, Some(_)) => {
                return Err(AnalysisError::MalformedScope(
                    "only a root scope may omit its CTE plan, and a root has no predecessor".into()
                ));
            }
        };

        debug!(
            cte = scope.name.as_deref().unwrap_or("<root>"),
            %cte_id,
            visible = scope.visible.len(),
            "registered CTE scope"
        );
        self.scopes.push(scope);
        Ok(id)
    }

    /// Register the definition of one CTE after `predecessor`.
    pub fn register(
        &mut self,
        parsed_plan: SubqueryAlias,
        predecessor: ScopeId,
        cte_id: CteId,
    ) -> Result<ScopeId> {
        self.push(Some(parsed_plan), Some(predecessor), cte_id)
    }

    pub fn set_analysis_builder<B>(&self, id: ScopeId, builder: B) -> Result<()>
    where
        B: AnalysisBuilder + 'static,
    {
        let scope = self.get(id)?;
        let name = scope.defined_name()?;
        scope
            .analysis_builder
            .set(Box::new(builder))
            .map_err(|_| AnalysisError::BuilderAlreadySet(name.to_string()))
    }

    /// Store the shared analyzed plan. A scope's plan can be written once.
    pub fn set_analyzed_plan(
        &self,
        id: ScopeId,
        plan: impl Into<Arc<LogicalPlan>>,
    ) -> Result<Arc<LogicalPlan>> {
        let scope = self.get(id)?;
        let name = scope.defined_name()?;
        let plan = plan.into();
        scope
            .analyzed_plan
            .set(plan.clone())
            .map_err(|_| AnalysisError::AlreadyAnalyzed(name.to_string()))?;
        debug!(cte = name, cte_id = %scope.cte_id, "stored analyzed CTE plan");
        Ok(plan)
    }

    pub fn root(&self) -> CteScopeRef<'_> {
        CteScopeRef { chain: self, id: Self::ROOT }
    }

    pub fn scope(&self, id: ScopeId) -> Option<CteScopeRef<'_>> {
        (id.0 < self.scopes.len()).then_some(CteScopeRef { chain: self, id })
    }

    /// The scope that defines `cte_id`. Root scopes are never returned.
    pub fn by_cte_id(&self, cte_id: CteId) -> Option<CteScopeRef<'_>> {
        self.scopes
            .iter()
            .position(|s| s.name.is_some() && s.cte_id == cte_id)
            .map(|i| CteScopeRef { chain: self, id: ScopeId(i) })
    }

    fn get(&self, id: ScopeId) -> Result<&CteScope> {
        self.scopes
            .get(id.0)
            .ok_or_else(|| AnalysisError::MalformedScope(format!("unknown scope {}", id.0)))
    }
}

impl CteScope {
    fn root(cte_id: CteId) -> Self {
        Self {
            name: None,
            parsed_plan: None,
            analyzed_plan: OnceCell::new(),
            analysis_builder: OnceCell::new(),
            cte_id,
            visible: IndexMap::new(),
        }
    }

    fn defined_name(&self) -> Result<&str> {
        self.name
            .as_deref()
            .ok_or_else(|| AnalysisError::MalformedScope("a root scope defines no CTE".into()))
    }

    fn analyze(&self) -> Result<LogicalPlan> {
        let name = self.defined_name()?;
        let builder = self
            .analysis_builder
            .get()
            .ok_or_else(|| AnalysisError::NoAnalysisBuilder(name.to_string()))?;
        builder.build().map_err(|source| {
            warn!(cte = name, error = %source, "CTE analysis failed");
            AnalysisError::CteAnalysis { name: name.to_string(), source }
        })
    }
}

/// Borrowed view of one scope, used for name resolution.
#[derive(Debug, Clone, Copy)]
pub struct CteScopeRef<'a> {
    chain: &'a CteChain,
    id: ScopeId,
}

impl<'a> CteScopeRef<'a> {
    fn scope(&self) -> &'a CteScope {
        &self.chain.scopes[self.id.0]
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn name(&self) -> Option<&'a str> {
        self.scope().name.as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.scope().name.is_none()
    }

    pub fn cte_id(&self) -> CteId {
        self.scope().cte_id
    }

    pub fn parsed_plan(&self) -> Option<&'a SubqueryAlias> {
        self.scope().parsed_plan.as_ref()
    }

    pub fn analyzed_plan(&self) -> Option<&'a Arc<LogicalPlan>> {
        self.scope().analyzed_plan.get()
    }

    /// CTE names visible here, in WITH order.
    pub fn visible_names(self) -> impl Iterator<Item = &'a str> + 'a {
        self.scope().visible.keys().map(String::as_str)
    }

    /// Visible CTEs with their ids, in WITH order.
    pub fn visible_ctes(self) -> impl Iterator<Item = (&'a str, CteId)> + 'a {
        let chain = self.chain;
        self.scope()
            .visible
            .iter()
            .map(move |(name, id)| (name.as_str(), chain.scopes[id.0].cte_id))
    }

    pub fn find(&self, name: &str) -> Option<CteScopeRef<'a>> {
        if self.name() == Some(name) {
            return Some(*self);
        }
        self.scope()
            .visible
            .get(name)
            .map(|&id| CteScopeRef { chain: self.chain, id })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn get_parsed_plan(&self, name: &str) -> Option<&'a SubqueryAlias> {
        self.find(name).and_then(|cte| cte.parsed_plan())
    }

    /// The shared analyzed plan of `name`, if it has been analyzed.
    pub fn get_reuse(&self, name: &str) -> ReuseOutcome {
        match self.find(name) {
            None => ReuseOutcome::Unresolved,
            Some(cte) => match cte.analyzed_plan() {
                Some(plan) => ReuseOutcome::Analyzed(plan.clone()),
                None => ReuseOutcome::NotAnalyzed(cte.cte_id()),
            },
        }
    }

    /// Shared plan of `name`, analyzing it first if needed. The builder runs
    /// at most once per scope on this path; a failed analysis is not cached.
    pub fn get_or_analyze(&self, name: &str) -> Result<Option<Arc<LogicalPlan>>> {
        let Some(cte) = self.find(name) else {
            return Ok(None);
        };
        let scope = cte.scope();
        let plan = scope.analyzed_plan.get_or_try_init(|| {
            let plan = scope.analyze()?;
            debug!(cte = name, cte_id = %scope.cte_id, "analyzed shared CTE plan");
            Ok::<_, AnalysisError>(Arc::new(plan))
        })?;
        Ok(Some(plan.clone()))
    }

    /// A freshly analyzed copy of `name`. Runs the builder on every call and
    /// never touches the shared plan.
    pub fn get_for_inline(&self, name: &str) -> Result<Option<Arc<LogicalPlan>>> {
        let Some(cte) = self.find(name) else {
            return Ok(None);
        };
        let scope = cte.scope();
        let plan = scope.analyze()?;
        debug!(cte = name, cte_id = %scope.cte_id, "analyzed inline CTE copy");
        Ok(Some(Arc::new(plan)))
    }
}
