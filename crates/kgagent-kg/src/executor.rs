//! KG Executor - grounds validated tool calls against a graph snapshot.
//!
//! The executor never sees symbolic references: the controller resolves them
//! through memory and the toolbox validates types before anything gets here.
//! What remains is checking that every named entity and relation exists
//! (NotGrounded otherwise), running the tool, and reporting what the result
//! surfaced.

use kgagent_core::{
    EntityId, EntitySet, Error, FaultKind, KnowledgeGraph, RelationSet, ToolResult, Value,
};
use kgagent_tools::{Tool, Toolbox};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Entities and relations a step made visible.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Discovered {
    pub entities: EntitySet,
    pub relations: RelationSet,
}

impl Discovered {
    pub fn from_result(result: &ToolResult) -> Self {
        match result {
            ToolResult::EntitySet(s) => Self {
                entities: s.clone(),
                relations: RelationSet::new(),
            },
            ToolResult::RelationSet(s) => Self {
                entities: EntitySet::new(),
                relations: s.clone(),
            },
            _ => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }
}

/// Outcome of one dispatched call.
#[derive(Clone, Debug, PartialEq)]
pub struct Execution {
    pub result: ToolResult,
    pub discovered: Discovered,
}

impl Execution {
    fn new(result: ToolResult) -> Self {
        let discovered = Discovered::from_result(&result);
        Self { result, discovered }
    }
}

/// Stateless service shared by every episode.
pub struct KgExecutor {
    toolbox: Arc<Toolbox>,
    graph: Arc<dyn KnowledgeGraph>,
}

impl KgExecutor {
    pub fn new(toolbox: Arc<Toolbox>, graph: Arc<dyn KnowledgeGraph>) -> Self {
        let stats = graph.stats();
        info!(
            tools = toolbox.len(),
            graph = graph.name(),
            entities = stats.entities,
            relations = stats.relations,
            edges = stats.edges,
            "KG executor ready"
        );
        Self { toolbox, graph }
    }

    pub fn toolbox(&self) -> &Arc<Toolbox> {
        &self.toolbox
    }

    pub fn graph(&self) -> &Arc<dyn KnowledgeGraph> {
        &self.graph
    }

    /// Every seed must name an entity in the graph.
    pub async fn check_seeds(&self, seeds: &[EntityId]) -> kgagent_core::Result<()> {
        for seed in seeds {
            if !self.graph.has_entity(seed).await {
                return Err(Error::UngroundedSeed(seed.to_string()));
            }
        }
        Ok(())
    }

    /// First argument that names something absent from the graph.
    async fn ungrounded(&self, args: &[Value]) -> Option<String> {
        for arg in args {
            match arg {
                Value::Entity(e) => {
                    if !self.graph.has_entity(e).await {
                        return Some(format!("entity '{}' is not in the graph", e));
                    }
                }
                Value::Relation(r) => {
                    if !self.graph.has_relation(r).await {
                        return Some(format!("relation '{}' is not in the graph", r));
                    }
                }
                Value::EntitySet(set) => {
                    for e in set {
                        if !self.graph.has_entity(e).await {
                            return Some(format!("entity '{}' is not in the graph", e));
                        }
                    }
                }
                Value::RelationSet(set) => {
                    for r in set {
                        if !self.graph.has_relation(r).await {
                            return Some(format!("relation '{}' is not in the graph", r));
                        }
                    }
                }
                Value::Literal(_) | Value::Boolean(_) => {}
            }
        }
        None
    }

    /// Look up the tool and ground its arguments. `Err` carries the
    /// finished execution when the call cannot run.
    async fn prepare(
        &self,
        tool_name: &str,
        args: &[Value],
    ) -> Result<Arc<dyn Tool>, Execution> {
        let Some(tool) = self.toolbox.get(tool_name) else {
            return Err(Execution::new(ToolResult::error(
                FaultKind::UnknownTool,
                format!("unknown tool '{}'", tool_name),
            )));
        };
        if let Some(message) = self.ungrounded(args).await {
            warn!(tool = tool_name, %message, "Ungrounded argument");
            return Err(Execution::new(ToolResult::not_grounded(message)));
        }
        Ok(tool)
    }

    pub async fn execute(&self, tool_name: &str, args: &[Value]) -> Execution {
        let tool = match self.prepare(tool_name, args).await {
            Ok(tool) => tool,
            Err(done) => return done,
        };
        let result = tool.execute(args, self.graph.as_ref()).await;
        debug!(tool = tool_name, error = result.is_error(), "Tool executed");
        Execution::new(result)
    }

    /// Like `execute`, raced against `cancel`. `None` when cancelled before
    /// the tool finished.
    pub async fn execute_cancellable(
        &self,
        tool_name: &str,
        args: &[Value],
        cancel: CancellationToken,
    ) -> Option<Execution> {
        let tool = match self.prepare(tool_name, args).await {
            Ok(tool) => tool,
            Err(done) => return Some(done),
        };
        let result = tool
            .execute_cancellable(args, self.graph.as_ref(), cancel)
            .await?;
        debug!(tool = tool_name, error = result.is_error(), "Tool executed");
        Some(Execution::new(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TripleStore;
    use kgagent_core::{Literal, RelationId};
    use kgagent_tools::{create_default_toolbox, NoMemory, DEFAULT_DEPTH_CAP};

    fn executor() -> KgExecutor {
        let mut b = TripleStore::builder();
        b.add_triple("D", "acted_in", "F1")
            .add_triple("D", "acted_in", "F2")
            .add_attribute("F1", "release_year", 1999.0);
        let toolbox = Arc::new(create_default_toolbox(DEFAULT_DEPTH_CAP).unwrap());
        KgExecutor::new(toolbox, Arc::new(b.build()))
    }

    fn entity(s: &str) -> Value {
        Value::Entity(EntityId::from(s))
    }

    fn relation(s: &str) -> Value {
        Value::Relation(RelationId::from(s))
    }

    #[tokio::test]
    async fn executes_and_reports_discoveries() {
        let ex = executor();
        let out = ex
            .execute("get_relation", &[entity("D"), relation("acted_in")])
            .await;
        let films: EntitySet = ["F1", "F2"].iter().map(|s| EntityId::from(*s)).collect();
        assert_eq!(out.result, ToolResult::EntitySet(films.clone()));
        assert_eq!(out.discovered.entities, films);

        let out = ex.execute("get_relations", &[entity("F1")]).await;
        assert!(out.discovered.relations.contains(&RelationId::from("release_year")));
    }

    #[tokio::test]
    async fn unknown_entity_is_not_grounded() {
        let ex = executor();
        let out = ex
            .execute("get_relation", &[entity("Nobody"), relation("acted_in")])
            .await;
        assert_eq!(out.result.fault().unwrap().kind, FaultKind::NotGrounded);
        assert!(out.discovered.is_empty());

        let out = ex
            .execute("get_relation", &[entity("D"), relation("directed")])
            .await;
        assert_eq!(out.result.fault().unwrap().kind, FaultKind::NotGrounded);
    }

    #[tokio::test]
    async fn set_members_are_grounded_too() {
        let ex = executor();
        let args = ex
            .toolbox()
            .validate(
                "count",
                &[kgagent_core::Argument::List(vec!["F1".into(), "F9".into()])],
                &NoMemory,
            )
            .unwrap();
        let out = ex.execute("count", &args).await;
        assert!(out.result.fault().unwrap().message.contains("F9"));
    }

    #[tokio::test]
    async fn deterministic_for_identical_calls() {
        let ex = executor();
        let args = [entity("F1"), relation("release_year")];
        let a = ex.execute("get_attribute", &args).await;
        let b = ex.execute("get_attribute", &args).await;
        assert_eq!(a, b);
        assert_eq!(a.result, ToolResult::Literal(Literal::Number(1999.0)));
    }

    #[tokio::test]
    async fn cancelled_call_returns_none() {
        let ex = executor();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let out = ex
            .execute_cancellable("get_relation", &[entity("D"), relation("acted_in")], cancel)
            .await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn seeds_must_exist() {
        let ex = executor();
        assert!(ex.check_seeds(&[EntityId::from("D")]).await.is_ok());
        let err = ex.check_seeds(&[EntityId::from("Q")]).await.unwrap_err();
        assert!(matches!(err, Error::UngroundedSeed(_)));
    }
}
