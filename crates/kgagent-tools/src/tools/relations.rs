//! get_relations - what can be asked about an entity

use crate::registry::{Tool, ToolSpec};
use kgagent_core::{KnowledgeGraph, ParamType, ReturnType, ToolResult, Value};

pub struct GetRelationsTool {
    spec: ToolSpec,
}

impl GetRelationsTool {
    pub fn new() -> Self {
        Self {
            spec: ToolSpec::new(
                "get_relations",
                "Outgoing relations of an entity, edges and attributes alike.",
                ReturnType::RelationSet,
            )
            .param("entity", ParamType::Entity),
        }
    }
}

impl Default for GetRelationsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for GetRelationsTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &[Value], graph: &dyn KnowledgeGraph) -> ToolResult {
        match super::entity_arg(args, 0) {
            Ok(entity) => ToolResult::RelationSet(graph.relations_of(entity).await),
            Err(fault) => fault.into(),
        }
    }
}
