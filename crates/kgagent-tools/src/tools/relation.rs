//! get_relation / get_head_entity - one hop along a relation

use crate::registry::{Tool, ToolSpec};
use kgagent_core::{KnowledgeGraph, ParamType, ReturnType, ToolFault, ToolResult, Value};

/// Tail entities of `(entity, relation, ?)`.
pub struct GetRelationTool {
    spec: ToolSpec,
}

impl GetRelationTool {
    pub fn new() -> Self {
        Self {
            spec: ToolSpec::new(
                "get_relation",
                "Entities t such that (entity, relation, t) is in the graph.",
                ReturnType::EntitySet,
            )
            .param("entity", ParamType::Entity)
            .param("relation", ParamType::Relation),
        }
    }

    async fn run(&self, args: &[Value], graph: &dyn KnowledgeGraph) -> Result<ToolResult, ToolFault> {
        let entity = super::entity_arg(args, 0)?;
        let relation = super::relation_arg(args, 1)?;
        Ok(ToolResult::EntitySet(graph.tails(entity, relation).await))
    }
}

impl Default for GetRelationTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for GetRelationTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &[Value], graph: &dyn KnowledgeGraph) -> ToolResult {
        self.run(args, graph).await.unwrap_or_else(ToolResult::Error)
    }
}

/// Head entities of `(?, relation, entity)`.
pub struct GetHeadEntityTool {
    spec: ToolSpec,
}

impl GetHeadEntityTool {
    pub fn new() -> Self {
        Self {
            spec: ToolSpec::new(
                "get_head_entity",
                "Entities h such that (h, relation, entity) is in the graph.",
                ReturnType::EntitySet,
            )
            .param("entity", ParamType::Entity)
            .param("relation", ParamType::Relation),
        }
    }

    async fn run(&self, args: &[Value], graph: &dyn KnowledgeGraph) -> Result<ToolResult, ToolFault> {
        let entity = super::entity_arg(args, 0)?;
        let relation = super::relation_arg(args, 1)?;
        Ok(ToolResult::EntitySet(graph.heads(entity, relation).await))
    }
}

impl Default for GetHeadEntityTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for GetHeadEntityTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &[Value], graph: &dyn KnowledgeGraph) -> ToolResult {
        self.run(args, graph).await.unwrap_or_else(ToolResult::Error)
    }
}
