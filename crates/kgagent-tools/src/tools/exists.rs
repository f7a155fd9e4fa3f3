//! exists - edge membership check

use crate::registry::{Tool, ToolSpec};
use kgagent_core::{KnowledgeGraph, ParamType, ReturnType, ToolFault, ToolResult, Value};

pub struct ExistsTool {
    spec: ToolSpec,
}

impl ExistsTool {
    pub fn new() -> Self {
        Self {
            spec: ToolSpec::new(
                "exists",
                "Whether the edge (head, relation, tail) is in the graph.",
                ReturnType::Boolean,
            )
            .param("head", ParamType::Entity)
            .param("relation", ParamType::Relation)
            .param("tail", ParamType::Entity),
        }
    }

    async fn run(&self, args: &[Value], graph: &dyn KnowledgeGraph) -> Result<ToolResult, ToolFault> {
        let head = super::entity_arg(args, 0)?;
        let relation = super::relation_arg(args, 1)?;
        let tail = super::entity_arg(args, 2)?;
        Ok(ToolResult::Boolean(graph.has_edge(head, relation, tail).await))
    }
}

impl Default for ExistsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for ExistsTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &[Value], graph: &dyn KnowledgeGraph) -> ToolResult {
        self.run(args, graph).await.unwrap_or_else(ToolResult::Error)
    }
}
