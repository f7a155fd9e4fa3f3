//! get_attribute - scalar value of an entity

use crate::registry::{Tool, ToolSpec};
use kgagent_core::{KnowledgeGraph, ParamType, ReturnType, ToolFault, ToolResult, Value};

/// Smallest attribute value, so multi-valued attributes answer deterministically.
pub struct GetAttributeTool {
    spec: ToolSpec,
}

impl GetAttributeTool {
    pub fn new() -> Self {
        Self {
            spec: ToolSpec::new(
                "get_attribute",
                "Literal value of an attribute of an entity (the smallest if there are several).",
                ReturnType::Literal,
            )
            .param("entity", ParamType::Entity)
            .param("relation", ParamType::Relation),
        }
    }

    async fn run(&self, args: &[Value], graph: &dyn KnowledgeGraph) -> Result<ToolResult, ToolFault> {
        let entity = super::entity_arg(args, 0)?;
        let relation = super::relation_arg(args, 1)?;
        let values = graph.attributes(entity, relation).await;
        values
            .into_iter()
            .min_by(|a, b| {
                a.sort_key()
                    .partial_cmp(&b.sort_key())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(ToolResult::Literal)
            .ok_or_else(|| {
                ToolFault::not_grounded(format!("{} has no value for {}", entity, relation))
            })
    }
}

impl Default for GetAttributeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for GetAttributeTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &[Value], graph: &dyn KnowledgeGraph) -> ToolResult {
        self.run(args, graph).await.unwrap_or_else(ToolResult::Error)
    }
}
