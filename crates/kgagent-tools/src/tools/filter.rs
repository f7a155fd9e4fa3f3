//! filter_by_relation_value - keep members whose relation has a given value

use crate::registry::{Tool, ToolSpec};
use kgagent_core::{KnowledgeGraph, ParamType, ReturnType, ToolFault, ToolResult, Value};

pub struct FilterByValueTool {
    spec: ToolSpec,
}

impl FilterByValueTool {
    pub fn new() -> Self {
        Self {
            spec: ToolSpec::new(
                "filter_by_relation_value",
                "Members of entities whose relation has the given value (attribute or target entity).",
                ReturnType::EntitySet,
            )
            .param("entities", ParamType::EntitySet)
            .param("relation", ParamType::Relation)
            .param("value", ParamType::Literal),
        }
    }

    async fn run(&self, args: &[Value], graph: &dyn KnowledgeGraph) -> Result<ToolResult, ToolFault> {
        let entities = super::set_arg(args, 0)?;
        let relation = super::relation_arg(args, 1)?;
        let value = super::literal_arg(args, 2)?;
        Ok(ToolResult::EntitySet(
            graph.filter_by_value(entities, relation, value).await,
        ))
    }
}

impl Default for FilterByValueTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for FilterByValueTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &[Value], graph: &dyn KnowledgeGraph) -> ToolResult {
        self.run(args, graph).await.unwrap_or_else(ToolResult::Error)
    }
}
