//! count - cardinality of an entity set

use crate::registry::{Tool, ToolSpec};
use kgagent_core::{KnowledgeGraph, Literal, ParamType, ReturnType, ToolResult, Value};

pub struct CountTool {
    spec: ToolSpec,
}

impl CountTool {
    pub fn new() -> Self {
        Self {
            spec: ToolSpec::new("count", "Number of entities in a set.", ReturnType::Literal)
                .param("entities", ParamType::EntitySet),
        }
    }
}

impl Default for CountTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for CountTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &[Value], _graph: &dyn KnowledgeGraph) -> ToolResult {
        match super::set_arg(args, 0) {
            Ok(set) => ToolResult::Literal(Literal::from(set.len())),
            Err(fault) => fault.into(),
        }
    }
}
