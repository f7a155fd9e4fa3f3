//! intersect / union over entity sets

use crate::registry::{Tool, ToolSpec};
use kgagent_core::{KnowledgeGraph, ParamType, ReturnType, ToolFault, ToolResult, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetOp {
    Intersect,
    Union,
}

impl SetOp {
    fn name(self) -> &'static str {
        match self {
            Self::Intersect => "intersect",
            Self::Union => "union",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Intersect => "Entities present in both sets.",
            Self::Union => "Entities present in either set.",
        }
    }
}

pub struct SetOpTool {
    spec: ToolSpec,
    op: SetOp,
}

impl SetOpTool {
    pub fn new(op: SetOp) -> Self {
        Self {
            spec: ToolSpec::new(op.name(), op.description(), ReturnType::EntitySet)
                .param("left", ParamType::EntitySet)
                .param("right", ParamType::EntitySet),
            op,
        }
    }

    pub fn intersect() -> Self {
        Self::new(SetOp::Intersect)
    }

    pub fn union() -> Self {
        Self::new(SetOp::Union)
    }

    async fn run(&self, args: &[Value], graph: &dyn KnowledgeGraph) -> Result<ToolResult, ToolFault> {
        let left = super::set_arg(args, 0)?;
        let right = super::set_arg(args, 1)?;
        let set = match self.op {
            SetOp::Intersect => graph.intersect(left, right).await,
            SetOp::Union => graph.union(left, right).await,
        };
        Ok(ToolResult::EntitySet(set))
    }
}

#[async_trait::async_trait]
impl Tool for SetOpTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &[Value], graph: &dyn KnowledgeGraph) -> ToolResult {
        self.run(args, graph).await.unwrap_or_else(ToolResult::Error)
    }
}
