//! get_neighbors - bounded multi-hop expansion

use crate::registry::{Tool, ToolSpec};
use kgagent_core::{KnowledgeGraph, ParamType, ReturnType, ToolFault, ToolResult, Value};

pub const DEFAULT_DEPTH_CAP: usize = 3;

pub struct GetNeighborsTool {
    spec: ToolSpec,
    depth_cap: usize,
}

impl GetNeighborsTool {
    pub fn new(depth_cap: usize) -> Self {
        let depth_cap = depth_cap.max(1);
        Self {
            spec: ToolSpec::new(
                "get_neighbors",
                format!(
                    "Entities reachable from entity within depth hops (1 to {}) along outgoing edges.",
                    depth_cap
                ),
                ReturnType::EntitySet,
            )
            .param("entity", ParamType::Entity)
            .param("depth", ParamType::Literal),
            depth_cap,
        }
    }

    pub fn depth_cap(&self) -> usize {
        self.depth_cap
    }

    async fn run(&self, args: &[Value], graph: &dyn KnowledgeGraph) -> Result<ToolResult, ToolFault> {
        let entity = super::entity_arg(args, 0)?;
        let raw = super::literal_arg(args, 1)?;
        let depth = raw
            .as_number()
            .filter(|d| d.fract() == 0.0 && *d >= 1.0 && *d <= self.depth_cap as f64)
            .ok_or_else(|| {
                ToolFault::argument(format!(
                    "depth must be an integer from 1 to {}, got {}",
                    self.depth_cap, raw
                ))
            })?;
        Ok(ToolResult::EntitySet(
            graph.neighbors(entity, depth as usize).await,
        ))
    }
}

impl Default for GetNeighborsTool {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH_CAP)
    }
}

#[async_trait::async_trait]
impl Tool for GetNeighborsTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &[Value], graph: &dyn KnowledgeGraph) -> ToolResult {
        self.run(args, graph).await.unwrap_or_else(ToolResult::Error)
    }
}
