//! KG-Agent Tools - the Toolbox and builtin KG operations
//!
//! Each tool is a self-contained file in src/tools/.
//! To add a tool: create the file, implement the Tool trait, add it to
//! `builtin()` and `BUILTIN_TOOLS` below.

pub mod registry;
pub mod tools;

pub use registry::{
    ArgumentError, NoMemory, Param, RefResolver, Tool, ToolSpec, Toolbox, ToolboxBuilder,
};
pub use tools::neighbors::DEFAULT_DEPTH_CAP;

use kgagent_core::{Error, Result};
use std::sync::Arc;

/// Names of every builtin tool, sorted.
pub const BUILTIN_TOOLS: [&str; 12] = [
    "argmax",
    "argmin",
    "count",
    "exists",
    "filter_by_relation_value",
    "get_attribute",
    "get_head_entity",
    "get_neighbors",
    "get_relation",
    "get_relations",
    "intersect",
    "union",
];

/// Construct a builtin tool by name.
pub fn builtin(name: &str, neighbor_depth_cap: usize) -> Option<Arc<dyn Tool>> {
    use tools::*;
    let tool: Arc<dyn Tool> = match name {
        // --- Graph lookups ---
        "get_relation" => Arc::new(relation::GetRelationTool::new()),
        "get_head_entity" => Arc::new(relation::GetHeadEntityTool::new()),
        "get_relations" => Arc::new(relations::GetRelationsTool::new()),
        "get_neighbors" => Arc::new(neighbors::GetNeighborsTool::new(neighbor_depth_cap)),
        "get_attribute" => Arc::new(attribute::GetAttributeTool::new()),
        "exists" => Arc::new(exists::ExistsTool::new()),

        // --- Set algebra ---
        "intersect" => Arc::new(sets::SetOpTool::intersect()),
        "union" => Arc::new(sets::SetOpTool::union()),
        "count" => Arc::new(count::CountTool::new()),
        "filter_by_relation_value" => Arc::new(filter::FilterByValueTool::new()),
        "argmax" => Arc::new(compare::ExtremumTool::argmax()),
        "argmin" => Arc::new(compare::ExtremumTool::argmin()),
        _ => return None,
    };
    Some(tool)
}

/// Toolbox with every builtin tool.
pub fn create_default_toolbox(neighbor_depth_cap: usize) -> Result<Toolbox> {
    create_policy_toolbox(&BUILTIN_TOOLS, neighbor_depth_cap)
}

/// Toolbox restricted to `allowed_tools`.
///
/// A tool that isn't registered is never shown to the model and cannot be
/// called. Unknown names fail the build instead of being skipped.
pub fn create_policy_toolbox<S: AsRef<str>>(
    allowed_tools: &[S],
    neighbor_depth_cap: usize,
) -> Result<Toolbox> {
    let mut builder = ToolboxBuilder::new();
    for name in allowed_tools {
        let name = name.as_ref();
        match builtin(name, neighbor_depth_cap) {
            Some(tool) => {
                builder.register_arc(tool);
            }
            None => {
                tracing::warn!("Unknown tool in policy: {}", name);
                return Err(Error::misconfigured(format!("unknown tool '{}'", name)));
            }
        }
    }
    let toolbox = builder.build()?;
    tracing::debug!(tools = toolbox.len(), "toolbox built");
    Ok(toolbox)
}
