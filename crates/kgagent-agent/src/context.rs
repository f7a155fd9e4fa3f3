//! Decision context assembly - what the model sees before each step

use crate::memory::KnowledgeMemory;
use kgagent_core::Question;
use kgagent_llm::{DecisionContext, ToolSchema};
use kgagent_tools::Toolbox;

/// Holds the toolbox schemas, which are fixed for the runtime's lifetime.
#[derive(Clone, Debug)]
pub struct ContextBuilder {
    tools: Vec<ToolSchema>,
}

impl ContextBuilder {
    pub fn new(toolbox: &Toolbox) -> Self {
        Self {
            tools: toolbox.schemas(),
        }
    }

    pub fn tools(&self) -> &[ToolSchema] {
        &self.tools
    }

    pub fn build(&self, question: &Question, memory: &KnowledgeMemory, max_steps: usize) -> DecisionContext {
        let step_index = memory.len();
        let known_entities = memory
            .discovered_entities()
            .iter()
            .take(memory.policy().max_known_entities)
            .cloned()
            .collect();
        DecisionContext {
            question: question.clone(),
            tools: self.tools.clone(),
            memory: memory.snapshot_for_prompt(),
            known_entities,
            step_index,
            remaining_steps: max_steps.saturating_sub(step_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Step, SummaryPolicy};
    use kgagent_core::{Argument, EntityId, EntitySet, ToolResult};
    use kgagent_kg::{Discovered, Execution};
    use kgagent_tools::{create_policy_toolbox, DEFAULT_DEPTH_CAP};

    #[test]
    fn context_reflects_memory_and_budget() {
        let toolbox = create_policy_toolbox(&["get_relation", "count"], DEFAULT_DEPTH_CAP).unwrap();
        let builder = ContextBuilder::new(&toolbox);
        let mut memory = KnowledgeMemory::new(SummaryPolicy {
            max_known_entities: 2,
            ..SummaryPolicy::default()
        });
        let result = ToolResult::EntitySet(EntitySet::from([
            EntityId::from("F1"),
            EntityId::from("F2"),
            EntityId::from("F3"),
        ]));
        memory.append(Step::executed(
            "get_relation",
            vec![Argument::text("D"), Argument::text("acted_in")],
            Execution {
                discovered: Discovered::from_result(&result),
                result,
            },
        ));

        let ctx = builder.build(&Question::new("How many?"), &memory, 5);
        assert_eq!(ctx.tools.len(), 2);
        assert_eq!(ctx.memory.len(), 1);
        assert_eq!(ctx.step_index, 1);
        assert_eq!(ctx.remaining_steps, 4);
        assert_eq!(ctx.known_entities, vec![EntityId::from("F1"), EntityId::from("F2")]);
    }
}
