//! Knowledge memory - the append-only step arena of one episode
//!
//! A `MemoryRef` is an index into this arena. Steps are never edited or
//! removed, so a reference that resolves once resolves forever.

use kgagent_core::{
    Argument, EntitySet, FaultKind, MemoryRef, RelationSet, StepStatus, ToolFault, ToolResult,
    Value,
};
use kgagent_kg::{Discovered, Execution};
use kgagent_llm::MemoryLine;
use kgagent_tools::RefResolver;
use serde::{Deserialize, Serialize};

/// One committed step.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    /// Assigned by `KnowledgeMemory::append`.
    pub step_index: usize,
    pub tool_name: String,
    /// As the model wrote them; references stay symbolic.
    pub arguments: Vec<Argument>,
    pub result: ToolResult,
    pub status: StepStatus,
    pub discovered: Discovered,
}

impl Step {
    /// A dispatched call. Status follows the result tag.
    pub fn executed(tool_name: impl Into<String>, arguments: Vec<Argument>, execution: Execution) -> Self {
        let status = if execution.result.is_error() {
            StepStatus::Error
        } else {
            StepStatus::Ok
        };
        Self {
            step_index: 0,
            tool_name: tool_name.into(),
            arguments,
            result: execution.result,
            status,
            discovered: execution.discovered,
        }
    }

    /// A decision that failed validation and was not executed.
    pub fn rejected(tool_name: impl Into<String>, arguments: Vec<Argument>, fault: ToolFault) -> Self {
        Self {
            step_index: 0,
            tool_name: tool_name.into(),
            arguments,
            result: ToolResult::Error(fault),
            status: StepStatus::Rejected,
            discovered: Discovered::default(),
        }
    }
}

/// How results are rendered into the decision context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPolicy {
    /// Set members shown before `… (+N more)`.
    pub max_entities: usize,
    /// Longest string shown before it is cut with `…`.
    pub max_text_chars: usize,
    /// Cap on the known-entities line of the prompt.
    pub max_known_entities: usize,
}

impl Default for SummaryPolicy {
    fn default() -> Self {
        Self {
            max_entities: 10,
            max_text_chars: 200,
            max_known_entities: 50,
        }
    }
}

impl SummaryPolicy {
    pub fn summarize(&self, result: &ToolResult) -> String {
        match result {
            ToolResult::EntitySet(set) => self.set(set.iter().map(|e| e.as_str()), set.len()),
            ToolResult::RelationSet(set) => self.set(set.iter().map(|r| r.as_str()), set.len()),
            ToolResult::Literal(l) => self.text(&l.to_string()),
            ToolResult::Boolean(b) => b.to_string(),
            ToolResult::Error(fault) => format!("error[{}]: {}", fault.kind, self.text(&fault.message)),
        }
    }

    fn set<'a>(&self, items: impl Iterator<Item = &'a str>, len: usize) -> String {
        let mut parts: Vec<String> = items.take(self.max_entities).map(|s| self.text(s)).collect();
        if len > parts.len() {
            parts.push(format!("… (+{} more)", len - parts.len()));
        }
        format!("{{{}}}", parts.join(", "))
    }

    fn text(&self, s: &str) -> String {
        match s.char_indices().nth(self.max_text_chars) {
            Some((cut, _)) => format!("{}…", &s[..cut]),
            None => s.to_string(),
        }
    }
}

/// Append-only store of an episode's steps.
#[derive(Clone, Debug, Default)]
pub struct KnowledgeMemory {
    steps: Vec<Step>,
    policy: SummaryPolicy,
    entities: EntitySet,
    relations: RelationSet,
}

impl KnowledgeMemory {
    pub fn new(policy: SummaryPolicy) -> Self {
        Self {
            steps: Vec::new(),
            policy,
            entities: EntitySet::new(),
            relations: RelationSet::new(),
        }
    }

    pub fn policy(&self) -> &SummaryPolicy {
        &self.policy
    }

    /// Commit a step. Its index is the current length.
    pub fn append(&mut self, mut step: Step) -> MemoryRef {
        let index = self.steps.len();
        step.step_index = index;
        self.entities.extend(step.discovered.entities.iter().cloned());
        self.relations.extend(step.discovered.relations.iter().cloned());
        self.steps.push(step);
        MemoryRef::new(index)
    }

    /// The result behind a reference, or a `DanglingRef` fault.
    pub fn resolve(&self, r: MemoryRef) -> Result<&ToolResult, ToolFault> {
        let dangling = |why: String| ToolFault::new(FaultKind::DanglingRef, why);
        let step = self
            .steps
            .get(r.step)
            .ok_or_else(|| dangling(format!("{} is not a committed step", r)))?;
        if r.slot != 0 {
            return Err(dangling(format!("{}: steps have a single result slot", r)));
        }
        if step.status != StepStatus::Ok {
            return Err(dangling(format!("{} has no usable result ({})", r, step.status)));
        }
        Ok(&step.result)
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn summarize(&self, result: &ToolResult) -> String {
        self.policy.summarize(result)
    }

    /// Ordered `(tool, arguments, summary)` lines for the decision context.
    pub fn snapshot_for_prompt(&self) -> Vec<MemoryLine> {
        self.steps
            .iter()
            .map(|s| MemoryLine {
                step_index: s.step_index,
                tool_name: s.tool_name.clone(),
                arguments: s.arguments.clone(),
                summary: self.summarize(&s.result),
                status: s.status,
            })
            .collect()
    }

    pub fn discovered_entities(&self) -> &EntitySet {
        &self.entities
    }

    pub fn discovered_relations(&self) -> &RelationSet {
        &self.relations
    }
}

impl RefResolver for KnowledgeMemory {
    fn resolve_ref(&self, r: MemoryRef) -> Option<Value> {
        self.resolve(r).ok().and_then(ToolResult::to_value)
    }
}
