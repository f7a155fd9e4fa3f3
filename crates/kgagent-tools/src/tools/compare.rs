//! argmax / argmin - members with the extreme numeric attribute
//!
//! Members without a numeric value for the relation are skipped. Ties keep
//! every tied member. If no member has a numeric value the result is
//! NotGrounded rather than an empty set, so the model sees why.

use crate::registry::{Tool, ToolSpec};
use kgagent_core::{EntitySet, KnowledgeGraph, ParamType, ReturnType, ToolFault, ToolResult, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extremum {
    Max,
    Min,
}

impl Extremum {
    fn name(self) -> &'static str {
        match self {
            Self::Max => "argmax",
            Self::Min => "argmin",
        }
    }

    fn better(self, candidate: f64, best: f64) -> bool {
        match self {
            Self::Max => candidate > best,
            Self::Min => candidate < best,
        }
    }

    /// Value of one entity: its largest (max) or smallest (min) numeric attribute.
    fn pick(self, values: impl Iterator<Item = f64>) -> Option<f64> {
        values.fold(None, |acc, v| match acc {
            Some(best) if !self.better(v, best) => Some(best),
            _ => Some(v),
        })
    }
}

pub struct ExtremumTool {
    spec: ToolSpec,
    mode: Extremum,
}

impl ExtremumTool {
    pub fn new(mode: Extremum) -> Self {
        let description = match mode {
            Extremum::Max => "Members with the largest numeric value of relation (ties kept).",
            Extremum::Min => "Members with the smallest numeric value of relation (ties kept).",
        };
        Self {
            spec: ToolSpec::new(mode.name(), description, ReturnType::EntitySet)
                .param("entities", ParamType::EntitySet)
                .param("relation", ParamType::Relation),
            mode,
        }
    }

    pub fn argmax() -> Self {
        Self::new(Extremum::Max)
    }

    pub fn argmin() -> Self {
        Self::new(Extremum::Min)
    }

    async fn run(&self, args: &[Value], graph: &dyn KnowledgeGraph) -> Result<ToolResult, ToolFault> {
        let entities = super::set_arg(args, 0)?;
        let relation = super::relation_arg(args, 1)?;

        let mut best: Option<f64> = None;
        let mut winners = EntitySet::new();
        for entity in entities {
            let values = graph.attributes(entity, relation).await;
            let Some(score) = self.mode.pick(values.iter().filter_map(|v| v.as_number())) else {
                continue;
            };
            match best {
                Some(b) if score == b => {
                    winners.insert(entity.clone());
                }
                Some(b) if !self.mode.better(score, b) => {}
                _ => {
                    best = Some(score);
                    winners.clear();
                    winners.insert(entity.clone());
                }
            }
        }

        if winners.is_empty() {
            return Err(ToolFault::not_grounded(format!(
                "no member has a numeric value for {}",
                relation
            )));
        }
        Ok(ToolResult::EntitySet(winners))
    }
}

#[async_trait::async_trait]
impl Tool for ExtremumTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &[Value], graph: &dyn KnowledgeGraph) -> ToolResult {
        self.run(args, graph).await.unwrap_or_else(ToolResult::Error)
    }
}
