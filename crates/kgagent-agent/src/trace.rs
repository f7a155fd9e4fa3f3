//! Trace recorder - exports an episode as an ordered, program-like record
//!
//! Export is pure: the same episode always yields the same trace, and the
//! episode id is deliberately not part of it so replays diff cleanly.

use crate::episode::{AbortReason, EpisodeState, EpisodeStatus};
use kgagent_core::{Argument, EntityId, Result, StepStatus, Value};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_index: usize,
    pub tool_name: String,
    /// References stay symbolic (`#0`), never inlined.
    pub arguments: Vec<Argument>,
    pub result_summary: String,
    pub status: StepStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub expression: Argument,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgramTrace {
    pub question: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seeds: Vec<EntityId>,
    pub steps: Vec<StepRecord>,
    pub final_answer: Option<AnswerRecord>,
    pub status: EpisodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<AbortReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl ProgramTrace {
    pub fn export(episode: &EpisodeState) -> Self {
        let memory = &episode.memory;
        Self {
            question: episode.question.text.clone(),
            seeds: episode.question.seeds.clone(),
            steps: memory
                .steps()
                .iter()
                .map(|s| StepRecord {
                    step_index: s.step_index,
                    tool_name: s.tool_name.clone(),
                    arguments: s.arguments.clone(),
                    result_summary: memory.summarize(&s.result),
                    status: s.status,
                })
                .collect(),
            final_answer: episode.answer.as_ref().map(|a| AnswerRecord {
                expression: a.expression.clone(),
                value: a.value.clone(),
            }),
            status: episode.status,
            abort_reason: episode.abort_reason,
            failure: episode.failure.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// One line per step:
    ///
    /// ```text
    /// #0 = get_relation("D", "acted_in")
    /// #1 = count(#0)
    /// answer(#1)
    /// ```
    ///
    /// Rejected steps are kept as comments so indices stay aligned.
    pub fn to_program(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {}", self.question);
        for step in &self.steps {
            let args: Vec<String> = step.arguments.iter().map(|a| a.to_string()).collect();
            let call = format!("{}({})", step.tool_name, args.join(", "));
            let _ = match step.status {
                StepStatus::Ok => writeln!(out, "#{} = {}", step.step_index, call),
                StepStatus::Error => writeln!(
                    out,
                    "#{} = {}  # {}",
                    step.step_index, call, step.result_summary
                ),
                StepStatus::Rejected => writeln!(
                    out,
                    "# #{} rejected: {}  # {}",
                    step.step_index, call, step.result_summary
                ),
            };
        }
        match (&self.final_answer, self.status) {
            (Some(answer), _) => {
                let _ = writeln!(out, "answer({})", answer.expression);
            }
            (None, EpisodeStatus::Aborted) => {
                let reason = self
                    .abort_reason
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let _ = writeln!(out, "# aborted: {}", reason);
            }
            (None, EpisodeStatus::Failed) => {
                let _ = writeln!(out, "# failed: {}", self.failure.as_deref().unwrap_or(""));
            }
            (None, _) => {}
        }
        out
    }
}
