//! Decision types and the decision context shown to the model

use kgagent_core::{Argument, EntityId, ParamType, Question, ReturnType, StepStatus};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// What the model chose to do next.
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    Call { tool: String, args: Vec<Argument> },
    FinalAnswer(Argument),
    /// The reply could not be read as a decision.
    Invalid { raw: String, reason: String },
}

impl Decision {
    pub fn call<I, A>(tool: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Argument>,
    {
        Self::Call {
            tool: tool.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn answer(arg: impl Into<Argument>) -> Self {
        Self::FinalAnswer(arg.into())
    }

    pub fn invalid(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::FinalAnswer(_))
    }
}

/// Parameter description shown to the model
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParamSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ParamType,
}

/// Tool definition shown to the model
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSchema>,
    pub returns: ReturnType,
}

impl ToolSchema {
    /// `get_relation(entity: Entity, relation: Relation) -> EntitySet`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect();
        format!("{}({}) -> {}", self.name, params.join(", "), self.returns)
    }
}

/// One committed step as the model sees it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MemoryLine {
    pub step_index: usize,
    pub tool_name: String,
    pub arguments: Vec<Argument>,
    pub summary: String,
    pub status: StepStatus,
}

impl MemoryLine {
    pub fn render(&self) -> String {
        let args: Vec<String> = self.arguments.iter().map(|a| a.to_string()).collect();
        let marker = match self.status {
            StepStatus::Ok => String::new(),
            other => format!(" [{}]", other),
        };
        format!(
            "#{}{} = {}({}) -> {}",
            self.step_index,
            marker,
            self.tool_name,
            args.join(", "),
            self.summary
        )
    }
}

/// Everything the model needs for one decision. Rendering is deterministic.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DecisionContext {
    pub question: Question,
    pub tools: Vec<ToolSchema>,
    pub memory: Vec<MemoryLine>,
    /// Entities surfaced by earlier steps, sorted and capped.
    pub known_entities: Vec<EntityId>,
    pub step_index: usize,
    pub remaining_steps: usize,
}

const INSTRUCTIONS: &str = "You answer questions over a knowledge graph by calling one tool per step.\n\
Reply with a single line: a tool call such as get_relation(\"Alice\", \"knows\"), \
or final_answer(#k) once the answer is in memory.\n\
Refer to earlier results as #k. Steps marked [error] or [rejected] produced no usable value.";

impl DecisionContext {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(INSTRUCTIONS);
        out.push_str("\n\n");

        let _ = writeln!(out, "Question: {}", self.question.text);
        if !self.question.seeds.is_empty() {
            let seeds: Vec<&str> = self.question.seeds.iter().map(|e| e.as_str()).collect();
            let _ = writeln!(out, "Seed entities: {}", seeds.join(", "));
        }

        out.push_str("\nTools:\n");
        for tool in &self.tools {
            let _ = writeln!(out, "- {}: {}", tool.signature(), tool.description);
        }

        out.push_str("\nMemory:\n");
        if self.memory.is_empty() {
            out.push_str("(empty)\n");
        }
        for line in &self.memory {
            out.push_str(&line.render());
            out.push('\n');
        }

        if !self.known_entities.is_empty() {
            let known: Vec<&str> = self.known_entities.iter().map(|e| e.as_str()).collect();
            let _ = writeln!(out, "\nKnown entities: {}", known.join(", "));
        }

        let _ = write!(
            out,
            "\nStep {} ({} remaining). Next:",
            self.step_index, self.remaining_steps
        );
        out
    }
}
