//! Episode state machine
//!
//! `Running` moves to exactly one of `Answered`, `Failed` or `Aborted`.
//! Transitions out of a terminal status are ignored.

use crate::memory::{KnowledgeMemory, Step, SummaryPolicy};
use kgagent_core::{Answer, MemoryRef, Question};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Unique episode identifier - cheaply cloneable
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct EpisodeId(Arc<str>);

impl EpisodeId {
    pub fn new() -> Self {
        Self(Arc::from(uuid::Uuid::new_v4().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EpisodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EpisodeId {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for EpisodeId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<EpisodeId> for String {
    fn from(id: EpisodeId) -> Self {
        id.0.to_string()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeStatus {
    Running,
    Answered,
    Failed,
    Aborted,
}

impl fmt::Display for EpisodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Answered => write!(f, "answered"),
            Self::Failed => write!(f, "failed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    StepBudgetExceeded,
    RetryBudgetExhausted,
    Cancelled,
    TimedOut,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StepBudgetExceeded => write!(f, "step_budget_exceeded"),
            Self::RetryBudgetExhausted => write!(f, "retry_budget_exhausted"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// Everything one episode owns. Kept after termination for trace export.
#[derive(Clone, Debug)]
pub struct EpisodeState {
    pub id: EpisodeId,
    pub question: Question,
    pub memory: KnowledgeMemory,
    pub step_count: usize,
    pub status: EpisodeStatus,
    pub answer: Option<Answer>,
    pub abort_reason: Option<AbortReason>,
    /// Contract violation that failed the episode.
    pub failure: Option<String>,
}

impl EpisodeState {
    pub fn new(id: EpisodeId, question: Question, policy: SummaryPolicy) -> Self {
        Self {
            id,
            question,
            memory: KnowledgeMemory::new(policy),
            step_count: 0,
            status: EpisodeStatus::Running,
            answer: None,
            abort_reason: None,
            failure: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == EpisodeStatus::Running
    }

    /// Append a step and advance `step_count`.
    pub fn commit(&mut self, step: Step) -> MemoryRef {
        let r = self.memory.append(step);
        self.step_count = self.memory.len();
        r
    }

    pub fn finish(&mut self, answer: Answer) {
        if self.is_running() {
            self.status = EpisodeStatus::Answered;
            self.answer = Some(answer);
        }
    }

    pub fn abort(&mut self, reason: AbortReason) {
        if self.is_running() {
            self.status = EpisodeStatus::Aborted;
            self.abort_reason = Some(reason);
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        if self.is_running() {
            self.status = EpisodeStatus::Failed;
            self.failure = Some(message.into());
        }
    }
}
