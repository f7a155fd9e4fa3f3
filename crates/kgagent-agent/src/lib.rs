//! KG-Agent Agent - the episode loop, knowledge memory and trace recorder

pub mod config;
pub mod context;
pub mod episode;
pub mod memory;
pub mod registry;
pub mod runtime;
pub mod sink;
pub mod trace;

pub use config::{AgentConfig, ToolboxConfig, ToolsConfig};
pub use context::ContextBuilder;
pub use episode::{AbortReason, EpisodeId, EpisodeState, EpisodeStatus};
pub use memory::{KnowledgeMemory, Step, SummaryPolicy};
pub use registry::{EpisodeGuard, EpisodeRegistry};
pub use runtime::{AgentRuntime, EpisodeEvent, FINAL_ANSWER_STEP, INVALID_DECISION_STEP};
pub use sink::{LocalFsSink, TraceSink};
pub use trace::{AnswerRecord, ProgramTrace, StepRecord};
