//! KG-Agent - a language-model controlled reasoning loop over a knowledge graph
//!
//! The member crates, re-exported under one roof:
//!
//! - [`kgagent_core`]: entities, values, tool results and the `KnowledgeGraph` trait
//! - [`kgagent_llm`]: the decision capability and its prompt and reply formats
//! - [`kgagent_tools`]: the toolbox and the builtin graph operations
//! - [`kgagent_kg`]: the in-memory triple store, loaders and the executor
//! - [`kgagent_agent`]: the episode loop, knowledge memory and trace recorder

pub use kgagent_agent;
pub use kgagent_core;
pub use kgagent_kg;
pub use kgagent_llm;
pub use kgagent_tools;

pub use kgagent_agent::{
    AbortReason, AgentConfig, AgentRuntime, EpisodeEvent, EpisodeId, EpisodeState, EpisodeStatus,
    KnowledgeMemory, LocalFsSink, ProgramTrace, TraceSink,
};
pub use kgagent_core::{
    Answer, Argument, EntityId, Error, KnowledgeGraph, Literal, MemoryRef, Question, RelationId,
    Result, StepStatus, ToolResult, Value,
};
pub use kgagent_kg::{load_path, KgExecutor, TripleStore};
pub use kgagent_llm::{
    parse_decision, CancellationToken, Decision, DecisionProvider, PromptedProvider,
    ScriptedProvider, TextGenerator,
};
pub use kgagent_tools::{create_default_toolbox, create_policy_toolbox, Tool, Toolbox};
