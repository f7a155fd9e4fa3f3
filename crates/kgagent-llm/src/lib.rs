//! KG-Agent LLM - The decision capability that drives tool selection

pub mod parser;
pub mod prompted;
pub mod provider;
pub mod scripted;
pub mod types;

pub use parser::parse_decision;
pub use prompted::PromptedProvider;
pub use provider::{DecisionProvider, LlmError, LlmResult, TextGenerator};
pub use scripted::ScriptedProvider;
pub use tokio_util::sync::CancellationToken;
pub use types::*;
