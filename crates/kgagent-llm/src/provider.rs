//! Decision provider trait

use crate::types::{Decision, DecisionContext};
use tokio_util::sync::CancellationToken;

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// LLM error types
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("cancelled")]
    Cancelled,
}

/// The controller's only view of the model: given the rendered context,
/// pick the next tool call or give the final answer.
///
/// Unparseable model output is not an error here; providers return
/// `Decision::Invalid` so the loop can record it and let the model retry.
/// An `Err` means the capability itself failed.
#[async_trait::async_trait]
pub trait DecisionProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn decide(
        &self,
        context: &DecisionContext,
        cancel: CancellationToken,
    ) -> LlmResult<Decision>;
}

/// Raw text completion backend (a local model, an HTTP endpoint, a fixture).
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> LlmResult<String>;
}
