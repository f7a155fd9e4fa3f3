//! ScriptedProvider - deterministic decisions for replay and tests
//!
//! Each call to `decide` pops the next decision in the script. When the script
//! is exhausted the default decision is returned forever, which makes "model
//! that never answers" a one-liner.

use crate::provider::{DecisionProvider, LlmError, LlmResult};
use crate::types::{Decision, DecisionContext};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub struct ScriptedProvider {
    script: Mutex<Vec<Decision>>,
    default_decision: Decision,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    /// Always return the same decision.
    pub fn constant(decision: Decision) -> Self {
        Self {
            script: Mutex::new(Vec::new()),
            default_decision: decision,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Replay `decisions` in order, then report the script as exhausted.
    pub fn sequence(decisions: Vec<Decision>) -> Self {
        Self {
            script: Mutex::new(decisions),
            default_decision: Decision::invalid("", "script exhausted"),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Replay `decisions`, then keep returning `fallback`.
    pub fn sequence_then(decisions: Vec<Decision>, fallback: Decision) -> Self {
        Self {
            script: Mutex::new(decisions),
            default_decision: fallback,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub async fn call_count(&self) -> usize {
        self.prompts.lock().await.len()
    }

    /// Rendered contexts seen so far, in call order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    async fn next_decision(&self) -> Decision {
        let mut script = self.script.lock().await;
        if script.is_empty() {
            self.default_decision.clone()
        } else {
            script.remove(0)
        }
    }
}

#[async_trait::async_trait]
impl DecisionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn decide(
        &self,
        context: &DecisionContext,
        cancel: CancellationToken,
    ) -> LlmResult<Decision> {
        if cancel.is_cancelled() {
            return Err(LlmError::Cancelled);
        }
        self.prompts.lock().await.push(context.render());
        Ok(self.next_decision().await)
    }
}
