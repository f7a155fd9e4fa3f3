//! PromptedProvider - turns any text generator into a decision provider

use crate::parser::parse_decision;
use crate::provider::{DecisionProvider, LlmError, LlmResult, TextGenerator};
use crate::types::{Decision, DecisionContext};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct PromptedProvider<G> {
    generator: G,
    name: String,
}

impl<G: TextGenerator> PromptedProvider<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            name: "prompted".to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }
}

#[async_trait::async_trait]
impl<G: TextGenerator> DecisionProvider for PromptedProvider<G> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn decide(
        &self,
        context: &DecisionContext,
        cancel: CancellationToken,
    ) -> LlmResult<Decision> {
        let prompt = context.render();
        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LlmError::Cancelled),
            reply = self.generator.generate(&prompt) => reply?,
        };
        let decision = parse_decision(&reply);
        debug!(provider = %self.name, chars = reply.len(), final_answer = decision.is_final(), "parsed reply");
        Ok(decision)
    }
}
