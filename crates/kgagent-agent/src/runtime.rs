//! Agent runtime - the decide, validate, execute, commit loop

use crate::config::AgentConfig;
use crate::context::ContextBuilder;
use crate::episode::{AbortReason, EpisodeId, EpisodeState, EpisodeStatus};
use crate::memory::{KnowledgeMemory, Step};
use crate::registry::EpisodeRegistry;
use crate::sink::TraceSink;
use crate::trace::ProgramTrace;
use futures::StreamExt;
use kgagent_core::{
    Answer, Argument, EntityId, KnowledgeGraph, Literal, Question, StepStatus, ToolFault, Value,
};
use kgagent_kg::KgExecutor;
use kgagent_llm::{Decision, DecisionProvider, LlmError};
use kgagent_tools::Toolbox;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Tool name recorded for a final answer that failed to resolve.
pub const FINAL_ANSWER_STEP: &str = "final_answer";
/// Tool name recorded for a reply that could not be read as a decision.
pub const INVALID_DECISION_STEP: &str = "invalid_decision";

#[derive(Clone, Debug)]
pub enum EpisodeEvent {
    Started {
        id: EpisodeId,
        question: String,
    },
    Decided {
        step_index: usize,
        decision: Decision,
    },
    StepCommitted {
        step_index: usize,
        tool_name: String,
        status: StepStatus,
        summary: String,
    },
    Finished {
        id: EpisodeId,
        status: EpisodeStatus,
        steps: usize,
    },
}

pub struct AgentRuntime {
    provider: Arc<dyn DecisionProvider>,
    executor: Arc<KgExecutor>,
    context: ContextBuilder,
    episodes: Arc<EpisodeRegistry>,
    sink: Option<Arc<dyn TraceSink>>,
    config: AgentConfig,
}

impl AgentRuntime {
    /// Fails with `Error::Config` when the limits in `config` are invalid.
    pub fn new(
        provider: Arc<dyn DecisionProvider>,
        toolbox: Toolbox,
        graph: Arc<dyn KnowledgeGraph>,
        config: AgentConfig,
    ) -> kgagent_core::Result<Self> {
        let executor = Arc::new(KgExecutor::new(Arc::new(toolbox), graph));
        Self::with_executor(provider, executor, config)
    }

    /// Toolbox built from `config.toolbox`.
    pub fn from_config(
        provider: Arc<dyn DecisionProvider>,
        graph: Arc<dyn KnowledgeGraph>,
        config: AgentConfig,
    ) -> kgagent_core::Result<Self> {
        config.validate()?;
        let toolbox = config.build_toolbox()?;
        Self::new(provider, toolbox, graph, config)
    }

    pub fn with_executor(
        provider: Arc<dyn DecisionProvider>,
        executor: Arc<KgExecutor>,
        config: AgentConfig,
    ) -> kgagent_core::Result<Self> {
        config.validate()?;
        Ok(Self {
            provider,
            context: ContextBuilder::new(executor.toolbox()),
            executor,
            episodes: Arc::new(EpisodeRegistry::new()),
            sink: None,
            config,
        })
    }

    /// Write every finished episode's trace to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn provider(&self) -> &Arc<dyn DecisionProvider> {
        &self.provider
    }
    pub fn executor(&self) -> &Arc<KgExecutor> {
        &self.executor
    }
    pub fn toolbox(&self) -> &Arc<Toolbox> {
        self.executor.toolbox()
    }
    pub fn episodes(&self) -> &Arc<EpisodeRegistry> {
        &self.episodes
    }
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run one episode to termination without external cancellation.
    pub async fn run_episode(&self, question: Question) -> EpisodeState {
        self.run_episode_cancellable(question, CancellationToken::new())
            .await
    }

    /// Run one episode. When `cancel` fires the episode ends `Aborted`
    /// with every step committed so far intact; an in-flight decision or
    /// tool call never becomes a step.
    pub async fn run_episode_cancellable(
        &self,
        question: Question,
        cancel: CancellationToken,
    ) -> EpisodeState {
        self.run(question, None, cancel).await
    }

    /// Like `run_episode_cancellable`, reporting progress on `event_tx`.
    pub async fn run_episode_with_events(
        &self,
        question: Question,
        event_tx: mpsc::Sender<EpisodeEvent>,
        cancel: CancellationToken,
    ) -> EpisodeState {
        self.run(question, Some(&event_tx), cancel).await
    }

    /// Independent episodes, at most `concurrency` at a time. Results keep
    /// the order of `questions`.
    pub async fn run_batch(&self, questions: Vec<Question>, concurrency: usize) -> Vec<EpisodeState> {
        self.run_batch_cancellable(questions, concurrency, CancellationToken::new())
            .await
    }

    pub async fn run_batch_cancellable(
        &self,
        questions: Vec<Question>,
        concurrency: usize,
        cancel: CancellationToken,
    ) -> Vec<EpisodeState> {
        futures::stream::iter(questions)
            .map(|q| self.run_episode_cancellable(q, cancel.clone()))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    async fn run(
        &self,
        question: Question,
        events: Option<&mpsc::Sender<EpisodeEvent>>,
        cancel: CancellationToken,
    ) -> EpisodeState {
        let id = EpisodeId::new();
        let span = info_span!("episode", id = %id);
        async move {
            let mut state = EpisodeState::new(id.clone(), question, self.config.summary.clone());
            let guard = self.episodes.track(&id, &cancel);
            let token = guard.token().clone();
            info!(
                question = %state.question.text,
                seeds = state.question.seeds.len(),
                "Episode started"
            );
            emit(
                events,
                &token,
                EpisodeEvent::Started {
                    id: id.clone(),
                    question: state.question.text.clone(),
                },
            )
            .await;

            match self.config.episode_timeout() {
                Some(limit) => {
                    let drive = self.drive(&mut state, events, &token);
                    if tokio::time::timeout(limit, drive).await.is_err() {
                        warn!(?limit, "Episode timed out");
                        state.abort(AbortReason::TimedOut);
                    }
                }
                None => self.drive(&mut state, events, &token).await,
            }
            drop(guard);

            info!(
                status = %state.status,
                steps = state.step_count,
                abort_reason = ?state.abort_reason,
                "Episode finished"
            );
            if let Some(sink) = &self.sink {
                if let Err(e) = sink.write_trace(&id, &ProgramTrace::export(&state)).await {
                    warn!("Failed to write trace to {}: {}", sink.location(&id), e);
                }
            }
            emit(
                events,
                &token,
                EpisodeEvent::Finished {
                    id: id.clone(),
                    status: state.status,
                    steps: state.step_count,
                },
            )
            .await;
            state
        }
        .instrument(span)
        .await
    }

    async fn drive(
        &self,
        state: &mut EpisodeState,
        events: Option<&mpsc::Sender<EpisodeEvent>>,
        cancel: &CancellationToken,
    ) {
        if let Err(e) = self.executor.check_seeds(&state.question.seeds).await {
            error!("{}", e);
            state.fail(e.to_string());
            return;
        }

        let max_steps = self.config.max_steps;
        let max_rejections = self.config.max_invalid_decisions;
        let mut rejection_streak = 0;

        while state.is_running() {
            if cancel.is_cancelled() {
                debug!("Episode cancelled before step {}", state.step_count);
                state.abort(AbortReason::Cancelled);
                break;
            }

            let context = self.context.build(&state.question, &state.memory, max_steps);
            let decided = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(LlmError::Cancelled),
                d = self.provider.decide(&context, cancel.clone()) => d,
            };
            let decision = match decided {
                Ok(d) => d,
                Err(LlmError::Cancelled) => {
                    debug!("Decision cancelled at step {}", state.step_count);
                    state.abort(AbortReason::Cancelled);
                    break;
                }
                Err(e) => {
                    error!(provider = self.provider.name(), "Decision failed: {}", e);
                    state.fail(e.to_string());
                    break;
                }
            };
            debug!(step = state.step_count, ?decision, "Decided");
            emit(
                events,
                cancel,
                EpisodeEvent::Decided {
                    step_index: state.step_count,
                    decision: decision.clone(),
                },
            )
            .await;
            if cancel.is_cancelled() {
                debug!("Episode cancelled after decision at step {}", state.step_count);
                state.abort(AbortReason::Cancelled);
                break;
            }

            let step = match decision {
                Decision::FinalAnswer(expression) => {
                    match resolve_answer(&state.memory, &expression) {
                        Ok(value) => {
                            state.finish(Answer { expression, value });
                            break;
                        }
                        Err(fault) => Step::rejected(FINAL_ANSWER_STEP, vec![expression], fault),
                    }
                }
                Decision::Invalid { raw, reason } => {
                    let raw = clip(&raw, state.memory.policy().max_text_chars);
                    Step::rejected(
                        INVALID_DECISION_STEP,
                        vec![Argument::Text(raw)],
                        ToolFault::argument(reason),
                    )
                }
                Decision::Call { tool, args } => {
                    let validated = self
                        .executor
                        .toolbox()
                        .validate(&tool, &args, &state.memory);
                    match validated {
                        Err(e) => Step::rejected(tool, args, e.into()),
                        Ok(values) => {
                            match self
                                .executor
                                .execute_cancellable(&tool, &values, cancel.clone())
                                .await
                            {
                                Some(execution) => Step::executed(tool, args, execution),
                                None => {
                                    debug!(tool = %tool, "Tool call cancelled");
                                    state.abort(AbortReason::Cancelled);
                                    break;
                                }
                            }
                        }
                    }
                }
            };

            let rejected = step.status == StepStatus::Rejected;
            let tool_name = step.tool_name.clone();
            let status = step.status;
            let summary = state.memory.summarize(&step.result);
            if rejected {
                warn!(tool = %tool_name, %summary, "Step rejected");
            }
            let committed = state.commit(step);
            emit(
                events,
                cancel,
                EpisodeEvent::StepCommitted {
                    step_index: committed.step,
                    tool_name,
                    status,
                    summary,
                },
            )
            .await;

            rejection_streak = if rejected { rejection_streak + 1 } else { 0 };
            if state.step_count >= max_steps {
                info!(max_steps, "Step budget exhausted");
                state.abort(AbortReason::StepBudgetExceeded);
            } else if rejection_streak >= max_rejections {
                warn!(rejection_streak, "Too many consecutive rejected decisions");
                state.abort(AbortReason::RetryBudgetExhausted);
            }
        }
    }
}

/// Send failures are ignored. A full channel never outlives `cancel`.
async fn emit(
    events: Option<&mpsc::Sender<EpisodeEvent>>,
    cancel: &CancellationToken,
    event: EpisodeEvent,
) {
    if let Some(tx) = events {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {}
            _ = tx.send(event) => {}
        }
    }
}

/// A reference answers with the referenced result; a literal answers with itself.
fn resolve_answer(memory: &KnowledgeMemory, expression: &Argument) -> Result<Value, ToolFault> {
    match expression {
        Argument::Ref(r) => {
            let result = memory.resolve(*r)?;
            result
                .to_value()
                .ok_or_else(|| ToolFault::argument(format!("{} cannot be an answer", r)))
        }
        Argument::Bool(b) => Ok(Value::Boolean(*b)),
        Argument::Number(n) => Ok(Value::Literal(Literal::Number(*n))),
        Argument::Text(s) => Ok(Value::Literal(Literal::text(s.as_str()))),
        Argument::List(items) => Ok(Value::EntitySet(
            items.iter().map(|s| EntityId::new(s.as_str())).collect(),
        )),
    }
}

fn clip(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &s[..cut]),
        None => s.to_string(),
    }
}
