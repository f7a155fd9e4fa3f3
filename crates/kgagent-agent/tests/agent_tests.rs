//! Tests for kgagent-agent: the episode loop end to end over an in-memory graph

use kgagent_agent::*;
use kgagent_core::*;
use kgagent_kg::TripleStore;
use kgagent_llm::{Decision, DecisionContext, DecisionProvider, LlmError, LlmResult, ScriptedProvider};
use kgagent_tools::{create_default_toolbox, DEFAULT_DEPTH_CAP};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// ===========================================================================
// Fixtures
// ===========================================================================

fn film_store() -> TripleStore {
    let mut b = TripleStore::builder();
    b.add_triple("D", "acted_in", "F1")
        .add_triple("D", "acted_in", "F2")
        .add_triple("E", "acted_in", "F2")
        .add_triple("F1", "directed_by", "S")
        .add_attribute("F1", "release_year", 1999.0)
        .add_attribute("F2", "release_year", 2004.0);
    b.build()
}

fn film_graph() -> Arc<dyn KnowledgeGraph> {
    Arc::new(film_store())
}

fn config(max_steps: usize) -> AgentConfig {
    AgentConfig {
        max_steps,
        ..AgentConfig::default()
    }
}

fn runtime(provider: Arc<dyn DecisionProvider>, config: AgentConfig) -> AgentRuntime {
    let toolbox = create_default_toolbox(DEFAULT_DEPTH_CAP).unwrap();
    AgentRuntime::new(provider, toolbox, film_graph(), config).unwrap()
}

fn film_question() -> Question {
    Question::new("How many films did D act in?").with_seeds(["D"])
}

fn film_script() -> Vec<Decision> {
    vec![
        Decision::call("get_relation", ["D", "acted_in"]),
        Decision::call("count", ["#0"]),
        Decision::answer("#1"),
    ]
}

fn set(items: &[&str]) -> EntitySet {
    items.iter().map(|s| EntityId::from(*s)).collect()
}

fn statuses(state: &EpisodeState) -> Vec<StepStatus> {
    state.memory.steps().iter().map(|s| s.status).collect()
}

/// Answers scripted decisions until `stall_at`, then never returns.
struct StallingProvider {
    script: ScriptedProvider,
    stall_at: usize,
}

#[async_trait::async_trait]
impl DecisionProvider for StallingProvider {
    fn name(&self) -> &str {
        "stalling"
    }

    async fn decide(&self, context: &DecisionContext, cancel: CancellationToken) -> LlmResult<Decision> {
        if context.step_index >= self.stall_at {
            std::future::pending::<()>().await;
        }
        self.script.decide(context, cancel).await
    }
}

struct FailingProvider;

#[async_trait::async_trait]
impl DecisionProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn decide(&self, _: &DecisionContext, _: CancellationToken) -> LlmResult<Decision> {
        Err(LlmError::RequestFailed("connection refused".into()))
    }
}

/// Film graph whose forward edge lookups never return.
struct StallingGraph {
    inner: TripleStore,
}

#[async_trait::async_trait]
impl KnowledgeGraph for StallingGraph {
    async fn has_entity(&self, entity: &EntityId) -> bool {
        self.inner.has_entity(entity).await
    }
    async fn has_relation(&self, relation: &RelationId) -> bool {
        self.inner.has_relation(relation).await
    }
    async fn tails(&self, _: &EntityId, _: &RelationId) -> EntitySet {
        std::future::pending().await
    }
    async fn heads(&self, tail: &EntityId, relation: &RelationId) -> EntitySet {
        self.inner.heads(tail, relation).await
    }
    async fn relations_of(&self, entity: &EntityId) -> RelationSet {
        self.inner.relations_of(entity).await
    }
    async fn attributes(&self, entity: &EntityId, relation: &RelationId) -> Vec<Literal> {
        self.inner.attributes(entity, relation).await
    }
    async fn has_edge(&self, head: &EntityId, relation: &RelationId, tail: &EntityId) -> bool {
        self.inner.has_edge(head, relation, tail).await
    }
}

fn cancel_after(cancel: &CancellationToken, ms: u64) {
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        trigger.cancel();
    });
}

/// Answers every question with its own text after a delay that shrinks
/// with the question number, so later episodes finish first.
struct EchoProvider;

#[async_trait::async_trait]
impl DecisionProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn decide(&self, context: &DecisionContext, _: CancellationToken) -> LlmResult<Decision> {
        let n: u64 = context
            .question
            .text
            .trim_start_matches('q')
            .parse()
            .unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(40u64.saturating_sub(n * 10))).await;
        Ok(Decision::answer(Argument::text(context.question.text.clone())))
    }
}

// ===========================================================================
// Successful episodes
// ===========================================================================

#[tokio::test]
async fn film_count_episode() {
    let provider = Arc::new(ScriptedProvider::sequence(film_script()));
    let rt = runtime(provider.clone(), config(10));
    let state = rt.run_episode(film_question()).await;

    assert_eq!(state.status, EpisodeStatus::Answered);
    assert_eq!(state.step_count, 2);
    assert_eq!(state.step_count, state.memory.len());
    let indices: Vec<usize> = state.memory.steps().iter().map(|s| s.step_index).collect();
    assert_eq!(indices, vec![0, 1]);
    assert_eq!(
        state.memory.get(0).unwrap().result,
        ToolResult::EntitySet(set(&["F1", "F2"]))
    );
    let answer = state.answer.as_ref().unwrap();
    assert_eq!(answer.expression, Argument::Ref(MemoryRef::new(1)));
    assert_eq!(answer.value, Value::Literal(Literal::Number(2.0)));
    assert_eq!(provider.call_count().await, 3);
    assert!(rt.episodes().is_empty());

    let trace = ProgramTrace::export(&state);
    assert_eq!(ProgramTrace::from_json(&trace.to_json().unwrap()).unwrap(), trace);
    let program = trace.to_program();
    assert_eq!(
        program.lines().collect::<Vec<_>>(),
        vec![
            "# How many films did D act in?",
            "#0 = get_relation(\"D\", \"acted_in\")",
            "#1 = count(#0)",
            "answer(#1)",
        ]
    );
}

#[tokio::test]
async fn prompts_show_committed_steps_only() {
    let provider = Arc::new(ScriptedProvider::sequence(film_script()));
    let rt = runtime(provider.clone(), config(10));
    rt.run_episode(film_question()).await;

    let prompts = provider.prompts().await;
    assert_eq!(prompts.len(), 3);
    assert!(!prompts[0].contains("#0 ="));
    assert!(prompts[1].contains("#0 = get_relation(\"D\", \"acted_in\") -> {F1, F2}"));
    assert!(!prompts[1].contains("#1 ="));
    assert!(prompts[2].contains("#1 = count(#0) -> 2"));
}

#[tokio::test]
async fn literal_final_answer() {
    let provider = Arc::new(ScriptedProvider::constant(Decision::answer(true)));
    let state = runtime(provider, config(3)).run_episode(Question::new("Is it?")).await;
    assert_eq!(state.status, EpisodeStatus::Answered);
    assert_eq!(state.step_count, 0);
    assert_eq!(state.answer.unwrap().value, Value::Boolean(true));
}

// ===========================================================================
// Recoverable faults
// ===========================================================================

#[tokio::test]
async fn future_reference_is_rejected_and_episode_continues() {
    let provider = Arc::new(ScriptedProvider::sequence(vec![
        Decision::call("count", ["#3"]),
        Decision::call("get_relation", ["D", "acted_in"]),
        Decision::call("count", ["#1"]),
        Decision::answer("#2"),
    ]));
    let state = runtime(provider, config(10)).run_episode(film_question()).await;

    assert_eq!(state.status, EpisodeStatus::Answered);
    assert_eq!(
        statuses(&state),
        vec![StepStatus::Rejected, StepStatus::Ok, StepStatus::Ok]
    );
    let rejected = state.memory.get(0).unwrap();
    assert_eq!(rejected.result.fault().unwrap().kind, FaultKind::DanglingRef);
    assert_eq!(rejected.arguments, vec![Argument::Ref(MemoryRef::new(3))]);
    assert_eq!(state.answer.unwrap().value, Value::Literal(Literal::Number(2.0)));
}

#[tokio::test]
async fn not_grounded_step_is_recorded_then_recovered() {
    let provider = Arc::new(ScriptedProvider::sequence(vec![
        Decision::call("get_relation", ["Nobody", "acted_in"]),
        Decision::call("count", ["#0"]),
        Decision::call("get_relation", ["D", "acted_in"]),
        Decision::answer("#2"),
    ]));
    let state = runtime(provider, config(10)).run_episode(film_question()).await;

    assert_eq!(state.status, EpisodeStatus::Answered);
    assert_eq!(
        statuses(&state),
        vec![StepStatus::Error, StepStatus::Rejected, StepStatus::Ok]
    );
    assert_eq!(
        state.memory.get(0).unwrap().result.fault().unwrap().kind,
        FaultKind::NotGrounded
    );
    // An error step cannot be referenced.
    assert_eq!(
        state.memory.get(1).unwrap().result.fault().unwrap().kind,
        FaultKind::DanglingRef
    );
    assert_eq!(state.answer.unwrap().value, Value::EntitySet(set(&["F1", "F2"])));
}

#[tokio::test]
async fn dangling_final_answer_becomes_a_rejected_step() {
    let provider = Arc::new(ScriptedProvider::sequence(vec![
        Decision::answer("#0"),
        Decision::call("get_relation", ["D", "acted_in"]),
        Decision::answer("#1"),
    ]));
    let state = runtime(provider, config(10)).run_episode(film_question()).await;

    assert_eq!(state.status, EpisodeStatus::Answered);
    let first = state.memory.get(0).unwrap();
    assert_eq!(first.tool_name, FINAL_ANSWER_STEP);
    assert_eq!(first.status, StepStatus::Rejected);
    assert_eq!(state.answer.unwrap().expression, Argument::Ref(MemoryRef::new(1)));
}

#[tokio::test]
async fn unknown_tool_and_bad_arity_are_rejected() {
    let provider = Arc::new(ScriptedProvider::sequence(vec![
        Decision::call("delete_everything", ["D"]),
        Decision::call("count", Vec::<Argument>::new()),
        Decision::answer(1.0),
    ]));
    let state = runtime(provider, config(10)).run_episode(film_question()).await;

    let kinds: Vec<FaultKind> = state
        .memory
        .steps()
        .iter()
        .map(|s| s.result.fault().unwrap().kind)
        .collect();
    assert_eq!(kinds, vec![FaultKind::UnknownTool, FaultKind::ArgumentError]);
    assert_eq!(state.status, EpisodeStatus::Answered);
}

#[tokio::test]
async fn policy_toolbox_hides_other_builtins() {
    let mut cfg = config(10);
    cfg.toolbox.tools = Some(vec!["get_relation".into()]);
    let provider = Arc::new(ScriptedProvider::sequence(vec![
        Decision::call("get_relation", ["D", "acted_in"]),
        Decision::call("count", ["#0"]),
        Decision::answer("#0"),
    ]));
    let rt = AgentRuntime::from_config(provider.clone(), film_graph(), cfg).unwrap();
    let state = rt.run_episode(film_question()).await;

    assert_eq!(rt.toolbox().names(), vec!["get_relation"]);
    assert_eq!(
        state.memory.get(1).unwrap().result.fault().unwrap().kind,
        FaultKind::UnknownTool
    );
    assert!(!provider.prompts().await[0].contains("count("));
}

// ===========================================================================
// Budgets and termination
// ===========================================================================

#[tokio::test]
async fn step_budget_bounds_a_model_that_never_answers() {
    let provider = Arc::new(ScriptedProvider::constant(Decision::call(
        "get_relations",
        ["D"],
    )));
    let state = runtime(provider.clone(), config(5)).run_episode(film_question()).await;

    assert_eq!(state.status, EpisodeStatus::Aborted);
    assert_eq!(state.abort_reason, Some(AbortReason::StepBudgetExceeded));
    assert_eq!(state.step_count, 5);
    assert_eq!(state.memory.len(), 5);
    assert!(state.answer.is_none());
    assert_eq!(provider.call_count().await, 5);
    assert!(ProgramTrace::export(&state)
        .to_program()
        .ends_with("# aborted: step_budget_exceeded\n"));
}

#[tokio::test]
async fn consecutive_invalid_decisions_exhaust_retry_budget() {
    let provider = Arc::new(ScriptedProvider::constant(Decision::invalid(
        "I think the answer is probably two",
        "no tool call found",
    )));
    let state = runtime(provider, config(10)).run_episode(film_question()).await;

    assert_eq!(state.status, EpisodeStatus::Aborted);
    assert_eq!(state.abort_reason, Some(AbortReason::RetryBudgetExhausted));
    assert_eq!(state.step_count, 3);
    assert!(state
        .memory
        .steps()
        .iter()
        .all(|s| s.tool_name == INVALID_DECISION_STEP && s.status == StepStatus::Rejected));
}

#[tokio::test]
async fn successful_step_resets_retry_streak() {
    let provider = Arc::new(ScriptedProvider::sequence(vec![
        Decision::invalid("?", "garbage"),
        Decision::invalid("?", "garbage"),
        Decision::call("get_relation", ["D", "acted_in"]),
        Decision::invalid("?", "garbage"),
        Decision::invalid("?", "garbage"),
        Decision::answer("#2"),
    ]));
    let state = runtime(provider, config(10)).run_episode(film_question()).await;
    assert_eq!(state.status, EpisodeStatus::Answered);
    assert_eq!(state.step_count, 5);
}

#[test]
fn zero_budgets_are_rejected_at_construction() {
    let toolbox = || create_default_toolbox(DEFAULT_DEPTH_CAP).unwrap();
    let provider = || Arc::new(ScriptedProvider::sequence(film_script()));

    let no_steps = AgentRuntime::new(provider(), toolbox(), film_graph(), config(0));
    assert!(matches!(no_steps, Err(Error::Config(_))));

    let no_retries = AgentConfig {
        max_invalid_decisions: 0,
        ..AgentConfig::default()
    };
    let executor = Arc::new(kgagent_kg::KgExecutor::new(Arc::new(toolbox()), film_graph()));
    assert!(matches!(
        AgentRuntime::with_executor(provider(), executor, no_retries),
        Err(Error::Config(_))
    ));
    assert!(AgentRuntime::new(provider(), toolbox(), film_graph(), config(1)).is_ok());
}

#[tokio::test]
async fn ungrounded_seed_fails_before_any_decision() {
    let provider = Arc::new(ScriptedProvider::sequence(film_script()));
    let state = runtime(provider.clone(), config(10))
        .run_episode(Question::new("Who?").with_seeds(["Nobody"]))
        .await;

    assert_eq!(state.status, EpisodeStatus::Failed);
    assert!(state.failure.unwrap().contains("Nobody"));
    assert_eq!(state.step_count, 0);
    assert_eq!(provider.call_count().await, 0);
}

#[tokio::test]
async fn provider_failure_fails_the_episode() {
    let state = runtime(Arc::new(FailingProvider), config(10))
        .run_episode(film_question())
        .await;
    assert_eq!(state.status, EpisodeStatus::Failed);
    assert!(state.failure.unwrap().contains("connection refused"));
    assert!(state.memory.is_empty());
}

// ===========================================================================
// Cancellation and timeouts
// ===========================================================================

#[tokio::test]
async fn cancelled_before_start() {
    let provider = Arc::new(ScriptedProvider::sequence(film_script()));
    let cancel = CancellationToken::new();
    cancel.cancel();
    let state = runtime(provider.clone(), config(10))
        .run_episode_cancellable(film_question(), cancel)
        .await;

    assert_eq!(state.status, EpisodeStatus::Aborted);
    assert_eq!(state.abort_reason, Some(AbortReason::Cancelled));
    assert_eq!(state.step_count, 0);
    assert_eq!(provider.call_count().await, 0);
}

#[tokio::test]
async fn cancel_during_decision_keeps_committed_steps() {
    let provider = Arc::new(StallingProvider {
        script: ScriptedProvider::sequence(film_script()),
        stall_at: 1,
    });
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });
    let state = runtime(provider, config(10))
        .run_episode_cancellable(film_question(), cancel)
        .await;

    assert_eq!(state.status, EpisodeStatus::Aborted);
    assert_eq!(state.abort_reason, Some(AbortReason::Cancelled));
    assert_eq!(state.step_count, 1);
    assert_eq!(statuses(&state), vec![StepStatus::Ok]);
}

#[tokio::test]
async fn cancel_during_tool_call_discards_the_call() {
    let provider = Arc::new(ScriptedProvider::sequence(vec![
        Decision::call("get_relations", ["D"]),
        Decision::call("get_relation", ["D", "acted_in"]),
        Decision::answer("#1"),
    ]));
    let graph = Arc::new(StallingGraph { inner: film_store() });
    let toolbox = create_default_toolbox(DEFAULT_DEPTH_CAP).unwrap();
    let rt = AgentRuntime::new(provider.clone(), toolbox, graph, config(10)).unwrap();
    let cancel = CancellationToken::new();
    cancel_after(&cancel, 30);

    let state = tokio::time::timeout(
        Duration::from_secs(2),
        rt.run_episode_cancellable(film_question(), cancel),
    )
    .await
    .expect("cancellation must interrupt the graph lookup");

    assert_eq!(state.status, EpisodeStatus::Aborted);
    assert_eq!(state.abort_reason, Some(AbortReason::Cancelled));
    assert_eq!(provider.call_count().await, 2);
    assert_eq!(state.memory.len(), 1);
    assert_eq!(state.step_count, 1);
    assert_eq!(statuses(&state), vec![StepStatus::Ok]);
    assert_eq!(state.memory.get(0).unwrap().tool_name, "get_relations");
}

#[tokio::test]
async fn cancel_unblocks_a_full_event_channel() {
    let provider = Arc::new(ScriptedProvider::constant(Decision::call(
        "get_relations",
        ["D"],
    )));
    let rt = runtime(provider, config(10));
    // Nobody reads: the second event fills the channel.
    let (tx, _rx) = mpsc::channel(1);
    let cancel = CancellationToken::new();
    cancel_after(&cancel, 50);

    let state = tokio::time::timeout(
        Duration::from_secs(2),
        rt.run_episode_with_events(film_question(), tx, cancel),
    )
    .await
    .expect("a full event channel must not outlive cancellation");

    assert_eq!(state.status, EpisodeStatus::Aborted);
    assert_eq!(state.abort_reason, Some(AbortReason::Cancelled));
    assert!(state.step_count <= 1);
    assert_eq!(state.step_count, state.memory.len());
    assert!(rt.episodes().is_empty());
}

#[tokio::test]
async fn dropped_episode_leaves_the_registry() {
    let provider = Arc::new(StallingProvider {
        script: ScriptedProvider::sequence(film_script()),
        stall_at: 0,
    });
    let rt = runtime(provider, config(10));

    let outcome = tokio::time::timeout(Duration::from_millis(30), rt.run_episode(film_question())).await;
    assert!(outcome.is_err());
    assert!(rt.episodes().is_empty());
    assert!(rt.episodes().list().is_empty());
}

#[tokio::test]
async fn episode_timeout_aborts() {
    let provider = Arc::new(StallingProvider {
        script: ScriptedProvider::sequence(film_script()),
        stall_at: 2,
    });
    let cfg = AgentConfig {
        episode_timeout_ms: Some(50),
        ..AgentConfig::default()
    };
    let state = runtime(provider, cfg).run_episode(film_question()).await;

    assert_eq!(state.status, EpisodeStatus::Aborted);
    assert_eq!(state.abort_reason, Some(AbortReason::TimedOut));
    assert_eq!(state.step_count, 2);
}

#[tokio::test]
async fn registry_cancels_running_episode_by_id() {
    let provider = Arc::new(StallingProvider {
        script: ScriptedProvider::sequence(film_script()),
        stall_at: 0,
    });
    let rt = Arc::new(runtime(provider, config(10)));
    let (tx, mut rx) = mpsc::channel(16);

    let handle = {
        let rt = rt.clone();
        tokio::spawn(async move {
            rt.run_episode_with_events(film_question(), tx, CancellationToken::new())
                .await
        })
    };

    let id = match rx.recv().await {
        Some(EpisodeEvent::Started { id, .. }) => id,
        other => panic!("expected Started, got {:?}", other),
    };
    assert!(rt.episodes().is_running(&id));
    assert!(rt.episodes().cancel(&id));

    let state = handle.await.unwrap();
    assert_eq!(state.id, id);
    assert_eq!(state.abort_reason, Some(AbortReason::Cancelled));
    assert!(!rt.episodes().is_running(&id));
    assert!(!rt.episodes().cancel(&id));
}

#[tokio::test]
async fn reference_shaped_invalid_reply_survives_trace_json() {
    let provider = Arc::new(ScriptedProvider::sequence(vec![
        Decision::invalid("#3", "no tool call found"),
        Decision::answer(true),
    ]));
    let state = runtime(provider, config(10)).run_episode(Question::new("Is it?")).await;

    let rejected = state.memory.get(0).unwrap();
    assert_eq!(rejected.tool_name, INVALID_DECISION_STEP);
    assert_eq!(rejected.arguments, vec![Argument::text("#3")]);

    let trace = ProgramTrace::export(&state);
    let back = ProgramTrace::from_json(&trace.to_json().unwrap()).unwrap();
    assert_eq!(back, trace);
    assert_eq!(back.steps[0].arguments, vec![Argument::text("#3")]);
}

// ===========================================================================
// Events, batches, sinks
// ===========================================================================

#[tokio::test]
async fn events_follow_the_loop() {
    let provider = Arc::new(ScriptedProvider::sequence(film_script()));
    let rt = runtime(provider, config(10));
    let (tx, mut rx) = mpsc::channel(64);
    let state = rt
        .run_episode_with_events(film_question(), tx, CancellationToken::new())
        .await;

    let mut events = Vec::new();
    while let Some(e) = rx.recv().await {
        events.push(e);
    }
    assert!(matches!(events.first(), Some(EpisodeEvent::Started { .. })));
    let committed: Vec<(usize, String)> = events
        .iter()
        .filter_map(|e| match e {
            EpisodeEvent::StepCommitted { step_index, tool_name, .. } => {
                Some((*step_index, tool_name.clone()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        committed,
        vec![(0, "get_relation".to_string()), (1, "count".to_string())]
    );
    let decided = events
        .iter()
        .filter(|e| matches!(e, EpisodeEvent::Decided { .. }))
        .count();
    assert_eq!(decided, 3);
    match events.last() {
        Some(EpisodeEvent::Finished { id, status, steps }) => {
            assert_eq!(*id, state.id);
            assert_eq!(*status, EpisodeStatus::Answered);
            assert_eq!(*steps, 2);
        }
        other => panic!("expected Finished, got {:?}", other),
    }
}

#[tokio::test]
async fn batch_keeps_question_order() {
    let rt = runtime(Arc::new(EchoProvider), config(3));
    let questions: Vec<Question> = (0..4).map(|i| Question::new(format!("q{}", i))).collect();
    let states = rt.run_batch(questions, 4).await;

    let answers: Vec<Value> = states.into_iter().map(|s| s.answer.unwrap().value).collect();
    assert_eq!(
        answers,
        (0..4)
            .map(|i| Value::Literal(Literal::text(format!("q{}", i))))
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn sink_receives_finished_traces() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(LocalFsSink::new(dir.path()));
    let provider = Arc::new(ScriptedProvider::sequence(film_script()));
    let rt = runtime(provider, config(10)).with_sink(sink.clone());
    let state = rt.run_episode(film_question()).await;

    let stored = sink.read_trace(&state.id).await.unwrap();
    assert_eq!(stored, ProgramTrace::export(&state));
    let program = std::fs::read_to_string(dir.path().join(state.id.as_str()).join("program.txt")).unwrap();
    assert!(program.ends_with("answer(#1)\n"));
}

// ===========================================================================
// Replay
// ===========================================================================

#[tokio::test]
async fn replay_is_deterministic() {
    let run = || async {
        let provider = Arc::new(ScriptedProvider::sequence(vec![
            Decision::call("count", ["#9"]),
            Decision::call("get_relation", ["D", "acted_in"]),
            Decision::call("argmax", ["#1", "release_year"]),
            Decision::answer("#2"),
        ]));
        let state = runtime(provider.clone(), config(10)).run_episode(film_question()).await;
        (ProgramTrace::export(&state), provider.prompts().await)
    };
    let (trace_a, prompts_a) = run().await;
    let (trace_b, prompts_b) = run().await;

    assert_eq!(trace_a, trace_b);
    assert_eq!(prompts_a, prompts_b);
    assert_eq!(trace_a.to_json().unwrap(), trace_b.to_json().unwrap());
    assert_eq!(
        trace_a.final_answer.unwrap().value,
        Value::EntitySet(set(&["F2"]))
    );
}
