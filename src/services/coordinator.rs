//! Execution coordinator for wave-based concurrent subtask execution.
//!
//! Waves run strictly in order. Within a wave every subtask is spawned at
//! once and the coordinator waits for all of them, up to the wave's budget.
//! Subtasks still pending when the budget runs out are aborted and recorded
//! as timeouts; siblings that finished keep their real results.

use futures::FutureExt;
use serde::Serialize;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, instrument, warn};

use crate::domain::models::{
    BudgetPolicy, CoordinatorConfig, ExecutorOutput, FeedbackEntry, Payload,
    ScheduleDiagnostic, Subtask, TaskPlan, TraceEntry,
};
use crate::domain::ports::{Executor, Invocation};
use crate::services::adaptive_router::{detect_category, AdaptiveRouter};
use crate::services::feedback_store::FeedbackStore;

const PANIC_ERROR: &str = "Exception: executor task panicked";

/// Per-run options supplied by the caller.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Total budget for the plan.
    pub plan_timeout: Duration,
    /// Collect a trace entry per subtask.
    pub trace: bool,
}

impl RunOptions {
    pub fn from_config(config: &CoordinatorConfig) -> Self {
        Self {
            plan_timeout: Duration::from_secs(config.plan_timeout_secs),
            trace: false,
        }
    }
}

/// Event emitted during execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionEvent {
    /// Wave dispatched.
    WaveStarted { wave: usize, subtasks: usize, budget_ms: u64 },
    /// One subtask resolved inside its budget.
    SubtaskFinished { wave: usize, subtask_id: String, executor: String, success: bool },
    /// Wave resolved.
    WaveCompleted { wave: usize, succeeded: usize, failed: usize, timed_out: usize },
}

/// Figures for one plan run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunMetrics {
    pub waves: usize,
    pub total_subtasks: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub wall_ms: u64,
}

impl RunMetrics {
    pub fn success_rate(&self) -> f64 {
        if self.total_subtasks == 0 {
            return 0.0;
        }
        self.succeeded as f64 / self.total_subtasks as f64
    }
}

/// Result of running one plan.
#[derive(Debug, Clone)]
pub struct ExecutionRun {
    /// One output per subtask, in wave order.
    pub outputs: Vec<ExecutorOutput>,
    pub trace: Option<Vec<TraceEntry>>,
    pub metrics: RunMetrics,
    pub diagnostic: Option<ScheduleDiagnostic>,
}

/// Drives plans wave by wave against an executor backend.
pub struct ExecutionCoordinator {
    executor: Arc<dyn Executor>,
    router: Arc<AdaptiveRouter>,
    feedback: Arc<FeedbackStore>,
    config: CoordinatorConfig,
}

/// A subtask ready for dispatch.
struct Dispatch {
    subtask: Subtask,
    executor: String,
}

impl ExecutionCoordinator {
    pub fn new(
        executor: Arc<dyn Executor>,
        router: Arc<AdaptiveRouter>,
        feedback: Arc<FeedbackStore>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            executor,
            router,
            feedback,
            config,
        }
    }

    pub const fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Execute a plan.
    pub async fn run(&self, plan: &TaskPlan, options: RunOptions) -> ExecutionRun {
        // No listener: a closed channel makes every send return at once.
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        self.run_with_events(plan, options, tx).await
    }

    /// Execute a plan with event streaming.
    #[instrument(skip_all, fields(plan_id = %plan.id, pattern = %plan.pattern))]
    pub async fn run_with_events(
        &self,
        plan: &TaskPlan,
        options: RunOptions,
        event_tx: mpsc::Sender<ExecutionEvent>,
    ) -> ExecutionRun {
        let start = Instant::now();
        let waves: Vec<Vec<Subtask>> = plan
            .parallel_groups
            .iter()
            .map(|group| group.iter().filter_map(|id| plan.subtask(id)).cloned().collect())
            .collect();
        let wave_count = waves.len();

        if let Some(diag) = &plan.diagnostic {
            warn!(detail = %diag.describe(), "executing degraded plan");
        }
        info!(waves = wave_count, subtasks = plan.subtasks.len(), "plan execution started");

        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut prior_results: BTreeMap<String, Payload> = BTreeMap::new();
        let mut outputs = Vec::with_capacity(plan.subtasks.len());
        let mut metrics = RunMetrics {
            waves: wave_count,
            total_subtasks: plan.subtasks.len(),
            ..RunMetrics::default()
        };

        for (wave_idx, wave) in waves.into_iter().enumerate() {
            let budget = self.wave_budget(options.plan_timeout, wave_count, wave_idx, start.elapsed());
            let _ = event_tx
                .send(ExecutionEvent::WaveStarted {
                    wave: wave_idx,
                    subtasks: wave.len(),
                    budget_ms: budget.as_millis() as u64,
                })
                .await;

            let wave_outputs = self
                .execute_wave(
                    wave_idx,
                    wave,
                    budget,
                    &prior_results,
                    options.trace.then(|| trace.clone()),
                    &event_tx,
                )
                .await;

            let (mut ok, mut failed, mut timed_out) = (0, 0, 0);
            for output in &wave_outputs {
                self.record_outcome(plan, output).await;
                if output.success {
                    ok += 1;
                    prior_results.insert(output.base_name().to_string(), output.result.clone());
                } else if output.is_timeout() {
                    timed_out += 1;
                } else {
                    failed += 1;
                }
            }
            metrics.succeeded += ok;
            metrics.failed += failed + timed_out;
            metrics.timed_out += timed_out;

            info!(wave = wave_idx, succeeded = ok, failed, timed_out, "wave completed");
            let _ = event_tx
                .send(ExecutionEvent::WaveCompleted {
                    wave: wave_idx,
                    succeeded: ok,
                    failed,
                    timed_out,
                })
                .await;

            outputs.extend(wave_outputs);
        }

        metrics.wall_ms = start.elapsed().as_millis() as u64;
        info!(
            succeeded = metrics.succeeded,
            failed = metrics.failed,
            wall_ms = metrics.wall_ms,
            "plan execution finished"
        );

        let trace = if options.trace {
            Some(std::mem::take(&mut *trace.lock().await))
        } else {
            None
        };

        ExecutionRun {
            outputs,
            trace,
            metrics,
            diagnostic: plan.diagnostic.clone(),
        }
    }

    /// Budget for wave `wave_idx` (zero-based) given the time already spent.
    pub fn wave_budget(
        &self,
        plan_timeout: Duration,
        wave_count: usize,
        wave_idx: usize,
        elapsed: Duration,
    ) -> Duration {
        let waves = u32::try_from(wave_count.max(1)).unwrap_or(u32::MAX);
        match self.config.budget_policy {
            BudgetPolicy::Even => plan_timeout / waves,
            BudgetPolicy::Redistribute => {
                let remaining_waves =
                    u32::try_from(wave_count.saturating_sub(wave_idx).max(1)).unwrap_or(u32::MAX);
                plan_timeout.saturating_sub(elapsed) / remaining_waves
            }
        }
    }

    /// Resolve the concrete executor for a subtask: unbound subtasks go
    /// through the router, then aliases apply.
    pub fn resolve_executor(&self, subtask: &Subtask) -> String {
        let name = subtask.executor.clone().unwrap_or_else(|| {
            let routed = self.router.route(subtask.description.as_str());
            routed
                .into_iter()
                .next()
                .unwrap_or_else(|| self.router.fallback().to_string())
        });
        self.config.aliases.get(&name).cloned().unwrap_or(name)
    }

    async fn execute_wave(
        &self,
        wave_idx: usize,
        wave: Vec<Subtask>,
        budget: Duration,
        prior_results: &BTreeMap<String, Payload>,
        trace: Option<Arc<Mutex<Vec<TraceEntry>>>>,
        event_tx: &mpsc::Sender<ExecutionEvent>,
    ) -> Vec<ExecutorOutput> {
        let dispatches: Vec<Dispatch> = wave
            .into_iter()
            .map(|subtask| Dispatch {
                executor: self.resolve_executor(&subtask),
                subtask,
            })
            .collect();

        let slots: Arc<Mutex<Vec<Option<ExecutorOutput>>>> =
            Arc::new(Mutex::new(vec![None; dispatches.len()]));
        // A per-invocation limit only applies when it is tighter than the
        // wave budget; otherwise the wave timer alone decides timeouts.
        let configured = Duration::from_secs(self.config.invocation_timeout_secs);
        let invocation_limit = (configured < budget).then_some(configured);
        let cost_rate = self.config.cost_per_million_tokens;
        let wave_start = Instant::now();

        let mut trace_slots = Vec::with_capacity(dispatches.len());
        let mut tasks = JoinSet::new();

        for (slot, dispatch) in dispatches.iter().enumerate() {
            let trace_slot = match &trace {
                Some(t) => {
                    let mut entries = t.lock().await;
                    entries.push(TraceEntry::start(wave_idx, &dispatch.subtask.id, &dispatch.executor));
                    Some(entries.len() - 1)
                }
                None => None,
            };
            trace_slots.push(trace_slot);

            let invocation = Invocation {
                executor: dispatch.executor.clone(),
                subtask_id: dispatch.subtask.id.clone(),
                description: dispatch.subtask.description.clone(),
                input: dispatch.subtask.input.clone(),
                timeout: invocation_limit.unwrap_or(budget),
                prior_results: prior_results.clone(),
            };
            debug!(wave = wave_idx, subtask = %dispatch.subtask.id, executor = %dispatch.executor, "dispatching");

            let executor = self.executor.clone();
            let slots = slots.clone();
            let trace = trace.clone();
            let event_tx = event_tx.clone();

            let (subtask_id, executor_name, description) = (
                dispatch.subtask.id.clone(),
                dispatch.executor.clone(),
                dispatch.subtask.description.clone(),
            );

            tasks.spawn(async move {
                let started = Instant::now();
                let output = match AssertUnwindSafe(invoke_subtask(executor, invocation, invocation_limit))
                    .catch_unwind()
                    .await
                {
                    Ok(output) => output,
                    Err(_) => {
                        warn!(subtask = %subtask_id, executor = %executor_name, "executor panicked");
                        ExecutorOutput::failed(
                            subtask_id,
                            executor_name,
                            description,
                            PANIC_ERROR,
                            started.elapsed().as_millis() as u64,
                        )
                    }
                };
                let (subtask_id, executor_name, success) =
                    (output.subtask_id.clone(), output.executor.clone(), output.success);

                // Slot first: an abort after this point still keeps the result.
                slots.lock().await[slot] = Some(output.clone());
                if let (Some(t), Some(i)) = (trace, trace_slot) {
                    if let Some(entry) = t.lock().await.get_mut(i) {
                        entry.finish(&output, cost_rate);
                    }
                }
                let _ = event_tx
                    .send(ExecutionEvent::SubtaskFinished {
                        wave: wave_idx,
                        subtask_id,
                        executor: executor_name,
                        success,
                    })
                    .await;
            });
        }

        // Each task is joined exactly once; a timed-out wave aborts the rest
        // and drains them so no slot is written after this point.
        let drained = timeout(budget, async {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    warn!(wave = wave_idx, error = %e, "subtask task failed");
                }
            }
        })
        .await;
        if drained.is_err() {
            warn!(
                wave = wave_idx,
                budget_ms = budget.as_millis() as u64,
                pending = tasks.len(),
                "wave budget exceeded, abandoning pending subtasks"
            );
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }

        let elapsed_ms = wave_start.elapsed().as_millis() as u64;
        let mut filled = std::mem::take(&mut *slots.lock().await);
        let mut outputs = Vec::with_capacity(dispatches.len());

        for (i, dispatch) in dispatches.iter().enumerate() {
            let output = filled.get_mut(i).and_then(Option::take).unwrap_or_else(|| {
                ExecutorOutput::timed_out(
                    &dispatch.subtask.id,
                    &dispatch.executor,
                    &dispatch.subtask.description,
                    elapsed_ms,
                )
            });

            if let (Some(t), Some(idx)) = (&trace, trace_slots[i]) {
                if let Some(entry) = t.lock().await.get_mut(idx) {
                    if entry.is_open() {
                        entry.finish(&output, cost_rate);
                    }
                }
            }
            outputs.push(output);
        }
        outputs
    }

    /// Forward one outcome to the feedback store and the router.
    async fn record_outcome(&self, plan: &TaskPlan, output: &ExecutorOutput) {
        self.router.update(&output.executor, output.success);
        let entry = FeedbackEntry::new(
            plan.id.to_string(),
            detect_category(&output.description).as_str(),
            vec![output.executor.clone()],
            output.success,
            output.execution_time_ms,
        );
        if let Err(e) = self.feedback.record(entry).await {
            warn!(executor = %output.executor, error = %e, "failed to persist feedback");
        }
    }
}

/// Invoke one subtask, folding every failure mode into an output.
///
/// With a `limit`, an invocation that overruns it is reported as a timeout
/// exactly like one cut off by the wave budget.
async fn invoke_subtask(
    executor: Arc<dyn Executor>,
    invocation: Invocation,
    limit: Option<Duration>,
) -> ExecutorOutput {
    let start = Instant::now();
    let subtask_id = invocation.subtask_id.clone();
    let name = invocation.executor.clone();
    let description = invocation.description.clone();

    let result = match limit {
        Some(limit) => timeout(limit, executor.invoke(invocation)).await,
        None => Ok(executor.invoke(invocation).await),
    };
    let measured_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(Ok(outcome)) => {
            let elapsed = if outcome.execution_time_ms > 0 {
                outcome.execution_time_ms
            } else {
                measured_ms
            };
            if outcome.success {
                ExecutorOutput::succeeded(subtask_id, name, description, outcome.result, elapsed)
            } else {
                let error = outcome
                    .error
                    .unwrap_or_else(|| "Executor reported failure".to_string());
                let mut output = ExecutorOutput::failed(subtask_id, name, description, error, elapsed);
                output.result.extend(&outcome.result);
                output
            }
        }
        Ok(Err(e)) => {
            warn!(executor = %name, error = %e, "executor raised");
            ExecutorOutput::failed(subtask_id, name, description, format!("Exception: {e}"), measured_ms)
        }
        Err(_) => {
            warn!(
                executor = %name,
                limit_ms = limit.map_or(0, |l| l.as_millis() as u64),
                "invocation limit exceeded"
            );
            ExecutorOutput::timed_out(subtask_id, name, description, measured_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::executors::mock::{MockBehavior, MockExecutor};
    use crate::domain::models::{Pattern, WavePlan};
    use crate::services::wave_scheduler::WaveScheduler;

    fn coordinator(mock: MockExecutor, config: CoordinatorConfig) -> ExecutionCoordinator {
        ExecutionCoordinator::new(
            Arc::new(mock),
            Arc::new(AdaptiveRouter::with_defaults()),
            Arc::new(FeedbackStore::in_memory()),
            config,
        )
    }

    fn plan_of(subtasks: Vec<Subtask>) -> TaskPlan {
        let waves: WavePlan = WaveScheduler::partition(&subtasks);
        TaskPlan::new("test", Pattern::Custom, subtasks, &waves)
    }

    #[test]
    fn test_even_budget_uses_initial_wave_count() {
        let c = coordinator(MockExecutor::new(), CoordinatorConfig::default());
        let total = Duration::from_secs(300);
        assert_eq!(c.wave_budget(total, 2, 0, Duration::ZERO), Duration::from_secs(150));
        assert_eq!(c.wave_budget(total, 2, 1, Duration::from_secs(200)), Duration::from_secs(150));
        assert_eq!(c.wave_budget(total, 0, 0, Duration::ZERO), total);
    }

    #[test]
    fn test_redistribute_budget_uses_remaining_time() {
        let config = CoordinatorConfig {
            budget_policy: BudgetPolicy::Redistribute,
            ..CoordinatorConfig::default()
        };
        let c = coordinator(MockExecutor::new(), config);
        let total = Duration::from_secs(300);
        assert_eq!(c.wave_budget(total, 3, 0, Duration::ZERO), Duration::from_secs(100));
        assert_eq!(c.wave_budget(total, 3, 1, Duration::from_secs(20)), Duration::from_secs(140));
        assert_eq!(c.wave_budget(total, 3, 2, Duration::from_secs(400)), Duration::ZERO);
    }

    #[test]
    fn test_resolve_executor_applies_aliases_and_routing() {
        let c = coordinator(MockExecutor::new(), CoordinatorConfig::default());
        let bound = Subtask::new("a", Some("refactor-planner"), "plan");
        assert_eq!(c.resolve_executor(&bound), "refactor-planner-ion");
        let unaliased = Subtask::new("b", Some("omnisearch"), "search");
        assert_eq!(c.resolve_executor(&unaliased), "omnisearch");
        let unbound = Subtask::new("c", None, "search for rust tutorials");
        assert_eq!(c.resolve_executor(&unbound), "omnisearch");
    }

    #[tokio::test]
    async fn test_prior_results_flow_forward_by_base_name() {
        let mock = MockExecutor::new().with_behavior(
            "duplicate-detector-ion",
            MockBehavior::succeed(Payload::new().with("duplicates_found", 3)),
        );
        let seen = mock.invocations();
        let c = coordinator(mock, CoordinatorConfig::default());

        let first = Subtask::new("d", Some("duplicate-detector"), "dups");
        let second = Subtask::new("p", Some("refactor-planner"), "plan").depends_on(["d"]);
        let run = c
            .run(&plan_of(vec![first, second]), RunOptions { plan_timeout: Duration::from_secs(5), trace: false })
            .await;

        assert_eq!(run.outputs.len(), 2);
        let calls = seen.lock().await;
        let planner_call = calls.iter().find(|i| i.subtask_id == "p").unwrap();
        assert_eq!(
            planner_call.prior_results["duplicate-detector"].u64_or("duplicates_found", 0),
            3
        );
    }

    #[tokio::test]
    async fn test_executor_error_becomes_failed_output() {
        let mock = MockExecutor::new().with_behavior("omnisearch", MockBehavior::error("socket closed"));
        let c = coordinator(mock, CoordinatorConfig::default());
        let run = c
            .run(
                &plan_of(vec![Subtask::new("s", Some("omnisearch"), "search")]),
                RunOptions { plan_timeout: Duration::from_secs(5), trace: true },
            )
            .await;
        let out = &run.outputs[0];
        assert!(!out.success);
        assert!(out.error.as_deref().unwrap().contains("socket closed"));
        let trace = run.trace.unwrap();
        assert_eq!(trace.len(), 1);
        assert!(!trace[0].is_open());
    }

    #[tokio::test]
    async fn test_outcomes_reach_feedback_and_router() {
        let mock = MockExecutor::new().with_behavior("omnisearch", MockBehavior::fail("no results"));
        let router = Arc::new(AdaptiveRouter::with_defaults());
        let feedback = Arc::new(FeedbackStore::in_memory());
        let c = ExecutionCoordinator::new(
            Arc::new(mock),
            router.clone(),
            feedback.clone(),
            CoordinatorConfig::default(),
        );
        let plan = plan_of(vec![Subtask::new("s", Some("omnisearch"), "search the web")]);
        c.run(&plan, RunOptions { plan_timeout: Duration::from_secs(5), trace: false }).await;

        let entries = feedback.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].task_id, plan.id.to_string());
        assert_eq!(entries[0].content_type, "search_query");
        assert!(!entries[0].success);
        assert!(router.success_rate("omnisearch").unwrap() < 1.0);
    }
}
