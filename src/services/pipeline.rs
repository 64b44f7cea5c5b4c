//! Pipeline context: the single entry point from request text to report.
//!
//! A [`Pipeline`] is built once from configuration and its collaborators and
//! shared by handle. It owns the decomposer, the coordinator, the plan queue
//! and a bounded execution history. [`Pipeline::execute`] never fails: any
//! error outside the subtasks themselves is folded into an error report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Config, Payload, Pattern, Report, ScheduleDiagnostic, TaskPlan, TraceEntry,
};
use crate::domain::ports::Executor;
use crate::services::adaptive_router::AdaptiveRouter;
use crate::services::coordinator::{ExecutionCoordinator, RunMetrics, RunOptions};
use crate::services::feedback_store::FeedbackStore;
use crate::services::pattern_classifier::PatternClassifier;
use crate::services::plan_queue::{PlanQueue, QueueStatus};
use crate::services::synthesizer::Synthesizer;
use crate::services::task_decomposer::TaskDecomposer;

/// One incoming request.
#[derive(Debug, Clone, Default)]
pub struct PipelineRequest {
    pub text: String,
    pub context: Payload,
    /// Overrides the configured plan timeout.
    pub timeout: Option<Duration>,
    pub trace: bool,
}

impl PipelineRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_context(mut self, context: Payload) -> Self {
        self.context = context;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

/// Compact description of the plan a run executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub id: Uuid,
    pub pattern: Pattern,
    pub subtasks: usize,
    /// Wave sizes in order.
    pub waves: Vec<usize>,
    pub estimated_secs: u64,
    pub requires_synthesis: bool,
}

impl PlanSummary {
    pub fn of(plan: &TaskPlan) -> Self {
        Self {
            id: plan.id,
            pattern: plan.pattern,
            subtasks: plan.subtasks.len(),
            waves: plan.parallel_groups.iter().map(Vec::len).collect(),
            estimated_secs: plan.estimated_secs,
            requires_synthesis: plan.requires_synthesis,
        }
    }
}

/// Everything a caller gets back from [`Pipeline::execute`].
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub request: String,
    pub report: Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<TraceEntry>>,
    /// Absent when the run failed before a plan was built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<ScheduleDiagnostic>,
    pub metrics: RunMetrics,
    pub duration_ms: u64,
}

impl ExecutionReport {
    pub fn is_error(&self) -> bool {
        self.report.is_error()
    }
}

/// One remembered run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<Uuid>,
    pub request: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
    /// No pipeline error and no failed subtask.
    pub success: bool,
    pub subtasks: usize,
    pub succeeded: usize,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl HistoryEntry {
    fn of(run: &ExecutionReport) -> Self {
        Self {
            plan_id: run.plan.as_ref().map(|p| p.id),
            request: run.request.clone(),
            pattern: run.plan.as_ref().map(|p| p.pattern),
            success: !run.is_error() && run.metrics.failed == 0,
            subtasks: run.metrics.total_subtasks,
            succeeded: run.metrics.succeeded,
            duration_ms: run.duration_ms,
            completed_at: Utc::now(),
        }
    }
}

/// Point-in-time pipeline status.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStatus {
    pub online: bool,
    pub patterns: Vec<Pattern>,
    pub executors: Vec<String>,
    pub executions_total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_execution: Option<DateTime<Utc>>,
    pub queue: QueueStatus,
}

#[derive(Debug, Default)]
struct History {
    entries: VecDeque<HistoryEntry>,
    total: u64,
}

/// Shared pipeline context.
pub struct Pipeline {
    config: Config,
    decomposer: TaskDecomposer,
    coordinator: Arc<ExecutionCoordinator>,
    synthesizer: Synthesizer,
    router: Arc<AdaptiveRouter>,
    feedback: Arc<FeedbackStore>,
    queue: PlanQueue,
    history: RwLock<History>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        executor: Arc<dyn Executor>,
        feedback: Arc<FeedbackStore>,
        router: Arc<AdaptiveRouter>,
    ) -> Self {
        let classifier = PatternClassifier::from_config(config.classifier.rules.as_deref());
        let coordinator = ExecutionCoordinator::new(
            executor,
            router.clone(),
            feedback.clone(),
            config.coordinator.clone(),
        );
        let queue = PlanQueue::from_config(&config.queue);
        info!(
            executor_backend = ?config.executor.kind,
            max_concurrent = config.queue.max_concurrent,
            "pipeline ready"
        );

        Self {
            decomposer: TaskDecomposer::new(classifier),
            coordinator: Arc::new(coordinator),
            synthesizer: Synthesizer::new(),
            router,
            feedback,
            queue,
            history: RwLock::new(History::default()),
            config,
        }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn decomposer(&self) -> &TaskDecomposer {
        &self.decomposer
    }

    pub fn router(&self) -> &AdaptiveRouter {
        &self.router
    }

    pub fn feedback(&self) -> &FeedbackStore {
        &self.feedback
    }

    pub const fn queue(&self) -> &PlanQueue {
        &self.queue
    }

    /// Build the plan for `text` without executing it.
    pub fn plan(&self, text: &str, context: &Payload) -> TaskPlan {
        self.decomposer.plan(text, context)
    }

    /// Run one request end to end.
    #[instrument(skip_all, fields(request = %request.text))]
    pub async fn execute(&self, request: PipelineRequest) -> ExecutionReport {
        let started = Instant::now();
        let run = match self.try_execute(&request, started).await {
            Ok(run) => run,
            Err(e) => {
                error!(error = %e, "pipeline run failed");
                let elapsed = started.elapsed();
                ExecutionReport {
                    request: request.text.clone(),
                    report: self
                        .synthesizer
                        .error_report(&request.text, &e.to_string(), elapsed),
                    trace: None,
                    plan: None,
                    diagnostic: None,
                    metrics: RunMetrics::default(),
                    duration_ms: millis(elapsed),
                }
            }
        };

        info!(
            success = !run.is_error() && run.metrics.failed == 0,
            duration_ms = run.duration_ms,
            "report produced"
        );
        self.remember(&run).await;
        run
    }

    async fn try_execute(
        &self,
        request: &PipelineRequest,
        started: Instant,
    ) -> DomainResult<ExecutionReport> {
        if request.text.trim().is_empty() {
            return Err(DomainError::InvalidPlan("request text is empty".to_string()));
        }

        let mut plan = self.decomposer.plan(&request.text, &request.context);
        let options = RunOptions {
            plan_timeout: request
                .timeout
                .unwrap_or_else(|| Duration::from_secs(self.config.coordinator.plan_timeout_secs)),
            trace: request.trace,
        };

        let coordinator = self.coordinator.clone();
        let queued_plan = plan.clone();
        let run = self
            .queue
            .run(async move { coordinator.run(&queued_plan, options).await })
            .await?;

        let report = self.synthesizer.synthesize(plan.pattern, &run.outputs);
        if let Some(trace) = &run.trace {
            plan.attach_trace(trace.clone());
        }

        Ok(ExecutionReport {
            request: request.text.clone(),
            report,
            trace: run.trace,
            plan: Some(PlanSummary::of(&plan)),
            diagnostic: run.diagnostic,
            metrics: run.metrics,
            duration_ms: millis(started.elapsed()),
        })
    }

    async fn remember(&self, run: &ExecutionReport) {
        let limit = self.config.coordinator.history_limit.max(1);
        let mut history = self.history.write().await;
        history.entries.push_back(HistoryEntry::of(run));
        while history.entries.len() > limit {
            history.entries.pop_front();
        }
        history.total += 1;
    }

    /// Most recent runs, newest first.
    pub async fn history(&self, limit: usize) -> Vec<HistoryEntry> {
        let history = self.history.read().await;
        history.entries.iter().rev().take(limit).cloned().collect()
    }

    pub async fn status(&self) -> PipelineStatus {
        let history = self.history.read().await;
        PipelineStatus {
            online: !self.queue.is_closed(),
            patterns: Pattern::ALL.to_vec(),
            executors: self.known_executors(),
            executions_total: history.total,
            last_execution: history.entries.back().map(|e| e.completed_at),
            queue: self.queue.status(),
        }
    }

    /// Routed executors plus alias targets, sorted and deduplicated.
    pub fn known_executors(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self.router.routes().into_iter().map(|r| r.name).collect();
        names.extend(self.config.coordinator.aliases.values().cloned());
        names.insert(self.router.fallback().to_string());
        names.into_iter().collect()
    }

    /// Stop accepting runs and wait for in-flight plans.
    pub async fn shutdown(&self) {
        self.queue.shutdown().await;
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
