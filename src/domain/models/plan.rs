//! Task plans and the scheduler diagnostic attached to broken ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pattern::Pattern;
use super::subtask::Subtask;
use super::trace::TraceEntry;

/// Why a wave partition had to fall back to a forced final wave.
///
/// Present only when at least one subtask could never become eligible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDiagnostic {
    /// Subtasks forced into the final wave.
    pub unresolved: Vec<String>,
    /// `(subtask, missing dependency)` pairs.
    pub dangling: Vec<(String, String)>,
    /// One dependency cycle among the unresolved subtasks, if any.
    pub cycle: Option<Vec<String>>,
}

impl ScheduleDiagnostic {
    /// One-line description for logs and reports.
    pub fn describe(&self) -> String {
        let mut parts = vec![format!(
            "{} subtask(s) forced into a final wave",
            self.unresolved.len()
        )];
        if !self.dangling.is_empty() {
            let refs: Vec<String> = self
                .dangling
                .iter()
                .map(|(id, dep)| format!("{id} -> {dep}"))
                .collect();
            parts.push(format!("dangling dependencies: {}", refs.join(", ")));
        }
        if let Some(cycle) = &self.cycle {
            parts.push(format!("dependency cycle: {}", cycle.join(" -> ")));
        }
        parts.join("; ")
    }
}

/// Ordered waves of subtasks plus an optional degraded-mode diagnostic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WavePlan {
    pub waves: Vec<Vec<Subtask>>,
    pub diagnostic: Option<ScheduleDiagnostic>,
}

impl WavePlan {
    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    pub fn is_degraded(&self) -> bool {
        self.diagnostic.is_some()
    }

    /// Wave sizes in order.
    pub fn shape(&self) -> Vec<usize> {
        self.waves.iter().map(Vec::len).collect()
    }

    /// Identities per wave, the form stored on a [`TaskPlan`].
    pub fn id_groups(&self) -> Vec<Vec<String>> {
        self.waves
            .iter()
            .map(|wave| wave.iter().map(|s| s.id.clone()).collect())
            .collect()
    }
}

/// A decomposed request.
///
/// Built once per incoming request; only the execution trace is attached after
/// the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPlan {
    pub id: Uuid,
    pub request: String,
    pub pattern: Pattern,
    pub subtasks: Vec<Subtask>,
    pub parallel_groups: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<ScheduleDiagnostic>,
    /// Sum over groups of the slowest estimate in the group.
    pub estimated_secs: u64,
    pub requires_synthesis: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace: Option<Vec<TraceEntry>>,
}

impl TaskPlan {
    pub fn new(
        request: impl Into<String>,
        pattern: Pattern,
        subtasks: Vec<Subtask>,
        waves: &WavePlan,
    ) -> Self {
        let estimated_secs = waves
            .waves
            .iter()
            .map(|wave| wave.iter().map(|s| s.estimated_secs).max().unwrap_or(0))
            .sum();
        let requires_synthesis = subtasks.len() > 1;

        Self {
            id: Uuid::new_v4(),
            request: request.into(),
            pattern,
            subtasks,
            parallel_groups: waves.id_groups(),
            diagnostic: waves.diagnostic.clone(),
            estimated_secs,
            requires_synthesis,
            created_at: Utc::now(),
            trace: None,
        }
    }

    pub fn subtask(&self, id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == id)
    }

    pub fn attach_trace(&mut self, trace: Vec<TraceEntry>) {
        self.trace = Some(trace);
    }

    pub fn trace(&self) -> Option<&[TraceEntry]> {
        self.trace.as_deref()
    }
}
