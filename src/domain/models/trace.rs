//! Execution trace entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::output::ExecutorOutput;

/// Lifecycle state of a traced subtask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceStatus {
    Started,
    Succeeded,
    Failed,
}

/// One traced subtask: opened at dispatch, closed when the subtask resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Zero-based wave index.
    pub wave: usize,
    pub subtask_id: String,
    pub executor: String,
    pub status: TraceStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TraceEntry {
    pub fn start(wave: usize, subtask_id: impl Into<String>, executor: impl Into<String>) -> Self {
        Self {
            wave,
            subtask_id: subtask_id.into(),
            executor: executor.into(),
            status: TraceStatus::Started,
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: None,
            tokens: None,
            cost: None,
            error: None,
        }
    }

    /// Close the entry from the subtask's output. Cost is derived only when
    /// the executor reported token usage.
    pub fn finish(&mut self, output: &ExecutorOutput, cost_per_million_tokens: f64) {
        self.status = if output.success {
            TraceStatus::Succeeded
        } else {
            TraceStatus::Failed
        };
        self.ended_at = Some(output.completed_at);
        self.duration_ms = Some(output.execution_time_ms);
        self.error.clone_from(&output.error);
        self.executor.clone_from(&output.executor);
        if let Some(tokens) = output.tokens_used() {
            self.tokens = Some(tokens);
            self.cost = Some(token_cost(tokens, cost_per_million_tokens));
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == TraceStatus::Started
    }
}

/// Dollar cost of `tokens` at a per-million rate.
pub fn token_cost(tokens: u64, per_million: f64) -> f64 {
    tokens as f64 / 1_000_000.0 * per_million
}

/// Aggregate figures over a finished trace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceTotals {
    pub duration_ms: u64,
    pub tokens: u64,
    pub cost: f64,
    pub succeeded: usize,
    pub total: usize,
}

impl TraceTotals {
    pub fn from_entries(entries: &[TraceEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut acc, e| {
            acc.duration_ms += e.duration_ms.unwrap_or(0);
            acc.tokens += e.tokens.unwrap_or(0);
            acc.cost += e.cost.unwrap_or(0.0);
            acc.total += 1;
            if e.status == TraceStatus::Succeeded {
                acc.succeeded += 1;
            }
            acc
        })
    }
}
