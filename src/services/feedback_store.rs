//! Feedback store: append-only record of execution outcomes.
//!
//! Entries are held in memory and, when a path is configured, appended to a
//! JSON-lines log that is replayed on open. Appends are serialized through one
//! async mutex, so concurrent subtask completions never interleave lines.

use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AgentStats, FeedbackEntry, RATING_CONTENT_TYPE};

/// Below this success rate (with enough samples) an executor is flagged.
const LOW_SUCCESS_RATE: f64 = 0.7;
/// Minimum outcomes before the success rate is judged.
const MIN_SAMPLES: usize = 5;
/// Average latency above which an executor is flagged as slow.
const SLOW_AVG_MS: f64 = 10_000.0;

/// Durable, replayable feedback log.
#[derive(Debug)]
pub struct FeedbackStore {
    path: Option<PathBuf>,
    entries: Mutex<Vec<FeedbackEntry>>,
}

impl FeedbackStore {
    /// Memory-only store.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Open the log at `path`, replaying every parseable line. A missing file
    /// starts an empty log; malformed lines are skipped with a warning.
    pub async fn open(path: impl Into<PathBuf>) -> DomainResult<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path).await {
            Ok(contents) => parse_log(&path, &contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), entries = entries.len(), "feedback log replayed");
        Ok(Self {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one entry.
    pub async fn record(&self, entry: FeedbackEntry) -> DomainResult<()> {
        let mut entries = self.entries.lock().await;
        if let Some(path) = &self.path {
            append_line(path, &entry).await?;
        }
        debug!(
            task_id = %entry.task_id,
            agents = ?entry.agents_used,
            success = entry.success,
            "feedback recorded"
        );
        entries.push(entry);
        Ok(())
    }

    /// Attach a 1-5 user rating to a previously recorded task.
    pub async fn rate(&self, task_id: &str, rating: u8, notes: Option<String>) -> DomainResult<FeedbackEntry> {
        if !(1..=5).contains(&rating) {
            return Err(DomainError::InvalidRating(rating));
        }
        let agents: Vec<String> = {
            let entries = self.entries.lock().await;
            let mut agents: Vec<String> = Vec::new();
            for e in entries.iter().filter(|e| e.task_id == task_id && !e.is_rating()) {
                for a in &e.agents_used {
                    if !agents.contains(a) {
                        agents.push(a.clone());
                    }
                }
            }
            agents
        };
        if agents.is_empty() {
            return Err(DomainError::ValidationFailed(format!(
                "No recorded execution for task {task_id}"
            )));
        }

        let entry = FeedbackEntry {
            timestamp: Utc::now(),
            task_id: task_id.to_string(),
            content_type: RATING_CONTENT_TYPE.to_string(),
            agents_used: agents,
            success: true,
            execution_time_ms: 0,
            user_rating: Some(rating),
            notes,
        };
        self.record(entry.clone()).await?;
        Ok(entry)
    }

    /// Snapshot of every entry, oldest first.
    pub async fn entries(&self) -> Vec<FeedbackEntry> {
        self.entries.lock().await.clone()
    }

    /// The `n` most recent entries, oldest first.
    pub async fn recent(&self, n: usize) -> Vec<FeedbackEntry> {
        let entries = self.entries.lock().await;
        entries[entries.len().saturating_sub(n)..].to_vec()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Statistics for one executor.
    pub async fn agent_stats(&self, agent: &str) -> AgentStats {
        let entries = self.entries.lock().await;
        compute_stats(agent, &entries)
    }

    /// Statistics for every executor that appears in the log, by name.
    pub async fn all_stats(&self) -> Vec<AgentStats> {
        let entries = self.entries.lock().await;
        let mut names: BTreeMap<&str, ()> = BTreeMap::new();
        for e in entries.iter() {
            for a in &e.agents_used {
                names.insert(a.as_str(), ());
            }
        }
        names
            .keys()
            .map(|name| compute_stats(name, &entries))
            .collect()
    }

    /// Human-readable improvement hints derived from the statistics.
    pub async fn suggest_improvements(&self) -> Vec<String> {
        let mut suggestions = Vec::new();
        for stats in self.all_stats().await {
            if stats.total >= MIN_SAMPLES && stats.success_rate < LOW_SUCCESS_RATE {
                suggestions.push(format!(
                    "Agent '{}' has low success rate ({:.0}%). Consider reviewing or replacing.",
                    stats.agent,
                    stats.success_rate * 100.0
                ));
            }
            if stats.avg_time_ms > SLOW_AVG_MS {
                suggestions.push(format!(
                    "Agent '{}' is slow (avg {:.0}ms). Consider optimization.",
                    stats.agent, stats.avg_time_ms
                ));
            }
        }
        suggestions
    }
}

fn parse_log(path: &Path, contents: &str) -> Vec<FeedbackEntry> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(i, line)| match serde_json::from_str(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(path = %path.display(), line = i + 1, error = %e, "skipping malformed feedback line");
                None
            }
        })
        .collect()
}

async fn append_line(path: &Path, entry: &FeedbackEntry) -> DomainResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');
    let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

fn compute_stats(agent: &str, entries: &[FeedbackEntry]) -> AgentStats {
    let involving = || entries.iter().filter(|e| e.agents_used.iter().any(|a| a == agent));

    let outcomes: Vec<&FeedbackEntry> = involving().filter(|e| !e.is_rating()).collect();
    let ratings: Vec<f64> = involving()
        .filter_map(|e| e.user_rating)
        .map(f64::from)
        .collect();

    if outcomes.is_empty() && ratings.is_empty() {
        return AgentStats::empty(agent);
    }

    let total = outcomes.len();
    let (success_rate, avg_time_ms) = if total == 0 {
        (0.0, 0.0)
    } else {
        let successes = outcomes.iter().filter(|e| e.success).count();
        let time: u64 = outcomes.iter().map(|e| e.execution_time_ms).sum();
        (successes as f64 / total as f64, time as f64 / total as f64)
    };
    let avg_rating = (!ratings.is_empty()).then(|| ratings.iter().sum::<f64>() / ratings.len() as f64);

    AgentStats {
        agent: agent.to_string(),
        total,
        success_rate,
        avg_time_ms,
        avg_rating,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(task: &str, agent: &str, success: bool, ms: u64) -> FeedbackEntry {
        FeedbackEntry::new(task, "code_file", vec![agent.to_string()], success, ms)
    }

    #[tokio::test]
    async fn test_stats_for_unknown_agent() {
        let store = FeedbackStore::in_memory();
        let stats = store.agent_stats("ghost").await;
        assert_eq!(stats.total, 0);
        assert!(stats.avg_rating.is_none());
    }

    #[tokio::test]
    async fn test_stats_aggregate() {
        let store = FeedbackStore::in_memory();
        store.record(outcome("t1", "omnisearch", true, 100)).await.unwrap();
        store.record(outcome("t2", "omnisearch", false, 300)).await.unwrap();
        store.record(outcome("t3", "quality-assessor", true, 50)).await.unwrap();

        let stats = store.agent_stats("omnisearch").await;
        assert_eq!(stats.total, 2);
        assert!((stats.success_rate - 0.5).abs() < f64::EPSILON);
        assert!((stats.avg_time_ms - 200.0).abs() < f64::EPSILON);

        let all = store.all_stats().await;
        let names: Vec<&str> = all.iter().map(|s| s.agent.as_str()).collect();
        assert_eq!(names, vec!["omnisearch", "quality-assessor"]);
    }

    #[tokio::test]
    async fn test_rate_attaches_to_task_agents() {
        let store = FeedbackStore::in_memory();
        store.record(outcome("t1", "omnisearch", true, 100)).await.unwrap();
        let entry = store.rate("t1", 4, Some("useful".into())).await.unwrap();
        assert_eq!(entry.agents_used, vec!["omnisearch"]);

        let stats = store.agent_stats("omnisearch").await;
        assert_eq!(stats.total, 1, "ratings are not outcomes");
        assert_eq!(stats.avg_rating, Some(4.0));
    }

    #[tokio::test]
    async fn test_rate_validation() {
        let store = FeedbackStore::in_memory();
        assert!(matches!(
            store.rate("t1", 6, None).await,
            Err(DomainError::InvalidRating(6))
        ));
        assert!(matches!(
            store.rate("missing", 3, None).await,
            Err(DomainError::ValidationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_suggestions() {
        let store = FeedbackStore::in_memory();
        for i in 0..5 {
            store
                .record(outcome(&format!("t{i}"), "flaky", i == 0, 100))
                .await
                .unwrap();
        }
        store.record(outcome("s", "sluggish", true, 12_000)).await.unwrap();

        let suggestions = store.suggest_improvements().await;
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions[0].contains("Agent 'flaky' has low success rate (20%)"));
        assert!(suggestions[1].contains("Agent 'sluggish' is slow (avg 12000ms)"));
    }

    #[tokio::test]
    async fn test_recent() {
        let store = FeedbackStore::in_memory();
        for i in 0..4 {
            store.record(outcome(&format!("t{i}"), "a", true, 1)).await.unwrap();
        }
        let recent = store.recent(2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].task_id, "t2");
        assert_eq!(store.recent(10).await.len(), 4);
    }
}
