//! Feedback entries and per-executor statistics derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content type recorded on entries that only carry a user rating.
pub const RATING_CONTENT_TYPE: &str = "user_rating";

/// One durable record of an execution outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub timestamp: DateTime<Utc>,
    pub task_id: String,
    pub content_type: String,
    pub agents_used: Vec<String>,
    pub success: bool,
    pub execution_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl FeedbackEntry {
    pub fn new(
        task_id: impl Into<String>,
        content_type: impl Into<String>,
        agents_used: Vec<String>,
        success: bool,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            task_id: task_id.into(),
            content_type: content_type.into(),
            agents_used,
            success,
            execution_time_ms,
            user_rating: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn with_rating(mut self, rating: u8, notes: Option<String>) -> Self {
        self.user_rating = Some(rating);
        self.notes = notes;
        self
    }

    /// Rating records carry a user rating and are not execution outcomes.
    pub fn is_rating(&self) -> bool {
        self.content_type == RATING_CONTENT_TYPE
    }
}

/// Aggregated figures for one executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    pub agent: String,
    pub total: usize,
    pub success_rate: f64,
    pub avg_time_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_rating: Option<f64>,
}

impl AgentStats {
    pub fn empty(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            total: 0,
            success_rate: 0.0,
            avg_time_ms: 0.0,
            avg_rating: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsonl_line_omits_empty_optionals() {
        let entry = FeedbackEntry::new("t1", "code_file", vec!["omnisearch".into()], true, 40);
        let line = serde_json::to_string(&entry).unwrap();
        assert!(!line.contains("user_rating"));
        assert!(!line.contains("notes"));
        let back: FeedbackEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_rating_entry() {
        let entry = FeedbackEntry::new("t1", RATING_CONTENT_TYPE, vec!["omnisearch".into()], true, 0).with_rating(4, Some("good".into()));
        assert!(entry.is_rating());
    }
}
