//! Synthesized reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::pattern::Pattern;

/// Section priority. Ordering is high first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionPriority {
    High,
    Medium,
    Low,
}

impl SectionPriority {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for SectionPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labeled block of report content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    /// Short bracketed tag shown before the title, e.g. `DUP`.
    pub icon: String,
    pub content: String,
    pub priority: SectionPriority,
}

impl ReportSection {
    pub fn new(
        title: impl Into<String>,
        icon: impl Into<String>,
        content: impl Into<String>,
        priority: SectionPriority,
    ) -> Self {
        Self {
            title: title.into(),
            icon: icon.into(),
            content: content.into(),
            priority,
        }
    }
}

/// Execution figures attached to every report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
    pub total_executors: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_execution_ms: u64,
    pub avg_execution_ms: u64,
    pub executors_used: Vec<String>,
    /// Free-form extras, e.g. the error details of a degraded report.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

/// The final product of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub summary: String,
    pub sections: Vec<ReportSection>,
    pub recommendations: Vec<String>,
    pub metadata: ReportMetadata,
    pub generated_at: DateTime<Utc>,
}

impl Report {
    /// Sort sections high → medium → low, keeping insertion order within a
    /// priority.
    pub fn sort_sections(&mut self) {
        self.sections.sort_by_key(|s| s.priority);
    }

    /// Whether this report describes a failed pipeline run.
    pub fn is_error(&self) -> bool {
        self.metadata.extra.contains_key("error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(SectionPriority::High < SectionPriority::Medium);
        assert!(SectionPriority::Medium < SectionPriority::Low);
    }

    #[test]
    fn test_sort_sections_is_stable() {
        let mut report = Report {
            title: "t".into(),
            summary: String::new(),
            sections: vec![
                ReportSection::new("low", "L", "", SectionPriority::Low),
                ReportSection::new("med-a", "M", "", SectionPriority::Medium),
                ReportSection::new("high", "H", "", SectionPriority::High),
                ReportSection::new("med-b", "M", "", SectionPriority::Medium),
            ],
            recommendations: vec![],
            metadata: ReportMetadata::default(),
            generated_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        report.sort_sections();
        let titles: Vec<&str> = report.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["high", "med-a", "med-b", "low"]);
    }
}
