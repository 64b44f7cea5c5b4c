//! Project status fusion.

use crate::domain::models::{ExecutorOutput, ProjectSnapshot, ResultShape, SectionPriority};

use super::Draft;

/// Overall health verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Health {
    Healthy,
    Warning,
    Critical,
}

impl Health {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "HEALTHY",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

pub fn status(outputs: &[ExecutorOutput]) -> Draft {
    let mut draft = Draft::new("Project Status Report");

    let mut snapshot = ProjectSnapshot::default();
    let mut sources = 0;
    for output in outputs.iter().filter(|o| o.success) {
        if let ResultShape::Project(s) = ResultShape::of(output) {
            snapshot.merge(s);
            sources += 1;
        }
    }

    if sources == 0 {
        draft.summary = "Project Status: UNKNOWN. No status sources reported.".to_string();
        draft.recommend("HIGH: Re-run status collection");
        draft.surface_failures(outputs);
        return draft;
    }

    let mut health = Health::Healthy;
    let mut parts = Vec::new();

    if let Some(branch) = &snapshot.branch {
        parts.push(format!("Branch: {branch}"));
    }
    if snapshot.uncommitted_changes > 0 {
        parts.push(format!("{} uncommitted changes", snapshot.uncommitted_changes));
        draft.recommend("LOW: Commit or stash uncommitted changes");
    }
    if let Some(score) = snapshot.health_score {
        if score < 50.0 {
            health = Health::Critical;
            draft.recommend("HIGH: Address critical health issues immediately");
        } else if score < 80.0 {
            health = Health::Warning;
            draft.recommend("MEDIUM: Review health warnings");
        }
        parts.push(format!("Health: {score}%"));
    }
    if snapshot.tests_passed + snapshot.tests_failed > 0 {
        parts.push(format!(
            "Tests: {} passed, {} failed",
            snapshot.tests_passed, snapshot.tests_failed
        ));
        if snapshot.tests_failed > 0 {
            if health == Health::Healthy {
                health = Health::Warning;
            }
            draft.recommend("HIGH: Fix failing tests");
        }
    }

    draft.summary = if parts.is_empty() {
        format!("Project Status: {}.", health.as_str())
    } else {
        format!("Project Status: {}. {}.", health.as_str(), parts.join(", "))
    };

    if let Some(focus) = &snapshot.current_focus {
        draft.section("Current Focus", "FOC", focus.clone(), SectionPriority::Medium);
    }
    if snapshot.branch.is_some() || snapshot.uncommitted_changes > 0 || snapshot.recent_commits > 0 {
        let mut lines = vec![
            format!("Branch: {}", snapshot.branch.as_deref().unwrap_or("unknown")),
            format!("Uncommitted changes: {}", snapshot.uncommitted_changes),
            format!("Recent commits: {}", snapshot.recent_commits),
        ];
        if !snapshot.active_files.is_empty() {
            lines.push(String::new());
            lines.push("Active files:".to_string());
            lines.extend(snapshot.active_files.iter().take(5).map(|f| format!("  - {f}")));
        }
        draft.section("Git Status", "GIT", lines.join("\n"), SectionPriority::Medium);
    }
    if let Some(score) = snapshot.health_score {
        let mut lines = vec![format!("Overall score: {score}/100")];
        if !snapshot.health_issues.is_empty() {
            lines.push(String::new());
            lines.push("Issues:".to_string());
            lines.extend(snapshot.health_issues.iter().map(|i| format!("  [XX] {i}")));
        }
        let priority = if score < 80.0 {
            SectionPriority::High
        } else {
            SectionPriority::Low
        };
        draft.section("System Health", "HLT", lines.join("\n"), priority);
    }
    if !snapshot.recent_activities.is_empty() {
        let mut lines = vec![format!("Recent activities: {}", snapshot.recent_activities.len())];
        lines.push(String::new());
        lines.extend(snapshot.recent_activities.iter().take(10).map(|a| format!("  {a}")));
        draft.section("Recent Activity", "ACT", lines.join("\n"), SectionPriority::Low);
    }
    let total_tests = snapshot.tests_passed + snapshot.tests_failed;
    if total_tests > 0 {
        let lines = [
            format!("Total tests: {total_tests}"),
            format!("Passed: {}", snapshot.tests_passed),
            format!("Failed: {}", snapshot.tests_failed),
            format!(
                "Success rate: {:.1}%",
                snapshot.tests_passed as f64 / total_tests as f64 * 100.0
            ),
        ];
        let priority = if snapshot.tests_failed > 0 {
            SectionPriority::High
        } else {
            SectionPriority::Low
        };
        draft.section("Test Results", "TST", lines.join("\n"), priority);
    }

    draft.surface_failures(outputs);
    draft
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Payload;
    use serde_json::json;

    fn ok(executor: &str, result: serde_json::Value) -> ExecutorOutput {
        ExecutorOutput::succeeded("s", executor, "d", Payload::from_value(result), 10)
    }

    #[test]
    fn test_healthy_project() {
        let draft = status(&[ok(
            "context-builder",
            json!({"branch": "main", "current_focus": "router tuning", "health_score": 92}),
        )]);
        assert_eq!(draft.summary, "Project Status: HEALTHY. Branch: main, Health: 92%.");
        assert!(draft.recommendations.is_empty());
        assert_eq!(draft.sections[0].title, "Current Focus");
    }

    #[test]
    fn test_failing_tests_downgrade_to_warning() {
        let draft = status(&[
            ok("git-status", json!({"branch": "dev", "uncommitted_changes": 2})),
            ok("test-runner", json!({"tests_passed": 10, "tests_failed": 1})),
        ]);
        assert!(draft.summary.starts_with("Project Status: WARNING."));
        assert!(draft.recommendations.contains(&"HIGH: Fix failing tests".to_string()));
        assert!(draft
            .recommendations
            .contains(&"LOW: Commit or stash uncommitted changes".to_string()));
    }

    #[test]
    fn test_critical_health() {
        let draft = status(&[ok("health-check", json!({"health_score": 30, "issues": ["disk full"]}))]);
        assert!(draft.summary.starts_with("Project Status: CRITICAL."));
        let health = draft.sections.iter().find(|s| s.icon == "HLT").unwrap();
        assert_eq!(health.priority, SectionPriority::High);
        assert!(health.content.contains("[XX] disk full"));
    }

    #[test]
    fn test_no_sources() {
        let draft = status(&[]);
        assert!(draft.summary.contains("UNKNOWN"));
    }
}
