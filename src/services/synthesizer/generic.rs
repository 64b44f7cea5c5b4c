//! Fallback fusion and error reports.

use chrono::Utc;
use serde_json::json;
use std::time::Duration;

use crate::domain::models::{ExecutorOutput, Report, ReportMetadata, ReportSection, SectionPriority};

use super::{clip, Draft};

/// Verbatim result payloads are cut at this many characters.
const RESULT_PREVIEW_CHARS: usize = 500;

/// Surface every output as-is with overall success counts.
pub fn fuse(outputs: &[ExecutorOutput]) -> Draft {
    let mut draft = Draft::new("Task Execution Report");
    let ok = outputs.iter().filter(|o| o.success).count();
    let failed = outputs.len() - ok;

    draft.summary = format!(
        "Completed {ok}/{} executor runs successfully.",
        outputs.len()
    );
    for output in outputs {
        let (icon, priority) = if output.success {
            ("OK", SectionPriority::Medium)
        } else {
            ("XX", SectionPriority::High)
        };
        draft.section(output.executor.clone(), icon, format_output(output), priority);
    }
    if failed > 0 {
        draft.recommend(format!("HIGH: {failed} executor(s) failed - review errors"));
    }
    draft
}

/// Human-readable dump of one output, result payload included.
pub fn format_output(output: &ExecutorOutput) -> String {
    let mut lines = vec![
        format!("Executor: {}", output.executor),
        format!("Description: {}", output.description),
        format!("Success: {}", output.success),
        format!("Execution time: {}ms", output.execution_time_ms),
    ];
    if let Some(error) = &output.error {
        lines.push(format!("Error: {error}"));
    }
    if !output.result.is_empty() {
        let rendered = serde_json::to_string_pretty(&output.result)
            .unwrap_or_else(|_| format!("{:?}", output.result));
        lines.push(String::new());
        lines.push("Result:".to_string());
        if rendered.chars().count() > RESULT_PREVIEW_CHARS {
            lines.push(format!("{}\n... (truncated)", clip(&rendered, RESULT_PREVIEW_CHARS)));
        } else {
            lines.push(rendered);
        }
    }
    lines.join("\n")
}

/// Report for a pipeline run that failed outside any subtask.
pub fn error_report(request: &str, error: &str, elapsed: Duration) -> Report {
    let secs = elapsed.as_secs_f64();
    let mut metadata = ReportMetadata::default();
    metadata.extra.insert("error".to_string(), json!(error));
    metadata.extra.insert("task".to_string(), json!(request));
    metadata
        .extra
        .insert("duration_seconds".to_string(), json!(secs));

    Report {
        title: "Execution Error".to_string(),
        summary: format!("Task execution failed: {error}"),
        sections: vec![ReportSection::new(
            "Error Details",
            "ERR",
            format!("Task: {request}\nError: {error}\nDuration: {secs:.2}s"),
            SectionPriority::High,
        )],
        recommendations: vec!["Review the error and retry".to_string()],
        metadata,
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Payload;

    #[test]
    fn test_generic_counts_and_recommendation() {
        let outputs = vec![
            ExecutorOutput::succeeded("a", "omnisearch", "search", Payload::new().with("hits", 3), 5),
            ExecutorOutput::failed("b", "claude-code", "explain", "boom", 7),
        ];
        let draft = fuse(&outputs);
        assert_eq!(draft.summary, "Completed 1/2 executor runs successfully.");
        assert_eq!(draft.recommendations, vec!["HIGH: 1 executor(s) failed - review errors"]);
        assert!(draft.sections[0].content.contains("\"hits\": 3"));
        assert_eq!(draft.sections[1].icon, "XX");
    }

    #[test]
    fn test_format_output_truncates_large_results() {
        let big = "x".repeat(2_000);
        let output = ExecutorOutput::succeeded("a", "e", "d", Payload::new().with("blob", big), 1);
        let text = format_output(&output);
        assert!(text.ends_with("... (truncated)"));
        assert!(text.len() < 1_000);
    }

    #[test]
    fn test_error_report_shape() {
        let report = error_report("do things", "classifier exploded", Duration::from_millis(1500));
        assert!(report.is_error());
        assert_eq!(report.summary, "Task execution failed: classifier exploded");
        assert_eq!(report.sections[0].icon, "ERR");
        assert!(report.sections[0].content.contains("Duration: 1.50s"));
        assert_eq!(report.metadata.extra["task"], json!("do things"));
    }
}
