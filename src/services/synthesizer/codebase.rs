//! Code-analysis fusions.

use crate::domain::models::{
    DeadCodeReport, DuplicateReport, ExecutorOutput, OrganizationReport, RefactorPlan,
    ResultShape, SectionPriority,
};

use super::{clip, find_ok, generic, title_case, Draft};

/// More duplicate blocks than this earns a high-priority recommendation.
const DUPLICATE_ALERT: u64 = 5;
/// Cleanup issue count above which a dedicated sprint is recommended.
const CLEANUP_SPRINT: u64 = 10;
/// Removable lines above which cleanup is called out.
const CLEANUP_LINES: u64 = 500;

pub fn analyze(outputs: &[ExecutorOutput]) -> Draft {
    let mut draft = Draft::new("Codebase Analysis");
    let mut parts = Vec::new();
    let mut total_issues = 0;

    let dups = find_ok(outputs, "duplicate-detector").map(|o| DuplicateReport::from_payload(&o.result));
    let dead = find_ok(outputs, "dead-code-eliminator").map(|o| DeadCodeReport::from_payload(&o.result));
    let org = find_ok(outputs, "code-grouper").map(|o| OrganizationReport::from_payload(&o.result));
    let plan = find_ok(outputs, "refactor-planner").map(|o| RefactorPlan::from_payload(&o.result));

    if let Some(d) = &dups {
        total_issues += d.duplicates_found;
        parts.push(format!("{} duplicate code blocks", d.duplicates_found));
        if d.duplicates_found > DUPLICATE_ALERT {
            draft.recommend("HIGH: Refactor duplicate code to shared utilities");
        }
        draft.section("Duplicate Code", "DUP", duplicate_section(d), duplicate_priority(d));
    }
    if let Some(d) = &dead {
        total_issues += d.unused_functions + d.unused_imports;
        parts.push(format!(
            "{} unused functions, {} unused imports",
            d.unused_functions, d.unused_imports
        ));
        if d.unused_functions > 0 {
            draft.recommend("MEDIUM: Remove dead code to reduce maintenance burden");
        }
        draft.section("Dead Code", "DEL", dead_code_section(d), SectionPriority::Medium);
    }
    if let Some(o) = &org {
        if o.misplaced_files > 0 {
            parts.push(format!("{} files could be better organized", o.misplaced_files));
            draft.recommend("LOW: Consider reorganizing file structure");
        }
        draft.section("Code Organization", "ORG", organization_section(o), SectionPriority::Low);
    }
    if let Some(p) = &plan {
        if !p.priority_actions.is_empty() {
            parts.push(format!("{} refactoring actions recommended", p.priority_actions.len()));
        }
        draft.section("Refactoring Plan", "REF", refactoring_section(p), SectionPriority::High);
    }

    draft.summary = if parts.is_empty() {
        format!("Codebase analysis complete. Found {total_issues} issues.")
    } else {
        format!(
            "Codebase analysis complete. Found {total_issues} issues: {}.",
            parts.join(", ")
        )
    };
    draft.surface_failures(outputs);
    draft
}

pub fn duplicates(outputs: &[ExecutorOutput]) -> Draft {
    let mut draft = Draft::new("Duplicate Code Report");
    match find_ok(outputs, "duplicate-detector").map(|o| DuplicateReport::from_payload(&o.result)) {
        Some(d) => {
            draft.summary = format!(
                "Found {} duplicate code blocks affecting {} lines.",
                d.duplicates_found, d.total_lines_duplicated
            );
            if d.duplicates_found > DUPLICATE_ALERT {
                draft.recommend("HIGH: Refactor duplicate code to shared utilities");
            }
            draft.section("Duplicate Code", "DUP", duplicate_section(&d), duplicate_priority(&d));
        }
        None => {
            draft.summary = "Duplicate detection did not complete.".to_string();
            draft.recommend("HIGH: Re-run duplicate detection");
        }
    }
    draft.surface_failures(outputs);
    draft
}

pub fn dead_code(outputs: &[ExecutorOutput]) -> Draft {
    let mut draft = Draft::new("Dead Code Report");
    match find_ok(outputs, "dead-code-eliminator").map(|o| DeadCodeReport::from_payload(&o.result)) {
        Some(d) => {
            draft.summary = format!(
                "Found {} unused functions, {} unused imports and {} unused variables ({} removable lines).",
                d.unused_functions, d.unused_imports, d.unused_variables, d.removable_lines
            );
            if d.unused_functions > 0 {
                draft.recommend("MEDIUM: Remove dead code to reduce maintenance burden");
            }
            draft.section("Dead Code", "DEL", dead_code_section(&d), SectionPriority::Medium);
        }
        None => {
            draft.summary = "Dead code analysis did not complete.".to_string();
            draft.recommend("HIGH: Re-run dead code analysis");
        }
    }
    draft.surface_failures(outputs);
    draft
}

pub fn organization(outputs: &[ExecutorOutput]) -> Draft {
    let mut draft = Draft::new("Code Organization Report");
    match find_ok(outputs, "code-grouper").map(|o| OrganizationReport::from_payload(&o.result)) {
        Some(o) => {
            draft.summary = format!(
                "Analyzed {} files; {} could be better organized.",
                o.files_analyzed, o.misplaced_files
            );
            if o.misplaced_files > 0 {
                draft.recommend("LOW: Consider reorganizing file structure");
            }
            draft.section("Code Organization", "ORG", organization_section(&o), SectionPriority::Low);
        }
        None => {
            draft.summary = "Code organization analysis did not complete.".to_string();
            draft.recommend("HIGH: Re-run code organization analysis");
        }
    }
    draft.surface_failures(outputs);
    draft
}

pub fn cleanup(outputs: &[ExecutorOutput]) -> Draft {
    let mut draft = Draft::new("Code Cleanup Report");
    let mut total_issues = 0;
    let mut total_lines = 0;

    for output in outputs.iter().filter(|o| o.success) {
        let (issues, lines, content) = match ResultShape::of(output) {
            ResultShape::Duplicates(d) => (d.duplicates_found, d.total_lines_duplicated, duplicate_section(&d)),
            ResultShape::DeadCode(d) => (d.issues(), d.removable_lines, dead_code_section(&d)),
            ResultShape::Refactor(p) => (p.priority_actions.len() as u64, 0, refactoring_section(&p)),
            ResultShape::Opaque(p) => {
                let issues = p.u64_or("issues_found", 0);
                let lines = p.u64_or("lines_removable", 0);
                let mut content = format!("Issues found: {issues}\nLines removable: {lines}");
                let items = p.strings("top_items");
                if !items.is_empty() {
                    content.push_str("\n\nTop items:");
                    for item in items.iter().take(5) {
                        content.push_str(&format!("\n  - {item}"));
                    }
                }
                (issues, lines, content)
            }
            _ => (0, 0, generic::format_output(output)),
        };
        total_issues += issues;
        total_lines += lines;

        let base = output.base_name();
        draft.section(
            title_case(base),
            &clip(base, 3).to_uppercase(),
            content,
            cleanup_priority(issues),
        );
    }

    draft.summary = format!(
        "Code cleanup analysis complete. {total_issues} issues found, {total_lines} lines can be cleaned up."
    );
    if total_issues > CLEANUP_SPRINT {
        draft.recommend("HIGH: Significant cleanup opportunity - schedule dedicated cleanup sprint");
    }
    if total_lines > CLEANUP_LINES {
        draft.recommend(format!(
            "MEDIUM: Can remove {total_lines} lines - reduces maintenance burden"
        ));
    }
    draft.surface_failures(outputs);
    draft
}

pub fn refactoring(outputs: &[ExecutorOutput]) -> Draft {
    let mut draft = Draft::new("Refactoring Roadmap");

    match find_ok(outputs, "refactor-planner").map(|o| RefactorPlan::from_payload(&o.result)) {
        Some(plan) => {
            draft.summary = format!(
                "Refactoring Roadmap: {} items identified, {} high-priority",
                plan.total_items, plan.high_priority_count
            );
            if plan.estimated_hours > 0.0 {
                draft.summary.push_str(&format!(" (Est. {}h total)", plan.estimated_hours));
            }

            if !plan.high.is_empty() {
                draft.section("High Priority Refactors", "!!!", bullets(&plan.high, 5), SectionPriority::High);
                draft.recommend(format!(
                    "HIGH: Address {} critical refactoring items",
                    plan.high.len()
                ));
            }
            if !plan.medium.is_empty() {
                draft.section("Medium Priority Refactors", "!!", bullets(&plan.medium, 5), SectionPriority::Medium);
            }
            if !plan.low.is_empty() {
                draft.section("Low Priority Refactors", "!", bullets(&plan.low, 3), SectionPriority::Low);
            }
            if !plan.priority_actions.is_empty() {
                draft.section("Priority Actions", "REF", refactoring_section(&plan), SectionPriority::High);
            }
        }
        None => {
            draft.summary = "Refactoring analysis completed".to_string();
        }
    }

    for output in outputs
        .iter()
        .filter(|o| o.success && o.base_name() != "refactor-planner")
    {
        let content = match ResultShape::of(output) {
            ResultShape::Duplicates(d) => duplicate_section(&d),
            ResultShape::DeadCode(d) => dead_code_section(&d),
            ResultShape::Organization(o) => organization_section(&o),
            _ => generic::format_output(output),
        };
        draft.section(
            format!("Supporting: {}", output.base_name()),
            "+",
            content,
            SectionPriority::Low,
        );
    }
    draft.surface_failures(outputs);
    draft
}

fn duplicate_priority(d: &DuplicateReport) -> SectionPriority {
    if d.duplicates_found > DUPLICATE_ALERT {
        SectionPriority::High
    } else {
        SectionPriority::Medium
    }
}

const fn cleanup_priority(issues: u64) -> SectionPriority {
    if issues > 10 {
        SectionPriority::High
    } else if issues > 3 {
        SectionPriority::Medium
    } else {
        SectionPriority::Low
    }
}

fn bullets(items: &[String], max: usize) -> String {
    items
        .iter()
        .take(max)
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn duplicate_section(d: &DuplicateReport) -> String {
    let mut lines = vec![
        format!("Total duplicates: {}", d.duplicates_found),
        format!("Lines affected: {}", d.total_lines_duplicated),
        format!("Space savings potential: {}", d.space_savings),
    ];
    if !d.groups.is_empty() {
        lines.push(String::new());
        lines.push("Top duplicate groups:".to_string());
        for (i, group) in d.groups.iter().take(5).enumerate() {
            let mut files = group
                .files
                .iter()
                .take(3)
                .map(|f| clip(f, 30))
                .collect::<Vec<_>>()
                .join(", ");
            if group.files.len() > 3 {
                files.push_str(&format!(" (+{} more)", group.files.len() - 3));
            }
            lines.push(format!(
                "  {}. {} lines across {} files",
                i + 1,
                group.lines,
                group.files.len()
            ));
            lines.push(format!("     Files: {files}"));
        }
    }
    lines.join("\n")
}

pub fn dead_code_section(d: &DeadCodeReport) -> String {
    let mut lines = vec![
        format!("Unused functions: {}", d.unused_functions),
        format!("Unused imports: {}", d.unused_imports),
        format!("Unused variables: {}", d.unused_variables),
        format!("Removable lines: {}", d.removable_lines),
    ];
    if !d.top_unused.is_empty() {
        lines.push(String::new());
        lines.push("Top candidates for removal:".to_string());
        lines.extend(d.top_unused.iter().take(5).map(|n| format!("  - {n}")));
    }
    lines.join("\n")
}

pub fn organization_section(o: &OrganizationReport) -> String {
    let score = o
        .organization_score
        .map_or_else(|| "N/A".to_string(), |s| s.to_string());
    let mut lines = vec![
        format!("Files analyzed: {}", o.files_analyzed),
        format!("Current structure score: {score}/100"),
    ];
    if o.suggested_moves > 0 {
        lines.push(format!("Suggested moves: {}", o.suggested_moves));
    }
    if !o.new_directories.is_empty() {
        lines.push(String::new());
        lines.push("Suggested new directories:".to_string());
        lines.extend(o.new_directories.iter().take(5).map(|d| format!("  - {d}")));
    }
    lines.join("\n")
}

pub fn refactoring_section(p: &RefactorPlan) -> String {
    let mut lines = Vec::new();
    if !p.priority_actions.is_empty() {
        lines.push("Priority refactoring actions:".to_string());
        for (i, action) in p.priority_actions.iter().take(7).enumerate() {
            lines.push(format!(
                "  {}. [{}] {}",
                i + 1,
                action.priority.to_uppercase(),
                action.description
            ));
            if action.estimated_effort != "unknown" {
                lines.push(format!("     Effort: {}", action.estimated_effort));
            }
        }
    }
    if p.estimated_total_effort != "unknown" {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("Total estimated effort: {}", p.estimated_total_effort));
    }
    if lines.is_empty() {
        "No refactoring actions reported".to_string()
    } else {
        lines.join("\n")
    }
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
    fn test_analyze_summary_counts() {
        let outputs = vec![
            ok("duplicate-detector-ion", json!({"duplicates_found": 7})),
            ok("dead-code-eliminator-ion", json!({"unused_functions": 12, "unused_imports": 8})),
            ok("code-grouper-ion", json!({"misplaced_files": 3})),
            ok("refactor-planner-ion", json!({"priority_actions": ["a", "b"]})),
        ];
        let draft = analyze(&outputs);
        assert_eq!(
            draft.summary,
            "Codebase analysis complete. Found 27 issues: 7 duplicate code blocks, \
             12 unused functions, 8 unused imports, 3 files could be better organized, \
             2 refactoring actions recommended."
        );
        assert_eq!(
            draft.recommendations,
            vec![
                "HIGH: Refactor duplicate code to shared utilities",
                "MEDIUM: Remove dead code to reduce maintenance burden",
                "LOW: Consider reorganizing file structure",
            ]
        );
        assert_eq!(draft.sections.len(), 4);
    }

    #[test]
    fn test_duplicate_section_without_groups() {
        let d = DuplicateReport::from_payload(&Payload::from_value(json!({"duplicates_found": 7})));
        let text = duplicate_section(&d);
        assert!(text.contains("Total duplicates: 7"));
        assert!(!text.contains("Top duplicate groups"));
    }

    #[test]
    fn test_duplicate_section_truncates_file_lists() {
        let d = DuplicateReport::from_payload(&Payload::from_value(json!({
            "groups": [{"lines": 10, "files": ["a", "b", "c", "d", "e"]}]
        })));
        let text = duplicate_section(&d);
        assert!(text.contains("10 lines across 5 files"));
        assert!(text.contains("Files: a, b, c (+2 more)"));
    }

    #[test]
    fn test_cleanup_aggregates_shapes() {
        let outputs = vec![
            ok("duplicate-detector-ion", json!({"duplicates_found": 4, "total_lines_duplicated": 300})),
            ok("dead-code-eliminator-ion", json!({"unused_functions": 9, "removable_lines": 250})),
        ];
        let draft = cleanup(&outputs);
        assert_eq!(
            draft.summary,
            "Code cleanup analysis complete. 13 issues found, 550 lines can be cleaned up."
        );
        assert_eq!(draft.recommendations.len(), 2);
        assert_eq!(draft.sections[0].title, "Duplicate Detector");
        assert_eq!(draft.sections[0].icon, "DUP");
    }

    #[test]
    fn test_refactoring_roadmap() {
        let outputs = vec![ok(
            "refactor-planner-ion",
            json!({
                "total_items": 6,
                "high_priority_count": 2,
                "estimated_hours": 4.5,
                "high_priority": [{"description": "Split god module"}, "Remove globals"],
                "low_priority": ["Rename helpers"]
            }),
        )];
        let draft = refactoring(&outputs);
        assert_eq!(
            draft.summary,
            "Refactoring Roadmap: 6 items identified, 2 high-priority (Est. 4.5h total)"
        );
        assert_eq!(draft.recommendations, vec!["HIGH: Address 2 critical refactoring items"]);
        assert!(draft.sections[0].content.contains("- Split god module"));
    }
}
