//! Table output formatting for CLI commands
//!
//! Renders plans, routing decisions, executor statistics and run history with
//! comfy-table. Colors are dropped when the terminal cannot show them.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use crate::domain::models::{AgentStats, FeedbackEntry, TaskPlan, WorkflowTemplate};
use crate::services::{HistoryEntry, RouteDecision};

/// Table formatter for CLI output
pub struct TableFormatter {
    use_colors: bool,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
        }
    }

    pub const fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// One row per subtask, in wave order.
    pub fn format_plan(&self, plan: &TaskPlan) -> String {
        let mut table = create_base_table();
        table.set_header(header(&["Wave", "Subtask", "Executor", "Priority", "Depends On", "Description"]));

        for (wave, ids) in plan.parallel_groups.iter().enumerate() {
            for id in ids {
                let Some(subtask) = plan.subtask(id) else {
                    continue;
                };
                let executor = subtask.executor.as_deref().unwrap_or("(routed)");
                let depends = if subtask.depends_on.is_empty() {
                    "-".to_string()
                } else {
                    subtask.depends_on.join(", ")
                };
                table.add_row(vec![
                    Cell::new(wave + 1),
                    Cell::new(&subtask.id),
                    self.colored(executor, Color::Cyan),
                    Cell::new(subtask.priority),
                    Cell::new(depends),
                    Cell::new(truncate_text(&subtask.description, 48)),
                ]);
            }
        }
        table.to_string()
    }

    pub fn format_route(&self, decision: &RouteDecision) -> String {
        let mut table = create_base_table();
        table.set_header(header(&["Executor", "Score", "Category", "Capability", "Selected"]));

        for candidate in &decision.candidates {
            let selected = decision.executors.contains(&candidate.name);
            table.add_row(vec![
                Cell::new(&candidate.name),
                Cell::new(format!("{:.3}", candidate.score)),
                Cell::new(yes_no(candidate.category_match)),
                Cell::new(yes_no(candidate.capability_match)),
                if selected {
                    self.colored("✓", Color::Green)
                } else {
                    Cell::new("")
                },
            ]);
        }
        table.to_string()
    }

    pub fn format_stats(&self, stats: &[AgentStats]) -> String {
        let mut table = create_base_table();
        table.set_header(header(&["Executor", "Runs", "Success Rate", "Avg Time", "Avg Rating"]));

        for s in stats {
            let rate = format!("{:.1}%", s.success_rate * 100.0);
            let rate_cell = if s.success_rate >= 0.8 {
                self.colored(&rate, Color::Green)
            } else if s.success_rate >= 0.5 {
                self.colored(&rate, Color::Yellow)
            } else {
                self.colored(&rate, Color::Red)
            };
            table.add_row(vec![
                Cell::new(&s.agent),
                Cell::new(s.total),
                rate_cell,
                Cell::new(format!("{:.0}ms", s.avg_time_ms)),
                Cell::new(s.avg_rating.map_or_else(|| "-".to_string(), |r| format!("{r:.1}"))),
            ]);
        }
        table.to_string()
    }

    pub fn format_history(&self, history: &[HistoryEntry]) -> String {
        let mut table = create_base_table();
        table.set_header(header(&["Plan", "Request", "Pattern", "Result", "Subtasks", "Duration"]));

        for entry in history {
            let plan = entry
                .plan_id
                .map_or_else(|| "-".to_string(), |id| id.to_string()[..8].to_string());
            table.add_row(vec![
                Cell::new(plan),
                Cell::new(truncate_text(&entry.request, 40)),
                Cell::new(entry.pattern.map_or("-", |p| p.as_str())),
                self.outcome(entry.success),
                Cell::new(format!("{}/{}", entry.succeeded, entry.subtasks)),
                Cell::new(format!("{}ms", entry.duration_ms)),
            ]);
        }
        table.to_string()
    }

    pub fn format_feedback(&self, entries: &[FeedbackEntry]) -> String {
        let mut table = create_base_table();
        table.set_header(header(&["When", "Task", "Type", "Executors", "Result", "Rating"]));

        for entry in entries {
            table.add_row(vec![
                Cell::new(entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()),
                Cell::new(truncate_text(&entry.task_id, 12)),
                Cell::new(&entry.content_type),
                Cell::new(truncate_text(&entry.agents_used.join(", "), 36)),
                self.outcome(entry.success),
                Cell::new(entry.user_rating.map_or_else(|| "-".to_string(), |r| r.to_string())),
            ]);
        }
        table.to_string()
    }

    pub fn format_workflows<'a>(&self, workflows: impl Iterator<Item = &'a WorkflowTemplate>) -> String {
        let mut table = create_base_table();
        table.set_header(header(&["Workflow", "Description", "Parameters"]));

        for workflow in workflows {
            let params: Vec<String> = workflow
                .parameters
                .iter()
                .map(|p| {
                    if p.required {
                        p.name.clone()
                    } else {
                        format!("[{}]", p.name)
                    }
                })
                .collect();
            table.add_row(vec![
                self.colored(&workflow.name, Color::Cyan),
                Cell::new(truncate_text(&workflow.description, 50)),
                Cell::new(params.join(" ")),
            ]);
        }
        table.to_string()
    }

    fn outcome(&self, success: bool) -> Cell {
        if success {
            self.colored("ok", Color::Green)
        } else {
            self.colored("failed", Color::Red)
        }
    }

    fn colored(&self, text: &str, color: Color) -> Cell {
        if self.use_colors {
            Cell::new(text).fg(color)
        } else {
            Cell::new(text)
        }
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn create_base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|n| Cell::new(n).add_attribute(Attribute::Bold))
        .collect()
}

const fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Check if the terminal supports colors
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    if env::var("TERM").is_ok_and(|t| t == "dumb") {
        return false;
    }
    console::colors_enabled()
}

/// Truncate text to a maximum number of characters
fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Payload;
    use crate::services::{AdaptiveRouter, TaskDecomposer};

    #[test]
    fn test_plan_table_lists_every_subtask() {
        let plan = TaskDecomposer::with_defaults().plan("Analyze the codebase", &Payload::new());
        let rendered = TableFormatter::with_colors(false).format_plan(&plan);
        for subtask in &plan.subtasks {
            assert!(rendered.contains(&subtask.id), "missing {}", subtask.id);
        }
        assert!(rendered.contains("Depends On"));
    }

    #[test]
    fn test_route_table_marks_selection() {
        let decision = AdaptiveRouter::with_defaults().route_detailed("search for rust tutorials");
        let rendered = TableFormatter::with_colors(false).format_route(&decision);
        assert!(rendered.contains("omnisearch"));
        assert!(rendered.contains('✓'));
    }

    #[test]
    fn test_stats_table_handles_missing_rating() {
        let stats = vec![AgentStats {
            agent: "omnisearch".to_string(),
            total: 4,
            success_rate: 0.75,
            avg_time_ms: 120.0,
            avg_rating: None,
        }];
        let rendered = TableFormatter::with_colors(false).format_stats(&stats);
        assert!(rendered.contains("75.0%"));
        assert!(rendered.contains("120ms"));
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("abc", 5), "abc");
        assert_eq!(truncate_text("abcdefgh", 6), "abc...");
    }
}
