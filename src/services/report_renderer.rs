//! Report rendering: plain text, Markdown, JSON and HTML.
//!
//! Every renderer is a pure function of the report. [`save`] is the only
//! operation with a side effect.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Report, SectionPriority, TraceEntry, TraceStatus, TraceTotals};

const RULE_WIDTH: usize = 80;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output format for a rendered report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Markdown,
    Json,
    Html,
}

impl ReportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Markdown => "md",
            Self::Json => "json",
            Self::Html => "html",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "html" => Ok(Self::Html),
            other => Err(format!(
                "unknown report format '{other}' (expected text, markdown, json or html)"
            )),
        }
    }
}

/// Render `report` in `format`.
pub fn render(report: &Report, format: ReportFormat) -> DomainResult<String> {
    Ok(match format {
        ReportFormat::Text => render_text(report),
        ReportFormat::Markdown => render_markdown(report),
        ReportFormat::Json => serde_json::to_string_pretty(report)?,
        ReportFormat::Html => render_html(report),
    })
}

/// Write `report` to `path`, adding the format's extension when missing.
/// Parent directories are created. Returns the path written.
pub async fn save(report: &Report, path: &Path, format: ReportFormat) -> DomainResult<PathBuf> {
    let ext = format.extension();
    let path = if path.extension().and_then(|e| e.to_str()) == Some(ext) {
        path.to_path_buf()
    } else {
        let mut with_ext = path.as_os_str().to_owned();
        with_ext.push(".");
        with_ext.push(ext);
        PathBuf::from(with_ext)
    };

    let content = render(report, format)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, content).await?;
    info!(path = %path.display(), format = ext, "report saved");
    Ok(path)
}

pub fn render_text(report: &Report) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out);
    let _ = writeln!(out, "{heavy}");
    let _ = writeln!(out, "  {}", report.title.to_uppercase());
    let _ = writeln!(out, "{heavy}");
    let _ = writeln!(out, "  Generated: {}", report.generated_at.format(TIMESTAMP_FORMAT));
    let _ = writeln!(out);

    let _ = writeln!(out, "[SUMMARY]");
    let _ = writeln!(out, "{light}");
    let _ = writeln!(out, "  {}", report.summary);
    let _ = writeln!(out);

    if !report.recommendations.is_empty() {
        let _ = writeln!(out, "[RECOMMENDATIONS]");
        let _ = writeln!(out, "{light}");
        for rec in &report.recommendations {
            let _ = writeln!(out, "  -> {rec}");
        }
        let _ = writeln!(out);
    }

    for section in &report.sections {
        let _ = writeln!(
            out,
            "[{}] {} [{}]",
            section.icon,
            section.title,
            section.priority.as_str().to_uppercase()
        );
        let _ = writeln!(out, "{light}");
        for line in section.content.lines() {
            let _ = writeln!(out, "  {line}");
        }
        let _ = writeln!(out);
    }

    let meta = &report.metadata;
    let _ = writeln!(out, "{heavy}");
    let _ = writeln!(out, "  EXECUTION METADATA");
    let _ = writeln!(out, "{heavy}");
    let _ = writeln!(out, "  Executors run: {}", meta.total_executors);
    let _ = writeln!(out, "  Successful: {}", meta.successful);
    let _ = writeln!(out, "  Failed: {}", meta.failed);
    let _ = writeln!(out, "  Total time: {}ms", meta.total_execution_ms);
    let _ = writeln!(out, "  Average time: {}ms", meta.avg_execution_ms);
    out
}

pub fn render_markdown(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", report.title);
    let _ = writeln!(out, "*Generated: {}*\n", report.generated_at.format(TIMESTAMP_FORMAT));
    let _ = writeln!(out, "## Summary\n\n{}\n", report.summary);

    if !report.recommendations.is_empty() {
        let _ = writeln!(out, "## Recommendations\n");
        for rec in &report.recommendations {
            let _ = writeln!(out, "- {rec}");
        }
        let _ = writeln!(out);
    }

    for section in &report.sections {
        let _ = writeln!(out, "## {}\n", section.title);
        let _ = writeln!(out, "**Priority:** {}\n", section.priority);
        let _ = writeln!(out, "```\n{}\n```\n", section.content);
    }

    let meta = &report.metadata;
    let _ = writeln!(out, "## Execution Metadata\n");
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "|--------|-------|");
    if let Some(pattern) = meta.pattern {
        let _ = writeln!(out, "| Pattern | {pattern} |");
    }
    let _ = writeln!(out, "| Executors run | {} |", meta.total_executors);
    let _ = writeln!(out, "| Successful | {} |", meta.successful);
    let _ = writeln!(out, "| Failed | {} |", meta.failed);
    let _ = writeln!(out, "| Total time | {}ms |", meta.total_execution_ms);
    let _ = writeln!(out, "| Average time | {}ms |", meta.avg_execution_ms);
    out
}

const fn priority_color(priority: SectionPriority) -> &'static str {
    match priority {
        SectionPriority::High => "#dc3545",
        SectionPriority::Medium => "#ffc107",
        SectionPriority::Low => "#28a745",
    }
}

const HTML_STYLE: &str = "\
body { font-family: 'Segoe UI', Arial, sans-serif; margin: 40px; background: #1a1a2e; color: #eee; }
h1 { color: #00d4ff; border-bottom: 2px solid #00d4ff; padding-bottom: 10px; }
h2 { color: #ff6b6b; margin-top: 30px; }
.summary { background: #16213e; padding: 20px; border-radius: 8px; margin: 20px 0; }
.section { background: #0f3460; padding: 15px; border-radius: 8px; margin: 15px 0; }
.priority { display: inline-block; padding: 3px 10px; border-radius: 4px; font-size: 12px; font-weight: bold; }
.metadata { background: #1a1a2e; border: 1px solid #333; padding: 15px; border-radius: 8px; }
.recommendations { background: #2d132c; padding: 15px; border-radius: 8px; margin: 20px 0; }
pre { background: #0a0a15; padding: 15px; border-radius: 4px; overflow-x: auto; }";

pub fn render_html(report: &Report) -> String {
    let mut out = String::new();
    let title = escape_html(&report.title);

    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(out, "<html><head>");
    let _ = writeln!(out, "<meta charset=\"utf-8\">");
    let _ = writeln!(out, "<title>{title}</title>");
    let _ = writeln!(out, "<style>\n{HTML_STYLE}\n</style>");
    let _ = writeln!(out, "</head><body>");
    let _ = writeln!(out, "<h1>{title}</h1>");
    let _ = writeln!(
        out,
        "<p><em>Generated: {}</em></p>",
        report.generated_at.format(TIMESTAMP_FORMAT)
    );
    let _ = writeln!(
        out,
        "<div class='summary'><strong>Summary:</strong> {}</div>",
        escape_html(&report.summary)
    );

    if !report.recommendations.is_empty() {
        let _ = writeln!(out, "<div class='recommendations'>\n<h2>Recommendations</h2>\n<ul>");
        for rec in &report.recommendations {
            let _ = writeln!(out, "<li>{}</li>", escape_html(rec));
        }
        let _ = writeln!(out, "</ul>\n</div>");
    }

    for section in &report.sections {
        let _ = writeln!(out, "<div class='section'>");
        let _ = writeln!(
            out,
            "<h2>{} <span class='priority' style='background:{};color:#fff;'>{}</span></h2>",
            escape_html(&section.title),
            priority_color(section.priority),
            section.priority.as_str().to_uppercase()
        );
        let _ = writeln!(out, "<pre>{}</pre>", escape_html(&section.content));
        let _ = writeln!(out, "</div>");
    }

    let meta = &report.metadata;
    let _ = writeln!(out, "<div class='metadata'>\n<h2>Execution Metadata</h2>\n<table>");
    let _ = writeln!(out, "<tr><td>Executors run:</td><td>{}</td></tr>", meta.total_executors);
    let _ = writeln!(out, "<tr><td>Successful:</td><td>{}</td></tr>", meta.successful);
    let _ = writeln!(out, "<tr><td>Failed:</td><td>{}</td></tr>", meta.failed);
    let _ = writeln!(out, "<tr><td>Total time:</td><td>{}ms</td></tr>", meta.total_execution_ms);
    let _ = writeln!(out, "</table>\n</div>");
    let _ = writeln!(out, "</body></html>");
    out
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Render an execution trace grouped by wave, with per-subtask timing,
/// token usage and cost, and a totals line.
pub fn render_trace(entries: &[TraceEntry]) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let mut out = String::new();
    let _ = writeln!(out, "{heavy}\n  EXECUTION TRACE\n{heavy}\n");

    let mut waves: Vec<usize> = entries.iter().map(|e| e.wave).collect();
    waves.sort_unstable();
    waves.dedup();

    for wave in waves {
        let in_wave: Vec<&TraceEntry> = entries.iter().filter(|e| e.wave == wave).collect();
        let kind = if in_wave.len() > 1 { "Parallel" } else { "Sequential" };
        let _ = writeln!(out, "Wave {wave} ({kind}):");

        for entry in in_wave {
            let icon = match entry.status {
                TraceStatus::Succeeded => "OK",
                TraceStatus::Failed => "XX",
                TraceStatus::Started => "->",
            };
            let time = entry
                .duration_ms
                .map_or_else(|| "    --ms".to_string(), |ms| format!("{ms:>6}ms"));
            let (tokens, cost) = match entry.tokens {
                Some(t) => (
                    format!("{t:>6} tokens"),
                    entry
                        .cost
                        .map_or_else(|| "$-.----".to_string(), |c| format!("${c:.4}")),
                ),
                None => ("   --- tokens".to_string(), "$-.----".to_string()),
            };
            let _ = writeln!(
                out,
                "  [{icon}] {:<30} {time}  {tokens}  {cost}",
                entry.executor
            );
            if entry.status == TraceStatus::Failed {
                if let Some(error) = &entry.error {
                    let _ = writeln!(out, "      Error: {error}");
                }
            }
        }
        let _ = writeln!(out);
    }

    let totals = TraceTotals::from_entries(entries);
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    let _ = writeln!(
        out,
        "Total: {:.1}s | {} tokens | ${:.4} | {}/{} successful",
        totals.duration_ms as f64 / 1000.0,
        totals.tokens,
        totals.cost,
        totals.succeeded,
        totals.total
    );
    let _ = writeln!(out, "{heavy}");
    out
}
