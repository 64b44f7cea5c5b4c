//! `ada batch`: run many requests through one pipeline.
//!
//! Requests are read one per line. All of them are submitted at once and the
//! plan queue bounds how many execute concurrently.

use anyhow::{Context, Result};
use clap::Args;
use futures::future::join_all;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use uuid::Uuid;

use crate::cli::commands::context::build_pipeline;
use crate::cli::output::{create_spinner, output, truncate, CommandOutput, ProgressBarExt};
use crate::domain::models::Config;
use crate::services::{report_renderer, ExecutionReport, Pipeline, PipelineRequest, ReportFormat};

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// File with one request per line ("-" reads stdin)
    pub file: PathBuf,

    /// Save each report into this directory
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Format for saved reports (text, markdown, json, html)
    #[arg(short, long, default_value = "markdown")]
    pub format: ReportFormat,
}

#[derive(Debug, Serialize)]
pub struct BatchItem {
    pub request: String,
    pub success: bool,
    pub plan_id: Option<Uuid>,
    pub title: String,
    pub summary: String,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<PathBuf>,
}

impl BatchItem {
    fn of(run: &ExecutionReport, saved: Option<PathBuf>) -> Self {
        Self {
            request: run.request.clone(),
            success: !run.is_error() && run.metrics.failed == 0,
            plan_id: run.plan.as_ref().map(|p| p.id),
            title: run.report.title.clone(),
            summary: run.report.summary.clone(),
            duration_ms: run.duration_ms,
            saved,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchOutput {
    pub total: usize,
    pub succeeded: usize,
    pub items: Vec<BatchItem>,
}

impl CommandOutput for BatchOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "{} of {} requests succeeded",
            self.succeeded, self.total
        )];
        for item in &self.items {
            let mark = if item.success { "✓" } else { "✗" };
            let mut line = format!("{mark} {} -> {}", truncate(&item.request, 50), item.title);
            if let Some(path) = &item.saved {
                line.push_str(&format!(" ({})", path.display()));
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}

/// Non-empty lines that are not `#` comments.
pub fn parse_requests(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

async fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut contents = String::new();
        tokio::io::stdin()
            .read_to_string(&mut contents)
            .await
            .context("Failed to read requests from stdin")?;
        Ok(contents)
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }
}

/// Execute every request concurrently, preserving input order in the results.
pub async fn run_all(pipeline: Arc<Pipeline>, requests: Vec<String>) -> Vec<ExecutionReport> {
    let runs = requests.into_iter().map(|text| {
        let pipeline = pipeline.clone();
        async move { pipeline.execute(PipelineRequest::new(text)).await }
    });
    join_all(runs).await
}

pub async fn execute(args: BatchArgs, config: &Config, json_mode: bool) -> Result<()> {
    let requests = parse_requests(&read_input(&args.file).await?);
    if requests.is_empty() {
        anyhow::bail!("No requests found in {}", args.file.display());
    }

    let pipeline = build_pipeline(config).await?;
    let spinner = create_spinner(json_mode);
    spinner.set_message(format!(
        "Running {} requests ({} at a time)",
        requests.len(),
        config.queue.max_concurrent
    ));
    let runs = run_all(pipeline.clone(), requests).await;
    pipeline.shutdown().await;

    let mut items = Vec::with_capacity(runs.len());
    for (i, run) in runs.iter().enumerate() {
        let saved = match &args.output_dir {
            Some(dir) => {
                let stem = run
                    .plan
                    .as_ref()
                    .map_or_else(|| format!("request-{:03}", i + 1), |p| format!("{:03}-{}", i + 1, p.id));
                Some(report_renderer::save(&run.report, &dir.join(stem), args.format).await?)
            }
            None => None,
        };
        items.push(BatchItem::of(run, saved));
    }

    let succeeded = items.iter().filter(|i| i.success).count();
    let result = BatchOutput {
        total: items.len(),
        succeeded,
        items,
    };
    if succeeded == result.total {
        spinner.finish_success(format!("{succeeded} requests completed"));
    } else {
        spinner.finish_warning(format!("{} of {} requests failed", result.total - succeeded, result.total));
    }
    output(&result, json_mode);
    Ok(())
}
