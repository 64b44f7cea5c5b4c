//! `ada run`: execute one request end to end.

use anyhow::{bail, Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::commands::{context::build_pipeline, parse_context};
use crate::cli::output::{create_spinner, ProgressBarExt};
use crate::domain::models::Config;
use crate::services::{report_renderer, ExecutionReport, PipelineRequest, ReportFormat};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Task request, e.g. "Analyze the codebase in ./src"
    pub request: String,

    /// Extra context (format: "key=value", repeatable)
    #[arg(short, long = "context", value_name = "KEY=VALUE")]
    pub context: Vec<String>,

    /// Plan timeout in seconds (overrides configuration)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Include the per-subtask execution trace
    #[arg(long)]
    pub trace: bool,

    /// Report format (text, markdown, json, html)
    #[arg(short, long, default_value = "text")]
    pub format: ReportFormat,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl RunArgs {
    pub(crate) fn to_request(&self) -> Result<PipelineRequest> {
        let mut request = PipelineRequest::new(&self.request)
            .with_context(parse_context(&self.context)?)
            .with_trace(self.trace);
        if let Some(secs) = self.timeout {
            if secs == 0 {
                bail!("--timeout must be at least 1 second");
            }
            request = request.with_timeout(Duration::from_secs(secs));
        }
        Ok(request)
    }
}

pub async fn execute(args: RunArgs, config: &Config, json_mode: bool) -> Result<()> {
    let request = args.to_request()?;
    let pipeline = build_pipeline(config).await?;

    let spinner = create_spinner(json_mode);
    spinner.set_message(format!("Running: {}", args.request));
    let run = pipeline.execute(request).await;
    pipeline.shutdown().await;

    if run.is_error() {
        spinner.finish_error("Execution failed");
    } else if run.metrics.failed > 0 {
        spinner.finish_warning(format!(
            "Completed with {} failed subtask(s)",
            run.metrics.failed
        ));
    } else {
        spinner.finish_success(format!("Completed in {}ms", run.duration_ms));
    }

    emit(&run, &args, json_mode).await?;

    if run.is_error() {
        bail!("{}", run.report.summary);
    }
    Ok(())
}

pub(crate) async fn emit(run: &ExecutionReport, args: &RunArgs, json_mode: bool) -> Result<()> {
    if let Some(path) = &args.output {
        let saved = report_renderer::save(&run.report, path, args.format)
            .await
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        if json_mode {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({ "saved": saved }))?
            );
        } else {
            println!("Report saved to {}", style(saved.display()).cyan());
        }
        return Ok(());
    }

    if json_mode {
        println!("{}", serde_json::to_string_pretty(run)?);
        return Ok(());
    }

    println!("{}", report_renderer::render(&run.report, args.format)?);
    if let Some(trace) = &run.trace {
        println!("{}", report_renderer::render_trace(trace));
    }
    if let Some(plan) = &run.plan {
        println!(
            "{} ada feedback rate {} <1-5>",
            style("Rate this run:").dim(),
            plan.id
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: impl FnOnce(&mut RunArgs)) -> RunArgs {
        let mut args = RunArgs {
            request: "Find duplicates in ./src".to_string(),
            context: vec!["path=./src".to_string()],
            timeout: None,
            trace: false,
            format: ReportFormat::Text,
            output: None,
        };
        extra(&mut args);
        args
    }

    #[test]
    fn test_request_from_args() {
        let request = args(|a| {
            a.timeout = Some(30);
            a.trace = true;
        })
        .to_request()
        .unwrap();
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
        assert!(request.trace);
        assert_eq!(request.context.str_or("path", ""), "./src");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(args(|a| a.timeout = Some(0)).to_request().is_err());
    }

    #[tokio::test]
    async fn test_run_writes_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        let mut config = Config::default();
        config.feedback.persist = false;

        let run_args = args(|a| {
            a.format = ReportFormat::Markdown;
            a.output = Some(path.clone());
        });
        execute(run_args, &config, true).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# "));
    }
}
