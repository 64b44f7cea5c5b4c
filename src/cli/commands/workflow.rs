//! Workflow CLI commands.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::commands::context::build_pipeline;
use crate::cli::commands::parse_pairs;
use crate::cli::commands::run::{emit, RunArgs};
use crate::cli::output::{create_spinner, output, CommandOutput, ProgressBarExt, TableFormatter};
use crate::domain::models::{Config, WorkflowTemplate};
use crate::services::{PipelineRequest, ReportFormat, WorkflowLibrary};

#[derive(Args, Debug)]
pub struct WorkflowArgs {
    #[command(subcommand)]
    pub command: WorkflowCommands,
}

#[derive(Subcommand, Debug)]
pub enum WorkflowCommands {
    /// List available workflows
    List,
    /// Show a workflow's template and parameters
    Show {
        /// Workflow name
        name: String,
    },
    /// Render a workflow and execute it
    Run {
        /// Workflow name
        name: String,
        /// Parameters (format: "name=value", repeatable)
        #[arg(short, long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,
        /// Plan timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
        /// Include the per-subtask execution trace
        #[arg(long)]
        trace: bool,
        /// Report format (text, markdown, json, html)
        #[arg(short, long, default_value = "text")]
        format: ReportFormat,
        /// Write the report to this file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
pub struct WorkflowListOutput {
    pub workflows: Vec<WorkflowTemplate>,
}

impl CommandOutput for WorkflowListOutput {
    fn to_human(&self) -> String {
        TableFormatter::new().format_workflows(self.workflows.iter())
    }
}

#[derive(Debug, Serialize)]
pub struct WorkflowShowOutput {
    pub workflow: WorkflowTemplate,
}

impl CommandOutput for WorkflowShowOutput {
    fn to_human(&self) -> String {
        let w = &self.workflow;
        let mut out = String::new();
        let _ = writeln!(out, "{}: {}", w.name, w.description);
        let _ = writeln!(out, "Template: {}", w.template);
        let _ = writeln!(out, "Parameters:");
        for p in &w.parameters {
            let kind = if p.required { "required" } else { "optional" };
            match &p.default {
                Some(default) => {
                    let _ = writeln!(out, "  {} ({kind}, default: {default})", p.name);
                }
                None => {
                    let _ = writeln!(out, "  {} ({kind})", p.name);
                }
            }
        }
        out
    }
}

pub async fn execute(args: WorkflowArgs, config: &Config, json_mode: bool) -> Result<()> {
    let library = WorkflowLibrary::with_defaults();
    match args.command {
        WorkflowCommands::List => {
            let workflows = library.list().cloned().collect();
            output(&WorkflowListOutput { workflows }, json_mode);
        }
        WorkflowCommands::Show { name } => {
            let workflow = library.get(&name)?.clone();
            output(&WorkflowShowOutput { workflow }, json_mode);
        }
        WorkflowCommands::Run {
            name,
            params,
            timeout,
            trace,
            format,
            output: out_path,
        } => {
            let (text, context) = library.render(&name, &parse_pairs(&params)?)?;
            let mut request = PipelineRequest::new(&text)
                .with_context(context)
                .with_trace(trace);
            if let Some(secs) = timeout {
                if secs == 0 {
                    bail!("--timeout must be at least 1 second");
                }
                request = request.with_timeout(Duration::from_secs(secs));
            }

            let pipeline = build_pipeline(config).await?;
            let spinner = create_spinner(json_mode);
            spinner.set_message(format!("Running workflow {name}: {text}"));
            let run = pipeline.execute(request).await;
            pipeline.shutdown().await;
            if run.is_error() {
                spinner.finish_error(format!("Workflow {name} failed"));
            } else {
                spinner.finish_success(format!("Workflow {name} completed in {}ms", run.duration_ms));
            }

            let display = RunArgs {
                request: text,
                context: Vec::new(),
                timeout,
                trace,
                format,
                output: out_path,
            };
            emit(&run, &display, json_mode).await?;
            if run.is_error() {
                bail!("{}", run.report.summary);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_lists_defaults() {
        let library = WorkflowLibrary::with_defaults();
        let workflow = library.get("research-topic").unwrap().clone();
        let human = WorkflowShowOutput { workflow }.to_human();
        assert!(human.contains("topic (required)"));
        assert!(human.contains("default: comprehensive"));
    }

    #[tokio::test]
    async fn test_run_unknown_workflow_fails() {
        let args = WorkflowArgs {
            command: WorkflowCommands::Run {
                name: "nope".to_string(),
                params: vec![],
                timeout: None,
                trace: false,
                format: ReportFormat::Text,
                output: None,
            },
        };
        let err = execute(args, &Config::default(), true).await.unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn test_run_missing_parameter_fails() {
        let args = WorkflowArgs {
            command: WorkflowCommands::Run {
                name: "create-quiz".to_string(),
                params: vec!["grade_level=7".to_string()],
                timeout: None,
                trace: false,
                format: ReportFormat::Text,
                output: None,
            },
        };
        let err = execute(args, &Config::default(), true).await.unwrap_err();
        assert!(err.to_string().contains("topic"));
    }
}
