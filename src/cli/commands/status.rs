//! `ada status`: pipeline wiring plus recently recorded executions.
//!
//! Run history lives in memory per process, so the durable view of past runs
//! comes from the feedback log.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::fmt::Write as _;

use crate::cli::commands::context::build_pipeline;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, ExecutorKind, FeedbackEntry};
use crate::services::PipelineStatus;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Number of recent feedback entries to show
    #[arg(short = 'n', long, default_value = "10")]
    pub recent: usize,
}

#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub backend: ExecutorKind,
    pub feedback_log: Option<String>,
    pub status: PipelineStatus,
    pub recent: Vec<FeedbackEntry>,
}

impl CommandOutput for StatusOutput {
    fn to_human(&self) -> String {
        let s = &self.status;
        let mut out = String::new();
        let _ = writeln!(out, "Status:     {}", if s.online { "online" } else { "offline" });
        let _ = writeln!(out, "Backend:    {:?}", self.backend);
        let _ = writeln!(
            out,
            "Feedback:   {}",
            self.feedback_log.as_deref().unwrap_or("in memory")
        );
        let _ = writeln!(out, "Patterns:   {}", s.patterns.len());
        let _ = writeln!(out, "Executors:  {}", s.executors.join(", "));
        let _ = writeln!(
            out,
            "Queue:      {} active, {} queued, max {} concurrent",
            s.queue.active, s.queue.queued, s.queue.max_concurrent
        );
        let _ = writeln!(out);
        if self.recent.is_empty() {
            out.push_str("No executions recorded yet.");
        } else {
            let _ = writeln!(out, "Recent executions:");
            out.push_str(&TableFormatter::new().format_feedback(&self.recent));
        }
        out
    }
}

pub async fn execute(args: StatusArgs, config: &Config, json_mode: bool) -> Result<()> {
    let pipeline = build_pipeline(config).await?;
    let result = StatusOutput {
        backend: config.executor.kind,
        feedback_log: pipeline
            .feedback()
            .path()
            .map(|p| p.display().to_string()),
        status: pipeline.status().await,
        recent: pipeline.feedback().recent(args.recent).await,
    };
    output(&result, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_of_fresh_pipeline() {
        let mut config = Config::default();
        config.feedback.persist = false;
        let pipeline = build_pipeline(&config).await.unwrap();
        let result = StatusOutput {
            backend: config.executor.kind,
            feedback_log: None,
            status: pipeline.status().await,
            recent: vec![],
        };
        let human = result.to_human();
        assert!(human.contains("online"));
        assert!(human.contains("Patterns:   14"));
        assert!(human.contains("No executions recorded yet."));
        assert_eq!(result.to_json()["status"]["executions_total"], 0);
    }
}
