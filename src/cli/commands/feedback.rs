//! Feedback CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cli::commands::context::open_feedback;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{AgentStats, Config, FeedbackEntry};
use crate::services::FeedbackStore;

#[derive(Args, Debug)]
pub struct FeedbackArgs {
    #[command(subcommand)]
    pub command: FeedbackCommands,
}

#[derive(Subcommand, Debug)]
pub enum FeedbackCommands {
    /// Per-executor success rate, latency and rating
    Stats {
        /// Only show this executor
        #[arg(short, long)]
        executor: Option<String>,
    },
    /// Improvement hints for slow or unreliable executors
    Suggest,
    /// Rate a finished run (1-5)
    Rate {
        /// Plan ID printed after `ada run`
        task_id: String,
        /// Rating from 1 (poor) to 5 (excellent)
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,
        /// Free-form notes stored with the rating
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Most recent feedback entries
    Recent {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Debug, Serialize)]
pub struct StatsOutput {
    pub stats: Vec<AgentStats>,
}

impl CommandOutput for StatsOutput {
    fn to_human(&self) -> String {
        if self.stats.iter().all(|s| s.total == 0) {
            return "No feedback recorded yet.".to_string();
        }
        TableFormatter::new().format_stats(&self.stats)
    }
}

#[derive(Debug, Serialize)]
pub struct SuggestOutput {
    pub suggestions: Vec<String>,
}

impl CommandOutput for SuggestOutput {
    fn to_human(&self) -> String {
        if self.suggestions.is_empty() {
            return "All executors are performing well.".to_string();
        }
        self.suggestions
            .iter()
            .map(|s| format!("• {s}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct RateOutput {
    pub entry: FeedbackEntry,
}

impl CommandOutput for RateOutput {
    fn to_human(&self) -> String {
        format!(
            "Rated task {} {}/5 ({})",
            self.entry.task_id,
            self.entry.user_rating.unwrap_or_default(),
            self.entry.agents_used.join(", ")
        )
    }
}

#[derive(Debug, Serialize)]
pub struct RecentOutput {
    pub entries: Vec<FeedbackEntry>,
}

impl CommandOutput for RecentOutput {
    fn to_human(&self) -> String {
        if self.entries.is_empty() {
            return "No feedback recorded yet.".to_string();
        }
        TableFormatter::new().format_feedback(&self.entries)
    }
}

pub async fn execute(args: FeedbackArgs, config: &Config, json_mode: bool) -> Result<()> {
    let store = open_feedback(config).await?;
    match args.command {
        FeedbackCommands::Stats { executor } => {
            output(&stats(&store, executor.as_deref()).await, json_mode);
        }
        FeedbackCommands::Suggest => {
            let suggestions = store.suggest_improvements().await;
            output(&SuggestOutput { suggestions }, json_mode);
        }
        FeedbackCommands::Rate {
            task_id,
            rating,
            notes,
        } => {
            let entry = store
                .rate(&task_id, rating, notes)
                .await
                .with_context(|| format!("Failed to rate task {task_id}"))?;
            output(&RateOutput { entry }, json_mode);
        }
        FeedbackCommands::Recent { limit } => {
            let entries = store.recent(limit).await;
            output(&RecentOutput { entries }, json_mode);
        }
    }
    Ok(())
}

async fn stats(store: &FeedbackStore, executor: Option<&str>) -> StatsOutput {
    let stats = match executor {
        Some(name) => vec![store.agent_stats(name).await],
        None => store.all_stats().await,
    };
    StatsOutput { stats }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> FeedbackStore {
        let store = FeedbackStore::in_memory();
        for success in [true, true, false] {
            store
                .record(FeedbackEntry::new(
                    "plan-1",
                    "code_file",
                    vec!["duplicate-detector-ion".to_string()],
                    success,
                    100,
                ))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_stats_for_one_executor() {
        let store = seeded().await;
        let out = stats(&store, Some("duplicate-detector-ion")).await;
        assert_eq!(out.stats.len(), 1);
        assert_eq!(out.stats[0].total, 3);
    }

    #[tokio::test]
    async fn test_stats_for_unknown_executor_reads_as_empty() {
        let store = seeded().await;
        let out = stats(&store, Some("nobody")).await;
        assert_eq!(out.to_human(), "No feedback recorded yet.");
    }

    #[tokio::test]
    async fn test_rate_output_names_agents() {
        let store = seeded().await;
        let entry = store.rate("plan-1", 4, None).await.unwrap();
        let human = RateOutput { entry }.to_human();
        assert!(human.contains("4/5"));
        assert!(human.contains("duplicate-detector-ion"));
    }

    #[test]
    fn test_empty_suggestions() {
        let out = SuggestOutput {
            suggestions: vec![],
        };
        assert_eq!(out.to_human(), "All executors are performing well.");
    }
}
