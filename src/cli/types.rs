//! CLI type definitions
//!
//! This module contains the clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::{
    batch::BatchArgs, feedback::FeedbackArgs, plan::PlanArgs, route::RouteArgs, run::RunArgs,
    status::StatusArgs, workflow::WorkflowArgs,
};

#[derive(Parser, Debug)]
#[command(name = "ada")]
#[command(about = "ADA - decompose, schedule and synthesize multi-executor tasks", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .ada/config.yaml plus ADA_* overrides)
    #[arg(long, global = true, env = "ADA_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a task request end to end
    Run(RunArgs),

    /// Show the plan a request would produce without executing it
    Plan(PlanArgs),

    /// Show which executors the router would pick for a piece of content
    Route(RouteArgs),

    /// Inspect and rate recorded executions
    Feedback(FeedbackArgs),

    /// List and run parameterized workflow templates
    Workflow(WorkflowArgs),

    /// Show pipeline status and recent executions
    Status(StatusArgs),

    /// Execute many requests concurrently through the plan queue
    Batch(BatchArgs),
}
