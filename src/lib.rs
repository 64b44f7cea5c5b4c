//! ADA - Task decomposition pipeline
//!
//! ADA turns a free-text request into a plan of executor subtasks, runs the
//! plan wave by wave with bounded concurrency, learns which executors work
//! from every outcome, and fuses the results into one report.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, errors and the executor port
//! - **Service Layer** (`services`): Classification, decomposition, scheduling,
//!   coordination, routing, feedback and synthesis
//! - **Adapters Layer** (`adapters`): Executor backends (simulated, subprocess, HTTP)
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ada::adapters::executors::SimulatedExecutor;
//! use ada::services::{AdaptiveRouter, FeedbackStore, Pipeline, PipelineRequest};
//! use ada::Config;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pipeline = Pipeline::new(
//!         Config::default(),
//!         Arc::new(SimulatedExecutor::new()),
//!         Arc::new(FeedbackStore::in_memory()),
//!         Arc::new(AdaptiveRouter::with_defaults()),
//!     );
//!     let run = pipeline.execute(PipelineRequest::new("Analyze the codebase")).await;
//!     println!("{}", run.report.title);
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Config, ExecutorOutput, Pattern, Payload, Report, Subtask, TaskPlan, TraceEntry,
};
pub use domain::ports::{Executor, Invocation, InvocationOutcome};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    AdaptiveRouter, ExecutionCoordinator, FeedbackStore, Pipeline, PipelineRequest,
    Synthesizer, TaskDecomposer, WaveScheduler,
};
