//! Common test utilities for integration tests
//!
//! Provides shared fixtures and builders used across multiple integration
//! test files.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use ada::adapters::executors::{MockExecutor, SimulatedExecutor};
use ada::domain::models::{Config, CoordinatorConfig, Subtask};
use ada::domain::ports::Executor;
use ada::services::{AdaptiveRouter, ExecutionCoordinator, FeedbackStore, Pipeline};

/// Setup test logging
///
/// Initializes a tracing subscriber that writes through the test harness.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Default configuration with feedback kept in memory.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.feedback.persist = false;
    config
}

/// Pipeline over `executor` with fresh in-memory collaborators.
pub fn pipeline_with(executor: Arc<dyn Executor>, config: Config) -> Pipeline {
    Pipeline::new(
        config,
        executor,
        Arc::new(FeedbackStore::in_memory()),
        Arc::new(AdaptiveRouter::with_defaults()),
    )
}

/// Pipeline over the simulated backend.
pub fn simulated_pipeline() -> Pipeline {
    pipeline_with(Arc::new(SimulatedExecutor::new()), test_config())
}

/// Coordinator over `executor`, returning the shared router and feedback
/// handles for inspection.
pub fn coordinator_with(
    executor: MockExecutor,
    config: CoordinatorConfig,
) -> (ExecutionCoordinator, Arc<AdaptiveRouter>, Arc<FeedbackStore>) {
    let router = Arc::new(AdaptiveRouter::with_defaults());
    let feedback = Arc::new(FeedbackStore::in_memory());
    let coordinator =
        ExecutionCoordinator::new(Arc::new(executor), router.clone(), feedback.clone(), config);
    (coordinator, router, feedback)
}

/// Bound subtask with dependencies.
pub fn subtask(id: &str, executor: &str, deps: &[&str]) -> Subtask {
    let mut s = Subtask::new(id, Some(executor), format!("run {executor}"));
    s.depends_on = deps.iter().map(|d| (*d).to_string()).collect();
    s
}

pub fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}
