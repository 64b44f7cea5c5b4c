//! Wiring shared by the commands that need a live pipeline.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::adapters::executors::ExecutorRegistry;
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::services::{AdaptiveRouter, FeedbackStore, Pipeline};

/// Load configuration from `path`, or from the default locations.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Open the configured feedback store.
pub async fn open_feedback(config: &Config) -> Result<FeedbackStore> {
    if config.feedback.persist {
        FeedbackStore::open(&config.feedback.path)
            .await
            .with_context(|| format!("Failed to open feedback log {}", config.feedback.path.display()))
    } else {
        Ok(FeedbackStore::in_memory())
    }
}

/// Build the router from configuration and replay recorded outcomes into it.
pub async fn build_router(config: &Config, feedback: &FeedbackStore) -> AdaptiveRouter {
    let router = AdaptiveRouter::from_config(&config.router);
    router.seed_from_feedback(&feedback.entries().await);
    router
}

/// Assemble a pipeline with the configured executor backend.
pub async fn build_pipeline(config: &Config) -> Result<Arc<Pipeline>> {
    let feedback = open_feedback(config).await?;
    let router = build_router(config, &feedback).await;
    let executor = ExecutorRegistry::new(config.executor.clone())
        .create()
        .context("Failed to create executor backend")?;
    info!(backend = executor.name(), "pipeline wiring complete");

    Ok(Arc::new(Pipeline::new(
        config.clone(),
        executor,
        Arc::new(feedback),
        Arc::new(router),
    )))
}
