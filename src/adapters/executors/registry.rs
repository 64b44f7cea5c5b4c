//! Executor backend factory.

use std::sync::Arc;
use tracing::info;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ExecutorBackendConfig, ExecutorKind};
use crate::domain::ports::Executor;

use super::command::CommandExecutor;
use super::http::HttpExecutor;
use super::mock::SimulatedExecutor;

/// Builds executor backends from configuration.
#[derive(Debug, Clone, Default)]
pub struct ExecutorRegistry {
    config: ExecutorBackendConfig,
}

impl ExecutorRegistry {
    pub const fn new(config: ExecutorBackendConfig) -> Self {
        Self { config }
    }

    /// Create a backend by kind.
    pub fn create_by_kind(&self, kind: ExecutorKind) -> DomainResult<Arc<dyn Executor>> {
        let executor: Arc<dyn Executor> = match kind {
            ExecutorKind::Simulated => Arc::new(SimulatedExecutor::new()),
            ExecutorKind::Command => Arc::new(CommandExecutor::new(&self.config.command)?),
            ExecutorKind::Http => Arc::new(HttpExecutor::new(&self.config.http)?),
        };
        info!(backend = executor.name(), "executor backend ready");
        Ok(executor)
    }

    /// Create the configured backend.
    pub fn create(&self) -> DomainResult<Arc<dyn Executor>> {
        self.create_by_kind(self.config.kind)
    }

    /// Create a backend by its configuration name.
    pub fn create_named(&self, name: &str) -> DomainResult<Arc<dyn Executor>> {
        let kind = match name {
            "simulated" => ExecutorKind::Simulated,
            "command" => ExecutorKind::Command,
            "http" => ExecutorKind::Http,
            other => return Err(DomainError::ExecutorNotFound(other.to_string())),
        };
        self.create_by_kind(kind)
    }

    pub const fn available_kinds() -> [&'static str; 3] {
        ["simulated", "command", "http"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::CommandExecutorConfig;

    #[test]
    fn test_default_is_simulated() {
        let exec = ExecutorRegistry::default().create().unwrap();
        assert_eq!(exec.name(), "simulated");
    }

    #[test]
    fn test_command_without_program_fails() {
        let registry = ExecutorRegistry::default();
        assert!(registry.create_by_kind(ExecutorKind::Command).is_err());
    }

    #[test]
    fn test_command_and_http() {
        let registry = ExecutorRegistry::new(ExecutorBackendConfig {
            kind: ExecutorKind::Command,
            command: CommandExecutorConfig {
                program: "ada-exec".to_string(),
                args: vec![],
            },
            ..ExecutorBackendConfig::default()
        });
        assert_eq!(registry.create().unwrap().name(), "command");
        assert_eq!(registry.create_named("http").unwrap().name(), "http");
    }

    #[test]
    fn test_unknown_name() {
        assert!(matches!(
            ExecutorRegistry::default().create_named("grpc"),
            Err(DomainError::ExecutorNotFound(name)) if name == "grpc"
        ));
    }
}
