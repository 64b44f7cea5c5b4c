use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::{Config, ExecutorKind};

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_concurrent: {0}. Must be between 1 and 100")]
    InvalidMaxConcurrent(usize),

    #[error("Invalid smoothing_alpha: {0}. Must be in (0, 1]")]
    InvalidSmoothingAlpha(f64),

    #[error("Invalid {0}: must be at least 1 second")]
    ZeroTimeout(&'static str),

    #[error("Invalid cost_per_million_tokens: {0}. Cannot be negative")]
    InvalidTokenCost(f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Fallback executor cannot be empty")]
    EmptyFallbackExecutor,

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .ada/config.yaml (project config)
    /// 3. .ada/local.yaml (project local overrides, optional)
    /// 4. Environment variables (ADA_* prefix, `__` separates nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment()
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring `ADA_*`
    /// overrides.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("ADA_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".ada/config.yaml"))
            .merge(Yaml::file(".ada/local.yaml"))
            .merge(Env::prefixed("ADA_").split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let queue = &config.queue;
        if queue.max_concurrent == 0 || queue.max_concurrent > 100 {
            return Err(ConfigError::InvalidMaxConcurrent(queue.max_concurrent));
        }

        let alpha = config.router.smoothing_alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ConfigError::InvalidSmoothingAlpha(alpha));
        }
        if config.router.fallback_executor.trim().is_empty() {
            return Err(ConfigError::EmptyFallbackExecutor);
        }

        let coordinator = &config.coordinator;
        if coordinator.plan_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("plan_timeout_secs"));
        }
        if coordinator.invocation_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("invocation_timeout_secs"));
        }
        if coordinator.cost_per_million_tokens < 0.0 {
            return Err(ConfigError::InvalidTokenCost(coordinator.cost_per_million_tokens));
        }
        if coordinator.history_limit == 0 {
            return Err(ConfigError::ValidationFailed(
                "history_limit must be at least 1".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        match config.executor.kind {
            ExecutorKind::Simulated => {}
            ExecutorKind::Command => {
                if config.executor.command.program.trim().is_empty() {
                    return Err(ConfigError::ValidationFailed(
                        "executor.command.program cannot be empty".to_string(),
                    ));
                }
            }
            ExecutorKind::Http => {
                if config.executor.http.base_url.trim().is_empty() {
                    return Err(ConfigError::ValidationFailed(
                        "executor.http.base_url cannot be empty".to_string(),
                    ));
                }
                if config.executor.http.timeout_secs == 0 {
                    return Err(ConfigError::ZeroTimeout("executor.http.timeout_secs"));
                }
            }
        }

        for (base, target) in &coordinator.aliases {
            if base.trim().is_empty() || target.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "alias '{base}' -> '{target}' has an empty side"
                )));
            }
        }

        if let Some(routes) = &config.router.routes {
            if let Some(route) = routes.iter().find(|r| r.name.trim().is_empty()) {
                return Err(ConfigError::ValidationFailed(format!(
                    "route with capabilities {:?} has no name",
                    route.capabilities
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::BudgetPolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.queue.max_concurrent, 5);
        assert_eq!(config.coordinator.plan_timeout_secs, 300);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
coordinator:
  plan_timeout_secs: 120
  budget_policy: redistribute
router:
  smoothing_alpha: 0.25
queue:
  max_concurrent: 2
  admission: reject
executor:
  kind: http
  http:
    base_url: http://gateway:9000
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.coordinator.plan_timeout_secs, 120);
        assert_eq!(config.coordinator.budget_policy, BudgetPolicy::Redistribute);
        assert!((config.router.smoothing_alpha - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.queue.max_concurrent, 2);
        assert_eq!(config.executor.kind, ExecutorKind::Http);
        assert_eq!(config.executor.http.timeout_secs, 60);
        assert_eq!(config.logging.format, "json");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_queue_limits() {
        for n in [0, 101] {
            let mut config = Config::default();
            config.queue.max_concurrent = n;
            assert!(matches!(
                ConfigLoader::validate(&config),
                Err(ConfigError::InvalidMaxConcurrent(v)) if v == n
            ));
        }
    }

    #[test]
    fn test_validate_alpha_range() {
        for alpha in [0.0, -0.1, 1.5] {
            let mut config = Config::default();
            config.router.smoothing_alpha = alpha;
            assert!(matches!(
                ConfigLoader::validate(&config),
                Err(ConfigError::InvalidSmoothingAlpha(_))
            ));
        }
        let mut config = Config::default();
        config.router.smoothing_alpha = 1.0;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_timeouts() {
        let mut config = Config::default();
        config.coordinator.invocation_timeout_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::ZeroTimeout("invocation_timeout_secs"))
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(f)) if f == "xml"
        ));
    }

    #[test]
    fn test_validate_empty_fallback() {
        let mut config = Config::default();
        config.router.fallback_executor = "  ".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyFallbackExecutor)
        ));
    }

    #[test]
    fn test_validate_command_needs_program() {
        let mut config = Config::default();
        config.executor.kind = ExecutorKind::Command;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::ValidationFailed(msg)) if msg.contains("program")
        ));
    }

    #[test]
    fn test_load_from_missing_file() {
        assert!(ConfigLoader::load_from_file("/definitely/not/here.yaml").is_err());
    }

    #[test]
    fn test_hierarchical_merging() {
        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "queue:\n  max_concurrent: 3\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "queue:\n  max_concurrent: 8\nlogging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.queue.max_concurrent, 8, "Override should win");
        assert_eq!(config.logging.level, "debug", "Override should win for nested fields");
        assert_eq!(config.logging.format, "json", "Base value should persist when not overridden");
        assert_eq!(config.coordinator.aliases.len(), 7, "Defaults survive the merge");
    }
}
