use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::classification::ClassificationRule;
use super::route::Route;

/// Main configuration structure for ADA
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Wave execution settings
    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    /// Adaptive routing settings
    #[serde(default)]
    pub router: RouterConfig,

    /// Pattern classification overrides
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Feedback log settings
    #[serde(default)]
    pub feedback: FeedbackConfig,

    /// Plan queue settings
    #[serde(default)]
    pub queue: QueueConfig,

    /// Which executor backend to invoke
    #[serde(default)]
    pub executor: ExecutorBackendConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How a plan's time budget is split across its waves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPolicy {
    /// Every wave gets `plan_timeout / initial_wave_count`.
    #[default]
    Even,
    /// Each wave gets the remaining plan time divided by the remaining waves.
    Redistribute,
}

/// Execution coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CoordinatorConfig {
    /// Total budget for one plan, in seconds
    #[serde(default = "default_plan_timeout_secs")]
    pub plan_timeout_secs: u64,

    /// Timeout handed to each executor invocation, in seconds
    #[serde(default = "default_invocation_timeout_secs")]
    pub invocation_timeout_secs: u64,

    #[serde(default)]
    pub budget_policy: BudgetPolicy,

    /// Dollar cost per million reported tokens
    #[serde(default = "default_cost_per_million_tokens")]
    pub cost_per_million_tokens: f64,

    /// Base executor name to concrete executor name
    #[serde(default = "default_aliases")]
    pub aliases: BTreeMap<String, String>,

    /// Maximum number of runs kept in execution history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

const fn default_plan_timeout_secs() -> u64 {
    300
}

const fn default_invocation_timeout_secs() -> u64 {
    30
}

const fn default_cost_per_million_tokens() -> f64 {
    9.0
}

const fn default_history_limit() -> usize {
    100
}

/// Default base-name aliases for the concrete `-ion` executors.
pub fn default_aliases() -> BTreeMap<String, String> {
    [
        "duplicate-detector",
        "dead-code-eliminator",
        "code-grouper",
        "refactor-planner",
        "content-fetcher",
        "context-builder",
        "quiz-generator",
    ]
    .iter()
    .map(|base| ((*base).to_string(), format!("{base}-ion")))
    .collect()
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            plan_timeout_secs: default_plan_timeout_secs(),
            invocation_timeout_secs: default_invocation_timeout_secs(),
            budget_policy: BudgetPolicy::default(),
            cost_per_million_tokens: default_cost_per_million_tokens(),
            aliases: default_aliases(),
            history_limit: default_history_limit(),
        }
    }
}

/// Adaptive router configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RouterConfig {
    /// Exponential smoothing constant, in (0, 1]
    #[serde(default = "default_smoothing_alpha")]
    pub smoothing_alpha: f64,

    /// Executor returned when no route matches
    #[serde(default = "default_fallback_executor")]
    pub fallback_executor: String,

    /// Replaces the built-in route table when set
    #[serde(default)]
    pub routes: Option<Vec<Route>>,
}

const fn default_smoothing_alpha() -> f64 {
    0.1
}

fn default_fallback_executor() -> String {
    "general-learning-agent".to_string()
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: default_smoothing_alpha(),
            fallback_executor: default_fallback_executor(),
            routes: None,
        }
    }
}

/// Pattern classifier configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClassifierConfig {
    /// Replaces the built-in precedence chain when set
    #[serde(default)]
    pub rules: Option<Vec<ClassificationRule>>,
}

/// Feedback store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FeedbackConfig {
    /// JSONL log path
    #[serde(default = "default_feedback_path")]
    pub path: PathBuf,

    /// Keep feedback in memory only when false
    #[serde(default = "default_true")]
    pub persist: bool,
}

fn default_feedback_path() -> PathBuf {
    PathBuf::from(".ada/feedback.jsonl")
}

const fn default_true() -> bool {
    true
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            path: default_feedback_path(),
            persist: true,
        }
    }
}

/// What happens when the plan queue is at its ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionPolicy {
    /// Wait for a slot.
    #[default]
    Block,
    /// Fail immediately.
    Reject,
}

/// Plan queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QueueConfig {
    /// Plans in flight at once (1-100)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Submissions allowed to wait for a slot
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,

    #[serde(default)]
    pub admission: AdmissionPolicy,
}

const fn default_max_concurrent() -> usize {
    5
}

const fn default_queue_capacity() -> usize {
    100
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            capacity: default_queue_capacity(),
            admission: AdmissionPolicy::default(),
        }
    }
}

/// Executor backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    /// In-process stand-in that fabricates plausible results
    #[default]
    Simulated,
    /// One subprocess per invocation
    Command,
    /// HTTP gateway
    Http,
}

/// Executor backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExecutorBackendConfig {
    #[serde(default)]
    pub kind: ExecutorKind,

    #[serde(default)]
    pub command: CommandExecutorConfig,

    #[serde(default)]
    pub http: HttpExecutorConfig,
}

/// Subprocess executor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CommandExecutorConfig {
    /// Program to run; the executor name is appended to `args`
    #[serde(default)]
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,
}

/// HTTP executor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HttpExecutorConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Transport timeout, in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,

    /// Sent as a bearer token when present
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

const fn default_http_timeout_secs() -> u64 {
    60
}

impl Default for HttpExecutorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_http_timeout_secs(),
            api_key: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rotated log files; console only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotation for file output (daily, hourly, never)
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
