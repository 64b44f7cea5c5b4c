pub mod classification;
pub mod config;
pub mod feedback;
pub mod output;
pub mod pattern;
pub mod plan;
pub mod report;
pub mod result_shape;
pub mod route;
pub mod subtask;
pub mod trace;
pub mod workflow;

pub use classification::{ClassificationRule, Predicate};
pub use config::{
    AdmissionPolicy, BudgetPolicy, ClassifierConfig, CommandExecutorConfig, Config,
    CoordinatorConfig, ExecutorBackendConfig, ExecutorKind, FeedbackConfig, HttpExecutorConfig,
    LoggingConfig, QueueConfig, RouterConfig,
};
pub use feedback::{AgentStats, FeedbackEntry, RATING_CONTENT_TYPE};
pub use output::{base_name, display_value, ExecutorOutput, Payload, TIMEOUT_ERROR};
pub use pattern::Pattern;
pub use plan::{ScheduleDiagnostic, TaskPlan, WavePlan};
pub use report::{Report, ReportMetadata, ReportSection, SectionPriority};
pub use result_shape::{
    DeadCodeReport, DuplicateGroup, DuplicateReport, OrganizationReport, ProjectSnapshot,
    QualityAssessment, QuizQuestion, QuizResult, RefactorAction, RefactorPlan, ResultShape,
    ScoredItem, SearchHit, SearchResults, HIGH_QUALITY_SCORE,
};
pub use route::{Capability, ContentCategory, Route};
pub use subtask::Subtask;
pub use trace::{TraceEntry, TraceStatus, TraceTotals};
pub use workflow::{WorkflowParameter, WorkflowTemplate};
