pub mod adaptive_router;
pub mod coordinator;
pub mod feedback_store;
pub mod pattern_classifier;
pub mod pipeline;
pub mod plan_queue;
pub mod report_renderer;
pub mod synthesizer;
pub mod task_decomposer;
pub mod wave_scheduler;
pub mod workflow_library;

pub use adaptive_router::{AdaptiveRouter, RouteDecision, ScoredRoute};
pub use coordinator::{ExecutionCoordinator, ExecutionEvent, ExecutionRun, RunMetrics, RunOptions};
pub use feedback_store::FeedbackStore;
pub use pattern_classifier::{Classification, PatternClassifier};
pub use pipeline::{ExecutionReport, HistoryEntry, Pipeline, PipelineRequest, PipelineStatus, PlanSummary};
pub use plan_queue::{PlanQueue, QueueStatus};
pub use report_renderer::ReportFormat;
pub use synthesizer::Synthesizer;
pub use task_decomposer::TaskDecomposer;
pub use wave_scheduler::WaveScheduler;
pub use workflow_library::WorkflowLibrary;
