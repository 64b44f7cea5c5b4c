//! Result synthesis: fuse the outputs of one plan into a single [`Report`].
//!
//! Each pattern has a fusion function that locates the outputs it knows by
//! executor base name, computes headline numbers through the lenient
//! [`ResultShape`](crate::domain::models::ResultShape) views, and derives
//! prioritized sections and recommendations. Unknown patterns fall back to
//! [`generic::fuse`], which surfaces every output verbatim.
//!
//! Synthesis is a pure function of its inputs: the report timestamp is taken
//! from the newest output, never from the clock.
//!
//! ## Modules
//!
//! | Module | Patterns |
//! |--------|----------|
//! | [`codebase`] | analyze_codebase, find_duplicates, find_dead_code, organize_code, code_cleanup, refactor_code |
//! | [`content`] | research_topic, assess_quality, extract_content, generate_docs, create_learning, generate_quiz |
//! | [`project`] | project_status |
//! | [`generic`] | custom and the fallback, error reports |

pub mod codebase;
pub mod content;
pub mod generic;
pub mod project;

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::debug;

use crate::domain::models::{
    ExecutorOutput, Pattern, Report, ReportMetadata, ReportSection, SectionPriority,
};

/// Report body produced by a fusion function, before metadata is attached.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub title: String,
    pub summary: String,
    pub sections: Vec<ReportSection>,
    pub recommendations: Vec<String>,
}

impl Draft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn section(
        &mut self,
        title: impl Into<String>,
        icon: &str,
        content: impl Into<String>,
        priority: SectionPriority,
    ) {
        self.sections
            .push(ReportSection::new(title, icon, content, priority));
    }

    pub fn recommend(&mut self, text: impl Into<String>) {
        self.recommendations.push(text.into());
    }

    /// Add a high-priority section for every failed output.
    pub fn surface_failures(&mut self, outputs: &[ExecutorOutput]) {
        for output in outputs.iter().filter(|o| !o.success) {
            self.section(
                format!("Failed: {}", output.executor),
                "XX",
                format!("Error: {}", output.error.as_deref().unwrap_or("Unknown error")),
                SectionPriority::High,
            );
        }
    }
}

/// Stateless report synthesizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Synthesizer;

impl Synthesizer {
    pub const fn new() -> Self {
        Self
    }

    /// Fuse `outputs` into a report for `pattern`.
    pub fn synthesize(&self, pattern: Pattern, outputs: &[ExecutorOutput]) -> Report {
        let draft = match pattern {
            Pattern::AnalyzeCodebase => codebase::analyze(outputs),
            Pattern::FindDuplicates => codebase::duplicates(outputs),
            Pattern::FindDeadCode => codebase::dead_code(outputs),
            Pattern::OrganizeCode => codebase::organization(outputs),
            Pattern::CodeCleanup => codebase::cleanup(outputs),
            Pattern::RefactorCode => codebase::refactoring(outputs),
            Pattern::ResearchTopic => content::research(outputs),
            Pattern::AssessQuality => content::quality(outputs),
            Pattern::ExtractContent => content::extraction(outputs),
            Pattern::GenerateDocs => content::documentation(outputs),
            Pattern::CreateLearning => content::learning(outputs),
            Pattern::GenerateQuiz => content::quiz(outputs),
            Pattern::ProjectStatus => project::status(outputs),
            Pattern::Custom => generic::fuse(outputs),
        };
        debug!(
            pattern = %pattern,
            sections = draft.sections.len(),
            recommendations = draft.recommendations.len(),
            "report synthesized"
        );
        assemble(Some(pattern), draft, outputs)
    }

    /// Minimal report for a run that failed before producing outputs.
    pub fn error_report(&self, request: &str, error: &str, elapsed: Duration) -> Report {
        generic::error_report(request, error, elapsed)
    }
}

/// Attach metadata and the deterministic timestamp, and order sections.
pub fn assemble(pattern: Option<Pattern>, draft: Draft, outputs: &[ExecutorOutput]) -> Report {
    let mut report = Report {
        title: draft.title,
        summary: draft.summary,
        sections: draft.sections,
        recommendations: draft.recommendations,
        metadata: metadata(pattern, outputs),
        generated_at: generated_at(outputs),
    };
    report.sort_sections();
    report
}

pub fn metadata(pattern: Option<Pattern>, outputs: &[ExecutorOutput]) -> ReportMetadata {
    let successful = outputs.iter().filter(|o| o.success).count();
    let total_execution_ms: u64 = outputs.iter().map(|o| o.execution_time_ms).sum();
    ReportMetadata {
        pattern,
        total_executors: outputs.len(),
        successful,
        failed: outputs.len() - successful,
        total_execution_ms,
        avg_execution_ms: total_execution_ms.checked_div(outputs.len() as u64).unwrap_or(0),
        executors_used: outputs.iter().map(|o| o.executor.clone()).collect(),
        extra: Default::default(),
    }
}

/// Newest completion time among `outputs`, or the epoch.
pub fn generated_at(outputs: &[ExecutorOutput]) -> DateTime<Utc> {
    outputs
        .iter()
        .map(|o| o.completed_at)
        .max()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// First output whose executor base name is `base`.
pub fn find<'a>(outputs: &'a [ExecutorOutput], base: &str) -> Option<&'a ExecutorOutput> {
    outputs.iter().find(|o| o.base_name() == base)
}

/// Like [`find`], but only a successful output counts.
pub fn find_ok<'a>(outputs: &'a [ExecutorOutput], base: &str) -> Option<&'a ExecutorOutput> {
    find(outputs, base).filter(|o| o.success)
}

/// First `max` characters of `text`.
pub fn clip(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// `duplicate-detector` → `Duplicate Detector`.
pub fn title_case(name: &str) -> String {
    name.split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
