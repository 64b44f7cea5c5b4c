//! Subtask graph builder.
//!
//! Each pattern has a dedicated builder producing a fixed topology. Builders
//! read optional parameters from the context map with explicit defaults and
//! wire dependencies by subtask identity.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use crate::domain::models::{Payload, Pattern, Subtask, TaskPlan};
use crate::services::pattern_classifier::PatternClassifier;
use crate::services::wave_scheduler::WaveScheduler;

/// Path used when neither the context nor the text names one.
pub const DEFAULT_PATH: &str = "./";

/// Topic used when the text yields no usable words.
pub const DEFAULT_TOPIC: &str = "general topic";

const TOPIC_STOP_WORDS: &[&str] = &[
    "about", "on", "for", "the", "a", "an", "create", "generate", "make", "quiz", "questions",
];

/// Builds subtask graphs and full task plans.
///
/// Identities come from a monotonic counter owned by the decomposer, so every
/// plan built through one instance gets distinct subtask ids.
#[derive(Debug)]
pub struct TaskDecomposer {
    classifier: PatternClassifier,
    counter: AtomicU64,
}

impl TaskDecomposer {
    pub const fn new(classifier: PatternClassifier) -> Self {
        Self {
            classifier,
            counter: AtomicU64::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(PatternClassifier::with_defaults())
    }

    pub const fn classifier(&self) -> &PatternClassifier {
        &self.classifier
    }

    /// Classify, build and partition `text` into an immutable plan.
    pub fn plan(&self, text: &str, context: &Payload) -> TaskPlan {
        let pattern = self.classifier.classify(text);
        let subtasks = self.build(pattern, text, context);
        let waves = WaveScheduler::partition(&subtasks);
        let plan = TaskPlan::new(text, pattern, subtasks, &waves);

        info!(
            plan_id = %plan.id,
            pattern = %plan.pattern,
            subtasks = plan.subtasks.len(),
            waves = plan.parallel_groups.len(),
            estimated_secs = plan.estimated_secs,
            degraded = plan.diagnostic.is_some(),
            "task plan built"
        );
        plan
    }

    /// Produce the subtasks for `pattern`.
    pub fn build(&self, pattern: Pattern, text: &str, context: &Payload) -> Vec<Subtask> {
        let subtasks = match pattern {
            Pattern::AnalyzeCodebase => self.codebase_analysis(text, context),
            Pattern::ResearchTopic => self.research(text, context),
            Pattern::ProjectStatus => self.project_status(context),
            Pattern::CodeCleanup => self.cleanup(text, context),
            Pattern::CreateLearning | Pattern::GenerateQuiz => self.quiz(text, context),
            Pattern::AssessQuality => self.quality(context),
            Pattern::RefactorCode => self.refactoring(text, context),
            Pattern::GenerateDocs => self.documentation(text, context),
            Pattern::FindDuplicates => self.duplicates(text, context),
            Pattern::FindDeadCode => self.dead_code(text, context),
            Pattern::OrganizeCode => self.organization(text, context),
            Pattern::ExtractContent => self.extraction(context),
            Pattern::Custom => self.custom(text, context),
        };
        debug!(pattern = %pattern, count = subtasks.len(), "subtasks built");
        subtasks
    }

    fn next_id(&self, executor: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{executor}_{n:03}")
    }

    fn subtask(&self, executor: &str, description: impl Into<String>) -> Subtask {
        Subtask::new(self.next_id(executor), Some(executor), description)
    }

    fn codebase_analysis(&self, text: &str, context: &Payload) -> Vec<Subtask> {
        let path = resolve_path(text, context);

        let duplicates = self
            .subtask("duplicate-detector", "Find duplicate code patterns")
            .with_input(
                Payload::new()
                    .with("path", path.clone())
                    .with("min_lines", 6)
                    .with("output", "duplicates.json"),
            )
            .with_priority(2)
            .with_estimate(5);
        let dead_code = self
            .subtask("dead-code-eliminator", "Identify unused code")
            .with_input(
                Payload::new()
                    .with("path", path.clone())
                    .with("output", "dead_code.json"),
            )
            .with_priority(2)
            .with_estimate(5);
        let grouping = self
            .subtask("code-grouper", "Analyze code organization")
            .with_input(
                Payload::new()
                    .with("path", path.clone())
                    .with("output", "groups.json"),
            )
            .with_priority(3)
            .with_estimate(8);
        let planner = self
            .subtask("refactor-planner", "Generate refactoring recommendations")
            .with_input(
                Payload::new()
                    .with("path", path)
                    .with("duplicates", "duplicates.json")
                    .with("dead_code", "dead_code.json")
                    .with("groups", "groups.json")
                    .with("output", "refactor_plan.json"),
            )
            .with_priority(1)
            .with_estimate(10)
            .depends_on([&duplicates.id, &dead_code.id, &grouping.id].map(String::as_str))
            .sequential();

        vec![duplicates, dead_code, grouping, planner]
    }

    fn research(&self, text: &str, context: &Payload) -> Vec<Subtask> {
        let topic = resolve_topic(text, context);
        let max_results = param(context, "max_results", json!(10));

        let search = self
            .subtask("omnisearch", format!("Search for content about {topic}"))
            .with_input(
                Payload::new()
                    .with("query", topic)
                    .with("sources", json!(["youtube", "web"]))
                    .with("max_results", max_results)
                    .with("output", "search_results.json"),
            )
            .with_priority(1)
            .with_estimate(15);
        let assess = self
            .subtask("quality-assessor", "Assess content quality")
            .with_input(
                Payload::new()
                    .with("input", "search_results.json")
                    .with("mode", "testing")
                    .with("output", "quality_scores.json"),
            )
            .with_priority(2)
            .with_estimate(2)
            .depends_on([search.id.as_str()])
            .sequential();

        vec![search, assess]
    }

    fn project_status(&self, context: &Payload) -> Vec<Subtask> {
        vec![self
            .subtask("context-builder", "Build project context from logs and git")
            .with_input(
                Payload::new()
                    .with("lookback_hours", param(context, "lookback_hours", json!(24)))
                    .with("sources", json!(["ada_logs", "git", "files"]))
                    .with("output", "context.json"),
            )
            .with_priority(1)
            .with_estimate(2)]
    }

    fn cleanup(&self, text: &str, context: &Payload) -> Vec<Subtask> {
        let path = resolve_path(text, context);

        let duplicates = self
            .subtask("duplicate-detector", "Find duplicates to consolidate")
            .with_input(
                Payload::new()
                    .with("path", path.clone())
                    .with("output", "duplicates.json"),
            )
            .with_priority(1)
            .with_estimate(5);
        let dead_code = self
            .subtask("dead-code-eliminator", "Find code to remove")
            .with_input(
                Payload::new()
                    .with("path", path.clone())
                    .with("output", "dead_code.json"),
            )
            .with_priority(1)
            .with_estimate(5);
        let planner = self
            .subtask("refactor-planner", "Plan cleanup actions")
            .with_input(
                Payload::new()
                    .with("path", path)
                    .with("duplicates", "duplicates.json")
                    .with("dead_code", "dead_code.json")
                    .with("output", "cleanup_plan.json"),
            )
            .with_priority(2)
            .with_estimate(10)
            .depends_on([duplicates.id.as_str(), dead_code.id.as_str()])
            .sequential();

        vec![duplicates, dead_code, planner]
    }

    fn quiz(&self, text: &str, context: &Payload) -> Vec<Subtask> {
        let topic = resolve_topic(text, context);
        let content = param(
            context,
            "content",
            json!(format!("Educational content about {topic}")),
        );

        vec![self
            .subtask("quiz-generator", format!("Generate quiz about {topic}"))
            .with_input(
                Payload::new()
                    .with("content", content)
                    .with("topic", topic)
                    .with("num_questions", param(context, "num_questions", json!(5)))
                    .with("grade_level", param(context, "grade_level", json!("6-8")))
                    .with("output", "quiz.json"),
            )
            .with_priority(1)
            .with_estimate(3)]
    }

    fn quality(&self, context: &Payload) -> Vec<Subtask> {
        vec![self
            .subtask("quality-assessor", "Assess content quality")
            .with_input(
                Payload::new()
                    .with("input", param(context, "input_file", json!("content.json")))
                    .with("mode", "testing")
                    .with("output", "quality_assessment.json"),
            )
            .with_priority(1)
            .with_estimate(2)]
    }

    fn refactoring(&self, text: &str, context: &Payload) -> Vec<Subtask> {
        let path = resolve_path(text, context);

        let duplicates = self
            .subtask(
                "duplicate-detector",
                "Find duplicate code patterns for refactoring consideration",
            )
            .with_input(
                Payload::new()
                    .with("path", path.clone())
                    .with("output", "duplicates.json"),
            )
            .with_priority(2)
            .with_estimate(5);
        let dead_code = self
            .subtask(
                "dead-code-eliminator",
                "Identify unused code for removal recommendations",
            )
            .with_input(
                Payload::new()
                    .with("path", path.clone())
                    .with("output", "dead_code.json"),
            )
            .with_priority(2)
            .with_estimate(5);
        let grouping = self
            .subtask(
                "code-grouper",
                "Analyze code organization for restructuring opportunities",
            )
            .with_input(
                Payload::new()
                    .with("path", path.clone())
                    .with("output", "grouping.json"),
            )
            .with_priority(2)
            .with_estimate(8);
        let planner = self
            .subtask(
                "refactor-planner",
                "Generate comprehensive refactoring plan using analysis results",
            )
            .with_input(
                Payload::new()
                    .with("path", path)
                    .with("duplicates", "duplicates.json")
                    .with("dead_code", "dead_code.json")
                    .with("grouping", "grouping.json")
                    .with("output", "refactor_plan.json"),
            )
            .with_priority(1)
            .with_estimate(10)
            .depends_on([&duplicates.id, &dead_code.id, &grouping.id].map(String::as_str))
            .sequential();

        vec![duplicates, dead_code, grouping, planner]
    }

    fn documentation(&self, text: &str, context: &Payload) -> Vec<Subtask> {
        vec![self
            .subtask("doc-generator", "Generate documentation")
            .with_input(
                Payload::new()
                    .with("path", resolve_path(text, context))
                    .with("format", "markdown")
                    .with("output", "docs/"),
            )
            .with_priority(1)
            .with_estimate(15)]
    }

    fn duplicates(&self, text: &str, context: &Payload) -> Vec<Subtask> {
        vec![self
            .subtask("duplicate-detector", "Find duplicate code patterns")
            .with_input(
                Payload::new()
                    .with("path", resolve_path(text, context))
                    .with("min_lines", 6)
                    .with("output", "duplicates.json"),
            )
            .with_priority(1)
            .with_estimate(5)]
    }

    fn dead_code(&self, text: &str, context: &Payload) -> Vec<Subtask> {
        vec![self
            .subtask("dead-code-eliminator", "Find unused code")
            .with_input(
                Payload::new()
                    .with("path", resolve_path(text, context))
                    .with("output", "dead_code.json"),
            )
            .with_priority(1)
            .with_estimate(5)]
    }

    fn organization(&self, text: &str, context: &Payload) -> Vec<Subtask> {
        vec![self
            .subtask("code-grouper", "Analyze code organization")
            .with_input(
                Payload::new()
                    .with("path", resolve_path(text, context))
                    .with("output", "groups.json"),
            )
            .with_priority(1)
            .with_estimate(8)]
    }

    fn extraction(&self, context: &Payload) -> Vec<Subtask> {
        vec![self
            .subtask("content-extractor", "Extract content from source")
            .with_input(
                Payload::new()
                    .with("url", param(context, "url", json!("")))
                    .with("output", "extracted_content.json"),
            )
            .with_priority(1)
            .with_estimate(10)]
    }

    fn custom(&self, text: &str, context: &Payload) -> Vec<Subtask> {
        let mut input = Payload::new().with("task", text);
        input.extend(context);
        // Unbound: the adaptive router resolves an executor at dispatch.
        vec![Subtask::new(self.next_id("general"), None, text)
            .with_input(input)
            .with_priority(1)
            .with_estimate(5)]
    }
}

impl Default for TaskDecomposer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn param(context: &Payload, key: &str, default: Value) -> Value {
    context
        .get(key)
        .filter(|v| !v.is_null())
        .cloned()
        .unwrap_or(default)
}

/// Context `path`, else a path mentioned in the text, else [`DEFAULT_PATH`].
pub fn resolve_path(text: &str, context: &Payload) -> String {
    context
        .str_opt("path")
        .filter(|p| !p.is_empty())
        .or_else(|| extract_path(text))
        .unwrap_or_else(|| DEFAULT_PATH.to_string())
}

/// First quoted string in `text`. A mention of the home project maps to the
/// working directory.
pub fn extract_path(text: &str) -> Option<String> {
    if text.to_lowercase().contains("learnqwest") {
        return Some(DEFAULT_PATH.to_string());
    }
    let start = text.find(['"', '\''])?;
    let rest = &text[start + 1..];
    let end = rest.find(['"', '\''])?;
    let quoted = &rest[..end];
    (!quoted.is_empty()).then(|| quoted.to_string())
}

/// Context `topic`, else [`extract_topic`].
pub fn resolve_topic(text: &str, context: &Payload) -> String {
    context
        .str_opt("topic")
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| extract_topic(text))
}

/// The last three words of `text` longer than two characters that are not
/// stop words.
pub fn extract_topic(text: &str) -> String {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split_whitespace()
        .filter(|w| w.chars().count() > 2 && !TOPIC_STOP_WORDS.contains(w))
        .collect();
    if words.is_empty() {
        return DEFAULT_TOPIC.to_string();
    }
    words[words.len().saturating_sub(3)..].join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn decomposer() -> TaskDecomposer {
        TaskDecomposer::with_defaults()
    }

    #[test]
    fn test_codebase_topology() {
        let d = decomposer();
        let subtasks = d.build(Pattern::AnalyzeCodebase, "Analyze the codebase", &Payload::new());
        assert_eq!(subtasks.len(), 4);
        let planner = &subtasks[3];
        assert_eq!(planner.executor.as_deref(), Some("refactor-planner"));
        assert_eq!(
            planner.depends_on,
            vec![subtasks[0].id.clone(), subtasks[1].id.clone(), subtasks[2].id.clone()]
        );
        assert!(!planner.can_parallelize);
        assert!(subtasks[..3].iter().all(|s| s.depends_on.is_empty()));
        assert_eq!(subtasks[0].input.str_or("path", ""), "./");
        assert_eq!(subtasks[0].input.u64_or("min_lines", 0), 6);
    }

    #[test]
    fn test_refactoring_inputs() {
        let d = decomposer();
        let subtasks = d.build(Pattern::RefactorCode, "Refactor ./lib", &Payload::new());
        assert_eq!(subtasks.len(), 4);
        assert!(subtasks[0].input.get("min_lines").is_none());
        let planner = &subtasks[3];
        assert_eq!(planner.input.str_or("grouping", ""), "grouping.json");
        assert!(planner.input.get("groups").is_none());
        assert_eq!(planner.input.str_or("duplicates", ""), "duplicates.json");
        assert_eq!(planner.input.str_or("dead_code", ""), "dead_code.json");
    }

    #[test]
    fn test_ids_are_unique_across_plans() {
        let d = decomposer();
        let mut seen = HashSet::new();
        for _ in 0..3 {
            for s in d.build(Pattern::AnalyzeCodebase, "x", &Payload::new()) {
                assert!(seen.insert(s.id.clone()), "duplicate id {}", s.id);
            }
        }
        assert_eq!(seen.len(), 12);
    }

    #[test]
    fn test_id_format() {
        let d = decomposer();
        let s = d.build(Pattern::FindDuplicates, "find duplicates", &Payload::new());
        assert_eq!(s[0].id, "duplicate-detector_001");
    }

    #[test]
    fn test_research_defaults_and_dependency() {
        let d = decomposer();
        let s = d.build(Pattern::ResearchTopic, "research volcano formation", &Payload::new());
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].input.str_or("query", ""), "research volcano formation");
        assert_eq!(s[0].input.u64_or("max_results", 0), 10);
        assert_eq!(s[1].depends_on, vec![s[0].id.clone()]);
    }

    #[test]
    fn test_context_overrides_defaults() {
        let d = decomposer();
        let ctx = Payload::new()
            .with("topic", "photosynthesis")
            .with("num_questions", 10)
            .with("path", "/srv/app");
        let quiz = d.build(Pattern::GenerateQuiz, "make a quiz", &ctx);
        assert_eq!(quiz[0].description, "Generate quiz about photosynthesis");
        assert_eq!(quiz[0].input.u64_or("num_questions", 0), 10);
        assert_eq!(quiz[0].input.str_or("grade_level", ""), "6-8");

        let dup = d.build(Pattern::FindDuplicates, "dups", &ctx);
        assert_eq!(dup[0].input.str_or("path", ""), "/srv/app");
    }

    #[test]
    fn test_custom_is_unbound_and_carries_context() {
        let d = decomposer();
        let ctx = Payload::new().with("user", "sam");
        let s = d.build(Pattern::Custom, "make coffee", &ctx);
        assert_eq!(s.len(), 1);
        assert!(s[0].executor.is_none());
        assert_eq!(s[0].input.str_or("task", ""), "make coffee");
        assert_eq!(s[0].input.str_or("user", ""), "sam");
    }

    #[test]
    fn test_extract_topic() {
        assert_eq!(
            extract_topic("Create a quiz about photosynthesis for 6th grade with 10 questions"),
            "6th grade with"
        );
        assert_eq!(extract_topic("make a quiz"), DEFAULT_TOPIC);
        assert_eq!(extract_topic("research volcanoes"), "research volcanoes");
    }

    #[test]
    fn test_extract_path() {
        assert_eq!(extract_path("scan 'src/lib' please").as_deref(), Some("src/lib"));
        assert_eq!(extract_path("scan \"/tmp/x\"").as_deref(), Some("/tmp/x"));
        assert_eq!(extract_path("check LearnQwest").as_deref(), Some("./"));
        assert_eq!(extract_path("no quotes here"), None);
        assert_eq!(resolve_path("no quotes", &Payload::new()), DEFAULT_PATH);
    }

    #[test]
    fn test_plan_for_quiz_scenario() {
        let plan = decomposer().plan(
            "Create a quiz about photosynthesis for 6th grade with 10 questions",
            &Payload::new(),
        );
        assert_eq!(plan.pattern, Pattern::GenerateQuiz);
        assert_eq!(plan.subtasks.len(), 1);
        assert!(plan.subtasks[0].depends_on.is_empty());
        assert_eq!(plan.parallel_groups.len(), 1);
        assert!(!plan.requires_synthesis);
    }

    #[test]
    fn test_plan_estimate() {
        let plan = decomposer().plan("Analyze the codebase", &Payload::new());
        // max(5, 5, 8) + 10
        assert_eq!(plan.estimated_secs, 18);
        assert!(plan.requires_synthesis);
    }

    #[test]
    fn test_every_pattern_builds_a_valid_graph() {
        let d = decomposer();
        for pattern in Pattern::ALL {
            let subtasks = d.build(pattern, "something", &Payload::new());
            assert!(!subtasks.is_empty(), "{pattern} built nothing");
            let ids: HashSet<&str> = subtasks.iter().map(|s| s.id.as_str()).collect();
            for s in &subtasks {
                for dep in &s.depends_on {
                    assert!(ids.contains(dep.as_str()), "{pattern}: dangling {dep}");
                }
            }
            assert!(WaveScheduler::partition(&subtasks).diagnostic.is_none());
        }
    }
}
