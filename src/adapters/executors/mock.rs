//! In-process executors: a scripted mock for tests and a simulated backend
//! that fabricates plausible results.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{base_name, Payload};
use crate::domain::ports::{Executor, Invocation, InvocationOutcome};

/// Scripted reaction to one invocation.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Report success with this payload.
    Succeed(Payload),
    /// Report a capability failure.
    Fail(String),
    /// Break the call itself.
    Error(String),
    /// Sleep, then behave as the inner behaviour.
    Delay(Duration, Box<MockBehavior>),
    /// Panic inside the executor.
    Panic(String),
}

impl MockBehavior {
    pub fn succeed(result: Payload) -> Self {
        Self::Succeed(result)
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self::Fail(error.into())
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self::Error(reason.into())
    }

    pub fn delay(millis: u64, then: MockBehavior) -> Self {
        Self::Delay(Duration::from_millis(millis), Box::new(then))
    }

    pub fn panic(message: impl Into<String>) -> Self {
        Self::Panic(message.into())
    }
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self::Succeed(Payload::new())
    }
}

/// Mock executor for testing.
///
/// Behaviours are looked up by concrete executor name, then by base name;
/// everything else gets the default behaviour. Every invocation is recorded.
#[derive(Debug, Default)]
pub struct MockExecutor {
    behaviors: HashMap<String, MockBehavior>,
    default_behavior: MockBehavior,
    invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(mut self, executor: impl Into<String>, behavior: MockBehavior) -> Self {
        self.behaviors.insert(executor.into(), behavior);
        self
    }

    pub fn with_default_behavior(mut self, behavior: MockBehavior) -> Self {
        self.default_behavior = behavior;
        self
    }

    /// Shared handle to the recorded invocations.
    pub fn invocations(&self) -> Arc<Mutex<Vec<Invocation>>> {
        self.invocations.clone()
    }

    fn behavior_for(&self, executor: &str) -> MockBehavior {
        self.behaviors
            .get(executor)
            .or_else(|| self.behaviors.get(base_name(executor)))
            .unwrap_or(&self.default_behavior)
            .clone()
    }
}

#[async_trait]
impl Executor for MockExecutor {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn invoke(&self, invocation: Invocation) -> DomainResult<InvocationOutcome> {
        let mut behavior = self.behavior_for(&invocation.executor);
        let executor = invocation.executor.clone();
        self.invocations.lock().await.push(invocation);

        let mut waited_ms = 0;
        loop {
            match behavior {
                MockBehavior::Succeed(result) => return Ok(InvocationOutcome::ok(result, waited_ms)),
                MockBehavior::Fail(error) => return Ok(InvocationOutcome::failed(error, waited_ms)),
                MockBehavior::Error(reason) => {
                    return Err(DomainError::InvocationFailed { executor, reason })
                }
                MockBehavior::Panic(message) => panic!("{message}"),
                MockBehavior::Delay(d, then) => {
                    tokio::time::sleep(d).await;
                    waited_ms += u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
                    behavior = *then;
                }
            }
        }
    }
}

/// Deterministic stand-in for real executors.
///
/// Returns payloads shaped like the ones each known capability produces so
/// the whole pipeline can run without external services.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedExecutor {
    latency: Duration,
}

impl SimulatedExecutor {
    pub const fn new() -> Self {
        Self {
            latency: Duration::ZERO,
        }
    }

    /// Add a fixed delay to every invocation.
    pub const fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl Executor for SimulatedExecutor {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn invoke(&self, invocation: Invocation) -> DomainResult<InvocationOutcome> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let result = simulate(&invocation);
        let elapsed = u64::try_from(self.latency.as_millis()).unwrap_or(u64::MAX);
        Ok(InvocationOutcome::ok(Payload::from_value(result), elapsed))
    }
}

fn simulate(invocation: &Invocation) -> Value {
    let input = &invocation.input;
    let path = input.str_or("path", "./");
    let path = path.trim_end_matches('/');

    match base_name(&invocation.executor) {
        "duplicate-detector" => json!({
            "duplicates_found": 3,
            "total_lines_duplicated": 84,
            "space_savings": "2.1 KB",
            "groups": [
                {"files": [format!("{path}/parser.rs"), format!("{path}/lexer.rs")], "lines": 34},
                {"files": [format!("{path}/config.rs"), format!("{path}/settings.rs")], "lines": 28},
                {"files": [format!("{path}/util.rs"), format!("{path}/helpers.rs")], "lines": 22},
            ],
        }),
        "dead-code-eliminator" => json!({
            "unused_functions": 4,
            "unused_imports": 7,
            "unused_variables": 2,
            "removable_lines": 120,
            "top_unused": ["legacy_parse", "old_format", "debug_dump"],
        }),
        "code-grouper" => json!({
            "files_analyzed": 42,
            "organization_score": 72,
            "misplaced_files": 3,
            "suggested_moves": 3,
            "new_directories": ["utils/", "io/"],
        }),
        "refactor-planner" => {
            let prior = &invocation.prior_results;
            let duplicates = prior
                .get("duplicate-detector")
                .map_or(0, |p| p.u64_or("duplicates_found", 0));
            let unused = prior
                .get("dead-code-eliminator")
                .map_or(0, |p| p.u64_or("unused_functions", 0));
            json!({
                "priority_actions": [
                    {"priority": "high", "description": format!("Consolidate {duplicates} duplicate blocks"), "estimated_effort": "2 hours"},
                    {"priority": "medium", "description": format!("Remove {unused} unused functions"), "estimated_effort": "1 hour"},
                    {"priority": "low", "description": "Move helpers into a shared module", "estimated_effort": "30 minutes"},
                ],
                "estimated_total_effort": "3.5 hours",
                "estimated_hours": 3.5,
                "high_priority_count": 1,
            })
        }
        "omnisearch" => {
            let query = input.str_or("query", "general topic");
            let max = input.u64_or("max_results", 10).min(3);
            let results: Vec<Value> = (1..=max)
                .map(|i| {
                    json!({
                        "id": format!("result-{i}"),
                        "title": format!("{query}: part {i}"),
                        "url": format!("https://example.org/{}/{i}", query.replace(' ', "-")),
                        "source": if i % 2 == 0 { "web" } else { "youtube" },
                    })
                })
                .collect();
            json!({"results": results, "sources": ["youtube", "web"]})
        }
        "quality-assessor" => json!({
            "overall_score": 82,
            "dimension_scores": {"credibility": 85, "accuracy": 80, "educational": 81},
            "assessments": [
                {"id": "result-1", "score": 88},
                {"id": "result-2", "score": 74},
                {"id": "result-3", "score": 83},
            ],
            "recommendations": ["Prefer sources with citations"],
        }),
        "context-builder" => json!({
            "branch": "main",
            "current_focus": "wave scheduling",
            "uncommitted_changes": 2,
            "recent_commits": 5,
            "active_files": ["src/lib.rs"],
            "health_score": 88,
        }),
        "quiz-generator" => {
            let topic = input.str_or("topic", "general topic");
            let count = input.u64_or("num_questions", 5);
            let questions: Vec<Value> = (1..=count)
                .map(|i| {
                    json!({
                        "question": format!("Question {i} about {topic}"),
                        "type": if i % 2 == 0 { "true_false" } else { "multiple_choice" },
                        "difficulty": if i <= 2 { "easy" } else { "medium" },
                    })
                })
                .collect();
            json!({"topic": topic, "questions": questions, "tokens_used": 1200})
        }
        "content-extractor" => json!({
            "items_extracted": 12,
            "source_type": "web",
            "total_duration": "N/A",
            "topics": ["overview", "examples"],
        }),
        "doc-generator" => json!({
            "docs_generated": 3,
            "sections": 9,
            "format": input.str_or("format", "markdown"),
        }),
        other => json!({
            "summary": format!("{other} processed: {}", invocation.description),
        }),
    }
}
