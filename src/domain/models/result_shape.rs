//! Typed, lenient views over executor result payloads.
//!
//! Executors return arbitrary maps. [`ResultShape`] recognizes the shapes the
//! synthesizer knows how to fuse and keeps everything else as
//! [`ResultShape::Opaque`]. Every field is read through a defaulting accessor,
//! so a view can always be built, however sparse the payload.

use serde_json::Value;

use super::output::{display_value, ExecutorOutput, Payload};

/// A cluster of duplicated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub files: Vec<String>,
    pub lines: u64,
}

/// `duplicate-detector` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateReport {
    pub duplicates_found: u64,
    pub total_lines_duplicated: u64,
    pub space_savings: String,
    pub groups: Vec<DuplicateGroup>,
}

impl DuplicateReport {
    pub fn from_payload(p: &Payload) -> Self {
        let groups = p
            .array("groups")
            .iter()
            .map(|g| {
                let g = Payload::view(g);
                DuplicateGroup {
                    files: g.strings("files"),
                    lines: g.u64_or("lines", 0),
                }
            })
            .collect::<Vec<_>>();
        Self {
            duplicates_found: p.u64_or("duplicates_found", groups.len() as u64),
            total_lines_duplicated: p.u64_or("total_lines_duplicated", 0),
            space_savings: p.str_or("space_savings", "0 bytes"),
            groups,
        }
    }

    pub fn issues(&self) -> u64 {
        self.duplicates_found
    }
}

/// `dead-code-eliminator` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadCodeReport {
    pub unused_functions: u64,
    pub unused_imports: u64,
    pub unused_variables: u64,
    pub removable_lines: u64,
    pub top_unused: Vec<String>,
}

impl DeadCodeReport {
    pub fn from_payload(p: &Payload) -> Self {
        Self {
            unused_functions: p.count_or("unused_functions", 0),
            unused_imports: p.count_or("unused_imports", 0),
            unused_variables: p.count_or("unused_variables", 0),
            removable_lines: p.u64_or("removable_lines", 0),
            top_unused: p.strings("top_unused"),
        }
    }

    pub const fn issues(&self) -> u64 {
        self.unused_functions + self.unused_imports + self.unused_variables
    }
}

/// `code-grouper` result.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationReport {
    pub files_analyzed: u64,
    pub organization_score: Option<f64>,
    pub misplaced_files: u64,
    pub suggested_moves: u64,
    pub new_directories: Vec<String>,
}

impl OrganizationReport {
    pub fn from_payload(p: &Payload) -> Self {
        Self {
            files_analyzed: p.u64_or("files_analyzed", 0),
            organization_score: p.f64_opt("organization_score"),
            misplaced_files: p.count_or("misplaced_files", 0),
            suggested_moves: p.count_or("suggested_moves", 0),
            new_directories: p.strings("new_directories"),
        }
    }
}

/// One recommended refactoring step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefactorAction {
    pub priority: String,
    pub description: String,
    pub estimated_effort: String,
}

impl RefactorAction {
    fn from_value(v: &Value) -> Self {
        match v {
            Value::Object(_) => {
                let p = Payload::view(v);
                Self {
                    priority: p.str_or("priority", "medium"),
                    description: p.str_or("description", "Unnamed action"),
                    estimated_effort: p.str_or("estimated_effort", "unknown"),
                }
            }
            other => Self {
                priority: "medium".to_string(),
                description: display_value(other),
                estimated_effort: "unknown".to_string(),
            },
        }
    }
}

/// `refactor-planner` result.
#[derive(Debug, Clone, PartialEq)]
pub struct RefactorPlan {
    pub priority_actions: Vec<RefactorAction>,
    pub estimated_total_effort: String,
    pub total_items: u64,
    pub high_priority_count: u64,
    pub estimated_hours: f64,
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

impl RefactorPlan {
    pub fn from_payload(p: &Payload) -> Self {
        let priority_actions: Vec<RefactorAction> = p
            .array("priority_actions")
            .iter()
            .map(RefactorAction::from_value)
            .collect();
        let high = p.strings("high_priority");
        let medium = p.strings("medium_priority");
        let low = p.strings("low_priority");
        let listed = (high.len() + medium.len() + low.len()) as u64;
        Self {
            total_items: p.u64_or("total_items", listed.max(priority_actions.len() as u64)),
            high_priority_count: p.u64_or("high_priority_count", high.len() as u64),
            estimated_hours: p.f64_or("estimated_hours", 0.0),
            estimated_total_effort: p.str_or("estimated_total_effort", "unknown"),
            priority_actions,
            high,
            medium,
            low,
        }
    }
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
}

/// `omnisearch` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    pub results: Vec<SearchHit>,
}

impl SearchResults {
    pub fn from_payload(p: &Payload) -> Self {
        let results = p
            .array("results")
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let hit = Payload::view(v);
                SearchHit {
                    id: hit.str_or("id", &format!("result-{}", i + 1)),
                    title: hit.str_or("title", "Untitled"),
                    url: hit.str_or("url", ""),
                    source: hit.str_or("source", "web"),
                }
            })
            .collect();
        Self { results }
    }
}

/// A scored item from a quality assessment.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem {
    pub id: String,
    pub score: f64,
}

/// Score at or above which content counts as high quality.
pub const HIGH_QUALITY_SCORE: f64 = 80.0;

/// `quality-assessor` result.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityAssessment {
    pub overall_score: Option<f64>,
    /// Sorted by dimension name.
    pub dimension_scores: Vec<(String, f64)>,
    pub assessments: Vec<ScoredItem>,
    pub recommendations: Vec<String>,
}

impl QualityAssessment {
    pub fn from_payload(p: &Payload) -> Self {
        let dims = p.object("dimension_scores");
        let mut dimension_scores: Vec<(String, f64)> = dims
            .iter()
            .filter_map(|(k, _)| dims.f64_opt(k).map(|score| (k.clone(), score)))
            .collect();
        dimension_scores.sort_by(|a, b| a.0.cmp(&b.0));

        let assessments = p
            .array("assessments")
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let item = Payload::view(v);
                ScoredItem {
                    id: item.str_or("id", &format!("result-{}", i + 1)),
                    score: item.f64_or("score", 50.0),
                }
            })
            .collect();

        Self {
            overall_score: p.f64_opt("overall_score"),
            dimension_scores,
            assessments,
            recommendations: p.strings("recommendations"),
        }
    }

    pub fn high_quality_count(&self) -> usize {
        self.assessments
            .iter()
            .filter(|a| a.score >= HIGH_QUALITY_SCORE)
            .count()
    }

    pub fn score_for(&self, id: &str) -> Option<f64> {
        self.assessments.iter().find(|a| a.id == id).map(|a| a.score)
    }
}

/// Project state gathered by `context-builder`, `git-status`,
/// `health-check`, `activity-log` and `test-runner`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectSnapshot {
    pub current_focus: Option<String>,
    pub branch: Option<String>,
    pub uncommitted_changes: u64,
    pub recent_commits: u64,
    pub active_files: Vec<String>,
    pub health_score: Option<f64>,
    pub health_issues: Vec<String>,
    pub recent_activities: Vec<String>,
    pub tests_passed: u64,
    pub tests_failed: u64,
}

impl ProjectSnapshot {
    pub fn from_payload(p: &Payload) -> Self {
        Self {
            current_focus: p.str_opt("current_focus").or_else(|| p.str_opt("summary")),
            branch: p.str_opt("branch"),
            uncommitted_changes: p.count_or("uncommitted_changes", 0),
            recent_commits: p.count_or("recent_commits", 0),
            active_files: p.strings("active_files"),
            health_score: p.f64_opt("health_score"),
            health_issues: p.strings("issues"),
            recent_activities: p.strings("recent_activities"),
            tests_passed: p.u64_or("tests_passed", 0),
            tests_failed: p.u64_or("tests_failed", 0),
        }
    }

    /// Fold another snapshot in; populated fields of `other` win.
    pub fn merge(&mut self, other: Self) {
        if other.current_focus.is_some() {
            self.current_focus = other.current_focus;
        }
        if other.branch.is_some() {
            self.branch = other.branch;
        }
        if other.health_score.is_some() {
            self.health_score = other.health_score;
        }
        self.uncommitted_changes += other.uncommitted_changes;
        self.recent_commits += other.recent_commits;
        self.active_files.extend(other.active_files);
        self.health_issues.extend(other.health_issues);
        self.recent_activities.extend(other.recent_activities);
        self.tests_passed += other.tests_passed;
        self.tests_failed += other.tests_failed;
    }
}

/// One generated quiz question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub question: String,
    /// Question format, e.g. `multiple_choice`.
    pub kind: Option<String>,
    pub teks: Option<String>,
    pub difficulty: Option<String>,
}

/// `quiz-generator` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    pub questions: Vec<QuizQuestion>,
    pub topic: Option<String>,
    /// Reported count; may exceed `questions` when the executor sends a sample.
    pub questions_generated: u64,
}

impl QuizResult {
    pub fn from_payload(p: &Payload) -> Self {
        let questions = p
            .array("questions")
            .iter()
            .map(|v| {
                let q = Payload::view(v);
                QuizQuestion {
                    question: q
                        .str_opt("question")
                        .unwrap_or_else(|| display_value(v)),
                    kind: q.str_opt("type"),
                    teks: q
                        .str_opt("teks")
                        .or_else(|| q.str_opt("teks_standard"))
                        .or_else(|| q.str_opt("teks_alignment")),
                    difficulty: q.str_opt("difficulty"),
                }
            })
            .collect::<Vec<_>>();
        Self {
            questions_generated: match p.u64_or("questions_generated", 0) {
                0 => questions.len() as u64,
                n => n,
            },
            questions,
            topic: p.str_opt("topic"),
        }
    }
}

/// A recognized executor result, or the raw payload when unrecognized.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultShape {
    Duplicates(DuplicateReport),
    DeadCode(DeadCodeReport),
    Organization(OrganizationReport),
    Refactor(RefactorPlan),
    Search(SearchResults),
    Quality(QualityAssessment),
    Project(ProjectSnapshot),
    Quiz(QuizResult),
    Opaque(Payload),
}

impl ResultShape {
    /// Interpret a payload according to the executor that produced it.
    /// `executor` may carry an alias suffix.
    pub fn interpret(executor: &str, payload: &Payload) -> Self {
        match super::output::base_name(executor) {
            "duplicate-detector" => Self::Duplicates(DuplicateReport::from_payload(payload)),
            "dead-code-eliminator" => Self::DeadCode(DeadCodeReport::from_payload(payload)),
            "code-grouper" => Self::Organization(OrganizationReport::from_payload(payload)),
            "refactor-planner" => Self::Refactor(RefactorPlan::from_payload(payload)),
            "omnisearch" => Self::Search(SearchResults::from_payload(payload)),
            "quality-assessor" => Self::Quality(QualityAssessment::from_payload(payload)),
            "context-builder" | "git-status" | "health-check" | "activity-log" | "test-runner" => {
                Self::Project(ProjectSnapshot::from_payload(payload))
            }
            "quiz-generator" => Self::Quiz(QuizResult::from_payload(payload)),
            _ => Self::Opaque(payload.clone()),
        }
    }

    pub fn of(output: &ExecutorOutput) -> Self {
        Self::interpret(&output.executor, &output.result)
    }
}
