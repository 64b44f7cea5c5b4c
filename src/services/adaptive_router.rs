//! Adaptive routing: rank executors for free text by declared match and
//! learned success rate.
//!
//! Score = `priority × success_rate`, doubled when a route matches both the
//! detected content category and the required capability. Routes matching
//! neither are excluded. Success rates move by exponential smoothing after
//! every outcome.

use serde::Serialize;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

use crate::domain::models::{
    Capability, ContentCategory, FeedbackEntry, Route, RouterConfig,
};

/// Executor returned when nothing matches.
pub const DEFAULT_FALLBACK_EXECUTOR: &str = "general-learning-agent";

/// Default smoothing constant.
pub const DEFAULT_SMOOTHING_ALPHA: f64 = 0.1;

const CODE_EXTENSIONS: &[&str] = &[".py", ".ts", ".js", ".tsx", ".jsx", ".java", ".go", ".rs"];
const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg"];
const CODE_MARKERS: &[&str] = &["def ", "function ", "class ", "import ", "const ", "let ", "var "];
const SEARCH_PHRASES: &[&str] = &["find", "search", "look for", "where is", "how to find"];
const QUESTION_OPENERS: &[&str] = &["what", "how", "why", "when", "where", "who"];

/// Length above which unmatched text is treated as a document.
const DOCUMENT_MIN_CHARS: usize = 500;

/// Detect the coarse content category of `text`.
pub fn detect_category(text: &str) -> ContentCategory {
    let lowered = text.to_lowercase();
    let contains_any = |words: &[&str]| words.iter().any(|w| lowered.contains(w));

    if contains_any(&["youtube.com", "youtu.be"]) {
        return ContentCategory::YoutubeVideo;
    }
    if contains_any(IMAGE_EXTENSIONS) {
        return ContentCategory::Image;
    }
    if contains_any(CODE_EXTENSIONS) {
        return ContentCategory::CodeFile;
    }
    // Keywords are case-sensitive on purpose: "Class" in prose is not code.
    if CODE_MARKERS.iter().any(|m| text.contains(m)) {
        return ContentCategory::CodeFile;
    }
    if contains_any(SEARCH_PHRASES) {
        return ContentCategory::SearchQuery;
    }
    if text.trim().ends_with('?') || QUESTION_OPENERS.iter().any(|q| lowered.starts_with(q)) {
        return ContentCategory::Question;
    }
    if text.chars().count() > DOCUMENT_MIN_CHARS {
        return ContentCategory::Document;
    }
    ContentCategory::Unknown
}

/// Detect the capability `text` asks for. Defaults to [`Capability::Analyze`].
pub fn detect_capability(text: &str) -> Capability {
    let lowered = text.to_lowercase();
    let table: [(Capability, &[&str]); 6] = [
        (Capability::Search, &["search", "find", "look for"]),
        (Capability::Assess, &["assess", "evaluate", "quality"]),
        (Capability::Analyze, &["analyze", "review", "audit"]),
        (Capability::Generate, &["generate", "create", "write", "build", "make"]),
        (Capability::Refactor, &["refactor", "improve", "optimize", "fix"]),
        (Capability::Explain, &["explain", "what is", "how does", "why"]),
    ];
    table
        .iter()
        .find(|(_, words)| words.iter().any(|w| lowered.contains(w)))
        .map_or(Capability::Analyze, |(cap, _)| *cap)
}

/// The built-in route table.
pub fn default_routes() -> Vec<Route> {
    use Capability as Cap;
    use ContentCategory as Cat;

    vec![
        Route::new("omnisearch", &[Cat::SearchQuery, Cat::Question], &[Cap::Search], 10),
        Route::new(
            "quality-assessor",
            &[Cat::Document, Cat::CodeFile],
            &[Cap::Assess, Cap::Analyze],
            8,
        ),
        Route::new("duplicate-detector-ion", &[Cat::CodeFile], &[Cap::Analyze], 5),
        Route::new(
            "refactor-planner-ion",
            &[Cat::CodeFile],
            &[Cap::Refactor, Cap::Analyze],
            5,
        ),
        Route::new(
            "claude-code",
            &[Cat::CodeFile, Cat::Question],
            &[Cap::Generate, Cap::Explain, Cap::Refactor],
            9,
        ),
        Route::new(
            "youtube-extractor",
            &[Cat::YoutubeVideo],
            &[Cap::Analyze, Cap::Generate],
            10,
        ),
    ]
}

/// One ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRoute {
    pub name: String,
    pub score: f64,
    pub category_match: bool,
    pub capability_match: bool,
}

/// Full routing decision, for display and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteDecision {
    pub category: ContentCategory,
    pub capability: Capability,
    pub candidates: Vec<ScoredRoute>,
    pub fallback_used: bool,
    pub executors: Vec<String>,
}

/// Capability/content router with learned success rates.
///
/// Shared across concurrently running subtasks; updates are serialized by an
/// internal lock.
#[derive(Debug)]
pub struct AdaptiveRouter {
    routes: RwLock<Vec<Route>>,
    alpha: f64,
    fallback: String,
}

impl AdaptiveRouter {
    pub fn new(routes: Vec<Route>, alpha: f64, fallback: impl Into<String>) -> Self {
        Self {
            routes: RwLock::new(routes.into_iter().map(Route::with_valid_rate).collect()),
            alpha: alpha.clamp(f64::MIN_POSITIVE, 1.0),
            fallback: fallback.into(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(default_routes(), DEFAULT_SMOOTHING_ALPHA, DEFAULT_FALLBACK_EXECUTOR)
    }

    pub fn from_config(config: &RouterConfig) -> Self {
        Self::new(
            config.routes.clone().unwrap_or_else(default_routes),
            config.smoothing_alpha,
            config.fallback_executor.clone(),
        )
    }

    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Ranked executor names for `text`. Never empty.
    pub fn route<'a>(&self, text: impl Into<Option<&'a str>>) -> Vec<String> {
        self.route_detailed(text).executors
    }

    /// Ranked candidates with scores and match flags.
    pub fn route_detailed<'a>(&self, text: impl Into<Option<&'a str>>) -> RouteDecision {
        let text = text.into().unwrap_or_default();
        let category = detect_category(text);
        let capability = detect_capability(text);

        let mut candidates: Vec<ScoredRoute> = self
            .read()
            .iter()
            .filter_map(|route| {
                let category_match = route.handles(category);
                let capability_match = route.offers(capability);
                if !category_match && !capability_match {
                    return None;
                }
                let mut score = f64::from(route.priority) * route.success_rate;
                if category_match && capability_match {
                    score *= 2.0;
                }
                Some(ScoredRoute {
                    name: route.name.clone(),
                    score,
                    category_match,
                    capability_match,
                })
            })
            .collect();
        // Stable: equal scores keep registration order.
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

        let fallback_used = candidates.is_empty();
        let executors = if fallback_used {
            vec![self.fallback.clone()]
        } else {
            candidates.iter().map(|c| c.name.clone()).collect()
        };

        debug!(
            category = %category,
            capability = %capability,
            top = %executors[0],
            fallback_used,
            "routed"
        );

        RouteDecision {
            category,
            capability,
            candidates,
            fallback_used,
            executors,
        }
    }

    /// Fold one outcome into `executor`'s success rate. Returns the new rate,
    /// or `None` when no route carries that name.
    pub fn update(&self, executor: &str, success: bool) -> Option<f64> {
        let mut routes = self.write();
        let route = routes.iter_mut().find(|r| r.name == executor)?;
        route.observe(success, self.alpha);
        debug!(executor, success, rate = route.success_rate, "route score updated");
        Some(route.success_rate)
    }

    /// Append a route. Registration order breaks score ties.
    pub fn register(&self, route: Route) {
        debug!(executor = %route.name, "route registered");
        self.write().push(route);
    }

    pub fn success_rate(&self, executor: &str) -> Option<f64> {
        self.read()
            .iter()
            .find(|r| r.name == executor)
            .map(|r| r.success_rate)
    }

    /// Snapshot of the route table.
    pub fn routes(&self) -> Vec<Route> {
        self.read().clone()
    }

    /// Replay recorded outcomes so scores survive restarts.
    pub fn seed_from_feedback(&self, entries: &[FeedbackEntry]) -> usize {
        let mut applied = 0;
        for entry in entries.iter().filter(|e| !e.is_rating()) {
            for agent in &entry.agents_used {
                if self.update(agent, entry.success).is_some() {
                    applied += 1;
                }
            }
        }
        if applied > 0 {
            info!(applied, "route scores seeded from feedback");
        }
        applied
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Route>> {
        self.routes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Route>> {
        self.routes.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AdaptiveRouter {
    fn default() -> Self {
        Self::with_defaults()
    }
}
