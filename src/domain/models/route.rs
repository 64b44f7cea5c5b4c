//! Routing profiles: what an executor declares it handles, plus its learned
//! success rate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse content category detected from free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    YoutubeVideo,
    Image,
    CodeFile,
    Document,
    Question,
    SearchQuery,
    Unknown,
}

impl ContentCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::YoutubeVideo => "youtube_video",
            Self::Image => "image",
            Self::CodeFile => "code_file",
            Self::Document => "document",
            Self::Question => "question",
            Self::SearchQuery => "search_query",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Search,
    Analyze,
    Generate,
    Assess,
    Refactor,
    Explain,
}

impl Capability {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Analyze => "analyze",
            Self::Generate => "generate",
            Self::Assess => "assess",
            Self::Refactor => "refactor",
            Self::Explain => "explain",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Initial success rate of a freshly registered route.
pub const INITIAL_SUCCESS_RATE: f64 = 1.0;

/// An executor's declared match profile and learned success rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    pub handles: Vec<ContentCategory>,
    pub capabilities: Vec<Capability>,
    /// Static weight.
    pub priority: u32,
    /// Always within `[0, 1]`.
    #[serde(default = "initial_success_rate")]
    pub success_rate: f64,
}

const fn initial_success_rate() -> f64 {
    INITIAL_SUCCESS_RATE
}

impl Route {
    pub fn new(
        name: impl Into<String>,
        handles: &[ContentCategory],
        capabilities: &[Capability],
        priority: u32,
    ) -> Self {
        Self {
            name: name.into(),
            handles: handles.to_vec(),
            capabilities: capabilities.to_vec(),
            priority,
            success_rate: INITIAL_SUCCESS_RATE,
        }
    }

    pub fn handles(&self, category: ContentCategory) -> bool {
        self.handles.contains(&category)
    }

    pub fn offers(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Pull a loaded success rate back into `[0, 1]`; NaN resets to the
    /// initial rate.
    #[must_use]
    pub fn with_valid_rate(mut self) -> Self {
        self.success_rate = if self.success_rate.is_nan() {
            INITIAL_SUCCESS_RATE
        } else {
            self.success_rate.clamp(0.0, 1.0)
        };
        self
    }

    /// Fold one outcome into the success rate with exponential smoothing.
    pub fn observe(&mut self, success: bool, alpha: f64) {
        let outcome = if success { 1.0 } else { 0.0 };
        self.success_rate = alpha.mul_add(outcome, (1.0 - alpha) * self.success_rate).clamp(0.0, 1.0);
    }
}
