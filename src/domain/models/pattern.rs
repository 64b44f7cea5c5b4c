//! Recognized task intents.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A recognized task intent. Drives which subtask graph gets built and which
/// fusion function the synthesizer applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    AnalyzeCodebase,
    ResearchTopic,
    ProjectStatus,
    CodeCleanup,
    CreateLearning,
    AssessQuality,
    RefactorCode,
    GenerateDocs,
    FindDuplicates,
    FindDeadCode,
    OrganizeCode,
    ExtractContent,
    GenerateQuiz,
    Custom,
}

impl Pattern {
    /// Every pattern, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::AnalyzeCodebase,
        Self::ResearchTopic,
        Self::ProjectStatus,
        Self::CodeCleanup,
        Self::CreateLearning,
        Self::AssessQuality,
        Self::RefactorCode,
        Self::GenerateDocs,
        Self::FindDuplicates,
        Self::FindDeadCode,
        Self::OrganizeCode,
        Self::ExtractContent,
        Self::GenerateQuiz,
        Self::Custom,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AnalyzeCodebase => "analyze_codebase",
            Self::ResearchTopic => "research_topic",
            Self::ProjectStatus => "project_status",
            Self::CodeCleanup => "code_cleanup",
            Self::CreateLearning => "create_learning",
            Self::AssessQuality => "assess_quality",
            Self::RefactorCode => "refactor_code",
            Self::GenerateDocs => "generate_docs",
            Self::FindDuplicates => "find_duplicates",
            Self::FindDeadCode => "find_dead_code",
            Self::OrganizeCode => "organize_code",
            Self::ExtractContent => "extract_content",
            Self::GenerateQuiz => "generate_quiz",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown pattern: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_string_forms_round_trip() {
        for pattern in Pattern::ALL {
            assert_eq!(pattern.as_str().parse::<Pattern>().unwrap(), pattern);
            let json = serde_json::to_string(&pattern).unwrap();
            assert_eq!(json, format!("\"{}\"", pattern.as_str()));
        }
    }

    #[test]
    fn test_unknown_pattern_rejected() {
        assert!("make_coffee".parse::<Pattern>().is_err());
    }
}
