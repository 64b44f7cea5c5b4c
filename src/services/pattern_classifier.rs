//! Pattern classification: free text to a recognized intent.
//!
//! Classification walks an ordered rule table and returns the pattern of the
//! first rule whose predicate matches the lower-cased text. More specific
//! rules sit above more general ones; reordering the table changes results.

use crate::domain::models::{ClassificationRule, Pattern, Predicate};

/// Outcome of a classification with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub pattern: Pattern,
    /// Name of the matching rule, `None` for the custom fallback.
    pub rule: Option<String>,
    /// Zero-based position of the matching rule.
    pub position: Option<usize>,
}

/// Ordered first-match-wins classifier.
#[derive(Debug, Clone)]
pub struct PatternClassifier {
    rules: Vec<ClassificationRule>,
}

impl PatternClassifier {
    pub const fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    pub fn with_defaults() -> Self {
        Self::new(default_rules())
    }

    /// Use `rules` when configured, the built-in chain otherwise.
    pub fn from_config(rules: Option<&[ClassificationRule]>) -> Self {
        rules.map_or_else(Self::with_defaults, |r| Self::new(r.to_vec()))
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    /// Classify `text`. Never fails; unmatched text is [`Pattern::Custom`].
    pub fn classify(&self, text: &str) -> Pattern {
        self.explain(text).pattern
    }

    /// Classify and report which rule matched.
    pub fn explain(&self, text: &str) -> Classification {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.when.matches(&lowered))
            .map_or(
                Classification {
                    pattern: Pattern::Custom,
                    rule: None,
                    position: None,
                },
                |(i, rule)| Classification {
                    pattern: rule.pattern,
                    rule: Some(rule.name.clone()),
                    position: Some(i),
                },
            )
    }
}

impl Default for PatternClassifier {
    fn default() -> Self {
        Self::with_defaults()
    }
}

const ANALYSIS_VERBS: &[&str] = &["analyze", "audit", "assess", "review"];

/// The built-in precedence chain.
pub fn default_rules() -> Vec<ClassificationRule> {
    use Predicate as P;

    let all = |preds: Vec<P>| P::All(preds);
    let not = |pred: P| P::Not(Box::new(pred));

    vec![
        // A whole-codebase request wins over the narrower analyses it mentions.
        ClassificationRule::new(
            "whole_codebase_analysis",
            Pattern::AnalyzeCodebase,
            all(vec![
                P::any(ANALYSIS_VERBS),
                P::any(&["codebase", "repository", "project"]),
            ]),
        ),
        ClassificationRule::new(
            "duplicates",
            Pattern::FindDuplicates,
            P::any(&[
                "find duplicate",
                "duplicate code",
                "duplicate patterns",
                "similar code",
                "duplicate",
                "repeated",
                "redundant",
                "copy",
                "copies",
            ]),
        ),
        ClassificationRule::new(
            "dead_code",
            Pattern::FindDeadCode,
            P::AnyOf(vec![
                P::any(&[
                    "dead code",
                    "unused code",
                    "unreachable",
                    "identify unused",
                    "find unused",
                ]),
                all(vec![P::any(&["unused", "dead"]), P::any(&["code"])]),
            ]),
        ),
        ClassificationRule::new(
            "organization",
            Pattern::OrganizeCode,
            P::AnyOf(vec![
                P::any(&[
                    "code organization",
                    "organize code",
                    "group code",
                    "structure code",
                    "analyze organization",
                ]),
                all(vec![
                    P::any(&["code"]),
                    P::any(&["group", "structure", "arrange"]),
                ]),
            ]),
        ),
        ClassificationRule::new(
            "quiz",
            Pattern::GenerateQuiz,
            P::any(&["quiz", "test questions"]),
        ),
        ClassificationRule::new(
            "learning",
            Pattern::CreateLearning,
            all(vec![
                P::any(&["questions", "teach", "explain", "lesson", "study", "learn"]),
                not(P::any(&["research", "search"])),
            ]),
        ),
        ClassificationRule::new(
            "code_analysis",
            Pattern::AnalyzeCodebase,
            all(vec![
                P::any(ANALYSIS_VERBS),
                P::any(&["codebase", "code", "repository", "project", "files"]),
            ]),
        ),
        ClassificationRule::new(
            "status",
            Pattern::ProjectStatus,
            P::any(&["status", "where am i", "what was i", "context", "working on", "yesterday"]),
        ),
        ClassificationRule::new(
            "cleanup",
            Pattern::CodeCleanup,
            P::any(&["clean", "cleanup", "tidy"]),
        ),
        ClassificationRule::new(
            "refactoring",
            Pattern::RefactorCode,
            P::any(&[
                "refactor",
                "restructure",
                "improve code",
                "optimize code",
                "refactoring plan",
                "generate refactoring",
            ]),
        ),
        ClassificationRule::new(
            "content_quality",
            Pattern::AssessQuality,
            all(vec![
                P::any(&["quality", "score", "rate", "evaluate"]),
                P::any(&["content", "video", "article", "resource"]),
            ]),
        ),
        ClassificationRule::new(
            "extraction",
            Pattern::ExtractContent,
            P::any(&["extract", "pull content", "get content", "transcript"]),
        ),
        ClassificationRule::new(
            "documentation",
            Pattern::GenerateDocs,
            P::any(&["document", "docs", "readme", "guide"]),
        ),
        ClassificationRule::new(
            "research",
            Pattern::ResearchTopic,
            P::any(&["research", "search", "learn about", "discover", "look up"]),
        ),
        ClassificationRule::new("bare_find", Pattern::ResearchTopic, P::any(&["find"])),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Pattern {
        PatternClassifier::with_defaults().classify(text)
    }

    #[test]
    fn test_precedence_chain_order() {
        let names: Vec<String> = default_rules().into_iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "whole_codebase_analysis",
                "duplicates",
                "dead_code",
                "organization",
                "quiz",
                "learning",
                "code_analysis",
                "status",
                "cleanup",
                "refactoring",
                "content_quality",
                "extraction",
                "documentation",
                "research",
                "bare_find",
            ]
        );
    }

    #[test]
    fn test_each_rule_reachable() {
        let cases = [
            ("Analyze the codebase for duplicates and dead code", Pattern::AnalyzeCodebase),
            ("Find duplicate code in src", Pattern::FindDuplicates),
            ("Identify unused functions in the code", Pattern::FindDeadCode),
            ("Group code by feature", Pattern::OrganizeCode),
            ("Create a quiz about photosynthesis for 6th grade with 10 questions", Pattern::GenerateQuiz),
            ("Teach me about fractions", Pattern::CreateLearning),
            ("Review the code in utils", Pattern::AnalyzeCodebase),
            ("What was I working on yesterday", Pattern::ProjectStatus),
            ("Tidy things up", Pattern::CodeCleanup),
            ("Refactor the parser", Pattern::RefactorCode),
            ("Rate this video for accuracy", Pattern::AssessQuality),
            ("Extract the transcript", Pattern::ExtractContent),
            ("Write a readme", Pattern::GenerateDocs),
            ("Research volcanoes", Pattern::ResearchTopic),
            ("Find me something interesting", Pattern::ResearchTopic),
            ("Make coffee", Pattern::Custom),
        ];
        for (text, expected) in cases {
            assert_eq!(classify(text), expected, "text: {text}");
        }
    }

    #[test]
    fn test_specific_find_beats_generic_find() {
        assert_eq!(classify("find duplicate code"), Pattern::FindDuplicates);
        assert_eq!(classify("find unused code"), Pattern::FindDeadCode);
        assert_eq!(classify("find papers on bees"), Pattern::ResearchTopic);
    }

    #[test]
    fn test_quiz_shadows_learning() {
        // "questions" alone would be learning; "quiz" sits higher.
        assert_eq!(classify("quiz with questions"), Pattern::GenerateQuiz);
        assert_eq!(classify("questions about cells"), Pattern::CreateLearning);
    }

    #[test]
    fn test_learning_excludes_research() {
        assert_eq!(classify("research and learn about rivers"), Pattern::ResearchTopic);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("FIND DUPLICATE CODE"), Pattern::FindDuplicates);
    }

    #[test]
    fn test_empty_text_is_custom() {
        let explained = PatternClassifier::with_defaults().explain("");
        assert_eq!(explained.pattern, Pattern::Custom);
        assert!(explained.rule.is_none());
    }

    #[test]
    fn test_explain_reports_rule() {
        let explained = PatternClassifier::with_defaults().explain("tidy up");
        assert_eq!(explained.rule.as_deref(), Some("cleanup"));
        assert_eq!(explained.position, Some(8));
    }

    #[test]
    fn test_reordering_changes_result() {
        let mut rules = default_rules();
        let find = rules.pop().unwrap();
        rules.insert(0, find);
        let reordered = PatternClassifier::new(rules);
        assert_eq!(reordered.classify("find duplicate code"), Pattern::ResearchTopic);
    }

    #[test]
    fn test_config_override() {
        let rules = vec![ClassificationRule::new(
            "only",
            Pattern::GenerateDocs,
            Predicate::any(&["anything"]),
        )];
        let c = PatternClassifier::from_config(Some(&rules));
        assert_eq!(c.classify("anything at all"), Pattern::GenerateDocs);
        assert_eq!(c.classify("duplicate code"), Pattern::Custom);
    }
}
