//! Classification rules: ordered predicate/pattern pairs, stored as data.

use serde::{Deserialize, Serialize};

use super::pattern::Pattern;

/// A keyword predicate over lower-cased text.
///
/// Serialized externally tagged, so a rule table reads naturally in YAML:
///
/// ```yaml
/// - name: quiz
///   pattern: generate_quiz
///   when:
///     any: [quiz, test questions]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Any of the substrings occurs.
    Any(Vec<String>),
    /// Every sub-predicate holds.
    All(Vec<Predicate>),
    /// At least one sub-predicate holds.
    AnyOf(Vec<Predicate>),
    /// The sub-predicate does not hold.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Shorthand for [`Predicate::Any`] from string literals.
    pub fn any(words: &[&str]) -> Self {
        Self::Any(words.iter().map(|w| (*w).to_string()).collect())
    }

    /// Evaluate against text that is already lower-cased. Keywords are
    /// compared case-insensitively.
    pub fn matches(&self, lowered: &str) -> bool {
        match self {
            Self::Any(words) => words.iter().any(|w| lowered.contains(w.to_lowercase().as_str())),
            Self::All(preds) => preds.iter().all(|p| p.matches(lowered)),
            Self::AnyOf(preds) => preds.iter().any(|p| p.matches(lowered)),
            Self::Not(pred) => !pred.matches(lowered),
        }
    }
}

/// One entry in the ordered precedence chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRule {
    /// Stable identifier, reported by explain output.
    pub name: String,
    pub pattern: Pattern,
    pub when: Predicate,
}

impl ClassificationRule {
    pub fn new(name: &str, pattern: Pattern, when: Predicate) -> Self {
        Self {
            name: name.to_string(),
            pattern,
            when,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_combinators() {
        let p = Predicate::All(vec![
            Predicate::any(&["analyze", "review"]),
            Predicate::Not(Box::new(Predicate::any(&["research"]))),
        ]);
        assert!(p.matches("review this"));
        assert!(!p.matches("review research"));
        assert!(!p.matches("nothing here"));
    }

    #[test]
    fn test_rule_yaml_shape() {
        let yaml = "name: quiz\npattern: generate_quiz\nwhen:\n  any: [quiz, test questions]\n";
        let rule: ClassificationRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rule.pattern, Pattern::GenerateQuiz);
        assert!(rule.when.matches("make test questions"));
    }

    #[test]
    fn test_mixed_case_keywords_match() {
        let yaml = "name: quiz\npattern: generate_quiz\nwhen:\n  any: [Quiz, Test Questions]\n";
        let rule: ClassificationRule = serde_yaml::from_str(yaml).unwrap();
        assert!(rule.when.matches("make a quiz about rivers"));
        assert!(rule.when.matches("write test questions"));
        assert!(!rule.when.matches("write a poem"));
    }
}
