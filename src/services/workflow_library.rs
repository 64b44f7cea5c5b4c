//! Named, parameterised task templates.
//!
//! A workflow renders to the request text the classifier understands plus a
//! context payload carrying every resolved parameter.

use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Payload, WorkflowParameter, WorkflowTemplate};

/// Clauses removed from a template when their parameter resolves to nothing.
const OPTIONAL_CLAUSES: &[&str] = &[" for {key}th grade", " with {key} depth", " {key}"];

/// Catalogue of workflows, keyed by name.
#[derive(Debug, Clone)]
pub struct WorkflowLibrary {
    workflows: BTreeMap<String, WorkflowTemplate>,
}

impl WorkflowLibrary {
    pub fn new(templates: Vec<WorkflowTemplate>) -> Self {
        Self {
            workflows: templates.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(default_workflows())
    }

    /// Workflow names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.workflows.keys().cloned().collect()
    }

    pub fn list(&self) -> impl Iterator<Item = &WorkflowTemplate> {
        self.workflows.values()
    }

    pub fn get(&self, name: &str) -> DomainResult<&WorkflowTemplate> {
        self.workflows
            .get(name)
            .ok_or_else(|| DomainError::UnknownWorkflow {
                name: name.to_string(),
                available: self.names(),
            })
    }

    /// Render `name` with `params` into request text and context.
    pub fn render(
        &self,
        name: &str,
        params: &BTreeMap<String, String>,
    ) -> DomainResult<(String, Payload)> {
        let workflow = self.get(name)?;

        let missing: Vec<String> = workflow
            .required_parameters()
            .filter(|p| params.get(&p.name).map_or(true, |v| v.trim().is_empty()))
            .map(|p| p.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::MissingParameters {
                workflow: name.to_string(),
                missing,
            });
        }

        let mut resolved: BTreeMap<&str, Option<String>> = workflow
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p.default.clone()))
            .collect();
        for (key, value) in params {
            resolved.insert(key.as_str(), Some(value.clone()));
        }

        let mut text = workflow.template.clone();
        let mut context = Payload::new();
        for (key, value) in &resolved {
            match value {
                Some(value) => {
                    text = text.replace(&format!("{{{key}}}"), value);
                    context.insert(*key, value.clone());
                }
                None => {
                    for clause in OPTIONAL_CLAUSES {
                        text = text.replace(&clause.replace("{key}", &format!("{{{key}}}")), "");
                    }
                }
            }
        }

        debug!(workflow = name, text = %text, "workflow rendered");
        Ok((text, context))
    }
}

impl Default for WorkflowLibrary {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn template(
    name: &str,
    description: &str,
    text: &str,
    parameters: Vec<WorkflowParameter>,
) -> WorkflowTemplate {
    WorkflowTemplate {
        name: name.to_string(),
        description: description.to_string(),
        template: text.to_string(),
        parameters,
    }
}

/// The built-in workflows.
pub fn default_workflows() -> Vec<WorkflowTemplate> {
    use WorkflowParameter as P;

    let path = || P::optional("path", Some("./"));
    vec![
        template(
            "create-quiz",
            "Generate standards-aligned quiz questions",
            "Create a quiz about {topic} for {grade_level}th grade with {question_count} questions",
            vec![
                P::required("topic"),
                P::optional("grade_level", Some("6")),
                P::optional("question_count", Some("4")),
                P::optional("teks_standards", None),
            ],
        ),
        template(
            "analyze-code",
            "Analyze codebase for duplicates, dead code, and organization",
            "Analyze the codebase at {path}",
            vec![path()],
        ),
        template(
            "audit-codebase",
            "Full codebase audit with refactoring recommendations",
            "Audit the codebase at {path}",
            vec![path()],
        ),
        template(
            "research-topic",
            "Research educational content on a topic",
            "Research {topic} for {grade_level}th grade students with {depth} depth",
            vec![
                P::required("topic"),
                P::optional("grade_level", None),
                P::optional("depth", Some("comprehensive")),
            ],
        ),
        template(
            "assess-quality",
            "Assess educational content quality",
            "Assess the quality of content at {content_path}",
            vec![P::required("content_path")],
        ),
        template(
            "find-duplicates",
            "Find duplicate code patterns",
            "Find duplicate code in {path}",
            vec![path(), P::optional("threshold", Some("0.8"))],
        ),
        template(
            "find-dead-code",
            "Identify unused code",
            "Find dead code in {path}",
            vec![path()],
        ),
        template(
            "organize-code",
            "Analyze code organization and structure",
            "Analyze code organization in {path}",
            vec![path()],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Pattern;
    use crate::services::pattern_classifier::PatternClassifier;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_eight_builtin_workflows() {
        let lib = WorkflowLibrary::with_defaults();
        assert_eq!(lib.names().len(), 8);
        assert!(lib.get("create-quiz").is_ok());
    }

    #[test]
    fn test_quiz_with_defaults() {
        let lib = WorkflowLibrary::with_defaults();
        let (text, context) = lib
            .render("create-quiz", &params(&[("topic", "photosynthesis")]))
            .unwrap();
        assert_eq!(text, "Create a quiz about photosynthesis for 6th grade with 4 questions");
        assert_eq!(context.str_or("topic", ""), "photosynthesis");
        assert!(!context.contains_key("teks_standards"));
    }

    #[test]
    fn test_none_clause_removed() {
        let lib = WorkflowLibrary::with_defaults();
        let (text, _) = lib
            .render("research-topic", &params(&[("topic", "volcanoes")]))
            .unwrap();
        assert_eq!(text, "Research volcanoes students with comprehensive depth");
    }

    #[test]
    fn test_explicit_value_overrides_default() {
        let lib = WorkflowLibrary::with_defaults();
        let (text, context) = lib
            .render("find-dead-code", &params(&[("path", "src/")]))
            .unwrap();
        assert_eq!(text, "Find dead code in src/");
        assert_eq!(context.str_or("path", ""), "src/");
    }

    #[test]
    fn test_missing_required() {
        let lib = WorkflowLibrary::with_defaults();
        let err = lib.render("assess-quality", &BTreeMap::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required parameters for assess-quality: content_path"
        );
    }

    #[test]
    fn test_unknown_workflow_lists_available() {
        let lib = WorkflowLibrary::with_defaults();
        let err = lib.render("nope", &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, DomainError::UnknownWorkflow { ref available, .. } if available.len() == 8));
    }

    #[test]
    fn test_rendered_text_classifies_as_intended() {
        let lib = WorkflowLibrary::with_defaults();
        let classifier = PatternClassifier::with_defaults();
        let cases = [
            ("create-quiz", params(&[("topic", "fractions")]), Pattern::GenerateQuiz),
            ("audit-codebase", BTreeMap::new(), Pattern::AnalyzeCodebase),
            ("find-duplicates", BTreeMap::new(), Pattern::FindDuplicates),
            ("find-dead-code", BTreeMap::new(), Pattern::FindDeadCode),
            ("organize-code", BTreeMap::new(), Pattern::OrganizeCode),
        ];
        for (name, p, expected) in cases {
            let (text, _) = lib.render(name, &p).unwrap();
            assert_eq!(classifier.classify(&text), expected, "{name}: {text}");
        }
    }
}
