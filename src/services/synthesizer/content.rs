//! Content and learning-material fusions.

use std::collections::BTreeMap;

use crate::domain::models::{
    ExecutorOutput, QualityAssessment, QuizResult, SearchResults, SectionPriority,
    HIGH_QUALITY_SCORE,
};

use super::{clip, find_ok, generic, title_case, Draft};

/// Overall quality below this needs improvement.
const QUALITY_NEEDS_WORK: f64 = 60.0;
/// A dimension below this is called out individually.
const DIMENSION_WEAK: f64 = 50.0;

pub fn research(outputs: &[ExecutorOutput]) -> Draft {
    let mut draft = Draft::new("Content Research Report");

    let search = find_ok(outputs, "omnisearch").map(|o| SearchResults::from_payload(&o.result));
    let sources = find_ok(outputs, "omnisearch")
        .map(|o| o.result.strings("sources"))
        .unwrap_or_default();
    let quality = find_ok(outputs, "quality-assessor").map(|o| QualityAssessment::from_payload(&o.result));

    let total = search.as_ref().map_or(0, |s| s.results.len());
    let high = quality.as_ref().map_or(0, QualityAssessment::high_quality_count);
    draft.summary = format!("Research complete. Found {total} sources, {high} high-quality.");

    if let Some(s) = &search {
        draft.section("Search Results", "SRC", search_section(s, &sources), SectionPriority::High);
    }
    if let Some(q) = &quality {
        draft.section("Quality Assessment", "QUA", assessment_section(q), SectionPriority::High);
        if high > 0 {
            draft.recommend(format!(
                "HIGH: {high} high-quality sources identified for immediate use"
            ));
        }
        if total > high {
            draft.recommend(format!(
                "LOW: {} sources need verification before use",
                total - high
            ));
        }
    }
    if let (Some(s), Some(q)) = (&search, &quality) {
        draft.section("Ranked Recommendations", "TOP", ranked_section(s, q), SectionPriority::High);
    }

    draft.surface_failures(outputs);
    draft
}

pub fn quality(outputs: &[ExecutorOutput]) -> Draft {
    let mut draft = Draft::new("Content Quality Assessment");

    match find_ok(outputs, "quality-assessor").map(|o| QualityAssessment::from_payload(&o.result)) {
        Some(q) => {
            let overall = q.overall_score.unwrap_or_else(|| average(&q));
            draft.summary = format!("Content Quality Score: {overall:.1}/100");

            if !q.dimension_scores.is_empty() {
                let lines = q
                    .dimension_scores
                    .iter()
                    .map(|(dim, score)| {
                        let status = if *score >= 80.0 {
                            "EXCELLENT"
                        } else if *score >= 60.0 {
                            "GOOD"
                        } else {
                            "NEEDS WORK"
                        };
                        format!("{}: {score:.1}/100 ({status})", title_case(dim))
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                draft.section("Quality Dimensions", "QA", lines, SectionPriority::High);
            }

            if overall < QUALITY_NEEDS_WORK {
                draft.recommend("HIGH: Content quality needs improvement");
            }
            for (dim, score) in q.dimension_scores.iter().filter(|(_, s)| *s < DIMENSION_WEAK) {
                draft.recommend(format!("MEDIUM: Improve {dim} (currently {score:.0}/100)"));
            }
            for rec in &q.recommendations {
                draft.recommend(format!("LOW: {rec}"));
            }
        }
        None => {
            draft.summary = "Quality assessment could not be completed".to_string();
            draft.recommend("HIGH: Re-run quality assessment with valid content");
        }
    }

    for output in outputs
        .iter()
        .filter(|o| o.success && o.base_name() != "quality-assessor")
    {
        draft.section(
            output.executor.clone(),
            "OK",
            generic::format_output(output),
            SectionPriority::Medium,
        );
    }
    draft.surface_failures(outputs);
    draft
}

pub fn extraction(outputs: &[ExecutorOutput]) -> Draft {
    let mut draft = Draft::new("Content Extraction Report");
    let mut total_items = 0;

    for output in outputs {
        if output.success {
            let r = &output.result;
            total_items += r.u64_or("items_extracted", r.u64_or("results_count", 1));

            let mut lines = Vec::new();
            if let Some(title) = r.str_opt("title") {
                lines.push(format!("Title: {title}"));
            }
            if let Some(source) = r.str_opt("source") {
                lines.push(format!("Source: {source}"));
            }
            if let Some(duration) = r.str_opt("duration") {
                lines.push(format!("Duration: {duration}"));
            }
            if let Some(len) = r.str_opt("transcript_length") {
                lines.push(format!("Transcript: {len} chars"));
            }
            let content = if lines.is_empty() {
                "Content extracted".to_string()
            } else {
                lines.join("\n")
            };
            draft.section(
                format!("Extracted: {}", output.executor),
                "EXT",
                content,
                SectionPriority::Medium,
            );
        } else {
            draft.recommend(format!("HIGH: {} extraction failed", output.executor));
        }
    }

    draft.summary = format!("Content extraction complete: {total_items} item(s) extracted");
    draft.surface_failures(outputs);
    draft
}

pub fn documentation(outputs: &[ExecutorOutput]) -> Draft {
    let mut draft = Draft::new("Documentation Generation Report");
    let mut generated = 0;

    for output in outputs.iter().filter(|o| o.success) {
        let r = &output.result;
        generated += r.u64_or("docs_generated", 1);

        let mut lines = Vec::new();
        if let Some(path) = r.str_opt("output_path") {
            lines.push(format!("Output: {path}"));
        }
        if let Some(format) = r.str_opt("format") {
            lines.push(format!("Format: {format}"));
        }
        if r.contains_key("sections") {
            lines.push(format!("Sections: {}", r.count_or("sections", 0)));
        }
        if let Some(words) = r.str_opt("word_count") {
            lines.push(format!("Word count: {words}"));
        }
        let content = if lines.is_empty() {
            "Documentation generated successfully".to_string()
        } else {
            lines.join("\n")
        };
        draft.section(
            format!("Generated: {}", output.executor),
            "DOC",
            content,
            SectionPriority::Medium,
        );
    }

    draft.summary = format!("Documentation generated: {generated} document(s)");
    if generated == 0 {
        draft.recommend("HIGH: No documentation was generated - check inputs");
    }
    draft.surface_failures(outputs);
    draft
}

pub fn learning(outputs: &[ExecutorOutput]) -> Draft {
    let mut draft = Draft::new("Learning Materials Report");

    let extract = find_ok(outputs, "content-extractor");
    let modules = find_ok(outputs, "module-generator");
    let quiz = find_ok(outputs, "quiz-generator").map(|o| QuizResult::from_payload(&o.result));

    let items = extract.map_or(0, |o| o.result.u64_or("items_extracted", 0));
    let modules_created = modules.map_or(0, |o| o.result.u64_or("modules_created", 0));
    let questions = quiz.as_ref().map_or(0, |q| q.questions_generated);

    draft.summary = format!(
        "Learning materials ready. {items} content items extracted, {modules_created} modules created, {questions} quiz questions generated."
    );

    if let Some(o) = extract {
        let mut lines = vec![
            format!("Items extracted: {items}"),
            format!("Source type: {}", o.result.str_or("source_type", "unknown")),
            format!("Total duration: {}", o.result.str_or("total_duration", "N/A")),
        ];
        let topics = o.result.strings("topics");
        if !topics.is_empty() {
            lines.push(String::new());
            lines.push("Topics identified:".to_string());
            lines.extend(topics.iter().take(5).map(|t| format!("  - {t}")));
        }
        draft.section("Content Extraction", "EXT", lines.join("\n"), SectionPriority::High);
    }
    if let Some(o) = modules {
        let mut lines = vec![format!("Modules created: {modules_created}")];
        let listed = o.result.strings("modules");
        if !listed.is_empty() {
            lines.push(String::new());
            lines.push("Generated modules:".to_string());
            lines.extend(listed.iter().take(5).map(|m| format!("  - {m}")));
        }
        draft.section("Generated Modules", "MOD", lines.join("\n"), SectionPriority::High);
    }
    if let Some(q) = &quiz {
        draft.section("Quiz Questions", "QIZ", quiz_overview(q), SectionPriority::Medium);
    }

    if modules_created > 0 {
        draft.recommend(format!(
            "HIGH: {modules_created} modules ready for review and deployment"
        ));
    }
    if questions > 0 {
        draft.recommend(format!(
            "MEDIUM: Review {questions} generated questions for accuracy"
        ));
    }
    draft.surface_failures(outputs);
    draft
}

pub fn quiz(outputs: &[ExecutorOutput]) -> Draft {
    let mut draft = Draft::new("Quiz Generation Report");

    match find_ok(outputs, "quiz-generator").map(|o| QuizResult::from_payload(&o.result)) {
        Some(q) => {
            draft.summary = format!("Generated {} quiz question(s)", q.questions.len());
            if let Some(topic) = &q.topic {
                draft.summary.push_str(&format!(" about {topic}"));
            }

            if !q.questions.is_empty() {
                let mut lines: Vec<String> = q
                    .questions
                    .iter()
                    .take(5)
                    .enumerate()
                    .map(|(i, question)| {
                        format!(
                            "{}. [{}] [{}] {}...",
                            i + 1,
                            question.kind.as_deref().unwrap_or("unknown"),
                            question.difficulty.as_deref().unwrap_or("medium"),
                            clip(&question.question, 60)
                        )
                    })
                    .collect();
                if q.questions.len() > 5 {
                    lines.push(format!("... and {} more questions", q.questions.len() - 5));
                }
                draft.section("Generated Questions", "Q", lines.join("\n"), SectionPriority::High);
            }

            let mut standards: Vec<&str> = q.questions.iter().filter_map(|q| q.teks.as_deref()).collect();
            standards.sort_unstable();
            standards.dedup();
            if !standards.is_empty() {
                draft.section(
                    "TEKS Alignment",
                    "TEKS",
                    format!("Standards covered: {}", standards.join(", ")),
                    SectionPriority::Medium,
                );
            }

            let difficulty = difficulty_counts(&q);
            if !difficulty.is_empty() {
                let lines = difficulty
                    .iter()
                    .map(|(d, c)| format!("{d}: {c}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                draft.section("Difficulty Distribution", "D", lines, SectionPriority::Low);
            }
        }
        None => {
            draft.summary = "Quiz generation failed or incomplete".to_string();
            draft.recommend("HIGH: Review quiz generation input and try again");
        }
    }
    draft.surface_failures(outputs);
    draft
}

fn average(q: &QualityAssessment) -> f64 {
    if q.assessments.is_empty() {
        return 0.0;
    }
    q.assessments.iter().map(|a| a.score).sum::<f64>() / q.assessments.len() as f64
}

fn difficulty_counts(q: &QuizResult) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for question in &q.questions {
        *counts
            .entry(question.difficulty.as_deref().unwrap_or("medium"))
            .or_insert(0) += 1;
    }
    counts
}

fn quiz_overview(q: &QuizResult) -> String {
    let mut lines = vec![format!("Questions generated: {}", q.questions_generated)];
    if !q.questions.is_empty() {
        lines.push(String::new());
        lines.push("Sample questions:".to_string());
        for (i, question) in q.questions.iter().take(3).enumerate() {
            lines.push(format!(
                "  {}. [{}] [{}] {}...",
                i + 1,
                question.kind.as_deref().unwrap_or("unknown"),
                question.difficulty.as_deref().unwrap_or("medium"),
                clip(&question.question, 80)
            ));
        }
        if q.questions.len() > 3 {
            lines.push(format!("  ... and {} more questions", q.questions.len() - 3));
        }

        let mut kinds: BTreeMap<&str, usize> = BTreeMap::new();
        for question in &q.questions {
            *kinds.entry(question.kind.as_deref().unwrap_or("unknown")).or_insert(0) += 1;
        }
        lines.push(String::new());
        lines.push("Question types:".to_string());
        lines.extend(kinds.iter().map(|(k, c)| format!("  - {k}: {c}")));

        lines.push(String::new());
        lines.push("Difficulty distribution:".to_string());
        lines.extend(difficulty_counts(q).iter().map(|(d, c)| format!("  - {d}: {c}")));
    }
    lines.join("\n")
}

fn search_section(s: &SearchResults, sources: &[String]) -> String {
    let sources = if sources.is_empty() {
        "unknown".to_string()
    } else {
        sources.join(", ")
    };
    let mut lines = vec![
        format!("Total results: {}", s.results.len()),
        format!("Sources searched: {sources}"),
    ];
    if !s.results.is_empty() {
        lines.push(String::new());
        lines.push("Top results:".to_string());
        for (i, hit) in s.results.iter().take(10).enumerate() {
            lines.push(format!("  {}. [{}] {}", i + 1, hit.source, clip(&hit.title, 50)));
            if !hit.url.is_empty() {
                lines.push(format!("     {}", clip(&hit.url, 60)));
            }
        }
    }
    lines.join("\n")
}

fn assessment_section(q: &QualityAssessment) -> String {
    if q.assessments.is_empty() {
        return "No items assessed".to_string();
    }
    let tier = |lo: f64, hi: f64| q.assessments.iter().filter(|a| a.score >= lo && a.score < hi).count();
    [
        format!("Average quality score: {:.1}/100", average(q)),
        format!("Items assessed: {}", q.assessments.len()),
        String::new(),
        "Quality breakdown:".to_string(),
        format!("  High (80+):   {}", tier(HIGH_QUALITY_SCORE, f64::INFINITY)),
        format!("  Medium (50-79): {}", tier(50.0, HIGH_QUALITY_SCORE)),
        format!("  Low (<50):    {}", tier(f64::NEG_INFINITY, 50.0)),
    ]
    .join("\n")
}

fn ranked_section(s: &SearchResults, q: &QualityAssessment) -> String {
    let mut ranked: Vec<(f64, &str)> = s
        .results
        .iter()
        .map(|hit| (q.score_for(&hit.id).unwrap_or(50.0), hit.title.as_str()))
        .collect();
    // Stable, so equal scores keep search order.
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut lines = vec!["Top recommended sources (by quality):".to_string()];
    for (i, (score, title)) in ranked.iter().take(5).enumerate() {
        lines.push(format!("  {}. [{score}/100] {}", i + 1, clip(title, 45)));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Payload;
    use serde_json::json;

    fn ok(executor: &str, result: serde_json::Value) -> ExecutorOutput {
        ExecutorOutput::succeeded("s", executor, "d", Payload::from_value(result), 10)
    }

    #[test]
    fn test_research_counts_high_quality() {
        let outputs = vec![
            ok(
                "omnisearch",
                json!({"results": [
                    {"id": "a", "title": "Photosynthesis basics"},
                    {"id": "b", "title": "Plant cells"},
                    {"id": "c", "title": "Light reactions"}
                ]}),
            ),
            ok(
                "quality-assessor",
                json!({"assessments": [{"id": "a", "score": 92}, {"id": "c", "score": 81}]}),
            ),
        ];
        let draft = research(&outputs);
        assert_eq!(draft.summary, "Research complete. Found 3 sources, 2 high-quality.");
        assert_eq!(
            draft.recommendations,
            vec![
                "HIGH: 2 high-quality sources identified for immediate use",
                "LOW: 1 sources need verification before use",
            ]
        );
        let ranked = draft.sections.iter().find(|s| s.icon == "TOP").unwrap();
        assert!(ranked.content.contains("1. [92/100] Photosynthesis basics"));
        assert!(ranked.content.contains("3. [50/100] Plant cells"));
    }

    #[test]
    fn test_quality_score_and_weak_dimensions() {
        let outputs = vec![ok(
            "quality-assessor",
            json!({
                "overall_score": 55,
                "dimension_scores": {"accuracy": 40, "engagement": 85},
                "recommendations": ["Add citations"]
            }),
        )];
        let draft = quality(&outputs);
        assert_eq!(draft.summary, "Content Quality Score: 55.0/100");
        assert_eq!(
            draft.recommendations,
            vec![
                "HIGH: Content quality needs improvement",
                "MEDIUM: Improve accuracy (currently 40/100)",
                "LOW: Add citations",
            ]
        );
        assert!(draft.sections[0].content.contains("Engagement: 85.0/100 (EXCELLENT)"));
    }

    #[test]
    fn test_quiz_sections() {
        let outputs = vec![ok(
            "quiz-generator",
            json!({
                "topic": "photosynthesis",
                "questions": [
                    {"question": "What do plants need?", "type": "multiple_choice", "difficulty": "easy", "teks": "7.5A"},
                    {"question": "Where does it happen?", "type": "short_answer", "teks": "7.5A"}
                ]
            }),
        )];
        let draft = quiz(&outputs);
        assert_eq!(draft.summary, "Generated 2 quiz question(s) about photosynthesis");
        let teks = draft.sections.iter().find(|s| s.icon == "TEKS").unwrap();
        assert_eq!(teks.content, "Standards covered: 7.5A");
        let diff = draft.sections.iter().find(|s| s.icon == "D").unwrap();
        assert_eq!(diff.content, "easy: 1\nmedium: 1");
    }

    #[test]
    fn test_documentation_without_outputs_recommends_check() {
        let draft = documentation(&[]);
        assert_eq!(draft.summary, "Documentation generated: 0 document(s)");
        assert_eq!(draft.recommendations, vec!["HIGH: No documentation was generated - check inputs"]);
    }
}
