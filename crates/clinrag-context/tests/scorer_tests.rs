use std::sync::Arc;

use clinrag_context::RelevanceScorer;
use clinrag_core::config::ScoringSettings;
use clinrag_core::error::Error;
use clinrag_core::types::KnowledgeChunk;
use clinrag_hybrid::Candidate;

fn chunk(id: &str, index: u32, content: &str) -> KnowledgeChunk {
    KnowledgeChunk {
        id: id.to_string(),
        document_id: format!("doc-{id}"),
        chunk_index: index,
        content: content.to_string(),
        question: None,
        answer: None,
        source_file_name: "QA_Professional.csv".to_string(),
        category: "general".to_string(),
        confidence: Default::default(),
    }
}

fn qa(id: &str, index: u32, question: &str, answer: &str) -> KnowledgeChunk {
    let mut c = chunk(id, index, "");
    c.question = Some(question.to_string());
    c.answer = Some(answer.to_string());
    c
}

fn candidate(c: KnowledgeChunk, vector_score: Option<f32>) -> Candidate {
    Candidate { chunk: Arc::new(c), vector_score }
}

fn ids(report: &clinrag_context::ScoreReport) -> Vec<&str> {
    report.ranked.iter().map(|s| s.chunk.id.as_str()).collect()
}

#[test]
fn keyword_only_scores_are_overlap_ratios() {
    let scorer = RelevanceScorer::new(ScoringSettings::default());
    let report = scorer.score(
        &[
            candidate(chunk("half", 0, "Chronic headache responds to needling."), None),
            candidate(chunk("full", 1, "LI4 relieves headache."), None),
            candidate(chunk("none", 2, "SP6 nourishes yin."), None),
        ],
        "LI4 headache",
    );
    assert_eq!(ids(&report), vec!["full", "half", "none"]);
    let scores: Vec<f32> = report.ranked.iter().map(|s| s.composite_score).collect();
    assert_eq!(scores, vec![1.0, 0.5, 0.0]);
    assert!(report.ranked.iter().all(|s| s.vector_score.is_none() && !s.included && s.drop_reason.is_none()));
}

#[test]
fn vector_signal_is_blended_half_and_half() {
    let scorer = RelevanceScorer::new(ScoringSettings::default());
    let report = scorer.score(&[candidate(chunk("a", 0, "LI4 relieves headache."), Some(0.6))], "LI4 headache");
    let s = &report.ranked[0];
    assert_eq!(s.keyword_score, 1.0);
    assert_eq!(s.vector_score, Some(0.6));
    assert!((s.composite_score - 0.8).abs() < 1e-6);
}

#[test]
fn matching_question_earns_the_boost() {
    let scorer = RelevanceScorer::new(ScoringSettings::default());
    let report = scorer.score(
        &[
            candidate(chunk("topic", 0, "Headache points include LI4, GB20 and Taiyang."), None),
            candidate(qa("literal", 7, "Which point relieves headache?", "LI4 Hegu."), None),
        ],
        "which point relieves headache",
    );
    assert_eq!(ids(&report), vec!["literal", "topic"]);
    assert!(report.ranked[0].question_boost);
    assert!((report.ranked[0].composite_score - 1.25).abs() < 1e-6);
    assert!(!report.ranked[1].question_boost);
}

#[test]
fn equal_scores_put_the_boosted_chunk_first() {
    let scorer = RelevanceScorer::new(ScoringSettings::default());
    // 0.5 * 1.0 + 0.5 * 0.5 == 0.5 * 1.0 + 0.5 * 0.0 + 0.25
    let report = scorer.score(
        &[
            candidate(chunk("plain", 0, "headache remedy point overview"), Some(0.5)),
            candidate(qa("boosted", 9, "Headache remedy point?", "See entry."), Some(0.0)),
        ],
        "headache remedy point",
    );
    assert_eq!(report.ranked[0].composite_score, report.ranked[1].composite_score);
    assert_eq!(ids(&report), vec!["boosted", "plain"]);
}

#[test]
fn equal_scores_then_lower_chunk_index_then_input_order() {
    let scorer = RelevanceScorer::new(ScoringSettings::default());
    let report = scorer.score(
        &[
            candidate(chunk("late", 4, "LI4 headache"), None),
            candidate(chunk("first-input", 1, "LI4 headache"), None),
            candidate(chunk("second-input", 1, "LI4 headache"), None),
        ],
        "LI4 headache",
    );
    assert_eq!(ids(&report), vec!["first-input", "second-input", "late"]);
}

#[test]
fn malformed_chunks_are_rejected_not_ranked() {
    let scorer = RelevanceScorer::new(ScoringSettings::default());
    let mut half_qa = chunk("half", 1, "");
    half_qa.question = Some("Where is ST36?".into());
    let report = scorer.score(
        &[candidate(chunk("ok", 0, "ST36 below the knee"), None), candidate(half_qa, None), candidate(chunk("blank", 2, " "), None)],
        "ST36",
    );
    assert_eq!(ids(&report), vec!["ok"]);
    assert_eq!(report.rejected.len(), 2);
    assert!(matches!(&report.rejected[0], Error::MalformedChunk { id, .. } if id == "half"));
}

#[test]
fn no_candidates_or_empty_query() {
    let scorer = RelevanceScorer::new(ScoringSettings::default());
    let empty = scorer.score(&[], "headache");
    assert!(empty.ranked.is_empty() && empty.rejected.is_empty());

    let report = scorer.score(&[candidate(chunk("a", 0, "LI4 headache"), None)], "the of");
    assert_eq!(report.ranked[0].keyword_score, 0.0);
    assert!(!report.ranked[0].question_boost);
}
