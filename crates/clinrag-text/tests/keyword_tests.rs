use std::sync::Arc;

use clinrag_core::traits::KeywordSearch;
use clinrag_core::types::{KnowledgeChunk, SourceKind};
use clinrag_core::Corpus;
use clinrag_text::KeywordIndex;

fn chunk(id: &str, index: u32, content: &str) -> KnowledgeChunk {
    KnowledgeChunk {
        id: id.to_string(),
        document_id: "points".to_string(),
        chunk_index: index,
        content: content.to_string(),
        question: None,
        answer: None,
        source_file_name: "tcm_points.csv".to_string(),
        category: "general".to_string(),
        confidence: Default::default(),
    }
}

fn index() -> KeywordIndex {
    let mut qa = chunk("qa", 3, "");
    qa.question = Some("Which point calms the spirit?".into());
    qa.answer = Some("HT7 Shenmen calms the spirit and settles insomnia.".into());
    let corpus = Corpus::from_chunks(vec![
        chunk("li4", 0, "LI4 Hegu relieves headache and facial pain."),
        chunk("st36", 1, "ST36 Zusanli tonifies qi and strengthens digestion."),
        chunk("sp6", 2, "SP6 Sanyinjiao nourishes yin; contraindicated in pregnancy."),
        qa,
    ]);
    KeywordIndex::build(Arc::new(corpus)).expect("index")
}

#[test]
fn finds_chunks_by_code_and_content_words() {
    let idx = index();
    let hits = idx.search("headache relief LI4", 10, None).expect("search");
    assert_eq!(hits.first().map(|h| h.chunk.id.as_str()), Some("li4"));
    assert!(hits.iter().all(|h| h.source == SourceKind::Text));
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn question_and_answer_text_is_searchable() {
    let hits = index().search("insomnia", 10, None).expect("search");
    let ids: Vec<_> = hits.iter().map(|h| h.chunk.id.as_str()).collect();
    assert_eq!(ids, vec!["qa"]);
}

#[test]
fn query_syntax_characters_are_ignored() {
    let hits = index().search("digestion AND (qi OR \"spleen\") -pregnancy:*", 10, None).expect("search");
    assert!(hits.iter().any(|h| h.chunk.id == "st36"));
}

#[test]
fn empty_or_stopword_queries_return_nothing() {
    let idx = index();
    assert!(idx.search("", 10, None).expect("search").is_empty());
    assert!(idx.search("the and of", 10, None).expect("search").is_empty());
    assert!(idx.search("headache", 0, None).expect("search").is_empty());
}

#[test]
fn limit_and_threshold_filter_hits() {
    let idx = index();
    let all = idx.search("qi yin spirit headache", 10, None).expect("search");
    assert!(all.len() >= 3);
    assert_eq!(idx.search("qi yin spirit headache", 2, None).expect("search").len(), 2);
    assert!(idx.search("qi yin spirit headache", 10, Some(f32::MAX)).expect("search").is_empty());
}
