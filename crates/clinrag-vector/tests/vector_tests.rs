use std::sync::Arc;

use indicatif::ProgressBar;

use clinrag_core::traits::{Embedder, VectorSearch};
use clinrag_core::types::{KnowledgeChunk, SourceKind};
use clinrag_core::Corpus;
use clinrag_embed::HashingEmbedder;
use clinrag_vector::VectorIndex;

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

fn corpus() -> Arc<Corpus> {
    Arc::new(Corpus::from_chunks(vec![
        chunk("li4", 0, "LI4 Hegu relieves headache and facial pain."),
        chunk("st36", 1, "ST36 Zusanli tonifies qi and strengthens digestion."),
        chunk("dup", 2, "LI4 Hegu relieves headache and facial pain."),
    ]))
}

fn embedder() -> Arc<dyn Embedder> {
    Arc::new(HashingEmbedder::new(256).expect("embedder"))
}

#[test]
fn ranks_by_cosine_with_scores_in_unit_range() {
    let idx = VectorIndex::build(corpus(), embedder()).expect("build");
    assert_eq!(idx.len(), 3);
    let hits = idx.search_vec("headache pain", 10, None).expect("search");
    assert!(!hits.is_empty());
    assert_eq!(hits[0].chunk.id, "li4", "ties keep corpus order");
    assert_eq!(hits[1].chunk.id, "dup");
    assert!((hits[0].score - hits[1].score).abs() < 1e-6);
    for h in &hits {
        assert_eq!(h.source, SourceKind::Vector);
        assert!((0.0..=1.0).contains(&h.score));
    }
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn threshold_and_limit_apply() {
    let idx = VectorIndex::build(corpus(), embedder()).expect("build");
    assert_eq!(idx.search_vec("headache pain", 1, None).expect("search").len(), 1);
    assert!(idx.search_vec("headache pain", 10, Some(1.5)).expect("search").is_empty());
    assert!(idx.search_vec("headache", 0, None).expect("search").is_empty());
}

#[test]
fn blank_or_stopword_query_returns_nothing() {
    let idx = VectorIndex::build(corpus(), embedder()).expect("build");
    assert!(idx.search_vec("   ", 10, None).expect("search").is_empty());
    assert!(idx.search_vec("the of and", 10, None).expect("search").is_empty());
}

#[test]
fn progress_ticks_once_per_chunk() {
    let pb = ProgressBar::hidden();
    VectorIndex::build_with_progress(corpus(), embedder(), Some(&pb)).expect("build");
    assert_eq!(pb.position(), 3);
}

struct WrongDim;

impl Embedder for WrongDim {
    fn dim(&self) -> usize {
        8
    }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0; 4]).collect())
    }
}

#[test]
fn embedder_dimension_mismatch_is_an_error() {
    assert!(VectorIndex::build(corpus(), Arc::new(WrongDim)).is_err());
}
