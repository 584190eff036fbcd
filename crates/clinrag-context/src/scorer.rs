use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::{debug, warn};

use clinrag_core::config::ScoringSettings;
use clinrag_core::error::Error;
use clinrag_core::text::term_set;
use clinrag_core::types::{KnowledgeChunk, ScoredChunk};
use clinrag_hybrid::Candidate;

/// Ranked candidates plus the ones that could not be scored.
#[derive(Debug, Default)]
pub struct ScoreReport {
    pub ranked: Vec<ScoredChunk>,
    /// One `Error::MalformedChunk` per excluded candidate.
    pub rejected: Vec<Error>,
}

/// Composite relevance:
///
/// `keyword_weight * keyword + vector_weight * vector + boost` when a vector
/// score exists, `keyword_only_weight * keyword + boost` otherwise.
///
/// Ties: boosted first, then lower `chunk_index`, then input order.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    settings: ScoringSettings,
}

impl RelevanceScorer {
    pub fn new(settings: ScoringSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ScoringSettings {
        &self.settings
    }

    pub fn score(&self, candidates: &[Candidate], query: &str) -> ScoreReport {
        let query_terms = term_set(query);
        let mut rejected = Vec::new();
        let mut ranked: Vec<(usize, ScoredChunk)> = Vec::with_capacity(candidates.len());

        for (position, candidate) in candidates.iter().enumerate() {
            let chunk = &candidate.chunk;
            if let Some(reason) = chunk.malformed_reason() {
                warn!(id = %chunk.id, reason, "excluding malformed chunk from scoring");
                rejected.push(Error::MalformedChunk { id: chunk.id.clone(), reason });
                continue;
            }
            let keyword_score = keyword_score(&query_terms, chunk);
            let vector_score = candidate.vector_score.map(|v| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) });
            let question_boost = chunk
                .question
                .as_deref()
                .is_some_and(|q| question_similarity(&query_terms, q) >= self.settings.question_similarity);
            let composite_score = self.composite(keyword_score, vector_score, question_boost);
            ranked.push((
                position,
                ScoredChunk {
                    chunk: chunk.clone(),
                    keyword_score,
                    vector_score,
                    question_boost,
                    composite_score,
                    included: false,
                    drop_reason: None,
                },
            ));
        }

        ranked.sort_by(|(pa, a), (pb, b)| rank_order(a, b).then(pa.cmp(pb)));
        debug!(ranked = ranked.len(), rejected = rejected.len(), "candidates scored");
        ScoreReport { ranked: ranked.into_iter().map(|(_, s)| s).collect(), rejected }
    }

    fn composite(&self, keyword: f32, vector: Option<f32>, boosted: bool) -> f32 {
        let s = &self.settings;
        let base = match vector {
            Some(v) => s.keyword_weight * keyword + s.vector_weight * v,
            None => s.keyword_only_weight * keyword,
        };
        if boosted {
            base + s.question_boost
        } else {
            base
        }
    }
}

fn rank_order(a: &ScoredChunk, b: &ScoredChunk) -> Ordering {
    b.composite_score
        .total_cmp(&a.composite_score)
        .then(b.question_boost.cmp(&a.question_boost))
        .then(a.chunk.chunk_index.cmp(&b.chunk.chunk_index))
}

/// Share of query terms present anywhere in the chunk, in [0, 1].
pub fn keyword_score(query_terms: &BTreeSet<String>, chunk: &KnowledgeChunk) -> f32 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let chunk_terms = term_set(&chunk.search_text());
    ratio(query_terms.intersection(&chunk_terms).count(), query_terms.len())
}

/// Overlap of the query with a stored question, relative to the longer of the two.
pub fn question_similarity(query_terms: &BTreeSet<String>, question: &str) -> f32 {
    let question_terms = term_set(question);
    let longest = query_terms.len().max(question_terms.len());
    if longest == 0 {
        return 0.0;
    }
    ratio(query_terms.intersection(&question_terms).count(), longest)
}

#[allow(clippy::cast_precision_loss)]
fn ratio(hits: usize, total: usize) -> f32 {
    hits as f32 / total as f32
}
