//! clinrag-hybrid
//!
//! Chunk store accessor: fans a query out to the keyword and vector backends
//! concurrently, bounds each with a timeout, and merges the hits into one
//! candidate list. A backend that fails or times out is reported in
//! [`CandidateSet::failures`] and the other backend's hits are used alone.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{join, OptionFuture};
use tracing::{debug, warn};

use clinrag_core::config::SearchSettings;
use clinrag_core::error::Error;
use clinrag_core::traits::{KeywordSearch, VectorSearch};
use clinrag_core::types::{KnowledgeChunk, SearchHit};

/// One merged candidate. `vector_score` is `None` when no vector backend answered.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub chunk: Arc<KnowledgeChunk>,
    pub vector_score: Option<f32>,
}

#[derive(Debug, Default)]
pub struct CandidateSet {
    /// Keyword hits in backend order, then vector-only hits in backend order.
    pub candidates: Vec<Candidate>,
    pub failures: Vec<Error>,
    /// True when a vector backend ran and answered for this query.
    pub vector_available: bool,
}

impl CandidateSet {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}

pub struct HybridChunkStore {
    keyword: Option<Arc<dyn KeywordSearch>>,
    vector: Option<Arc<dyn VectorSearch>>,
    settings: SearchSettings,
}

impl HybridChunkStore {
    pub fn new(keyword: Option<Arc<dyn KeywordSearch>>, vector: Option<Arc<dyn VectorSearch>>, settings: SearchSettings) -> Self {
        let vector = if settings.enable_vector { vector } else { None };
        Self { keyword, vector, settings }
    }

    pub fn has_vector(&self) -> bool {
        self.vector.is_some()
    }

    /// Never fails: every backend error becomes an entry in `failures`.
    pub async fn fetch(&self, query: &str) -> CandidateSet {
        let limit = self.settings.limit;
        let timeout = Duration::from_millis(self.settings.timeout_ms);

        let keyword = self.keyword.clone().map(|backend| {
            let q = query.to_string();
            let threshold = self.settings.keyword_threshold;
            run_backend("keyword", timeout, move || backend.search(&q, limit, threshold))
        });
        let vector = self.vector.clone().map(|backend| {
            let q = query.to_string();
            let threshold = self.settings.vector_threshold;
            run_backend("vector", timeout, move || backend.search_vec(&q, limit, threshold))
        });
        let (keyword, vector) = join(OptionFuture::from(keyword), OptionFuture::from(vector)).await;

        let mut failures = Vec::new();
        let keyword_hits = settle(keyword, &mut failures);
        let vector_available = matches!(vector, Some(Ok(_)));
        let vector_hits = settle(vector, &mut failures);

        let candidates = merge(keyword_hits, vector_hits, vector_available);
        debug!(candidates = candidates.len(), failures = failures.len(), vector_available, "candidate set fetched");
        CandidateSet { candidates, failures, vector_available }
    }
}

async fn run_backend<F>(backend: &'static str, timeout: Duration, search: F) -> Result<Vec<SearchHit>, Error>
where
    F: FnOnce() -> anyhow::Result<Vec<SearchHit>> + Send + 'static,
{
    #[allow(clippy::cast_possible_truncation)]
    let millis = timeout.as_millis() as u64;
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(search)).await {
        Err(_) => Err(Error::SearchTimeout { backend, millis }),
        Ok(Err(join_err)) => Err(Error::SearchUnavailable { backend, message: join_err.to_string() }),
        Ok(Ok(Err(e))) => Err(Error::SearchUnavailable { backend, message: format!("{e:#}") }),
        Ok(Ok(Ok(hits))) => Ok(hits),
    }
}

fn settle(outcome: Option<Result<Vec<SearchHit>, Error>>, failures: &mut Vec<Error>) -> Vec<SearchHit> {
    match outcome {
        Some(Ok(hits)) => hits,
        Some(Err(e)) => {
            warn!(error = %e, "search backend degraded");
            failures.push(e);
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// Dedup by chunk id. When the vector backend answered, chunks it did not
/// return get a vector score of 0.
fn merge(keyword_hits: Vec<SearchHit>, vector_hits: Vec<SearchHit>, vector_available: bool) -> Vec<Candidate> {
    let mut vector_scores: HashMap<String, f32> = HashMap::new();
    for h in &vector_hits {
        vector_scores
            .entry(h.chunk.id.clone())
            .and_modify(|s| *s = s.max(h.score))
            .or_insert(h.score);
    }
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(keyword_hits.len() + vector_hits.len());
    for h in keyword_hits.into_iter().chain(vector_hits) {
        if !seen.insert(h.chunk.id.clone()) {
            continue;
        }
        let vector_score = if vector_available { Some(vector_scores.get(&h.chunk.id).copied().unwrap_or(0.0)) } else { None };
        out.push(Candidate { chunk: h.chunk, vector_score });
    }
    out
}
