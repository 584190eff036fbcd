use std::sync::Arc;

use anyhow::{bail, Result};
use indicatif::ProgressBar;
use tracing::{debug, info};

use clinrag_core::traits::{Embedder, VectorSearch};
use clinrag_core::types::{SearchHit, SourceKind};
use clinrag_core::Corpus;
use clinrag_embed::cosine;

const EMBED_BATCH: usize = 256;

pub struct VectorIndex {
    corpus: Arc<Corpus>,
    embedder: Arc<dyn Embedder>,
    /// One vector per corpus chunk, same order as `corpus.chunks()`.
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    pub fn build(corpus: Arc<Corpus>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        Self::build_with_progress(corpus, embedder, None)
    }

    /// Embed every chunk in batches, ticking `progress` once per chunk.
    pub fn build_with_progress(corpus: Arc<Corpus>, embedder: Arc<dyn Embedder>, progress: Option<&ProgressBar>) -> Result<Self> {
        let dim = embedder.dim();
        let mut vectors = Vec::with_capacity(corpus.len());
        for batch in corpus.chunks().chunks(EMBED_BATCH) {
            let texts: Vec<String> = batch.iter().map(|c| c.search_text()).collect();
            let embeddings = embedder.embed_batch(&texts)?;
            if embeddings.len() != texts.len() {
                bail!("embedder returned {} vectors for {} texts", embeddings.len(), texts.len());
            }
            if let Some(bad) = embeddings.iter().find(|e| e.len() != dim) {
                bail!("embedder returned a {}-dim vector, expected {dim}", bad.len());
            }
            vectors.extend(embeddings);
            if let Some(pb) = progress {
                pb.inc(batch.len() as u64);
            }
        }
        info!(chunks = vectors.len(), dim, "vector index built");
        Ok(Self { corpus, embedder, vectors })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl VectorSearch for VectorIndex {
    fn search_vec(&self, query: &str, limit: usize, threshold: Option<f32>) -> Result<Vec<SearchHit>> {
        if limit == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let q = self.embedder.embed_batch(&[query.to_string()])?.into_iter().next().unwrap_or_default();
        if q.len() != self.embedder.dim() {
            bail!("query vector has {} dims, expected {}", q.len(), self.embedder.dim());
        }
        if q.iter().all(|x| *x == 0.0) {
            debug!("query has no embeddable terms");
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, similarity(&q, v)))
            .filter(|(_, s)| threshold.map_or(true, |t| *s >= t))
            .collect();
        // Stable: equal scores keep corpus order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);

        let chunks = self.corpus.chunks();
        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchHit { chunk: Arc::clone(&chunks[i]), score, source: SourceKind::Vector })
            .collect())
    }
}

fn similarity(q: &[f32], v: &[f32]) -> f32 {
    let s = cosine(q, v);
    if s.is_nan() { 0.0 } else { s.clamp(0.0, 1.0) }
}
