use crate::types::{AuditRecord, GenerationRequest, GenerationResponse, SearchHit};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Lexical search over the corpus snapshot.
pub trait KeywordSearch: Send + Sync {
    fn search(&self, query: &str, limit: usize, threshold: Option<f32>) -> anyhow::Result<Vec<SearchHit>>;
}

/// Similarity search over the corpus snapshot. Scores are in [0, 1].
pub trait VectorSearch: Send + Sync {
    fn search_vec(&self, query: &str, limit: usize, threshold: Option<f32>) -> anyhow::Result<Vec<SearchHit>>;
}

/// The downstream LLM call.
pub trait Generator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> anyhow::Result<GenerationResponse>;
}

/// Best-effort persistence for audit records.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord) -> anyhow::Result<()>;
}
