//! Domain types shared by the search backends and the context pipeline.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ChunkId = String;

/// Editorial confidence attached to a corpus entry at ingestion time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

/// One retrievable unit of the proprietary corpus (a Q&A pair or a paragraph).
///
/// - `id`: globally unique chunk identifier
/// - `document_id`: identity of the source document
/// - `chunk_index`: position within the document, unique per document and used for citation
/// - `content`: the text payload; Q&A entries also carry `question`/`answer`
/// - `source_file_name`: the file name shown in citations
///
/// Chunks are immutable once ingested and are shared behind `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeChunk {
    pub id: ChunkId,
    pub document_id: String,
    pub chunk_index: u32,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    pub source_file_name: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub confidence: Confidence,
}

fn default_category() -> String {
    "general".to_string()
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

impl KnowledgeChunk {
    /// Text that represents this chunk in a context block.
    ///
    /// A complete Q&A pair renders as `Q: …\nA: …`; otherwise the raw content.
    /// `None` means the chunk carries nothing usable.
    pub fn body(&self) -> Option<Cow<'_, str>> {
        if let (Some(q), Some(a)) = (non_blank(self.question.as_deref()), non_blank(self.answer.as_deref())) {
            return Some(Cow::Owned(format!("Q: {q}\nA: {a}")));
        }
        non_blank(Some(self.content.as_str())).map(Cow::Borrowed)
    }

    /// Why this chunk cannot be scored, if it cannot.
    pub fn malformed_reason(&self) -> Option<&'static str> {
        if self.body().is_some() {
            return None;
        }
        match (non_blank(self.question.as_deref()), non_blank(self.answer.as_deref())) {
            (Some(_), None) => Some("question without answer and no content"),
            (None, Some(_)) => Some("answer without question and no content"),
            _ => Some("missing content, question and answer"),
        }
    }

    /// Everything a search backend should see: content, question and answer.
    pub fn search_text(&self) -> String {
        [Some(self.content.as_str()), self.question.as_deref(), self.answer.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Short human preview: the question if present, else the content.
    pub fn preview(&self, max_chars: usize) -> String {
        let source = non_blank(self.question.as_deref()).unwrap_or(self.content.trim());
        source.chars().take(max_chars).collect()
    }
}

/// A static alias → canonical code mapping. `alias` is stored lowercase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SynonymEntry {
    pub alias: String,
    pub canonical_code: String,
}

impl SynonymEntry {
    pub fn new(alias: impl AsRef<str>, canonical_code: impl Into<String>) -> Self {
        Self { alias: alias.as_ref().trim().to_lowercase(), canonical_code: canonical_code.into() }
    }
}

/// Indicates which engine produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Vector,
    Text,
}

/// The minimal surface returned by all search backends.
///
/// `score` is engine-specific but higher is always better. For the vector
/// engine it is a cosine similarity clamped into [0, 1].
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk: Arc<KnowledgeChunk>,
    pub score: f32,
    pub source: SourceKind,
}

/// Why a ranked candidate was left out of the context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DropReason {
    #[serde(rename = "budget exceeded")]
    BudgetExceeded,
    #[serde(rename = "source cap")]
    SourceCap,
}

impl DropReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::BudgetExceeded => "budget exceeded",
            DropReason::SourceCap => "source cap",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate chunk with its per-query scores. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Arc<KnowledgeChunk>,
    pub keyword_score: f32,
    pub vector_score: Option<f32>,
    pub question_boost: bool,
    pub composite_score: f32,
    pub included: bool,
    pub drop_reason: Option<DropReason>,
}

impl ScoredChunk {
    /// Copy of this candidate carrying the budgeter's decision.
    pub fn decided(&self, included: bool, drop_reason: Option<DropReason>) -> Self {
        Self { included, drop_reason, ..self.clone() }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenBudget {
    pub used: usize,
    pub max: usize,
    pub percentage: u32,
}

impl TokenBudget {
    pub fn new(used: usize, max: usize) -> Self {
        let percentage = if max == 0 {
            0
        } else {
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let pct = (100.0 * used as f64 / max as f64).round() as u32;
            pct
        };
        Self { used, max, percentage }
    }
}

/// Citation entry for one included chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub file_name: String,
    pub chunk_index: u32,
    pub preview: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChunkCounts {
    pub found: usize,
    pub included: usize,
    pub dropped: usize,
    pub budget_reached: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopChunk {
    pub index: usize,
    pub source_name: String,
    pub score: f32,
    pub question_boost: bool,
    pub included: bool,
    pub reason: String,
}

/// Named thresholds. Annotate debug output only; they never gate inclusion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub clinical_standard: f32,
    pub min_high_confidence: usize,
}

/// Telemetry shape consumed by the audit UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContextDebug {
    pub token_budget: TokenBudget,
    pub chunks: ChunkCounts,
    pub top_chunks: Vec<TopChunk>,
    pub thresholds: Thresholds,
}

/// The prompt context for one query plus its provenance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContextBundle {
    pub text: String,
    pub sources: Vec<SourceRef>,
    pub debug: ContextDebug,
}

impl ContextBundle {
    /// True when no proprietary chunk backs this bundle.
    pub fn is_external(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Audit summary of one retrieval. Persisting it is someone else's job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub chunks_found: usize,
    pub documents_searched: usize,
    pub is_external: bool,
    pub chunks_used: usize,
    pub logged_at: DateTime<Utc>,
    pub log_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub system_context: String,
    pub user_query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationResponse {
    pub text: String,
}
