use std::sync::Arc;

use indicatif::ProgressBar;
use tracing::{info, warn};

use clinrag_core::config::{RetrievalSettings, Settings};
use clinrag_core::error::{Error, Result};
use clinrag_core::traits::{AuditSink, Embedder, Generator, KeywordSearch, VectorSearch};
use clinrag_core::types::{AuditRecord, ContextBundle, GenerationRequest, ScoredChunk};
use clinrag_core::Corpus;
use clinrag_embed::get_default_embedder;
use clinrag_entities::{EntityExtractor, SynonymTable};
use clinrag_hybrid::HybridChunkStore;
use clinrag_text::KeywordIndex;
use clinrag_vector::VectorIndex;

use crate::assembler::ContextAssembler;
use crate::audit::AuditTrailBuilder;
use crate::budgeter::TokenBudgeter;
use crate::prompt::compose_system_context;
use crate::scorer::RelevanceScorer;

#[derive(Debug)]
pub struct RetrievalOutcome {
    pub bundle: ContextBundle,
    /// Every scored candidate in rank order, with its budget decision.
    pub ranked: Vec<ScoredChunk>,
    /// Point codes found in the query.
    pub entities: Vec<String>,
    /// Candidates excluded as malformed.
    pub rejected: Vec<Error>,
    /// Search backends that failed or timed out.
    pub failures: Vec<Error>,
}

#[derive(Debug)]
pub struct AnswerOutcome {
    pub answer: String,
    /// Point codes found in the answer, for cross-linking.
    pub answer_entities: Vec<String>,
    pub retrieval: RetrievalOutcome,
    pub audit: AuditRecord,
}

/// query → {entities, candidates} → score → budget → assemble.
///
/// Holds only shared read-only state; concurrent queries need no locking.
pub struct RetrievalPipeline {
    extractor: Arc<EntityExtractor>,
    store: HybridChunkStore,
    scorer: RelevanceScorer,
    budgeter: TokenBudgeter,
    assembler: ContextAssembler,
}

impl RetrievalPipeline {
    pub fn new(extractor: Arc<EntityExtractor>, store: HybridChunkStore, settings: &RetrievalSettings) -> Self {
        Self {
            extractor,
            store,
            scorer: RelevanceScorer::new(settings.scoring.clone()),
            budgeter: TokenBudgeter::new(settings.budget.clone()),
            assembler: ContextAssembler::new(settings.budget.preview_chars),
        }
    }

    /// Keyword index plus, when enabled, a vector index with the default embedder.
    pub fn from_corpus(settings: &Settings, corpus: Arc<Corpus>) -> anyhow::Result<Self> {
        Self::from_corpus_with_progress(settings, corpus, None)
    }

    /// Same as [`Self::from_corpus`]; `progress` ticks once per embedded chunk.
    pub fn from_corpus_with_progress(
        settings: &Settings,
        corpus: Arc<Corpus>,
        progress: Option<&ProgressBar>,
    ) -> anyhow::Result<Self> {
        let extractor = Arc::new(EntityExtractor::new(synonym_table(settings))?);
        let keyword: Arc<dyn KeywordSearch> = Arc::new(KeywordIndex::build(Arc::clone(&corpus))?);
        let vector: Option<Arc<dyn VectorSearch>> = if settings.retrieval.search.enable_vector {
            let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder()?);
            Some(Arc::new(VectorIndex::build_with_progress(Arc::clone(&corpus), embedder, progress)?))
        } else {
            None
        };
        info!(chunks = corpus.len(), documents = corpus.document_count(), vector = vector.is_some(), "indexes ready");
        let store = HybridChunkStore::new(Some(keyword), vector, settings.retrieval.search.clone());
        Ok(Self::new(extractor, store, &settings.retrieval))
    }

    pub fn extract_entities(&self, text: &str) -> Vec<String> {
        self.extractor.extract(text)
    }

    /// Never fails. Search outages and malformed chunks surface in the outcome.
    pub async fn retrieve_context(&self, query: &str, max_tokens: usize) -> RetrievalOutcome {
        let (entities, candidates) = tokio::join!(async { self.extractor.extract(query) }, self.store.fetch(query));
        let report = self.scorer.score(&candidates.candidates, query);
        let selection = self.budgeter.select_within_budget(&report.ranked, max_tokens);
        let bundle = self.assembler.assemble(&selection);
        info!(
            candidates = candidates.len(),
            included = bundle.sources.len(),
            tokens = bundle.debug.token_budget.used,
            external = bundle.is_external(),
            "context retrieved"
        );
        RetrievalOutcome {
            bundle,
            ranked: selection.decisions,
            entities,
            rejected: report.rejected,
            failures: candidates.failures,
        }
    }

    /// Retrieve, generate, cross-link, audit. The generator runs on the
    /// blocking pool. The audit record goes to `sink` in the background
    /// whether or not generation succeeds.
    pub async fn answer(
        &self,
        query: &str,
        max_tokens: usize,
        generator: Arc<dyn Generator>,
        sink: Arc<dyn AuditSink>,
    ) -> Result<AnswerOutcome> {
        let retrieval = self.retrieve_context(query, max_tokens).await;
        let request = GenerationRequest {
            system_context: compose_system_context(&retrieval.bundle),
            user_query: query.to_string(),
        };
        let generated = match tokio::task::spawn_blocking(move || generator.generate(&request)).await {
            Ok(result) => result,
            Err(join_err) => Err(anyhow::anyhow!("generator task failed: {join_err}")),
        };
        let audit = AuditTrailBuilder::build(&retrieval.bundle, &retrieval.ranked);
        AuditTrailBuilder::dispatch(sink, audit.clone());

        let response = generated.map_err(|e| {
            warn!(error = %e, "generation failed");
            Error::Generation(format!("{e:#}"))
        })?;
        let answer_entities = self.extractor.extract(&response.text);
        Ok(AnswerOutcome { answer: response.text, answer_entities, retrieval, audit })
    }
}

/// Built-in aliases with the configured overrides layered on top.
pub fn synonym_table(settings: &Settings) -> SynonymTable {
    SynonymTable::builtin().with_overrides(&settings.synonyms)
}
