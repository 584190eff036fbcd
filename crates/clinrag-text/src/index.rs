use std::sync::Arc;

use anyhow::Result;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Value};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tracing::{debug, warn};

use clinrag_core::text::ordered_terms;
use clinrag_core::traits::KeywordSearch;
use clinrag_core::types::{SearchHit, SourceKind};
use clinrag_core::Corpus;

use crate::tantivy_utils::{build_schema, register_tokenizer};

/// BM25 keyword index over a corpus snapshot.
pub struct KeywordIndex {
	corpus: Arc<Corpus>,
	index: Index,
	reader: IndexReader,
	id_field: Field,
	text_field: Field,
}

impl KeywordIndex {
	pub fn build(corpus: Arc<Corpus>) -> Result<Self> {
		let schema = build_schema();
		let index = Index::create_in_ram(schema.clone());
		register_tokenizer(&index);
		let id_field = schema.get_field("id")?;
		let document_field = schema.get_field("document_id")?;
		let text_field = schema.get_field("text")?;

		// One indexing thread keeps a single segment, so equal-score ties come back in corpus order.
		let mut index_writer: IndexWriter = index.writer_with_num_threads(1, 50_000_000)?;
		for c in corpus.chunks() {
			index_writer.add_document(doc!(
				id_field => c.id.clone(),
				document_field => c.document_id.clone(),
				text_field => c.search_text(),
			))?;
		}
		index_writer.commit()?;
		let reader: IndexReader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		debug!(chunks = corpus.len(), "keyword index built");
		Ok(Self { corpus, index, reader, id_field, text_field })
	}
}

impl KeywordSearch for KeywordIndex {
	/// Any-term match over the query's content words; `threshold` is a minimum BM25 score.
	fn search(&self, query: &str, limit: usize, threshold: Option<f32>) -> Result<Vec<SearchHit>> {
		let terms = ordered_terms(query);
		if terms.is_empty() || limit == 0 {
			return Ok(Vec::new());
		}
		let searcher = self.reader.searcher();
		let qp = QueryParser::for_index(&self.index, vec![self.text_field]);
		let q = qp.parse_query(&terms.join(" "))?;
		let top_docs = searcher.search(&q, &TopDocs::with_limit(limit))?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			if threshold.is_some_and(|t| score < t) {
				continue;
			}
			let doc: TantivyDocument = searcher.doc(addr)?;
			let Some(id) = doc.get_first(self.id_field).and_then(|v| v.as_str()) else { continue };
			match self.corpus.get(id) {
				Some(chunk) => hits.push(SearchHit { chunk: Arc::clone(chunk), score, source: SourceKind::Text }),
				None => warn!(%id, "keyword hit not present in corpus snapshot"),
			}
		}
		Ok(hits)
	}
}
