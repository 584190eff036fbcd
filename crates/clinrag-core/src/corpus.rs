//! Read-only corpus snapshot.
//!
//! Ingestion lives elsewhere; this module only loads exported chunk records
//! (`*.json` arrays or `*.jsonl` lines) into an immutable, shareable snapshot.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::types::KnowledgeChunk;

#[derive(Debug, Default)]
pub struct Corpus {
    chunks: Vec<Arc<KnowledgeChunk>>,
    by_id: HashMap<String, usize>,
}

impl Corpus {
    /// Build a snapshot, dropping duplicate ids and duplicate `(document, chunk_index)` pairs.
    pub fn from_chunks(chunks: impl IntoIterator<Item = KnowledgeChunk>) -> Self {
        let mut corpus = Self::default();
        let mut positions: HashSet<(String, u32)> = HashSet::new();
        for chunk in chunks {
            if corpus.by_id.contains_key(&chunk.id) {
                warn!(id = %chunk.id, "skipping chunk with duplicate id");
                continue;
            }
            if !positions.insert((chunk.document_id.clone(), chunk.chunk_index)) {
                warn!(id = %chunk.id, document = %chunk.document_id, index = chunk.chunk_index, "skipping chunk with duplicate document position");
                continue;
            }
            corpus.by_id.insert(chunk.id.clone(), corpus.chunks.len());
            corpus.chunks.push(Arc::new(chunk));
        }
        corpus
    }

    pub fn load_dir(data_dir: &Path) -> Result<Self> {
        let files = list_record_files(data_dir);
        if files.is_empty() {
            info!(dir = %data_dir.display(), "no .json/.jsonl corpus files found");
            return Ok(Self::default());
        }
        let mut records = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            debug!(file = %file_path.display(), "loading corpus file {}/{}", file_index + 1, files.len());
            records.extend(read_records(file_path)?);
        }
        let corpus = Self::from_chunks(records);
        info!(files = files.len(), chunks = corpus.len(), documents = corpus.document_count(), "corpus snapshot loaded");
        Ok(corpus)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<KnowledgeChunk>> {
        self.by_id.get(id).map(|&i| &self.chunks[i])
    }

    pub fn chunks(&self) -> &[Arc<KnowledgeChunk>] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn document_count(&self) -> usize {
        self.chunks.iter().map(|c| c.document_id.as_str()).collect::<HashSet<_>>().len()
    }
}

fn corpus_error(path: &Path, message: impl ToString) -> Error {
    Error::Corpus { path: path.display().to_string(), message: message.to_string() }
}

fn read_records(file_path: &Path) -> Result<Vec<KnowledgeChunk>> {
    let raw = fs::read_to_string(file_path).map_err(|e| corpus_error(file_path, e))?;
    let is_jsonl = file_path.extension().and_then(|s| s.to_str()) == Some("jsonl");
    if !is_jsonl {
        return serde_json::from_str(&raw).map_err(|e| corpus_error(file_path, e));
    }
    let mut records = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|e| corpus_error(file_path, format!("line {}: {e}", line_no + 1)))?;
        records.push(record);
    }
    Ok(records)
}

fn list_record_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
        let path = entry.path();
        if matches!(path.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files
}
