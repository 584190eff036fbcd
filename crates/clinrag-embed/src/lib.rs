//! clinrag-embed
//!
//! Deterministic feature-hashing embedder. Each content word and each of its
//! character trigrams is hashed into a fixed number of buckets; the resulting
//! vector is L2-normalized. No model files, no network.

use std::hash::Hasher;

use anyhow::{bail, Result};
use twox_hash::XxHash64;

use clinrag_core::text::tokens;
use clinrag_core::traits::Embedder;

pub const DEFAULT_DIM: usize = 384;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.35;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
    seed: u64,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            bail!("embedding dimension must be > 0");
        }
        Ok(Self { dim, seed: 0 })
    }

    /// Same dimension, different bucket layout.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn bucket(&self, feature: &str) -> usize {
        let mut hasher = XxHash64::with_seed(self.seed);
        hasher.write(feature.as_bytes());
        #[allow(clippy::cast_possible_truncation)]
        let idx = (hasher.finish() % self.dim as u64) as usize;
        idx
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in tokens(text) {
            v[self.bucket(&token)] += WORD_WEIGHT;
            let padded: Vec<char> = format!("#{token}#").chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                v[self.bucket(&gram)] += TRIGRAM_WEIGHT;
            }
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        // Text with no content words stays the zero vector.
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

impl Embedder for HashingEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Embedder used when nothing else is configured. `CLINRAG_EMBED_DIM` overrides the dimension.
pub fn get_default_embedder() -> Result<Box<dyn Embedder>> {
    let dim = match std::env::var("CLINRAG_EMBED_DIM") {
        Ok(raw) => raw.trim().parse::<usize>().map_err(|e| anyhow::anyhow!("CLINRAG_EMBED_DIM={raw:?}: {e}"))?,
        Err(_) => DEFAULT_DIM,
    };
    tracing::debug!(dim, "using hashing embedder");
    Ok(Box::new(HashingEmbedder::new(dim)?))
}

/// Cosine similarity of two equal-length vectors; 0 when either is all zeros.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}
