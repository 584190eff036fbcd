//! In-memory cosine similarity index over a corpus snapshot.
//!
//! Chunk vectors are computed once at build time with the injected embedder;
//! queries are embedded on demand and scanned exhaustively. Scores are cosine
//! similarities clamped into [0, 1].

pub mod index;

pub use index::VectorIndex;
