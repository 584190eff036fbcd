//! clinrag-text
//!
//! Tantivy-based keyword search over an in-memory corpus snapshot. The index
//! lives in RAM and is rebuilt from the snapshot; it is never written back.

pub mod index;
pub mod tantivy_utils;

pub use index::KeywordIndex;
