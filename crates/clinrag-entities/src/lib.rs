//! clinrag-entities
//!
//! Acupuncture point recognition: alias resolution (`synonyms`) and canonical
//! code extraction (`extractor`). Both are built once from an injected
//! `SynonymTable` and shared read-only across requests.

pub mod extractor;
pub mod synonyms;

pub use extractor::EntityExtractor;
pub use synonyms::{SynonymResolver, SynonymTable};
