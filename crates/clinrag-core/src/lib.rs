#![deny(unused_imports)]
//! Shared domain model, collaborator traits, configuration and corpus loading
//! for the clinical retrieval pipeline.

pub mod config;
pub mod corpus;
pub mod error;
pub mod text;
pub mod traits;
pub mod types;

pub use corpus::Corpus;
pub use error::{Error, Result};
