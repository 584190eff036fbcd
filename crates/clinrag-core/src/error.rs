use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Search backend '{backend}' unavailable: {message}")]
    SearchUnavailable { backend: &'static str, message: String },

    #[error("Search backend '{backend}' timed out after {millis} ms")]
    SearchTimeout { backend: &'static str, millis: u64 },

    #[error("Malformed chunk {id}: {reason}")]
    MalformedChunk { id: String, reason: &'static str },

    #[error("Corpus error at {path}: {message}")]
    Corpus { path: String, message: String },

    #[error("Generation failed: {0}")]
    Generation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
