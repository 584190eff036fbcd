//! clinrag-context
//!
//! Turns a candidate set into a budget-bounded, cited prompt context and an
//! audit record. Stages run in order: score, select within budget, assemble,
//! audit. [`RetrievalPipeline`] wires them to the entity extractor and the
//! hybrid chunk store.

pub mod assembler;
pub mod audit;
pub mod budgeter;
pub mod pipeline;
pub mod prompt;
pub mod scorer;

pub use assembler::{ContextAssembler, NO_CONTEXT_MARKER};
pub use audit::{AuditTrailBuilder, TracingAuditSink};
pub use budgeter::{Selection, TokenBudgeter};
pub use pipeline::{synonym_table, AnswerOutcome, RetrievalOutcome, RetrievalPipeline};
pub use prompt::compose_system_context;
pub use scorer::{RelevanceScorer, ScoreReport};
