use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use clinrag_core::traits::AuditSink;
use clinrag_core::types::{AuditRecord, ContextBundle, ScoredChunk};

/// Builds audit records and hands them to a sink without waiting.
pub struct AuditTrailBuilder;

impl AuditTrailBuilder {
    /// `ranked` is every candidate that was considered, not only the included ones.
    pub fn build(bundle: &ContextBundle, ranked: &[ScoredChunk]) -> AuditRecord {
        Self::build_at(bundle, ranked, Utc::now(), Uuid::new_v4())
    }

    pub fn build_at(bundle: &ContextBundle, ranked: &[ScoredChunk], logged_at: DateTime<Utc>, log_id: Uuid) -> AuditRecord {
        let documents: HashSet<&str> = ranked.iter().map(|c| c.chunk.document_id.as_str()).collect();
        AuditRecord {
            chunks_found: ranked.len(),
            documents_searched: documents.len(),
            is_external: bundle.is_external(),
            chunks_used: bundle.sources.len(),
            logged_at,
            log_id,
        }
    }

    /// Fire-and-forget. Runs the sink on a detached blocking task; a failure is
    /// logged and otherwise ignored. A task that has not started when the
    /// runtime shuts down is dropped, so short-lived callers use [`Self::deliver`].
    pub fn dispatch(sink: Arc<dyn AuditSink>, record: AuditRecord) {
        let job = move || Self::deliver(sink.as_ref(), &record);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                drop(handle.spawn_blocking(job));
            }
            Err(_) => {
                drop(std::thread::spawn(job));
            }
        }
    }

    /// Hands `record` to `sink` on the calling thread. A failure is logged
    /// and otherwise ignored.
    pub fn deliver(sink: &dyn AuditSink, record: &AuditRecord) {
        if let Err(e) = sink.record(record) {
            warn!(log_id = %record.log_id, error = %e, "audit sink failed");
        }
    }
}

/// Writes audit records to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: &AuditRecord) -> anyhow::Result<()> {
        info!(
            log_id = %record.log_id,
            logged_at = %record.logged_at.to_rfc3339(),
            chunks_found = record.chunks_found,
            documents_searched = record.documents_searched,
            chunks_used = record.chunks_used,
            is_external = record.is_external,
            "retrieval audit"
        );
        Ok(())
    }
}
