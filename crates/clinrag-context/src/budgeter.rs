use std::collections::HashMap;

use tracing::debug;

use clinrag_core::config::BudgetSettings;
use clinrag_core::types::{
    ChunkCounts, ContextDebug, DropReason, KnowledgeChunk, ScoredChunk, Thresholds, TokenBudget, TopChunk,
};

/// Outcome of one budget pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Every ranked candidate, in rank order, carrying its include/drop decision.
    pub decisions: Vec<ScoredChunk>,
    pub debug: ContextDebug,
}

impl Selection {
    /// Included chunks, best score first.
    pub fn selected(&self) -> impl Iterator<Item = &ScoredChunk> {
        self.decisions.iter().filter(|c| c.included)
    }

    pub fn dropped(&self) -> impl Iterator<Item = &ScoredChunk> {
        self.decisions.iter().filter(|c| !c.included)
    }
}

/// Greedy best-fit packing: one pass in rank order, a candidate that does not
/// fit is dropped and the scan goes on to smaller ones.
#[derive(Debug, Clone)]
pub struct TokenBudgeter {
    settings: BudgetSettings,
}

impl TokenBudgeter {
    pub fn new(settings: BudgetSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BudgetSettings {
        &self.settings
    }

    /// `ceil(chars / chars_per_token)` over the rendered chunk body.
    pub fn estimate_tokens(&self, chunk: &KnowledgeChunk) -> usize {
        let chars = chunk.body().map_or(0, |b| b.chars().count());
        chars.div_ceil(self.settings.chars_per_token.max(1))
    }

    pub fn select_within_budget(&self, ranked: &[ScoredChunk], max_tokens: usize) -> Selection {
        let mut used = 0usize;
        let mut per_source: HashMap<&str, usize> = HashMap::new();
        let mut decisions = Vec::with_capacity(ranked.len());

        for candidate in ranked {
            let source = candidate.chunk.source_file_name.as_str();
            let source_full = self
                .settings
                .max_per_source
                .is_some_and(|cap| per_source.get(source).copied().unwrap_or(0) >= cap);
            if source_full {
                decisions.push(candidate.decided(false, Some(DropReason::SourceCap)));
                continue;
            }
            let tokens = self.estimate_tokens(&candidate.chunk);
            if used + tokens > max_tokens {
                decisions.push(candidate.decided(false, Some(DropReason::BudgetExceeded)));
                continue;
            }
            used += tokens;
            *per_source.entry(source).or_default() += 1;
            decisions.push(candidate.decided(true, None));
        }

        let debug = self.describe(&decisions, used, max_tokens);
        let counts = &debug.chunks;
        debug!(
            used,
            max_tokens,
            included = counts.included,
            dropped = counts.dropped,
            budget_reached = counts.budget_reached,
            "budget pass complete"
        );
        Selection { decisions, debug }
    }

    fn describe(&self, decisions: &[ScoredChunk], used: usize, max_tokens: usize) -> ContextDebug {
        let included = decisions.iter().filter(|c| c.included).count();
        let chunks = ChunkCounts {
            found: decisions.len(),
            included,
            dropped: decisions.len() - included,
            budget_reached: decisions.iter().any(|c| c.drop_reason == Some(DropReason::BudgetExceeded)),
        };
        let top_chunks = decisions
            .iter()
            .take(self.settings.top_chunks_reported)
            .enumerate()
            .map(|(rank, c)| TopChunk {
                index: rank + 1,
                source_name: c.chunk.source_file_name.clone(),
                score: c.composite_score,
                question_boost: c.question_boost,
                included: c.included,
                reason: self.reason(rank, c),
            })
            .collect();
        ContextDebug {
            token_budget: TokenBudget::new(used, max_tokens),
            chunks,
            top_chunks,
            thresholds: Thresholds {
                clinical_standard: self.settings.clinical_standard,
                min_high_confidence: self.settings.min_high_confidence,
            },
        }
    }

    // Annotation only; inclusion was decided by the budget pass.
    fn reason(&self, rank: usize, c: &ScoredChunk) -> String {
        if let Some(drop) = c.drop_reason {
            return drop.as_str().to_string();
        }
        if rank < self.settings.min_high_confidence {
            "high confidence".to_string()
        } else if c.composite_score >= self.settings.clinical_standard {
            "clinical standard".to_string()
        } else {
            "within budget".to_string()
        }
    }
}
