use clinrag_core::types::{ContextBundle, KnowledgeChunk, SourceRef};

use crate::budgeter::Selection;

/// Present in the bundle text whenever no proprietary chunk was included.
pub const NO_CONTEXT_MARKER: &str = "NO PROPRIETARY CONTEXT";

const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone)]
pub struct ContextAssembler {
    preview_chars: usize,
}

impl ContextAssembler {
    pub fn new(preview_chars: usize) -> Self {
        Self { preview_chars }
    }

    /// One cited block per included chunk, in selection order.
    pub fn assemble(&self, selection: &Selection) -> ContextBundle {
        let mut blocks = Vec::new();
        let mut sources = Vec::new();
        for scored in selection.selected() {
            let Some(body) = scored.chunk.body() else { continue };
            blocks.push(format!("{}\n{body}", citation(&scored.chunk)));
            sources.push(SourceRef {
                file_name: scored.chunk.source_file_name.clone(),
                chunk_index: scored.chunk.chunk_index,
                preview: scored.chunk.preview(self.preview_chars),
            });
        }

        let text = if blocks.is_empty() {
            empty_context_text(selection)
        } else {
            blocks.join(BLOCK_SEPARATOR)
        };
        ContextBundle { text, sources, debug: selection.debug.clone() }
    }
}

/// `[Source: <file>, Entry #<index>]`
pub fn citation(chunk: &KnowledgeChunk) -> String {
    format!("[Source: {}, Entry #{}]", chunk.source_file_name, chunk.chunk_index)
}

fn empty_context_text(selection: &Selection) -> String {
    if selection.debug.chunks.found == 0 {
        format!("{NO_CONTEXT_MARKER}: no relevant entries were found in the knowledge base for this query.")
    } else {
        format!(
            "{NO_CONTEXT_MARKER}: {} relevant entries were found but none fit within the {}-token context budget.",
            selection.debug.chunks.found, selection.debug.token_budget.max
        )
    }
}
