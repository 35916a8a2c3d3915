//! Grounding-context assembly for the chat orchestrator.
//!
//! The chat collaborator owns the prompt and the LLM call; this module only
//! formats retrieved passages into the context block it embeds in the
//! system prompt. When retrieval finds nothing, the block says so
//! explicitly so the answering model states that the documents do not
//! contain the answer instead of improvising one.

use crate::ranker::RetrievedPassage;

/// Context block used when retrieval returned zero passages.
pub const NO_CONTEXT_NOTICE: &str = "No relevant passages were found in the user's documents. \
     Tell the user clearly that their documents do not contain this information; do not guess.";

/// Format ranked passages into a grounding context block.
///
/// Each passage is prefixed with its source file so the model can cite it.
#[must_use]
pub fn grounding_context(passages: &[RetrievedPassage]) -> String {
    if passages.is_empty() {
        return NO_CONTEXT_NOTICE.to_string();
    }

    passages
        .iter()
        .map(|p| format!("From {}:\n{}", p.metadata.file_name, p.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use grounder_core::ChunkMetadata;

    fn passage(file_name: &str, content: &str, rank: usize) -> RetrievedPassage {
        RetrievedPassage {
            content: content.to_string(),
            metadata: ChunkMetadata {
                file_name: file_name.to_string(),
                ..Default::default()
            },
            score: 0.9,
            rank,
        }
    }

    #[test]
    fn test_passages_formatted_with_source() {
        let block = grounding_context(&[
            passage("report.pdf", "Revenue grew 12% in Q3.", 1),
            passage("notes.md", "Q4 planning starts in October.", 2),
        ]);

        assert_eq!(
            block,
            "From report.pdf:\nRevenue grew 12% in Q3.\n\nFrom notes.md:\nQ4 planning starts in October."
        );
    }

    #[test]
    fn test_empty_passages_yield_explicit_notice() {
        let block = grounding_context(&[]);
        assert_eq!(block, NO_CONTEXT_NOTICE);
        assert!(block.contains("do not guess"));
    }
}
