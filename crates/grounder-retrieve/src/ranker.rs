//! Ranked retrieval: over-fetch, re-rank, truncate.

use grounder_core::{ChunkMetadata, Error, Lexicon, MetadataFilter, Result, ScoredChunk, VectorStore};
use grounder_embed::EmbedderPool;
use std::sync::Arc;
use tracing::{debug, info};

use crate::spell::SpellCorrector;

/// Configuration for the retriever.
#[derive(Debug, Clone, Copy)]
pub struct RetrieverConfig {
    /// Candidates fetched per requested result before re-ranking
    pub overfetch_factor: usize,
    /// Floor on the candidate count
    pub min_candidates: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            overfetch_factor: 4,
            min_candidates: 10,
        }
    }
}

/// A passage returned to the chat orchestrator.
#[derive(Debug, Clone)]
pub struct RetrievedPassage {
    /// Chunk text
    pub content: String,
    /// Source metadata for citation
    pub metadata: ChunkMetadata,
    /// Similarity score from the vector index (`1 - distance`)
    pub score: f32,
    /// 1-based rank after re-ranking
    pub rank: usize,
}

/// Query-time retriever over one collection.
///
/// Shares the embedder instance with the indexing path; a retriever never
/// mutates the store, so any number of retrievals may run concurrently with
/// each other and with an in-progress indexing job (reads during writes may
/// observe a partially updated index).
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<EmbedderPool>,
    corrector: SpellCorrector,
    config: RetrieverConfig,
}

impl Retriever {
    /// Create a retriever over a store, a shared embedder, and the corpus
    /// lexicon used for spell correction.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<EmbedderPool>,
        lexicon: Arc<Lexicon>,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            corrector: SpellCorrector::new(lexicon),
            config,
        }
    }

    /// Retrieve up to `max_results` passages relevant to `query`.
    ///
    /// An empty result is an answer, not an error.
    pub async fn retrieve(&self, query: &str, max_results: usize) -> Result<Vec<RetrievedPassage>> {
        self.retrieve_with_options(query, max_results, None, None)
            .await
    }

    /// Retrieve with an explicit candidate count and/or metadata filter.
    pub async fn retrieve_with_options(
        &self,
        query: &str,
        max_results: usize,
        top_k: Option<usize>,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievedPassage>> {
        let corrected = self.corrector.correct_query(query);

        // Use the corrected query only when it actually differs
        let retrieval_query = if corrected.to_lowercase() != query.to_lowercase() {
            info!(original = query, corrected = %corrected, "query spell-corrected");
            corrected.as_str()
        } else {
            query
        };

        let k = top_k.unwrap_or_else(|| (max_results * self.config.overfetch_factor).max(self.config.min_candidates));

        let mut candidates = self.search(retrieval_query, k, filter).await?;

        // Corrected query found nothing: fall back to the raw query
        if candidates.is_empty() && retrieval_query != query {
            debug!("corrected query returned no hits, retrying with raw query");
            candidates = self.search(query, k, filter).await?;
        }

        let keyword_tokens: Vec<String> = corrected
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let mut scored: Vec<(ScoredChunk, usize)> = candidates
            .into_iter()
            .map(|chunk| {
                let hits = keyword_hits(&chunk.text, &keyword_tokens);
                (chunk, hits)
            })
            .collect();

        // Similarity dominates; keyword hits break ties. Stable sort keeps
        // the index's ordering for full ties, so growing max_results never
        // reorders a smaller result set's prefix.
        scored.sort_by(|a, b| {
            b.0.score
                .partial_cmp(&a.0.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.1.cmp(&a.1))
        });
        scored.truncate(max_results);

        let passages: Vec<RetrievedPassage> = scored
            .into_iter()
            .enumerate()
            .map(|(i, (chunk, _))| RetrievedPassage {
                content: chunk.text,
                metadata: chunk.metadata,
                score: chunk.score,
                rank: i + 1,
            })
            .collect();

        info!(query, results = passages.len(), "retrieved passages");
        Ok(passages)
    }

    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredChunk>> {
        let embedding = self
            .embedder
            .embed_query(query)
            .await
            .map_err(Error::Embedding)?;
        self.store
            .similarity_search(&embedding, k, filter)
            .await
            .map_err(Error::Store)
    }
}

/// Total case-insensitive occurrences of the query tokens in `text`.
fn keyword_hits(text: &str, tokens: &[String]) -> usize {
    if tokens.is_empty() {
        return 0;
    }
    let lower = text.to_lowercase();
    tokens
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| lower.matches(t.as_str()).count())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use grounder_core::{chunk_id, document_id, Chunk, Embedder};
    use grounder_embed::HashingEmbedder;
    use grounder_store::MemoryStore;
    use std::path::Path;

    const DIM: usize = 64;

    async fn seeded_retriever(texts: &[&str]) -> (Retriever, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new("docs", DIM));
        store.init().await.unwrap();

        let embedder = Arc::new(HashingEmbedder::with_dimension(DIM));
        let lexicon = Arc::new(Lexicon::new());

        let mut chunks = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let path = format!("doc{i}.txt");
            let doc = document_id(Path::new(&path));
            let embedding = embedder.embed(&[text]).await.unwrap().remove(0);
            lexicon.add_text(text);
            chunks.push(Chunk {
                id: chunk_id(doc, 0),
                document_id: doc,
                text: (*text).to_string(),
                embedding: Some(embedding),
                metadata: ChunkMetadata {
                    file_name: format!("doc{i}.txt"),
                    relative_path: path,
                    extension: ".txt".to_string(),
                    size: text.len(),
                    chunk_index: 0,
                    total_chunks: 1,
                    content_hash: "h".to_string(),
                    extra: Default::default(),
                },
            });
        }
        store.add_chunks(&chunks).await.unwrap();

        let pool = Arc::new(EmbedderPool::new(embedder, 2));
        let retriever = Retriever::new(
            Arc::clone(&store) as Arc<dyn VectorStore>,
            pool,
            lexicon,
            RetrieverConfig::default(),
        );
        (retriever, store)
    }

    #[tokio::test]
    async fn test_empty_collection_returns_empty_list() {
        let (retriever, _store) = seeded_retriever(&[]).await;
        let passages = retriever.retrieve("anything", 3).await.unwrap();
        assert!(passages.is_empty());
    }

    #[tokio::test]
    async fn test_relevant_passage_ranked_first() {
        let (retriever, _store) = seeded_retriever(&[
            "machine learning is a subset of artificial intelligence",
            "the cafeteria menu changes every tuesday",
            "vector embeddings represent text numerically",
        ])
        .await;

        let passages = retriever.retrieve("machine learning", 2).await.unwrap();
        assert_eq!(passages.len(), 2);
        assert!(passages[0].content.contains("machine learning"));
        assert_eq!(passages[0].rank, 1);
    }

    #[tokio::test]
    async fn test_misspelled_query_corrected_and_retrieved() {
        let (retriever, _store) = seeded_retriever(&[
            "machine learning is a subset of artificial intelligence",
            "the cafeteria menu changes every tuesday",
        ])
        .await;

        let passages = retriever.retrieve("machien lerning", 1).await.unwrap();
        assert_eq!(passages.len(), 1);
        assert!(passages[0].content.contains("machine learning"));
    }

    #[tokio::test]
    async fn test_max_results_truncates() {
        let (retriever, _store) = seeded_retriever(&[
            "alpha document one",
            "alpha document two",
            "alpha document three",
            "alpha document four",
        ])
        .await;

        let passages = retriever.retrieve("alpha document", 2).await.unwrap();
        assert_eq!(passages.len(), 2);
    }

    #[tokio::test]
    async fn test_stable_prefix_when_growing_max_results() {
        let (retriever, _store) = seeded_retriever(&[
            "rust ownership and borrowing",
            "rust lifetimes explained",
            "python decorators tutorial",
            "gardening in small spaces",
        ])
        .await;

        let small = retriever.retrieve("rust ownership", 2).await.unwrap();
        let large = retriever.retrieve("rust ownership", 4).await.unwrap();

        for (s, l) in small.iter().zip(large.iter()) {
            assert_eq!(s.content, l.content);
        }
    }

    #[tokio::test]
    async fn test_keyword_hits_break_score_ties() {
        // Two chunks with identical embeddings (identical token multiset
        // under hashing) but different keyword density
        let store = Arc::new(MemoryStore::new("docs", DIM));
        store.init().await.unwrap();
        let embedder = Arc::new(HashingEmbedder::with_dimension(DIM));
        let lexicon = Arc::new(Lexicon::new());
        lexicon.add_text("flux capacitor");

        let shared_embedding = embedder.embed(&["same vector"]).await.unwrap().remove(0);
        for (i, text) in [
            "flux mentioned once here",
            "flux and flux again: flux appears thrice",
        ]
        .iter()
        .enumerate()
        {
            let path = format!("doc{i}.txt");
            let doc = document_id(Path::new(&path));
            store
                .add_chunks(&[Chunk {
                    id: chunk_id(doc, 0),
                    document_id: doc,
                    text: (*text).to_string(),
                    embedding: Some(shared_embedding.clone()),
                    metadata: ChunkMetadata {
                        relative_path: path,
                        ..Default::default()
                    },
                }])
                .await
                .unwrap();
        }

        let retriever = Retriever::new(
            Arc::clone(&store) as Arc<dyn VectorStore>,
            Arc::new(EmbedderPool::new(embedder, 2)),
            lexicon,
            RetrieverConfig::default(),
        );

        let passages = retriever.retrieve("flux", 2).await.unwrap();
        assert_eq!(passages.len(), 2);
        // Equal similarity, more keyword occurrences wins
        assert!(passages[0].content.contains("thrice"));
    }

    #[tokio::test]
    async fn test_explicit_top_k_overrides_overfetch() {
        let (retriever, _store) = seeded_retriever(&[
            "alpha one",
            "alpha two",
            "alpha three",
        ])
        .await;

        let passages = retriever
            .retrieve_with_options("alpha", 10, Some(1), None)
            .await
            .unwrap();
        // Only one candidate was fetched, so only one can be returned
        assert_eq!(passages.len(), 1);
    }

    #[tokio::test]
    async fn test_metadata_filter_applied() {
        let (retriever, _store) = seeded_retriever(&[
            "quarterly revenue figures",
            "quarterly planning notes",
        ])
        .await;

        let filter = MetadataFilter::FileName("doc1.txt".to_string());
        let passages = retriever
            .retrieve_with_options("quarterly", 5, None, Some(&filter))
            .await
            .unwrap();
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].metadata.file_name, "doc1.txt");
    }

    #[test]
    fn test_keyword_hits_counts_occurrences() {
        let tokens = vec!["machine".to_string(), "learning".to_string()];
        assert_eq!(
            keyword_hits("Machine learning and machine vision", &tokens),
            3
        );
        assert_eq!(keyword_hits("nothing relevant", &tokens), 0);
        assert_eq!(keyword_hits("anything", &[]), 0);
    }

    #[test]
    fn test_overfetch_formula() {
        let config = RetrieverConfig::default();
        assert_eq!((1 * config.overfetch_factor).max(config.min_candidates), 10);
        assert_eq!((5 * config.overfetch_factor).max(config.min_candidates), 20);
    }
}
