//! # grounder-retrieve
//!
//! Query-time retrieval for the Grounder engine.
//!
//! The [`Retriever`] answers `retrieve(query, max_results)`:
//!
//! 1. Spell-correct the query word by word against the corpus [`Lexicon`]
//! 2. Over-fetch candidates from the vector store
//!    (`max(4 × max_results, 10)` or a caller-supplied `top_k`)
//! 3. Fall back to the raw query when the corrected one finds nothing
//! 4. Re-rank by `(similarity score, keyword hits)` and truncate
//!
//! [`grounding`] turns ranked passages into the context block handed to the
//! chat orchestrator, with an explicit notice when nothing relevant was
//! found so the answering model says it does not know instead of guessing.
//!
//! [`Lexicon`]: grounder_core::Lexicon

pub mod grounding;
pub mod ranker;
pub mod spell;

pub use grounding::{grounding_context, NO_CONTEXT_NOTICE};
pub use ranker::{RetrievedPassage, Retriever, RetrieverConfig};
pub use spell::SpellCorrector;
