//! Document retrieval for Parley.
//!
//! Provides the in-memory [`VectorStore`](parley_core::VectorStore)
//! implementation, JSON corpus loading, and query rephrasing for
//! follow-up questions.

pub mod corpus;
pub mod in_memory;
pub mod rephrase;
pub mod scoring;

pub use corpus::{load_corpus, parse_corpus};
pub use in_memory::{Embedder, InMemoryVectorStore};
pub use rephrase::QueryRephraser;
