//! Word embeddings, idf weights and document vectors.

pub mod math;
pub mod store;
pub mod vectorizer;

pub use math::{cosine_similarity, dot, l2_norm, normalize_in_place};
pub use store::{EmbeddingStore, WordVectors};
pub use vectorizer::{DocumentVectorizer, QueryVector, SparseVector, TermDictionary, TermId};
