//! Semantic API recommendation over a precomputed question corpus.
//!
//! A query is normalized, vectorized against word embeddings and idf weights,
//! ranked against every corpus question, and the APIs used by the best
//! matches are aggregated into a deduplicated, ranked list.
//!
//! ```no_run
//! use apirec::{IndexService, Settings};
//!
//! let service = IndexService::new(Settings::load()?);
//! for api in service.recommend("read a file line by line", 5)? {
//!     println!("{} {:.3}", api.full_name, api.score);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod eval;
pub mod index;
pub mod logging;
pub mod metrics;
pub mod pool;
pub mod ranking;
pub mod recommend;
pub mod registry;
pub mod service;
pub mod text;
pub mod types;

pub use config::Settings;
pub use embedding::{DocumentVectorizer, EmbeddingStore, QueryVector};
pub use engine::RecommendEngine;
pub use error::{EvalError, LoadError, PoolError, ServiceError};
pub use eval::{Metrics, evaluate};
pub use index::{CorpusIndex, JavadocIndex};
pub use pool::{PendingRecommendation, WorkerPool};
pub use ranking::SimilarityRanker;
pub use recommend::ApiRecommender;
pub use registry::{InMemoryRegistry, StandardApiRegistry, resolve_with_registry};
pub use service::IndexService;
pub use text::TextNormalizer;
pub use types::{ApiRecommendation, QuestionId, QuestionMatch, ScoredQuestion};
