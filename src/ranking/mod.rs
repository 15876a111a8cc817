//! Question ranking: score blending and bounded top-k selection.

pub mod blend;
pub mod ranker;

pub use blend::{HarmonicBlend, ScoreBlend, WeightedBlend, blend_from_config};
pub use ranker::SimilarityRanker;
