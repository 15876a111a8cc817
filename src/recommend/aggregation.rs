//! How a candidate question's score feeds the aggregate of each API it links.

use std::fmt::Debug;

use crate::config::{AggregationConfig, AggregationStrategy};

/// Keeps every contribution strictly positive, even for zero-score candidates.
pub const MIN_CONTRIBUTION: f64 = 1e-6;

/// Contribution of one candidate question to each API it references.
///
/// Implementations must be non-increasing in `rank`, non-decreasing in `score`
/// and strictly positive. A contribution may still be too small to change a
/// running `f64` sum, so the recommender also counts linking questions.
pub trait ApiAggregation: Send + Sync + Debug {
    fn contribution(&self, rank: usize, score: f32) -> f64;
}

/// `(score + ε) · decay^rank`.
///
/// With `decay <= 0.5` the best candidate outweighs all later candidates
/// combined, so an API linked by the top question always surfaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricDecay {
    pub decay: f32,
}

impl Default for GeometricDecay {
    fn default() -> Self {
        Self { decay: 0.5 }
    }
}

impl ApiAggregation for GeometricDecay {
    fn contribution(&self, rank: usize, score: f32) -> f64 {
        let weight = f64::from(self.decay).powi(rank.min(i32::MAX as usize) as i32);
        ((f64::from(score.max(0.0)) + MIN_CONTRIBUTION) * weight).max(f64::MIN_POSITIVE)
    }
}

/// `(score + ε) / (rank + 1)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReciprocalRank;

impl ApiAggregation for ReciprocalRank {
    fn contribution(&self, rank: usize, score: f32) -> f64 {
        (f64::from(score.max(0.0)) + MIN_CONTRIBUTION) / (rank as f64 + 1.0)
    }
}

/// Build the configured aggregation strategy.
pub fn aggregation_from_config(config: &AggregationConfig) -> Box<dyn ApiAggregation> {
    match config.strategy {
        AggregationStrategy::GeometricDecay => Box::new(GeometricDecay {
            decay: config.decay,
        }),
        AggregationStrategy::ReciprocalRank => Box::new(ReciprocalRank),
    }
}
