//! Strategies for combining embedding similarity with idf similarity.

use std::fmt::Debug;

use crate::config::{BlendStrategy, RetrievalConfig};

/// Combines the two per-question similarity signals into one score.
///
/// Implementations must be pure; the ranker clamps non-finite output to 0.
pub trait ScoreBlend: Send + Sync + Debug {
    fn blend(&self, embedding: f32, idf: f32) -> f32;
}

/// `w * embedding + (1 - w) * idf`. With the default weight of 0.5 this is the mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedBlend {
    pub embedding_weight: f32,
}

impl Default for WeightedBlend {
    fn default() -> Self {
        Self {
            embedding_weight: 0.5,
        }
    }
}

impl ScoreBlend for WeightedBlend {
    fn blend(&self, embedding: f32, idf: f32) -> f32 {
        self.embedding_weight * embedding + (1.0 - self.embedding_weight) * idf
    }
}

/// Harmonic mean of the non-negative parts; 0 unless both signals agree.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HarmonicBlend;

impl ScoreBlend for HarmonicBlend {
    fn blend(&self, embedding: f32, idf: f32) -> f32 {
        let (a, b) = (embedding.max(0.0), idf.max(0.0));
        if a + b == 0.0 {
            return 0.0;
        }
        2.0 * a * b / (a + b)
    }
}

/// Build the configured blend strategy.
pub fn blend_from_config(config: &RetrievalConfig) -> Box<dyn ScoreBlend> {
    match config.blend {
        BlendStrategy::Weighted => Box::new(WeightedBlend {
            embedding_weight: config.embedding_weight,
        }),
        BlendStrategy::Harmonic => Box::new(HarmonicBlend),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_blend() {
        let blend = WeightedBlend::default();
        assert_eq!(blend.blend(1.0, 0.0), 0.5);
        assert!((blend.blend(0.8, 0.4) - 0.6).abs() < 1e-6);

        let embedding_only = WeightedBlend {
            embedding_weight: 1.0,
        };
        assert_eq!(embedding_only.blend(0.3, 0.9), 0.3);
    }

    #[test]
    fn test_harmonic_blend() {
        let blend = HarmonicBlend;
        assert_eq!(blend.blend(0.0, 1.0), 0.0);
        assert_eq!(blend.blend(0.0, 0.0), 0.0);
        assert!((blend.blend(0.5, 0.5) - 0.5).abs() < 1e-6);
        assert_eq!(blend.blend(-1.0, 1.0), 0.0);
    }

    #[test]
    fn test_blend_from_config() {
        let mut config = RetrievalConfig::default();
        assert!((blend_from_config(&config).blend(1.0, 0.0) - 0.5).abs() < 1e-6);

        config.blend = BlendStrategy::Harmonic;
        assert_eq!(blend_from_config(&config).blend(1.0, 0.0), 0.0);
    }
}
