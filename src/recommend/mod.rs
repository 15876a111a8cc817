//! API recommendation from ranked candidate questions.

pub mod aggregation;
pub mod recommender;

pub use aggregation::{
    ApiAggregation, GeometricDecay, MIN_CONTRIBUTION, ReciprocalRank, aggregation_from_config,
};
pub use recommender::ApiRecommender;
