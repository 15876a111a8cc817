//! Aggregates the APIs of top-ranked questions into one deduplicated ranking.

use std::collections::HashSet;

use indexmap::IndexMap;

use super::aggregation::ApiAggregation;
use crate::embedding::QueryVector;
use crate::index::{CorpusIndex, JavadocIndex};
use crate::types::{ApiRecommendation, ScoredQuestion};

/// Running total for one API.
#[derive(Debug, Default, Clone, Copy)]
struct Aggregate {
    score: f64,
    /// Distinct candidate questions linking the API
    links: usize,
}

/// Stateless per request; holds only the aggregation policy.
#[derive(Debug)]
pub struct ApiRecommender {
    aggregation: Box<dyn ApiAggregation>,
    javadoc_weight: f32,
}

impl ApiRecommender {
    pub fn new(aggregation: Box<dyn ApiAggregation>) -> Self {
        Self {
            aggregation,
            javadoc_weight: 0.0,
        }
    }

    /// Add `weight · similarity(query, javadoc entry)` once per documented API.
    pub fn with_javadoc_weight(mut self, weight: f32) -> Self {
        self.javadoc_weight = weight.max(0.0);
        self
    }

    /// Up to `k` distinct APIs linked by `candidates`.
    ///
    /// `candidates` must be in descending score order, as produced by the ranker.
    /// Candidates unknown to `corpus` are ignored. APIs are ordered by aggregate
    /// score, then by the number of linking questions, then by first appearance.
    pub fn recommend_apis(
        &self,
        candidates: &[ScoredQuestion],
        corpus: &CorpusIndex,
        javadoc: &JavadocIndex,
        query: &QueryVector,
        k: usize,
    ) -> Vec<ApiRecommendation> {
        if k == 0 {
            return Vec::new();
        }

        let mut aggregates: IndexMap<&str, Aggregate> = IndexMap::new();
        let mut in_question: HashSet<&str> = HashSet::new();
        for (rank, candidate) in candidates.iter().enumerate() {
            let Some(question) = corpus.question(candidate.id) else {
                tracing::debug!(target: "recommend", "candidate {} is not indexed", candidate.id);
                continue;
            };
            let contribution = self.aggregation.contribution(rank, candidate.score);
            in_question.clear();
            for api in &question.apis {
                if in_question.insert(api.as_str()) {
                    let aggregate = aggregates.entry(api.as_str()).or_default();
                    aggregate.score += contribution;
                    aggregate.links += 1;
                }
            }
        }

        if self.javadoc_weight > 0.0 {
            let weight = f64::from(self.javadoc_weight);
            for (api, aggregate) in aggregates.iter_mut() {
                if let Some(entry) = javadoc.lookup(api) {
                    aggregate.score += weight * f64::from(entry.similarity(query));
                }
            }
        }

        let mut ranked: Vec<(&str, Aggregate)> = aggregates.into_iter().collect();
        // Stable sort: full ties stay in first-seen order
        ranked.sort_by(|a, b| {
            b.1.score
                .total_cmp(&a.1.score)
                .then_with(|| b.1.links.cmp(&a.1.links))
        });
        ranked.truncate(k);

        tracing::debug!(target: "recommend",
            "{} candidates -> {} APIs",
            candidates.len(),
            ranked.len()
        );

        ranked
            .into_iter()
            .map(|(api, aggregate)| ApiRecommendation {
                full_name: api.to_string(),
                description: javadoc.description_for(api).to_string(),
                score: aggregate.score as f32,
            })
            .collect()
    }
}
