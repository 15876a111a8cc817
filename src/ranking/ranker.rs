//! Bounded top-k ranking of corpus questions against a query.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use rayon::prelude::*;

use super::blend::ScoreBlend;
use crate::embedding::{QueryVector, dot};
use crate::index::CorpusIndex;
use crate::types::{QuestionId, ScoredQuestion};

/// Score/id pair under the ranking order: higher score first, then lower id.
#[derive(Debug, Clone, Copy)]
struct Ranked {
    score: f32,
    id: QuestionId,
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    /// `Greater` means ranked ahead.
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Keeps the best `k` items seen so far in a min-heap.
#[derive(Debug)]
struct TopK {
    k: usize,
    heap: BinaryHeap<Reverse<Ranked>>,
}

impl TopK {
    fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k.saturating_add(1).min(1024)),
        }
    }

    fn offer(&mut self, item: Ranked) {
        if self.k == 0 {
            return;
        }
        if self.heap.len() < self.k {
            self.heap.push(Reverse(item));
        } else if let Some(Reverse(worst)) = self.heap.peek() {
            if item > *worst {
                self.heap.pop();
                self.heap.push(Reverse(item));
            }
        }
    }

    fn merge(mut self, other: TopK) -> Self {
        for Reverse(item) in other.heap {
            self.offer(item);
        }
        self
    }

    fn into_sorted(self) -> Vec<ScoredQuestion> {
        let mut items: Vec<Ranked> = self.heap.into_iter().map(|Reverse(r)| r).collect();
        items.sort_unstable_by(|a, b| b.cmp(a));
        items
            .into_iter()
            .map(|r| ScoredQuestion {
                id: r.id,
                score: r.score,
            })
            .collect()
    }
}

/// Scores every corpus question against a query and keeps the best k.
///
/// Combined score is `blend(cosine(query, question), idf_cosine(query, question))`.
/// Cost is O(n·D + n·log k) for n questions of dimension D.
#[derive(Debug)]
pub struct SimilarityRanker {
    blend: Box<dyn ScoreBlend>,
    parallel: bool,
}

impl SimilarityRanker {
    pub fn new(blend: Box<dyn ScoreBlend>) -> Self {
        Self {
            blend,
            parallel: false,
        }
    }

    /// Scan the corpus with rayon. Results are identical to the sequential scan.
    pub fn with_parallel_scan(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Combined score of the question at `position`.
    pub fn score_at(&self, corpus: &CorpusIndex, query: &QueryVector, position: usize) -> f32 {
        let question = &corpus.questions()[position];
        // Both sides are unit length or zero, so the dot product is the cosine
        let embedding = dot(&query.embedding, corpus.embedding_at(position));
        let idf = query.idf.cosine(&question.idf);
        let score = self.blend.blend(embedding, idf);
        // Also folds -0.0 into 0.0 so equal scores tie under total ordering
        if score == 0.0 || !score.is_finite() {
            0.0
        } else {
            score
        }
    }

    /// Up to `k` questions by descending combined score, ties by ascending id.
    pub fn top_k_questions(
        &self,
        corpus: &CorpusIndex,
        query: &QueryVector,
        k: usize,
    ) -> Vec<ScoredQuestion> {
        if k == 0 || corpus.is_empty() {
            return Vec::new();
        }

        let rank = |position: usize| Ranked {
            score: self.score_at(corpus, query, position),
            id: corpus.questions()[position].id,
        };

        let top = if self.parallel {
            (0..corpus.len())
                .into_par_iter()
                .fold(
                    || TopK::new(k),
                    |mut top, position| {
                        top.offer(rank(position));
                        top
                    },
                )
                .reduce(|| TopK::new(k), TopK::merge)
        } else {
            let mut top = TopK::new(k);
            for position in 0..corpus.len() {
                top.offer(rank(position));
            }
            top
        };

        let results = top.into_sorted();
        tracing::debug!(target: "ranking",
            "scored {} questions, kept {} (best {:.4})",
            corpus.len(),
            results.len(),
            results.first().map_or(0.0, |q| q.score)
        );
        results
    }
}
