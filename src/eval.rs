//! Retrieval quality metrics against a labeled benchmark.
//!
//! Names are compared without their parameter lists, so a prediction of
//! `java.lang.Integer.parseInt(String)` matches an answer of
//! `java.lang.Integer.parseInt`.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, LoadResult};
use crate::index::read_json_lines;
use crate::types::strip_parameters;

/// One benchmark line: a query and the APIs a correct answer uses.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BenchmarkCase {
    pub query: String,
    #[serde(default)]
    pub answers: Vec<String>,
}

/// Aggregate metrics over every scored query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    /// Queries that had at least one answer
    pub queries: usize,
    /// Queries left out because their answer set was empty
    pub skipped: usize,
    pub mrr: f64,
    pub map: f64,
    /// `(k, share of queries with a relevant API in the top k)`
    pub success_at_k: Vec<(usize, f64)>,
}

impl Metrics {
    pub fn success_at(&self, k: usize) -> Option<f64> {
        self.success_at_k
            .iter()
            .find(|(at, _)| *at == k)
            .map(|&(_, rate)| rate)
    }
}

/// Read a JSON Lines benchmark file. Undecodable lines are skipped.
pub fn read_benchmark(path: &Path) -> LoadResult<Vec<BenchmarkCase>> {
    let lines = read_json_lines::<BenchmarkCase>(path)?;
    if lines.malformed > 0 {
        tracing::warn!(
            "{}: skipped {} malformed benchmark line(s)",
            path.display(),
            lines.malformed
        );
    }
    Ok(lines.records)
}

/// 1-based ranks of the relevant predictions; each answer counts once.
fn hit_ranks<P: AsRef<str>>(predicted: &[P], relevant: &HashSet<&str>) -> Vec<usize> {
    let mut found = HashSet::new();
    predicted
        .iter()
        .enumerate()
        .filter_map(|(i, name)| {
            let bare = strip_parameters(name.as_ref());
            (relevant.contains(bare) && found.insert(bare)).then_some(i + 1)
        })
        .collect()
}

/// Score ranked predictions against answer sets, query by query.
///
/// `predictions[i]` and `answers[i]` belong to the same query; the two
/// slices must have the same length.
pub fn evaluate<P, A>(
    predictions: &[Vec<P>],
    answers: &[Vec<A>],
    ks: &[usize],
) -> Result<Metrics, EvalError>
where
    P: AsRef<str>,
    A: AsRef<str>,
{
    if predictions.len() != answers.len() {
        return Err(EvalError::LengthMismatch {
            predictions: predictions.len(),
            answers: answers.len(),
        });
    }

    let mut queries = 0usize;
    let mut skipped = 0usize;
    let mut reciprocal_sum = 0.0;
    let mut precision_sum = 0.0;
    let mut successes = vec![0usize; ks.len()];

    for (predicted, expected) in predictions.iter().zip(answers) {
        let relevant: HashSet<&str> = expected
            .iter()
            .map(|a| strip_parameters(a.as_ref()))
            .filter(|a| !a.is_empty())
            .collect();
        if relevant.is_empty() {
            skipped += 1;
            continue;
        }
        queries += 1;

        let ranks = hit_ranks(predicted, &relevant);
        if let Some(&first) = ranks.first() {
            reciprocal_sum += 1.0 / first as f64;
        }
        let precision: f64 = ranks
            .iter()
            .enumerate()
            .map(|(hits_before, &rank)| (hits_before + 1) as f64 / rank as f64)
            .sum();
        precision_sum += precision / relevant.len() as f64;

        for (slot, &k) in successes.iter_mut().zip(ks) {
            if ranks.first().is_some_and(|&first| first <= k) {
                *slot += 1;
            }
        }
    }

    let mean = |total: f64| if queries == 0 { 0.0 } else { total / queries as f64 };
    Ok(Metrics {
        queries,
        skipped,
        mrr: mean(reciprocal_sum),
        map: mean(precision_sum),
        success_at_k: ks
            .iter()
            .zip(&successes)
            .map(|(&k, &hits)| (k, mean(hits as f64)))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_single_query_metrics() {
        let predictions = vec![vec!["x.A.a", "x.B.b(int)", "x.C.c", "x.D.d"]];
        let answers = vec![vec!["x.B.b", "x.D.d"]];
        let metrics = evaluate(&predictions, &answers, &[1, 3, 5]).unwrap();

        assert_eq!(metrics.queries, 1);
        assert!(close(metrics.mrr, 0.5));
        // (1/2 + 2/4) / 2
        assert!(close(metrics.map, 0.5));
        assert_eq!(metrics.success_at(1), Some(0.0));
        assert_eq!(metrics.success_at(3), Some(1.0));
        assert_eq!(metrics.success_at(7), None);
    }

    #[test]
    fn test_mean_over_queries() {
        let predictions = vec![vec!["a.A.a"], vec!["b.B.b", "c.C.c"], vec!["z.Z.z"]];
        let answers = vec![vec!["a.A.a"], vec!["c.C.c"], vec!["y.Y.y"]];
        let metrics = evaluate(&predictions, &answers, &[1]).unwrap();

        assert_eq!(metrics.queries, 3);
        assert!(close(metrics.mrr, (1.0 + 0.5 + 0.0) / 3.0));
        assert!(close(metrics.success_at(1).unwrap(), 1.0 / 3.0));
    }

    #[test]
    fn test_duplicate_predictions_count_once() {
        let predictions = vec![vec!["a.A.a(int)", "a.A.a(long)"]];
        let answers = vec![vec!["a.A.a"]];
        let metrics = evaluate(&predictions, &answers, &[1]).unwrap();
        assert!(close(metrics.map, 1.0));
    }

    #[test]
    fn test_queries_without_answers_are_skipped() {
        let predictions: Vec<Vec<&str>> = vec![vec!["a.A.a"], vec![]];
        let answers: Vec<Vec<&str>> = vec![vec![], vec!["b.B.b"]];
        let metrics = evaluate(&predictions, &answers, &[1]).unwrap();
        assert_eq!(metrics.queries, 1);
        assert_eq!(metrics.skipped, 1);
        assert_eq!(metrics.mrr, 0.0);

        let empty = evaluate::<&str, &str>(&[], &[], &[1]).unwrap();
        assert_eq!(empty.queries, 0);
        assert_eq!(empty.success_at(1), Some(0.0));
    }

    #[test]
    fn test_mismatched_lengths_are_rejected() {
        let predictions = vec![vec!["a.A.a"], vec!["b.B.b"]];
        let answers = vec![vec!["a.A.a"]];
        let err = evaluate(&predictions, &answers, &[1]).unwrap_err();
        assert_eq!(
            err,
            EvalError::LengthMismatch {
                predictions: 2,
                answers: 1
            }
        );
        // Nothing is silently truncated in either direction.
        assert!(evaluate(&answers, &predictions, &[1]).is_err());
    }

    #[test]
    fn test_read_benchmark() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bench.jsonl");
        std::fs::write(
            &path,
            "{\"query\": \"parse int\", \"answers\": [\"java.lang.Integer.parseInt\"]}\n{oops\n",
        )
        .unwrap();
        let cases = read_benchmark(&path).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].answers, vec!["java.lang.Integer.parseInt"]);
    }
}
