//! Evaluate command - score recommendations against a labeled benchmark.

use std::io::IsTerminal;
use std::path::Path;

use crate::display::{create_metrics_table, create_progress_bar};
use crate::eval::{evaluate, read_benchmark};
use crate::pool::WorkerPool;
use crate::service::IndexService;

/// Run evaluate command.
pub fn run_evaluate(
    service: &IndexService,
    benchmark: &Path,
    ks: &[usize],
    k: Option<usize>,
    workers: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let cases = read_benchmark(benchmark)?;
    if cases.is_empty() {
        anyhow::bail!("Benchmark {} has no cases", benchmark.display());
    }

    let settings = service.settings();
    let k = k.unwrap_or(settings.retrieval.default_k);
    if let Some(&largest) = ks.iter().max() {
        if largest > k {
            tracing::warn!("SuccessRate@{largest} is bounded by k = {k}");
        }
    }

    let pool = WorkerPool::new(
        service.engine()?,
        workers.unwrap_or(settings.workers.pool_size),
        settings.workers.queue_size,
    )?;
    let queries: Vec<&str> = cases.iter().map(|c| c.query.as_str()).collect();
    let visible = std::io::stderr().is_terminal();
    let bar = create_progress_bar(queries.len() as u64, "evaluating", visible);
    let results = pool.recommend_batch_with(&queries, k, |_| bar.inc(1))?;
    bar.finish_and_clear();
    pool.shutdown();

    let predictions: Vec<Vec<&str>> = results
        .iter()
        .map(|recs| recs.iter().map(|r| r.full_name.as_str()).collect())
        .collect();
    let answers: Vec<Vec<&str>> = cases
        .iter()
        .map(|c| c.answers.iter().map(String::as_str).collect())
        .collect();
    let metrics = evaluate(&predictions, &answers, ks)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        let name = benchmark
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("{}", create_metrics_table(&name, &metrics));
    }
    Ok(())
}
