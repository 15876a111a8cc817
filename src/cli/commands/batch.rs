//! Batch command - recommend for a file of queries through the worker pool.

use std::io::{BufWriter, IsTerminal, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use serde::Serialize;

use crate::display::create_progress_bar;
use crate::pool::WorkerPool;
use crate::service::IndexService;
use crate::types::ApiRecommendation;

#[derive(Serialize)]
struct BatchLine<'a> {
    query: &'a str,
    recommendations: &'a [ApiRecommendation],
}

/// Read non-blank lines as queries.
pub fn read_queries(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read queries from {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Run batch command - one JSON line per query on stdout.
pub fn run_batch(
    service: &IndexService,
    file: &Path,
    k: Option<usize>,
    workers: Option<usize>,
    quiet: bool,
) -> anyhow::Result<()> {
    let queries = read_queries(file)?;
    let settings = service.settings();
    let k = k.unwrap_or(settings.retrieval.default_k);
    let engine = service.engine()?;

    let pool = WorkerPool::new(
        engine,
        workers.unwrap_or(settings.workers.pool_size),
        settings.workers.queue_size,
    )?;

    let started = Instant::now();
    let visible = !quiet && std::io::stderr().is_terminal();
    let bar = create_progress_bar(queries.len() as u64, "queries", visible);
    let results = pool.recommend_batch_with(&queries, k, |_| bar.inc(1))?;
    bar.finish_and_clear();
    pool.shutdown();

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for (query, recommendations) in queries.iter().zip(&results) {
        serde_json::to_writer(
            &mut out,
            &BatchLine {
                query,
                recommendations,
            },
        )?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    tracing::info!(
        "{} queries in {:.2}s",
        queries.len(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
