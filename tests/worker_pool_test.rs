//! Batch recommendation through the worker pool.

use std::collections::HashMap;
use std::sync::Arc;

use apirec::embedding::WordVectors;
use apirec::index::QuestionRecord;
use apirec::{EmbeddingStore, PoolError, RecommendEngine, Settings, TextNormalizer, WorkerPool};

fn engine() -> Arc<RecommendEngine> {
    let normalizer = TextNormalizer::new();
    let mut vectors = WordVectors::new(3);
    for (word, v) in [
        ("sort", [1.0, 0.0, 0.0]),
        ("list", [0.8, 0.2, 0.0]),
        ("read", [0.0, 1.0, 0.0]),
        ("file", [0.0, 0.9, 0.1]),
        ("date", [0.0, 0.0, 1.0]),
    ] {
        vectors.insert(normalizer.normalize(word).remove(0), &v).unwrap();
    }
    let store = EmbeddingStore::new(vectors, HashMap::new(), Some(1.0));
    let questions = vec![
        QuestionRecord::new(1, "Sort a list", "", ["java.util.List.sort"]),
        QuestionRecord::new(2, "Read a file", "", ["java.nio.file.Files.readAllLines(Path)"]),
        QuestionRecord::new(3, "Parse a date", "", ["java.time.LocalDate.parse(CharSequence)"]),
    ];
    Arc::new(RecommendEngine::from_parts(store, questions, Vec::new(), &Settings::default()).unwrap())
}

#[test]
fn test_batch_matches_sequential_results() {
    let engine = engine();
    let queries: Vec<String> = (0..100)
        .map(|i| match i % 3 {
            0 => "sort my list".to_string(),
            1 => "read the file".to_string(),
            _ => format!("date number {i}"),
        })
        .collect();

    let pool = WorkerPool::new(Arc::clone(&engine), 4, 8).unwrap();
    assert_eq!(pool.size(), 4);
    let results = pool.recommend_batch(&queries, 2).unwrap();
    pool.shutdown();

    assert_eq!(results.len(), queries.len());
    for (query, recs) in queries.iter().zip(&results) {
        assert_eq!(recs, &engine.recommend(query, 2));
    }
    assert_eq!(results[0][0].full_name, "java.util.List.sort");
    assert_eq!(results[1][0].full_name, "java.nio.file.Files.readAllLines(Path)");
}

#[test]
fn test_pool_from_config() {
    let mut settings = Settings::default();
    settings.workers.pool_size = 2;
    settings.workers.queue_size = 1;

    let pool = WorkerPool::from_config(engine(), &settings.workers).unwrap();
    assert_eq!(pool.size(), 2);

    let pending: Vec<_> = ["sort", "file", "date"]
        .into_iter()
        .map(|q| pool.submit(q, 1).unwrap())
        .collect();
    let firsts: Vec<String> = pending
        .into_iter()
        .map(|p| p.wait().unwrap().remove(0).full_name)
        .collect();
    assert_eq!(
        firsts,
        vec![
            "java.util.List.sort",
            "java.nio.file.Files.readAllLines(Path)",
            "java.time.LocalDate.parse(CharSequence)",
        ]
    );
}

#[test]
fn test_pool_error_messages() {
    assert!(PoolError::Disconnected.to_string().contains("shut down"));
}
