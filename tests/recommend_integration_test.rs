//! End-to-end recommendation over a knowledge base written to disk.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

use apirec::{IndexService, LoadError, RecommendEngine, Settings, TextNormalizer};
use tempfile::TempDir;

/// Word vectors keyed by raw words; stored under their normalized form.
const WORDS: &[(&str, [f32; 4])] = &[
    ("convert", [0.6, 0.2, 0.0, 0.0]),
    ("string", [1.0, 0.0, 0.0, 0.1]),
    ("int", [0.9, 0.1, 0.0, 0.0]),
    ("java", [0.3, 0.3, 0.3, 0.3]),
    ("read", [0.0, 1.0, 0.0, 0.0]),
    ("file", [0.0, 0.9, 0.1, 0.0]),
    ("line", [0.1, 0.8, 0.0, 0.1]),
    ("sort", [0.0, 0.0, 1.0, 0.0]),
    ("list", [0.0, 0.1, 0.9, 0.0]),
    ("order", [0.0, 0.0, 0.8, 0.2]),
    ("reverse", [0.0, 0.0, 0.7, 0.3]),
    ("date", [0.0, 0.0, 0.0, 1.0]),
    ("format", [0.1, 0.0, 0.0, 0.9]),
];

const QUESTIONS: &str = r#"{"id": 42, "title": "How to convert a String to an int in Java", "body": "", "apis": ["java.lang.Integer.parseInt(String)"]}
{"id": 7, "title": "Read a file line by line", "body": "reading text files", "apis": ["java.io.BufferedReader.readLine()", "java.io.FileReader"]}
{"id": 8, "title": "Sort a list in order", "body": "", "apis": ["java.util.List.sort", "java.util.Comparator.naturalOrder()"]}
{"id": 9, "title": "Sort a list in reverse order", "body": "", "apis": ["java.util.List.sort", "java.util.Collections.reverseOrder()"]}
{"id": 10, "title": "Format a date", "body": "", "apis": ["java.text.SimpleDateFormat.format(Date)"]}
{"id": 10, "title": "duplicate id", "body": "", "apis": ["com.example.Dup"]}
{"id": 11, "title": "   ", "body": "", "apis": ["com.example.Empty"]}
not json at all
"#;

const JAVADOC: &str = r#"{"kind": "class", "name": "java.lang.Integer", "description": "The Integer class wraps a value of the primitive type int."}
{"kind": "method", "name": "java.lang.Integer.parseInt(String)", "description": "Parses the string argument as a signed decimal integer."}
{"kind": "method", "name": "java.util.List.sort", "description": "Sorts this list according to the order induced by the specified Comparator."}
{"kind": "field", "name": "java.lang.Integer.MAX_VALUE", "description": "A constant."}
"#;

fn write_knowledge_base(dir: &Path) {
    let normalizer = TextNormalizer::new();
    let mut model = format!("{} 4\n", WORDS.len());
    let mut idf = serde_json::Map::new();
    for (i, (word, vector)) in WORDS.iter().enumerate() {
        let term = normalizer.normalize(word).remove(0);
        let values: Vec<String> = vector.iter().map(f32::to_string).collect();
        writeln!(model, "{term} {}", values.join(" ")).unwrap();
        idf.insert(term, serde_json::json!(1.0 + i as f32 * 0.1));
    }

    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("w2v_model.txt"), model).unwrap();
    std::fs::write(dir.join("idf.json"), serde_json::Value::Object(idf).to_string()).unwrap();
    std::fs::write(dir.join("questions.jsonl"), QUESTIONS).unwrap();
    std::fs::write(dir.join("javadoc.jsonl"), JAVADOC).unwrap();
}

fn settings_for(dir: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.data.dir = dir.to_path_buf();
    settings
}

fn load_engine() -> (TempDir, RecommendEngine) {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    write_knowledge_base(&data);
    let engine = RecommendEngine::load(&settings_for(&data)).unwrap();
    (temp, engine)
}

fn names(engine: &RecommendEngine, query: &str, k: usize) -> Vec<String> {
    engine
        .recommend(query, k)
        .into_iter()
        .map(|r| r.full_name)
        .collect()
}

#[test]
fn test_load_counts_and_skips() {
    let (_temp, engine) = load_engine();
    assert_eq!(engine.question_count(), 5);
    assert_eq!(engine.javadoc_count(), 3);
    assert_eq!(engine.dimension(), 4);

    let questions = &engine.reports()[0];
    assert_eq!(questions.accepted, 5);
    // Duplicate id, empty text and the undecodable line
    assert_eq!(questions.skipped_total(), 3);

    let javadoc = &engine.reports()[1];
    assert_eq!(javadoc.accepted, 3);
    assert_eq!(javadoc.skipped_total(), 1);
}

#[test]
fn test_identical_question_ranks_its_api_first() {
    let (_temp, engine) = load_engine();
    let recs = engine.recommend("How to convert a String to an int in Java", 5);
    assert_eq!(recs[0].full_name, "java.lang.Integer.parseInt(String)");
    assert!(recs[0].description.starts_with("Parses the string argument"));

    let best = engine.top_question("How to convert a String to an int in Java").unwrap();
    assert_eq!(best.id.value(), 42);
}

#[test]
fn test_api_linked_twice_outranks_api_linked_once() {
    let (_temp, engine) = load_engine();
    let recs = engine.recommend("sort list order", 10);
    let score_of = |name: &str| {
        recs.iter()
            .find(|r| r.full_name == name)
            .map(|r| r.score)
            .unwrap()
    };
    assert_eq!(recs[0].full_name, "java.util.List.sort");
    assert!(score_of("java.util.List.sort") > score_of("java.util.Comparator.naturalOrder()"));
    assert!(score_of("java.util.List.sort") > score_of("java.util.Collections.reverseOrder()"));
}

#[test]
fn test_length_bound_and_unique_names() {
    let (_temp, engine) = load_engine();
    for query in ["read a file", "sort", "convert string", "format a date", ""] {
        for k in [1, 2, 3, 8, 50] {
            let recs = engine.recommend(query, k);
            assert!(recs.len() <= k);
            let unique: HashSet<&str> = recs.iter().map(|r| r.full_name.as_str()).collect();
            assert_eq!(unique.len(), recs.len());
            assert!(recs.iter().all(|r| !r.full_name.is_empty()));
        }
    }
}

#[test]
fn test_k_boundaries() {
    let (_temp, engine) = load_engine();
    assert!(engine.recommend("read a file", 0).is_empty());

    // Seven distinct APIs are reachable from the five indexed questions
    let all = names(&engine, "read a file", 100);
    assert_eq!(all.len(), 7);
    assert!(!all.iter().any(|name| name.starts_with("com.example")));
}

#[test]
fn test_identical_calls_give_identical_output() {
    let (_temp, engine) = load_engine();
    let first = engine.recommend("read file line", 4);
    for _ in 0..5 {
        assert_eq!(engine.recommend("read file line", 4), first);
    }
}

#[test]
fn test_nonsense_query_is_valid() {
    let (_temp, engine) = load_engine();
    let recs = engine.recommend("qwxz blorf zzyzx", 3);
    assert!(recs.len() <= 3);
    assert!(engine.top_question("qwxz blorf zzyzx").is_some());
}

#[test]
fn test_inserted_question_surfaces_its_api() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    write_knowledge_base(&data);

    let query = "reverse the date format";
    let mut questions = std::fs::read_to_string(data.join("questions.jsonl")).unwrap();
    questions.push_str(&format!(
        "{{\"id\": 99, \"title\": \"{query}\", \"body\": \"\", \"apis\": [\"com.example.Synthetic.apply\"]}}\n"
    ));
    std::fs::write(data.join("questions.jsonl"), questions).unwrap();

    let engine = RecommendEngine::load(&settings_for(&data)).unwrap();
    assert_eq!(names(&engine, query, 1), vec!["com.example.Synthetic.apply"]);
}

#[test]
fn test_missing_artifact_fails_through_service() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    write_knowledge_base(&data);
    std::fs::remove_file(data.join("idf.json")).unwrap();

    let service = IndexService::new(settings_for(&data));
    let error = service.recommend("read a file", 3).unwrap_err();
    assert!(matches!(error.load_error(), LoadError::MissingArtifact { .. }));
    assert!(service.recommend("read a file", 3).is_err());
}

#[test]
fn test_service_loads_once_and_serves() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    write_knowledge_base(&data);

    let service = IndexService::new(settings_for(&data));
    assert!(!service.is_initialized());
    let recs = service.recommend("read a file line by line", 2).unwrap();
    assert!(service.is_initialized());
    assert_eq!(recs.len(), 2);
    assert!(recs.iter().any(|r| r.full_name == "java.io.BufferedReader.readLine()"));

    let a = service.engine().unwrap();
    let b = service.engine().unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
}
