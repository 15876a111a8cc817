//! The assembled, read-only recommendation engine.

use std::sync::Arc;

use crate::config::Settings;
use crate::embedding::{DocumentVectorizer, EmbeddingStore};
use crate::error::LoadResult;
use crate::index::{
    BuildReport, CorpusIndex, JavadocIndex, JavadocRecord, QuestionRecord, SkipReason,
    read_json_lines,
};
use crate::metrics::LoadReport;
use crate::ranking::{SimilarityRanker, blend_from_config};
use crate::recommend::{ApiRecommender, aggregation_from_config};
use crate::text::TextNormalizer;
use crate::types::{ApiRecommendation, QuestionMatch, ScoredQuestion};

/// Knowledge base plus ranking policies.
///
/// Immutable once built; every query method takes `&self` and is safe to call
/// from any number of threads.
#[derive(Debug)]
pub struct RecommendEngine {
    normalizer: TextNormalizer,
    vectorizer: DocumentVectorizer,
    corpus: CorpusIndex,
    javadoc: JavadocIndex,
    ranker: SimilarityRanker,
    recommender: ApiRecommender,
    candidate_count: usize,
    default_k: usize,
    reports: Vec<BuildReport>,
}

impl RecommendEngine {
    /// Load the snapshot named by `settings` and build every index.
    pub fn load(settings: &Settings) -> LoadResult<Self> {
        settings.validate()?;
        let paths = settings.artifact_paths();
        tracing::info!(target: "index", "loading knowledge base from {}", paths.questions.display());

        let mut load_report = LoadReport::start();

        let store = EmbeddingStore::load(
            &paths.embeddings,
            settings.data.embedding_format,
            &paths.idf,
            settings.retrieval.default_idf,
        )?;
        load_report.stage_done("embeddings", store.vocabulary_size());

        let questions = read_json_lines::<QuestionRecord>(&paths.questions)?;
        let javadoc = read_json_lines::<JavadocRecord>(&paths.javadoc)?;
        load_report.stage_done("read", questions.records.len() + javadoc.records.len());

        let mut engine = Self::build(Arc::new(store), questions.records, javadoc.records, settings);
        engine.reports[0].skip_many(SkipReason::Malformed, questions.malformed);
        engine.reports[1].skip_many(SkipReason::Malformed, javadoc.malformed);
        load_report.stage_done("index", engine.corpus.len() + engine.javadoc_count());

        load_report.finalize();
        for report in &engine.reports {
            report.log();
        }
        load_report.log();
        Ok(engine)
    }

    /// Build an engine from in-memory parts.
    pub fn from_parts(
        store: EmbeddingStore,
        questions: Vec<QuestionRecord>,
        javadoc: Vec<JavadocRecord>,
        settings: &Settings,
    ) -> LoadResult<Self> {
        settings.validate()?;
        Ok(Self::build(Arc::new(store), questions, javadoc, settings))
    }

    fn build(
        store: Arc<EmbeddingStore>,
        questions: Vec<QuestionRecord>,
        javadoc: Vec<JavadocRecord>,
        settings: &Settings,
    ) -> Self {
        let normalizer = TextNormalizer::new();
        let analyzed = JavadocIndex::analyze(javadoc, &normalizer);
        let (corpus, vectorizer, question_report) =
            CorpusIndex::build_with_vocabulary(questions, &normalizer, store, analyzed.terms());
        let (javadoc, javadoc_report) = JavadocIndex::from_analyzed(analyzed, &vectorizer);

        let ranker = SimilarityRanker::new(blend_from_config(&settings.retrieval))
            .with_parallel_scan(settings.retrieval.parallel_scan);
        let recommender = ApiRecommender::new(aggregation_from_config(&settings.aggregation))
            .with_javadoc_weight(settings.aggregation.javadoc_weight);

        Self {
            normalizer,
            vectorizer,
            corpus,
            javadoc,
            ranker,
            recommender,
            candidate_count: settings.retrieval.candidate_count,
            default_k: settings.retrieval.default_k,
            reports: vec![question_report, javadoc_report],
        }
    }

    /// Up to `k` distinct APIs for a natural-language query.
    pub fn recommend(&self, query: &str, k: usize) -> Vec<ApiRecommendation> {
        if k == 0 {
            return Vec::new();
        }
        let terms = self.normalizer.normalize(query);
        let query_vector = self.vectorizer.query(&terms);
        if query_vector.is_degenerate() {
            tracing::debug!(target: "recommend", "no known terms in query '{query}'");
        }
        let candidates =
            self.ranker
                .top_k_questions(&self.corpus, &query_vector, self.candidate_count);
        self.recommender.recommend_apis(
            &candidates,
            &self.corpus,
            &self.javadoc,
            &query_vector,
            k,
        )
    }

    /// Up to `n` best-matching questions for a query.
    pub fn top_questions(&self, query: &str, n: usize) -> Vec<ScoredQuestion> {
        let terms = self.normalizer.normalize(query);
        let query_vector = self.vectorizer.query(&terms);
        self.ranker.top_k_questions(&self.corpus, &query_vector, n)
    }

    /// The single best-matching question, absent only for an empty corpus.
    pub fn top_question(&self, query: &str) -> Option<QuestionMatch> {
        let best = self.top_questions(query, 1).into_iter().next()?;
        let question = self.corpus.question(best.id)?;
        Some(QuestionMatch {
            id: best.id,
            title: question.title.clone(),
            score: best.score,
        })
    }

    pub fn default_k(&self) -> usize {
        self.default_k
    }

    pub fn candidate_count(&self) -> usize {
        self.candidate_count
    }

    pub fn question_count(&self) -> usize {
        self.corpus.len()
    }

    pub fn javadoc_count(&self) -> usize {
        self.javadoc.class_count() + self.javadoc.method_count()
    }

    pub fn dimension(&self) -> usize {
        self.vectorizer.dimension()
    }

    pub fn corpus(&self) -> &CorpusIndex {
        &self.corpus
    }

    pub fn javadoc(&self) -> &JavadocIndex {
        &self.javadoc
    }

    /// Build diagnostics for the question corpus and the javadoc corpus.
    pub fn reports(&self) -> &[BuildReport] {
        &self.reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::WordVectors;
    use std::collections::HashMap;

    fn engine(settings: &Settings) -> RecommendEngine {
        let normalizer = TextNormalizer::new();
        let mut vectors = WordVectors::new(3);
        for (word, v) in [
            ("convert", [0.5, 0.5, 0.0]),
            ("string", [1.0, 0.0, 0.0]),
            ("int", [0.9, 0.1, 0.0]),
            ("read", [0.0, 1.0, 0.0]),
            ("file", [0.0, 0.9, 0.1]),
        ] {
            vectors.insert(normalizer.normalize(word).remove(0), &v).unwrap();
        }
        let store = EmbeddingStore::new(vectors, HashMap::new(), Some(1.0));
        let questions = vec![
            QuestionRecord::new(
                42,
                "How to convert a String to an int in Java",
                "",
                ["java.lang.Integer.parseInt(String)"],
            ),
            QuestionRecord::new(
                7,
                "Read a file line by line",
                "",
                ["java.io.BufferedReader.readLine()", "java.io.FileReader"],
            ),
        ];
        let javadoc = vec![JavadocRecord::method(
            "java.lang.Integer.parseInt(String)",
            "Parses the string argument as a signed decimal integer.",
        )];
        RecommendEngine::from_parts(store, questions, javadoc, settings).unwrap()
    }

    #[test]
    fn test_recommend_identical_question() {
        let engine = engine(&Settings::default());
        let recs = engine.recommend("How to convert a String to an int in Java", 3);
        assert_eq!(recs[0].full_name, "java.lang.Integer.parseInt(String)");
        assert!(recs[0].description.starts_with("Parses"));
        assert!(recs.len() <= 3);
    }

    #[test]
    fn test_top_question() {
        let engine = engine(&Settings::default());
        let best = engine.top_question("read a file").unwrap();
        assert_eq!(best.id.value(), 7);
        assert_eq!(best.title, "Read a file line by line");
    }

    #[test]
    fn test_k_zero_and_nonsense_queries() {
        let engine = engine(&Settings::default());
        assert!(engine.recommend("read a file", 0).is_empty());
        let recs = engine.recommend("qwxz blorf zzyzx", 8);
        assert!(recs.len() <= 8);
        assert!(recs.iter().all(|r| !r.full_name.is_empty()));
    }

    #[test]
    fn test_repeat_link_at_last_of_hundred_candidates() {
        let mut settings = Settings::default();
        settings.retrieval.candidate_count = 100;
        let mut vectors = WordVectors::new(2);
        let read = TextNormalizer::new().normalize("read").remove(0);
        vectors.insert(read, &[1.0, 0.0]).unwrap();
        let store = EmbeddingStore::new(vectors, HashMap::new(), Some(1.0));
        let questions = (0..100u64)
            .map(|id| {
                let apis = match id {
                    0 => vec!["java.io.File".to_string(), "java.nio.file.Files".to_string()],
                    99 => vec!["java.nio.file.Files".to_string()],
                    _ => vec![format!("java.util.Other{id}")],
                };
                QuestionRecord::new(id, "read", "", apis)
            })
            .collect();
        let engine = RecommendEngine::from_parts(store, questions, Vec::new(), &settings).unwrap();

        let best = engine.top_questions("read", 100);
        assert_eq!(best.len(), 100);
        assert_eq!(best[99].id.value(), 99);

        let recs = engine.recommend("read", 2);
        assert_eq!(recs[0].full_name, "java.nio.file.Files");
        assert_eq!(recs[1].full_name, "java.io.File");
    }

    #[test]
    fn test_javadoc_terms_reach_the_idf_signal() {
        let engine = engine(&Settings::default());
        let entry = engine.javadoc.lookup("java.lang.Integer.parseInt(String)").unwrap();
        // Neither word occurs in any question title.
        let query = engine.vectorizer.query(&engine.normalizer.normalize("signed decimal"));
        assert!(query.embedding.iter().all(|&x| x == 0.0));
        assert!(entry.similarity(&query) > 0.0);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let mut settings = Settings::default();
        settings.retrieval.candidate_count = 0;
        let result = RecommendEngine::from_parts(
            EmbeddingStore::new(WordVectors::new(2), HashMap::new(), None),
            Vec::new(),
            Vec::new(),
            &settings,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_reports_are_kept() {
        let engine = engine(&Settings::default());
        assert_eq!(engine.reports().len(), 2);
        assert_eq!(engine.reports()[0].accepted, 2);
        assert_eq!(engine.question_count(), 2);
        assert_eq!(engine.javadoc_count(), 1);
        assert_eq!(engine.dimension(), 3);
    }
}
