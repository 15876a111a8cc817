//! Precomputed vectors for the question corpus.
//!
//! Dense question vectors live in one row-major matrix; row `i` belongs to
//! `questions[i]`. Everything is computed once at build time and never touched
//! again, so ranking is a read-only scan.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rayon::prelude::*;

use super::records::{BuildReport, QuestionRecord, SkipReason};
use crate::embedding::{DocumentVectorizer, EmbeddingStore, SparseVector, TermDictionary};
use crate::text::{Term, TextNormalizer};
use crate::types::QuestionId;

/// An indexed corpus question.
#[derive(Debug, Clone)]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    /// API references in answer order, blanks removed
    pub apis: Vec<String>,
    /// Sparse idf vector of title and body terms
    pub idf: SparseVector,
}

/// Read-only question index.
#[derive(Debug)]
pub struct CorpusIndex {
    dimension: usize,
    questions: Vec<Question>,
    embeddings: Vec<f32>,
    positions: HashMap<QuestionId, usize>,
}

impl CorpusIndex {
    /// Build the index and the vectorizer that shares its vocabulary.
    ///
    /// Records are validated in input order (first occurrence of an id wins),
    /// then normalized and vectorized in parallel.
    pub fn build(
        records: Vec<QuestionRecord>,
        normalizer: &TextNormalizer,
        store: Arc<EmbeddingStore>,
    ) -> (Self, DocumentVectorizer, BuildReport) {
        Self::build_with_vocabulary(records, normalizer, store, std::iter::empty::<&Term>())
    }

    /// [`build`](Self::build) with extra terms added to the shared vocabulary,
    /// so other corpora vectorized later get comparable idf vectors.
    pub fn build_with_vocabulary<'a>(
        records: Vec<QuestionRecord>,
        normalizer: &TextNormalizer,
        store: Arc<EmbeddingStore>,
        extra_terms: impl IntoIterator<Item = &'a Term>,
    ) -> (Self, DocumentVectorizer, BuildReport) {
        let mut report = BuildReport::new("questions");
        let mut seen = HashSet::with_capacity(records.len());
        let mut accepted = Vec::with_capacity(records.len());

        for mut record in records {
            if record.title.trim().is_empty() && record.body.trim().is_empty() {
                report.skip(SkipReason::EmptyText);
                continue;
            }
            if !seen.insert(record.id) {
                report.skip(SkipReason::DuplicateId);
                continue;
            }
            let before = record.apis.len();
            record.apis.retain(|api| !api.trim().is_empty());
            for api in &mut record.apis {
                let trimmed = api.trim();
                if trimmed.len() != api.len() {
                    *api = trimmed.to_string();
                }
            }
            report.dropped_api_refs += before - record.apis.len();
            accepted.push(record);
        }

        let terms: Vec<Vec<Term>> = accepted
            .par_iter()
            .map(|record| normalizer.normalize(&format!("{} {}", record.title, record.body)))
            .collect();

        let mut dictionary = TermDictionary::from_terms(terms.iter().flatten());
        for term in extra_terms {
            dictionary.intern(term);
        }
        let vectorizer = DocumentVectorizer::new(store, dictionary);

        let vectors: Vec<(Vec<f32>, SparseVector)> = terms
            .par_iter()
            .map(|terms| (vectorizer.unit_vector(terms), vectorizer.idf_vector(terms)))
            .collect();

        let dimension = vectorizer.dimension();
        let mut index = Self {
            dimension,
            questions: Vec::with_capacity(accepted.len()),
            embeddings: Vec::with_capacity(accepted.len() * dimension),
            positions: HashMap::with_capacity(accepted.len()),
        };

        for (record, (embedding, idf)) in accepted.into_iter().zip(vectors) {
            let id = QuestionId::new(record.id);
            index.positions.insert(id, index.questions.len());
            index.embeddings.extend_from_slice(&embedding);
            index.questions.push(Question {
                id,
                title: record.title,
                apis: record.apis,
                idf,
            });
        }

        report.accepted = index.questions.len();
        (index, vectorizer, report)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Unit-length embedding of the question at `position`.
    pub fn embedding_at(&self, position: usize) -> &[f32] {
        let start = position * self.dimension;
        &self.embeddings[start..start + self.dimension]
    }

    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.positions.get(&id).map(|&pos| &self.questions[pos])
    }

    pub fn embedding_of(&self, id: QuestionId) -> Option<&[f32]> {
        self.positions.get(&id).map(|&pos| self.embedding_at(pos))
    }
}
