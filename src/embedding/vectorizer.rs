//! Dense and sparse document vectors.
//!
//! Every document (question, javadoc entry or query) gets two representations:
//! an idf-weighted average of its word vectors, and a sparse bag of idf weights
//! keyed by [`TermId`]. Both are computed by the same [`DocumentVectorizer`] so
//! corpus and query vectors are always comparable.

use std::collections::HashMap;
use std::sync::Arc;

use super::math::normalize_in_place;
use super::store::EmbeddingStore;
use crate::text::Term;

/// Dense id of a term in the corpus vocabulary.
pub type TermId = u32;

/// Maps corpus terms to dense ids.
#[derive(Debug, Default, Clone)]
pub struct TermDictionary {
    ids: HashMap<Term, TermId>,
}

impl TermDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary over every term yielded, in first-seen order.
    pub fn from_terms<'a>(terms: impl IntoIterator<Item = &'a Term>) -> Self {
        let mut dictionary = Self::new();
        for term in terms {
            dictionary.intern(term);
        }
        dictionary
    }

    /// Id of `term`, assigning the next free id if it is new.
    pub fn intern(&mut self, term: &str) -> TermId {
        if let Some(&id) = self.ids.get(term) {
            return id;
        }
        let id = self.ids.len() as TermId;
        self.ids.insert(term.to_string(), id);
        id
    }

    pub fn get(&self, term: &str) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Sparse idf weight vector: entries sorted by term id, plus the full norm.
///
/// The norm also covers terms that have no id (query terms the corpus never
/// used); they can never overlap a stored vector but still dilute similarity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(TermId, f32)>,
    norm: f32,
}

impl SparseVector {
    /// Build from unsorted `(id, weight)` pairs; repeated ids accumulate.
    pub fn from_weights(weights: impl IntoIterator<Item = (TermId, f32)>, extra_sq: f32) -> Self {
        let mut entries: Vec<(TermId, f32)> = weights.into_iter().collect();
        entries.sort_unstable_by_key(|&(id, _)| id);
        entries.dedup_by(|next, kept| {
            if next.0 == kept.0 {
                kept.1 += next.1;
                true
            } else {
                false
            }
        });
        entries.retain(|&(_, w)| w != 0.0);
        let norm = (entries.iter().map(|(_, w)| w * w).sum::<f32>() + extra_sq).sqrt();
        Self { entries, norm }
    }

    pub fn entries(&self) -> &[(TermId, f32)] {
        &self.entries
    }

    pub fn norm(&self) -> f32 {
        self.norm
    }

    pub fn is_zero(&self) -> bool {
        self.norm == 0.0
    }

    /// Cosine similarity by merge-join over the sorted entries.
    ///
    /// 0.0 when either side is the zero vector.
    pub fn cosine(&self, other: &SparseVector) -> f32 {
        if self.is_zero() || other.is_zero() {
            return 0.0;
        }

        let (a, b) = (&self.entries, &other.entries);
        let (mut i, mut j) = (0, 0);
        let mut dot = 0.0f32;
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    dot += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        dot / (self.norm * other.norm)
    }
}

/// Per-request query representation.
#[derive(Debug, Clone)]
pub struct QueryVector {
    /// Unit-length idf-weighted embedding (all zeros when nothing contributed)
    pub embedding: Vec<f32>,
    /// Sparse idf weights
    pub idf: SparseVector,
}

impl QueryVector {
    /// True when neither signal can produce a non-zero similarity.
    pub fn is_degenerate(&self) -> bool {
        self.idf.is_zero() && self.embedding.iter().all(|&x| x == 0.0)
    }
}

/// Turns term sequences into vectors using the embedding store and the corpus vocabulary.
#[derive(Debug, Clone)]
pub struct DocumentVectorizer {
    store: Arc<EmbeddingStore>,
    dictionary: Arc<TermDictionary>,
}

impl DocumentVectorizer {
    pub fn new(store: Arc<EmbeddingStore>, dictionary: TermDictionary) -> Self {
        Self {
            store,
            dictionary: Arc::new(dictionary),
        }
    }

    pub fn store(&self) -> &EmbeddingStore {
        &self.store
    }

    pub fn dictionary(&self) -> &TermDictionary {
        &self.dictionary
    }

    pub fn dimension(&self) -> usize {
        self.store.dimension()
    }

    /// Idf-weighted average of the in-vocabulary word vectors of `terms`.
    ///
    /// Out-of-vocabulary terms are skipped entirely. When no term contributes the
    /// result is the zero vector; when every contributing weight is zero the plain
    /// mean is returned instead.
    pub fn vectorize(&self, terms: &[Term]) -> Vec<f32> {
        let dimension = self.store.dimension();
        let mut weighted = vec![0.0f32; dimension];
        let mut plain = vec![0.0f32; dimension];
        let mut total_weight = 0.0f32;
        let mut contributing = 0usize;

        for term in terms {
            let Some(vector) = self.store.vector_of(term) else {
                continue;
            };
            let weight = self.store.idf_of(term).max(0.0);
            for ((w, p), &x) in weighted.iter_mut().zip(plain.iter_mut()).zip(vector) {
                *w += weight * x;
                *p += x;
            }
            total_weight += weight;
            contributing += 1;
        }

        if contributing == 0 {
            return weighted;
        }
        if total_weight > 0.0 {
            weighted.iter_mut().for_each(|x| *x /= total_weight);
            weighted
        } else {
            let n = contributing as f32;
            plain.iter_mut().for_each(|x| *x /= n);
            plain
        }
    }

    /// [`vectorize`](Self::vectorize) scaled to unit length (zero stays zero).
    pub fn unit_vector(&self, terms: &[Term]) -> Vec<f32> {
        let mut vector = self.vectorize(terms);
        normalize_in_place(&mut vector);
        vector
    }

    /// Sparse idf weights of `terms`; repeated terms accumulate.
    pub fn idf_vector(&self, terms: &[Term]) -> SparseVector {
        let mut unknown: HashMap<&str, f32> = HashMap::new();
        let mut known = Vec::with_capacity(terms.len());

        for term in terms {
            let weight = self.store.idf_of(term).max(0.0);
            match self.dictionary.get(term) {
                Some(id) => known.push((id, weight)),
                None => *unknown.entry(term.as_str()).or_default() += weight,
            }
        }

        let extra_sq = unknown.values().map(|w| w * w).sum();
        SparseVector::from_weights(known, extra_sq)
    }

    /// Both representations of a query.
    pub fn query(&self, terms: &[Term]) -> QueryVector {
        QueryVector {
            embedding: self.unit_vector(terms),
            idf: self.idf_vector(terms),
        }
    }
}
