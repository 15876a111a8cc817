//! Javadoc knowledge base: class-level and method-level entries with vectors.

use std::collections::HashMap;

use rayon::prelude::*;

use super::records::{BuildReport, JavadocRecord, SkipReason};
use crate::embedding::{DocumentVectorizer, QueryVector, SparseVector, dot};
use crate::text::{Term, TextNormalizer};
use crate::types::{JavadocKind, owning_class, strip_parameters};

/// An indexed javadoc entry.
#[derive(Debug, Clone)]
pub struct JavadocEntry {
    pub kind: JavadocKind,
    pub name: String,
    pub description: String,
    /// Unit-length embedding of the simple name and description
    pub vector: Vec<f32>,
    /// Sparse idf vector of the same terms
    pub idf: SparseVector,
}

impl JavadocEntry {
    /// Mean of the non-negative embedding and idf cosines against a query.
    pub fn similarity(&self, query: &QueryVector) -> f32 {
        let embedding = if self.vector.len() == query.embedding.len() {
            dot(&query.embedding, &self.vector).max(0.0)
        } else {
            0.0
        };
        let idf = self.idf.cosine(&query.idf).max(0.0);
        0.5 * (embedding + idf)
    }
}

/// Validated javadoc records with their normalized terms, not yet vectorized.
///
/// Exists so the term vocabulary can be shared with the question corpus
/// before any vector is built.
#[derive(Debug)]
pub struct AnalyzedJavadoc {
    entries: Vec<(JavadocKind, String, String, Vec<Term>)>,
    report: BuildReport,
}

impl AnalyzedJavadoc {
    /// Every term of every accepted record.
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.entries.iter().flat_map(|(_, _, _, terms)| terms)
    }
}

/// Two name-keyed indices (classes, methods) built once from the javadoc corpus.
///
/// Methods can be found by their full signature or by the name without its
/// parameter list; the first signature seen for a bare name wins.
#[derive(Debug, Default)]
pub struct JavadocIndex {
    classes: HashMap<String, JavadocEntry>,
    methods: HashMap<String, JavadocEntry>,
    method_aliases: HashMap<String, String>,
}

/// Last dotted segment without parameters: `java.util.List.sort(Comparator)` -> `sort`.
fn simple_name(name: &str) -> &str {
    let bare = strip_parameters(name);
    bare.rsplit('.').next().unwrap_or(bare)
}

impl JavadocIndex {
    /// Validate and normalize records; vectors are built by [`from_analyzed`](Self::from_analyzed).
    pub fn analyze(records: Vec<JavadocRecord>, normalizer: &TextNormalizer) -> AnalyzedJavadoc {
        let mut report = BuildReport::new("javadoc");

        let mut accepted = Vec::with_capacity(records.len());
        for record in records {
            let kind = match record.kind.trim().to_ascii_lowercase().as_str() {
                "class" => JavadocKind::Class,
                "method" => JavadocKind::Method,
                _ => {
                    report.skip(SkipReason::UnknownKind);
                    continue;
                }
            };
            let name = record.name.trim();
            if name.is_empty() {
                report.skip(SkipReason::EmptyName);
                continue;
            }
            accepted.push((kind, name.to_string(), record.description));
        }

        let entries: Vec<_> = accepted
            .into_par_iter()
            .map(|(kind, name, description)| {
                let terms =
                    normalizer.normalize(&format!("{} {description}", simple_name(&name)));
                (kind, name, description, terms)
            })
            .collect();

        AnalyzedJavadoc { entries, report }
    }

    /// Vectorize analyzed records and index them by name.
    pub fn from_analyzed(
        analyzed: AnalyzedJavadoc,
        vectorizer: &DocumentVectorizer,
    ) -> (Self, BuildReport) {
        let AnalyzedJavadoc { entries, mut report } = analyzed;

        let entries: Vec<JavadocEntry> = entries
            .into_par_iter()
            .map(|(kind, name, description, terms)| JavadocEntry {
                kind,
                vector: vectorizer.unit_vector(&terms),
                idf: vectorizer.idf_vector(&terms),
                name,
                description,
            })
            .collect();

        let mut index = Self::default();
        for entry in entries {
            if index.insert(entry) {
                report.accepted += 1;
            } else {
                report.skip(SkipReason::DuplicateId);
            }
        }
        (index, report)
    }

    pub fn build(
        records: Vec<JavadocRecord>,
        normalizer: &TextNormalizer,
        vectorizer: &DocumentVectorizer,
    ) -> (Self, BuildReport) {
        Self::from_analyzed(Self::analyze(records, normalizer), vectorizer)
    }

    fn entries_mut(&mut self, kind: JavadocKind) -> &mut HashMap<String, JavadocEntry> {
        match kind {
            JavadocKind::Class => &mut self.classes,
            JavadocKind::Method => &mut self.methods,
        }
    }

    /// Add an entry. Returns `false` when the name is already indexed.
    fn insert(&mut self, entry: JavadocEntry) -> bool {
        if self.entries_mut(entry.kind).contains_key(&entry.name) {
            return false;
        }
        if entry.kind == JavadocKind::Method {
            let bare = strip_parameters(&entry.name);
            if bare != entry.name {
                self.method_aliases
                    .entry(bare.to_string())
                    .or_insert_with(|| entry.name.clone());
            }
        }
        self.entries_mut(entry.kind).insert(entry.name.clone(), entry);
        true
    }

    pub fn class(&self, name: &str) -> Option<&JavadocEntry> {
        self.classes.get(name)
    }

    /// Method by exact name, else by the name with its parameter list stripped.
    pub fn method(&self, name: &str) -> Option<&JavadocEntry> {
        if let Some(entry) = self.methods.get(name) {
            return Some(entry);
        }
        let bare = strip_parameters(name);
        self.methods.get(bare).or_else(|| {
            self.method_aliases
                .get(bare)
                .and_then(|full| self.methods.get(full))
        })
    }

    /// Entry documenting `api` itself: a method, or a class referenced directly.
    pub fn lookup(&self, api: &str) -> Option<&JavadocEntry> {
        self.method(api).or_else(|| self.class(api))
    }

    /// Description of `api`: its own entry, else its owning class, else empty.
    pub fn description_for(&self, api: &str) -> &str {
        if let Some(entry) = self.lookup(api) {
            return &entry.description;
        }
        owning_class(api)
            .and_then(|class| self.class(class))
            .map(|entry| entry.description.as_str())
            .unwrap_or("")
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.methods.is_empty()
    }
}
