//! Standard API registry: the collaborator that checks recommended names
//! against the documented platform APIs.
//!
//! The engine never consults a registry. Callers who want only documented
//! APIs run [`resolve_with_registry`] over its output.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LoadResult;
use crate::index::read_json_lines;
use crate::types::{ApiRecommendation, strip_parameters};

/// A documented API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegistryEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Lookup interface over the documented APIs.
pub trait StandardApiRegistry {
    fn lookup_by_full_name(&self, name: &str) -> Option<&RegistryEntry>;

    /// Closest documented API to a name that is not documented verbatim.
    fn closest_documented(&self, candidate: &str) -> Option<&RegistryEntry>;
}

/// Registry held in memory, keyed three ways.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    entries: Vec<RegistryEntry>,
    by_name: HashMap<String, usize>,
    by_bare_name: HashMap<String, usize>,
    /// `Class.method` without package or parameters
    by_short_name: HashMap<String, usize>,
}

/// `java.lang.Integer.parseInt(String)` -> `Integer.parseInt`.
fn short_name(name: &str) -> &str {
    let bare = strip_parameters(name);
    let mut dots = bare.rmatch_indices('.').map(|(i, _)| i);
    let _method_dot = dots.next();
    match dots.next() {
        Some(class_dot) => &bare[class_dot + 1..],
        None => bare,
    }
}

impl InMemoryRegistry {
    pub fn new(entries: impl IntoIterator<Item = RegistryEntry>) -> Self {
        let mut registry = Self::default();
        for entry in entries {
            registry.insert(entry);
        }
        registry
    }

    /// Load a JSON Lines file of `{name, description}` objects.
    pub fn load(path: &Path) -> LoadResult<Self> {
        let lines = read_json_lines::<RegistryEntry>(path)?;
        if lines.malformed > 0 {
            tracing::warn!(
                "{}: skipped {} malformed registry line(s)",
                path.display(),
                lines.malformed
            );
        }
        Ok(Self::new(lines.records))
    }

    /// Add an entry; the first entry for a name wins every key.
    pub fn insert(&mut self, entry: RegistryEntry) {
        let name = entry.name.trim().to_string();
        if name.is_empty() || self.by_name.contains_key(&name) {
            return;
        }
        let position = self.entries.len();
        self.by_bare_name
            .entry(strip_parameters(&name).to_string())
            .or_insert(position);
        self.by_short_name
            .entry(short_name(&name).to_string())
            .or_insert(position);
        self.by_name.insert(name.clone(), position);
        self.entries.push(RegistryEntry {
            name,
            description: entry.description,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StandardApiRegistry for InMemoryRegistry {
    fn lookup_by_full_name(&self, name: &str) -> Option<&RegistryEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    fn closest_documented(&self, candidate: &str) -> Option<&RegistryEntry> {
        self.by_bare_name
            .get(strip_parameters(candidate))
            .or_else(|| self.by_short_name.get(short_name(candidate)))
            .map(|&i| &self.entries[i])
    }
}

/// Replace every recommendation by its documented counterpart.
///
/// Exact matches are kept, otherwise the closest documented API stands in;
/// recommendations with neither are dropped. Order is preserved and a
/// documented API appears at most once, at its best position.
pub fn resolve_with_registry<R: StandardApiRegistry + ?Sized>(
    recommendations: Vec<ApiRecommendation>,
    registry: &R,
) -> Vec<ApiRecommendation> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(recommendations.len());

    for rec in recommendations {
        let entry = registry
            .lookup_by_full_name(&rec.full_name)
            .or_else(|| registry.closest_documented(&rec.full_name));
        let Some(entry) = entry else {
            tracing::debug!("dropping undocumented API {}", rec.full_name);
            continue;
        };
        if !seen.insert(entry.name.clone()) {
            continue;
        }
        let description = if entry.description.is_empty() {
            rec.description
        } else {
            entry.description.clone()
        };
        resolved.push(ApiRecommendation {
            full_name: entry.name.clone(),
            description,
            score: rec.score,
        });
    }
    resolved
}
