//! On-disk corpus records and build diagnostics.
//!
//! Both corpora are JSON Lines files. A line that cannot be decoded, or that
//! decodes into an unusable record, is skipped and counted; it never aborts
//! the build.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{LoadError, LoadResult};

/// One line of the question corpus.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QuestionRecord {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Fully-qualified names of the APIs used in the accepted answer, in order
    #[serde(default)]
    pub apis: Vec<String>,
}

impl QuestionRecord {
    pub fn new(
        id: u64,
        title: impl Into<String>,
        body: impl Into<String>,
        apis: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            body: body.into(),
            apis: apis.into_iter().map(Into::into).collect(),
        }
    }
}

/// One line of the javadoc corpus.
///
/// `kind` stays a string here so an unknown kind can be counted instead of
/// failing the whole line.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JavadocRecord {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl JavadocRecord {
    pub fn class(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: "class".to_string(),
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn method(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: "method".to_string(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Why a record was left out of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipReason {
    /// Line is not valid JSON for the record type
    Malformed,
    /// Question with neither title nor body
    EmptyText,
    /// Question id or javadoc name seen before; the first occurrence is kept
    DuplicateId,
    /// Javadoc kind other than `class` or `method`
    UnknownKind,
    /// Javadoc entry without a name
    EmptyName,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Malformed => "malformed",
            Self::EmptyText => "empty text",
            Self::DuplicateId => "duplicate key",
            Self::UnknownKind => "unknown kind",
            Self::EmptyName => "empty name",
        };
        f.write_str(label)
    }
}

/// Outcome of building one index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Corpus the report describes
    pub source: String,
    /// Records that made it into the index
    pub accepted: usize,
    /// Skipped records per reason
    pub skipped: BTreeMap<SkipReason, usize>,
    /// Blank API references dropped from otherwise valid questions
    pub dropped_api_refs: usize,
}

impl BuildReport {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn skip(&mut self, reason: SkipReason) {
        self.skip_many(reason, 1);
    }

    pub fn skip_many(&mut self, reason: SkipReason, count: usize) {
        if count > 0 {
            *self.skipped.entry(reason).or_default() += count;
        }
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    /// Log the report using tracing.
    pub fn log(&self) {
        tracing::info!(target: "index",
            "{}: {} records indexed, {} skipped",
            self.source, self.accepted, self.skipped_total()
        );
        for (reason, count) in &self.skipped {
            tracing::warn!(target: "index", "{}: skipped {count} record(s): {reason}", self.source);
        }
        if self.dropped_api_refs > 0 {
            tracing::warn!(target: "index",
                "{}: dropped {} blank API reference(s)",
                self.source, self.dropped_api_refs
            );
        }
    }
}

/// Decoded lines of a JSON Lines file.
#[derive(Debug)]
pub struct JsonLines<T> {
    pub path: PathBuf,
    pub records: Vec<T>,
    /// Non-blank lines that failed to decode
    pub malformed: usize,
}

/// Read a JSON Lines file. Blank lines are ignored; undecodable lines are counted.
pub fn read_json_lines<T: DeserializeOwned>(path: &Path) -> LoadResult<JsonLines<T>> {
    let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    let mut malformed = 0;
    for (line_no, line) in reader.split(b'\n').enumerate() {
        let line = line.map_err(|e| LoadError::io(path, e))?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match serde_json::from_slice::<T>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::debug!(target: "index", "{}:{}: {e}", path.display(), line_no + 1);
                malformed += 1;
            }
        }
    }

    Ok(JsonLines {
        path: path.to_path_buf(),
        records,
        malformed,
    })
}
